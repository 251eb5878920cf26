use std::sync::Arc;

use crate::display::Locale;
use crate::engine::RefreshEngine;
use crate::stops::StopDirectory;

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    pub engine: RefreshEngine,
    pub stops: Arc<StopDirectory>,
    pub default_locale: Locale,
}
