//! ISO-8601 duration parsing.
//!
//! ResRobot reports trip and leg durations as ISO-8601 durations such as
//! `PT1H30M`. Only the week/day/hour/minute/second designators are
//! accepted; months and years are ambiguous and rejected.

/// Parse an ISO-8601 duration into whole minutes.
///
/// Sub-minute remainders are truncated (`PT45S` is 0 minutes). Returns
/// `None` for anything outside the restricted `PnWnDTnHnMnS` syntax,
/// including durations with no components at all or components too
/// large to hold in seconds.
pub fn parse_duration_minutes(input: &str) -> Option<i64> {
    let rest = input.trim().strip_prefix('P')?;
    if rest.is_empty() {
        return None;
    }

    let (date_part, time_part) = match rest.split_once('T') {
        Some((date, time)) => (date, Some(time)),
        None => (rest, None),
    };

    // "PT" and "P...T" with nothing behind the T are not durations
    if date_part.is_empty() && time_part.is_none_or(str::is_empty) {
        return None;
    }

    let mut seconds = parse_components(date_part, &[('W', 604_800), ('D', 86_400)])?;
    if let Some(time_part) = time_part {
        seconds =
            seconds.checked_add(parse_components(time_part, &[('H', 3_600), ('M', 60), ('S', 1)])?)?;
    }

    Some(seconds / 60)
}

/// Sum `<digits><designator>` pairs, in seconds.
fn parse_components(part: &str, designators: &[(char, i64)]) -> Option<i64> {
    let mut total = 0i64;
    let mut digits = String::new();

    for c in part.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else {
            if digits.is_empty() {
                return None;
            }
            let n: i64 = digits.parse().ok()?;
            let multiplier = designators.iter().find(|(d, _)| *d == c)?.1;
            total = total.checked_add(n.checked_mul(multiplier)?)?;
            digits.clear();
        }
    }

    // trailing digits without a designator
    if !digits.is_empty() {
        return None;
    }

    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hours_and_minutes() {
        assert_eq!(parse_duration_minutes("PT1H30M"), Some(90));
        assert_eq!(parse_duration_minutes("PT90M"), Some(90));
        assert_eq!(parse_duration_minutes("PT2H"), Some(120));
    }

    #[test]
    fn seconds_truncate() {
        assert_eq!(parse_duration_minutes("PT45S"), Some(0));
        assert_eq!(parse_duration_minutes("PT1M30S"), Some(1));
    }

    #[test]
    fn days_and_weeks() {
        assert_eq!(parse_duration_minutes("P1D"), Some(1_440));
        assert_eq!(parse_duration_minutes("P2W"), Some(20_160));
        assert_eq!(parse_duration_minutes("P1DT2H"), Some(1_560));
    }

    #[test]
    fn unparsable_is_none() {
        assert_eq!(parse_duration_minutes("bogus"), None);
        assert_eq!(parse_duration_minutes(""), None);
        assert_eq!(parse_duration_minutes("P"), None);
        assert_eq!(parse_duration_minutes("PT"), None);
        // months are not supported
        assert_eq!(parse_duration_minutes("P3M"), None);
        // trailing number without a designator
        assert_eq!(parse_duration_minutes("PT5"), None);
        // designator without a number
        assert_eq!(parse_duration_minutes("PTH"), None);
        // values too large to hold in seconds
        assert_eq!(parse_duration_minutes("PT99999999999999999H"), None);
        assert_eq!(parse_duration_minutes("P99999999999999999999W"), None);
    }

    #[test]
    fn whitespace_is_tolerated() {
        assert_eq!(parse_duration_minutes("  PT1H  "), Some(60));
    }
}
