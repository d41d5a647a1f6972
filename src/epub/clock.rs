/// Parses a SMIL clock value into seconds.
///
/// Accepts full (`hh:mm:ss.fff`) and partial (`mm:ss.fff`) clock values,
/// as well as timecounts with an optional metric (`h`, `min`, `s`, `ms`),
/// seconds being the default.
///
/// See <https://www.w3.org/TR/SMIL/smil-timing.html#Timing-ClockValueSyntax>.
///
/// ```
/// # use rpub::epub::parse_clock_value;
/// assert_eq!(Some(9003.0), parse_clock_value("02:30:03"));
/// assert_eq!(Some(2700.0), parse_clock_value("45min"));
/// assert_eq!(None, parse_clock_value("12 parsecs"));
/// ```
pub fn parse_clock_value(raw: &str) -> Option<f64> {
    let raw = raw.trim();

    if raw.is_empty() {
        None
    } else if raw.contains(':') {
        Some(parse_full_clock_value(raw))
    } else {
        let (count, metric) = raw.split_at(raw.find(char::is_alphabetic).unwrap_or(raw.len()));
        let count = count.parse::<f64>().ok()?;

        match metric {
            "h" => Some(count * 3600.0),
            "min" => Some(count * 60.0),
            "s" | "" => Some(count),
            "ms" => Some(count / 1000.0),
            _ => None,
        }
    }
}

/// `hh:mm:ss` or `mm:ss`, where unparsable components count as `0`.
fn parse_full_clock_value(raw: &str) -> f64 {
    raw.rsplit(':')
        .zip([1.0, 60.0, 3600.0])
        .map(|(part, factor)| part.parse::<f64>().unwrap_or_default() * factor)
        .sum()
}
