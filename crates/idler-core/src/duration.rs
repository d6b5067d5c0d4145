//! Duration strings and the query lookback window.

use std::fmt;
use std::time::Duration;

/// Parse a duration string like "500ms", "30s", "5m", "1h" or "1m30s".
///
/// A bare number is taken as seconds. Returns `None` for anything else,
/// including a trailing number without a unit.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(secs) = s.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let num_len = rest.find(|c: char| !(c.is_ascii_digit() || c == '.'))?;
        if num_len == 0 {
            return None;
        }
        let (number, tail) = rest.split_at(num_len);
        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        total = total.checked_add(component(number, unit)?)?;
        rest = tail;
    }

    Some(total)
}

fn component(number: &str, unit: &str) -> Option<Duration> {
    let millis_per_unit: u64 = match unit {
        "ms" => 1,
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        _ => return None,
    };

    if let Ok(n) = number.parse::<u64>() {
        return n.checked_mul(millis_per_unit).map(Duration::from_millis);
    }

    // Fractional values such as "1.5h".
    let n: f64 = number.parse().ok()?;
    Duration::try_from_secs_f64(n * millis_per_unit as f64 / 1_000.0).ok()
}

/// Lookback window used in range queries, in whole minutes.
///
/// The inactivity duration is rounded down to whole minutes with a floor
/// of one minute, so `90s` and `30s` both become `1m`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookbackWindow {
    minutes: u64,
}

impl LookbackWindow {
    pub fn from_inactivity(inactivity: Duration) -> Self {
        Self {
            minutes: (inactivity.as_secs() / 60).max(1),
        }
    }

    pub fn minutes(&self) -> u64 {
        self.minutes
    }
}

impl fmt::Display for LookbackWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_single_units() {
        assert_eq!(parse_duration("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("30s"), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration("5m"), Some(Duration::from_secs(300)));
        assert_eq!(parse_duration("2h"), Some(Duration::from_secs(7200)));
    }

    #[test]
    fn parse_duration_compound() {
        assert_eq!(parse_duration("1m30s"), Some(Duration::from_secs(90)));
        assert_eq!(parse_duration("1h5m"), Some(Duration::from_secs(3900)));
        assert_eq!(parse_duration("1s250ms"), Some(Duration::from_millis(1250)));
    }

    #[test]
    fn parse_duration_fractional() {
        assert_eq!(parse_duration("1.5h"), Some(Duration::from_secs(5400)));
        assert_eq!(parse_duration("0.5m"), Some(Duration::from_secs(30)));
    }

    #[test]
    fn parse_duration_plain_number_as_seconds() {
        assert_eq!(parse_duration("45"), Some(Duration::from_secs(45)));
        assert_eq!(parse_duration(" 10 "), Some(Duration::from_secs(10)));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert_eq!(parse_duration(""), None);
        assert_eq!(parse_duration("five minutes"), None);
        assert_eq!(parse_duration("5x"), None);
        assert_eq!(parse_duration("1m30"), None);
        assert_eq!(parse_duration("m"), None);
        assert_eq!(parse_duration("-5m"), None);
    }

    #[test]
    fn lookback_window_rounds_down_to_minutes() {
        let w = LookbackWindow::from_inactivity(Duration::from_secs(90));
        assert_eq!(w.minutes(), 1);
        assert_eq!(w.to_string(), "1m");

        let w = LookbackWindow::from_inactivity(Duration::from_secs(659));
        assert_eq!(w.to_string(), "10m");

        let w = LookbackWindow::from_inactivity(Duration::from_secs(300));
        assert_eq!(w.to_string(), "5m");
    }

    #[test]
    fn lookback_window_never_collapses_to_zero() {
        let w = LookbackWindow::from_inactivity(Duration::from_secs(30));
        assert_eq!(w.to_string(), "1m");

        let w = LookbackWindow::from_inactivity(Duration::ZERO);
        assert_eq!(w.minutes(), 1);
    }
}
