//! Clip time values used by cut lists

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A point or span of time, either plain seconds or a timecode string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClipTime {
    /// Seconds as a JSON number
    Secs(f64),
    /// `S`, `M:SS` or `H:MM:SS`, seconds optionally fractional
    Timecode(String),
}

impl ClipTime {
    /// Resolves the value to seconds
    pub fn secs(&self) -> Result<f64> {
        match self {
            ClipTime::Secs(secs) if secs.is_finite() && *secs >= 0.0 => Ok(*secs),
            ClipTime::Secs(secs) => Err(Error::InvalidClipTime(secs.to_string())),
            ClipTime::Timecode(tc) => parse_clip_time(tc),
        }
    }
}

impl From<f64> for ClipTime {
    fn from(secs: f64) -> Self {
        ClipTime::Secs(secs)
    }
}

impl From<&str> for ClipTime {
    fn from(tc: &str) -> Self {
        ClipTime::Timecode(tc.to_string())
    }
}

/// Parses a timecode string into seconds.
///
/// Minute and second fields following a larger unit must be below 60.
pub fn parse_clip_time(tc: &str) -> Result<f64> {
    let invalid = || Error::InvalidClipTime(tc.to_string());

    let parts: Vec<&str> = tc.trim().split(':').collect();
    if parts.len() > 3 || parts.iter().any(|p| p.is_empty()) {
        return Err(invalid());
    }

    let (units, secs_part) = parts.split_at(parts.len() - 1);
    let secs: f64 = secs_part[0].parse().map_err(|_| invalid())?;
    if !secs.is_finite() || secs < 0.0 || (!units.is_empty() && secs >= 60.0) {
        return Err(invalid());
    }

    let mut total = 0u64;
    for (i, unit) in units.iter().enumerate() {
        let value: u64 = unit.parse().map_err(|_| invalid())?;
        // hours are unbounded, minutes after an hour field are not
        if i > 0 && value >= 60 {
            return Err(invalid());
        }
        total = total * 60 + value;
    }

    Ok(total as f64 * 60.0 + secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_seconds() {
        assert_eq!(parse_clip_time("3").unwrap(), 3.0);
        assert_eq!(parse_clip_time(" 1.25 ").unwrap(), 1.25);
        assert_eq!(parse_clip_time("75").unwrap(), 75.0);
    }

    #[test]
    fn test_minutes_and_hours() {
        assert_eq!(parse_clip_time("1:05").unwrap(), 65.0);
        assert_eq!(parse_clip_time("0:02.5").unwrap(), 2.5);
        assert_eq!(parse_clip_time("1:00:00").unwrap(), 3600.0);
        assert_eq!(parse_clip_time("2:01:30.5").unwrap(), 7290.5);
    }

    #[test]
    fn test_rejects_malformed() {
        for tc in ["", ":", "1:", "a", "1:2:3:4", "-1", "inf", "NaN", "1:60", "1:60:00", "-1:00"] {
            assert!(
                matches!(parse_clip_time(tc), Err(Error::InvalidClipTime(_))),
                "{:?} should be rejected",
                tc
            );
        }
    }

    #[test]
    fn test_clip_time_from_json() {
        let number: ClipTime = serde_json::from_str("4.5").unwrap();
        assert_eq!(number, ClipTime::Secs(4.5));
        assert_eq!(number.secs().unwrap(), 4.5);

        let text: ClipTime = serde_json::from_str("\"0:03\"").unwrap();
        assert_eq!(text, ClipTime::from("0:03"));
        assert_eq!(text.secs().unwrap(), 3.0);

        assert!(ClipTime::from(-2.0).secs().is_err());
    }
}
