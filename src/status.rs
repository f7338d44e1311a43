use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of a scheduled lecture, derived on read and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LectureStatus {
    Upcoming,
    Live,
    Completed,
}

/// Every lecture runs for exactly one hour; the duration is not stored
/// per lecture.
fn lecture_duration() -> Duration {
    Duration::hours(1)
}

/// Classifies a lecture against `now`. The live window is closed on both
/// ends: `now == start` and `now == start + 1h` are both live.
pub fn classify(scheduled: DateTime<Utc>, now: DateTime<Utc>) -> LectureStatus {
    let end = scheduled + lecture_duration();
    if now < scheduled {
        LectureStatus::Upcoming
    } else if now <= end {
        LectureStatus::Live
    } else {
        LectureStatus::Completed
    }
}

/// Countdown to a lecture start, decomposed into whole days, hours and
/// minutes (1 day = 24h, 1h = 60min, floored at each step).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRemaining {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
}

/// `None` once the lecture has begun.
pub fn time_until(scheduled: DateTime<Utc>, now: DateTime<Utc>) -> Option<TimeRemaining> {
    if now >= scheduled {
        return None;
    }
    let secs = (scheduled - now).num_seconds();
    Some(TimeRemaining {
        days: secs / 86_400,
        hours: secs % 86_400 / 3_600,
        minutes: secs % 3_600 / 60,
    })
}

impl fmt::Display for TimeRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.days > 0 {
            write!(f, "{}d {}h {}m", self.days, self.hours, self.minutes)
        } else if self.hours > 0 {
            write!(f, "{}h {}m", self.hours, self.minutes)
        } else {
            write!(f, "{}m", self.minutes)
        }
    }
}

/// Parse an RFC 3339 timestamp the way it is stored in the database.
pub fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        parse_timestamp(rfc3339).expect("valid timestamp")
    }

    #[test]
    fn test_classify_boundaries() {
        let start = at("2026-03-02T18:00:00Z");

        assert_eq!(classify(start, start - Duration::seconds(1)), LectureStatus::Upcoming);
        assert_eq!(classify(start, start), LectureStatus::Live);
        assert_eq!(classify(start, start + Duration::seconds(3600)), LectureStatus::Live);
        assert_eq!(classify(start, start + Duration::seconds(3601)), LectureStatus::Completed);
    }

    #[test]
    fn test_classify_is_pure() {
        let start = at("2026-03-02T18:00:00Z");
        let now = start + Duration::minutes(30);

        let first = classify(start, now);
        for _ in 0..10 {
            assert_eq!(classify(start, now), first);
        }
        assert_eq!(first, LectureStatus::Live);
    }

    #[test]
    fn test_time_until_decomposition() {
        let start = at("2026-03-02T18:00:00Z");
        let now = start - Duration::days(1) - Duration::hours(2) - Duration::minutes(5);

        let remaining = time_until(start, now).expect("lecture has not begun");
        assert_eq!(remaining, TimeRemaining { days: 1, hours: 2, minutes: 5 });
    }

    #[test]
    fn test_time_until_floors_seconds() {
        let start = at("2026-03-02T18:00:00Z");
        let now = start - Duration::minutes(5) - Duration::seconds(59);

        let remaining = time_until(start, now).expect("lecture has not begun");
        assert_eq!(remaining, TimeRemaining { days: 0, hours: 0, minutes: 5 });
    }

    #[test]
    fn test_time_until_empty_once_started() {
        let start = at("2026-03-02T18:00:00Z");

        assert_eq!(time_until(start, start), None);
        assert_eq!(time_until(start, start + Duration::seconds(1)), None);
    }

    #[test]
    fn test_time_remaining_display() {
        assert_eq!(TimeRemaining { days: 1, hours: 2, minutes: 5 }.to_string(), "1d 2h 5m");
        assert_eq!(TimeRemaining { days: 0, hours: 2, minutes: 5 }.to_string(), "2h 5m");
        assert_eq!(TimeRemaining { days: 0, hours: 0, minutes: 5 }.to_string(), "5m");
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert!(parse_timestamp("2026-03-02T18:00:00Z").is_some());
        assert!(parse_timestamp("next tuesday").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
