//! Temporal ranking of events.
//!
//! Every event falls into one of three buckets relative to "now":
//!
//! | bucket | meaning | order inside bucket |
//! |--------|---------|---------------------|
//! | 0 | starts within the next seven days (bounds inclusive) | earliest first |
//! | 1 | further out | earliest first |
//! | 2 | already in the past | most recently passed first |
//!
//! Expired events sort on the negated timestamp, which turns the ascending
//! sort into "latest first" for that bucket only.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::models::Event;

pub const SOON_WINDOW_DAYS: i64 = 7;

const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_HOUR: i64 = 3_600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    Soon = 0,
    Upcoming = 1,
    Expired = 2,
}

/// An event with its urgency flags. `days_left`/`hours_left` go negative
/// once the event has passed.
#[derive(Debug, Clone, Serialize)]
pub struct RankedEvent {
    #[serde(flatten)]
    pub event: Event,
    pub is_expired: bool,
    pub is_soon: bool,
    pub days_left: i64,
    pub hours_left: i64,
    pub bucket: Bucket,
}

impl RankedEvent {
    pub fn new(event: Event, now: DateTime<Utc>) -> Self {
        let soon_until = now + Duration::days(SOON_WINDOW_DAYS);
        let is_expired = event.date < now;
        let is_soon = now <= event.date && event.date <= soon_until;

        let seconds = floor_seconds(event.date - now);
        let bucket = if is_soon {
            Bucket::Soon
        } else if !is_expired {
            Bucket::Upcoming
        } else {
            Bucket::Expired
        };

        Self {
            event,
            is_expired,
            is_soon,
            days_left: seconds.div_euclid(SECONDS_PER_DAY),
            hours_left: seconds.div_euclid(SECONDS_PER_HOUR),
            bucket,
        }
    }

    fn sort_key(&self) -> (Bucket, i64) {
        let ts = self.event.date.timestamp_micros();
        (self.bucket, if self.is_expired { -ts } else { ts })
    }
}

/// Annotates and orders `events` relative to `now`. The sort is stable, so
/// events with identical keys keep their input order.
pub fn prioritize(events: Vec<Event>, now: DateTime<Utc>) -> Vec<RankedEvent> {
    let mut ranked: Vec<RankedEvent> = events
        .into_iter()
        .map(|event| RankedEvent::new(event, now))
        .collect();
    ranked.sort_by_key(RankedEvent::sort_key);
    ranked
}

/// Whole seconds of `delta`, rounded towards negative infinity.
fn floor_seconds(delta: Duration) -> i64 {
    let secs = delta.num_seconds();
    if delta.subsec_nanos() < 0 {
        secs - 1
    } else {
        secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::test_support::event_at;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn titles(ranked: &[RankedEvent]) -> Vec<&str> {
        ranked.iter().map(|r| r.event.title.as_str()).collect()
    }

    #[test]
    fn three_days_out_is_soon() {
        let now = fixed_now();
        let ranked = RankedEvent::new(event_at("a", now + Duration::days(3)), now);
        assert!(ranked.is_soon);
        assert!(!ranked.is_expired);
        assert_eq!(ranked.bucket, Bucket::Soon);
        assert_eq!(ranked.days_left, 3);
        assert_eq!(ranked.hours_left, 72);
    }

    #[test]
    fn two_days_ago_is_expired() {
        let now = fixed_now();
        let ranked = RankedEvent::new(event_at("a", now - Duration::days(2)), now);
        assert!(ranked.is_expired);
        assert!(!ranked.is_soon);
        assert_eq!(ranked.bucket, Bucket::Expired);
        assert_eq!(ranked.days_left, -2);
    }

    #[test]
    fn thirty_days_out_is_upcoming() {
        let now = fixed_now();
        let ranked = RankedEvent::new(event_at("a", now + Duration::days(30)), now);
        assert!(!ranked.is_soon);
        assert!(!ranked.is_expired);
        assert_eq!(ranked.bucket, Bucket::Upcoming);
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let now = fixed_now();
        let at_now = RankedEvent::new(event_at("now", now), now);
        assert!(at_now.is_soon);
        assert!(!at_now.is_expired);

        let at_edge = RankedEvent::new(event_at("edge", now + Duration::days(7)), now);
        assert!(at_edge.is_soon);

        let past_edge = RankedEvent::new(
            event_at("past edge", now + Duration::days(7) + Duration::seconds(1)),
            now,
        );
        assert!(!past_edge.is_soon);
        assert_eq!(past_edge.bucket, Bucket::Upcoming);

        let just_gone = RankedEvent::new(event_at("gone", now - Duration::seconds(1)), now);
        assert!(just_gone.is_expired);
        assert!(!just_gone.is_soon);
    }

    #[test]
    fn time_left_is_floor_divided() {
        let now = fixed_now();
        let ranked = RankedEvent::new(event_at("a", now + Duration::hours(47)), now);
        assert_eq!(ranked.days_left, 1);
        assert_eq!(ranked.hours_left, 47);

        let ranked = RankedEvent::new(event_at("b", now - Duration::minutes(30)), now);
        assert_eq!(ranked.days_left, -1);
        assert_eq!(ranked.hours_left, -1);

        let ranked = RankedEvent::new(event_at("c", now - Duration::milliseconds(1)), now);
        assert_eq!(ranked.hours_left, -1);
    }

    #[test]
    fn buckets_sort_soon_then_upcoming_then_expired() {
        let now = fixed_now();
        let events = vec![
            event_at("expired-old", now - Duration::days(20)),
            event_at("upcoming-late", now + Duration::days(60)),
            event_at("soon-late", now + Duration::days(6)),
            event_at("expired-recent", now - Duration::days(1)),
            event_at("upcoming-early", now + Duration::days(10)),
            event_at("soon-early", now + Duration::hours(2)),
        ];

        let ranked = prioritize(events, now);
        assert_eq!(
            titles(&ranked),
            vec![
                "soon-early",
                "soon-late",
                "upcoming-early",
                "upcoming-late",
                "expired-recent",
                "expired-old",
            ]
        );
        assert!(ranked.windows(2).all(|w| w[0].bucket <= w[1].bucket));
    }

    #[test]
    fn expired_bucket_is_latest_first() {
        let now = fixed_now();
        let events = (1..=5)
            .map(|d| event_at(&format!("d{d}"), now - Duration::days(d)))
            .rev()
            .collect();

        let ranked = prioritize(events, now);
        let dates: Vec<_> = ranked.iter().map(|r| r.event.date).collect();
        assert!(dates.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn equal_keys_keep_input_order() {
        let now = fixed_now();
        let when = now + Duration::days(2);
        let events = vec![event_at("first", when), event_at("second", when), event_at("third", when)];

        let ranked = prioritize(events, now);
        assert_eq!(titles(&ranked), vec!["first", "second", "third"]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(prioritize(Vec::new(), fixed_now()).is_empty());
    }

    #[test]
    fn ranked_event_serializes_flat() {
        let now = fixed_now();
        let ranked = RankedEvent::new(event_at("flat", now + Duration::days(1)), now);
        let json = serde_json::to_value(&ranked).unwrap();
        assert_eq!(json["title"], "flat");
        assert_eq!(json["is_soon"], true);
        assert_eq!(json["bucket"], "soon");
    }
}
