// ABOUTME: Property tests for retry-after extraction from issuer rejections.
// ABOUTME: Parsing never panics and recovers timestamps it was handed.

use chrono::{DateTime, Duration, SecondsFormat, TimeZone, Utc};
use hubstack::cert::{RateLimitWindow, parse_retry_after};
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_arbitrary_text_never_panics(text in ".{0,200}") {
        let _ = parse_retry_after(&text);
        let _ = RateLimitWindow::from_response(&text, Utc::now());
    }

    #[test]
    fn prop_rfc3339_after_marker_parses_back(secs in 1_600_000_000i64..2_200_000_000i64) {
        let at: DateTime<Utc> = Utc.timestamp_opt(secs, 0).unwrap();
        let msg = format!(
            "too many certificates already issued, retry after {}: see docs",
            at.to_rfc3339_opts(SecondsFormat::Secs, true)
        );
        prop_assert_eq!(parse_retry_after(&msg), Some(at));
    }

    #[test]
    fn prop_past_retry_time_opens_no_window(ago in 1i64..10_000_000) {
        let now = Utc::now();
        let past = now - Duration::seconds(ago);
        let msg = format!("retry after {}", past.to_rfc3339_opts(SecondsFormat::Secs, true));
        prop_assert!(RateLimitWindow::from_response(&msg, now).is_none());
    }
}

#[test]
fn future_window_expires_at_the_retry_time() {
    let now = Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap();
    let window =
        RateLimitWindow::from_response("retry after 2026-10-20 12:00:00 UTC", now).unwrap();

    assert!(!window.has_passed(now));
    assert!(window.has_passed(now + Duration::days(1)));
}

#[test]
fn message_without_time_yields_nothing() {
    assert_eq!(parse_retry_after("urn:ietf:params:acme:error:rateLimited"), None);
}
