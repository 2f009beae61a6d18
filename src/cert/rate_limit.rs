// ABOUTME: Rate-limit windows parsed from issuer rejections.
// ABOUTME: Retry-after extraction is permissive; unparseable text yields no window.

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static RETRY_AFTER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)retry\s+after[:\s]+([^\n]+)").expect("valid regex"));
static ISO_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:\s*(?:Z|UTC|GMT|[+-]\d{2}:?\d{2}))?",
    )
    .expect("valid regex")
});
static RFC2822_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?:[A-Za-z]{3},\s*)?\d{1,2}\s+[A-Za-z]{3}\s+\d{4}\s+\d{2}:\d{2}:\d{2}\s+(?:[+-]\d{4}|GMT|UTC|UT)",
    )
    .expect("valid regex")
});
static EPOCH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{9,11}\b").expect("valid regex"));

/// A period during which the issuer will reject reissuance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitWindow {
    pub retry_not_before: DateTime<Utc>,
}

impl RateLimitWindow {
    /// Window from a rejection message, only when the retry time is still ahead.
    pub fn from_response(text: &str, now: DateTime<Utc>) -> Option<Self> {
        parse_retry_after(text)
            .filter(|at| *at > now)
            .map(|retry_not_before| Self { retry_not_before })
    }

    pub fn has_passed(&self, now: DateTime<Utc>) -> bool {
        now >= self.retry_not_before
    }
}

/// Find the retry time in an issuer message.
///
/// Looks after "retry after" when present, otherwise scans the whole text.
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS UTC`, RFC 2822, and Unix epoch seconds.
pub fn parse_retry_after(text: &str) -> Option<DateTime<Utc>> {
    let tail = RETRY_AFTER_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim());

    match tail {
        Some(tail) => parse_timestamp(tail),
        None => parse_timestamp(text),
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    if let Some(m) = ISO_RE.find(text)
        && let Some(at) = parse_iso(m.as_str())
    {
        return Some(at);
    }
    if let Some(m) = RFC2822_RE.find(text)
        && let Some(at) = parse_rfc2822(m.as_str())
    {
        return Some(at);
    }
    EPOCH_RE
        .find(text.trim_start())
        .and_then(|m| m.as_str().parse::<i64>().ok())
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
}

fn parse_iso(candidate: &str) -> Option<DateTime<Utc>> {
    let candidate = candidate.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(&candidate.replacen(' ', "T", 1)) {
        return Some(at.with_timezone(&Utc));
    }

    // Naive forms: a trailing zone word means UTC, no zone is read as UTC too.
    let upper = candidate.to_ascii_uppercase();
    let naive = upper
        .trim_end_matches("UTC")
        .trim_end_matches("GMT")
        .trim_end_matches('Z')
        .trim()
        .replacen('T', " ", 1);
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&naive, fmt).ok())
        .map(|dt| dt.and_utc())
        .or_else(|| {
            // Offsets without a colon, e.g. +0000.
            DateTime::parse_from_str(&candidate.replacen(' ', "T", 1), "%Y-%m-%dT%H:%M:%S%z")
                .ok()
                .map(|at| at.with_timezone(&Utc))
        })
}

fn parse_rfc2822(candidate: &str) -> Option<DateTime<Utc>> {
    let normalized = candidate.replace("UTC", "+0000");
    DateTime::parse_from_rfc2822(&normalized)
        .ok()
        .map(|at| at.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn letsencrypt_rfc3339_message() {
        let msg = "Error creating new order :: too many certificates (5) already issued for this \
                   exact set of domains in the last 168h0m0s, retry after 2026-10-21T03:04:05Z: see \
                   https://letsencrypt.org/docs/rate-limits/";
        assert_eq!(parse_retry_after(msg), Some(at("2026-10-21T03:04:05Z")));
    }

    #[test]
    fn space_separated_utc_form() {
        let msg = "Rate limit hit, retry after 2026-10-21 03:04:05 UTC";
        assert_eq!(parse_retry_after(msg), Some(at("2026-10-21T03:04:05Z")));
    }

    #[test]
    fn offset_forms() {
        assert_eq!(
            parse_retry_after("retry after 2026-10-21T05:04:05+02:00"),
            Some(at("2026-10-21T03:04:05Z"))
        );
        assert_eq!(
            parse_retry_after("retry after 2026-10-21T05:04:05+0200"),
            Some(at("2026-10-21T03:04:05Z"))
        );
    }

    #[test]
    fn rfc2822_form() {
        assert_eq!(
            parse_retry_after("Retry-After: retry after Wed, 21 Oct 2026 03:04:05 GMT"),
            Some(at("2026-10-21T03:04:05Z"))
        );
    }

    #[test]
    fn epoch_seconds() {
        assert_eq!(
            parse_retry_after("retry after 1792551845"),
            Utc.timestamp_opt(1_792_551_845, 0).single()
        );
    }

    #[test]
    fn unparseable_text_is_none() {
        assert_eq!(parse_retry_after("retry after a while"), None);
        assert_eq!(parse_retry_after("rate limited"), None);
        assert_eq!(parse_retry_after(""), None);
    }

    #[test]
    fn window_requires_future_time() {
        let now = at("2026-10-20T00:00:00Z");
        let future = RateLimitWindow::from_response("retry after 2026-10-21T00:00:00Z", now);
        assert_eq!(
            future.map(|w| w.retry_not_before),
            Some(at("2026-10-21T00:00:00Z"))
        );
        assert!(RateLimitWindow::from_response("retry after 2026-10-19T00:00:00Z", now).is_none());

        let window = future.unwrap();
        assert!(!window.has_passed(now));
        assert!(window.has_passed(now + Duration::days(2)));
    }
}
