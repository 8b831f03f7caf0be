//! Query-string normalization for the payment listing.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use common_security::MerchantId;
use tracing::debug;

use crate::error::GatewayError;
use crate::models::PaymentFilter;

pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 100;

/// Values in `1..=100` are kept; anything else, including absent or non-numeric input, falls
/// back to the default.
pub fn resolve_limit(raw: Option<&str>) -> u32 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|n| (1..=MAX_LIMIT as i64).contains(n))
        .map(|n| n as u32)
        .unwrap_or(DEFAULT_LIMIT)
}

/// Whitespace-only values count as absent; anything else is forwarded exactly as sent.
fn non_empty(params: &HashMap<String, String>, name: &str) -> Option<String> {
    params.get(name).filter(|v| !v.trim().is_empty()).cloned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreatedRange {
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
}

enum Point {
    Day(NaiveDate),
    Instant(DateTime<Utc>),
}

fn start_of(day: NaiveDate) -> Option<DateTime<Utc>> {
    day.and_hms_opt(0, 0, 0).map(|naive| Utc.from_utc_datetime(&naive))
}

impl Point {
    fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            return Some(Point::Day(day));
        }
        if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
            return Some(Point::Instant(ts.with_timezone(&Utc)));
        }
        raw.parse::<i64>()
            .ok()
            .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
            .map(Point::Instant)
    }

    /// First instant at or after the point.
    fn start(&self) -> Option<DateTime<Utc>> {
        match self {
            Point::Day(day) => start_of(*day),
            Point::Instant(ts) => Some(*ts),
        }
    }

    /// First instant strictly after the point (next day for dates, next second for timestamps).
    fn after(&self) -> Option<DateTime<Utc>> {
        match self {
            Point::Day(day) => day.succ_opt().and_then(start_of),
            Point::Instant(ts) => ts.checked_add_signed(Duration::seconds(1)),
        }
    }
}

/// Parses `gte:2023-01-01,lte:2023-12-31` style expressions. A bare value means `gte`.
/// Returns `None` for anything that does not form a consistent range.
pub fn parse_created(expr: &str) -> Option<CreatedRange> {
    let mut range = CreatedRange { after: None, before: None };
    let mut terms = 0;
    for term in expr.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        terms += 1;
        let (op, value) = match term.split_once(':') {
            Some((op, value)) if matches!(op, "gt" | "gte" | "lt" | "lte") => (op, value),
            _ => ("gte", term),
        };
        let point = Point::parse(value)?;
        match op {
            "gte" => range.after = range.after.max(Some(point.start()?)),
            "gt" => range.after = range.after.max(Some(point.after()?)),
            "lt" => range.before = min_bound(range.before, point.start()?),
            "lte" => range.before = min_bound(range.before, point.after()?),
            _ => return None,
        }
    }
    if terms == 0 {
        return None;
    }
    if let (Some(after), Some(before)) = (range.after, range.before) {
        if after >= before {
            return None;
        }
    }
    Some(range)
}

fn min_bound(current: Option<DateTime<Utc>>, candidate: DateTime<Utc>) -> Option<DateTime<Utc>> {
    Some(current.map_or(candidate, |c| c.min(candidate)))
}

/// The most recent complete calendar month before `now`, in UTC.
pub fn last_complete_month(now: DateTime<Utc>) -> CreatedRange {
    let this_month = NaiveDate::from_ymd_opt(now.year(), now.month(), 1);
    let previous = this_month.and_then(|first| {
        let (year, month) = if first.month() == 1 {
            (first.year() - 1, 12)
        } else {
            (first.year(), first.month() - 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
    });
    CreatedRange {
        after: previous.and_then(start_of),
        before: this_month.and_then(start_of),
    }
}

/// Builds the filter forwarded to the processor. The merchant always comes from the
/// authenticated context; a `merchant_id` query parameter is never read.
pub fn build(
    merchant_id: &MerchantId,
    params: &HashMap<String, String>,
    now: DateTime<Utc>,
) -> Result<PaymentFilter, GatewayError> {
    let starting_after = non_empty(params, "starting_after");
    let ending_before = non_empty(params, "ending_before");
    if starting_after.is_some() && ending_before.is_some() {
        return Err(GatewayError::Validation(
            "starting_after and ending_before cannot be combined".into(),
        ));
    }

    let created = non_empty(params, "created").map(|expr| {
        parse_created(&expr).unwrap_or_else(|| {
            debug!(created = %expr, "unparseable created filter, using last complete month");
            last_complete_month(now)
        })
    });

    Ok(PaymentFilter {
        merchant_id: merchant_id.clone(),
        limit: resolve_limit(params.get("limit").map(String::as_str)),
        starting_after,
        ending_before,
        status: non_empty(params, "status"),
        created_after: created.and_then(|r| r.after),
        created_before: created.and_then(|r| r.before),
    })
}
