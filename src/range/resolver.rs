//! Range resolution
//!
//! Turns a selection into backend query parameters and into the
//! descriptor half of a panel cache key. Resolution never fails; an
//! absent selection resolves to the default `24h` window.

use super::types::{RangeToken, TimeRange};

/// Sentinel used in cache keys when no user is selected
pub const DEFAULT_USER_KEY: &str = "default";

/// Query parameters sent to a metric endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pub user_id: Option<String>,
    pub range: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

impl QueryParams {
    /// Parameters as ordered key/value pairs, absent values omitted
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        let mut pairs = Vec::with_capacity(3);
        if let Some(user) = &self.user_id {
            pairs.push(("user_id", user.as_str()));
        }
        if let Some(range) = &self.range {
            pairs.push(("range", range.as_str()));
        }
        if let Some(from) = &self.from {
            pairs.push(("from", from.as_str()));
        }
        if let Some(to) = &self.to {
            pairs.push(("to", to.as_str()));
        }
        pairs
    }

    /// Percent-encoded query string without the leading `?`
    pub fn to_query_string(&self) -> String {
        self.pairs()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Append these parameters to an endpoint path
    pub fn apply_to(&self, path: &str) -> String {
        let query = self.to_query_string();
        if query.is_empty() {
            path.to_string()
        } else if path.contains('?') {
            format!("{}&{}", path, query)
        } else {
            format!("{}?{}", path, query)
        }
    }
}

/// Resolve a selection into query parameters.
///
/// Dates are always emitted as `YYYY-MM-DD`. One-sided ranges are passed
/// through as partial filters without a `range` token.
pub fn resolve(user_id: Option<&str>, range: Option<&TimeRange>) -> QueryParams {
    let mut params = QueryParams {
        user_id: user_id.filter(|u| !u.is_empty()).map(str::to_string),
        ..Default::default()
    };

    match range {
        None => params.range = Some(RangeToken::default().to_string()),
        Some(TimeRange::Relative(token)) => params.range = Some(token.to_string()),
        Some(TimeRange::Absolute { from, to }) => {
            params.from = Some(iso_date(from));
            params.to = Some(iso_date(to));
        }
        Some(TimeRange::Since(from)) => params.from = Some(iso_date(from)),
        Some(TimeRange::Until(to)) => params.to = Some(iso_date(to)),
    }

    params
}

/// Range half of a cache key: `{from}-{to}` for dates, the token otherwise
pub fn range_descriptor(range: Option<&TimeRange>) -> String {
    match range {
        None => RangeToken::default().to_string(),
        Some(TimeRange::Relative(token)) => token.to_string(),
        Some(TimeRange::Absolute { from, to }) => format!("{}-{}", iso_date(from), iso_date(to)),
        Some(TimeRange::Since(from)) => format!("{}-", iso_date(from)),
        Some(TimeRange::Until(to)) => format!("-{}", iso_date(to)),
    }
}

/// Full cache key for a `(user, range)` selection
pub fn cache_key(user_id: Option<&str>, range: Option<&TimeRange>) -> String {
    let user = user_id.filter(|u| !u.is_empty()).unwrap_or(DEFAULT_USER_KEY);
    format!("{}|{}", user, range_descriptor(range))
}

fn iso_date(date: &chrono::NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
