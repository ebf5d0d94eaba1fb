//! Range Selection
//!
//! Maps the period a user picks onto backend query parameters.
//!
//! - **types**: `RangeToken`, `TimeRange`, `Period`, lenient date parsing
//! - **resolver**: `QueryParams`, `resolve`, cache key composition

mod resolver;
mod types;

pub use resolver::{cache_key, range_descriptor, resolve, QueryParams, DEFAULT_USER_KEY};
pub use types::{parse_date, Period, RangeToken, TimeRange};
