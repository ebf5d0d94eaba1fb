//! Metric Panels
//!
//! A panel shows one vital for the current `(user, range)` selection. It
//! serves fresh cache entries directly, otherwise fetches every page of the
//! metric's endpoint, and never lets a superseded fetch touch its state.
//!
//! ## Example
//!
//! ```ignore
//! let panel = MetricPanel::new(MetricKind::HeartRate, fetcher);
//! panel.refresh(&Selection::default().user("u1")).await;
//! println!("{}", panel.view());
//! ```

mod metric_panel;
mod state;
mod view;

pub use metric_panel::{MetricPanel, UpdateCallback};
pub use state::{PanelState, RefreshOutcome, Selection};
pub use view::{format_value, headline_value, CardView, DateFormatter, PanelView, PatternFormatter};
