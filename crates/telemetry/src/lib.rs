//! Request correlation and structured operation logging for Gantry
//!
//! Wraps business operations with start/end/error log events, all carrying
//! one time-ordered correlation identifier. The identifier lives in
//! task-local storage scoped to the logical operation and is cleared on
//! every exit path.
//!
//! ```ignore
//! use gantry_telemetry::{correlation, observed, ObserveConfig, OperationInfo};
//!
//! let result = correlation::with_scope(async {
//!     observed(
//!         &ObserveConfig::default(),
//!         &OperationInfo::new("OrderService", "update_order"),
//!         || async { update_order(id, payload).await },
//!     )
//!     .await
//! })
//! .await;
//! ```

pub mod component;
pub mod correlation;
pub mod observe;

pub use component::{Component, ComponentFilter};
pub use correlation::CorrelationId;
pub use observe::{observed, ObserveConfig, OperationInfo, Phases};
