//! Machine Level Monitor
//!
//! Turns raw machine documents into operator notifications: threshold
//! crossings on cup inventory and liquid level, plus one message per refund.
//! Everything in here is synchronous and stateless.

pub mod compose;
pub mod error;
pub mod evaluator;
pub mod normalize;
pub mod refund;
pub mod rules;
pub mod types;


pub use compose::compose_alert;
pub use error::MonitorError;
pub use evaluator::evaluate;
pub use normalize::{normalize_refund, normalize_snapshot, RefundKey};
pub use refund::map_refund;
pub use rules::{ResourceKey, RuleSet, ThresholdRule};
pub use types::*;
