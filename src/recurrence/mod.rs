//! Recurring templates: cycle keys, materialization and rule diagnostics.

pub mod lint;
pub mod materialize;
pub mod period;

pub use lint::{lint_template, RuleIssue};
pub use materialize::materialize;
pub use period::period_key;
