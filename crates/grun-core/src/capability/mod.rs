//! Capability matching between job requirements and pool labels.
//!
//! A job matches a pool when every label it requires is satisfied by at least one label the pool offers.
//! Requirements must be a subset of capabilities, never the other way around.
//! How a single required label is satisfied is decided by pluggable [`LabelRule`]s.
mod labels;
pub use labels::{Capabilities, base_name};

mod matcher;
pub use matcher::CapabilityMatcher;

mod rule;
pub use rule::{ExactLabelRule, LabelRule, SchemaLabelRule};
