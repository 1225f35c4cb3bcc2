//! Common model-level constants.

/// Separator between the base name and the execution detail of a runner label.
///
/// `ubuntu-latest:docker://node:16-bullseye` has base `ubuntu-latest`.
/// Only the first occurrence splits; the detail may contain further colons.
pub const LABEL_SCHEMA_DELIMITER: char = ':';

/// Labels every runner offers unless the pool declares a label with the same base name.
pub const DEFAULT_RUNNER_LABELS: &[&str] = &[
    "ubuntu-latest:docker://node:16-bullseye",
    "ubuntu-22.04:docker://node:16-bullseye",
    "ubuntu-20.04:docker://node:16-bullseye",
];

/// Delay between two reconciliation passes of the same pool.
pub const DEFAULT_INTERVAL_MS: u64 = 10_000;

/// Hard limit for a single reconciliation pass.
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;
