use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide sequence for workload names.
static WORKLOAD_SEQ: AtomicU64 = AtomicU64::new(1);

fn next_seq() -> u64 {
    WORKLOAD_SEQ.fetch_add(1, Ordering::Relaxed)
}

/// Build a unique workload name.
///
/// Format: `{prefix}-{pool}-{seq:x}`.
/// - `prefix` — configured runner name prefix
/// - `pool`   — pool name
/// - `seq`    — per-process hex sequence
pub fn make_workload_name(prefix: &str, pool: &str) -> String {
    format!("{prefix}-{pool}-{seq:x}", seq = next_seq())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique_and_prefixed() {
        let a = make_workload_name("grun", "linux");
        let b = make_workload_name("grun", "linux");
        assert_ne!(a, b);
        assert!(a.starts_with("grun-linux-"));
        assert!(u64::from_str_radix(a.rsplit('-').next().unwrap(), 16).is_ok());
    }
}
