use std::{fmt, sync::Arc};

use grun_model::QueuedJob;
use tracing::trace;

use crate::capability::{Capabilities, LabelRule, SchemaLabelRule};

/// Decides whether a job's required labels are covered by a pool's capabilities.
///
/// Rules are checked in the order they were registered; the first rule that accepts a pair wins.
/// The default matcher carries a single [`SchemaLabelRule`].
#[derive(Clone)]
pub struct CapabilityMatcher {
    rules: Vec<Arc<dyn LabelRule>>,
}

impl CapabilityMatcher {
    /// Create a matcher without any rules.
    ///
    /// Such a matcher accepts only jobs without requirements.
    #[inline]
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Register an additional rule.
    #[inline]
    pub fn register(&mut self, rule: Arc<dyn LabelRule>) {
        self.rules.push(rule);
    }

    /// Builder-style variant of [`CapabilityMatcher::register`].
    #[inline]
    pub fn with_rule(mut self, rule: Arc<dyn LabelRule>) -> Self {
        self.register(rule);
        self
    }

    /// Returns `true` if every required label is satisfied by some offered label.
    ///
    /// A job without requirements matches any pool.
    pub fn matches(&self, required: &[String], offered: &Capabilities) -> bool {
        required.iter().all(|req| {
            offered
                .iter()
                .any(|off| self.rules.iter().any(|rule| rule.satisfies(req, off)))
        })
    }

    /// Keep only the jobs this pool can serve, preserving order.
    pub fn retain_matching(&self, jobs: &mut Vec<QueuedJob>, offered: &Capabilities) {
        jobs.retain(|job| {
            let ok = self.matches(&job.labels, offered);
            trace!(job = job.id, labels = ?job.labels, matched = ok, "capability check");
            ok
        });
    }
}

impl Default for CapabilityMatcher {
    fn default() -> Self {
        Self::empty().with_rule(Arc::new(SchemaLabelRule))
    }
}

impl fmt::Debug for CapabilityMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.rules.iter().map(|r| r.name()).collect();
        f.debug_struct("CapabilityMatcher")
            .field("rules", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::ExactLabelRule;

    fn labels(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_requirements_match_any_pool() {
        let m = CapabilityMatcher::default();
        assert!(m.matches(&[], &Capabilities::default()));
        assert!(m.matches(&[], &Capabilities::new(["linux"])));
        assert!(CapabilityMatcher::empty().matches(&[], &Capabilities::new(["linux"])));
    }

    #[test]
    fn requirements_must_be_subset_of_capabilities() {
        let m = CapabilityMatcher::default();
        let caps = Capabilities::new(["linux", "x64", "docker"]);

        assert!(m.matches(&labels(&["linux", "x64"]), &caps));
        assert!(!m.matches(&labels(&["linux", "arm64"]), &caps));
    }

    #[test]
    fn pool_may_offer_more_than_required_but_not_less() {
        let m = CapabilityMatcher::default();
        let small = Capabilities::new(["linux"]);
        let required = labels(&["linux", "docker"]);
        assert!(!m.matches(&required, &small));

        let big = Capabilities::new(["linux", "docker", "gpu"]);
        assert!(m.matches(&required, &big));
    }

    #[test]
    fn schema_labels_satisfy_their_base_name() {
        let m = CapabilityMatcher::default();
        let caps = Capabilities::new(["ubuntu-latest:docker://node:16"]);

        assert!(m.matches(&labels(&["ubuntu-latest"]), &caps));
        assert!(!m.matches(&labels(&["ubuntu-22.04"]), &caps));
    }

    #[test]
    fn exact_only_matcher_rejects_schema_form() {
        let m = CapabilityMatcher::empty().with_rule(Arc::new(ExactLabelRule));
        let caps = Capabilities::new(["ubuntu-latest:docker://node:16"]);
        assert!(!m.matches(&labels(&["ubuntu-latest"]), &caps));
    }

    #[test]
    fn retain_matching_preserves_order() {
        let m = CapabilityMatcher::default();
        let caps = Capabilities::new(["linux", "x64"]);
        let mut jobs = vec![
            QueuedJob::new(1, ["linux", "x64"]),
            QueuedJob::new(2, ["linux", "arm64"]),
            QueuedJob::new(3, Vec::<String>::new()),
            QueuedJob::new(4, ["x64"]),
        ];
        m.retain_matching(&mut jobs, &caps);
        let ids: Vec<_> = jobs.iter().map(|j| j.id).collect();
        assert_eq!(ids, vec![1, 3, 4]);
    }

    #[test]
    fn debug_lists_rule_names() {
        let s = format!("{:?}", CapabilityMatcher::default());
        assert!(s.contains("schema"));
    }
}
