use grun_model::LABEL_SCHEMA_DELIMITER;

/// Strategy deciding whether one offered label satisfies one required label.
///
/// Rules are registered in a [`crate::CapabilityMatcher`]; a requirement is met when any rule accepts any offered label.
pub trait LabelRule: Send + Sync + 'static {
    /// Rule name used in logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Returns `true` if `offered` satisfies `required`.
    fn satisfies(&self, required: &str, offered: &str) -> bool;
}

/// Plain string equality.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactLabelRule;

impl LabelRule for ExactLabelRule {
    fn name(&self) -> &'static str {
        "exact"
    }

    #[inline]
    fn satisfies(&self, required: &str, offered: &str) -> bool {
        required == offered
    }
}

/// Equality, or `offered` has the schema form `<required>:<detail>`.
///
/// `ubuntu-latest` is satisfied by `ubuntu-latest:docker://node:16` but not by `ubuntu-latest-arm`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaLabelRule;

impl LabelRule for SchemaLabelRule {
    fn name(&self) -> &'static str {
        "schema"
    }

    fn satisfies(&self, required: &str, offered: &str) -> bool {
        if required == offered {
            return true;
        }
        offered
            .strip_prefix(required)
            .is_some_and(|rest| rest.starts_with(LABEL_SCHEMA_DELIMITER))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_rule_ignores_schema_suffix() {
        assert!(ExactLabelRule.satisfies("linux", "linux"));
        assert!(!ExactLabelRule.satisfies("linux", "linux:host"));
    }

    #[test]
    fn schema_rule_accepts_base_with_detail() {
        let rule = SchemaLabelRule;
        assert!(rule.satisfies("ubuntu-latest", "ubuntu-latest"));
        assert!(rule.satisfies("ubuntu-latest", "ubuntu-latest:docker://node:16"));
        assert!(rule.satisfies("ubuntu-latest", "ubuntu-latest:host"));
    }

    #[test]
    fn schema_rule_rejects_plain_prefix_without_delimiter() {
        let rule = SchemaLabelRule;
        assert!(!rule.satisfies("ubuntu", "ubuntu-latest:docker://node:16"));
        assert!(!rule.satisfies("ubuntu-latest", "ubuntu-latest-arm:host"));
        assert!(!rule.satisfies("ubuntu-22.04", "ubuntu-latest:docker://node:16"));
    }

    #[test]
    fn schema_rule_is_directional() {
        // The offered side carries the detail, never the required side.
        assert!(!SchemaLabelRule.satisfies("ubuntu-latest:docker://node:16", "ubuntu-latest"));
    }
}
