use std::fmt;

use grun_model::LABEL_SCHEMA_DELIMITER;

/// Base name of a runner label: everything before the first schema delimiter.
///
/// `ubuntu-latest:docker://node:16` -> `ubuntu-latest`, `linux` -> `linux`.
#[inline]
pub fn base_name(label: &str) -> &str {
    label
        .split_once(LABEL_SCHEMA_DELIMITER)
        .map_or(label, |(base, _)| base)
}

/// Capability set actually offered by a pool.
///
/// Ordered and free of duplicates; order only matters for the joined form handed to launched runners.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Capabilities(Vec<String>);

impl Capabilities {
    /// Build a set from raw labels, trimming blanks and dropping duplicates (first occurrence wins).
    pub fn new<I, L>(labels: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for label in labels {
            let label = label.as_ref().trim();
            if label.is_empty() || out.iter().any(|l| l == label) {
                continue;
            }
            out.push(label.to_string());
        }
        Self(out)
    }

    /// Merge declared pool labels with defaults.
    ///
    /// Declared labels come first. A default is added only if no declared label shares its base name,
    /// so `ubuntu-latest:host` replaces the default `ubuntu-latest:docker://...`.
    pub fn effective<D>(declared: &[String], defaults: &[D]) -> Self
    where
        D: AsRef<str>,
    {
        let declared = Self::new(declared);
        let mut out = declared.0.clone();
        for default in defaults {
            let default = default.as_ref().trim();
            if default.is_empty() {
                continue;
            }
            let base = base_name(default);
            if declared.iter().any(|l| base_name(l) == base) || out.iter().any(|l| l == default) {
                continue;
            }
            out.push(default.to_string());
        }
        Self(out)
    }

    /// Iterate over all labels.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Comma-joined form, as expected by the runner registration.
    pub fn joined(&self) -> String {
        self.0.join(",")
    }
}

impl fmt::Display for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.joined())
    }
}
