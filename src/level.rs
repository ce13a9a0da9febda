use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref LEVEL_REGEX: Regex = Regex::new(r"^[Ll]?\s*-?\s*([0-9]+)$").unwrap();
}

/// Level used for the cells of a freshly added blank manual row.
pub const FALLBACK_LEVEL: &str = "L-1";

/// Ordered set of configured skill level labels, lowest first.
///
/// Deserialization goes through [`LevelScale::new`], so a scale is never empty.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct LevelScale {
    labels: Vec<String>,
}

impl Default for LevelScale {
    /// The five-level scale used when nothing is configured.
    fn default() -> Self {
        Self {
            labels: (1..=5).map(|n| format!("L-{}", n)).collect(),
        }
    }
}

impl LevelScale {
    /// Build a scale from configured labels.
    ///
    /// Blank labels are skipped and duplicates keep their first position. An
    /// empty result falls back to [`LevelScale::default`].
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut out: Vec<String> = Vec::new();
        for label in labels {
            let label = label.as_ref().trim();
            if label.is_empty() || out.iter().any(|l| l == label) {
                continue;
            }
            out.push(label.to_string());
        }

        if out.is_empty() {
            Self::default()
        } else {
            Self { labels: out }
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Lowest level on the scale.
    pub fn min(&self) -> &str {
        &self.labels[0]
    }

    /// Highest level on the scale.
    pub fn max(&self) -> &str {
        &self.labels[self.labels.len() - 1]
    }

    pub fn contains(&self, label: &str) -> bool {
        self.position(label).is_some()
    }

    /// Ordinal of `label` on this scale.
    ///
    /// Labels are compared on their short form, so `L3` and `L-3` are the
    /// same level.
    pub fn position(&self, label: &str) -> Option<usize> {
        let wanted = short_label(label);
        self.labels.iter().position(|l| short_label(l) == wanted)
    }

    /// The configured spelling of `label`, if it is on this scale.
    pub fn canonical(&self, label: &str) -> Option<&str> {
        self.position(label).map(|i| self.labels[i].as_str())
    }
}

impl From<Vec<String>> for LevelScale {
    fn from(labels: Vec<String>) -> Self {
        Self::new(labels)
    }
}

impl From<LevelScale> for Vec<String> {
    fn from(scale: LevelScale) -> Self {
        scale.labels
    }
}

/// Render a level label in its short printed form.
///
/// `L3`, `l-3`, `L - 3` and `3` all become `L-3`; anything else is returned
/// trimmed but otherwise unchanged.
pub fn short_label(label: &str) -> String {
    let trimmed = label.trim();
    match LEVEL_REGEX.captures(trimmed) {
        Some(caps) => format!("L-{}", &caps[1]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_scale_has_five_levels() {
        let scale = LevelScale::default();
        assert_eq!(scale.labels().len(), 5);
        assert_eq!(scale.min(), "L-1");
        assert_eq!(scale.max(), "L-5");
    }

    #[test]
    fn empty_configuration_falls_back() {
        let scale = LevelScale::new(Vec::<String>::new());
        assert_eq!(scale, LevelScale::default());

        let scale = LevelScale::new(["", "  "]);
        assert_eq!(scale, LevelScale::default());
    }

    #[test]
    fn configured_scale_keeps_order_and_drops_duplicates() {
        let scale = LevelScale::new(["L0", "L1", "L1", "L2"]);
        assert_eq!(scale.labels(), &["L0", "L1", "L2"]);
        assert_eq!(scale.min(), "L0");
        assert_eq!(scale.max(), "L2");
    }

    #[test]
    fn deserialized_scale_is_never_empty() {
        let scale: LevelScale = serde_json::from_str("[]").unwrap();
        assert_eq!(scale, LevelScale::default());
        assert_eq!(scale.max(), "L-5");

        let scale: LevelScale = serde_json::from_str(r#"["L0", " ", "L0", "L1"]"#).unwrap();
        assert_eq!(scale.labels(), &["L0", "L1"]);
        assert_eq!(serde_json::to_string(&scale).unwrap(), r#"["L0","L1"]"#);
    }

    #[test]
    fn short_labels() {
        assert_eq!(short_label("L3"), "L-3");
        assert_eq!(short_label("L-3"), "L-3");
        assert_eq!(short_label("l - 4"), "L-4");
        assert_eq!(short_label("2"), "L-2");
        assert_eq!(short_label(" Expert "), "Expert");
    }

    #[test]
    fn positions_ignore_spelling() {
        let scale = LevelScale::new(["L1", "L2", "L3"]);
        assert_eq!(scale.position("L-2"), Some(1));
        assert_eq!(scale.canonical("L-3"), Some("L3"));
        assert!(!scale.contains("L-9"));
    }
}
