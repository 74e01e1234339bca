//! Engine configuration
//!
//! A flat, serde-round-trippable settings object. The host owns persistence
//! (TOML, XML, whatever it likes); the engine only reads armed state, the
//! route template, and the auto-start flag.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::splits::{SplitArea, Template};

/// Which milestones are armed for the current run category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    /// Emit run reset/start events for the opening sequence
    pub auto_start: bool,
    /// Route template filtering which milestone variants count
    pub template: Template,
    /// Armed milestones; disarmed ones never fire
    pub armed: BTreeSet<SplitArea>,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        // Historical defaults: auto start on, only the final split armed
        let mut armed = BTreeSet::new();
        armed.insert(SplitArea::AlduinDefeated);
        Self {
            auto_start: true,
            template: Template::default(),
            armed,
        }
    }
}

impl SplitterConfig {
    /// Whether the given milestone is armed
    pub fn is_armed(&self, area: SplitArea) -> bool {
        self.armed.contains(&area)
    }

    /// Arm a milestone
    pub fn arm(&mut self, area: SplitArea) {
        self.armed.insert(area);
    }

    /// Disarm a milestone
    pub fn disarm(&mut self, area: SplitArea) {
        self.armed.remove(&area);
    }

    /// Arm every milestone (the settings dialog's "check all")
    pub fn arm_all(&mut self) {
        self.armed.extend(SplitArea::ALL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_settings() {
        let config = SplitterConfig::default();
        assert!(config.auto_start);
        assert_eq!(config.template, Template::MrWalrus);
        assert!(config.is_armed(SplitArea::AlduinDefeated));
        assert!(!config.is_armed(SplitArea::Whiterun));
        assert_eq!(config.armed.len(), 1);
    }

    #[test]
    fn arm_and_disarm() {
        let mut config = SplitterConfig::default();
        config.arm(SplitArea::Whiterun);
        assert!(config.is_armed(SplitArea::Whiterun));

        config.disarm(SplitArea::Whiterun);
        assert!(!config.is_armed(SplitArea::Whiterun));

        config.arm_all();
        assert_eq!(config.armed.len(), SplitArea::COUNT);
    }

    #[test]
    fn toml_round_trip() {
        let mut config = SplitterConfig::default();
        config.arm(SplitArea::Helgen);
        config.template = Template::Gr3yscale;

        let text = toml::to_string(&config).unwrap();
        let parsed: SplitterConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn toml_partial_input_uses_defaults() {
        let config: SplitterConfig = toml::from_str(
            r#"
            template = "DrTChops"
            armed = ["helgen", "alduin-defeated"]
        "#,
        )
        .unwrap();

        assert!(config.auto_start);
        assert_eq!(config.template, Template::DrTChops);
        assert!(config.is_armed(SplitArea::Helgen));
        assert!(config.is_armed(SplitArea::AlduinDefeated));
    }

    #[test]
    fn json_round_trip() {
        let config = SplitterConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: SplitterConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }
}
