//! Book mode configuration

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Tunables for book mode.
///
/// All fields have defaults, so a partial JSON object is a valid config:
///
/// ```
/// let config = book_pager::BookConfig::from_json(r#"{"budgetRatio": 0.9}"#).unwrap();
/// assert_eq!(config.reflow_debounce_ms, 200);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BookConfig {
    /// Book mode is only enabled at or below this viewport width (px)
    pub max_viewport_width: f32,
    /// Fraction of the viewport height available to one sheet
    pub budget_ratio: f32,
    /// Quiet period before a resize/load burst triggers a reflow
    pub reflow_debounce_ms: u64,
    /// Rate limit for indicator updates while scrolling
    pub scroll_debounce_ms: u64,
    /// Rate limit for indicator updates on resize
    pub resize_debounce_ms: u64,
    /// Width fraction of each edge tap zone
    pub tap_zone_ratio: f32,
    /// Sections with more blocks than this skip the whole-section fit attempt
    pub fast_path_max_blocks: Option<usize>,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            max_viewport_width: 560.0,
            budget_ratio: 0.88,
            reflow_debounce_ms: 200,
            scroll_debounce_ms: 50,
            resize_debounce_ms: 100,
            tap_zone_ratio: 0.2,
            fast_path_max_blocks: None,
        }
    }
}

impl BookConfig {
    /// Parse and validate a JSON config
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make pagination meaningless
    pub fn validate(&self) -> Result<()> {
        if !self.max_viewport_width.is_finite() || self.max_viewport_width <= 0.0 {
            return Err(Error::Config(format!(
                "maxViewportWidth must be positive, got {}",
                self.max_viewport_width
            )));
        }
        if !self.budget_ratio.is_finite() || self.budget_ratio <= 0.0 || self.budget_ratio > 1.0 {
            return Err(Error::Config(format!(
                "budgetRatio must be in (0, 1], got {}",
                self.budget_ratio
            )));
        }
        if !self.tap_zone_ratio.is_finite() || !(0.0..0.5).contains(&self.tap_zone_ratio) {
            return Err(Error::Config(format!(
                "tapZoneRatio must be in [0, 0.5), got {}",
                self.tap_zone_ratio
            )));
        }
        if self.fast_path_max_blocks == Some(0) {
            return Err(Error::Config("fastPathMaxBlocks must be at least 1".into()));
        }
        Ok(())
    }
}
