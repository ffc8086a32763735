use serde::{Deserialize, Serialize};

use crate::products::MetaKey;
use crate::CoreError;

/// Discounts below this are hidden from shoppers unless configured otherwise.
pub const DEFAULT_MINIMUM_PERCENTAGE: i32 = 10;

/// Which of the two stored percentages a shop surfaces for multi-entry
/// products: the smallest discount or the largest one (rendered as
/// "up to -X%").
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    #[default]
    Lowest,
    Highest,
}

impl DisplayMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            DisplayMode::Lowest => "lowest",
            DisplayMode::Highest => "highest",
        }
    }

    /// The stored metadata field backing this mode. Both badge display and
    /// catalog ordering resolve through this single mapping so they can never
    /// disagree about which field is authoritative.
    #[must_use]
    pub fn meta_key(self) -> MetaKey {
        match self {
            DisplayMode::Lowest => MetaKey::SalePercentage,
            DisplayMode::Highest => MetaKey::SalePercentageHighest,
        }
    }
}

impl std::fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a stored mode string, defaulting to `Lowest` for unknown values so a
/// corrupted settings row degrades to the conservative display.
#[must_use]
pub fn parse_display_mode(s: &str) -> DisplayMode {
    match s {
        "highest" => DisplayMode::Highest,
        _ => DisplayMode::Lowest,
    }
}

/// Shop-level display settings, persisted as a single row and injected into
/// every rendering and sorting call rather than read from ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplaySettings {
    /// Badges below this percentage are suppressed (0 shows everything on
    /// sale).
    pub minimum_percentage: i32,
    pub display_mode: DisplayMode,
    /// Categories whose pages and products may show badges. Empty means
    /// badges are disabled shop-wide.
    pub eligible_category_ids: Vec<i64>,
    /// Optional CSS color for the badge background; `None` keeps the theme
    /// default.
    pub badge_background_color: Option<String>,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            minimum_percentage: DEFAULT_MINIMUM_PERCENTAGE,
            display_mode: DisplayMode::Lowest,
            eligible_category_ids: Vec::new(),
            badge_background_color: None,
        }
    }
}

impl DisplaySettings {
    /// Validates operator-supplied settings before persisting them.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidSettings`] if the minimum percentage is
    /// outside `0..=100` or the background color is blank instead of absent.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(0..=100).contains(&self.minimum_percentage) {
            return Err(CoreError::InvalidSettings(format!(
                "minimum_percentage must be between 0 and 100, got {}",
                self.minimum_percentage
            )));
        }
        if let Some(color) = &self.badge_background_color {
            if color.trim().is_empty() {
                return Err(CoreError::InvalidSettings(
                    "badge_background_color must be omitted rather than blank".to_string(),
                ));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn is_eligible_category(&self, category_id: i64) -> bool {
        self.eligible_category_ids.contains(&category_id)
    }
}
