pub mod app_config;
pub mod badge;
pub mod categories;
pub mod config;
pub mod products;
pub mod settings;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use badge::{
    inline_badge_css, plain_badge_text, render_sale_badge, sale_percentage_format, strip_markup,
    variation_badge, variation_cleared_badge, BadgeInput, BadgeUpdate, PageContext,
};
pub use categories::{load_categories, CategoriesFile, CategoryConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use products::{sale_percentage, MetaKey, PricePair, ProductKind, ProductStatus};
pub use settings::{parse_display_mode, DisplayMode, DisplaySettings};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid product kind: {0}")]
    InvalidProductKind(String),
    #[error("invalid product status: {0}")]
    InvalidProductStatus(String),
    #[error("invalid meta key: {0}")]
    InvalidMetaKey(String),
    #[error("invalid display settings: {0}")]
    InvalidSettings(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read categories file at {path}")]
    CategoriesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse categories file")]
    CategoriesFileParse(#[from] serde_yaml::Error),
    #[error("validation error: {0}")]
    Validation(String),
}
