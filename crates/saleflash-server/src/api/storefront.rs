//! The read-only payload the storefront client bootstraps from.
//!
//! Carries everything the client needs to update a badge without another
//! round-trip when the shopper selects or clears a variation: the minimum,
//! the mode, the mode's format template, and the optional inline style block.

use axum::{extract::State, Extension, Json};
use serde::Serialize;

use saleflash_core::{inline_badge_css, sale_percentage_format, DisplayMode};

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Serialize)]
pub(super) struct StorefrontSettings {
    minimum_percentage: i32,
    display_mode: DisplayMode,
    /// `%d%%` template for the configured mode, expanded client-side.
    sale_percentage_format: &'static str,
    badge_background_color: Option<String>,
    /// `<style>` block overriding the badge background, when configured.
    inline_css: Option<String>,
}

pub(super) async fn get_storefront_settings(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<StorefrontSettings>>, ApiError> {
    let settings = saleflash_db::get_display_settings(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = StorefrontSettings {
        minimum_percentage: settings.minimum_percentage,
        display_mode: settings.display_mode,
        sale_percentage_format: sale_percentage_format(settings.display_mode),
        inline_css: inline_badge_css(&settings),
        badge_background_color: settings.badge_background_color,
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
