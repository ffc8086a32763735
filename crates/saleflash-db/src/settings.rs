//! Read/update for the single-row `display_settings` table.

use sqlx::PgPool;

use saleflash_core::{parse_display_mode, DisplaySettings};

use crate::DbError;

#[derive(Debug, sqlx::FromRow)]
struct DisplaySettingsRow {
    minimum_percentage: i32,
    displayed_value: String,
    eligible_category_ids: Vec<i64>,
    badge_background_color: Option<String>,
}

/// Reads the shop display settings.
///
/// The row is created by migration with defaults; if it is somehow missing,
/// the in-code defaults are returned instead of an error.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_display_settings(pool: &PgPool) -> Result<DisplaySettings, DbError> {
    let row = sqlx::query_as::<_, DisplaySettingsRow>(
        "SELECT minimum_percentage, displayed_value, eligible_category_ids, \
                badge_background_color \
         FROM display_settings \
         WHERE id = 1",
    )
    .fetch_optional(pool)
    .await?;

    Ok(match row {
        Some(row) => DisplaySettings {
            minimum_percentage: row.minimum_percentage,
            display_mode: parse_display_mode(&row.displayed_value),
            eligible_category_ids: row.eligible_category_ids,
            badge_background_color: row.badge_background_color,
        },
        None => DisplaySettings::default(),
    })
}

/// Persists the shop display settings.
///
/// Upserts so the call also repairs a missing settings row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the write fails.
pub async fn update_display_settings(
    pool: &PgPool,
    settings: &DisplaySettings,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO display_settings \
             (id, minimum_percentage, displayed_value, eligible_category_ids, \
              badge_background_color) \
         VALUES (1, $1, $2, $3, $4) \
         ON CONFLICT (id) DO UPDATE SET \
             minimum_percentage     = EXCLUDED.minimum_percentage, \
             displayed_value        = EXCLUDED.displayed_value, \
             eligible_category_ids  = EXCLUDED.eligible_category_ids, \
             badge_background_color = EXCLUDED.badge_background_color, \
             updated_at             = NOW()",
    )
    .bind(settings.minimum_percentage)
    .bind(settings.display_mode.as_str())
    .bind(&settings.eligible_category_ids)
    .bind(&settings.badge_background_color)
    .execute(pool)
    .await?;

    Ok(())
}
