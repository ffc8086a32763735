//! The catalog listing endpoint.
//!
//! Sorting by discount resolves through the shop's display mode, so the
//! catalog order and the badge text always agree on which stored percentage
//! is authoritative. Badges are rendered per row only when the request
//! browses a concrete category, under listing-page visibility rules.

use std::str::FromStr;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use saleflash_core::{render_sale_badge, BadgeInput, PageContext, ProductKind};
use saleflash_db::{CatalogFilters, CatalogOrdering};

use super::{map_db_error, normalize_limit, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(super) enum CatalogSortKey {
    #[default]
    Date,
    Price,
    PriceDesc,
    SalePercentage,
}

#[derive(Debug, Deserialize)]
pub(super) struct CatalogQuery {
    orderby: Option<CatalogSortKey>,
    category: Option<String>,
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct CatalogItem {
    product_id: i64,
    name: String,
    slug: String,
    kind: String,
    sale_percentage: i32,
    sale_percentage_highest: i32,
    regular_price: Option<Decimal>,
    sale_price: Option<Decimal>,
    /// Rendered badge HTML for the browsed category; always `null` on an
    /// uncategorized listing.
    badge: Option<String>,
}

pub(super) async fn list_catalog(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<ApiResponse<Vec<CatalogItem>>>, ApiError> {
    let settings = saleflash_db::get_display_settings(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let ordering = match query.orderby.unwrap_or_default() {
        CatalogSortKey::Date => CatalogOrdering::Date,
        CatalogSortKey::Price => CatalogOrdering::PriceAsc,
        CatalogSortKey::PriceDesc => CatalogOrdering::PriceDesc,
        CatalogSortKey::SalePercentage => {
            CatalogOrdering::SalePercentage(settings.display_mode.meta_key())
        }
    };

    let browsed_category = match query.category.as_deref() {
        Some(slug) => saleflash_db::get_category_by_slug(&state.pool, slug)
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?,
        None => None,
    };

    let rows = saleflash_db::list_catalog_cards(
        &state.pool,
        ordering,
        CatalogFilters {
            category_slug: query.category.as_deref(),
            limit: normalize_limit(query.limit),
        },
    )
    .await
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let items = rows
        .into_iter()
        .map(|row| {
            let badge = browsed_category.as_ref().and_then(|category| {
                let kind = ProductKind::from_str(&row.kind).ok()?;
                render_sale_badge(
                    &BadgeInput {
                        product_id: row.product_id,
                        kind,
                        lowest: row.sale_percentage,
                        highest: row.sale_percentage_highest,
                        category_ids: &[],
                    },
                    &settings,
                    PageContext::CategoryListing {
                        category_id: category.id,
                    },
                )
            });
            CatalogItem {
                product_id: row.product_id,
                name: row.name,
                slug: row.slug,
                kind: row.kind,
                sale_percentage: row.sale_percentage,
                sale_percentage_highest: row.sale_percentage_highest,
                regular_price: row.regular_price,
                sale_price: row.sale_price,
                badge,
            }
        })
        .collect();

    Ok(Json(ApiResponse {
        data: items,
        meta: ResponseMeta::new(req_id.0),
    }))
}
