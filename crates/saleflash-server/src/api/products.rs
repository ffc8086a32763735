//! Product detail, creation, price writes, and metadata deletion.
//!
//! Every price write goes through [`saleflash_db::upsert_product_meta`] and,
//! when the stored value actually changed, dispatches a [`MetaChange`] on the
//! bus before the response is produced. The derived fields reported back are
//! always read from the percentage target: the product itself, or the parent
//! when the write hit a variation.

use std::str::FromStr;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use saleflash_core::{
    plain_badge_text, render_sale_badge, BadgeInput, MetaKey, PageContext, PricePair, ProductKind,
    ProductStatus,
};
use saleflash_db::{DbError, DerivedPercentages, MetaChangeOutcome, ProductRow};
use saleflash_engine::{MetaChange, MetaChangeKind};

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};
use crate::middleware::RequestId;

#[derive(Debug, Deserialize)]
pub(super) struct CreateProductRequest {
    name: String,
    slug: String,
    kind: String,
    status: Option<String>,
    parent_id: Option<i64>,
    #[serde(default)]
    category_ids: Vec<i64>,
    regular_price: Option<String>,
    sale_price: Option<String>,
    price: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct PriceUpdateRequest {
    regular_price: Option<String>,
    sale_price: Option<String>,
    price: Option<String>,
}

/// Write-path response: the product row plus the resolved target's stored
/// percentages.
#[derive(Debug, Serialize)]
pub(super) struct ProductSummary {
    product_id: i64,
    name: String,
    slug: String,
    kind: String,
    status: String,
    parent_id: Option<i64>,
    sale_percentage: i32,
    sale_percentage_highest: i32,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductDetail {
    product_id: i64,
    name: String,
    slug: String,
    kind: String,
    status: String,
    parent_id: Option<i64>,
    category_ids: Vec<i64>,
    sale_percentage_lowest: i32,
    sale_percentage_highest: i32,
    /// Markup-free display string, e.g. `-18%` or `up to -30%`; `null` when
    /// the product is not on sale.
    sale_percentage: Option<String>,
    /// Rendered badge HTML under detail-page visibility rules.
    badge: Option<String>,
    variations: Vec<VariationDetail>,
}

#[derive(Debug, Serialize)]
struct VariationDetail {
    id: i64,
    name: String,
    slug: String,
    regular_price: Option<Decimal>,
    sale_price: Option<Decimal>,
    sale_percentage: Option<i32>,
}

/// Stored percentages live on the variation's parent, never the variation.
fn resolve_target_id(product: &ProductRow) -> i64 {
    if product.kind == "variation" {
        product.parent_id.unwrap_or(product.id)
    } else {
        product.id
    }
}

fn summary(product: ProductRow, derived: DerivedPercentages) -> ProductSummary {
    ProductSummary {
        product_id: product.id,
        name: product.name,
        slug: product.slug,
        kind: product.kind,
        status: product.status,
        parent_id: product.parent_id,
        sale_percentage: derived.lowest,
        sale_percentage_highest: derived.highest,
    }
}

fn map_write_error(request_id: String, error: &DbError) -> ApiError {
    if let DbError::Sqlx(sqlx::Error::Database(db)) = error {
        match db.code().as_deref() {
            Some("23505") => {
                return ApiError::new(
                    request_id,
                    "conflict",
                    "a product with this slug already exists",
                );
            }
            Some("23503") => {
                return ApiError::new(
                    request_id,
                    "validation_error",
                    "unknown category or parent product id",
                );
            }
            _ => {}
        }
    }
    map_db_error(request_id, error)
}

/// Upserts each provided price field and dispatches a change event for the
/// ones that actually changed.
async fn apply_price_writes(
    state: &AppState,
    request_id: &str,
    product_id: i64,
    writes: [(MetaKey, Option<&str>); 3],
) -> Result<(), ApiError> {
    for (meta_key, value) in writes {
        let Some(value) = value else { continue };
        let outcome = saleflash_db::upsert_product_meta(&state.pool, product_id, meta_key, value)
            .await
            .map_err(|e| map_write_error(request_id.to_string(), &e))?;
        let kind = match outcome {
            MetaChangeOutcome::Added => MetaChangeKind::Added,
            MetaChangeOutcome::Updated => MetaChangeKind::Updated,
            MetaChangeOutcome::Unchanged => continue,
        };
        state
            .hooks
            .dispatch(&MetaChange {
                product_id,
                meta_key,
                kind,
            })
            .await;
    }
    Ok(())
}

async fn target_summary(
    state: &AppState,
    request_id: &str,
    product: ProductRow,
) -> Result<ProductSummary, ApiError> {
    let target_id = resolve_target_id(&product);
    let derived = saleflash_db::read_derived_percentages(&state.pool, target_id)
        .await
        .map_err(|e| map_db_error(request_id.to_string(), &e))?;
    Ok(summary(product, derived))
}

pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductSummary>>), ApiError> {
    let validation = |message: String| ApiError::new(req_id.0.clone(), "validation_error", message);

    let kind = ProductKind::from_str(body.kind.trim()).map_err(|e| validation(e.to_string()))?;
    let status = match body.status.as_deref() {
        Some(s) => ProductStatus::from_str(s.trim()).map_err(|e| validation(e.to_string()))?,
        None => ProductStatus::Publish,
    };

    let name = body.name.trim();
    let slug = body.slug.trim();
    if name.is_empty() || slug.is_empty() {
        return Err(validation("name and slug must be non-empty".to_string()));
    }

    if kind.is_variation() {
        let Some(parent_id) = body.parent_id else {
            return Err(validation("a variation requires parent_id".to_string()));
        };
        let parent = saleflash_db::get_product(&state.pool, parent_id)
            .await
            .map_err(|e| map_db_error(req_id.0.clone(), &e))?
            .ok_or_else(|| validation(format!("parent product {parent_id} does not exist")))?;
        if parent.kind == "variation" {
            return Err(validation(
                "a variation cannot parent another variation".to_string(),
            ));
        }
    } else if body.parent_id.is_some() {
        return Err(validation(
            "parent_id is only valid for variations".to_string(),
        ));
    }

    let product = saleflash_db::insert_product(
        &state.pool,
        name,
        slug,
        kind.as_str(),
        status.as_str(),
        body.parent_id,
    )
    .await
    .map_err(|e| map_write_error(req_id.0.clone(), &e))?;

    if !body.category_ids.is_empty() {
        saleflash_db::set_product_categories(&state.pool, product.id, &body.category_ids)
            .await
            .map_err(|e| map_write_error(req_id.0.clone(), &e))?;
    }

    apply_price_writes(
        &state,
        &req_id.0,
        product.id,
        [
            (MetaKey::RegularPrice, body.regular_price.as_deref()),
            (MetaKey::SalePrice, body.sale_price.as_deref()),
            (MetaKey::Price, body.price.as_deref()),
        ],
    )
    .await?;

    let data = target_summary(&state, &req_id.0, product).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn put_product_prices(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(product_id): Path<i64>,
    Json(body): Json<PriceUpdateRequest>,
) -> Result<Json<ApiResponse<ProductSummary>>, ApiError> {
    let product = saleflash_db::get_product(&state.pool, product_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "not_found",
                format!("product {product_id} does not exist"),
            )
        })?;

    apply_price_writes(
        &state,
        &req_id.0,
        product.id,
        [
            (MetaKey::RegularPrice, body.regular_price.as_deref()),
            (MetaKey::SalePrice, body.sale_price.as_deref()),
            (MetaKey::Price, body.price.as_deref()),
        ],
    )
    .await?;

    let data = target_summary(&state, &req_id.0, product).await?;
    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn delete_product_meta(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((product_id, meta_key)): Path<(i64, String)>,
) -> Result<Json<ApiResponse<ProductSummary>>, ApiError> {
    let meta_key = MetaKey::from_str(&meta_key).map_err(|_| {
        ApiError::new(
            req_id.0.clone(),
            "bad_request",
            format!("unknown metadata key: {meta_key}"),
        )
    })?;
    if !meta_key.is_price_field() {
        return Err(ApiError::new(
            req_id.0.clone(),
            "bad_request",
            format!("{meta_key} is not a deletable price field"),
        ));
    }

    let product = saleflash_db::get_product(&state.pool, product_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "not_found",
                format!("product {product_id} does not exist"),
            )
        })?;

    let removed = saleflash_db::delete_product_meta(&state.pool, product.id, meta_key)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    if !removed {
        return Err(ApiError::new(
            req_id.0.clone(),
            "not_found",
            format!("{meta_key} is not set on product {product_id}"),
        ));
    }

    state
        .hooks
        .dispatch(&MetaChange {
            product_id: product.id,
            meta_key,
            kind: MetaChangeKind::Deleted,
        })
        .await;

    let data = target_summary(&state, &req_id.0, product).await?;
    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn get_product_detail(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(product_id): Path<i64>,
) -> Result<Json<ApiResponse<ProductDetail>>, ApiError> {
    let product = saleflash_db::get_product(&state.pool, product_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| {
            ApiError::new(
                req_id.0.clone(),
                "not_found",
                format!("product {product_id} does not exist"),
            )
        })?;

    let settings = saleflash_db::get_display_settings(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let category_ids = saleflash_db::get_product_category_ids(&state.pool, product.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let target_id = resolve_target_id(&product);
    let derived = saleflash_db::read_derived_percentages(&state.pool, target_id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let kind = ProductKind::from_str(&product.kind)
        .map_err(|e| ApiError::new(req_id.0.clone(), "internal_error", e.to_string()))?;
    // A variation displays through its parent's range.
    let badge_kind = if kind.is_variation() {
        ProductKind::Variable
    } else {
        kind
    };
    let badge_input = BadgeInput {
        product_id: target_id,
        kind: badge_kind,
        lowest: derived.lowest,
        highest: derived.highest,
        category_ids: &category_ids,
    };

    let variation_rows = saleflash_db::list_published_variations(&state.pool, product.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let variations = variation_rows
        .into_iter()
        .map(|row| {
            let pair = PricePair {
                regular: row.regular_price,
                sale: row.sale_price,
            };
            VariationDetail {
                id: row.id,
                name: row.name,
                slug: row.slug,
                regular_price: row.regular_price,
                sale_price: row.sale_price,
                sale_percentage: pair.sale_percentage(),
            }
        })
        .collect();

    let data = ProductDetail {
        product_id: product.id,
        name: product.name,
        slug: product.slug,
        kind: product.kind,
        status: product.status,
        parent_id: product.parent_id,
        category_ids: category_ids.clone(),
        sale_percentage_lowest: derived.lowest,
        sale_percentage_highest: derived.highest,
        sale_percentage: plain_badge_text(&badge_input, &settings),
        badge: render_sale_badge(&badge_input, &settings, PageContext::ProductDetail),
        variations,
    };

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
