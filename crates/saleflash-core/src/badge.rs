//! Sale badge rendering and visibility rules.
//!
//! A badge is only ever produced from the two engine-owned stored
//! percentages; nothing here recomputes discounts from prices except the
//! variation-selection path, which mirrors what the storefront client does
//! when a shopper picks a variation.

use regex::Regex;
use rust_decimal::Decimal;

use crate::products::{sale_percentage, ProductKind};
use crate::settings::{DisplayMode, DisplaySettings};

/// Rendering context for category eligibility.
///
/// Detail pages show the badge when the product's own categories intersect
/// the eligible set. Listing pages only consult the browsed category: a
/// product whose own categories are eligible still hides its badge on a
/// listing for an ineligible category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageContext {
    ProductDetail,
    CategoryListing { category_id: i64 },
}

/// Everything the renderer needs to know about one product.
#[derive(Debug, Clone)]
pub struct BadgeInput<'a> {
    pub product_id: i64,
    pub kind: ProductKind,
    /// Stored `_sale_percentage` (smallest discount).
    pub lowest: i32,
    /// Stored `_sale_percentage_highest` (largest discount).
    pub highest: i32,
    /// The product's own category ids.
    pub category_ids: &'a [i64],
}

/// Outcome of a client-side badge update when the shopper selects or clears
/// a variation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BadgeUpdate {
    Show(String),
    Hide,
}

/// The display format template for the configured mode, in the form the
/// storefront client consumes (`%d%%` placeholder).
#[must_use]
pub fn sale_percentage_format(mode: DisplayMode) -> &'static str {
    match mode {
        DisplayMode::Highest => "up to -%d%%",
        DisplayMode::Lowest => "-%d%%",
    }
}

/// Expands a `%d%%` format template with a concrete percentage, the same
/// substitution the storefront client performs.
fn format_badge_text(format: &str, percentage: i32) -> String {
    format.replace("%d%%", &format!("{percentage}%"))
}

fn displayed_percentage(input: &BadgeInput<'_>, settings: &DisplaySettings) -> i32 {
    match settings.display_mode {
        DisplayMode::Lowest => input.lowest,
        DisplayMode::Highest => input.highest,
    }
}

fn category_eligible(
    context: PageContext,
    category_ids: &[i64],
    settings: &DisplaySettings,
) -> bool {
    match context {
        PageContext::ProductDetail => category_ids
            .iter()
            .any(|id| settings.is_eligible_category(*id)),
        PageContext::CategoryListing { category_id } => settings.is_eligible_category(category_id),
    }
}

fn badge_span(product_id: i64, classes: &str, percentage: i32, text: &str) -> String {
    format!(
        "<span id=\"sale-label-{product_id}\" class=\"{classes}\" data-sale-percentage=\"{}\">{text}</span>",
        percentage.unsigned_abs()
    )
}

fn badge_markup(input: &BadgeInput<'_>, settings: &DisplaySettings, percentage: i32) -> String {
    let (classes, text) = if input.kind == ProductKind::Variable {
        let classes = match settings.display_mode {
            DisplayMode::Highest => "onsale upto",
            DisplayMode::Lowest => "onsale",
        };
        let text = format_badge_text(sale_percentage_format(settings.display_mode), percentage);
        (classes, text)
    } else {
        ("onsale", format!("-{percentage}%"))
    };
    badge_span(input.product_id, classes, percentage, &text)
}

/// Renders the sale badge HTML for a product, or `None` when it must stay
/// hidden.
///
/// The badge renders only when the mode-selected stored percentage meets the
/// configured minimum AND the category eligibility check passes for the page
/// context. Variable products in `Highest` mode get the `upto` class and the
/// "up to" text; everything else renders the plain `-P%` form.
#[must_use]
pub fn render_sale_badge(
    input: &BadgeInput<'_>,
    settings: &DisplaySettings,
    context: PageContext,
) -> Option<String> {
    let percentage = displayed_percentage(input, settings);
    if percentage < settings.minimum_percentage {
        return None;
    }
    if !category_eligible(context, input.category_ids, settings) {
        return None;
    }
    Some(badge_markup(input, settings, percentage))
}

/// The markup-stripped display string for API consumers, e.g. `-18%` or
/// `up to -30%`.
///
/// `None` when the product is not on sale (stored percentage is zero or
/// negative) or the stripped text comes out empty. Unlike
/// [`render_sale_badge`], this ignores the minimum and category rules: the
/// field reports the discount, the consumer decides presentation.
#[must_use]
pub fn plain_badge_text(input: &BadgeInput<'_>, settings: &DisplaySettings) -> Option<String> {
    let percentage = displayed_percentage(input, settings);
    if percentage <= 0 {
        return None;
    }
    let text = strip_markup(&badge_markup(input, settings, percentage));
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Removes HTML tags and collapses whitespace.
#[must_use]
pub fn strip_markup(html: &str) -> String {
    let tags = Regex::new(r"(?is)<[^>]+>").expect("valid tags regex");
    let no_tags = tags.replace_all(html, " ");
    no_tags.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Badge update when the shopper selects a concrete variation.
///
/// Recomputes the discount from that variation's displayed prices; the text
/// always uses the plain format because a selected variation has exactly one
/// discount, never a range.
#[must_use]
pub fn variation_badge(regular: Decimal, sale: Decimal, settings: &DisplaySettings) -> BadgeUpdate {
    match sale_percentage(regular, sale) {
        Some(percentage) if percentage >= settings.minimum_percentage => {
            BadgeUpdate::Show(format_badge_text("-%d%%", percentage))
        }
        _ => BadgeUpdate::Hide,
    }
}

/// Badge update when the shopper clears the variation selection: fall back
/// to the product's stored percentage and the mode-specific format.
#[must_use]
pub fn variation_cleared_badge(stored_percentage: i32, settings: &DisplaySettings) -> BadgeUpdate {
    if stored_percentage >= settings.minimum_percentage {
        BadgeUpdate::Show(format_badge_text(
            sale_percentage_format(settings.display_mode),
            stored_percentage,
        ))
    } else {
        BadgeUpdate::Hide
    }
}

/// Inline style block overriding the badge background color, or `None` when
/// the shop keeps the theme default.
#[must_use]
pub fn inline_badge_css(settings: &DisplaySettings) -> Option<String> {
    let color = settings.badge_background_color.as_deref()?;
    Some(format!(
        "<style id='saleflash-inline-css' type='text/css'>\n\
         \x20 .products-list.products,\n\
         \x20 .single-product-summary {{\n\
         \x20   --on-sale-background: {color};\n\
         \x20 }}\n\
         </style>"
    ))
}
