use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::CoreError;

/// Catalog product kinds recognized by the percentage engine.
///
/// `Variation` is the purchasable child of a `Variable` product and never
/// carries its own stored percentages; writes against a variation roll up to
/// its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    Simple,
    Variable,
    Bundle,
    Variation,
}

impl ProductKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProductKind::Simple => "simple",
            ProductKind::Variable => "variable",
            ProductKind::Bundle => "bundle",
            ProductKind::Variation => "variation",
        }
    }

    /// Returns `true` for kinds that carry their own stored percentage fields.
    #[must_use]
    pub fn is_standalone(self) -> bool {
        matches!(
            self,
            ProductKind::Simple | ProductKind::Variable | ProductKind::Bundle
        )
    }

    #[must_use]
    pub fn is_variation(self) -> bool {
        matches!(self, ProductKind::Variation)
    }
}

impl std::fmt::Display for ProductKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductKind {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "simple" => Ok(ProductKind::Simple),
            "variable" => Ok(ProductKind::Variable),
            "bundle" => Ok(ProductKind::Bundle),
            "variation" => Ok(ProductKind::Variation),
            other => Err(CoreError::InvalidProductKind(other.to_string())),
        }
    }
}

/// Publication status of a catalog entry. Only `Publish` rows contribute to
/// aggregated percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Publish,
    Draft,
    Pending,
    Private,
}

impl ProductStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProductStatus::Publish => "publish",
            ProductStatus::Draft => "draft",
            ProductStatus::Pending => "pending",
            ProductStatus::Private => "private",
        }
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "publish" => Ok(ProductStatus::Publish),
            "draft" => Ok(ProductStatus::Draft),
            "pending" => Ok(ProductStatus::Pending),
            "private" => Ok(ProductStatus::Private),
            other => Err(CoreError::InvalidProductStatus(other.to_string())),
        }
    }
}

/// Product metadata keys the engine reads or writes.
///
/// The wire names keep the host catalog's underscore convention so stored
/// rows stay interoperable with data imported from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetaKey {
    /// Effective price shown to shoppers (`price`).
    #[serde(rename = "price")]
    Price,
    /// Undiscounted price (`_regular_price`).
    #[serde(rename = "_regular_price")]
    RegularPrice,
    /// Discounted price; empty or absent when not on sale (`_sale_price`).
    #[serde(rename = "_sale_price")]
    SalePrice,
    /// Engine-owned: smallest discount across the product (`_sale_percentage`).
    #[serde(rename = "_sale_percentage")]
    SalePercentage,
    /// Engine-owned: largest discount across the product
    /// (`_sale_percentage_highest`).
    #[serde(rename = "_sale_percentage_highest")]
    SalePercentageHighest,
}

impl MetaKey {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MetaKey::Price => "price",
            MetaKey::RegularPrice => "_regular_price",
            MetaKey::SalePrice => "_sale_price",
            MetaKey::SalePercentage => "_sale_percentage",
            MetaKey::SalePercentageHighest => "_sale_percentage_highest",
        }
    }

    /// Returns `true` for the price fields whose writes trigger a recompute.
    #[must_use]
    pub fn is_price_field(self) -> bool {
        matches!(
            self,
            MetaKey::Price | MetaKey::RegularPrice | MetaKey::SalePrice
        )
    }

    /// Returns `true` for the fields the engine itself owns and writes.
    #[must_use]
    pub fn is_engine_owned(self) -> bool {
        matches!(self, MetaKey::SalePercentage | MetaKey::SalePercentageHighest)
    }
}

impl std::fmt::Display for MetaKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MetaKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price" => Ok(MetaKey::Price),
            "_regular_price" => Ok(MetaKey::RegularPrice),
            "_sale_price" => Ok(MetaKey::SalePrice),
            "_sale_percentage" => Ok(MetaKey::SalePercentage),
            "_sale_percentage_highest" => Ok(MetaKey::SalePercentageHighest),
            other => Err(CoreError::InvalidMetaKey(other.to_string())),
        }
    }
}

/// The regular/sale price pair of a single sellable entry.
///
/// Prices arrive as decimal strings in metadata; by the time they reach this
/// type they have been parsed, with blank or malformed values mapped to
/// `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePair {
    pub regular: Option<Decimal>,
    pub sale: Option<Decimal>,
}

impl PricePair {
    /// Returns `true` when a sale price is present, which is what marks the
    /// entry as on sale. A sale price equal to or above the regular price
    /// still counts.
    #[must_use]
    pub fn is_on_sale(&self) -> bool {
        self.sale.is_some()
    }

    /// Discount percentage for this pair, if computable.
    #[must_use]
    pub fn sale_percentage(&self) -> Option<i32> {
        sale_percentage(self.regular?, self.sale?)
    }
}

/// Computes the discount percentage `floor((regular - sale) / regular * 100)`.
///
/// Returns `None` when `regular` is zero or negative; the caller treats such
/// entries as contributing nothing. Rounding is always toward negative
/// infinity, so a sale price above the regular price yields a negative
/// percentage rather than saturating at zero.
#[must_use]
pub fn sale_percentage(regular: Decimal, sale: Decimal) -> Option<i32> {
    if regular <= Decimal::ZERO {
        return None;
    }
    let pct = (regular - sale) / regular * Decimal::ONE_HUNDRED;
    pct.floor().to_i32()
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).expect("valid decimal literal")
    }

    #[test]
    fn percentage_is_floored() {
        assert_eq!(sale_percentage(dec("100"), dec("81")), Some(18));
        assert_eq!(sale_percentage(dec("300"), dec("250")), Some(16));
        assert_eq!(sale_percentage(dec("100000"), dec("80001")), Some(19));
    }

    #[test]
    fn percentage_small_discount() {
        assert_eq!(sale_percentage(dec("100"), dec("95")), Some(5));
    }

    #[test]
    fn percentage_full_discount() {
        assert_eq!(sale_percentage(dec("100"), dec("0")), Some(100));
    }

    #[test]
    fn percentage_equal_prices_is_zero() {
        assert_eq!(sale_percentage(dec("49.99"), dec("49.99")), Some(0));
    }

    #[test]
    fn percentage_negative_floors_away_from_zero() {
        // Sale above regular: a "markup" floors toward negative infinity.
        assert_eq!(sale_percentage(dec("100"), dec("100.5")), Some(-1));
        assert_eq!(sale_percentage(dec("100"), dec("120")), Some(-20));
    }

    #[test]
    fn percentage_zero_or_negative_regular_is_none() {
        assert_eq!(sale_percentage(dec("0"), dec("10")), None);
        assert_eq!(sale_percentage(dec("-5"), dec("1")), None);
    }

    #[test]
    fn price_pair_requires_both_prices() {
        let no_sale = PricePair {
            regular: Some(dec("100")),
            sale: None,
        };
        assert!(!no_sale.is_on_sale());
        assert_eq!(no_sale.sale_percentage(), None);

        let no_regular = PricePair {
            regular: None,
            sale: Some(dec("80")),
        };
        assert!(no_regular.is_on_sale());
        assert_eq!(no_regular.sale_percentage(), None);

        let both = PricePair {
            regular: Some(dec("100")),
            sale: Some(dec("75")),
        };
        assert_eq!(both.sale_percentage(), Some(25));
    }

    #[test]
    fn product_kind_round_trips_via_str() {
        for kind in [
            ProductKind::Simple,
            ProductKind::Variable,
            ProductKind::Bundle,
            ProductKind::Variation,
        ] {
            assert_eq!(ProductKind::from_str(kind.as_str()).unwrap(), kind);
        }
        assert!(ProductKind::from_str("grouped").is_err());
    }

    #[test]
    fn product_kind_classification() {
        assert!(ProductKind::Simple.is_standalone());
        assert!(ProductKind::Variable.is_standalone());
        assert!(ProductKind::Bundle.is_standalone());
        assert!(!ProductKind::Variation.is_standalone());
        assert!(ProductKind::Variation.is_variation());
    }

    #[test]
    fn product_status_round_trips_via_str() {
        for status in [
            ProductStatus::Publish,
            ProductStatus::Draft,
            ProductStatus::Pending,
            ProductStatus::Private,
        ] {
            assert_eq!(ProductStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert!(ProductStatus::from_str("trash").is_err());
    }

    #[test]
    fn meta_key_wire_names() {
        assert_eq!(MetaKey::Price.as_str(), "price");
        assert_eq!(MetaKey::RegularPrice.as_str(), "_regular_price");
        assert_eq!(MetaKey::SalePrice.as_str(), "_sale_price");
        assert_eq!(MetaKey::SalePercentage.as_str(), "_sale_percentage");
        assert_eq!(
            MetaKey::SalePercentageHighest.as_str(),
            "_sale_percentage_highest"
        );
    }

    #[test]
    fn meta_key_classification() {
        assert!(MetaKey::Price.is_price_field());
        assert!(MetaKey::RegularPrice.is_price_field());
        assert!(MetaKey::SalePrice.is_price_field());
        assert!(!MetaKey::SalePercentage.is_price_field());
        assert!(!MetaKey::SalePercentageHighest.is_price_field());

        assert!(MetaKey::SalePercentage.is_engine_owned());
        assert!(MetaKey::SalePercentageHighest.is_engine_owned());
        assert!(!MetaKey::SalePrice.is_engine_owned());
    }

    #[test]
    fn meta_key_from_str_rejects_unknown_keys() {
        assert!(MetaKey::from_str("_stock_status").is_err());
        assert!(MetaKey::from_str("").is_err());
    }

    #[test]
    fn meta_key_serde_uses_wire_names() {
        let json = serde_json::to_string(&MetaKey::SalePrice).expect("serialize");
        assert_eq!(json, "\"_sale_price\"");
        let key: MetaKey = serde_json::from_str("\"_sale_percentage_highest\"").expect("parse");
        assert_eq!(key, MetaKey::SalePercentageHighest);
    }
}
