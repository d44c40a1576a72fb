//! Line price resolution and line-sum rounding.
//!
//! A line's unit price comes from, in order: an explicit nett price on the
//! line, the customer's special price for the product's base name, or the
//! product's list price. The base name is the product name cut at the first
//! `(`, so lot-annotated variants share one special price.

use crate::config::PricingConfig;
use crate::entities::{
    invoice_item::ProductType,
    product,
    special_price::{self, Entity as SpecialPrice},
};
use crate::errors::ServiceError;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter};

/// Strips everything from the first `(` and trims whitespace.
pub fn extract_base_name(name: &str) -> &str {
    match name.find('(') {
        Some(idx) => name[..idx].trim(),
        None => name.trim(),
    }
}

/// Picks the unit price by priority: nett override, special price, list price.
pub fn resolve_unit_price(
    net_price: Option<Decimal>,
    special_price: Option<Decimal>,
    list_price: Decimal,
) -> Decimal {
    net_price.or(special_price).unwrap_or(list_price)
}

/// Final rounding rule for a raw line sum: a fractional part below 0.50 is
/// dropped, anything else is rounded to cents with midpoints away from zero.
/// Line sums are never negative, so midpoints always go up.
pub fn round_sum_price(raw: Decimal) -> Decimal {
    let whole = raw.floor();
    if raw - whole < dec!(0.50) {
        whole
    } else {
        raw.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

/// `price / units_per_pack * quantity` for charged lines, zero otherwise.
pub fn compute_sum_price(
    product_type: ProductType,
    unit_price: Decimal,
    units_per_pack: i32,
    quantity: Decimal,
    whole_unit: bool,
) -> Result<Decimal, ServiceError> {
    if !product_type.is_charged() {
        return Ok(Decimal::ZERO);
    }
    if units_per_pack <= 0 {
        return Err(ServiceError::ValidationError(format!(
            "units_per_pack must be positive, got {}",
            units_per_pack
        )));
    }

    let mut raw = unit_price / Decimal::from(units_per_pack) * quantity;
    if whole_unit {
        raw = raw.floor();
    }
    Ok(round_sum_price(raw))
}

/// Configured pricing behaviour shared by every line computation.
#[derive(Debug, Clone, Default)]
pub struct PricingPolicy {
    whole_unit_brands: Vec<String>,
}

impl PricingPolicy {
    pub fn new(whole_unit_brands: Vec<String>) -> Self {
        Self {
            whole_unit_brands: whole_unit_brands
                .into_iter()
                .map(|brand| brand.trim().to_lowercase())
                .filter(|brand| !brand.is_empty())
                .collect(),
        }
    }

    /// Products from a whole-unit brand are billed without cents.
    pub fn is_whole_unit_product(&self, product_name: &str) -> bool {
        let name = product_name.to_lowercase();
        self.whole_unit_brands
            .iter()
            .any(|brand| name.contains(brand.as_str()))
    }
}

impl From<&PricingConfig> for PricingPolicy {
    fn from(cfg: &PricingConfig) -> Self {
        Self::new(cfg.whole_unit_brands.clone())
    }
}

/// Outcome of pricing one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinePricing {
    pub price: Decimal,
    pub sum_price: Decimal,
}

/// Looks up the customer's special price for the product's base name.
pub async fn find_special_price<C: ConnectionTrait>(
    conn: &C,
    customer_id: i32,
    product_name: &str,
) -> Result<Option<Decimal>, ServiceError> {
    let base_name = extract_base_name(product_name);
    let found = SpecialPrice::find()
        .filter(special_price::Column::CustomerId.eq(customer_id))
        .filter(special_price::Column::ProductBaseName.eq(base_name))
        .one(conn)
        .await
        .map_err(ServiceError::db_error)?;
    Ok(found.map(|sp| sp.special_price))
}

/// Resolves the unit price and line sum for a line on `customer_id`'s invoice.
pub async fn price_line<C: ConnectionTrait>(
    conn: &C,
    policy: &PricingPolicy,
    customer_id: i32,
    product: &product::Model,
    product_type: ProductType,
    quantity: Decimal,
    net_price: Option<Decimal>,
) -> Result<LinePricing, ServiceError> {
    if !product_type.is_charged() {
        return Ok(LinePricing {
            price: net_price.unwrap_or(Decimal::ZERO),
            sum_price: Decimal::ZERO,
        });
    }

    let special = match net_price {
        Some(_) => None,
        None => find_special_price(conn, customer_id, &product.name).await?,
    };
    let price = resolve_unit_price(net_price, special, product.price);
    let sum_price = compute_sum_price(
        product_type,
        price,
        product.units_per_pack,
        quantity,
        policy.is_whole_unit_product(&product.name),
    )?;

    Ok(LinePricing { price, sum_price })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Amoxil 500mg (Lot: A123)", "Amoxil 500mg")]
    #[case("Amoxil 500mg", "Amoxil 500mg")]
    #[case("Amoxil (Lot A123) (old)", "Amoxil")]
    #[case("  Panadol  ", "Panadol")]
    #[case("(Lot only)", "")]
    fn base_name_extraction(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(extract_base_name(name), expected);
    }

    #[test]
    fn price_priority() {
        assert_eq!(
            resolve_unit_price(None, None, dec!(120.00)),
            dec!(120.00)
        );
        assert_eq!(
            resolve_unit_price(None, Some(dec!(95.00)), dec!(120.00)),
            dec!(95.00)
        );
        assert_eq!(
            resolve_unit_price(Some(dec!(80.00)), Some(dec!(95.00)), dec!(120.00)),
            dec!(80.00)
        );
    }

    #[rstest]
    #[case(dec!(10.494), dec!(10))]
    #[case(dec!(10.67), dec!(10.67))]
    #[case(dec!(100.49), dec!(100))]
    #[case(dec!(100.50), dec!(100.50))]
    #[case(dec!(100.99), dec!(100.99))]
    #[case(dec!(100.995), dec!(101.00))]
    #[case(dec!(42), dec!(42))]
    #[case(dec!(16.505), dec!(16.51))]
    #[case(dec!(16.525), dec!(16.53))]
    #[case(dec!(3.3), dec!(3))]
    fn sum_rounding(#[case] raw: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_sum_price(raw), expected);
    }

    #[test]
    fn charged_line_divides_by_pack() {
        let sum = compute_sum_price(ProductType::Normal, dec!(300), 3, dec!(2), false).unwrap();
        assert_eq!(sum, dec!(200));

        // 100 / 3 * 2 = 66.666..., fraction >= .50 keeps cents
        let sum = compute_sum_price(ProductType::Normal, dec!(100), 3, dec!(2), false).unwrap();
        assert_eq!(sum, dec!(66.67));

        // 100 / 3 * 1 = 33.333..., fraction < .50 drops to the unit
        let sum = compute_sum_price(ProductType::Normal, dec!(100), 3, dec!(1), false).unwrap();
        assert_eq!(sum, dec!(33));
    }

    #[test]
    fn whole_unit_products_are_floored_first() {
        let sum = compute_sum_price(ProductType::Normal, dec!(100), 3, dec!(2), true).unwrap();
        assert_eq!(sum, dec!(66));
    }

    #[test]
    fn free_lines_sum_to_zero() {
        for kind in [ProductType::Bonus, ProductType::Sample] {
            let sum = compute_sum_price(kind, dec!(999.99), 1, dec!(50), false).unwrap();
            assert_eq!(sum, Decimal::ZERO);
        }
    }

    #[test]
    fn zero_pack_size_is_rejected() {
        let err = compute_sum_price(ProductType::Normal, dec!(10), 0, dec!(1), false).unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[test]
    fn whole_unit_brand_matching_is_case_insensitive() {
        let policy = PricingPolicy::new(vec!["Lafarge".into(), "  ".into()]);
        assert!(policy.is_whole_unit_product("LAFARGE Vitamin C (Lot 9)"));
        assert!(!policy.is_whole_unit_product("Panadol"));
        assert!(!PricingPolicy::default().is_whole_unit_product("Lafarge"));
    }
}
