//! Line pricing, cart totals and the shipping quote.

use serde::{Deserialize, Serialize};

use crate::types::Price;

/// Price of one unit of a cart line.
///
/// The variant override replaces the product base price; a customization
/// adds the design's price on top.
#[must_use]
pub fn unit_price(base: Price, variant_override: Option<Price>, design_add_on: Option<Price>) -> Price {
    variant_override.unwrap_or(base) + design_add_on.unwrap_or(Price::ZERO)
}

/// Derived cart totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub subtotal: Price,
    pub item_count: u32,
}

impl CartTotals {
    /// Totals over `(unit_price, quantity)` pairs.
    pub fn from_lines(lines: impl IntoIterator<Item = (Price, u32)>) -> Self {
        lines
            .into_iter()
            .fold(Self::default(), |acc, (price, quantity)| Self {
                subtotal: acc.subtotal + price.times(quantity),
                item_count: acc.item_count.saturating_add(quantity),
            })
    }
}

/// Flat-rate shipping with a free-shipping threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingPolicy {
    pub flat_rate: Price,
    pub free_threshold: Price,
}

impl ShippingPolicy {
    /// Shipping charged for a cart with these totals.
    ///
    /// Empty carts ship for nothing; at or above the threshold is free.
    #[must_use]
    pub fn quote(&self, totals: &CartTotals) -> Price {
        if totals.item_count == 0 || totals.subtotal >= self.free_threshold {
            Price::ZERO
        } else {
            self.flat_rate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> ShippingPolicy {
        ShippingPolicy {
            flat_rate: Price::from_cents(500),
            free_threshold: Price::from_cents(7_500),
        }
    }

    #[test]
    fn test_unit_price_combinations() {
        let base = Price::from_cents(2_400);
        let over = Price::from_cents(2_800);
        let design = Price::from_cents(850);

        assert_eq!(unit_price(base, None, None), base);
        assert_eq!(unit_price(base, Some(over), None), over);
        assert_eq!(unit_price(base, None, Some(design)), Price::from_cents(3_250));
        assert_eq!(unit_price(base, Some(over), Some(design)), Price::from_cents(3_650));
    }

    #[test]
    fn test_totals() {
        let totals = CartTotals::from_lines([
            (Price::from_cents(2_400), 2),
            (Price::from_cents(3_250), 1),
        ]);
        assert_eq!(totals.subtotal, Price::from_cents(8_050));
        assert_eq!(totals.item_count, 3);
        assert_eq!(CartTotals::from_lines([]), CartTotals::default());
    }

    #[test]
    fn test_shipping_thresholds() {
        let at = |cents, count| CartTotals {
            subtotal: Price::from_cents(cents),
            item_count: count,
        };
        assert_eq!(policy().quote(&at(0, 0)), Price::ZERO);
        assert_eq!(policy().quote(&at(7_499, 1)), Price::from_cents(500));
        assert_eq!(policy().quote(&at(7_500, 1)), Price::ZERO);
        assert_eq!(policy().quote(&at(12_000, 4)), Price::ZERO);
    }
}
