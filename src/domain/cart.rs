//! Cart aggregation over live catalog data.
//!
//! A cart line references its product by (kind, id) and never snapshots
//! price or weight; totals are recomputed from whatever the catalog says
//! right now. A line whose product has been deleted stays visible but
//! contributes nothing to the totals.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::domain::product::{Product, ProductKey};

/// One cart item joined with the product it references, if that product
/// still exists.
#[derive(Clone, Debug)]
pub struct CartLine {
    pub id: Uuid,
    pub key: ProductKey,
    pub product: Option<Product>,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartLine {
    pub fn is_available(&self) -> bool {
        self.product.is_some()
    }

    pub fn unit_price(&self) -> Option<Decimal> {
        self.product.as_ref().map(Product::price)
    }

    pub fn unit_weight(&self) -> Option<Decimal> {
        self.product.as_ref().map(Product::weight)
    }

    pub fn subtotal_price(&self) -> Option<Decimal> {
        self.unit_price().map(|p| p * Decimal::from(self.quantity))
    }

    pub fn subtotal_weight(&self) -> Option<Decimal> {
        self.unit_weight().map(|w| w * Decimal::from(self.quantity))
    }
}

/// A cart hydrated against the catalog, in item insertion order.
#[derive(Clone, Debug)]
pub struct CartView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub lines: Vec<CartLine>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartView {
    /// Sum of price x quantity over lines whose product still resolves.
    /// Stale lines are skipped, never counted at a remembered price.
    pub fn total_price(&self) -> Decimal {
        self.lines.iter().filter_map(CartLine::subtotal_price).sum()
    }

    pub fn total_weight(&self) -> Decimal {
        self.lines.iter().filter_map(CartLine::subtotal_weight).sum()
    }

    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    pub fn has_unavailable_lines(&self) -> bool {
        self.lines.iter().any(|l| !l.is_available())
    }
}

/// Quantity left on a cart item after removing `requested` units.
/// `None` means the row goes away entirely; a removal never leaves a zero
/// or negative quantity behind, and removing more than is present behaves
/// the same as removing exactly what is present.
pub fn remaining_quantity(current: i32, requested: i32) -> Option<i32> {
    let left = current - requested;
    (left > 0).then_some(left)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::{Book, ProductKind};

    fn book_line(price: Decimal, quantity: i32) -> CartLine {
        let id = Uuid::new_v4();
        let now = Utc::now();
        CartLine {
            id: Uuid::new_v4(),
            key: ProductKey::new(ProductKind::Book, id),
            product: Some(Product::Book(Book {
                id,
                title: "Dune".into(),
                author: "Frank Herbert".into(),
                price,
                weight: Decimal::new(650, 3),
            })),
            quantity,
            created_at: now,
            updated_at: now,
        }
    }

    fn stale_line(quantity: i32) -> CartLine {
        let now = Utc::now();
        CartLine {
            id: Uuid::new_v4(),
            key: ProductKey::new(ProductKind::SoftwareLicense, Uuid::new_v4()),
            product: None,
            quantity,
            created_at: now,
            updated_at: now,
        }
    }

    fn view(lines: Vec<CartLine>) -> CartView {
        let now = Utc::now();
        CartView {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            lines,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_total_price_is_decimal_exact() {
        // 19.99 x 3 must come out as 59.97, not 59.970000000000006.
        let cart = view(vec![book_line(Decimal::new(1999, 2), 3)]);
        assert_eq!(cart.total_price(), Decimal::new(5997, 2));
        assert_eq!(cart.total_price().to_string(), "59.97");
    }

    #[test]
    fn test_totals_skip_stale_lines() {
        let cart = view(vec![book_line(Decimal::new(1000, 2), 2), stale_line(5)]);
        assert_eq!(cart.total_price(), Decimal::new(2000, 2));
        assert_eq!(cart.total_weight(), Decimal::new(1300, 3));
        assert!(cart.has_unavailable_lines());
        assert_eq!(cart.item_count(), 2); // stale lines stay visible
    }

    #[test]
    fn test_empty_cart_totals_are_zero() {
        let cart = view(vec![]);
        assert_eq!(cart.total_price(), Decimal::ZERO);
        assert_eq!(cart.total_weight(), Decimal::ZERO);
        assert_eq!(cart.item_count(), 0);
        assert!(!cart.has_unavailable_lines());
    }

    #[test]
    fn test_remaining_quantity_decrements() {
        assert_eq!(remaining_quantity(5, 2), Some(3));
        assert_eq!(remaining_quantity(5, 4), Some(1));
    }

    #[test]
    fn test_remaining_quantity_deletes_at_or_below_zero() {
        assert_eq!(remaining_quantity(3, 3), None);
        // Removing more than present is the same as removing all of it.
        assert_eq!(remaining_quantity(3, 7), None);
    }

    #[test]
    fn test_stale_line_reports_no_prices() {
        let line = stale_line(2);
        assert!(!line.is_available());
        assert_eq!(line.unit_price(), None);
        assert_eq!(line.subtotal_price(), None);
        assert_eq!(line.subtotal_weight(), None);
    }
}
