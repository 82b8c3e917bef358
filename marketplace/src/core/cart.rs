//! Session cart of products pending checkout

use rust_decimal::Decimal;
use shared::logging::Component;
use shared::{market_warn, CartLine, ProductId};

use crate::core::catalog::Catalog;
use crate::error::{EntityKind, MarketError, MarketResult};

/// Totals over the lines that still resolve to a product
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartSummary {
    pub subtotal: Decimal,
    pub count: u32,
    /// Lines dropped because their product no longer exists
    pub pruned: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Add `quantity` of a product, merging with an existing line for it.
    pub fn add(&mut self, catalog: &Catalog, product_id: ProductId, quantity: u32) -> MarketResult<&CartLine> {
        if quantity == 0 {
            return Err(MarketError::invalid_input("quantity", "must be at least 1"));
        }
        let product = catalog
            .product(product_id)
            .ok_or_else(|| MarketError::not_found(EntityKind::Product, product_id))?;

        let index = match self.lines.iter().position(|l| l.product_id == product_id) {
            Some(index) => {
                let line = &mut self.lines[index];
                line.quantity = line.quantity.saturating_add(quantity);
                index
            }
            None => {
                self.lines.push(CartLine {
                    product_id,
                    vendor_id: product.vendor_id,
                    quantity,
                });
                self.lines.len() - 1
            }
        };
        Ok(&self.lines[index])
    }

    /// Returns `true` if a line was removed
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Drop lines whose product was removed from the catalog. Returns how many went.
    pub fn prune(&mut self, catalog: &Catalog) -> usize {
        let before = self.lines.len();
        self.lines.retain(|l| catalog.product(l.product_id).is_some());
        let pruned = before - self.lines.len();
        if pruned > 0 {
            market_warn!(Component::Cart, "Removed {} cart line(s) for products that no longer exist", pruned);
        }
        pruned
    }

    pub fn summary(&mut self, catalog: &Catalog) -> CartSummary {
        let pruned = self.prune(catalog);
        let mut summary = CartSummary {
            pruned,
            ..CartSummary::default()
        };
        for line in &self.lines {
            if let Some(product) = catalog.product(line.product_id) {
                summary.subtotal = product
                    .price
                    .checked_mul(Decimal::from(line.quantity))
                    .and_then(|line_total| summary.subtotal.checked_add(line_total))
                    .unwrap_or(Decimal::MAX);
                summary.count = summary.count.saturating_add(line.quantity);
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::catalog::{ProductDraft, VendorDraft};
    use std::str::FromStr;

    fn catalog_with_products() -> (Catalog, ProductId, ProductId) {
        let mut catalog = Catalog::new();
        let vendor = catalog
            .create_vendor(VendorDraft { name: "Dosa Corner".into(), active: true, ..Default::default() })
            .unwrap();
        let dosa = catalog
            .add_product(
                vendor.id,
                ProductDraft { name: "Dosa".into(), price: Some(Decimal::from_str("40.50").unwrap()), ..Default::default() },
            )
            .unwrap();
        let coffee = catalog
            .add_product(
                vendor.id,
                ProductDraft { name: "Coffee".into(), price: Some(Decimal::from(15)), ..Default::default() },
            )
            .unwrap();
        (catalog, dosa.id, coffee.id)
    }

    #[test]
    fn adding_the_same_product_merges_lines() {
        let (catalog, dosa, _) = catalog_with_products();
        let mut cart = Cart::new();
        cart.add(&catalog, dosa, 1).unwrap();
        cart.add(&catalog, dosa, 2).unwrap();
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
    }

    #[test]
    fn unknown_product_is_reported() {
        let (catalog, _, _) = catalog_with_products();
        let mut cart = Cart::new();
        let err = cart.add(&catalog, ProductId::new(), 1).unwrap_err();
        assert!(matches!(err, MarketError::NotFound { kind: EntityKind::Product, .. }));
        assert!(cart.is_empty());
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let (catalog, dosa, _) = catalog_with_products();
        let mut cart = Cart::new();
        assert!(cart.add(&catalog, dosa, 0).is_err());
    }

    #[test]
    fn summary_totals_price_times_quantity() {
        let (catalog, dosa, coffee) = catalog_with_products();
        let mut cart = Cart::new();
        cart.add(&catalog, dosa, 2).unwrap();
        cart.add(&catalog, coffee, 1).unwrap();
        let summary = cart.summary(&catalog);
        assert_eq!(summary.subtotal, Decimal::from(96));
        assert_eq!(summary.count, 3);
        assert_eq!(summary.pruned, 0);
    }

    #[test]
    fn summary_subtotal_saturates() {
        let (mut catalog, dosa, _) = catalog_with_products();
        let vendor = catalog.product(dosa).unwrap().vendor_id;
        let gold = catalog
            .add_product(vendor, ProductDraft { name: "Gold".into(), price: Some(Decimal::MAX), ..Default::default() })
            .unwrap();
        let mut cart = Cart::new();
        cart.add(&catalog, gold.id, u32::MAX).unwrap();
        cart.add(&catalog, dosa, 1).unwrap();

        assert_eq!(cart.summary(&catalog).subtotal, Decimal::MAX);
    }

    #[test]
    fn summary_prunes_lines_for_deleted_products() {
        let (mut catalog, dosa, coffee) = catalog_with_products();
        let mut cart = Cart::new();
        cart.add(&catalog, dosa, 1).unwrap();
        cart.add(&catalog, coffee, 1).unwrap();
        catalog.remove_product(dosa).unwrap();

        let summary = cart.summary(&catalog);
        assert_eq!(summary.pruned, 1);
        assert_eq!(summary.count, 1);
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn remove_and_clear() {
        let (catalog, dosa, coffee) = catalog_with_products();
        let mut cart = Cart::new();
        cart.add(&catalog, dosa, 1).unwrap();
        cart.add(&catalog, coffee, 1).unwrap();
        assert!(cart.remove(dosa));
        assert!(!cart.remove(dosa));
        cart.clear();
        assert!(cart.is_empty());
    }
}
