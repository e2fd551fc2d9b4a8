//! # Cart
//!
//! Server-side pricing of a client-held cart.
//!
//! The cart lives in the browser. Before checkout the client sends its lines
//! here and gets a total computed from current catalog prices, so a stale or
//! tampered price never reaches the payment step.

use crate::{Backoffice, CoreError, Money, Product};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One cart row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: u64,
    pub quantity: u64,
}

/// A priced cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CartTotal {
    pub total: Money,
    /// Sum of quantities over lines that were priced.
    pub item_count: u64,
    /// Product ids no longer in the catalog. They add nothing to the total.
    pub missing: Vec<u64>,
}

/// Price `lines` against a price table.
///
/// Zero-quantity lines are ignored. A product listed twice is counted twice.
#[must_use]
pub fn price_lines(lines: &[CartLine], prices: &BTreeMap<u64, Money>) -> CartTotal {
    let mut priced = CartTotal::default();
    for line in lines.iter().filter(|l| l.quantity > 0) {
        match prices.get(&line.product_id) {
            Some(price) => {
                priced.total = priced.total.plus(price.times(line.quantity));
                priced.item_count = priced.item_count.saturating_add(line.quantity);
            }
            None => {
                if !priced.missing.contains(&line.product_id) {
                    priced.missing.push(line.product_id);
                }
            }
        }
    }
    priced
}

impl Backoffice {
    /// Price a cart with the current catalog.
    pub fn price_cart(&self, lines: &[CartLine]) -> Result<CartTotal, CoreError> {
        let prices: BTreeMap<u64, Money> = self
            .list_products(None)?
            .iter()
            .map(|p: &Product| (p.id, p.price))
            .collect();
        Ok(price_lines(lines, &prices))
    }
}
