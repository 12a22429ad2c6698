//! # Shipping Quotes
//!
//! Pure recalculation of the payment summary when the shipping method changes.

use crate::price::{Currency, Price};
use crate::request::{LineItem, PaymentRequest};

/// Identifier of the free shipping tier
pub const FREE_SHIPPING: &str = "free";

/// Identifier of the paid shipping tier offered by the demo storefront
pub const EXPRESS_SHIPPING: &str = "express";

/// Cost of any shipping tier other than [`FREE_SHIPPING`], in cents
pub const EXPRESS_SHIPPING_CENTS: i64 = 49;

/// Label of the shipping line in the payment summary
pub const SHIPPING_LABEL: &str = "Shipping";

/// Shipping and total for one selected shipping method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingQuote {
    pub shipping: Price,
    pub total: Price,
}

impl ShippingQuote {
    /// Quote for the selected method on top of the merchandise subtotal.
    ///
    /// `"free"` costs nothing; every other identifier is the paid tier.
    pub fn for_method(identifier: &str, subtotal: Price) -> Self {
        let shipping = shipping_cost(identifier, subtotal.currency);
        Self {
            shipping,
            total: subtotal.plus(shipping),
        }
    }

    /// Summary line items for this quote
    pub fn line_items(&self) -> Vec<LineItem> {
        vec![LineItem::new(SHIPPING_LABEL, self.shipping)]
    }

    /// Total line for this quote
    pub fn total_item(&self, label: impl Into<String>) -> LineItem {
        LineItem::new(label, self.total)
    }

    /// Replace the summary of `request` with this quote
    pub fn apply_to(&self, request: &PaymentRequest) -> PaymentRequest {
        request.with_summary(self.line_items(), self.total_item(request.total.label.clone()))
    }
}

/// Shipping cost for a method identifier
pub fn shipping_cost(identifier: &str, currency: Currency) -> Price {
    if identifier == FREE_SHIPPING {
        Price::zero(currency)
    } else {
        Price::from_cents(EXPRESS_SHIPPING_CENTS, currency)
    }
}
