//! # Payment Request Types
//!
//! The descriptor handed to the host payment session, in the camelCase wire
//! form the payment sheet understands.

use crate::price::{Currency, Price};
use serde::{Deserialize, Serialize};

/// A labeled amount shown in the payment summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Display label
    pub label: String,
    /// Decimal amount string (e.g. "0.49")
    pub amount: String,
}

impl LineItem {
    pub fn new(label: impl Into<String>, price: Price) -> Self {
        Self {
            label: label.into(),
            amount: price.amount_string(),
        }
    }
}

/// A shipping option offered on the payment sheet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingMethod {
    /// Display label (e.g. "Express Shipping")
    pub label: String,
    /// Decimal amount string
    pub amount: String,
    /// Identifier reported back when the user selects this method
    pub identifier: String,
    /// Delivery estimate shown under the label
    #[serde(default)]
    pub detail: String,
}

/// Card networks accepted by the merchant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentNetwork {
    #[serde(rename = "amex")]
    Amex,
    #[serde(rename = "discover")]
    Discover,
    #[serde(rename = "masterCard")]
    MasterCard,
    #[serde(rename = "visa")]
    Visa,
}

/// Payment processing capabilities of the merchant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MerchantCapability {
    #[serde(rename = "supports3DS")]
    Supports3DS,
    #[serde(rename = "supportsEMV")]
    SupportsEMV,
    #[serde(rename = "supportsCredit")]
    SupportsCredit,
    #[serde(rename = "supportsDebit")]
    SupportsDebit,
}

/// Contact fields the payment sheet must collect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ContactField {
    Email,
    Name,
    Phone,
    PostalAddress,
}

/// The descriptor a host payment session is constructed with.
///
/// Immutable once built; a shipping change produces a new value through
/// [`PaymentRequest::with_summary`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub country_code: String,
    pub currency_code: Currency,
    #[serde(default)]
    pub shipping_methods: Vec<ShippingMethod>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    pub total: LineItem,
    pub supported_networks: Vec<PaymentNetwork>,
    pub merchant_capabilities: Vec<MerchantCapability>,
    #[serde(default)]
    pub required_shipping_contact_fields: Vec<ContactField>,
}

impl PaymentRequest {
    /// Copy of this request with the summary replaced
    pub fn with_summary(&self, line_items: Vec<LineItem>, total: LineItem) -> Self {
        Self {
            line_items,
            total,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PaymentRequest {
        PaymentRequest {
            country_code: "FR".into(),
            currency_code: Currency::EUR,
            shipping_methods: vec![ShippingMethod {
                label: "Free Shipping".into(),
                amount: "0.00".into(),
                identifier: "free".into(),
                detail: "Delivers in five business days".into(),
            }],
            line_items: vec![LineItem::new("Shipping", Price::zero(Currency::EUR))],
            total: LineItem::new("Apple Pay Example", Price::from_cents(1, Currency::EUR)),
            supported_networks: vec![PaymentNetwork::MasterCard, PaymentNetwork::Visa],
            merchant_capabilities: vec![MerchantCapability::Supports3DS],
            required_shipping_contact_fields: vec![ContactField::Email],
        }
    }

    #[test]
    fn test_wire_format() {
        let json = serde_json::to_value(request()).unwrap();

        assert_eq!(json["countryCode"], "FR");
        assert_eq!(json["currencyCode"], "EUR");
        assert_eq!(json["supportedNetworks"][0], "masterCard");
        assert_eq!(json["merchantCapabilities"][0], "supports3DS");
        assert_eq!(json["requiredShippingContactFields"][0], "email");
        assert_eq!(json["shippingMethods"][0]["identifier"], "free");
        assert_eq!(json["total"]["amount"], "0.01");
    }

    #[test]
    fn test_with_summary_leaves_original_untouched() {
        let original = request();
        let updated = original.with_summary(
            vec![LineItem::new("Shipping", Price::from_cents(49, Currency::EUR))],
            LineItem::new("Apple Pay Example", Price::from_cents(50, Currency::EUR)),
        );

        assert_eq!(original.total.amount, "0.01");
        assert_eq!(updated.total.amount, "0.50");
        assert_eq!(updated.shipping_methods, original.shipping_methods);
    }
}
