//! # Storefront Configuration
//!
//! What the demo store sells and how its payment sheet is set up.
//! Loaded from `config/storefront.toml`; the built-in default is the
//! one-cent example item with free and express shipping.

use crate::price::{Currency, Price};
use crate::request::{ContactField, MerchantCapability, PaymentNetwork, PaymentRequest, ShippingMethod};
use crate::shipping::{shipping_cost, ShippingQuote, EXPRESS_SHIPPING, FREE_SHIPPING};
use serde::{Deserialize, Serialize};

/// A shipping option as configured (its amount derives from the identifier)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingOption {
    pub identifier: String,
    pub label: String,
    #[serde(default)]
    pub detail: String,
}

/// Storefront settings used to build payment requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Storefront {
    /// ISO 3166 country of the merchant (e.g. "FR")
    pub country_code: String,

    /// Currency charged
    #[serde(default)]
    pub currency: Currency,

    /// Label of the total line (usually the merchant name)
    pub total_label: String,

    /// Merchandise subtotal in smallest currency unit
    pub subtotal_cents: i64,

    /// Offered shipping options, first one preselected
    #[serde(default)]
    pub shipping_options: Vec<ShippingOption>,

    #[serde(default = "default_networks")]
    pub supported_networks: Vec<PaymentNetwork>,

    #[serde(default = "default_capabilities")]
    pub merchant_capabilities: Vec<MerchantCapability>,

    #[serde(default)]
    pub required_shipping_contact_fields: Vec<ContactField>,
}

fn default_networks() -> Vec<PaymentNetwork> {
    vec![
        PaymentNetwork::Amex,
        PaymentNetwork::Discover,
        PaymentNetwork::MasterCard,
        PaymentNetwork::Visa,
    ]
}

fn default_capabilities() -> Vec<MerchantCapability> {
    vec![MerchantCapability::Supports3DS]
}

impl Storefront {
    /// Merchandise subtotal
    pub fn subtotal(&self) -> Price {
        Price::from_cents(self.subtotal_cents, self.currency)
    }

    /// Quote for a shipping method identifier
    pub fn quote(&self, identifier: &str) -> ShippingQuote {
        ShippingQuote::for_method(identifier, self.subtotal())
    }

    /// Build the initial payment request, priced with the first shipping option
    pub fn payment_request(&self) -> PaymentRequest {
        let shipping_methods = self
            .shipping_options
            .iter()
            .map(|opt| ShippingMethod {
                label: opt.label.clone(),
                amount: shipping_cost(&opt.identifier, self.currency).amount_string(),
                identifier: opt.identifier.clone(),
                detail: opt.detail.clone(),
            })
            .collect();

        let initial = self
            .shipping_options
            .first()
            .map(|opt| opt.identifier.as_str())
            .unwrap_or(FREE_SHIPPING);
        let quote = self.quote(initial);

        PaymentRequest {
            country_code: self.country_code.clone(),
            currency_code: self.currency,
            shipping_methods,
            line_items: quote.line_items(),
            total: quote.total_item(self.total_label.clone()),
            supported_networks: self.supported_networks.clone(),
            merchant_capabilities: self.merchant_capabilities.clone(),
            required_shipping_contact_fields: self.required_shipping_contact_fields.clone(),
        }
    }
}

impl Default for Storefront {
    fn default() -> Self {
        Self {
            country_code: "FR".to_string(),
            currency: Currency::EUR,
            total_label: "Apple Pay Example".to_string(),
            subtotal_cents: 1,
            shipping_options: vec![
                ShippingOption {
                    identifier: FREE_SHIPPING.to_string(),
                    label: "Free Shipping".to_string(),
                    detail: "Delivers in five business days".to_string(),
                },
                ShippingOption {
                    identifier: EXPRESS_SHIPPING.to_string(),
                    label: "Express Shipping".to_string(),
                    detail: "Delivers in two business days".to_string(),
                },
            ],
            supported_networks: default_networks(),
            merchant_capabilities: default_capabilities(),
            required_shipping_contact_fields: vec![ContactField::Email],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_payment_request() {
        let request = Storefront::default().payment_request();

        assert_eq!(request.country_code, "FR");
        assert_eq!(request.currency_code, Currency::EUR);
        assert_eq!(request.shipping_methods.len(), 2);
        assert_eq!(request.shipping_methods[0].amount, "0.00");
        assert_eq!(request.shipping_methods[1].amount, "0.49");
        assert_eq!(request.line_items[0].label, "Shipping");
        assert_eq!(request.line_items[0].amount, "0.00");
        assert_eq!(request.total.label, "Apple Pay Example");
        assert_eq!(request.total.amount, "0.01");
        assert_eq!(request.required_shipping_contact_fields, vec![ContactField::Email]);
    }

    #[test]
    fn test_parse_toml() {
        let toml_src = r#"
            country_code = "GB"
            currency = "GBP"
            total_label = "Tea Shop"
            subtotal_cents = 350

            [[shipping_options]]
            identifier = "express"
            label = "Courier"
        "#;

        let storefront: Storefront = toml::from_str(toml_src).unwrap();
        let request = storefront.payment_request();

        assert_eq!(request.currency_code, Currency::GBP);
        assert_eq!(request.total.amount, "3.99");
        assert_eq!(request.supported_networks.len(), 4);
        assert_eq!(request.merchant_capabilities, vec![MerchantCapability::Supports3DS]);
    }
}
