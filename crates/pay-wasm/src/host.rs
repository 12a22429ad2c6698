//! Browser implementations of the core host traits.

use crate::bindings::{self, JsApplePaySession};
use pay_core::{
    ButtonElement, CompletionStatus, HostSession, LineItem, PaymentError, PaymentPlatform,
    PaymentRequest, PaymentResult,
};
use serde::Serialize;
use wasm_bindgen::JsValue;

fn to_js<T: Serialize + ?Sized>(value: &T) -> PaymentResult<JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| PaymentError::Serialization(e.to_string()))
}

fn js_error(action: &str, err: JsValue) -> PaymentError {
    let detail = err
        .as_string()
        .or_else(|| {
            js_sys::Reflect::get(&err, &JsValue::from_str("message"))
                .ok()
                .and_then(|m| m.as_string())
        })
        .unwrap_or_else(|| format!("{:?}", err));
    PaymentError::HostSession(format!("{} failed: {}", action, detail))
}

/// `ApplePaySession` in the current page
#[derive(Debug, Clone)]
pub struct WebHostSession {
    inner: JsApplePaySession,
}

impl WebHostSession {
    pub fn raw(&self) -> &JsApplePaySession {
        &self.inner
    }
}

impl HostSession for WebHostSession {
    fn begin(&self) -> PaymentResult<()> {
        self.inner.begin().map_err(|e| js_error("begin", e))
    }

    fn complete_merchant_validation(&self, merchant_session: &serde_json::Value) -> PaymentResult<()> {
        let session = to_js(merchant_session)?;
        self.inner
            .complete_merchant_validation(&session)
            .map_err(|e| js_error("completeMerchantValidation", e))
    }

    fn complete_shipping_method_selection(
        &self,
        status: CompletionStatus,
        total: &LineItem,
        line_items: &[LineItem],
    ) -> PaymentResult<()> {
        let total = to_js(total)?;
        let line_items = to_js(line_items)?;
        self.inner
            .complete_shipping_method_selection(status.code(), &total, &line_items)
            .map_err(|e| js_error("completeShippingMethodSelection", e))
    }

    fn complete_payment(&self, status: CompletionStatus) -> PaymentResult<()> {
        self.inner
            .complete_payment(status.code())
            .map_err(|e| js_error("completePayment", e))
    }

    fn abort(&self) -> PaymentResult<()> {
        self.inner.abort().map_err(|e| js_error("abort", e))
    }
}

/// The browser as a payment platform
#[derive(Debug, Default, Clone, Copy)]
pub struct WebPlatform;

impl PaymentPlatform for WebPlatform {
    type Session = WebHostSession;

    fn can_make_payments(&self) -> bool {
        bindings::session_class_present()
            && JsApplePaySession::can_make_payments().unwrap_or(false)
    }

    fn create_session(&self, version: u32, request: &PaymentRequest) -> PaymentResult<WebHostSession> {
        let request = to_js(request)?;
        let inner = JsApplePaySession::new(version, &request)
            .map_err(|e| js_error("new ApplePaySession", e))?;
        Ok(WebHostSession { inner })
    }
}

/// A DOM element acting as a payment button
pub struct DomButton(pub web_sys::Element);

impl ButtonElement for DomButton {
    fn has_class(&self, class: &str) -> bool {
        self.0.class_list().contains(class)
    }

    fn add_class(&self, class: &str) -> PaymentResult<()> {
        self.0
            .class_list()
            .add_1(class)
            .map_err(|e| js_error("classList.add", e))
    }
}
