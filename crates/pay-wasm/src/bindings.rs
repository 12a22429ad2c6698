//! Raw wasm-bindgen bindings to Apple Pay JS.
//!
//! Exposes the `ApplePaySession` handle, its completion methods and the event
//! hook setters. The orchestrator-facing wrapper lives in `host.rs`.

use js_sys::Function;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    /// Raw `ApplePaySession` handle.
    #[wasm_bindgen(js_name = ApplePaySession)]
    #[derive(Debug, Clone)]
    pub type JsApplePaySession;

    /// `new ApplePaySession(version, paymentRequest)`
    #[wasm_bindgen(constructor, js_class = "ApplePaySession", catch)]
    pub fn new(version: u32, payment_request: &JsValue) -> Result<JsApplePaySession, JsValue>;

    /// `ApplePaySession.canMakePayments()`
    #[wasm_bindgen(static_method_of = JsApplePaySession, js_class = "ApplePaySession", js_name = canMakePayments, catch)]
    pub fn can_make_payments() -> Result<bool, JsValue>;

    #[wasm_bindgen(method, catch)]
    pub fn begin(this: &JsApplePaySession) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch)]
    pub fn abort(this: &JsApplePaySession) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = completeMerchantValidation)]
    pub fn complete_merchant_validation(
        this: &JsApplePaySession,
        merchant_session: &JsValue,
    ) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = completeShippingMethodSelection)]
    pub fn complete_shipping_method_selection(
        this: &JsApplePaySession,
        status: u16,
        new_total: &JsValue,
        new_line_items: &JsValue,
    ) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = completePayment)]
    pub fn complete_payment(this: &JsApplePaySession, status: u16) -> Result<(), JsValue>;

    #[wasm_bindgen(method, setter = onvalidatemerchant)]
    pub fn set_onvalidatemerchant(this: &JsApplePaySession, handler: &Function);

    #[wasm_bindgen(method, setter = onshippingmethodselected)]
    pub fn set_onshippingmethodselected(this: &JsApplePaySession, handler: &Function);

    #[wasm_bindgen(method, setter = onpaymentauthorized)]
    pub fn set_onpaymentauthorized(this: &JsApplePaySession, handler: &Function);
}

/// Whether the page runs somewhere `ApplePaySession` exists at all
pub fn session_class_present() -> bool {
    js_sys::Reflect::has(&js_sys::global(), &JsValue::from_str("ApplePaySession")).unwrap_or(false)
}
