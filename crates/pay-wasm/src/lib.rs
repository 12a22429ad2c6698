//! # pay-wasm
//!
//! WebAssembly bindings driving the Apple Pay payment sheet from a web page.
//!
//! This crate provides:
//! - Payment button reveal when the browser can make payments
//! - A payment session wired to the merchant backend endpoints
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { init_payment_buttons, begin_payment } from '/public/pkg/pay_wasm.js';
//!
//! await init();
//! init_payment_buttons('apple-pay-button');
//!
//! button.addEventListener('click', () => begin_payment(''));
//! ```
//!
//! ## Building
//!
//! ```bash
//! wasm-pack build crates/pay-wasm --target web --out-dir ../../static/pkg
//! ```

mod bindings;
mod host;

pub use host::{DomButton, WebHostSession, WebPlatform};

use js_sys::Function;
use pay_bridge::HttpBackendBridge;
use pay_core::{
    reveal_payment_buttons, HostEvent, HostEventKind, PaymentError, PaymentPlatform, PaymentResult,
    SessionOrchestrator, Storefront,
};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

type BrowserOrchestrator = SessionOrchestrator<WebHostSession, HttpBackendBridge>;

fn to_js_error(err: PaymentError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Reveal the page's payment buttons if the browser can make payments.
///
/// Call once the page has loaded. Returns how many buttons were revealed.
#[wasm_bindgen]
pub fn init_payment_buttons(class_name: &str) -> Result<usize, JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document available"))?;

    let collection = document.get_elements_by_class_name(class_name);
    let buttons = (0..collection.length())
        .filter_map(|i| collection.item(i))
        .map(DomButton);

    reveal_payment_buttons(WebPlatform.can_make_payments(), buttons).map_err(to_js_error)
}

/// Start a payment session against the merchant backend at `backend_base_url`.
///
/// An empty base URL targets the page's own origin. `storefront` may be
/// `undefined` to use the built-in example.
#[wasm_bindgen]
pub fn begin_payment(backend_base_url: &str, storefront: JsValue) -> Result<(), JsValue> {
    let storefront: Storefront = if storefront.is_undefined() || storefront.is_null() {
        Storefront::default()
    } else {
        serde_wasm_bindgen::from_value(storefront)?
    };

    let bridge = HttpBackendBridge::new(page_relative(backend_base_url));
    let orchestrator = Rc::new(
        SessionOrchestrator::prepare(&WebPlatform, bridge, &storefront).map_err(to_js_error)?,
    );

    let session = orchestrator.session().raw();
    session.set_onvalidatemerchant(&event_handler(
        &orchestrator,
        HostEventKind::ValidateMerchant,
        validate_merchant_event,
    ));
    session.set_onshippingmethodselected(&event_handler(
        &orchestrator,
        HostEventKind::ShippingMethodSelected,
        shipping_method_event,
    ));
    session.set_onpaymentauthorized(&event_handler(
        &orchestrator,
        HostEventKind::PaymentAuthorized,
        payment_authorized_event,
    ));

    orchestrator.start().map_err(to_js_error)
}

/// reqwest on wasm needs absolute URLs
fn page_relative(base_url: &str) -> String {
    if !base_url.is_empty() {
        return base_url.to_string();
    }
    web_sys::window()
        .and_then(|w| w.location().origin().ok())
        .unwrap_or_default()
}

/// Wrap an event parser into a JS callback feeding the orchestrator.
///
/// An event that cannot be parsed still gets its failure completion. The
/// closure lives as long as the session, so it is leaked.
fn event_handler(
    orchestrator: &Rc<BrowserOrchestrator>,
    kind: HostEventKind,
    parse: fn(&JsValue) -> PaymentResult<HostEvent>,
) -> Function {
    let orchestrator = Rc::clone(orchestrator);
    let callback = Closure::<dyn FnMut(JsValue)>::new(move |event: JsValue| {
        let orchestrator = Rc::clone(&orchestrator);
        let event = parse(&event);
        spawn_local(async move {
            let outcome = match event {
                Ok(event) => orchestrator.handle(event).await,
                Err(e) => {
                    log(&format!("unreadable {:?} event: {}", kind, e));
                    orchestrator.close_after_failure(kind)
                }
            };
            if let Err(e) = outcome {
                log(&format!("payment event failed: {}", e));
            }
        });
    });
    let function = callback.as_ref().unchecked_ref::<Function>().clone();
    callback.forget();
    function
}

fn field(value: &JsValue, name: &str) -> PaymentResult<JsValue> {
    js_sys::Reflect::get(value, &JsValue::from_str(name))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
        .ok_or_else(|| PaymentError::HostSession(format!("event has no {}", name)))
}

fn string_field(value: &JsValue, name: &str) -> PaymentResult<String> {
    field(value, name)?
        .as_string()
        .ok_or_else(|| PaymentError::HostSession(format!("event {} is not a string", name)))
}

fn validate_merchant_event(event: &JsValue) -> PaymentResult<HostEvent> {
    Ok(HostEvent::ValidateMerchant {
        validation_url: string_field(event, "validationURL")?,
    })
}

fn shipping_method_event(event: &JsValue) -> PaymentResult<HostEvent> {
    let method = field(event, "shippingMethod")?;
    Ok(HostEvent::ShippingMethodSelected {
        identifier: string_field(&method, "identifier")?,
    })
}

fn payment_authorized_event(event: &JsValue) -> PaymentResult<HostEvent> {
    let payment = serde_wasm_bindgen::from_value(field(event, "payment")?)
        .map_err(|e| PaymentError::Serialization(e.to_string()))?;
    Ok(HostEvent::PaymentAuthorized { payment })
}

/// Log to browser console
#[wasm_bindgen]
pub fn log(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

/// Get the library version
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(version(), env!("CARGO_PKG_VERSION"));
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    fn event(json: &str) -> JsValue {
        js_sys::JSON::parse(json).unwrap()
    }

    #[wasm_bindgen_test]
    fn test_validate_merchant_event() {
        let parsed = validate_merchant_event(&event(
            r#"{"validationURL":"https://apple-pay-gateway.apple.com/paymentservices/startSession"}"#,
        ))
        .unwrap();
        assert_eq!(
            parsed,
            HostEvent::ValidateMerchant {
                validation_url: "https://apple-pay-gateway.apple.com/paymentservices/startSession"
                    .into()
            }
        );
    }

    #[wasm_bindgen_test]
    fn test_shipping_method_event() {
        let parsed =
            shipping_method_event(&event(r#"{"shippingMethod":{"identifier":"express"}}"#)).unwrap();
        assert_eq!(
            parsed,
            HostEvent::ShippingMethodSelected {
                identifier: "express".into()
            }
        );
        assert!(shipping_method_event(&event("{}")).is_err());
    }

    #[wasm_bindgen_test]
    fn test_payment_event_keeps_payload() {
        let parsed =
            payment_authorized_event(&event(r#"{"payment":{"token":{"paymentData":{}}}}"#))
                .unwrap();
        match parsed {
            HostEvent::PaymentAuthorized { payment } => {
                assert!(payment["token"]["paymentData"].is_object())
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[wasm_bindgen_test]
    fn test_malformed_events_are_rejected() {
        assert!(payment_authorized_event(&event("{}")).is_err());
        assert!(payment_authorized_event(&event(r#"{"payment":null}"#)).is_err());
        assert!(validate_merchant_event(&event(r#"{"validationURL":42}"#)).is_err());
    }

    #[wasm_bindgen_test]
    fn test_buttons_stay_hidden_without_apple_pay() {
        let document = web_sys::window().unwrap().document().unwrap();
        let button = document.create_element("button").unwrap();
        button.set_class_name("apple-pay-button");
        document.body().unwrap().append_child(&button).unwrap();

        assert_eq!(init_payment_buttons("apple-pay-button").unwrap(), 0);
        assert!(!button.class_list().contains("visible"));
    }
}
