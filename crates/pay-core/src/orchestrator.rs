//! # Session Orchestrator
//!
//! Binds the three host events to the backend bridge and drives the host
//! session to completion. Every triggering event produces exactly one
//! completion call: a failed merchant validation aborts the session, and a
//! payment completes with success only when the backend answered 200.

use crate::error::{PaymentError, PaymentResult};
use crate::price::Price;
use crate::request::PaymentRequest;
use crate::session::{
    CompletionStatus, HostEvent, HostEventKind, HostSession, PaymentPlatform, SessionStage,
    SESSION_API_VERSION,
};
use crate::shipping::ShippingQuote;
use crate::storefront::Storefront;
use crate::strategy::BackendBridge;
use std::cell::{Cell, RefCell};
use tracing::{debug, info, instrument, warn};

/// Drives one host payment session
pub struct SessionOrchestrator<H, B> {
    session: H,
    bridge: B,
    request: RefCell<PaymentRequest>,
    subtotal: Price,
    stage: Cell<SessionStage>,
}

impl<H: HostSession, B: BackendBridge> SessionOrchestrator<H, B> {
    /// Wrap an already constructed host session
    pub fn new(session: H, bridge: B, request: PaymentRequest, subtotal: Price) -> Self {
        Self {
            session,
            bridge,
            request: RefCell::new(request),
            subtotal,
            stage: Cell::new(SessionStage::Idle),
        }
    }

    /// Check availability and construct a session for the storefront.
    ///
    /// The session is not started: attach the event hooks, then call
    /// [`SessionOrchestrator::start`].
    pub fn prepare<P>(platform: &P, bridge: B, storefront: &Storefront) -> PaymentResult<Self>
    where
        P: PaymentPlatform<Session = H>,
    {
        if !platform.can_make_payments() {
            return Err(PaymentError::HostSession(
                "platform cannot make payments".to_string(),
            ));
        }

        let request = storefront.payment_request();
        let session = platform.create_session(SESSION_API_VERSION, &request)?;
        Ok(Self::new(session, bridge, request, storefront.subtotal()))
    }

    /// Begin the payment sheet. One shot.
    pub fn start(&self) -> PaymentResult<()> {
        if self.stage.get() != SessionStage::Idle {
            return Err(PaymentError::HostSession(format!(
                "session already started ({:?})",
                self.stage.get()
            )));
        }
        self.session.begin()?;
        self.stage.set(SessionStage::Started);
        info!("Payment session started, total={}", self.request.borrow().total.amount);
        Ok(())
    }

    /// The host session being driven
    pub fn session(&self) -> &H {
        &self.session
    }

    /// Stage of the host session as last observed
    pub fn stage(&self) -> SessionStage {
        self.stage.get()
    }

    /// The payment request as currently shown on the sheet
    pub fn current_request(&self) -> PaymentRequest {
        self.request.borrow().clone()
    }

    /// Route a host event to its handler.
    ///
    /// A handler error on a still open session closes it with an explicit
    /// failure, see [`SessionOrchestrator::close_after_failure`].
    pub async fn handle(&self, event: HostEvent) -> PaymentResult<()> {
        let kind = event.kind();
        let outcome = match event {
            HostEvent::ValidateMerchant { validation_url } => {
                self.on_validate_merchant(&validation_url).await.map(|_| ())
            }
            HostEvent::ShippingMethodSelected { identifier } => {
                self.on_shipping_method_selected(&identifier).map(|_| ())
            }
            HostEvent::PaymentAuthorized { payment } => {
                self.on_payment_authorized(&payment).await.map(|_| ())
            }
        };

        if let Err(e) = &outcome {
            if !self.stage.get().is_terminal() {
                warn!("{:?} handling failed: {}", kind, e);
                self.close_after_failure(kind)?;
            }
        }
        outcome
    }

    /// Answer an event that could not be handled (or not even parsed) with a
    /// failure completion, so the sheet is never left waiting.
    ///
    /// Validation aborts the session, a shipping change is refused with the
    /// current totals and a payment completes with failure. Finished sessions
    /// are left alone.
    pub fn close_after_failure(&self, kind: HostEventKind) -> PaymentResult<()> {
        if self.stage.get().is_terminal() {
            debug!("Session already finished, no completion for {:?}", kind);
            return Ok(());
        }

        match kind {
            HostEventKind::ValidateMerchant => {
                self.stage.set(SessionStage::Aborted);
                self.session.abort()
            }
            HostEventKind::ShippingMethodSelected => {
                let request = self.request.borrow();
                self.session.complete_shipping_method_selection(
                    CompletionStatus::Failure,
                    &request.total,
                    &request.line_items,
                )
            }
            HostEventKind::PaymentAuthorized => {
                self.stage
                    .set(SessionStage::Completed(CompletionStatus::Failure));
                self.session.complete_payment(CompletionStatus::Failure)
            }
        }
    }

    /// Merchant validation requested by the host.
    ///
    /// Success hands the merchant session to the host. A bridge failure, or a
    /// host refusing the merchant session, aborts the session instead.
    #[instrument(skip(self))]
    pub async fn on_validate_merchant(&self, validation_url: &str) -> PaymentResult<CompletionStatus> {
        self.ensure_open("validate merchant")?;
        self.advance(SessionStage::ValidatingMerchant);
        debug!("Validating merchant");

        let fetched = self.bridge.fetch_merchant_session(validation_url).await;
        self.ensure_open("complete merchant validation")?;

        let failure = match fetched {
            Ok(merchant_session) => match self.session.complete_merchant_validation(&merchant_session) {
                Ok(()) => {
                    self.advance(SessionStage::Ready);
                    info!("Merchant validation complete");
                    return Ok(CompletionStatus::Success);
                }
                Err(e) => {
                    warn!("Host refused the merchant session: {}", e);
                    e
                }
            },
            Err(e) => {
                let (status, status_text) = e.rejection().unwrap_or((0, e.to_string()));
                warn!(
                    "Merchant validation failed: status={}, statusText={}",
                    status, status_text
                );
                e
            }
        };

        debug!("Aborting session after {}", failure);
        self.stage.set(SessionStage::Aborted);
        self.session.abort()?;
        Ok(CompletionStatus::Failure)
    }

    /// Shipping method changed: recompute the summary and report it
    pub fn on_shipping_method_selected(&self, identifier: &str) -> PaymentResult<ShippingQuote> {
        self.ensure_open("select shipping method")?;

        let quote = ShippingQuote::for_method(identifier, self.subtotal);
        let updated = quote.apply_to(&self.request.borrow());

        self.session.complete_shipping_method_selection(
            CompletionStatus::Success,
            &updated.total,
            &updated.line_items,
        )?;

        debug!(
            "Shipping method {} selected: shipping={}, total={}",
            identifier, quote.shipping, quote.total
        );
        self.request.replace(updated);
        self.advance(SessionStage::ShippingSelected);
        Ok(quote)
    }

    /// Payment authorized: forward the payload and complete exactly once
    #[instrument(skip(self, payment))]
    pub async fn on_payment_authorized(&self, payment: &serde_json::Value) -> PaymentResult<CompletionStatus> {
        self.ensure_open("authorize payment")?;
        self.advance(SessionStage::Authorized);

        let submitted = self.bridge.submit_payment(payment).await;
        self.ensure_open("complete payment")?;

        let status = match submitted {
            Ok(()) => CompletionStatus::Success,
            Err(e) => {
                warn!("Payment submission failed: {}", e);
                CompletionStatus::Failure
            }
        };

        self.session.complete_payment(status)?;
        self.stage.set(SessionStage::Completed(status));
        info!("Payment completed: {:?}", status);
        Ok(status)
    }

    /// Move the stage forward; events racing an in-flight request never
    /// move it back
    fn advance(&self, next: SessionStage) {
        let current = self.stage.get();
        if !current.is_terminal() && next.order() >= current.order() {
            self.stage.set(next);
        }
    }

    fn ensure_open(&self, action: &str) -> PaymentResult<()> {
        let stage = self.stage.get();
        if stage.is_terminal() {
            warn!("Ignoring {} on finished session ({:?})", action, stage);
            return Err(PaymentError::HostSession(format!(
                "cannot {} after session finished",
                action
            )));
        }
        Ok(())
    }
}
