//! In-memory payment gateway for testing.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::error::PaymentError;
use crate::gateway::{HoldRequest, IntentStatus, PaymentGateway, PaymentIntent};

#[derive(Debug, Default)]
struct GatewayState {
    intents: HashMap<String, PaymentIntent>,
    next_id: u32,
    confirm_calls: u32,
    cancel_calls: u32,
    fail_on_create: bool,
    decline_on_confirm: bool,
    require_action_on_confirm: bool,
    fail_on_cancel: bool,
}

/// In-memory payment gateway for testing.
///
/// Fresh intents require confirmation; confirmation places the hold
/// (`requires_capture`) unless one of the failure knobs is set.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<RwLock<GatewayState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the gateway to fail hold creation with a server error.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state.write().unwrap().fail_on_create = fail;
    }

    /// Configures the gateway to decline the next confirmation.
    pub fn set_decline_on_confirm(&self, decline: bool) {
        self.state.write().unwrap().decline_on_confirm = decline;
    }

    /// Configures confirmations to come back requiring guest action.
    pub fn set_require_action_on_confirm(&self, require: bool) {
        self.state.write().unwrap().require_action_on_confirm = require;
    }

    /// Configures the gateway to fail cancellation with a server error.
    pub fn set_fail_on_cancel(&self, fail: bool) {
        self.state.write().unwrap().fail_on_cancel = fail;
    }

    /// Returns the number of intents created.
    pub fn intent_count(&self) -> usize {
        self.state.read().unwrap().intents.len()
    }

    /// Returns how many times `confirm` was called.
    pub fn confirm_calls(&self) -> u32 {
        self.state.read().unwrap().confirm_calls
    }

    /// Returns how many times `cancel` was called.
    pub fn cancel_calls(&self) -> u32 {
        self.state.read().unwrap().cancel_calls
    }

    /// Returns the current status of an intent, if it exists.
    pub fn intent_status(&self, intent_id: &str) -> Option<IntentStatus> {
        self.state
            .read()
            .unwrap()
            .intents
            .get(intent_id)
            .map(|i| i.status.clone())
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn create_hold(&self, request: HoldRequest) -> crate::Result<PaymentIntent> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_create {
            return Err(PaymentError::Unavailable(
                "gateway returned a server error".to_string(),
            ));
        }
        let _ = request;

        state.next_id += 1;
        let id = format!("pi_{:04}", state.next_id);
        let intent = PaymentIntent {
            id: id.clone(),
            status: IntentStatus::RequiresConfirmation,
            next_action: None,
            client_secret: Some(format!("{id}_secret")),
        };
        state.intents.insert(id, intent.clone());
        Ok(intent)
    }

    async fn confirm(
        &self,
        intent_id: &str,
        payment_method: Option<&str>,
    ) -> crate::Result<PaymentIntent> {
        let mut state = self.state.write().unwrap();
        state.confirm_calls += 1;

        let decline = state.decline_on_confirm;
        let require_action = state.require_action_on_confirm;
        let _ = payment_method;

        let intent = state
            .intents
            .get_mut(intent_id)
            .ok_or_else(|| PaymentError::IntentNotFound(intent_id.to_string()))?;

        if decline {
            intent.status = IntentStatus::RequiresPaymentMethod;
            return Err(PaymentError::Rejected {
                detail: "card_declined".to_string(),
            });
        }
        if require_action {
            intent.status = IntentStatus::RequiresAction;
            intent.next_action = Some(serde_json::json!({"type": "use_sdk"}));
            return Ok(intent.clone());
        }

        intent.status = IntentStatus::RequiresCapture;
        intent.next_action = None;
        Ok(intent.clone())
    }

    async fn cancel(&self, intent_id: &str) -> crate::Result<PaymentIntent> {
        let mut state = self.state.write().unwrap();
        state.cancel_calls += 1;

        if state.fail_on_cancel {
            return Err(PaymentError::Unavailable(
                "gateway returned a server error".to_string(),
            ));
        }

        let intent = state
            .intents
            .get_mut(intent_id)
            .ok_or_else(|| PaymentError::IntentNotFound(intent_id.to_string()))?;

        intent.status = IntentStatus::Canceled;
        Ok(intent.clone())
    }
}
