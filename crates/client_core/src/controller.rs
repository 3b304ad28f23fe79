//! Registration form state, validation, and the single create-account submission.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use serde_json::Value;
use shared::{
    domain::{FormState, RegistrationField},
    protocol::{is_truthy, RegisterRequest},
};
use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::{RegistrationApi, SessionStore};

pub const DEFAULT_FAILURE_MESSAGE: &str = "Please check your details";

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// Account created; carries the response body handed to the session store.
    Success(Value),
    ValidationFailed(Vec<RegistrationField>),
    UnexpectedResponse,
    ServerError(String),
    /// The owning screen went away before the request settled.
    Abandoned,
}

/// Shared view of the in-flight flag.
#[derive(Debug, Clone, Default)]
pub struct LoadingState(Arc<AtomicBool>);

impl LoadingState {
    pub fn is_loading(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn acquire(&self) -> LoadingGuard {
        self.0.store(true, Ordering::Release);
        LoadingGuard {
            state: self.clone(),
        }
    }
}

/// Holds `loading = true` until dropped.
#[must_use]
pub struct LoadingGuard {
    state: LoadingState,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.state.0.store(false, Ordering::Release);
    }
}

pub struct RegistrationFormController {
    api: Arc<dyn RegistrationApi>,
    session: Arc<dyn SessionStore>,
    form: FormState,
    loading: LoadingState,
    lifetime: CancellationToken,
}

impl RegistrationFormController {
    pub fn new(api: Arc<dyn RegistrationApi>, session: Arc<dyn SessionStore>) -> Self {
        Self::with_lifetime(api, session, &CancellationToken::new())
    }

    /// The controller lives on a child of `parent`: cancelling `parent` tears
    /// it down, dropping the controller does not cancel `parent`.
    pub fn with_lifetime(
        api: Arc<dyn RegistrationApi>,
        session: Arc<dyn SessionStore>,
        parent: &CancellationToken,
    ) -> Self {
        Self {
            api,
            session,
            form: FormState::default(),
            loading: LoadingState::default(),
            lifetime: parent.child_token(),
        }
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn update_field(&mut self, field: RegistrationField, value: impl Into<String>) {
        self.form.set(field, value);
    }

    pub fn is_loading(&self) -> bool {
        self.loading.is_loading()
    }

    pub fn loading_state(&self) -> LoadingState {
        self.loading.clone()
    }

    pub fn lifetime_token(&self) -> CancellationToken {
        self.lifetime.clone()
    }

    pub fn is_torn_down(&self) -> bool {
        self.lifetime.is_cancelled()
    }

    pub fn teardown(&self) {
        self.lifetime.cancel();
    }

    pub async fn submit(&mut self) -> SubmitOutcome {
        let span = info_span!("registration_submit", attempt_id = %Uuid::new_v4());
        self.submit_once().instrument(span).await
    }

    async fn submit_once(&mut self) -> SubmitOutcome {
        let missing = self.form.missing_required();
        if !missing.is_empty() {
            info!(?missing, "registration blocked: required fields are empty");
            return SubmitOutcome::ValidationFailed(missing);
        }
        if self.lifetime.is_cancelled() {
            return SubmitOutcome::Abandoned;
        }

        let _loading = self.loading.acquire();
        let request = RegisterRequest::from(&self.form);

        let settled = tokio::select! {
            biased;
            _ = self.lifetime.cancelled() => None,
            result = self.api.register(&request) => Some(result),
        };

        let Some(result) = settled else {
            info!("screen torn down while registration was in flight");
            return SubmitOutcome::Abandoned;
        };
        if self.lifetime.is_cancelled() {
            info!("registration settled after teardown; result discarded");
            return SubmitOutcome::Abandoned;
        }

        match result {
            Ok(response) if is_truthy(&response.body) => {
                self.session.login(response.body.clone()).await;
                info!(status = response.status, "account created");
                SubmitOutcome::Success(response.body)
            }
            Ok(response) => {
                warn!(
                    status = response.status,
                    "registration succeeded with an empty response body"
                );
                SubmitOutcome::UnexpectedResponse
            }
            Err(err) => {
                warn!(error = %err, "registration failed");
                let message = err.server_message().unwrap_or(DEFAULT_FAILURE_MESSAGE);
                SubmitOutcome::ServerError(message.to_string())
            }
        }
    }
}

impl Drop for RegistrationFormController {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
