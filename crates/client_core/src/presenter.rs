//! Presentation layer: turns submission outcomes into notices and navigation.

use std::sync::Arc;

use shared::domain::RegistrationField;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::controller::{LoadingState, RegistrationFormController, SubmitOutcome};

pub const PROFILE_ROUTE: &str = "/(tabs)/profile";
pub const LOGIN_ROUTE: &str = "/login";

const SUBMIT_LABEL: &str = "Create Account";
const SUBMIT_BUSY_LABEL: &str = "Creating account...";

/// A blocking modal the user dismisses explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn for_outcome(outcome: &SubmitOutcome) -> Option<Self> {
        match outcome {
            SubmitOutcome::Success(_) => {
                Some(Notice::new("Success", "Account created successfully!"))
            }
            SubmitOutcome::ValidationFailed(_) => {
                Some(Notice::new("Error", "Please fill in all required fields"))
            }
            SubmitOutcome::UnexpectedResponse => {
                Some(Notice::new("Error", "Unexpected server response"))
            }
            SubmitOutcome::ServerError(message) => {
                Some(Notice::new("Registration failed", message.as_str()))
            }
            SubmitOutcome::Abandoned => None,
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

pub trait Navigator: Send + Sync {
    /// Navigate without leaving a history entry behind.
    fn replace(&self, path: &str);
    fn push(&self, path: &str);
}

/// State of the submit button, readable while a submission is pending.
#[derive(Debug, Clone)]
pub struct SubmitControl {
    loading: LoadingState,
    lifetime: CancellationToken,
}

impl SubmitControl {
    pub fn enabled(&self) -> bool {
        !self.loading.is_loading() && !self.lifetime.is_cancelled()
    }

    pub fn label(&self) -> &'static str {
        if self.loading.is_loading() {
            SUBMIT_BUSY_LABEL
        } else {
            SUBMIT_LABEL
        }
    }
}

pub struct RegistrationScreen {
    controller: RegistrationFormController,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
}

impl RegistrationScreen {
    pub fn new(
        controller: RegistrationFormController,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            controller,
            notifier,
            navigator,
        }
    }

    pub fn controller(&self) -> &RegistrationFormController {
        &self.controller
    }

    pub fn on_input(&mut self, field: RegistrationField, value: impl Into<String>) {
        self.controller.update_field(field, value);
    }

    pub fn submit_control(&self) -> SubmitControl {
        SubmitControl {
            loading: self.controller.loading_state(),
            lifetime: self.controller.lifetime_token(),
        }
    }

    pub fn submit_enabled(&self) -> bool {
        self.submit_control().enabled()
    }

    pub fn submit_label(&self) -> &'static str {
        self.submit_control().label()
    }

    pub async fn on_submit(&mut self) -> SubmitOutcome {
        let outcome = self.controller.submit().await;
        self.present(&outcome);
        outcome
    }

    pub fn present(&self, outcome: &SubmitOutcome) {
        if self.controller.is_torn_down() {
            debug!("screen torn down; outcome not presented");
            return;
        }
        if let Some(notice) = Notice::for_outcome(outcome) {
            self.notifier.notify(notice);
        }
        if let SubmitOutcome::Success(_) = outcome {
            self.navigator.replace(PROFILE_ROUTE);
        }
    }

    pub fn go_to_login(&self) {
        self.navigator.push(LOGIN_ROUTE);
    }

    pub fn teardown(&self) {
        self.controller.teardown();
    }
}

#[cfg(test)]
#[path = "tests/presenter_tests.rs"]
mod tests;
