use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use shared::{
    error::ApiErrorBody,
    protocol::{AuthSession, RegisterRequest},
};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub mod config;
mod controller;
pub mod error;
mod presenter;

pub use config::ClientSettings;
pub use controller::{
    LoadingGuard, LoadingState, RegistrationFormController, SubmitOutcome,
    DEFAULT_FAILURE_MESSAGE,
};
pub use error::RegistrationError;
pub use presenter::{
    Navigator, Notice, Notifier, RegistrationScreen, SubmitControl, LOGIN_ROUTE, PROFILE_ROUTE,
};

/// Settled body of a create-account request that returned 2xx.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterResponse {
    pub status: u16,
    pub body: Value,
}

#[async_trait]
pub trait RegistrationApi: Send + Sync {
    async fn register(&self, request: &RegisterRequest)
        -> Result<RegisterResponse, RegistrationError>;
}

/// Process-wide authentication state. The payload is opaque to callers.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn login(&self, payload: Value);
}

#[derive(Default)]
pub struct MemorySessionStore {
    current: RwLock<Option<Value>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn current(&self) -> Option<Value> {
        self.current.read().await.clone()
    }

    pub async fn auth_session(&self) -> Option<AuthSession> {
        self.current
            .read()
            .await
            .as_ref()
            .and_then(AuthSession::from_payload)
    }

    pub async fn is_authenticated(&self) -> bool {
        self.current.read().await.is_some()
    }

    pub async fn logout(&self) {
        *self.current.write().await = None;
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn login(&self, payload: Value) {
        *self.current.write().await = Some(payload);
    }
}

pub struct HttpRegistrationApi {
    http: Client,
    endpoint: String,
}

impl HttpRegistrationApi {
    pub fn new(settings: &ClientSettings) -> Result<Self, RegistrationError> {
        let endpoint = settings.register_endpoint();
        settings
            .validate()
            .map_err(|err| RegistrationError::InvalidSettings {
                endpoint: endpoint.clone(),
                reason: format!("{err:#}"),
            })?;
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;
        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl RegistrationApi for HttpRegistrationApi {
    async fn register(
        &self,
        request: &RegisterRequest,
    ) -> Result<RegisterResponse, RegistrationError> {
        debug!(endpoint = %self.endpoint, "sending registration request");
        let response = self.http.post(&self.endpoint).json(request).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let body = parse_body(&bytes).and_then(ApiErrorBody::from_value);
            warn!(
                status = status.as_u16(),
                has_message = body.as_ref().and_then(ApiErrorBody::message).is_some(),
                "registration rejected by server"
            );
            return Err(RegistrationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        info!(status = status.as_u16(), "registration request settled");
        Ok(RegisterResponse {
            status: status.as_u16(),
            body: parse_body(&bytes).unwrap_or(Value::Null),
        })
    }
}

/// Empty bodies yield `None`; bodies that are not JSON are kept as text.
fn parse_body(bytes: &[u8]) -> Option<Value> {
    if bytes.is_empty() {
        return None;
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(String::from_utf8_lossy(bytes).into_owned())),
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
