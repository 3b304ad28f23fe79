use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{redacted, FormState};

/// Body of the create-account request: the form plus the derived `fullName`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub address: String,
    pub full_name: String,
}

impl From<&FormState> for RegisterRequest {
    fn from(form: &FormState) -> Self {
        Self {
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            email: form.email.clone(),
            password: form.password.clone(),
            phone: form.phone.clone(),
            address: form.address.clone(),
            full_name: form.full_name(),
        }
    }
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &redacted(&self.password))
            .field("phone", &self.phone)
            .field("address", &self.address)
            .field("full_name", &self.full_name)
            .finish()
    }
}

/// Typed view of the session body the auth endpoints return. Nothing in the
/// registration flow requires this shape; it is derived on demand.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthSession {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl AuthSession {
    /// Returns `None` unless the payload is an object that carries a token.
    pub fn from_payload(payload: &Value) -> Option<Self> {
        if !payload.is_object() {
            return None;
        }
        let session: AuthSession = serde_json::from_value(payload.clone()).ok()?;
        session.token.as_ref()?;
        Some(session)
    }

    pub fn bearer(&self) -> Option<String> {
        let token = self.token.as_deref()?;
        let kind = self.token_type.as_deref().unwrap_or("Bearer");
        Some(format!("{kind} {token}"))
    }
}

/// JavaScript-style truthiness of a response body.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
