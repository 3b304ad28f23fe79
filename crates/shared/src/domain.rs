use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RegistrationField {
    FirstName,
    LastName,
    Email,
    Password,
    Phone,
    Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown registration field: {0}")]
pub struct UnknownFieldError(pub String);

impl RegistrationField {
    /// Form order.
    pub const ALL: [RegistrationField; 6] = [
        RegistrationField::FirstName,
        RegistrationField::LastName,
        RegistrationField::Email,
        RegistrationField::Password,
        RegistrationField::Phone,
        RegistrationField::Address,
    ];

    pub fn is_required(self) -> bool {
        matches!(
            self,
            RegistrationField::FirstName
                | RegistrationField::LastName
                | RegistrationField::Email
                | RegistrationField::Password
        )
    }

    pub fn wire_name(self) -> &'static str {
        match self {
            RegistrationField::FirstName => "firstName",
            RegistrationField::LastName => "lastName",
            RegistrationField::Email => "email",
            RegistrationField::Password => "password",
            RegistrationField::Phone => "phone",
            RegistrationField::Address => "address",
        }
    }

    pub fn placeholder(self) -> &'static str {
        match self {
            RegistrationField::FirstName => "First name",
            RegistrationField::LastName => "Last name",
            RegistrationField::Email => "Email address",
            RegistrationField::Password => "Password",
            RegistrationField::Phone => "Phone number",
            RegistrationField::Address => "Address",
        }
    }

    pub fn is_secret(self) -> bool {
        self == RegistrationField::Password
    }
}

impl fmt::Display for RegistrationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for RegistrationField {
    type Err = UnknownFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "firstName" | "first_name" => Ok(RegistrationField::FirstName),
            "lastName" | "last_name" => Ok(RegistrationField::LastName),
            "email" => Ok(RegistrationField::Email),
            "password" => Ok(RegistrationField::Password),
            "phone" => Ok(RegistrationField::Phone),
            "address" => Ok(RegistrationField::Address),
            other => Err(UnknownFieldError(other.to_string())),
        }
    }
}

/// Draft of the registration form. The field set is fixed; values are only
/// ever overwritten.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormState {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub address: String,
}

impl FormState {
    pub fn get(&self, field: RegistrationField) -> &str {
        match field {
            RegistrationField::FirstName => &self.first_name,
            RegistrationField::LastName => &self.last_name,
            RegistrationField::Email => &self.email,
            RegistrationField::Password => &self.password,
            RegistrationField::Phone => &self.phone,
            RegistrationField::Address => &self.address,
        }
    }

    pub fn set(&mut self, field: RegistrationField, value: impl Into<String>) {
        let slot = match field {
            RegistrationField::FirstName => &mut self.first_name,
            RegistrationField::LastName => &mut self.last_name,
            RegistrationField::Email => &mut self.email,
            RegistrationField::Password => &mut self.password,
            RegistrationField::Phone => &mut self.phone,
            RegistrationField::Address => &mut self.address,
        };
        *slot = value.into();
    }

    /// Required fields holding the empty string. Whitespace counts as a value.
    pub fn missing_required(&self) -> Vec<RegistrationField> {
        RegistrationField::ALL
            .into_iter()
            .filter(|field| field.is_required() && self.get(*field).is_empty())
            .collect()
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl fmt::Debug for FormState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormState")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .field("password", &redacted(&self.password))
            .field("phone", &self.phone)
            .field("address", &self.address)
            .finish()
    }
}

pub(crate) fn redacted(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<empty>"
    } else {
        "<redacted>"
    }
}
