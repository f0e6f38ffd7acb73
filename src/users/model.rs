//! User records and the two field checks applied on create and update.

use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub type UserId = i32;

/// A stored user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

impl User {
    pub fn new(id: UserId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self { id, name: name.into(), email: email.into() }
    }

    /// Replaces name and email; the id never changes.
    pub(crate) fn apply(&mut self, fields: UserFields) {
        self.name = fields.name;
        self.email = fields.email;
    }
}

/// A user as sent by a client. Any `id` in it is ignored.
///
/// Property names match regardless of ASCII case, so `{"Name": …}` binds
/// like `{"name": …}`. Missing and `null` properties are `None`, unknown
/// ones are skipped. The body itself must be a JSON object.
#[derive(Debug, Clone, Default)]
pub struct UserPayload {
    pub id: Option<UserId>,
    pub name: Option<String>,
    pub email: Option<String>,
}

impl<'de> Deserialize<'de> for UserPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let object = Map::<String, Value>::deserialize(deserializer)?;

        let mut payload = Self::default();
        for (key, value) in object {
            if key.eq_ignore_ascii_case("id") {
                payload.id = property(value)?;
            } else if key.eq_ignore_ascii_case("name") {
                payload.name = property(value)?;
            } else if key.eq_ignore_ascii_case("email") {
                payload.email = property(value)?;
            }
        }
        Ok(payload)
    }
}

fn property<T: DeserializeOwned, E: de::Error>(value: Value) -> Result<T, E> {
    serde_json::from_value(value).map_err(E::custom)
}

/// Name and email that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFields {
    pub name: String,
    pub email: String,
}

/// Why a payload was rejected. `Display` is the exact client-facing message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Name is required.")]
    NameRequired,
    #[error("Valid email is required.")]
    InvalidEmail,
}

impl UserPayload {
    /// Name must not be blank; email must not be blank and must contain `@`.
    /// Name is checked first.
    pub fn validate(&self) -> Result<UserFields, ValidationError> {
        let name = match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => return Err(ValidationError::NameRequired),
        };
        let email = match self.email.as_deref() {
            Some(email) if !email.trim().is_empty() && email.contains('@') => email,
            _ => return Err(ValidationError::InvalidEmail),
        };
        Ok(UserFields { name: name.to_owned(), email: email.to_owned() })
    }
}
