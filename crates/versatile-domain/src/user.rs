//! User record and the transient inputs that reference it.

use serde::{Deserialize, Serialize};

use crate::role::Role;

/// A user document.
///
/// Empty fields are omitted when serialized, so the same type doubles as a
/// partial record for updates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(rename = "_rev", default, skip_serializing_if = "String::is_empty")]
    pub rev: String,
    #[serde(rename = "_key", default, skip_serializing_if = "String::is_empty")]
    pub key: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub first_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub owner_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub created_by: String,
    #[serde(default, skip_serializing_if = "Role::is_unset")]
    pub role: Role,
}

impl User {
    /// Copy safe to hand to clients: the password hash is removed.
    pub fn redacted(mut self) -> Self {
        self.password.clear();
        self
    }
}

/// Email and plaintext password presented at signin. Never persisted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Body of a password change request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PasswordChange {
    #[serde(default)]
    pub password: String,
}

/// Identity snapshot embedded in a session payload and echoed back by the
/// auth gateway in the `Auth-Server-Payload` header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthServerPayload {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub role: Role,
}
