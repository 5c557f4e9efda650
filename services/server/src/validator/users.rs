use serde::Deserialize;

use versatile_domain::role::Role;
use versatile_domain::user::{Credentials, PasswordChange, User};

use crate::error::{ServerError, ValidationReason};

const FIELD_EMAIL: &str = "email";
const FIELD_PASSWORD: &str = "password";
const FIELD_ROLE: &str = "role";

/// User as submitted by a client. `role` stays a string until validated so
/// an unknown role is reported as a validation failure, not a decoding one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInput {
    #[serde(rename = "_key", default)]
    pub key: Option<String>,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// Input and output shaping, chosen by the caller's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsersValidator {
    Admin,
    Member,
}

impl UsersValidator {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => Self::Admin,
            Role::Developer | Role::User | Role::Unset => Self::Member,
        }
    }

    pub fn create(&self, inputs: Vec<UserInput>) -> Result<Vec<User>, ServerError> {
        inputs
            .into_iter()
            .map(|input| self.create_one(input))
            .collect()
    }

    pub fn create_one(&self, input: UserInput) -> Result<User, ServerError> {
        require(&input.email, FIELD_EMAIL)?;
        require(&input.password, FIELD_PASSWORD)?;
        let raw_role = input.role.as_deref().unwrap_or_default();
        require(raw_role, FIELD_ROLE)?;
        let role = parse_role(raw_role)?;

        let key = match self {
            Self::Admin => input.key.unwrap_or_default(),
            Self::Member => String::new(),
        };
        Ok(User {
            key,
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            password: input.password,
            role,
            ..Default::default()
        })
    }

    pub fn signin(&self, credentials: Credentials) -> Result<Credentials, ServerError> {
        require(&credentials.email, FIELD_EMAIL)?;
        require(&credentials.password, FIELD_PASSWORD)?;
        Ok(credentials)
    }

    /// Partial record for an update. Key, password and owner token never pass;
    /// members cannot change roles either.
    pub fn update(&self, input: UserInput) -> Result<User, ServerError> {
        let role = match input.role.as_deref() {
            Some(raw) => parse_role(raw)?,
            None => Role::Unset,
        };
        let role = match self {
            Self::Admin => role,
            Self::Member => Role::Unset,
        };
        Ok(User {
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            role,
            ..Default::default()
        })
    }

    pub fn update_password(&self, change: PasswordChange) -> Result<PasswordChange, ServerError> {
        require(&change.password, FIELD_PASSWORD)?;
        Ok(change)
    }

    pub fn output(&self, user: User) -> User {
        user.redacted()
    }
}

fn require(value: &str, field: &'static str) -> Result<(), ServerError> {
    if value.is_empty() {
        return Err(ServerError::Validation {
            field,
            reason: ValidationReason::Blank,
        });
    }
    Ok(())
}

fn parse_role(raw: &str) -> Result<Role, ServerError> {
    raw.parse::<Role>().map_err(|_| ServerError::Validation {
        field: FIELD_ROLE,
        reason: ValidationReason::Invalid,
    })
}
