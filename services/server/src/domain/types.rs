use std::time::Duration;

pub const USERS_COLLECTION: &str = "users";
pub const OWNER_TOKEN_LEN: usize = 32;

/// Identity on whose behalf an operation runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    /// `_id` of the current user.
    pub id: String,
    /// Raw `Auth-Server-Payload` value forwarded to the auth service.
    pub auth_payload: String,
}

impl Caller {
    pub fn new(id: impl Into<String>, auth_payload: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            auth_payload: auth_payload.into(),
        }
    }

    pub fn anonymous() -> Self {
        Self::default()
    }
}

/// bcrypt cost factors.
#[derive(Debug, Clone, Copy)]
pub struct HashingPolicy {
    /// Placeholder hash stored for seed-path users until the rehash lands.
    pub seed_cost: u32,
    /// Synchronous hashing inside a create request.
    pub interactive_cost: u32,
    /// Password changes and the background rehash.
    pub full_cost: u32,
}

impl Default for HashingPolicy {
    fn default() -> Self {
        Self {
            seed_cost: 4,
            interactive_cost: 9,
            full_cost: 11,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RehashSettings {
    pub batch_size: usize,
    pub item_delay: Duration,
    pub cost: u32,
}

impl Default for RehashSettings {
    fn default() -> Self {
        Self {
            batch_size: 10,
            item_delay: Duration::from_millis(100),
            cost: HashingPolicy::default().full_cost,
        }
    }
}
