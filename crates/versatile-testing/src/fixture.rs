use versatile_domain::role::Role;
use versatile_domain::user::User;

/// Stored user as the database would return it.
pub fn stored_user(key: &str, email: &str, role: Role) -> User {
    User {
        id: format!("users/{key}"),
        rev: "_rev1".into(),
        key: key.into(),
        email: email.into(),
        owner_token: format!("owner-{key}"),
        role,
        ..Default::default()
    }
}
