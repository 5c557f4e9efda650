use anyhow::Context as _;
use rand::RngExt;

use crate::error::ServerError;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// bcrypt runs on the blocking pool so request workers stay responsive.
pub async fn hash_password(plain: String, cost: u32) -> Result<String, ServerError> {
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(plain, cost))
        .await
        .context("join hashing task")?
        .context("hash password")?;
    Ok(hashed)
}

/// `false` for a mismatch and for hashes that cannot be parsed.
pub async fn verify_password(plain: String, hash: String) -> bool {
    match tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hash)).await {
        Ok(Ok(matches)) => matches,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "stored password hash is unreadable");
            false
        }
        Err(e) => {
            tracing::warn!(error = %e, "password verification task failed");
            false
        }
    }
}

/// Random alphanumeric token.
pub fn generate_token(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
        .collect()
}
