//! Admin credentials
//!
//! A single admin account configured from the environment. The password is
//! only ever held as an argon2 PHC hash.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use uuid::Uuid;

pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

#[derive(Clone)]
pub struct AdminCredentials {
    pub username: String,
    /// `None` disables login
    password_hash: Option<String>,
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("username", &self.username)
            .field("has_password", &self.password_hash.is_some())
            .finish()
    }
}

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::encode_b64(Uuid::new_v4().as_bytes())?;
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

impl AdminCredentials {
    pub fn new(username: impl Into<String>, password_hash: Option<String>) -> Self {
        Self {
            username: username.into(),
            password_hash,
        }
    }

    /// Credentials from a plain password, hashed now
    pub fn with_password(
        username: impl Into<String>,
        password: &str,
    ) -> Result<Self, argon2::password_hash::Error> {
        Ok(Self::new(username, Some(hash_password(password)?)))
    }

    /// `ADMIN_USERNAME` plus `ADMIN_PASSWORD_HASH`, else `ADMIN_PASSWORD`
    pub fn from_env() -> Self {
        let username = std::env::var("ADMIN_USERNAME")
            .ok()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ADMIN_USERNAME.to_string());

        if let Ok(hash) = std::env::var("ADMIN_PASSWORD_HASH") {
            if PasswordHash::new(&hash).is_ok() {
                return Self::new(username, Some(hash));
            }
            tracing::error!("ADMIN_PASSWORD_HASH is not a valid PHC string");
        }

        match std::env::var("ADMIN_PASSWORD") {
            Ok(password) if !password.is_empty() => match Self::with_password(&username, &password) {
                Ok(admin) => admin,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to hash ADMIN_PASSWORD, admin login disabled");
                    Self::new(username, None)
                }
            },
            _ => {
                tracing::warn!("No admin password configured, admin login disabled");
                Self::new(username, None)
            }
        }
    }

    pub fn login_enabled(&self) -> bool {
        self.password_hash.is_some()
    }

    /// Check a login attempt; unknown user, wrong password and disabled
    /// login all return `false`
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let Some(stored) = self.password_hash.as_deref() else {
            return false;
        };
        let parsed = match PasswordHash::new(stored) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::error!(error = %e, "Stored admin hash is invalid");
                return false;
            }
        };
        let password_ok = Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok();
        password_ok && username == self.username
    }
}
