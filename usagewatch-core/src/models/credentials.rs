//! Provider login credentials.

use std::fmt;

/// A login and secret for one provider account.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    login: String,
    secret: String,
}

impl Credentials {
    /// Creates credentials from a login (username or mobile number) and secret.
    pub fn new(login: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            secret: secret.into(),
        }
    }

    /// Returns the login.
    pub fn login(&self) -> &str {
        &self.login
    }

    /// Returns the secret.
    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("secret", &"<redacted>")
            .finish()
    }
}
