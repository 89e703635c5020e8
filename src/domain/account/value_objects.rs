use serde::{Deserialize, Serialize};
use std::fmt;

/// Email value object used as the login identity of an account
///
/// # Invariants
/// - Must contain '@' character
/// - Must be at least 3 characters long
/// - Stored lowercase and trimmed so lookups are case-insensitive
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Creates a new Email value object
    ///
    /// # Example
    /// ```
    /// use transfer_market_api::domain::account::value_objects::Email;
    ///
    /// let email = Email::new(" Coach@Example.com ").expect("valid email");
    /// assert_eq!(email.as_str(), "coach@example.com");
    /// ```
    pub fn new(email: impl Into<String>) -> Result<Self, String> {
        let email = email.into().trim().to_lowercase();
        if Self::is_valid(&email) {
            Ok(Email(email))
        } else {
            Err(format!("Invalid email: {}", email))
        }
    }

    fn is_valid(email: &str) -> bool {
        email.contains('@') && email.len() >= 3 && email.len() <= 60
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
