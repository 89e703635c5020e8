use serde::{Deserialize, Serialize};
use std::fmt;

/// ISO-3166 alpha-2 country code
///
/// # Invariants
/// - Exactly two ASCII letters
/// - Stored uppercase
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Country(String);

impl Country {
    /// Creates a new Country value object
    ///
    /// # Example
    /// ```
    /// use transfer_market_api::domain::team::value_objects::Country;
    ///
    /// let country = Country::new("br").expect("valid code");
    /// assert_eq!(country.as_str(), "BR");
    /// assert!(Country::new("Z").is_err());
    /// ```
    pub fn new(code: impl Into<String>) -> Result<Self, String> {
        let code = code.into();
        if code.len() == 2 && code.chars().all(|c| c.is_ascii_alphabetic()) {
            Ok(Country(code.to_ascii_uppercase()))
        } else {
            Err(format!("Invalid country code: {}", code))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Country {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Country::new(value)
    }
}

impl From<Country> for String {
    fn from(country: Country) -> Self {
        country.0
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_country_is_uppercased() {
        assert_eq!(Country::new("pt").unwrap().as_str(), "PT");
    }

    #[test]
    fn single_letter_rejected() {
        assert!(Country::new("Z").is_err());
    }

    #[test]
    fn digits_rejected() {
        assert!(Country::new("1A").is_err());
    }

    #[test]
    fn three_letters_rejected() {
        assert!(Country::new("BRA").is_err());
    }

    #[test]
    fn deserialize_validates() {
        let ok: Result<Country, _> = serde_json::from_str("\"de\"");
        assert_eq!(ok.unwrap().as_str(), "DE");

        let bad: Result<Country, _> = serde_json::from_str("\"Germany\"");
        assert!(bad.is_err());
    }
}
