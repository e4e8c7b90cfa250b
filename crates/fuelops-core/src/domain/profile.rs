//! Driver profile
//!
//! The identity of the signed-in driver. Every task query, realtime
//! subscription and notification lookup is scoped by this pair.

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// The authenticated driver's name and phone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverProfile {
    name: String,
    phone: String,
}

impl DriverProfile {
    /// Creates a profile, trimming both fields
    ///
    /// The name is required; the phone may be empty for drivers registered
    /// without one.
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into().trim().to_string();
        let phone = phone.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::ValidationFailed(
                "driver name must not be empty".into(),
            ));
        }
        Ok(Self { name, phone })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    /// Returns true if the row's driver fields belong to this driver
    ///
    /// The name comparison is trimmed and case-insensitive. The phone must
    /// match exactly after trimming. Either one matching is enough.
    pub fn matches(&self, driver_name: Option<&str>, driver_phone: Option<&str>) -> bool {
        let name_match = driver_name.map(|n| self.is_named(n)).unwrap_or(false);
        let phone_match = !self.phone.is_empty()
            && driver_phone
                .map(|p| p.trim() == self.phone)
                .unwrap_or(false);
        name_match || phone_match
    }

    /// Returns true if `name` refers to this driver
    pub fn is_named(&self, name: &str) -> bool {
        name.trim().to_lowercase() == self.name.to_lowercase()
    }

    /// Stable key used to scope locally persisted data
    pub fn storage_key(&self) -> String {
        format!("{}|{}", self.name.to_lowercase(), self.phone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn irfan() -> DriverProfile {
        DriverProfile::new("Irfan", "566041714").unwrap()
    }

    #[test]
    fn test_new_trims_and_requires_name() {
        let p = DriverProfile::new("  Irfan ", " 566041714 ").unwrap();
        assert_eq!(p.name(), "Irfan");
        assert_eq!(p.phone(), "566041714");
        assert!(DriverProfile::new("  ", "1").is_err());
    }

    #[test]
    fn test_matches_by_name_case_insensitive() {
        let p = irfan();
        assert!(p.matches(Some(" irfan "), None));
        assert!(p.matches(Some("IRFAN"), Some("000")));
    }

    #[test]
    fn test_matches_by_phone() {
        let p = irfan();
        assert!(p.matches(Some("Someone Else"), Some("566041714")));
        assert!(p.matches(None, Some(" 566041714")));
    }

    #[test]
    fn test_rejects_other_driver() {
        let p = irfan();
        assert!(!p.matches(Some("Bilal"), Some("500000000")));
        assert!(!p.matches(None, None));
    }

    #[test]
    fn test_empty_phone_never_matches_empty_row_phone() {
        let p = DriverProfile::new("Irfan", "").unwrap();
        assert!(!p.matches(Some("Bilal"), Some("")));
    }
}
