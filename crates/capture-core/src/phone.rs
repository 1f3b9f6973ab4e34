//! Phone number normalization shared by every component that compares numbers.
//!
//! Numbers arrive with and without the national prefix (`+91 98765 43210`,
//! `919876543210`, `98765-43210`). Comparisons go through [`PhoneNormalizer`]
//! so that all of these collapse to the same key.

/// Country calling code used when none is configured
pub const DEFAULT_COUNTRY_CODE: &str = "91";

/// Length of a national subscriber number
const NATIONAL_NUMBER_LEN: usize = 10;

/// Strips separators and a country prefix from phone numbers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNormalizer {
    country_code: String,
}

impl Default for PhoneNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTRY_CODE)
    }
}

impl PhoneNormalizer {
    pub fn new(country_code: impl Into<String>) -> Self {
        let country_code: String = country_code.into();
        Self {
            country_code: country_code.trim_start_matches('+').to_string(),
        }
    }

    pub fn country_code(&self) -> &str {
        &self.country_code
    }

    /// Normalize a number for comparison.
    ///
    /// A bare country code is only stripped when the remainder would still be
    /// longer than a national number, so `9123456789` is left alone.
    pub fn normalize(&self, phone: &str) -> String {
        let compact: String = phone
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-')
            .collect();

        if self.country_code.is_empty() {
            return compact;
        }

        if let Some(rest) = compact
            .strip_prefix('+')
            .and_then(|s| s.strip_prefix(self.country_code.as_str()))
        {
            return rest.to_string();
        }

        if compact.len() > NATIONAL_NUMBER_LEN {
            if let Some(rest) = compact.strip_prefix(self.country_code.as_str()) {
                return rest.to_string();
            }
        }

        compact
    }

    /// Whether two numbers refer to the same subscriber
    pub fn same_number(&self, a: &str, b: &str) -> bool {
        self.normalize(a) == self.normalize(b)
    }
}

/// Normalize with the default country code
pub fn normalize_phone(phone: &str) -> String {
    PhoneNormalizer::default().normalize(phone)
}
