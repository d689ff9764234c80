//! IP address detection.

use super::{Category, PatternMatcher};
use once_cell::sync::Lazy;
use regex::Regex;
use std::net::IpAddr;

/// Matches dotted IPv4 and full-form IPv6 addresses.
///
/// The regex finds candidates; [`IpAddr`] parsing rejects out-of-range
/// octets such as `999.1.1.1`.
#[derive(Debug, Clone, Default)]
pub struct IpAddressMatcher;

impl IpAddressMatcher {
    pub fn new() -> Self {
        Self
    }
}

impl PatternMatcher for IpAddressMatcher {
    fn category(&self) -> Category {
        Category::Ip
    }

    fn pattern(&self) -> &Regex {
        static PATTERN: Lazy<Regex> = Lazy::new(|| {
            Regex::new(
                r"\b(?:(?:\d{1,3}\.){3}\d{1,3}|(?:[0-9A-Fa-f]{1,4}:){7}[0-9A-Fa-f]{1,4})\b",
            )
            .expect("Valid IP address regex")
        });
        &PATTERN
    }

    fn validate(&self, candidate: &str) -> bool {
        candidate.parse::<IpAddr>().is_ok()
    }
}
