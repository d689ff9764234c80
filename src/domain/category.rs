//! PII categories and detection sources.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// PII category assigned to a word.
///
/// `None` is a real value of the enumeration rather than an absent one: it is
/// what the tagged transcript stores for every word that must stay visible.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Name,
    Email,
    Phone,
    Address,
    Ip,
    IdNumber,
    Credential,
    Other,
    #[default]
    None,
}

const NAME_ALIASES: &[&str] = &[
    "name",
    "person",
    "personal_name",
    "full_name",
    "human_name",
    "first_name",
    "last_name",
    "surname",
    "given_name",
];

const ID_ALIASES: &[&str] = &[
    "id_number",
    "ssn",
    "tax_id",
    "routing_number",
    "bank_account",
    "account_number",
    "client_id",
    "passport",
    "credit_card",
];

const CREDENTIAL_ALIASES: &[&str] = &[
    "credential",
    "password",
    "secret",
    "api_key",
    "access_key",
];

impl Category {
    /// Every category that triggers redaction.
    pub const PII: [Category; 8] = [
        Category::Name,
        Category::Email,
        Category::Phone,
        Category::Address,
        Category::Ip,
        Category::IdNumber,
        Category::Credential,
        Category::Other,
    ];

    pub fn is_none(self) -> bool {
        self == Category::None
    }

    pub fn is_pii(self) -> bool {
        !self.is_none()
    }

    /// Categories only the contextual pass can find.
    pub fn is_context_dependent(self) -> bool {
        matches!(self, Category::Name | Category::Address)
    }

    /// Snake-case identifier used in artifacts and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Name => "name",
            Category::Email => "email",
            Category::Phone => "phone",
            Category::Address => "address",
            Category::Ip => "ip",
            Category::IdNumber => "id_number",
            Category::Credential => "credential",
            Category::Other => "other",
            Category::None => "none",
        }
    }

    /// Short label burned onto a redaction box.
    pub fn label(self) -> &'static str {
        match self {
            Category::Name => "NAME",
            Category::Email => "EMAIL",
            Category::Phone => "PHONE",
            Category::Address => "ADDRESS",
            Category::Ip => "IP",
            Category::IdNumber => "ID",
            Category::Credential => "SECRET",
            Category::Other => "OTHER",
            Category::None => "",
        }
    }

    /// Maps a free-form label from the inference service onto a category.
    ///
    /// Known aliases collapse onto their category, `none`/empty means no PII,
    /// and anything else unrecognised becomes [`Category::Other`].
    pub fn normalize(raw: &str) -> Category {
        let key = raw.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match key.as_str() {
            "" | "none" | "null" => Category::None,
            "email" | "email_address" => Category::Email,
            "phone" | "phone_number" | "telephone" | "mobile" => Category::Phone,
            "address" | "postal_address" | "street_address" => Category::Address,
            "ip" | "ip_address" => Category::Ip,
            k if NAME_ALIASES.contains(&k) => Category::Name,
            k if ID_ALIASES.contains(&k) => Category::IdNumber,
            k if CREDENTIAL_ALIASES.contains(&k) => Category::Credential,
            _ => Category::Other,
        }
    }

    /// Parses a comma-separated selection such as `email,phone` or `all`.
    ///
    /// Returns the recognised categories in input order (deduplicated) and
    /// the names that were not recognised.
    pub fn parse_selection(selection: &str) -> (Vec<Category>, Vec<String>) {
        if selection.trim().eq_ignore_ascii_case("all") {
            return (Self::PII.to_vec(), Vec::new());
        }

        let mut chosen = Vec::new();
        let mut unknown = Vec::new();
        for part in selection.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.parse::<Category>() {
                Ok(c) if c.is_pii() => {
                    if !chosen.contains(&c) {
                        chosen.push(c);
                    }
                }
                _ => unknown.push(part.to_string()),
            }
        }
        (chosen, unknown)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_ascii_lowercase();
        Self::PII
            .iter()
            .copied()
            .chain(std::iter::once(Category::None))
            .find(|c| c.as_str() == key)
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// Detection source that assigned a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Deterministic pattern rules.
    Rule,
    /// External contextual-inference service.
    Inference,
}

impl Source {
    /// Lower value wins arbitration.
    pub fn priority(self) -> u8 {
        match self {
            Source::Rule => 0,
            Source::Inference => 1,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Rule => f.write_str("rule"),
            Source::Inference => f.write_str("inference"),
        }
    }
}
