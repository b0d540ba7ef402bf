//! Redaction of contact details from journal text

use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("valid regex")
});

// North American numbers, optional +1 prefix
static PHONE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:\+?1[-.\s]?)?\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}\b").expect("valid regex")
});

/// Kind of personal detail that was removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Redaction {
    #[serde(rename = "Email Addresses")]
    EmailAddresses,
    #[serde(rename = "Phone Numbers")]
    PhoneNumbers,
}

impl Redaction {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::EmailAddresses => "Email Addresses",
            Self::PhoneNumbers => "Phone Numbers",
        }
    }
}

impl fmt::Display for Redaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Replace emails and phone numbers with placeholders
///
/// Returns the redacted text and each kind of redaction made, at most once,
/// emails first.
#[must_use]
pub fn anonymize(text: &str) -> (String, Vec<Redaction>) {
    let mut redactions = Vec::new();

    let without_emails = EMAIL_REGEX.replace_all(text, "[EMAIL REDACTED]");
    if matches!(without_emails, Cow::Owned(_)) {
        redactions.push(Redaction::EmailAddresses);
    }

    let without_phones = PHONE_REGEX.replace_all(&without_emails, "[PHONE REDACTED]");
    if matches!(without_phones, Cow::Owned(_)) {
        redactions.push(Redaction::PhoneNumbers);
    }

    let redacted = without_phones.into_owned();
    if !redactions.is_empty() {
        tracing::debug!(?redactions, "journal text anonymized");
    }
    (redacted, redactions)
}
