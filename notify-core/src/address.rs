// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Recipient Address Normalization
//!
//! The messaging provider routes a phone number through the WhatsApp
//! channel only when the address carries a literal `whatsapp:` prefix.
//! Normalization adds that prefix exactly once.

use std::fmt;

/// Channel prefix expected by the provider for WhatsApp delivery.
pub const WHATSAPP_PREFIX: &str = "whatsapp:";

/// An address rewritten into the provider's channel-prefixed form.
///
/// Only obtainable through [`normalize_address`], so the value always
/// starts with [`WHATSAPP_PREFIX`] exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NormalizedAddress(String);

impl NormalizedAddress {
    /// Returns the full channel-prefixed address.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the address without the channel prefix.
    pub fn raw(&self) -> &str {
        &self.0[WHATSAPP_PREFIX.len()..]
    }
}

impl fmt::Display for NormalizedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalizes `raw` into channel-prefixed form.
///
/// The prefix check is a literal, case-sensitive match: `"WhatsApp:+1"`
/// does not count as prefixed and gains a second prefix. Applying the
/// function to its own output returns the same address.
pub fn normalize_address(raw: &str) -> NormalizedAddress {
    if raw.starts_with(WHATSAPP_PREFIX) {
        NormalizedAddress(raw.to_string())
    } else {
        NormalizedAddress(format!("{}{}", WHATSAPP_PREFIX, raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_added_to_plain_number() {
        let addr = normalize_address("+15551234567");
        assert_eq!(addr.as_str(), "whatsapp:+15551234567");
        assert_eq!(addr.raw(), "+15551234567");
    }

    #[test]
    fn test_prefixed_number_unchanged() {
        let addr = normalize_address("whatsapp:+15551234567");
        assert_eq!(addr.as_str(), "whatsapp:+15551234567");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let once = normalize_address("+447700900123");
        let twice = normalize_address(once.as_str());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_prefix_match_is_case_sensitive() {
        let addr = normalize_address("WhatsApp:+15551234567");
        assert_eq!(addr.as_str(), "whatsapp:WhatsApp:+15551234567");
    }

    #[test]
    fn test_display_matches_as_str() {
        let addr = normalize_address("+15550000000");
        assert_eq!(addr.to_string(), addr.as_str());
    }
}
