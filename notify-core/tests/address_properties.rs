// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Property tests for recipient normalization

use proptest::prelude::*;

use notify_core::{normalize_address, WHATSAPP_PREFIX};

/// Strategy for generating E.164 phone numbers.
fn phone_strategy() -> impl Strategy<Value = String> {
    "[0-9]{7,15}".prop_map(|n| format!("+{}", n))
}

/// Strategy for addresses that may or may not already carry the prefix.
fn address_strategy() -> impl Strategy<Value = String> {
    (phone_strategy(), any::<bool>()).prop_map(|(phone, prefixed)| {
        if prefixed {
            format!("{}{}", WHATSAPP_PREFIX, phone)
        } else {
            phone
        }
    })
}

proptest! {
    #[test]
    fn prop_normalization_is_idempotent(addr in address_strategy()) {
        let once = normalize_address(&addr);
        let twice = normalize_address(once.as_str());
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn prop_prefix_appears_exactly_once(phone in phone_strategy(), prefixed in any::<bool>()) {
        let input = if prefixed { format!("{}{}", WHATSAPP_PREFIX, phone) } else { phone.clone() };
        let normalized = normalize_address(&input);
        prop_assert!(normalized.as_str().starts_with(WHATSAPP_PREFIX));
        prop_assert_eq!(normalized.as_str().matches(WHATSAPP_PREFIX).count(), 1);
        prop_assert_eq!(normalized.raw(), phone.as_str());
    }

    #[test]
    fn prop_arbitrary_text_is_idempotent(raw in ".{0,40}") {
        let once = normalize_address(&raw);
        prop_assert_eq!(normalize_address(once.as_str()), once);
    }
}
