//! Outbound contact links
//!
//! Builds `wa.me` deep links carrying a pre-filled message. The business
//! number comes from `PUBLIC_WHATSAPP_NUMBER`, read once per process, with a
//! hardcoded fallback. Messages are percent-encoded the way browsers'
//! `encodeURIComponent` does it.

use std::sync::LazyLock;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use tracing::warn;

use crate::error::ConfigError;

/// Environment variable holding the business number.
pub const NUMBER_ENV: &str = "PUBLIC_WHATSAPP_NUMBER";

/// Number used when [`NUMBER_ENV`] is unset or empty.
pub const FALLBACK_NUMBER: &str = "5512983173077";

const LINK_BASE: &str = "https://wa.me";

/// Characters `encodeURIComponent` leaves alone besides ASCII alphanumerics.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

static DEFAULT_LINKS: LazyLock<ContactLinks> =
    LazyLock::new(|| ContactLinks::from_env_value(std::env::var(NUMBER_ENV).ok().as_deref()));

/// Canned messages of the site, keyed by where they are used.
pub const PRESETS: &[(&str, &str)] = &[
    ("contato", "Olá! Gostaria de mais informações sobre os serviços."),
    ("diagnostico", "Olá! Quero fazer um diagnóstico rápido do meu negócio."),
    (
        "landing-page.hero",
        "Olá! Quero pedir um diagnóstico rápido para minha landing page.",
    ),
    (
        "landing-page.pricing",
        "Olá! Tenho interesse em uma landing page para meu negócio.",
    ),
    ("gmn.hero", "Olá! Quero um diagnóstico do meu Google Meu Negócio."),
    ("gmn.cta", "Olá! Tenho interesse em otimizar meu Google Meu Negócio."),
    ("resgate.hero", "Olá! Preciso de ajuda para consertar/melhorar meu site."),
    ("resgate.plans.basico", "Olá! Quero o plano Básico de Resgate de Site."),
    ("resgate.plans.completo", "Olá! Quero o plano Completo de Resgate de Site."),
    ("resgate.plans.premium", "Olá! Quero o plano Premium de Resgate de Site."),
    (
        "portal.hero",
        "Olá! Quero transformar meu negócio com infraestrutura digital.",
    ),
    (
        "portal.landing-card",
        "Olá! Tenho interesse em Landing Pages de Alta Conversão.",
    ),
    ("portal.gmn-card", "Olá! Quero otimizar meu Google Meu Negócio."),
    ("portal.resgate-card", "Olá! Preciso resgatar/modernizar meu site."),
];

/// Canned message for `key`.
#[must_use]
pub fn preset(key: &str) -> Option<&'static str> {
    PRESETS.iter().find(|(k, _)| *k == key).map(|(_, m)| *m)
}

/// Link builder bound to one business number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactLinks {
    number: String,
}

impl ContactLinks {
    /// Binds the builder to `number`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] unless `number` is a non-empty
    /// string of ASCII digits.
    pub fn new(number: impl Into<String>) -> Result<Self, ConfigError> {
        let number = number.into();
        if number.is_empty() || !number.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ConfigError::InvalidValue {
                field: "contact.number".to_string(),
                value: number,
                expected: "digits only, country code first".to_string(),
            });
        }
        Ok(Self { number })
    }

    /// The process-wide builder, resolved from [`NUMBER_ENV`] on first use.
    #[must_use]
    pub fn global() -> &'static Self {
        &DEFAULT_LINKS
    }

    fn from_env_value(value: Option<&str>) -> Self {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            None => Self::fallback(),
            Some(v) => Self::new(v).unwrap_or_else(|e| {
                warn!(var = NUMBER_ENV, error = %e, "ignoring contact number");
                Self::fallback()
            }),
        }
    }

    fn fallback() -> Self {
        Self {
            number: FALLBACK_NUMBER.to_string(),
        }
    }

    /// The bound number.
    #[must_use]
    pub fn number(&self) -> &str {
        &self.number
    }

    /// Deep link opening a chat with `message` pre-filled.
    #[must_use]
    pub fn link(&self, message: &str) -> String {
        format!(
            "{LINK_BASE}/{}?text={}",
            self.number,
            utf8_percent_encode(message, URI_COMPONENT)
        )
    }
}

/// Deep link for `message` using the process-wide number.
#[must_use]
pub fn whatsapp_link(message: &str) -> String {
    ContactLinks::global().link(message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links() -> ContactLinks {
        ContactLinks::new("5511999990000").unwrap()
    }

    #[test]
    fn test_link_encodes_like_uri_component() {
        assert_eq!(
            links().link("Olá! Tudo bem?"),
            "https://wa.me/5511999990000?text=Ol%C3%A1!%20Tudo%20bem%3F"
        );
    }

    #[test]
    fn test_unreserved_marks_pass_through() {
        assert_eq!(
            links().link("a-b_c.d!e~f*g'h(i)j"),
            "https://wa.me/5511999990000?text=a-b_c.d!e~f*g'h(i)j"
        );
    }

    #[test]
    fn test_reserved_characters_escaped() {
        assert_eq!(
            links().link("a/b&c=d#e+f"),
            "https://wa.me/5511999990000?text=a%2Fb%26c%3Dd%23e%2Bf"
        );
    }

    #[test]
    fn test_empty_message() {
        assert_eq!(links().link(""), "https://wa.me/5511999990000?text=");
    }

    #[test]
    fn test_invalid_numbers_rejected() {
        assert!(ContactLinks::new("").is_err());
        assert!(ContactLinks::new("+55 12 9").is_err());
        assert!(ContactLinks::new("55abc").is_err());
    }

    #[test]
    fn test_env_value_resolution() {
        assert_eq!(ContactLinks::from_env_value(None).number(), FALLBACK_NUMBER);
        assert_eq!(ContactLinks::from_env_value(Some("")).number(), FALLBACK_NUMBER);
        assert_eq!(ContactLinks::from_env_value(Some("not-a-number")).number(), FALLBACK_NUMBER);
        assert_eq!(ContactLinks::from_env_value(Some(" 5521987654321 ")).number(), "5521987654321");
    }

    #[test]
    fn test_presets() {
        assert_eq!(
            preset("contato"),
            Some("Olá! Gostaria de mais informações sobre os serviços.")
        );
        assert!(preset("resgate.plans.premium").is_some());
        assert!(preset("missing").is_none());

        let mut keys: Vec<_> = PRESETS.iter().map(|(k, _)| *k).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), PRESETS.len());
    }

    #[test]
    fn test_global_link_shape() {
        let link = whatsapp_link("Oi");
        assert!(link.starts_with("https://wa.me/"));
        assert!(link.ends_with("?text=Oi"));
    }
}
