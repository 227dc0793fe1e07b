//! Locale registry: the set of locales a content deployment is localized into.
//!
//! Built from the `localization` section of the content config. Locales may be
//! declared as bare codes (`"en"`) or as objects (`{"code": "cs", "label": "Czech"}`).
//! Labels are what the oracle prompt uses to name a language.

use serde::{Deserialize, Serialize};

/// A locale as declared in the content config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocaleEntry {
    Code(String),
    Detailed {
        code: String,
        #[serde(default)]
        label: Option<String>,
    },
}

impl LocaleEntry {
    pub fn code(&self) -> &str {
        match self {
            LocaleEntry::Code(code) => code,
            LocaleEntry::Detailed { code, .. } => code,
        }
    }
}

/// The `localization` section of the content config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalizationConfig {
    pub locales: Vec<LocaleEntry>,
    #[serde(default)]
    pub default_locale: Option<String>,
}

/// A resolved, supported locale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocaleConfig {
    /// Locale code as stored by the content framework (e.g. "en", "cz")
    pub code: String,

    /// Human-readable language name used in prompts (e.g. "English")
    pub label: String,
}

/// Registry of the locales a deployment supports.
#[derive(Debug, Clone)]
pub struct LocaleRegistry {
    locales: Vec<LocaleConfig>,
    default_locale: Option<String>,
}

/// English names for common locale codes, used when the config gives no label.
const KNOWN_LANGUAGES: &[(&str, &str)] = &[
    ("ar", "Arabic"),
    ("cs", "Czech"),
    ("cz", "Czech"),
    ("da", "Danish"),
    ("de", "German"),
    ("el", "Greek"),
    ("en", "English"),
    ("es", "Spanish"),
    ("fi", "Finnish"),
    ("fr", "French"),
    ("he", "Hebrew"),
    ("hu", "Hungarian"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("nl", "Dutch"),
    ("no", "Norwegian"),
    ("pl", "Polish"),
    ("pt", "Portuguese"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("sk", "Slovak"),
    ("sv", "Swedish"),
    ("tr", "Turkish"),
    ("uk", "Ukrainian"),
    ("zh", "Chinese"),
];

/// Look up the English name of a locale code (`"pt-BR"` resolves via `"pt"`).
pub fn known_language_name(code: &str) -> Option<&'static str> {
    let primary = code
        .split(['-', '_'])
        .next()
        .unwrap_or(code)
        .to_ascii_lowercase();
    KNOWN_LANGUAGES
        .iter()
        .find(|(known, _)| *known == primary)
        .map(|(_, name)| *name)
}

impl LocaleRegistry {
    /// Build the registry from the content config's localization section.
    ///
    /// Duplicate codes keep their first declaration.
    pub fn from_config(config: &LocalizationConfig) -> Self {
        let mut locales: Vec<LocaleConfig> = Vec::with_capacity(config.locales.len());

        for entry in &config.locales {
            let code = entry.code();
            if locales.iter().any(|l| l.code == code) {
                continue;
            }
            let label = match entry {
                LocaleEntry::Detailed {
                    label: Some(label), ..
                } => label.clone(),
                _ => known_language_name(code)
                    .map(str::to_string)
                    .unwrap_or_else(|| code.to_string()),
            };
            locales.push(LocaleConfig {
                code: code.to_string(),
                label,
            });
        }

        Self {
            locales,
            default_locale: config.default_locale.clone(),
        }
    }

    /// Get a locale by its code.
    pub fn get_by_code(&self, code: &str) -> Option<&LocaleConfig> {
        self.locales.iter().find(|locale| locale.code == code)
    }

    /// All supported locale codes, in declaration order.
    pub fn codes(&self) -> Vec<&str> {
        self.locales.iter().map(|l| l.code.as_str()).collect()
    }

    /// The default locale, if one is declared and supported.
    pub fn default_locale(&self) -> Option<&LocaleConfig> {
        self.default_locale
            .as_deref()
            .and_then(|code| self.get_by_code(code))
    }

    /// Resolve requested target codes to supported locales.
    ///
    /// Unknown codes, duplicates and the source locale itself are dropped.
    /// Request order is preserved.
    pub fn resolve_targets<'a>(
        &'a self,
        requested: &[String],
        source: &str,
    ) -> Vec<&'a LocaleConfig> {
        let mut targets: Vec<&LocaleConfig> = Vec::new();
        for code in requested {
            if code == source {
                continue;
            }
            if let Some(locale) = self.get_by_code(code) {
                if !targets.iter().any(|t| t.code == locale.code) {
                    targets.push(locale);
                }
            }
        }
        targets
    }
}
