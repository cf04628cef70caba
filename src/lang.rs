//! Target languages the translation service accepts.
//!
//! [`TargetLang`] is the fixed set of codes the front-end's language picker
//! offers.  The relay forwards the code verbatim; validating it is the
//! service's job, so adding a variant here never requires a protocol change.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TargetLang
// ---------------------------------------------------------------------------

/// A supported translation target language.
///
/// Serialized as its two-letter wire code (e.g. `"es"`), which is also what
/// the `target_lang` form field carries on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetLang {
    /// English.
    En,
    /// Spanish.
    Es,
    /// French.
    Fr,
    /// German.
    De,
    /// Hindi.
    Hi,
    /// Japanese.
    Ja,
}

impl TargetLang {
    /// Every supported language, in the order the front-end lists them.
    pub const ALL: [TargetLang; 6] = [
        TargetLang::En,
        TargetLang::Es,
        TargetLang::Fr,
        TargetLang::De,
        TargetLang::Hi,
        TargetLang::Ja,
    ];

    /// Two-letter code sent over the wire.
    pub fn code(self) -> &'static str {
        match self {
            TargetLang::En => "en",
            TargetLang::Es => "es",
            TargetLang::Fr => "fr",
            TargetLang::De => "de",
            TargetLang::Hi => "hi",
            TargetLang::Ja => "ja",
        }
    }

    /// Human-readable name for the language picker.
    pub fn label(self) -> &'static str {
        match self {
            TargetLang::En => "English",
            TargetLang::Es => "Spanish",
            TargetLang::Fr => "French",
            TargetLang::De => "German",
            TargetLang::Hi => "Hindi",
            TargetLang::Ja => "Japanese",
        }
    }

    /// Parse a wire code back into a variant.  Returns `None` for codes
    /// outside the supported set.
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|lang| lang.code() == code)
    }
}

impl Default for TargetLang {
    fn default() -> Self {
        TargetLang::En
    }
}

impl std::fmt::Display for TargetLang {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
