//! Count check on an oracle response.
//!
//! Translations are matched to fields by position, so a response of the
//! wrong length is the one thing worth reporting. It is not enforced: extra
//! translations are ignored and missing ones leave the tail untranslated.

use std::fmt;

/// Compares how many texts were sent with how many translations came back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchCheck {
    pub expected: usize,
    pub returned: usize,
}

impl BatchCheck {
    pub fn new(originals: &[String], translations: &[String]) -> Self {
        Self {
            expected: originals.len(),
            returned: translations.len(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.expected == self.returned
    }

    /// Translations that land on a field
    pub fn applied(&self) -> usize {
        self.expected.min(self.returned)
    }
}

impl fmt::Display for BatchCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Expected {} translations, oracle returned {}",
            self.expected, self.returned
        )
    }
}
