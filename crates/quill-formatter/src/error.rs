//! Formatter errors

use quill_syntax::ParseError;
use thiserror::Error;

/// Errors surfaced by the formatting pipeline
#[derive(Debug, Error)]
pub enum FormatError {
    /// The source could not be parsed
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// An internal table was missing an entry it is guaranteed to have
    #[error("internal invariant violated: {detail}")]
    Invariant { detail: String },

    /// The configuration document was malformed
    #[error("invalid configuration: {detail}")]
    Config { detail: String },

    /// A cancellation token was triggered mid-format
    #[error("formatting was cancelled")]
    Cancelled,
}

impl FormatError {
    pub(crate) fn invariant(detail: impl Into<String>) -> Self {
        FormatError::Invariant {
            detail: detail.into(),
        }
    }

    /// Render the error with a locale-appropriate prefix. Only the prefix
    /// is localized; detail text stays as produced.
    pub fn localized_message(&self, locale: &str) -> String {
        let language = locale
            .split(|c| c == '-' || c == '_')
            .next()
            .unwrap_or("en");
        let prefix = match language {
            "fr" => "Échec du formatage",
            "de" => "Formatierung fehlgeschlagen",
            "es" => "Error al formatear",
            _ => "Formatting failed",
        };
        format!("{prefix}: {self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_localized_prefix() {
        let err = FormatError::Cancelled;
        assert_eq!(
            err.localized_message("fr-FR"),
            "Échec du formatage: formatting was cancelled"
        );
        assert_eq!(
            err.localized_message("en-US"),
            "Formatting failed: formatting was cancelled"
        );
        // unknown locales fall back to English
        assert_eq!(
            err.localized_message("zz"),
            "Formatting failed: formatting was cancelled"
        );
    }
}
