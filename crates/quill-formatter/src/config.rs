//! Formatter configuration

use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// Newline sequence used in the output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NewlineStyle {
    /// Unix line endings (`\n`)
    Lf,
    /// Windows line endings (`\r\n`)
    Crlf,
}

impl NewlineStyle {
    pub fn as_str(&self) -> &'static str {
        match self {
            NewlineStyle::Lf => "\n",
            NewlineStyle::Crlf => "\r\n",
        }
    }
}

/// Indentation unit emitted per nesting level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndentStyle {
    /// `indent_size` spaces per level
    Spaces,
    /// One tab per level
    Tabs,
}

/// Formatter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatConfig {
    /// Number of spaces per indentation level (default: 4); also the
    /// column width charged per level when indenting with tabs
    pub indent_size: usize,
    /// Indent with spaces or tabs (default: spaces)
    pub indent_style: IndentStyle,
    /// Maximum line width before breaking (default: 120)
    pub max_width: usize,
    /// Newline sequence in the output (default: lf)
    pub newline: NewlineStyle,
    /// BCP-47 tag used when localizing error messages (default: "en-US")
    pub locale: String,
}

impl Default for FormatConfig {
    fn default() -> Self {
        Self {
            indent_size: 4,
            indent_style: IndentStyle::Spaces,
            max_width: 120,
            newline: NewlineStyle::Lf,
            locale: "en-US".to_string(),
        }
    }
}

impl FormatConfig {
    /// Create config with custom indent size
    pub fn with_indent_size(mut self, size: usize) -> Self {
        self.indent_size = size;
        self
    }

    /// Create config with a custom indent style
    pub fn with_indent_style(mut self, style: IndentStyle) -> Self {
        self.indent_style = style;
        self
    }

    /// The text emitted for one indentation level
    pub fn indent_unit(&self) -> String {
        match self.indent_style {
            IndentStyle::Spaces => " ".repeat(self.indent_size),
            IndentStyle::Tabs => "\t".to_string(),
        }
    }

    /// Create config with custom max width
    pub fn with_max_width(mut self, width: usize) -> Self {
        self.max_width = width;
        self
    }

    /// Create config with a custom newline style
    pub fn with_newline(mut self, newline: NewlineStyle) -> Self {
        self.newline = newline;
        self
    }

    /// Create config with a custom locale
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    /// Parse configuration from a TOML document
    pub fn from_toml(text: &str) -> Result<Self, FormatError> {
        toml::from_str(text).map_err(|e| FormatError::Config {
            detail: e.to_string(),
        })
    }

    /// Width-aware formatting is disabled at very small widths, where
    /// almost nothing fits inline anyway
    pub fn is_width_aware(&self) -> bool {
        self.max_width > crate::multiline::MULTILINE_THRESHOLD
    }
}
