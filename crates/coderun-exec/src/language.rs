//! Languages the sandbox knows how to run.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Languages with a registered executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    /// CPython 3, reading source from stdin where possible.
    Python,
    /// Node.js.
    JavaScript,
    /// Java; the entry class must be named `Main`.
    Java,
    /// C compiled with `gcc`.
    C,
    /// C++ compiled with `g++`.
    Cpp,
    /// Rust compiled with `rustc`.
    Rust,
    /// Go via `go run`.
    Go,
}

impl Language {
    /// Every supported language in registry order.
    pub const ALL: [Self; 7] = [
        Self::Python,
        Self::JavaScript,
        Self::Java,
        Self::C,
        Self::Cpp,
        Self::Rust,
        Self::Go,
    ];

    /// Returns the canonical lower-case tag.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::Java => "java",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::Rust => "rust",
            Self::Go => "go",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// Errors raised when parsing language tags.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported language '{0}'")]
pub struct LanguageParseError(String);

impl LanguageParseError {
    /// Returns the normalised input that failed to parse.
    #[must_use]
    pub const fn input(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for Language {
    type Err = LanguageParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let normalised = input.trim().to_ascii_lowercase();
        match normalised.as_str() {
            "python" | "python3" | "py" => Ok(Self::Python),
            "javascript" | "js" | "node" | "nodejs" => Ok(Self::JavaScript),
            "java" => Ok(Self::Java),
            "c" => Ok(Self::C),
            "cpp" | "c++" | "cxx" => Ok(Self::Cpp),
            "rust" | "rs" => Ok(Self::Rust),
            "go" | "golang" => Ok(Self::Go),
            _ => Err(LanguageParseError(normalised)),
        }
    }
}
