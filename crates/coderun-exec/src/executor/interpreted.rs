//! Executors for interpreted languages.

use super::{LanguageExecutor, SourceLocation};
use crate::invocation::{shell_join, shell_quote};
use crate::language::Language;

/// Default image for Python.
pub const PYTHON_IMAGE: &str = "python:3.11";
/// Default image for JavaScript.
pub const NODE_IMAGE: &str = "node:20";

/// Directory under scratch that receives installed Python packages.
const PYTHON_PACKAGES: &str = ".packages";

/// Runs Python 3 programs, installing requested packages with `pip`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PythonExecutor {
    image: String,
}

impl PythonExecutor {
    /// Uses `image` instead of the default.
    #[must_use]
    pub fn with_image(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
        }
    }
}

impl Default for PythonExecutor {
    fn default() -> Self {
        Self::with_image(PYTHON_IMAGE)
    }
}

impl LanguageExecutor for PythonExecutor {
    fn language(&self) -> Language {
        Language::Python
    }

    fn image(&self) -> &str {
        self.image.as_str()
    }

    fn source_file(&self) -> &'static str {
        "main.py"
    }

    fn reads_source_from_stdin(&self) -> bool {
        true
    }

    fn run_step(&self, source: SourceLocation<'_>, _scratch_dir: &str) -> String {
        match source {
            SourceLocation::Stdin => String::from("python3 -"),
            SourceLocation::File(path) => format!("python3 {}", shell_quote(path)),
        }
    }

    fn install_step(&self, dependencies: &[String], scratch_dir: &str) -> Option<String> {
        Some(format!(
            "pip install --quiet --no-cache-dir --disable-pip-version-check --target {} {}",
            shell_quote(&format!("{scratch_dir}/{PYTHON_PACKAGES}")),
            shell_join(dependencies)
        ))
    }

    fn environment(&self, scratch_dir: &str) -> Vec<(String, String)> {
        vec![
            (
                String::from("PYTHONPATH"),
                format!("{scratch_dir}/{PYTHON_PACKAGES}"),
            ),
            (String::from("PYTHONDONTWRITEBYTECODE"), String::from("1")),
            (String::from("PYTHONUNBUFFERED"), String::from("1")),
        ]
    }
}

/// Runs JavaScript with Node.js.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaScriptExecutor {
    image: String,
}

impl JavaScriptExecutor {
    /// Uses `image` instead of the default.
    #[must_use]
    pub fn with_image(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
        }
    }
}

impl Default for JavaScriptExecutor {
    fn default() -> Self {
        Self::with_image(NODE_IMAGE)
    }
}

impl LanguageExecutor for JavaScriptExecutor {
    fn language(&self) -> Language {
        Language::JavaScript
    }

    fn image(&self) -> &str {
        self.image.as_str()
    }

    fn source_file(&self) -> &'static str {
        "main.js"
    }

    fn run_step(&self, source: SourceLocation<'_>, _scratch_dir: &str) -> String {
        match source {
            SourceLocation::Stdin => String::from("node -"),
            SourceLocation::File(path) => format!("node {}", shell_quote(path)),
        }
    }
}
