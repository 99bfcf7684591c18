//! Executors for languages with a compile step.
//!
//! Build artefacts land in the scratch directory, the only writable location
//! in the container.

use super::{LanguageExecutor, SourceLocation};
use crate::invocation::shell_quote;
use crate::language::Language;

/// Default image for Java.
pub const JAVA_IMAGE: &str = "eclipse-temurin:21";
/// Default image for C and C++.
pub const GCC_IMAGE: &str = "gcc:13";
/// Default image for Rust.
pub const RUST_IMAGE: &str = "rust:1.83";
/// Default image for Go.
pub const GO_IMAGE: &str = "golang:1.22";

/// Resolves the source path; compiled languages are always file-delivered.
fn source_path(source: SourceLocation<'_>, scratch_dir: &str, file: &str) -> String {
    match source {
        SourceLocation::File(path) => shell_quote(path),
        SourceLocation::Stdin => shell_quote(&format!("{scratch_dir}/{file}")),
    }
}

macro_rules! image_executor {
    ($(#[$meta:meta])* $name:ident, $default:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name {
            image: String,
        }

        impl $name {
            /// Uses `image` instead of the default.
            #[must_use]
            pub fn with_image(image: impl Into<String>) -> Self {
                Self {
                    image: image.into(),
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::with_image($default)
            }
        }
    };
}

image_executor!(
    /// Compiles with `javac` and runs class `Main`.
    JavaExecutor,
    JAVA_IMAGE
);
image_executor!(
    /// Compiles with `gcc`.
    CExecutor,
    GCC_IMAGE
);
image_executor!(
    /// Compiles with `g++`.
    CppExecutor,
    GCC_IMAGE
);
image_executor!(
    /// Compiles with `rustc`.
    RustExecutor,
    RUST_IMAGE
);
image_executor!(
    /// Builds and runs with `go run`.
    GoExecutor,
    GO_IMAGE
);

impl LanguageExecutor for JavaExecutor {
    fn language(&self) -> Language {
        Language::Java
    }

    fn image(&self) -> &str {
        self.image.as_str()
    }

    fn source_file(&self) -> &'static str {
        "Main.java"
    }

    fn run_step(&self, source: SourceLocation<'_>, scratch_dir: &str) -> String {
        let scratch = shell_quote(scratch_dir);
        format!(
            "javac -d {scratch} {} && java -cp {scratch} Main",
            source_path(source, scratch_dir, self.source_file())
        )
    }
}

/// Compile-then-run step for native toolchains writing `<scratch>/main`.
fn native_step(compiler: &str, source: &str, scratch_dir: &str) -> String {
    let binary = shell_quote(&format!("{scratch_dir}/main"));
    format!("{compiler} -O2 -o {binary} {source} && {binary}")
}

impl LanguageExecutor for CExecutor {
    fn language(&self) -> Language {
        Language::C
    }

    fn image(&self) -> &str {
        self.image.as_str()
    }

    fn source_file(&self) -> &'static str {
        "main.c"
    }

    fn run_step(&self, source: SourceLocation<'_>, scratch_dir: &str) -> String {
        native_step(
            "gcc",
            &source_path(source, scratch_dir, self.source_file()),
            scratch_dir,
        )
    }
}

impl LanguageExecutor for CppExecutor {
    fn language(&self) -> Language {
        Language::Cpp
    }

    fn image(&self) -> &str {
        self.image.as_str()
    }

    fn source_file(&self) -> &'static str {
        "main.cpp"
    }

    fn run_step(&self, source: SourceLocation<'_>, scratch_dir: &str) -> String {
        native_step(
            "g++",
            &source_path(source, scratch_dir, self.source_file()),
            scratch_dir,
        )
    }
}

impl LanguageExecutor for RustExecutor {
    fn language(&self) -> Language {
        Language::Rust
    }

    fn image(&self) -> &str {
        self.image.as_str()
    }

    fn source_file(&self) -> &'static str {
        "main.rs"
    }

    fn run_step(&self, source: SourceLocation<'_>, scratch_dir: &str) -> String {
        let binary = shell_quote(&format!("{scratch_dir}/main"));
        format!(
            "rustc -O -o {binary} {} && {binary}",
            source_path(source, scratch_dir, self.source_file())
        )
    }
}

impl LanguageExecutor for GoExecutor {
    fn language(&self) -> Language {
        Language::Go
    }

    fn image(&self) -> &str {
        self.image.as_str()
    }

    fn source_file(&self) -> &'static str {
        "main.go"
    }

    fn run_step(&self, source: SourceLocation<'_>, scratch_dir: &str) -> String {
        format!(
            "go run {}",
            source_path(source, scratch_dir, self.source_file())
        )
    }

    fn environment(&self, scratch_dir: &str) -> Vec<(String, String)> {
        vec![
            (String::from("GOCACHE"), format!("{scratch_dir}/.cache/go-build")),
            (String::from("GOPATH"), format!("{scratch_dir}/go")),
            (String::from("GO111MODULE"), String::from("off")),
        ]
    }
}
