//! Language tag to executor resolution.

use std::collections::BTreeMap;

use crate::error::ExecutionError;
use crate::executor::{
    CExecutor, CppExecutor, GoExecutor, JavaExecutor, JavaScriptExecutor, LanguageExecutor,
    PythonExecutor, RustExecutor,
};
use crate::language::Language;

/// Maps each [`Language`] to the executor that runs it.
///
/// The registry is immutable once a sandbox is built, so resolution needs no
/// locking and is safe to share across threads.
#[derive(Debug, Default)]
pub struct ExecutorRegistry {
    executors: BTreeMap<Language, Box<dyn LanguageExecutor>>,
}

impl ExecutorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry with the built-in executor for every language.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(PythonExecutor::default()));
        registry.register(Box::new(JavaScriptExecutor::default()));
        registry.register(Box::new(JavaExecutor::default()));
        registry.register(Box::new(CExecutor::default()));
        registry.register(Box::new(CppExecutor::default()));
        registry.register(Box::new(RustExecutor::default()));
        registry.register(Box::new(GoExecutor::default()));
        registry
    }

    /// Registers `executor` for its language, returning any executor it
    /// replaced.
    pub fn register(
        &mut self,
        executor: Box<dyn LanguageExecutor>,
    ) -> Option<Box<dyn LanguageExecutor>> {
        self.executors.insert(executor.language(), executor)
    }

    /// Resolves a caller-supplied language tag.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::UnsupportedLanguage`] listing the supported
    /// tags when the tag is unknown or has no registered executor.
    pub fn resolve(&self, tag: &str) -> Result<&dyn LanguageExecutor, ExecutionError> {
        tag.parse::<Language>()
            .ok()
            .and_then(|language| self.executors.get(&language))
            .map(|executor| executor.as_ref())
            .ok_or_else(|| ExecutionError::UnsupportedLanguage {
                language: tag.to_owned(),
                supported: self.supported_list(),
            })
    }

    /// Languages with a registered executor, in registry order.
    pub fn supported(&self) -> impl Iterator<Item = Language> + '_ {
        self.executors.keys().copied()
    }

    /// Number of registered executors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.executors.len()
    }

    /// Returns `true` when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.executors.is_empty()
    }

    fn supported_list(&self) -> String {
        self.supported()
            .map(Language::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
