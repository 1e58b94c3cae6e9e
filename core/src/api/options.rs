//! Configuration options for the engine.

/// Configuration options for compilation.
///
/// # Example
///
/// ```
/// use olapcalc_core::api::CompilationOptions;
///
/// let options = CompilationOptions {
///     specialize_fixed_hierarchies: false,
/// };
/// assert!(CompilationOptions::default().specialize_fixed_hierarchies);
/// ```
#[derive(Debug, Clone)]
pub struct CompilationOptions {
    /// Select calcs that capture a statically known hierarchy
    /// (`CurrentMemberFixed`, constant `DefaultMember`, ...).
    ///
    /// When off, every hierarchy is resolved at evaluation time. Both
    /// settings compute the same results.
    ///
    /// Default: true
    pub specialize_fixed_hierarchies: bool,
}

impl Default for CompilationOptions {
    fn default() -> Self {
        Self {
            specialize_fixed_hierarchies: true,
        }
    }
}

/// Configuration options for expression evaluation.
///
/// # Example
///
/// ```
/// use olapcalc_core::api::ExecutionOptions;
///
/// let options = ExecutionOptions {
///     verify_context_restoration: true,
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ExecutionOptions {
    /// Compare the evaluator against a snapshot after every root evaluation
    /// and report any member that was not restored as a defect.
    ///
    /// Default: on in debug builds, off in release builds.
    pub verify_context_restoration: bool,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            verify_context_restoration: cfg!(debug_assertions),
        }
    }
}

/// Configuration options for the engine.
///
/// These set the defaults for compilation and evaluation, which can be
/// overridden per statement.
///
/// # Example
///
/// ```
/// use olapcalc_core::api::{CompilationOptions, EngineOptions, ExecutionOptions};
///
/// let options = EngineOptions {
///     default_compilation_options: CompilationOptions::default(),
///     default_execution_options: ExecutionOptions {
///         verify_context_restoration: true,
///     },
/// };
/// ```
#[derive(Debug, Clone, Default)]
pub struct EngineOptions {
    /// Default options for compilation.
    ///
    /// These can be overridden when calling `Engine::prepare_with_options()`.
    pub default_compilation_options: CompilationOptions,

    /// Default options for evaluation.
    ///
    /// These can be overridden with `PreparedExpression::with_execution_options()`.
    pub default_execution_options: ExecutionOptions,
}
