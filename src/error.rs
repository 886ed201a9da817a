use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

/// Error type returned by plugin and hook implementations.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for operations of this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced by the client and its extension pipeline.
///
/// Only configuration errors are ever returned to the caller. Registration and hook failures are
/// recovered where they happen and reported through the `log` crate; they are represented here so
/// that the log message and its source chain are consistent.
#[derive(thiserror::Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// The environment name is reserved for the primary environment.
    #[error("environment name {0:?} is reserved for the primary environment")]
    ReservedEnvironmentName(String),

    /// The primary mobile key was also configured as a secondary key.
    #[error("primary mobile key must not be used as a secondary mobile key")]
    PrimaryKeyAsSecondary,

    /// Two secondary environments share the same mobile key.
    #[error("secondary mobile keys must be unique")]
    DuplicateSecondaryKey,

    /// Two secondary environments share the same name.
    #[error("duplicate secondary environment name {0:?}")]
    DuplicateEnvironmentName(String),

    /// A mobile key is empty.
    #[error("mobile key for environment {0:?} must not be empty")]
    EmptyMobileKey(String),

    /// A plugin failed to register or to supply its hooks.
    #[error("plugin {plugin:?} failed to register for environment {environment:?}")]
    RegistrationFailure {
        /// Plugin name as reported by its metadata.
        plugin: String,
        /// Name of the environment the registration was performed for.
        environment: String,
        /// What went wrong.
        #[source]
        source: ExtensionFailure,
    },

    /// A hook failed while observing an evaluation.
    #[error("hook {hook:?} failed in {stage} for flag {flag_key:?}")]
    HookExecutionFailure {
        /// Hook name as reported by its metadata.
        hook: String,
        /// Evaluation stage the hook was executing.
        stage: EvaluationStage,
        /// Flag being evaluated.
        flag_key: String,
        /// What went wrong.
        #[source]
        source: ExtensionFailure,
    },
}

/// Failure of third-party extension code.
#[derive(thiserror::Error, Debug, Clone)]
pub enum ExtensionFailure {
    /// The extension returned an error.
    #[error(transparent)]
    // BoxError is not clonable, so we're wrapping it in an Arc.
    Returned(Arc<dyn std::error::Error + Send + Sync + 'static>),

    /// The extension panicked.
    #[error("panicked: {0}")]
    Panicked(String),
}

/// Stage of the evaluation series a hook is executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum EvaluationStage {
    /// `before_evaluation`
    #[display("beforeEvaluation")]
    BeforeEvaluation,
    /// `after_evaluation`
    #[display("afterEvaluation")]
    AfterEvaluation,
}

/// Run extension code, turning both returned errors and panics into [`ExtensionFailure`].
pub(crate) fn guarded<T>(
    f: impl FnOnce() -> std::result::Result<T, BoxError>,
) -> std::result::Result<T, ExtensionFailure> {
    match std::panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(ExtensionFailure::Returned(Arc::from(err))),
        Err(payload) => Err(ExtensionFailure::Panicked(panic_message(payload.as_ref()))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
