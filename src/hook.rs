//! Hooks observe every flag evaluation performed by a client.
//!
//! A hook is called immediately before an evaluation and immediately after it. Both calls are part
//! of an *evaluation series*: the [`EvaluationSeriesContext`] describes the evaluation, and
//! [`EvaluationSeriesData`] lets a hook carry state from its `before_evaluation` call to its
//! `after_evaluation` call.
use std::{any::Any, collections::HashMap, fmt, sync::Arc};

use crate::{
    value::ValueType, BoxError, EvaluationContext, EvaluationDetail, FlagValue, HookMetadata,
};

/// Result returned by hook callbacks.
pub type HookResult = Result<EvaluationSeriesData, BoxError>;

/// Observer invoked before and after every flag evaluation.
///
/// Hooks registered in order `[h1, h2]` are called as `h1.before`, `h2.before`, evaluation,
/// `h2.after`, `h1.after`. Each callback receives the series data returned by the previously
/// executed callback and returns the data to pass on.
///
/// Returning an error (or panicking) does not affect the evaluation: the failure is logged and the
/// data the hook received is passed on unchanged.
///
/// Hooks are shared by all evaluations of an environment, which may run concurrently on several
/// threads. Implementations holding mutable state must synchronize it themselves.
///
/// # Examples
///
/// ```
/// # use std::time::Instant;
/// # use flaghook::{EvaluationDetail, EvaluationSeriesContext, EvaluationSeriesData, FlagValue, Hook, HookMetadata, HookResult};
/// struct TimingHook;
///
/// impl Hook for TimingHook {
///     fn metadata(&self) -> HookMetadata {
///         HookMetadata::new("timing")
///     }
///
///     fn before_evaluation(
///         &self,
///         _series_context: &EvaluationSeriesContext,
///         series_data: &EvaluationSeriesData,
///     ) -> HookResult {
///         Ok(series_data.with("started", Instant::now()))
///     }
///
///     fn after_evaluation(
///         &self,
///         series_context: &EvaluationSeriesContext,
///         series_data: &EvaluationSeriesData,
///         _evaluation_detail: &EvaluationDetail<FlagValue>,
///     ) -> HookResult {
///         if let Some(started) = series_data.get::<Instant>("started") {
///             println!("{} took {:?}", series_context.flag_key(), started.elapsed());
///         }
///         Ok(series_data.clone())
///     }
/// }
/// ```
pub trait Hook: Send + Sync {
    /// Get metadata about the hook implementation.
    fn metadata(&self) -> HookMetadata;

    /// Called immediately before a flag is evaluated.
    ///
    /// The default implementation passes `series_data` through unchanged.
    fn before_evaluation(
        &self,
        series_context: &EvaluationSeriesContext,
        series_data: &EvaluationSeriesData,
    ) -> HookResult {
        let _ = series_context;
        Ok(series_data.clone())
    }

    /// Called immediately after a flag has been evaluated.
    ///
    /// The default implementation passes `series_data` through unchanged.
    fn after_evaluation(
        &self,
        series_context: &EvaluationSeriesContext,
        series_data: &EvaluationSeriesData,
        evaluation_detail: &EvaluationDetail<FlagValue>,
    ) -> HookResult {
        let _ = (series_context, evaluation_detail);
        Ok(series_data.clone())
    }
}

/// Variation call that triggered an evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[allow(missing_docs)]
pub enum EvaluationMethod {
    #[display("boolVariation")]
    BoolVariation,
    #[display("boolVariationDetail")]
    BoolVariationDetail,
    #[display("stringVariation")]
    StringVariation,
    #[display("stringVariationDetail")]
    StringVariationDetail,
    #[display("intVariation")]
    IntVariation,
    #[display("intVariationDetail")]
    IntVariationDetail,
    #[display("doubleVariation")]
    DoubleVariation,
    #[display("doubleVariationDetail")]
    DoubleVariationDetail,
    #[display("jsonVariation")]
    JsonVariation,
    #[display("jsonVariationDetail")]
    JsonVariationDetail,
}

impl EvaluationMethod {
    /// Type of value the variation call returns.
    pub fn value_type(self) -> ValueType {
        use EvaluationMethod::*;
        match self {
            BoolVariation | BoolVariationDetail => ValueType::Boolean,
            StringVariation | StringVariationDetail => ValueType::String,
            IntVariation | IntVariationDetail => ValueType::Integer,
            DoubleVariation | DoubleVariationDetail => ValueType::Numeric,
            JsonVariation | JsonVariationDetail => ValueType::Json,
        }
    }
}

/// Read-only description of the evaluation a hook is observing.
#[derive(Debug, Clone)]
pub struct EvaluationSeriesContext {
    flag_key: String,
    context: EvaluationContext,
    default_value: FlagValue,
    method: EvaluationMethod,
}

impl EvaluationSeriesContext {
    #[allow(missing_docs)]
    pub fn new(
        flag_key: impl Into<String>,
        context: EvaluationContext,
        default_value: FlagValue,
        method: EvaluationMethod,
    ) -> EvaluationSeriesContext {
        EvaluationSeriesContext {
            flag_key: flag_key.into(),
            context,
            default_value,
            method,
        }
    }

    /// Key of the flag being evaluated.
    pub fn flag_key(&self) -> &str {
        &self.flag_key
    }

    /// Context the flag is evaluated for.
    pub fn context(&self) -> &EvaluationContext {
        &self.context
    }

    /// Value served if the evaluation fails.
    pub fn default_value(&self) -> &FlagValue {
        &self.default_value
    }

    /// Variation call that triggered the evaluation.
    pub fn method(&self) -> EvaluationMethod {
        self.method
    }
}

/// Data threaded through the hooks of one evaluation series.
///
/// A hook never modifies the data it receives. [`EvaluationSeriesData::with`] returns a new
/// instance and leaves the original untouched. Cloning is cheap.
///
/// ```
/// # use flaghook::EvaluationSeriesData;
/// let empty = EvaluationSeriesData::new();
/// let data = empty.with("attempt", 1u32);
/// assert_eq!(data.get::<u32>("attempt"), Some(&1));
/// assert!(empty.is_empty());
/// ```
#[derive(Clone, Default)]
pub struct EvaluationSeriesData {
    entries: Arc<HashMap<String, Arc<dyn Any + Send + Sync>>>,
}

impl EvaluationSeriesData {
    /// Create empty series data.
    pub fn new() -> Self {
        EvaluationSeriesData::default()
    }

    /// Return a copy of this data with `key` set to `value`.
    pub fn with<T: Any + Send + Sync>(&self, key: impl Into<String>, value: T) -> Self {
        let mut entries = (*self.entries).clone();
        entries.insert(key.into(), Arc::new(value));
        EvaluationSeriesData {
            entries: Arc::new(entries),
        }
    }

    /// Return a copy of this data without `key`.
    pub fn without(&self, key: &str) -> Self {
        if !self.entries.contains_key(key) {
            return self.clone();
        }
        let mut entries = (*self.entries).clone();
        entries.remove(key);
        EvaluationSeriesData {
            entries: Arc::new(entries),
        }
    }

    /// Get the value stored under `key` if it is of type `T`.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.entries.get(key)?.downcast_ref::<T>()
    }

    /// Get the value stored under `key`, whatever its type.
    pub fn get_any(&self, key: &str) -> Option<&(dyn Any + Send + Sync)> {
        self.entries.get(key).map(|value| value.as_ref())
    }

    #[allow(missing_docs)]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Keys present in this data, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[allow(missing_docs)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(missing_docs)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for EvaluationSeriesData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&str> = self.keys().collect();
        keys.sort_unstable();
        f.debug_struct("EvaluationSeriesData")
            .field("keys", &keys)
            .finish()
    }
}
