//! Plugin and evaluation hook pipeline for a feature flag client.
//!
//! # Overview
//!
//! A [`ClientConfig`] creates one [`Client`] per environment: the primary environment identified
//! by the primary mobile key, plus one environment per secondary mobile key. Clients evaluate flags
//! for an [`EvaluationContext`] from values held in their [`FlagStore`].
//!
//! Functionality can be added to a client with a [`Plugin`]. When the client starts, every plugin
//! is registered exactly once with every environment and may supply [`Hook`]s. Hooks are called
//! around every flag evaluation: `before_evaluation` of all hooks in registration order, then the
//! evaluation itself, then `after_evaluation` in reverse order. Hooks can carry state between
//! their two calls through [`EvaluationSeriesData`].
//!
//! # Error Handling
//!
//! Errors are represented by the [`Error`] enum. Only configuration errors are returned to the
//! caller.
//!
//! Plugins and hooks are third-party code. Errors they return and panics they raise are caught,
//! logged and otherwise ignored: a failing plugin contributes no hooks, and a failing hook leaves
//! the series data unchanged. Neither ever changes the value returned by an evaluation.
//!
//! # Logging
//!
//! The package uses the [`log`](https://docs.rs/log/latest/log/) crate for logging
//! messages, with target `flaghook`. Consider integrating a `log`-compatible logger implementation
//! for better visibility into plugin registration and hook failures.
//!
//! # Examples
//!
//! ```
//! # use std::sync::Arc;
//! # use flaghook::{BoxError, Client, ClientConfig, EnvironmentMetadata, EvaluationContext, Plugin, PluginMetadata};
//! struct AuditPlugin;
//!
//! impl Plugin for AuditPlugin {
//!     fn get_metadata(&self) -> PluginMetadata {
//!         PluginMetadata::new("audit")
//!     }
//!
//!     fn register(&self, client: &Client, _metadata: &EnvironmentMetadata) -> Result<(), BoxError> {
//!         println!("audit enabled for {}", client.environment_name());
//!         Ok(())
//!     }
//! }
//!
//! let clients = ClientConfig::from_mobile_key("mobile-key")
//!     .plugins(vec![Arc::new(AuditPlugin)])
//!     .start(EvaluationContext::new("user-1"));
//!
//! let enabled = clients.primary().bool_variation("new-checkout", false);
//! ```

#![warn(rustdoc::missing_crate_level_docs)]
#![warn(missing_docs)]

mod client;
mod config;
mod context;
mod error;
mod eval;
mod eval_detail;
mod flag_store;
mod hook;
mod hook_runner;
mod metadata;
mod plugin;
mod registry;
mod value;

pub use client::{Client, Clients, PRIMARY_ENVIRONMENT_NAME};
pub use config::ClientConfig;
pub use context::{AttributeValue, Attributes, EvaluationContext, DEFAULT_CONTEXT_KIND};
pub use error::{BoxError, Error, EvaluationStage, ExtensionFailure, Result};
pub use eval_detail::{ErrorKind, EvaluationDetail, EvaluationReason};
pub use flag_store::{FeatureFlag, FlagSnapshot, FlagStore};
pub use hook::{
    EvaluationMethod, EvaluationSeriesContext, EvaluationSeriesData, Hook, HookResult,
};
pub use hook_runner::HookRunner;
pub use metadata::{ApplicationInfo, EnvironmentMetadata, HookMetadata, PluginMetadata, SdkMetadata};
pub use plugin::Plugin;
pub use value::{FlagValue, ValueType};
