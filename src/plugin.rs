use std::sync::Arc;

use crate::{BoxError, Client, EnvironmentMetadata, Hook, PluginMetadata};

/// Extension point for SDK functionality.
///
/// A plugin is registered once with every environment of a client when the client starts, and can
/// supply hooks that are then called around every flag evaluation in that environment.
///
/// If the client is configured with several environments (secondary mobile keys), `register` and
/// `get_hooks` are called once for each environment. Use the [`EnvironmentMetadata`] to tell them
/// apart.
///
/// Errors returned from (and panics in) `register` or `get_hooks` are logged and the plugin then
/// contributes no hooks to that environment. They never prevent the client from starting.
///
/// # Examples
///
/// ```
/// # use std::sync::Arc;
/// # use flaghook::{BoxError, Client, EnvironmentMetadata, Hook, HookMetadata, Plugin, PluginMetadata};
/// struct LoggingHook;
///
/// impl Hook for LoggingHook {
///     fn metadata(&self) -> HookMetadata {
///         HookMetadata::new("logging-hook")
///     }
/// }
///
/// struct MyPlugin;
///
/// impl Plugin for MyPlugin {
///     fn get_metadata(&self) -> PluginMetadata {
///         PluginMetadata::new("my-plugin")
///     }
///
///     fn register(&self, client: &Client, _metadata: &EnvironmentMetadata) -> Result<(), BoxError> {
///         println!("registered with {}", client.environment_name());
///         Ok(())
///     }
///
///     fn get_hooks(&self, _metadata: &EnvironmentMetadata) -> Result<Vec<Arc<dyn Hook>>, BoxError> {
///         Ok(vec![Arc::new(LoggingHook)])
///     }
/// }
/// ```
pub trait Plugin: Send + Sync {
    /// Get metadata about the plugin implementation.
    fn get_metadata(&self) -> PluginMetadata;

    /// Register the plugin with the client of one environment.
    ///
    /// Called exactly once per environment, before [`Plugin::get_hooks`] is called for the same
    /// environment. Registration of all plugins happens sequentially on the thread starting the
    /// client.
    fn register(&self, client: &Client, metadata: &EnvironmentMetadata) -> Result<(), BoxError>;

    /// Get the hooks that should be called around evaluations in this environment.
    ///
    /// Hooks are called in the order returned, after hooks of previously configured plugins. The
    /// default implementation returns no hooks.
    fn get_hooks(&self, metadata: &EnvironmentMetadata) -> Result<Vec<Arc<dyn Hook>>, BoxError> {
        let _ = metadata;
        Ok(Vec::new())
    }
}
