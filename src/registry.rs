use std::sync::Arc;

use crate::{
    error::guarded, ApplicationInfo, Client, EnvironmentMetadata, Error, Hook, HookRunner, Plugin,
    SdkMetadata,
};

const UNKNOWN_PLUGIN_NAME: &str = "unknown plugin";

/// Registers plugins with every environment of a client and installs the resulting hooks.
///
/// For each environment, plugins are registered in configuration order: `register` then
/// `get_hooks`. The environment hook list is the directly configured hooks followed by the hooks of
/// each plugin in plugin order.
pub(crate) struct PluginRegistry {
    sdk_metadata: SdkMetadata,
    application_info: Option<ApplicationInfo>,
    plugins: Vec<Arc<dyn Plugin>>,
    hooks: Vec<Arc<dyn Hook>>,
}

impl PluginRegistry {
    pub(crate) fn new(
        sdk_metadata: SdkMetadata,
        application_info: Option<ApplicationInfo>,
        plugins: Vec<Arc<dyn Plugin>>,
        hooks: Vec<Arc<dyn Hook>>,
    ) -> PluginRegistry {
        PluginRegistry {
            sdk_metadata,
            application_info,
            plugins,
            hooks,
        }
    }

    /// Register all plugins with each of `clients` and install the hooks.
    ///
    /// Environments that already completed registration are skipped, so plugins are never
    /// registered twice with the same environment.
    pub(crate) fn register<'a>(&self, clients: impl IntoIterator<Item = &'a Client>) {
        let plugin_names = self
            .plugins
            .iter()
            .map(|plugin| {
                guarded(|| Ok(plugin.get_metadata().name().to_owned())).unwrap_or_else(|err| {
                    log::warn!(target: "flaghook", error:display = err; "unable to get plugin metadata");
                    UNKNOWN_PLUGIN_NAME.to_owned()
                })
            })
            .collect::<Vec<_>>();

        for client in clients {
            if client.is_registered() {
                log::debug!(target: "flaghook",
                            environment = client.environment_name();
                            "plugins already registered for environment, skipping");
                continue;
            }

            let metadata = EnvironmentMetadata::new(
                self.application_info.clone(),
                self.sdk_metadata,
                client.mobile_key(),
            );
            let hooks = self.register_environment(client, &metadata, &plugin_names);

            let hook_count = hooks.len();
            if client.install_hooks(metadata, hooks) {
                log::debug!(target: "flaghook",
                            environment = client.environment_name(),
                            hooks = hook_count;
                            "installed hooks for environment");
            }
        }
    }

    fn register_environment(
        &self,
        client: &Client,
        metadata: &EnvironmentMetadata,
        plugin_names: &[String],
    ) -> HookRunner {
        let mut hooks = self.hooks.clone();

        for (plugin, plugin_name) in self.plugins.iter().zip(plugin_names) {
            let result = guarded(|| plugin.register(client, metadata))
                .and_then(|()| guarded(|| plugin.get_hooks(metadata)));

            match result {
                Ok(plugin_hooks) => {
                    log::debug!(target: "flaghook",
                                plugin:display = plugin_name,
                                environment = client.environment_name(),
                                hooks = plugin_hooks.len();
                                "registered plugin");
                    hooks.extend(plugin_hooks);
                }
                Err(source) => {
                    let err = Error::RegistrationFailure {
                        plugin: plugin_name.clone(),
                        environment: client.environment_name().to_owned(),
                        source: source.clone(),
                    };
                    log::warn!(target: "flaghook",
                               plugin:display = plugin_name,
                               environment = client.environment_name();
                               "{}: {}", err, source);
                }
            }
        }

        HookRunner::new(hooks)
    }
}
