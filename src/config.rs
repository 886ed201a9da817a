use std::{collections::HashSet, sync::Arc};

use crate::{
    client::PRIMARY_ENVIRONMENT_NAME, registry::PluginRegistry, ApplicationInfo, Client, Clients,
    Error, EvaluationContext, Hook, Plugin, Result, SdkMetadata,
};

/// Configuration for [`Clients`].
///
/// ```
/// # use flaghook::{ClientConfig, EvaluationContext};
/// let clients = ClientConfig::from_mobile_key("mobile-key")
///     .start(EvaluationContext::new("user-1"));
/// assert_eq!(clients.len(), 1);
/// ```
pub struct ClientConfig {
    mobile_key: String,
    secondary_mobile_keys: Vec<(String, String)>,
    plugins: Vec<Arc<dyn Plugin>>,
    hooks: Vec<Arc<dyn Hook>>,
    application_info: Option<ApplicationInfo>,
    sdk_metadata: SdkMetadata,
}

impl ClientConfig {
    /// Create a default configuration for the environment identified by `mobile_key`.
    pub fn from_mobile_key(mobile_key: impl Into<String>) -> Self {
        ClientConfig {
            mobile_key: mobile_key.into(),
            secondary_mobile_keys: Vec::new(),
            plugins: Vec::new(),
            hooks: Vec::new(),
            application_info: None,
            sdk_metadata: SdkMetadata::for_current_platform(),
        }
    }

    /// Evaluate flags in additional environments, given as `(environment name, mobile key)` pairs.
    ///
    /// Replaces previously set secondary mobile keys. Environments are created in the order given.
    ///
    /// # Errors
    ///
    /// Returns an error if an environment name is [`PRIMARY_ENVIRONMENT_NAME`] or is used twice, if
    /// a mobile key is empty or is used twice, or if the primary mobile key is used as a secondary
    /// mobile key.
    ///
    /// ```
    /// # use flaghook::{ClientConfig, Error};
    /// let result = ClientConfig::from_mobile_key("primary-key")
    ///     .secondary_mobile_keys([("test", "primary-key")]);
    /// assert!(matches!(result, Err(Error::PrimaryKeyAsSecondary)));
    /// ```
    pub fn secondary_mobile_keys<K, V>(
        mut self,
        secondary_mobile_keys: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let secondary_mobile_keys = secondary_mobile_keys
            .into_iter()
            .map(|(name, key)| (name.into(), key.into()))
            .collect::<Vec<(String, String)>>();

        let mut names = HashSet::new();
        let mut keys = HashSet::new();
        for (name, key) in &secondary_mobile_keys {
            if name == PRIMARY_ENVIRONMENT_NAME {
                return Err(Error::ReservedEnvironmentName(name.clone()));
            }
            if key.is_empty() {
                return Err(Error::EmptyMobileKey(name.clone()));
            }
            if *key == self.mobile_key {
                return Err(Error::PrimaryKeyAsSecondary);
            }
            if !names.insert(name.as_str()) {
                return Err(Error::DuplicateEnvironmentName(name.clone()));
            }
            if !keys.insert(key.as_str()) {
                return Err(Error::DuplicateSecondaryKey);
            }
        }

        self.secondary_mobile_keys = secondary_mobile_keys;
        Ok(self)
    }

    /// Set plugins to register with every environment.
    ///
    /// Plugins are registered in the order given, and their hooks run in that order.
    pub fn plugins(mut self, plugins: Vec<Arc<dyn Plugin>>) -> Self {
        self.plugins = plugins;
        self
    }

    /// Set hooks to run around evaluations in every environment.
    ///
    /// These hooks run before the hooks supplied by plugins.
    pub fn hooks(mut self, hooks: Vec<Arc<dyn Hook>>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Set information about the application the client is embedded in.
    pub fn application_info(mut self, application_info: ApplicationInfo) -> Self {
        self.application_info = Some(application_info);
        self
    }

    /// Override SDK metadata reported to plugins. Defaults to
    /// [`SdkMetadata::for_current_platform`].
    pub fn sdk_metadata(mut self, sdk_metadata: SdkMetadata) -> Self {
        self.sdk_metadata = sdk_metadata;
        self
    }

    /// Create clients for all configured environments and register plugins with them.
    ///
    /// Plugin registration completes before this function returns. Plugin failures are logged and
    /// never prevent the clients from starting.
    ///
    /// ```
    /// # use flaghook::{ClientConfig, EvaluationContext};
    /// let clients = ClientConfig::from_mobile_key("mobile-key")
    ///     .start(EvaluationContext::new("user-1"));
    /// assert!(clients.primary().hooks().is_some());
    /// ```
    pub fn start(self, context: EvaluationContext) -> Clients {
        let ClientConfig {
            mobile_key,
            secondary_mobile_keys,
            plugins,
            hooks,
            application_info,
            sdk_metadata,
        } = self;

        if mobile_key.is_empty() {
            log::warn!(target: "flaghook", "primary mobile key is empty");
        }

        log::info!(target: "flaghook",
                   sdk_name = sdk_metadata.name,
                   sdk_version = sdk_metadata.version,
                   environments = 1 + secondary_mobile_keys.len(),
                   plugins = plugins.len(),
                   hooks = hooks.len();
                   "starting client");

        let primary = Client::new(PRIMARY_ENVIRONMENT_NAME, mobile_key, context.clone());
        let secondaries = secondary_mobile_keys
            .into_iter()
            .map(|(name, key)| Client::new(name, key, context.clone()))
            .collect();
        let clients = Clients::new(primary, secondaries);

        PluginRegistry::new(sdk_metadata, application_info, plugins, hooks).register(&clients);

        clients
    }
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Mobile keys are credentials and are left out.
        f.debug_struct("ClientConfig")
            .field(
                "secondary_environments",
                &self
                    .secondary_mobile_keys
                    .iter()
                    .map(|(name, _)| name)
                    .collect::<Vec<_>>(),
            )
            .field("plugins", &self.plugins.len())
            .field("hooks", &self.hooks.len())
            .field("application_info", &self.application_info)
            .field("sdk_metadata", &self.sdk_metadata)
            .finish_non_exhaustive()
    }
}
