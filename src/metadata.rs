//! Descriptive records handed to plugins and hooks.
use serde::Serialize;

/// Metadata about the SDK: its name and version.
///
/// Created once per client configuration and shared by all environments of that client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SdkMetadata {
    /// Name of the SDK for informational purposes such as logging.
    pub name: &'static str,
    /// Version of the SDK for informational purposes such as logging.
    pub version: &'static str,
}

impl SdkMetadata {
    /// Create SDK metadata with the given name and version.
    pub const fn new(name: &'static str, version: &'static str) -> SdkMetadata {
        SdkMetadata { name, version }
    }

    /// SDK metadata named after the platform this crate was compiled for.
    ///
    /// ```
    /// # use flaghook::SdkMetadata;
    /// let meta = SdkMetadata::for_current_platform();
    /// assert_eq!(meta.version, env!("CARGO_PKG_VERSION"));
    /// ```
    pub fn for_current_platform() -> SdkMetadata {
        SdkMetadata {
            name: platform_name(std::env::consts::OS),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}

impl Default for SdkMetadata {
    fn default() -> Self {
        SdkMetadata::for_current_platform()
    }
}

fn platform_name(os: &'static str) -> &'static str {
    match os {
        "ios" => "iOS",
        "macos" => "macOS",
        "tvos" => "tvOS",
        "watchos" => "watchOS",
        "android" => "Android",
        "linux" => "Linux",
        "windows" => "Windows",
        other => other,
    }
}

/// Metadata used for annotating plugin implementations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PluginMetadata {
    name: String,
}

impl PluginMetadata {
    /// Create plugin metadata.
    pub fn new(name: impl Into<String>) -> PluginMetadata {
        PluginMetadata { name: name.into() }
    }

    /// The name of the plugin.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Metadata used for annotating hook implementations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HookMetadata {
    name: String,
}

impl HookMetadata {
    /// Create hook metadata.
    pub fn new(name: impl Into<String>) -> HookMetadata {
        HookMetadata { name: name.into() }
    }

    /// The name of the hook.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Identity of the application the client is embedded in.
///
/// Values must be at most 64 characters made of ASCII letters, digits, `.`, `_` and `-`. Invalid
/// values are logged and ignored, leaving the field unset.
///
/// ```
/// # use flaghook::ApplicationInfo;
/// let info = ApplicationInfo::new()
///     .application_id("com.example.app")
///     .application_version("1.2.3");
/// assert_eq!(info.get_application_id(), Some("com.example.app"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    application_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    application_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    application_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    application_version_name: Option<String>,
}

const MAX_APPLICATION_VALUE_LEN: usize = 64;

impl ApplicationInfo {
    /// Create an empty `ApplicationInfo`.
    pub fn new() -> ApplicationInfo {
        ApplicationInfo::default()
    }

    /// Set the unique identifier of the application.
    pub fn application_id(mut self, value: impl Into<String>) -> Self {
        self.application_id = sanitize("applicationId", value.into());
        self
    }

    /// Set the human-friendly name of the application.
    pub fn application_name(mut self, value: impl Into<String>) -> Self {
        self.application_name = sanitize("applicationName", value.into());
        self
    }

    /// Set the version of the application.
    pub fn application_version(mut self, value: impl Into<String>) -> Self {
        self.application_version = sanitize("applicationVersion", value.into());
        self
    }

    /// Set the human-friendly version name of the application.
    pub fn application_version_name(mut self, value: impl Into<String>) -> Self {
        self.application_version_name = sanitize("applicationVersionName", value.into());
        self
    }

    #[allow(missing_docs)]
    pub fn get_application_id(&self) -> Option<&str> {
        self.application_id.as_deref()
    }

    #[allow(missing_docs)]
    pub fn get_application_name(&self) -> Option<&str> {
        self.application_name.as_deref()
    }

    #[allow(missing_docs)]
    pub fn get_application_version(&self) -> Option<&str> {
        self.application_version.as_deref()
    }

    #[allow(missing_docs)]
    pub fn get_application_version_name(&self) -> Option<&str> {
        self.application_version_name.as_deref()
    }
}

fn sanitize(field: &'static str, value: String) -> Option<String> {
    let valid = !value.is_empty()
        && value.len() <= MAX_APPLICATION_VALUE_LEN
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Some(value)
    } else {
        log::warn!(target: "flaghook", field, value:display = value; "ignoring invalid application info value");
        None
    }
}

/// Metadata about the environment that flag evaluations are performed in.
///
/// There is exactly one `EnvironmentMetadata` per credential configured on a client. It is created
/// while plugins are registered and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentMetadata {
    application_info: Option<ApplicationInfo>,
    sdk_metadata: SdkMetadata,
    credential: String,
}

impl EnvironmentMetadata {
    /// Create environment metadata.
    pub fn new(
        application_info: Option<ApplicationInfo>,
        sdk_metadata: SdkMetadata,
        credential: impl Into<String>,
    ) -> EnvironmentMetadata {
        EnvironmentMetadata {
            application_info,
            sdk_metadata,
            credential: credential.into(),
        }
    }

    /// Application information for the application this SDK is used in.
    pub fn application_info(&self) -> Option<&ApplicationInfo> {
        self.application_info.as_ref()
    }

    /// SDK metadata.
    pub fn sdk_metadata(&self) -> &SdkMetadata {
        &self.sdk_metadata
    }

    /// Credential used to authenticate against this environment.
    pub fn credential(&self) -> &str {
        &self.credential
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_names() {
        assert_eq!(platform_name("ios"), "iOS");
        assert_eq!(platform_name("macos"), "macOS");
        assert_eq!(platform_name("linux"), "Linux");
        assert_eq!(platform_name("freebsd"), "freebsd");
    }

    #[test]
    fn default_sdk_metadata_is_computed_from_platform() {
        let meta = SdkMetadata::default();
        assert_eq!(meta, SdkMetadata::for_current_platform());
        assert_eq!(meta.name, platform_name(std::env::consts::OS));
    }

    #[test]
    fn application_info_accepts_valid_values() {
        let info = ApplicationInfo::new()
            .application_id("com.example.app")
            .application_name("Example_App")
            .application_version("1.0.0-beta")
            .application_version_name("v1");

        assert_eq!(info.get_application_id(), Some("com.example.app"));
        assert_eq!(info.get_application_name(), Some("Example_App"));
        assert_eq!(info.get_application_version(), Some("1.0.0-beta"));
        assert_eq!(info.get_application_version_name(), Some("v1"));
    }

    #[test]
    fn application_info_ignores_invalid_values() {
        let info = ApplicationInfo::new()
            .application_id("has spaces")
            .application_name("")
            .application_version("x".repeat(65))
            .application_version_name("ok");

        assert_eq!(info.get_application_id(), None);
        assert_eq!(info.get_application_name(), None);
        assert_eq!(info.get_application_version(), None);
        assert_eq!(info.get_application_version_name(), Some("ok"));
    }

    #[test]
    fn invalid_update_clears_application_info_value() {
        let info = ApplicationInfo::new()
            .application_id("valid")
            .application_id("not valid!");
        assert_eq!(info.get_application_id(), None);
    }

    #[test]
    fn application_info_serializes_set_fields_only() {
        let info = ApplicationInfo::new().application_id("app");
        assert_eq!(
            serde_json::to_value(&info).unwrap(),
            serde_json::json!({"applicationId": "app"})
        );
    }

    #[test]
    fn environment_metadata_accessors() {
        let meta = EnvironmentMetadata::new(
            Some(ApplicationInfo::new().application_id("app")),
            SdkMetadata::new("test-sdk", "1.0.0"),
            "mobile-key",
        );
        assert_eq!(meta.credential(), "mobile-key");
        assert_eq!(meta.sdk_metadata().name, "test-sdk");
        assert_eq!(meta.sdk_metadata().version, "1.0.0");
        assert_eq!(
            meta.application_info().and_then(|it| it.get_application_id()),
            Some("app")
        );
    }

    #[test]
    fn plugin_and_hook_metadata_names() {
        assert_eq!(PluginMetadata::new("my-plugin").name(), "my-plugin");
        assert_eq!(HookMetadata::new("my-hook").name(), "my-hook");
    }
}
