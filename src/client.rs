use std::sync::{Arc, OnceLock, RwLock};

#[cfg(doc)]
use crate::ClientConfig;
use crate::{
    eval, flag_store::FlagStore, EnvironmentMetadata, EvaluationContext, EvaluationDetail,
    EvaluationMethod, EvaluationSeriesContext, FlagValue, HookRunner,
};

/// Name of the environment identified by the primary mobile key.
pub const PRIMARY_ENVIRONMENT_NAME: &str = "default";

/// A client evaluating flags in one environment.
///
/// Clients are created by [`ClientConfig::start`], one per configured mobile key. `Client` is
/// cheap to clone and can be shared between threads.
///
/// Every variation call runs the hooks registered for the environment: `before_evaluation` of all
/// hooks in registration order, then the evaluation, then `after_evaluation` in reverse order.
///
/// # Examples
/// ```
/// # use flaghook::{ClientConfig, EvaluationContext};
/// let clients = ClientConfig::from_mobile_key("mobile-key").start(EvaluationContext::new("user-1"));
/// let client = clients.primary();
///
/// // No flag values received yet: the default value is served.
/// assert_eq!(client.bool_variation("a-boolean-flag", false), false);
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    environment_name: String,
    mobile_key: String,
    flag_store: FlagStore,
    context: RwLock<EvaluationContext>,
    /// Set once, when plugins have been registered for this environment.
    registration: OnceLock<Registration>,
}

struct Registration {
    metadata: EnvironmentMetadata,
    hooks: HookRunner,
}

impl Client {
    pub(crate) fn new(
        environment_name: impl Into<String>,
        mobile_key: impl Into<String>,
        context: EvaluationContext,
    ) -> Client {
        Client {
            inner: Arc::new(ClientInner {
                environment_name: environment_name.into(),
                mobile_key: mobile_key.into(),
                flag_store: FlagStore::new(),
                context: RwLock::new(context),
                registration: OnceLock::new(),
            }),
        }
    }

    /// Name of the environment this client evaluates flags in. The primary environment is named
    /// [`PRIMARY_ENVIRONMENT_NAME`].
    pub fn environment_name(&self) -> &str {
        &self.inner.environment_name
    }

    pub(crate) fn mobile_key(&self) -> &str {
        &self.inner.mobile_key
    }

    /// Metadata of this environment, as passed to plugins. `None` until plugin registration for
    /// this environment has completed.
    pub fn environment_metadata(&self) -> Option<&EnvironmentMetadata> {
        self.inner.registration.get().map(|it| &it.metadata)
    }

    /// Hooks run around evaluations in this environment. `None` until plugin registration for
    /// this environment has completed.
    pub fn hooks(&self) -> Option<&HookRunner> {
        self.inner.registration.get().map(|it| &it.hooks)
    }

    pub(crate) fn is_registered(&self) -> bool {
        self.inner.registration.get().is_some()
    }

    /// Publish the outcome of plugin registration. Returns `false` (leaving the current hooks in
    /// place) if registration has already completed for this environment.
    pub(crate) fn install_hooks(&self, metadata: EnvironmentMetadata, hooks: HookRunner) -> bool {
        self.inner
            .registration
            .set(Registration { metadata, hooks })
            .is_ok()
    }

    /// Store receiving flag values for this environment.
    pub fn flag_store(&self) -> &FlagStore {
        &self.inner.flag_store
    }

    /// Context flags are currently evaluated for.
    pub fn context(&self) -> EvaluationContext {
        self.inner
            .context
            .read()
            .expect("thread holding context lock should not panic")
            .clone()
    }

    /// Switch to a different evaluation context.
    ///
    /// Flag values in the store are evaluated for a specific context, so the data-acquisition
    /// component is expected to replace them after calling `identify`.
    pub fn identify(&self, context: EvaluationContext) {
        log::debug!(target: "flaghook",
                    environment = self.environment_name(),
                    context_key = context.key();
                    "identifying new context");
        *self
            .inner
            .context
            .write()
            .expect("thread holding context lock should not panic") = context;
    }

    /// Returns the boolean value of a flag, or `default_value` if the flag cannot be evaluated
    /// as a boolean.
    pub fn bool_variation(&self, flag_key: &str, default_value: bool) -> bool {
        self.bool_variation_inner(flag_key, default_value, EvaluationMethod::BoolVariation)
            .value
    }

    /// Same as [`Client::bool_variation`] but also returns evaluation details.
    pub fn bool_variation_detail(
        &self,
        flag_key: &str,
        default_value: bool,
    ) -> EvaluationDetail<bool> {
        self.bool_variation_inner(flag_key, default_value, EvaluationMethod::BoolVariationDetail)
    }

    /// Returns the string value of a flag, or `default_value` if the flag cannot be evaluated as
    /// a string.
    pub fn string_variation(&self, flag_key: &str, default_value: impl Into<String>) -> String {
        self.string_variation_inner(flag_key, default_value.into(), EvaluationMethod::StringVariation)
            .value
    }

    /// Same as [`Client::string_variation`] but also returns evaluation details.
    pub fn string_variation_detail(
        &self,
        flag_key: &str,
        default_value: impl Into<String>,
    ) -> EvaluationDetail<String> {
        self.string_variation_inner(
            flag_key,
            default_value.into(),
            EvaluationMethod::StringVariationDetail,
        )
    }

    /// Returns the integer value of a flag, or `default_value` if the flag cannot be evaluated as
    /// an integer. Numeric values without a fractional part are served as integers.
    pub fn int_variation(&self, flag_key: &str, default_value: i64) -> i64 {
        self.int_variation_inner(flag_key, default_value, EvaluationMethod::IntVariation)
            .value
    }

    /// Same as [`Client::int_variation`] but also returns evaluation details.
    pub fn int_variation_detail(&self, flag_key: &str, default_value: i64) -> EvaluationDetail<i64> {
        self.int_variation_inner(flag_key, default_value, EvaluationMethod::IntVariationDetail)
    }

    /// Returns the numeric value of a flag, or `default_value` if the flag cannot be evaluated as
    /// a number. Integer values are served as numbers.
    pub fn double_variation(&self, flag_key: &str, default_value: f64) -> f64 {
        self.double_variation_inner(flag_key, default_value, EvaluationMethod::DoubleVariation)
            .value
    }

    /// Same as [`Client::double_variation`] but also returns evaluation details.
    pub fn double_variation_detail(
        &self,
        flag_key: &str,
        default_value: f64,
    ) -> EvaluationDetail<f64> {
        self.double_variation_inner(
            flag_key,
            default_value,
            EvaluationMethod::DoubleVariationDetail,
        )
    }

    /// Returns the value of a flag as JSON. Values of any type can be served as JSON.
    pub fn json_variation(
        &self,
        flag_key: &str,
        default_value: serde_json::Value,
    ) -> serde_json::Value {
        self.json_variation_inner(flag_key, default_value, EvaluationMethod::JsonVariation)
            .value
    }

    /// Same as [`Client::json_variation`] but also returns evaluation details.
    pub fn json_variation_detail(
        &self,
        flag_key: &str,
        default_value: serde_json::Value,
    ) -> EvaluationDetail<serde_json::Value> {
        self.json_variation_inner(flag_key, default_value, EvaluationMethod::JsonVariationDetail)
    }

    fn bool_variation_inner(
        &self,
        flag_key: &str,
        default_value: bool,
        method: EvaluationMethod,
    ) -> EvaluationDetail<bool> {
        self.evaluate(flag_key, default_value.into(), method)
            .map(|value| value.as_boolean().unwrap_or(default_value))
    }

    fn string_variation_inner(
        &self,
        flag_key: &str,
        default_value: String,
        method: EvaluationMethod,
    ) -> EvaluationDetail<String> {
        self.evaluate(flag_key, default_value.clone().into(), method)
            .map(|value| match value {
                FlagValue::String(s) => s,
                _ => default_value,
            })
    }

    fn int_variation_inner(
        &self,
        flag_key: &str,
        default_value: i64,
        method: EvaluationMethod,
    ) -> EvaluationDetail<i64> {
        self.evaluate(flag_key, default_value.into(), method)
            .map(|value| value.as_integer().unwrap_or(default_value))
    }

    fn double_variation_inner(
        &self,
        flag_key: &str,
        default_value: f64,
        method: EvaluationMethod,
    ) -> EvaluationDetail<f64> {
        self.evaluate(flag_key, default_value.into(), method)
            .map(|value| value.as_numeric().unwrap_or(default_value))
    }

    fn json_variation_inner(
        &self,
        flag_key: &str,
        default_value: serde_json::Value,
        method: EvaluationMethod,
    ) -> EvaluationDetail<serde_json::Value> {
        self.evaluate(flag_key, default_value.into(), method)
            .map(|value| value.to_json())
    }

    /// Evaluate a flag, running the environment hooks around the evaluation.
    fn evaluate(
        &self,
        flag_key: &str,
        default_value: FlagValue,
        method: EvaluationMethod,
    ) -> EvaluationDetail<FlagValue> {
        let series_context =
            EvaluationSeriesContext::new(flag_key, self.context(), default_value, method);

        let evaluate = |series_context: &EvaluationSeriesContext| {
            let flags = self.inner.flag_store.get_flags();
            eval::evaluate(
                flags.as_deref(),
                series_context.flag_key(),
                series_context.default_value(),
                series_context.method().value_type(),
            )
        };

        match self.hooks() {
            Some(hooks) => hooks.run(&series_context, evaluate),
            // Evaluations from inside `Plugin::register` happen before hooks are installed.
            None => evaluate(&series_context),
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The mobile key is a credential and is left out on purpose.
        f.debug_struct("Client")
            .field("environment_name", &self.inner.environment_name)
            .field("hooks", &self.hooks())
            .finish_non_exhaustive()
    }
}

/// Clients for all environments configured in a [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct Clients {
    primary: Client,
    secondaries: Vec<Client>,
}

impl Clients {
    pub(crate) fn new(primary: Client, secondaries: Vec<Client>) -> Clients {
        Clients {
            primary,
            secondaries,
        }
    }

    /// Client of the primary environment.
    pub fn primary(&self) -> &Client {
        &self.primary
    }

    /// Client of the environment named `environment_name`.
    ///
    /// ```
    /// # use flaghook::{ClientConfig, EvaluationContext, PRIMARY_ENVIRONMENT_NAME};
    /// let clients = ClientConfig::from_mobile_key("primary-key")
    ///     .secondary_mobile_keys([("staging", "staging-key")])
    ///     .unwrap()
    ///     .start(EvaluationContext::new("user-1"));
    ///
    /// assert!(clients.get("staging").is_some());
    /// assert!(clients.get(PRIMARY_ENVIRONMENT_NAME).is_some());
    /// assert!(clients.get("production").is_none());
    /// ```
    pub fn get(&self, environment_name: &str) -> Option<&Client> {
        self.iter()
            .find(|client| client.environment_name() == environment_name)
    }

    /// All clients, primary first, then secondaries in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &Client> {
        std::iter::once(&self.primary).chain(self.secondaries.iter())
    }

    /// Number of environments.
    pub fn len(&self) -> usize {
        1 + self.secondaries.len()
    }

    /// Always `false`: there is at least the primary environment.
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl<'a> IntoIterator for &'a Clients {
    type Item = &'a Client;
    type IntoIter = std::iter::Chain<std::iter::Once<&'a Client>, std::slice::Iter<'a, Client>>;

    fn into_iter(self) -> Self::IntoIter {
        std::iter::once(&self.primary).chain(self.secondaries.iter())
    }
}
