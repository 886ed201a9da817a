use std::{collections::HashMap, sync::Arc, time::Instant};

use flaghook::{
    BoxError, Client, ClientConfig, EnvironmentMetadata, EvaluationContext, EvaluationDetail,
    EvaluationSeriesContext, EvaluationSeriesData, FeatureFlag, FlagValue, Hook, HookMetadata,
    HookResult, Plugin, PluginMetadata,
};

/// Prints every evaluation together with the time it took.
struct TimingHook {
    environment: String,
}

impl Hook for TimingHook {
    fn metadata(&self) -> HookMetadata {
        HookMetadata::new("timing-hook")
    }

    fn before_evaluation(
        &self,
        _series_context: &EvaluationSeriesContext,
        series_data: &EvaluationSeriesData,
    ) -> HookResult {
        Ok(series_data.with("started", Instant::now()))
    }

    fn after_evaluation(
        &self,
        series_context: &EvaluationSeriesContext,
        series_data: &EvaluationSeriesData,
        evaluation_detail: &EvaluationDetail<FlagValue>,
    ) -> HookResult {
        let elapsed = series_data.get::<Instant>("started").map(Instant::elapsed);
        println!(
            "[{}] {}({}) = {:?} ({:?}) in {:?}",
            self.environment,
            series_context.method(),
            series_context.flag_key(),
            evaluation_detail.value,
            evaluation_detail.reason,
            elapsed
        );
        Ok(series_data.clone())
    }
}

struct TimingPlugin;

impl Plugin for TimingPlugin {
    fn get_metadata(&self) -> PluginMetadata {
        PluginMetadata::new("timing-plugin")
    }

    fn register(&self, client: &Client, metadata: &EnvironmentMetadata) -> Result<(), BoxError> {
        println!(
            "Registering with environment {:?} ({} {})",
            client.environment_name(),
            metadata.sdk_metadata().name,
            metadata.sdk_metadata().version
        );
        Ok(())
    }

    fn get_hooks(&self, metadata: &EnvironmentMetadata) -> Result<Vec<Arc<dyn Hook>>, BoxError> {
        Ok(vec![Arc::new(TimingHook {
            // Never print the credential itself.
            environment: format!("{} chars key", metadata.credential().len()),
        })])
    }
}

pub fn main() -> flaghook::Result<()> {
    // Configure env_logger to see SDK logs.
    env_logger::Builder::from_env(env_logger::Env::new().default_filter_or("flaghook")).init();

    let mobile_key = std::env::var("FLAGHOOK_MOBILE_KEY").unwrap_or_else(|_| "mobile-key".to_owned());
    let clients = ClientConfig::from_mobile_key(mobile_key)
        .secondary_mobile_keys([("staging", "staging-mobile-key")])?
        .plugins(vec![Arc::new(TimingPlugin)])
        .start(EvaluationContext::new("test-subject").attribute("country", "NZ"));

    // Flag values would normally be delivered by the data source.
    clients.primary().flag_store().set_flags(HashMap::from([(
        "a-boolean-flag".to_owned(),
        FeatureFlag::new(true).with_variation(0),
    )]));

    for client in &clients {
        let assignment = client.bool_variation("a-boolean-flag", false);
        println!("Assignment in {}: {:?}", client.environment_name(), assignment);
    }

    Ok(())
}
