use std::sync::Arc;

use crate::{
    error::{guarded, EvaluationStage},
    Error, EvaluationDetail, EvaluationSeriesContext, EvaluationSeriesData, FlagValue, Hook,
};

const UNKNOWN_HOOK_NAME: &str = "unknown hook";

struct RegisteredHook {
    /// Name reported by the hook metadata, captured once so that failures can be logged without
    /// calling back into the hook.
    name: String,
    hook: Arc<dyn Hook>,
}

/// Runs the hooks of one environment around each evaluation.
///
/// The hook list is fixed when the runner is created and is shared (without locking) by all
/// concurrent evaluations.
#[derive(Clone)]
pub struct HookRunner {
    hooks: Arc<[RegisteredHook]>,
}

impl Default for HookRunner {
    fn default() -> Self {
        HookRunner::new(Vec::new())
    }
}

impl HookRunner {
    /// Create a runner executing `hooks` in the given order.
    pub fn new(hooks: Vec<Arc<dyn Hook>>) -> HookRunner {
        let hooks = hooks
            .into_iter()
            .map(|hook| {
                let name = guarded(|| Ok(hook.metadata().name().to_owned())).unwrap_or_else(|err| {
                    log::warn!(target: "flaghook", error:display = err; "unable to get hook metadata");
                    UNKNOWN_HOOK_NAME.to_owned()
                });
                RegisteredHook { name, hook }
            })
            .collect::<Vec<_>>();

        HookRunner {
            hooks: hooks.into(),
        }
    }

    /// Number of hooks.
    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    /// Returns `true` if there are no hooks.
    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Names of the hooks in execution order of the before stage.
    pub fn hook_names(&self) -> impl Iterator<Item = &str> {
        self.hooks.iter().map(|it| it.name.as_str())
    }

    /// Run `evaluate` wrapped in the before and after stages of all hooks.
    ///
    /// Hook failures never affect the returned detail.
    pub fn run(
        &self,
        series_context: &EvaluationSeriesContext,
        evaluate: impl FnOnce(&EvaluationSeriesContext) -> EvaluationDetail<FlagValue>,
    ) -> EvaluationDetail<FlagValue> {
        if self.hooks.is_empty() {
            return evaluate(series_context);
        }
        self.run_with_series_data(series_context, evaluate).0
    }

    /// Same as [`HookRunner::run`] but also returns the series data produced by the last executed
    /// hook.
    pub fn run_with_series_data(
        &self,
        series_context: &EvaluationSeriesContext,
        evaluate: impl FnOnce(&EvaluationSeriesContext) -> EvaluationDetail<FlagValue>,
    ) -> (EvaluationDetail<FlagValue>, EvaluationSeriesData) {
        let series_data = self.before_evaluation(series_context, EvaluationSeriesData::new());
        let detail = evaluate(series_context);
        let series_data = self.after_evaluation(series_context, series_data, &detail);
        (detail, series_data)
    }

    fn before_evaluation(
        &self,
        series_context: &EvaluationSeriesContext,
        series_data: EvaluationSeriesData,
    ) -> EvaluationSeriesData {
        self.hooks.iter().fold(series_data, |data, registered| {
            let result = guarded(|| registered.hook.before_evaluation(series_context, &data));
            self.keep_on_failure(
                registered,
                EvaluationStage::BeforeEvaluation,
                series_context,
                data,
                result,
            )
        })
    }

    fn after_evaluation(
        &self,
        series_context: &EvaluationSeriesContext,
        series_data: EvaluationSeriesData,
        detail: &EvaluationDetail<FlagValue>,
    ) -> EvaluationSeriesData {
        // Reverse order, so the first hook wraps all the others.
        self.hooks.iter().rev().fold(series_data, |data, registered| {
            let result =
                guarded(|| registered.hook.after_evaluation(series_context, &data, detail));
            self.keep_on_failure(
                registered,
                EvaluationStage::AfterEvaluation,
                series_context,
                data,
                result,
            )
        })
    }

    /// Returns the data produced by the hook, or `previous` if the hook failed.
    fn keep_on_failure(
        &self,
        registered: &RegisteredHook,
        stage: EvaluationStage,
        series_context: &EvaluationSeriesContext,
        previous: EvaluationSeriesData,
        result: Result<EvaluationSeriesData, crate::ExtensionFailure>,
    ) -> EvaluationSeriesData {
        match result {
            Ok(data) => data,
            Err(source) => {
                let err = Error::HookExecutionFailure {
                    hook: registered.name.clone(),
                    stage,
                    flag_key: series_context.flag_key().to_owned(),
                    source,
                };
                log::warn!(target: "flaghook",
                           hook:display = registered.name,
                           stage:display = stage,
                           flag_key = series_context.flag_key();
                           "{}: {}", err, source_of(&err));
                previous
            }
        }
    }
}

fn source_of(err: &Error) -> String {
    std::error::Error::source(err)
        .map(|source| source.to_string())
        .unwrap_or_default()
}

impl std::fmt::Debug for HookRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.hook_names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::HookRunner;
    use crate::{
        BoxError, EvaluationContext, EvaluationDetail, EvaluationMethod, EvaluationReason,
        EvaluationSeriesContext, EvaluationSeriesData, FlagValue, Hook, HookMetadata, HookResult,
    };

    /// Append-only record of hook calls shared by the hooks of a test.
    #[derive(Clone, Default)]
    struct CallRecord(Arc<Mutex<Vec<String>>>);

    impl CallRecord {
        fn push(&self, entry: String) {
            self.0.lock().unwrap().push(entry);
        }

        fn entries(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    #[derive(Clone, Copy, PartialEq)]
    enum Failure {
        None,
        Error,
        Panic,
    }

    struct RecordingHook {
        name: &'static str,
        record: CallRecord,
        before_failure: Failure,
        after_failure: Failure,
    }

    impl RecordingHook {
        fn new(name: &'static str, record: &CallRecord) -> Self {
            RecordingHook {
                name,
                record: record.clone(),
                before_failure: Failure::None,
                after_failure: Failure::None,
            }
        }

        fn failing_before(mut self, failure: Failure) -> Self {
            self.before_failure = failure;
            self
        }

        fn failing_after(mut self, failure: Failure) -> Self {
            self.after_failure = failure;
            self
        }

        fn fail(&self, failure: Failure) -> Result<(), BoxError> {
            match failure {
                Failure::None => Ok(()),
                Failure::Error => Err(format!("{} failed", self.name).into()),
                Failure::Panic => panic!("{} panicked", self.name),
            }
        }

        /// Appends this hook's name to the "trail" entry of `data`.
        fn extend_trail(&self, data: &EvaluationSeriesData, stage: &str) -> EvaluationSeriesData {
            let mut trail = data.get::<Vec<String>>("trail").cloned().unwrap_or_default();
            trail.push(format!("{} {}", self.name, stage));
            data.with("trail", trail)
        }
    }

    impl Hook for RecordingHook {
        fn metadata(&self) -> HookMetadata {
            HookMetadata::new(self.name)
        }

        fn before_evaluation(
            &self,
            _series_context: &EvaluationSeriesContext,
            series_data: &EvaluationSeriesData,
        ) -> HookResult {
            self.record.push(format!("{} before", self.name));
            self.fail(self.before_failure)?;
            Ok(self.extend_trail(series_data, "before"))
        }

        fn after_evaluation(
            &self,
            _series_context: &EvaluationSeriesContext,
            series_data: &EvaluationSeriesData,
            _evaluation_detail: &EvaluationDetail<FlagValue>,
        ) -> HookResult {
            self.record.push(format!("{} after", self.name));
            self.fail(self.after_failure)?;
            Ok(self.extend_trail(series_data, "after"))
        }
    }

    fn series_context() -> EvaluationSeriesContext {
        EvaluationSeriesContext::new(
            "test-flag",
            EvaluationContext::new("user-key"),
            false.into(),
            EvaluationMethod::BoolVariation,
        )
    }

    fn served_true(_: &EvaluationSeriesContext) -> EvaluationDetail<FlagValue> {
        EvaluationDetail {
            value: FlagValue::Boolean(true),
            variation_index: Some(0),
            reason: Some(EvaluationReason::Fallthrough),
        }
    }

    fn trail(data: &EvaluationSeriesData) -> Vec<String> {
        data.get::<Vec<String>>("trail").cloned().unwrap_or_default()
    }

    #[test]
    fn two_hooks_nest() {
        let record = CallRecord::default();
        let runner = HookRunner::new(vec![
            Arc::new(RecordingHook::new("first", &record)),
            Arc::new(RecordingHook::new("second", &record)),
        ]);

        let detail = runner.run(&series_context(), served_true);

        assert_eq!(detail.value, FlagValue::Boolean(true));
        assert_eq!(
            record.entries(),
            vec!["first before", "second before", "second after", "first after"]
        );
    }

    #[test]
    fn many_hooks_nest() {
        let record = CallRecord::default();
        let names = ["h1", "h2", "h3", "h4", "h5"];
        let runner = HookRunner::new(
            names
                .iter()
                .map(|&name| Arc::new(RecordingHook::new(name, &record)) as Arc<dyn Hook>)
                .collect(),
        );

        runner.run(&series_context(), served_true);

        let expected = names
            .iter()
            .map(|name| format!("{} before", name))
            .chain(names.iter().rev().map(|name| format!("{} after", name)))
            .collect::<Vec<_>>();
        assert_eq!(record.entries(), expected);
    }

    #[test]
    fn evaluation_runs_between_stages() {
        let record = CallRecord::default();
        let runner = HookRunner::new(vec![Arc::new(RecordingHook::new("only", &record))]);

        runner.run(&series_context(), |ctx| {
            record.push(format!("evaluate {}", ctx.flag_key()));
            served_true(ctx)
        });

        assert_eq!(
            record.entries(),
            vec!["only before", "evaluate test-flag", "only after"]
        );
    }

    #[test]
    fn data_is_threaded_through_before_and_after_stages() {
        let record = CallRecord::default();
        let runner = HookRunner::new(vec![
            Arc::new(RecordingHook::new("first", &record)),
            Arc::new(RecordingHook::new("second", &record)),
        ]);

        let (_, data) = runner.run_with_series_data(&series_context(), served_true);

        assert_eq!(
            trail(&data),
            vec!["first before", "second before", "second after", "first after"]
        );
    }

    #[test]
    fn failing_before_hook_is_identity() {
        for failure in [Failure::Error, Failure::Panic] {
            let record = CallRecord::default();
            let runner = HookRunner::new(vec![
                Arc::new(RecordingHook::new("first", &record)),
                Arc::new(RecordingHook::new("broken", &record).failing_before(failure)),
                Arc::new(RecordingHook::new("third", &record)),
            ]);

            let (detail, data) = runner.run_with_series_data(&series_context(), served_true);

            assert_eq!(detail.value, FlagValue::Boolean(true));
            assert_eq!(
                record.entries(),
                vec![
                    "first before",
                    "broken before",
                    "third before",
                    "third after",
                    "broken after",
                    "first after"
                ]
            );
            assert_eq!(
                trail(&data),
                vec![
                    "first before",
                    "third before",
                    "third after",
                    "broken after",
                    "first after"
                ]
            );
        }
    }

    #[test]
    fn failing_after_hook_is_identity() {
        for failure in [Failure::Error, Failure::Panic] {
            let record = CallRecord::default();
            let runner = HookRunner::new(vec![
                Arc::new(RecordingHook::new("first", &record)),
                Arc::new(RecordingHook::new("broken", &record).failing_after(failure)),
            ]);

            let (detail, data) = runner.run_with_series_data(&series_context(), served_true);

            assert_eq!(detail.value, FlagValue::Boolean(true));
            assert_eq!(
                record.entries(),
                vec!["first before", "broken before", "broken after", "first after"]
            );
            assert_eq!(
                trail(&data),
                vec!["first before", "broken before", "first after"]
            );
        }
    }

    #[test]
    fn hook_failing_everywhere_does_not_stop_others() {
        let record = CallRecord::default();
        let runner = HookRunner::new(vec![
            Arc::new(
                RecordingHook::new("broken", &record)
                    .failing_before(Failure::Panic)
                    .failing_after(Failure::Error),
            ),
            Arc::new(RecordingHook::new("healthy", &record)),
        ]);

        let (detail, data) = runner.run_with_series_data(&series_context(), served_true);

        assert_eq!(detail.variation_index, Some(0));
        assert_eq!(trail(&data), vec!["healthy before", "healthy after"]);
    }

    #[test]
    fn no_hooks_just_evaluates() {
        let runner = HookRunner::default();
        assert!(runner.is_empty());

        let (detail, data) = runner.run_with_series_data(&series_context(), served_true);
        assert_eq!(detail.value, FlagValue::Boolean(true));
        assert!(data.is_empty());
    }

    struct BrokenMetadataHook;

    impl Hook for BrokenMetadataHook {
        fn metadata(&self) -> HookMetadata {
            panic!("no metadata")
        }
    }

    #[test]
    fn hook_names_are_captured_once() {
        let record = CallRecord::default();
        let runner = HookRunner::new(vec![
            Arc::new(RecordingHook::new("named", &record)),
            Arc::new(BrokenMetadataHook),
        ]);

        assert_eq!(runner.len(), 2);
        assert_eq!(
            runner.hook_names().collect::<Vec<_>>(),
            vec!["named", "unknown hook"]
        );
        assert_eq!(format!("{:?}", runner), r#"["named", "unknown hook"]"#);

        // A hook whose metadata panics still runs.
        let detail = runner.run(&series_context(), served_true);
        assert_eq!(detail.value, FlagValue::Boolean(true));
    }

    #[test]
    fn concurrent_evaluations_share_the_runner() {
        let record = CallRecord::default();
        let runner = HookRunner::new(vec![
            Arc::new(RecordingHook::new("first", &record)),
            Arc::new(RecordingHook::new("second", &record)),
        ]);

        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..25 {
                        let (_, data) =
                            runner.run_with_series_data(&series_context(), served_true);
                        assert_eq!(
                            trail(&data),
                            vec!["first before", "second before", "second after", "first after"]
                        );
                    }
                });
            }
        });

        assert_eq!(record.entries().len(), 8 * 25 * 4);
    }
}
