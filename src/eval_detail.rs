use serde::Serialize;

/// Result of a flag evaluation along with the information on how it was produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationDetail<T> {
    /// Value served to the caller. This is the default value when the evaluation failed.
    pub value: T,
    /// Index of the served variation. `None` when the default value was served.
    pub variation_index: Option<i64>,
    /// Why this value was served, if known.
    pub reason: Option<EvaluationReason>,
}

impl<T> EvaluationDetail<T> {
    /// A detail that serves `default` because of an error.
    pub fn error(default: T, error_kind: ErrorKind) -> Self {
        EvaluationDetail {
            value: default,
            variation_index: None,
            reason: Some(EvaluationReason::Error { error_kind }),
        }
    }

    /// Map `EvaluationDetail.value` using the `f` function.
    pub fn map<T2, F: FnOnce(T) -> T2>(self, f: F) -> EvaluationDetail<T2> {
        EvaluationDetail {
            value: f(self.value),
            variation_index: self.variation_index,
            reason: self.reason,
        }
    }

    /// Error kind if the evaluation failed.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self.reason {
            Some(EvaluationReason::Error { error_kind }) => Some(error_kind),
            _ => None,
        }
    }
}

/// Describes why a flag was evaluated to its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvaluationReason {
    /// The flag was off.
    Off,
    /// No rule or target matched, the fallthrough variation was served.
    Fallthrough,
    /// The context was targeted individually.
    TargetMatch,
    /// The context matched one of the flag rules.
    #[serde(rename_all = "camelCase")]
    RuleMatch {
        #[allow(missing_docs)]
        rule_index: usize,
        #[allow(missing_docs)]
        rule_id: Option<String>,
    },
    /// A prerequisite flag did not return the required variation.
    #[serde(rename_all = "camelCase")]
    PrerequisiteFailed {
        #[allow(missing_docs)]
        prerequisite_key: String,
    },
    /// The flag could not be evaluated and the default value was served.
    #[serde(rename_all = "camelCase")]
    Error {
        #[allow(missing_docs)]
        error_kind: ErrorKind,
    },
}

/// Kind of error that prevented a flag from being evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// Flags have not been received yet.
    ClientNotReady,
    /// The flag key is not known.
    FlagNotFound,
    /// The flag value does not match the type of the variation call.
    WrongType,
    /// The flag data is invalid. Reported by the flag delivery service in [`FeatureFlag::reason`].
    ///
    /// [`FeatureFlag::reason`]: crate::FeatureFlag::reason
    MalformedFlag,
    /// Unexpected error. Reported by the flag delivery service in [`FeatureFlag::reason`].
    ///
    /// [`FeatureFlag::reason`]: crate::FeatureFlag::reason
    Exception,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn error_detail_serves_default() {
        let detail = EvaluationDetail::error(false, ErrorKind::FlagNotFound);
        assert!(!detail.value);
        assert_eq!(detail.variation_index, None);
        assert_eq!(detail.error_kind(), Some(ErrorKind::FlagNotFound));
    }

    #[test]
    fn map_keeps_reason_and_variation() {
        let detail = EvaluationDetail {
            value: 2,
            variation_index: Some(1),
            reason: Some(EvaluationReason::Fallthrough),
        }
        .map(|v| v * 10);

        assert_eq!(detail.value, 20);
        assert_eq!(detail.variation_index, Some(1));
        assert_eq!(detail.reason, Some(EvaluationReason::Fallthrough));
        assert_eq!(detail.error_kind(), None);
    }

    #[test]
    fn reasons_serialize_with_kind_tag() {
        assert_eq!(
            serde_json::to_value(EvaluationReason::RuleMatch {
                rule_index: 0,
                rule_id: Some("rule-1".to_owned())
            })
            .unwrap(),
            json!({"kind": "RULE_MATCH", "ruleIndex": 0, "ruleId": "rule-1"})
        );
        assert_eq!(
            serde_json::to_value(EvaluationReason::Error {
                error_kind: ErrorKind::ClientNotReady
            })
            .unwrap(),
            json!({"kind": "ERROR", "errorKind": "CLIENT_NOT_READY"})
        );
        assert_eq!(
            serde_json::to_value(EvaluationReason::Error {
                error_kind: ErrorKind::MalformedFlag
            })
            .unwrap(),
            json!({"kind": "ERROR", "errorKind": "MALFORMED_FLAG"})
        );
        assert_eq!(serde_json::to_value(ErrorKind::Exception).unwrap(), json!("EXCEPTION"));
    }
}
