use crate::{
    flag_store::FlagSnapshot, value::ValueType, ErrorKind, EvaluationDetail, FlagValue,
};

/// Resolve `flag_key` against `flags`, serving `default_value` when the flag cannot be served.
///
/// Flag values in the store are already evaluated for the current context, so this is a lookup
/// plus a type check against the variation call that requested it.
pub(crate) fn evaluate(
    flags: Option<&FlagSnapshot>,
    flag_key: &str,
    default_value: &FlagValue,
    expected_type: ValueType,
) -> EvaluationDetail<FlagValue> {
    let Some(flags) = flags else {
        log::warn!(target: "flaghook", flag_key; "evaluating a flag before flag values have been received");
        return EvaluationDetail::error(default_value.clone(), ErrorKind::ClientNotReady);
    };

    let Some(flag) = flags.get(flag_key) else {
        log::info!(target: "flaghook", flag_key; "unknown flag, serving default value");
        return EvaluationDetail::error(default_value.clone(), ErrorKind::FlagNotFound);
    };

    if !flag.value.is_compatible_with(expected_type) {
        log::warn!(target: "flaghook",
                   flag_key,
                   expected_type:serde = expected_type,
                   value:serde = flag.value;
                   "flag value does not match the requested type, serving default value");
        return EvaluationDetail::error(default_value.clone(), ErrorKind::WrongType);
    }

    let detail = EvaluationDetail {
        value: flag.value.clone(),
        variation_index: flag.variation,
        reason: flag.reason.clone(),
    };

    log::trace!(target: "flaghook",
                flag_key,
                flag_version:serde = flag.version,
                value:serde = detail.value;
                "evaluated a flag");

    detail
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use serde_json::json;

    use super::evaluate;
    use crate::{
        flag_store::{FeatureFlag, FlagSnapshot},
        value::ValueType,
        ErrorKind, EvaluationReason, FlagValue,
    };

    fn flags() -> FlagSnapshot {
        HashMap::from([
            (
                "bool-flag".to_owned(),
                FeatureFlag::new(true)
                    .with_variation(1)
                    .with_reason(EvaluationReason::Fallthrough),
            ),
            ("int-flag".to_owned(), FeatureFlag::new(3.0).with_variation(0)),
            (
                "json-flag".to_owned(),
                FeatureFlag::new(json!({"color": "red"})),
            ),
        ])
    }

    #[test]
    fn serves_default_before_flags_arrive() {
        let detail = evaluate(None, "bool-flag", &false.into(), ValueType::Boolean);
        assert_eq!(detail.value, FlagValue::Boolean(false));
        assert_eq!(detail.error_kind(), Some(ErrorKind::ClientNotReady));
    }

    #[test]
    fn serves_default_for_unknown_flag() {
        let flags = flags();
        let detail = evaluate(Some(&flags), "missing", &"x".into(), ValueType::String);
        assert_eq!(detail.value, FlagValue::from("x"));
        assert_eq!(detail.error_kind(), Some(ErrorKind::FlagNotFound));
    }

    #[test]
    fn serves_default_on_type_mismatch() {
        let flags = flags();
        let detail = evaluate(Some(&flags), "bool-flag", &"x".into(), ValueType::String);
        assert_eq!(detail.value, FlagValue::from("x"));
        assert_eq!(detail.variation_index, None);
        assert_eq!(detail.error_kind(), Some(ErrorKind::WrongType));
    }

    #[test]
    fn serves_stored_value() {
        let flags = flags();
        let detail = evaluate(Some(&flags), "bool-flag", &false.into(), ValueType::Boolean);
        assert_eq!(detail.value, FlagValue::Boolean(true));
        assert_eq!(detail.variation_index, Some(1));
        assert_eq!(detail.reason, Some(EvaluationReason::Fallthrough));
    }

    #[test]
    fn integral_numbers_serve_integer_calls() {
        let flags = flags();
        let detail = evaluate(Some(&flags), "int-flag", &FlagValue::Integer(0), ValueType::Integer);
        assert_eq!(detail.value.as_integer(), Some(3));
        assert_eq!(detail.variation_index, Some(0));
    }

    #[test]
    fn out_of_range_numbers_do_not_serve_integer_calls() {
        let flags = HashMap::from([(
            "huge-flag".to_owned(),
            FeatureFlag::new(9.223372036854775807e18).with_variation(0),
        )]);
        let detail = evaluate(Some(&flags), "huge-flag", &FlagValue::Integer(5), ValueType::Integer);
        assert_eq!(detail.value, FlagValue::Integer(5));
        assert_eq!(detail.error_kind(), Some(ErrorKind::WrongType));
    }

    #[test]
    fn stored_error_reasons_pass_through() {
        let flags = HashMap::from([(
            "malformed-flag".to_owned(),
            FeatureFlag::new(false).with_reason(EvaluationReason::Error {
                error_kind: ErrorKind::MalformedFlag,
            }),
        )]);
        let detail = evaluate(Some(&flags), "malformed-flag", &true.into(), ValueType::Boolean);
        assert_eq!(detail.value, FlagValue::Boolean(false));
        assert_eq!(detail.error_kind(), Some(ErrorKind::MalformedFlag));
    }

    #[test]
    fn any_flag_serves_json_calls() {
        let flags = flags();
        let detail = evaluate(Some(&flags), "json-flag", &json!(null).into(), ValueType::Json);
        assert_eq!(detail.value.to_json(), json!({"color": "red"}));

        let detail = evaluate(Some(&flags), "bool-flag", &json!(null).into(), ValueType::Json);
        assert_eq!(detail.value.to_json(), json!(true));
    }
}
