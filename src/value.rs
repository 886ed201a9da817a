use derive_more::From;
use serde::{ser::SerializeStruct, Serialize};

/// Type of a [`FlagValue`], used to check the value of a flag against the variation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueType {
    #[allow(missing_docs)]
    String,
    #[allow(missing_docs)]
    Integer,
    #[allow(missing_docs)]
    Numeric,
    #[allow(missing_docs)]
    Boolean,
    #[allow(missing_docs)]
    Json,
}

/// Value served for a feature flag.
///
/// # Serialization
///
/// When serialized to JSON, serialized as a two-field object with `type` and `value`. Type is one
/// of "STRING", "INTEGER", "NUMERIC", "BOOLEAN", or "JSON".
///
/// ```
/// # use flaghook::FlagValue;
/// let value: FlagValue = true.into();
/// assert_eq!(
///     serde_json::to_string(&value).unwrap(),
///     r#"{"type":"BOOLEAN","value":true}"#
/// );
/// ```
#[derive(Debug, Clone, PartialEq, From)]
pub enum FlagValue {
    /// A string value.
    String(String),
    /// An integer value.
    Integer(i64),
    /// A numeric value (floating-point).
    Numeric(f64),
    /// A boolean value.
    Boolean(bool),
    /// Arbitrary JSON value.
    Json(serde_json::Value),
}

impl From<&str> for FlagValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl Serialize for FlagValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("FlagValue", 2)?;
        state.serialize_field("type", &self.value_type())?;
        match self {
            FlagValue::String(s) => state.serialize_field("value", s)?,
            FlagValue::Integer(i) => state.serialize_field("value", i)?,
            FlagValue::Numeric(n) => state.serialize_field("value", n)?,
            FlagValue::Boolean(b) => state.serialize_field("value", b)?,
            FlagValue::Json(v) => state.serialize_field("value", v)?,
        }
        state.end()
    }
}

impl FlagValue {
    /// Type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            FlagValue::String(_) => ValueType::String,
            FlagValue::Integer(_) => ValueType::Integer,
            FlagValue::Numeric(_) => ValueType::Numeric,
            FlagValue::Boolean(_) => ValueType::Boolean,
            FlagValue::Json(_) => ValueType::Json,
        }
    }

    /// Whether this value can be served by a variation call expecting `ty`.
    ///
    /// Integers can be served as numeric values, and numeric values without a fractional part can
    /// be served as integers. Any value can be served as JSON.
    pub fn is_compatible_with(&self, ty: ValueType) -> bool {
        match (self, ty) {
            (_, ValueType::Json) => true,
            (FlagValue::Integer(_), ValueType::Numeric) => true,
            (FlagValue::Numeric(n), ValueType::Integer) => as_integral(*n).is_some(),
            (value, ty) => value.value_type() == ty,
        }
    }

    /// Returns the value as a string if it is of type String.
    ///
    /// ```
    /// # use flaghook::FlagValue;
    /// let value = FlagValue::String("example".into());
    /// assert_eq!(value.as_str(), Some("example"));
    /// ```
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FlagValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an integer. Numeric values without a fractional part are converted.
    ///
    /// ```
    /// # use flaghook::FlagValue;
    /// assert_eq!(FlagValue::Integer(42).as_integer(), Some(42));
    /// assert_eq!(FlagValue::Numeric(42.0).as_integer(), Some(42));
    /// assert_eq!(FlagValue::Numeric(4.2).as_integer(), None);
    /// ```
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FlagValue::Integer(i) => Some(*i),
            FlagValue::Numeric(n) => as_integral(*n),
            _ => None,
        }
    }

    /// Returns the value as a floating-point number. Integers are converted.
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            FlagValue::Numeric(n) => Some(*n),
            FlagValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Returns the value as a boolean if it is of type Boolean.
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            FlagValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as JSON. Every value has a JSON representation; numbers that are not
    /// finite are represented as `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FlagValue::String(s) => serde_json::Value::String(s.clone()),
            FlagValue::Integer(i) => (*i).into(),
            FlagValue::Numeric(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            FlagValue::Boolean(b) => (*b).into(),
            FlagValue::Json(v) => v.clone(),
        }
    }
}

// `i64::MAX as f64` rounds up to 2^63, one past the end of the range.
fn as_integral(n: f64) -> Option<i64> {
    if n.is_finite() && n.fract() == 0.0 && n >= i64::MIN as f64 && n < i64::MAX as f64 {
        Some(n as i64)
    } else {
        None
    }
}
