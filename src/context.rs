use std::collections::HashMap;

use derive_more::From;
use serde::{Deserialize, Serialize};

/// Type alias for a HashMap representing key-value pairs of attributes.
///
/// # Examples
/// ```
/// # use flaghook::{Attributes, AttributeValue};
/// let attributes = [
///     ("age".to_owned(), 30.0.into()),
///     ("is_premium_member".to_owned(), true.into()),
///     ("username".to_owned(), "john_doe".into()),
/// ].into_iter().collect::<Attributes>();
/// ```
pub type Attributes = HashMap<String, AttributeValue>;

/// Enum representing possible values of a context attribute.
///
/// Conveniently implements `From` conversions for `String`, `&str`, `f64`, and `bool` types.
#[derive(Debug, Serialize, Deserialize, PartialEq, PartialOrd, From, Clone)]
#[serde(untagged)]
pub enum AttributeValue {
    /// A string value.
    String(String),
    /// A numerical value.
    Number(f64),
    /// A boolean value.
    Boolean(bool),
    /// A null value or absence of value.
    Null,
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

/// The kind used when none is specified.
pub const DEFAULT_CONTEXT_KIND: &str = "user";

/// Context that flags are evaluated for.
///
/// ```
/// # use flaghook::EvaluationContext;
/// let context = EvaluationContext::new("user-42")
///     .attribute("country", "NZ")
///     .attribute("beta", true);
/// assert_eq!(context.kind(), "user");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationContext {
    kind: String,
    key: String,
    attributes: Attributes,
}

impl EvaluationContext {
    /// Create a context of the default kind with the given key.
    pub fn new(key: impl Into<String>) -> EvaluationContext {
        EvaluationContext {
            kind: DEFAULT_CONTEXT_KIND.to_owned(),
            key: key.into(),
            attributes: Attributes::new(),
        }
    }

    /// Set the context kind.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Set an attribute, replacing any previous value.
    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    #[allow(missing_docs)]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[allow(missing_docs)]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[allow(missing_docs)]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}
