//! Parser pipelines: convert a raw string, validate the typed value, and
//! report a message when validation fails.

use crate::{ResolvedConfig, Value, literal};
use derive_more::Display;
use std::fmt;
use std::sync::Arc;

/// Validators see the configuration resolved so far, which is how
/// cross-field checks read other variables.
pub type ValidateFn = Arc<dyn Fn(&Value, &ResolvedConfig) -> bool + Send + Sync>;

/// The convert step of a pipeline. The display name appears in conversion
/// errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Converter {
    /// Keep the raw string as a [`Value::Str`].
    #[display("str")]
    Identity,
    /// Parse the raw string with [`literal::parse`].
    #[display("literal")]
    Literal,
}

impl Converter {
    pub fn convert(&self, raw: &str) -> Result<Value, String> {
        match self {
            Converter::Identity => Ok(Value::Str(raw.to_string())),
            Converter::Literal => literal::parse(raw).map_err(|e| e.to_string()),
        }
    }
}

/// A convert/validate/message record owned by a variable spec.
///
/// Pipelines are cheap to clone; the closures are shared.
#[derive(Clone)]
pub struct Pipeline {
    converter: Converter,
    validator: Option<ValidateFn>,
    message: Option<String>,
    requires: Vec<String>,
}

impl Pipeline {
    pub fn new(converter: Converter) -> Self {
        Self {
            converter,
            validator: None,
            message: None,
            requires: Vec::new(),
        }
    }

    /// Pipeline that keeps the raw string.
    pub fn identity() -> Self {
        Self::new(Converter::Identity)
    }

    /// Pipeline that parses the raw string as a literal expression.
    pub fn literal() -> Self {
        Self::new(Converter::Literal)
    }

    pub fn validate<F>(mut self, func: F) -> Self
    where
        F: Fn(&Value, &ResolvedConfig) -> bool + Send + Sync + 'static,
    {
        self.validator = Some(Arc::new(func));
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Declare that the validator reads `name` from the resolved
    /// configuration, so `name` must be resolved first.
    pub fn requires(mut self, name: impl Into<String>) -> Self {
        self.requires.push(name.into());
        self
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }

    pub fn error_message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn required_variables(&self) -> &[String] {
        &self.requires
    }

    pub fn convert(&self, raw: &str) -> Result<Value, String> {
        self.converter.convert(raw)
    }

    /// Run the validator; a pipeline without one accepts every value.
    pub fn check(&self, value: &Value, resolved: &ResolvedConfig) -> bool {
        self.validator
            .as_ref()
            .is_none_or(|validate| validate(value, resolved))
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("converter", &self.converter)
            .field("has_validator", &self.validator.is_some())
            .field("message", &self.message)
            .field("requires", &self.requires)
            .finish()
    }
}
