//! Error types for envconf.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Please set the environment variables: {}.", .0.join(", "))]
    MissingRequired(Vec<String>),

    #[error("{variable}: conversion error using {converter}: {reason}")]
    Conversion {
        variable: String,
        converter: String,
        reason: String,
    },

    #[error("var: {variable}: {message}")]
    Validation { variable: String, message: String },

    #[error("{variable}: {reason}")]
    SchemaAuthoring { variable: String, reason: String },

    #[error("variable not found: {0}")]
    NotFound(String),

    #[error("duplicate variable: {0}")]
    Duplicate(String),

    #[error("{variable} references unknown variable '{reference}'")]
    UnknownReference { variable: String, reference: String },

    #[error("cycle detected in resolution order: {0}")]
    CycleDetected(String),
}

impl Error {
    /// True when the error points at a bug in the schema declaration rather
    /// than at the values supplied by the environment.
    pub fn is_authoring(&self) -> bool {
        matches!(
            self,
            Error::SchemaAuthoring { .. }
                | Error::Duplicate(_)
                | Error::UnknownReference { .. }
                | Error::CycleDetected(_)
        )
    }

    /// Name of the variable the error is about, when there is exactly one.
    pub fn variable(&self) -> Option<&str> {
        match self {
            Error::Conversion { variable, .. }
            | Error::Validation { variable, .. }
            | Error::SchemaAuthoring { variable, .. }
            | Error::UnknownReference { variable, .. } => Some(variable.as_str()),
            Error::NotFound(name) | Error::Duplicate(name) => Some(name.as_str()),
            Error::MissingRequired(_) | Error::CycleDetected(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_required_message() {
        let err = Error::MissingRequired(vec!["DEBUG".to_string(), "SECRET_KEY".to_string()]);
        assert_eq!(
            err.to_string(),
            "Please set the environment variables: DEBUG, SECRET_KEY."
        );
        assert!(!err.is_authoring());
        assert_eq!(err.variable(), None);
    }

    #[test]
    fn test_validation_message_names_variable() {
        let err = Error::Validation {
            variable: "STATIC_ROOT".to_string(),
            message: "Production folder doesn't exist.".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "var: STATIC_ROOT: Production folder doesn't exist."
        );
        assert_eq!(err.variable(), Some("STATIC_ROOT"));
    }

    #[test]
    fn test_authoring_class() {
        let err = Error::SchemaAuthoring {
            variable: "X".to_string(),
            reason: "no value".to_string(),
        };
        assert!(err.is_authoring());
        assert!(Error::CycleDetected("A -> B".to_string()).is_authoring());
        assert!(
            !Error::Conversion {
                variable: "X".to_string(),
                converter: "literal".to_string(),
                reason: "bad".to_string(),
            }
            .is_authoring()
        );
    }
}
