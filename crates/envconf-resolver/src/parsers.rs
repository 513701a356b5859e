//! Built-in parser pipelines.
//!
//! Each factory returns a [`Pipeline`]. Pipelines that read other
//! variables declare them with [`Pipeline::requires`], which makes the
//! schema resolve those variables first.

use envconf_core::{Pipeline, ResolvedConfig, Value};
use std::path::Path;
use url::Url;

/// Substring that marks a database engine as sqlite-style.
pub const SQLITE_MARKER: &str = "sqlite";

const URL_SCHEMES: &[&str] = &["http", "https", "ftp", "ftps"];

/// Literal that must be `True` or `False`.
pub fn boolean() -> Pipeline {
    Pipeline::literal().validate(|v, _| matches!(v, Value::Bool(_)))
}

/// Literal that must be a list of strings, e.g. `["localhost", "127.0.0.1"]`.
pub fn string_list(message: impl Into<String>) -> Pipeline {
    Pipeline::literal()
        .validate(|v, _| match v {
            Value::List(items) => items.iter().all(|i| matches!(i, Value::Str(_))),
            _ => false,
        })
        .message(message)
}

/// Raw string that must be an absolute http(s) or ftp(s) URL with a host.
pub fn url(message: impl Into<String>) -> Pipeline {
    Pipeline::identity()
        .validate(|v, _| v.as_str().is_some_and(is_valid_url))
        .message(message)
}

/// Raw string naming a directory that must exist, unless the resolved
/// `debug_var` is `True`.
pub fn directory(message: impl Into<String>, debug_var: impl Into<String>) -> Pipeline {
    let debug_var = debug_var.into();
    let reads = debug_var.clone();
    Pipeline::identity()
        .validate(move |v, resolved| {
            resolved.get_bool(&debug_var) == Some(true)
                || v.as_str().is_some_and(|p| Path::new(p).is_dir())
        })
        .message(message)
        .requires(reads)
}

/// Literal credential that may be left as `None` only when the resolved
/// `engine_var` names a sqlite-style engine.
pub fn sqlite_optional(message: impl Into<String>, engine_var: impl Into<String>) -> Pipeline {
    let engine_var = engine_var.into();
    let reads = engine_var.clone();
    Pipeline::literal()
        .validate(move |v, resolved| match v {
            Value::Str(s) => !s.is_empty(),
            Value::None => is_sqlite_engine(resolved, &engine_var),
            _ => false,
        })
        .message(message)
        .requires(reads)
}

/// Literal that must be an integer or `None`.
pub fn optional_int(message: impl Into<String>) -> Pipeline {
    Pipeline::literal()
        .validate(|v, _| matches!(v, Value::None | Value::Int(_)))
        .message(message)
}

/// Literal that must be a tuple, of exactly `len` items when given.
pub fn tuple(len: Option<usize>, message: impl Into<String>) -> Pipeline {
    Pipeline::literal()
        .validate(move |v, _| match v {
            Value::Tuple(items) => len.is_none_or(|n| items.len() == n),
            _ => false,
        })
        .message(message)
}

/// Any literal expression.
pub fn literal() -> Pipeline {
    Pipeline::literal()
}

fn is_sqlite_engine(resolved: &ResolvedConfig, engine_var: &str) -> bool {
    resolved
        .get_str(engine_var)
        .is_some_and(|engine| engine.contains(SQLITE_MARKER))
}

fn is_valid_url(raw: &str) -> bool {
    // Url::parse trims and drops these, but the raw string is what gets stored
    if !raw.contains("://") || raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }
    match Url::parse(raw) {
        Ok(url) => {
            URL_SCHEMES.contains(&url.scheme()) && url.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use envconf_core::Source;

    fn run(pipeline: &Pipeline, raw: &str, resolved: &ResolvedConfig) -> bool {
        match pipeline.convert(raw) {
            Ok(value) => pipeline.check(&value, resolved),
            Err(_) => false,
        }
    }

    fn with(name: &str, value: Value) -> ResolvedConfig {
        let mut resolved = ResolvedConfig::new();
        resolved.insert(name, value, Source::Environment).unwrap();
        resolved
    }

    #[test]
    fn test_boolean() {
        let empty = ResolvedConfig::new();
        assert!(run(&boolean(), "True", &empty));
        assert!(run(&boolean(), "False", &empty));
        assert!(!run(&boolean(), "1", &empty));
        assert!(!run(&boolean(), "'True'", &empty));
        assert_eq!(boolean().error_message(), None);
    }

    #[test]
    fn test_string_list() {
        let empty = ResolvedConfig::new();
        let pipeline = string_list("ALLOWED_HOSTS = list of str only!");
        assert!(run(&pipeline, "[]", &empty));
        assert!(run(&pipeline, r#"["127.0.0.1", ]"#, &empty));
        assert!(!run(&pipeline, r#"["a", 1]"#, &empty));
        assert!(!run(&pipeline, r#"("a",)"#, &empty));
        assert_eq!(
            pipeline.error_message(),
            Some("ALLOWED_HOSTS = list of str only!")
        );
    }

    #[test]
    fn test_url() {
        let empty = ResolvedConfig::new();
        let pipeline = url("bad url");
        assert!(run(&pipeline, "https://example.com/path?q=1", &empty));
        assert!(run(&pipeline, "ftp://files.example.com", &empty));
        assert!(!run(&pipeline, "example.com", &empty));
        assert!(!run(&pipeline, "http:example.com", &empty));
        assert!(!run(&pipeline, "mailto:someone@example.com", &empty));
        assert!(!run(&pipeline, "file:///etc/passwd", &empty));
        assert!(!run(&pipeline, " http://example.com ", &empty));
        assert!(!run(&pipeline, "http://exa\nmple.com", &empty));
        assert!(!run(&pipeline, "http://exa\tmple.com/", &empty));
        assert!(!run(&pipeline, "http://example.com/a b", &empty));
        assert!(!run(&pipeline, "http://example.com/\u{7f}", &empty));
    }

    #[test]
    fn test_directory_checks_filesystem_without_debug() {
        let existing = std::env::temp_dir();
        let existing = existing.to_str().unwrap();
        let pipeline = directory("missing", "DEBUG");
        let not_debug = with("DEBUG", Value::Bool(false));

        assert!(run(&pipeline, existing, &not_debug));
        assert!(!run(&pipeline, "/nonexistent/envconf", &not_debug));
        assert_eq!(pipeline.required_variables(), ["DEBUG".to_string()]);
    }

    #[test]
    fn test_directory_skipped_in_debug() {
        let pipeline = directory("missing", "DEBUG");
        let debug = with("DEBUG", Value::Bool(true));
        assert!(run(&pipeline, "/nonexistent/envconf", &debug));
    }

    #[test]
    fn test_directory_rejects_regular_file() {
        let file = std::env::current_exe().unwrap();
        let pipeline = directory("missing", "DEBUG");
        let not_debug = with("DEBUG", Value::Bool(false));
        assert!(!run(&pipeline, file.to_str().unwrap(), &not_debug));
    }

    #[test]
    fn test_sqlite_optional() {
        let pipeline = sqlite_optional("configure me", "DATABASE_ENGINE");
        let sqlite = with("DATABASE_ENGINE", Value::from("django.db.backends.sqlite3"));
        let postgres = with(
            "DATABASE_ENGINE",
            Value::from("django.db.backends.postgresql_psycopg2"),
        );

        assert!(run(&pipeline, "None", &sqlite));
        assert!(!run(&pipeline, "None", &postgres));
        assert!(run(&pipeline, "'db.internal'", &postgres));
        assert!(!run(&pipeline, "''", &postgres));
        assert!(!run(&pipeline, "''", &sqlite));
        assert!(!run(&pipeline, "5432", &sqlite));
        // bare words are not literals
        assert!(!run(&pipeline, "db.internal", &postgres));
    }

    #[test]
    fn test_optional_int_and_tuple() {
        let empty = ResolvedConfig::new();
        assert!(run(&optional_int("int"), "None", &empty));
        assert!(run(&optional_int("int"), "10000", &empty));
        assert!(!run(&optional_int("int"), "'10'", &empty));

        let pair = tuple(Some(2), "pair");
        assert!(run(&pair, "(1125, 2436)", &empty));
        assert!(!run(&pair, "(1125,)", &empty));
        assert!(!run(&pair, "[1125, 2436]", &empty));
        assert!(run(&tuple(None, "tuple"), "('/srv/locale', )", &empty));
    }
}
