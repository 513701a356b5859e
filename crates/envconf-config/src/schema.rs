//! Schema parsing from KDL documents.
//!
//! ```kdl
//! var "DEBUG" required=#true parser="bool" first=#true
//! var "SECRET_KEY" required=#true
//! var "STATIC_ROOT" default="../static" parser="directory" message="Static folder doesn't exist."
//! var "DATABASE_HOST" default="None" parser="sqlite-optional"
//! var "FEED_URL" required=#true parser="url" {
//!     after "DEBUG"
//! }
//! ```

use crate::{ConfigError, ConfigResult};
use envconf_core::{Pipeline, Schema, VarSpec};
use envconf_resolver::parsers;
use kdl::{KdlDocument, KdlNode};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

static NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

const DEFAULT_DEBUG_VAR: &str = "DEBUG";
const DEFAULT_ENGINE_VAR: &str = "DATABASE_ENGINE";

/// Parse a schema from KDL text.
pub fn parse_schema(kdl: &str) -> ConfigResult<Schema> {
    let doc: KdlDocument = kdl.parse()?;
    let mut builder = Schema::builder();

    for node in doc.nodes() {
        match node.name().value() {
            "var" => {
                let spec = parse_var(node)?;
                if get_bool_prop(node, "first").unwrap_or(false) {
                    builder = builder.resolve_first(spec.name.clone());
                }
                builder = builder.var(spec);
            }
            other => {
                debug!(node = %other, "Ignoring unknown schema node");
            }
        }
    }

    Ok(builder.build()?)
}

/// Read and parse a schema file.
pub fn load_schema(path: impl AsRef<Path>) -> ConfigResult<Schema> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    debug!(path = %path.display(), "Loaded schema file");
    parse_schema(&content)
}

fn parse_var(node: &KdlNode) -> ConfigResult<VarSpec> {
    let name = get_first_string_arg(node)
        .ok_or_else(|| ConfigError::MissingField("variable name".to_string()))?;

    if !NAME_REGEX.is_match(&name) {
        return Err(ConfigError::InvalidValue {
            field: "variable name".to_string(),
            message: format!("'{}' is not a valid environment variable name", name),
        });
    }

    let mut spec = VarSpec::new(name.clone());
    if get_bool_prop(node, "required").unwrap_or(false) {
        spec = spec.required();
    }
    if let Some(default) = get_string_prop(node, "default") {
        spec = spec.default_value(default);
    }
    if let Some(parser) = get_string_prop(node, "parser") {
        spec = spec.pipeline(parse_pipeline(node, &name, &parser)?);
    }
    for dep in get_string_list_prop(node, "after") {
        spec = spec.after(dep);
    }

    Ok(spec)
}

fn parse_pipeline(node: &KdlNode, name: &str, parser: &str) -> ConfigResult<Pipeline> {
    let message = get_string_prop(node, "message");

    let pipeline = match parser {
        "bool" => {
            let pipeline = parsers::boolean();
            match message {
                Some(message) => pipeline.message(message),
                None => pipeline,
            }
        }
        "str-list" => parsers::string_list(
            message.unwrap_or_else(|| format!("{} = list of str only!", name)),
        ),
        "url" => parsers::url(message.unwrap_or_else(|| format!("{} must be a valid URL", name))),
        "directory" => parsers::directory(
            message.unwrap_or_else(|| format!("{} directory doesn't exist.", name)),
            get_string_prop(node, "debug-var").unwrap_or_else(|| DEFAULT_DEBUG_VAR.to_string()),
        ),
        "sqlite-optional" => parsers::sqlite_optional(
            message.unwrap_or_else(|| {
                "Your database isn't sqlite, this var must be configured".to_string()
            }),
            get_string_prop(node, "engine-var").unwrap_or_else(|| DEFAULT_ENGINE_VAR.to_string()),
        ),
        "optional-int" => parsers::optional_int(
            message.unwrap_or_else(|| format!("{} must be an integer or None", name)),
        ),
        "tuple" => {
            let len = match node.get("len").map(|v| v.as_integer()) {
                None => None,
                Some(Some(n)) => Some(usize::try_from(n).map_err(|_| ConfigError::InvalidValue {
                    field: format!("len of {}", name),
                    message: format!("{} is not a valid tuple length", n),
                })?),
                Some(None) => {
                    return Err(ConfigError::InvalidValue {
                        field: format!("len of {}", name),
                        message: "expected an integer".to_string(),
                    });
                }
            };
            parsers::tuple(
                len,
                message.unwrap_or_else(|| format!("{} must be a tuple", name)),
            )
        }
        "literal" => parsers::literal(),
        "str" => Pipeline::identity(),
        _ => {
            return Err(ConfigError::InvalidValue {
                field: format!("parser of {}", name),
                message: format!("unknown parser: {}", parser),
            });
        }
    };

    Ok(pipeline)
}

// Helper functions for extracting values from KDL nodes

fn get_first_string_arg(node: &KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

fn get_all_string_args(node: &KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .map(|s| s.to_string())
        .collect()
}

fn get_string_prop(node: &KdlNode, name: &str) -> Option<String> {
    node.get(name)
        .and_then(|v| v.as_string())
        .map(|s| s.to_string())
}

fn get_bool_prop(node: &KdlNode, name: &str) -> Option<bool> {
    node.get(name).and_then(|v| v.as_bool())
}

fn get_string_list_prop(node: &KdlNode, name: &str) -> Vec<String> {
    let mut result = Vec::new();

    // Repeated properties: after="A" after="B"
    for entry in node.entries() {
        if let Some(entry_name) = entry.name() {
            if entry_name.value() == name {
                if let Some(s) = entry.value().as_string() {
                    result.push(s.to_string());
                }
            }
        }
    }

    // Block syntax: { after "A" "B" }
    if let Some(children) = node.children() {
        for child in children.nodes() {
            if child.name().value() == name {
                result.extend(get_all_string_args(child));
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use envconf_core::{Error, Value};
    use envconf_resolver::{Environment, resolve};

    #[test]
    fn test_parse_simple_schema() {
        let kdl = r#"
            var "SECRET_KEY" required=#true
            var "MEDIA_ROOT" default="uploads"
        "#;

        let schema = parse_schema(kdl).unwrap();
        assert_eq!(schema.len(), 2);
        assert!(schema.get("SECRET_KEY").unwrap().required);
        assert_eq!(schema.default_of("MEDIA_ROOT").unwrap().as_deref(), Some("uploads"));
    }

    #[test]
    fn test_first_and_cross_field_ordering() {
        let kdl = r#"
            var "STATIC_ROOT" default="/nonexistent" parser="directory"
            var "DATABASE_HOST" default="None" parser="sqlite-optional"
            var "DATABASE_ENGINE" default="django.db.backends.sqlite3"
            var "DEBUG" required=#true parser="bool" first=#true
        "#;

        let schema = parse_schema(kdl).unwrap();
        let order: Vec<&str> = schema.resolution_order().map(|s| s.name.as_str()).collect();
        assert_eq!(
            order,
            vec!["DEBUG", "STATIC_ROOT", "DATABASE_ENGINE", "DATABASE_HOST"]
        );

        let env = Environment::from_pairs([("DEBUG", "True")]);
        let config = resolve(&schema, &env).unwrap();
        assert_eq!(config.get("DATABASE_HOST"), Some(&Value::None));
    }

    #[test]
    fn test_custom_message_surfaces() {
        let kdl = r#"
            var "DEBUG" required=#true parser="bool" first=#true
            var "STATIC_ROOT" default="/nonexistent" parser="directory" message="Production folder doesn't exist."
        "#;

        let schema = parse_schema(kdl).unwrap();
        let env = Environment::from_pairs([("DEBUG", "False")]);
        let err = resolve(&schema, &env).unwrap_err();
        assert_eq!(
            err.to_string(),
            "var: STATIC_ROOT: Production folder doesn't exist."
        );
    }

    #[test]
    fn test_after_block_and_props() {
        let kdl = r#"
            var "C" after="A" {
                after "B"
            }
            var "A"
            var "B"
        "#;

        let schema = parse_schema(kdl).unwrap();
        assert_eq!(schema.get("C").unwrap().after, vec!["A", "B"]);
        let order: Vec<&str> = schema.resolution_order().map(|s| s.name.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_tuple_len() {
        let kdl = r#"
            var "THUMBNAIL_DIMENSIONS" default="(1125, 2436)" parser="tuple" len=2
        "#;
        let schema = parse_schema(kdl).unwrap();
        let env = Environment::from_pairs([("THUMBNAIL_DIMENSIONS", "(1, 2, 3)")]);
        assert!(matches!(
            resolve(&schema, &env),
            Err(Error::Validation { variable, .. }) if variable == "THUMBNAIL_DIMENSIONS"
        ));
    }

    #[test]
    fn test_unknown_parser() {
        let result = parse_schema(r#"var "X" default="1" parser="yaml""#);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_missing_and_invalid_names() {
        assert!(matches!(
            parse_schema("var required=#true"),
            Err(ConfigError::MissingField(_))
        ));
        assert!(matches!(
            parse_schema(r#"var "NOT-VALID""#),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_schema_errors_propagate() {
        let result = parse_schema(
            r#"
            var "A"
            var "A"
        "#,
        );
        assert!(matches!(
            result,
            Err(ConfigError::Schema(Error::Duplicate(name))) if name == "A"
        ));

        let result = parse_schema(r#"var "A" after="NOPE""#);
        assert!(matches!(
            result,
            Err(ConfigError::Schema(Error::UnknownReference { .. }))
        ));
    }

    #[test]
    fn test_invalid_kdl() {
        assert!(matches!(
            parse_schema(r#"var "A" {"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_bundled_web_schema_matches_builtin() {
        let file = parse_schema(include_str!("../../../schemas/web.kdl")).unwrap();
        let builtin = crate::web_schema("/srv/app").unwrap();

        let file_order: Vec<&str> = file.resolution_order().map(|s| s.name.as_str()).collect();
        let builtin_order: Vec<&str> =
            builtin.resolution_order().map(|s| s.name.as_str()).collect();
        assert_eq!(file_order, builtin_order);

        let empty = Environment::new();
        let file_err = resolve(&file, &empty).unwrap_err().to_string();
        let builtin_err = resolve(&builtin, &empty).unwrap_err().to_string();
        assert_eq!(file_err, builtin_err);

        let env = Environment::from_pairs([
            ("DEBUG", "True"),
            ("SECRET_KEY", "abc"),
            ("DATA_UPLOAD_MAX_NUMBER_FIELDS", "None"),
        ]);
        let from_file = resolve(&file, &env).unwrap();
        let from_builtin = resolve(&builtin, &env).unwrap();
        assert_eq!(from_file.len(), from_builtin.len());

        // The file has no base directory, so path defaults stay relative.
        let relative_defaults = ["LOCALE_PATHS", "DATABASE_NAME"];
        for entry in from_builtin.iter() {
            if relative_defaults.contains(&entry.name.as_str()) {
                continue;
            }
            assert_eq!(from_file.entry(&entry.name), Some(entry), "{}", entry.name);
        }
        assert_eq!(
            from_file.get("LOCALE_PATHS"),
            Some(&Value::Tuple(vec![Value::from("locale")]))
        );
        assert_eq!(
            from_builtin.get("LOCALE_PATHS"),
            Some(&Value::Tuple(vec![Value::from("/srv/app/locale")]))
        );
        assert_eq!(from_file.get_str("DATABASE_NAME"), Some("db.sqlite3"));
        assert_eq!(
            from_builtin.get_str("DATABASE_NAME"),
            Some("/srv/app/db.sqlite3")
        );

        // Overriding both makes the two schemas agree entirely.
        let env = env
            .with("LOCALE_PATHS", "('/srv/app/locale', )")
            .with("DATABASE_NAME", "/srv/app/db.sqlite3");
        assert_eq!(resolve(&file, &env).unwrap(), resolve(&builtin, &env).unwrap());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            load_schema("/nonexistent/schema.kdl"),
            Err(ConfigError::Io(_))
        ));
    }
}
