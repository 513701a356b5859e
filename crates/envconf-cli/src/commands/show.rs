use super::SchemaSource;
use crate::Format;
use anyhow::Result;
use envconf_core::{Converter, ResolvedConfig, Schema, Source, Value};
use serde::Serialize;

const MASK: &str = "********";

const SECRET_MARKERS: &[&str] = &["SECRET", "PASSWORD", "TOKEN", "_KEY"];

#[derive(Serialize)]
struct ShownEntry<'a> {
    name: &'a str,
    value: Value,
    source: Source,
}

pub fn show(source: &SchemaSource, format: Format, reveal: bool) -> Result<()> {
    let schema = source.load_schema()?;
    let config = envconf_resolver::resolve(&schema, &source.environment())?;

    match format {
        Format::Json => println!("{}", render_json(&config, reveal)?),
        Format::Env => {
            for line in render_env(&schema, &config, reveal) {
                println!("{}", line);
            }
        }
    }
    Ok(())
}

fn is_secret(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    SECRET_MARKERS.iter().any(|marker| upper.contains(marker))
}

fn shown_value(name: &str, value: &Value, reveal: bool) -> Value {
    if !reveal && is_secret(name) && !value.is_none() {
        Value::Str(MASK.to_string())
    } else {
        value.clone()
    }
}

fn render_json(config: &ResolvedConfig, reveal: bool) -> Result<String> {
    let entries: Vec<ShownEntry<'_>> = config
        .iter()
        .map(|entry| ShownEntry {
            name: &entry.name,
            value: shown_value(&entry.name, &entry.value, reveal),
            source: entry.source,
        })
        .collect();
    Ok(serde_json::to_string_pretty(&entries)?)
}

/// `NAME=value` lines that can be fed back as environment overrides:
/// variables parsed as literals are written in literal syntax, the rest
/// as their raw string.
fn render_env(schema: &Schema, config: &ResolvedConfig, reveal: bool) -> Vec<String> {
    config
        .iter()
        .map(|entry| {
            let value = shown_value(&entry.name, &entry.value, reveal);
            let literal = schema
                .get(&entry.name)
                .ok()
                .and_then(|spec| spec.pipeline.as_ref())
                .is_some_and(|p| !matches!(p.converter(), Converter::Identity));
            match (&value, literal) {
                (Value::Str(raw), false) => format!("{}={}", entry.name, raw),
                _ => format!("{}={}", entry.name, value),
            }
        })
        .collect()
}
