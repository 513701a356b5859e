//! Built-in schema for a web application's settings, and a typed view
//! over its resolved values.

use crate::{ConfigError, ConfigResult};
use envconf_core::{ResolvedConfig, Schema, Value, VarSpec};
use envconf_resolver::parsers;
use serde::Serialize;
use std::path::Path;

pub const DEBUG: &str = "DEBUG";
pub const SECRET_KEY: &str = "SECRET_KEY";
pub const MEDIA_ROOT: &str = "MEDIA_ROOT";
pub const STATIC_ROOT: &str = "STATIC_ROOT";
pub const COMPRESS_ROOT: &str = "COMPRESS_ROOT";
pub const DATA_UPLOAD_MAX_NUMBER_FIELDS: &str = "DATA_UPLOAD_MAX_NUMBER_FIELDS";
pub const UPLOAD_FOLDER_DOCUMENTS: &str = "UPLOAD_FOLDER_DOCUMENTS";
pub const UPLOAD_FOLDER_CHATS_DOCUMENT: &str = "UPLOAD_FOLDER_CHATS_DOCUMENT";
pub const UPLOAD_FOLDER_IMAGES: &str = "UPLOAD_FOLDER_IMAGES";
pub const THUMBNAIL_SUBDIRECTORY: &str = "THUMBNAIL_SUBDIRECTORY";
pub const THUMBNAIL_DIMENSIONS: &str = "THUMBNAIL_DIMENSIONS";
pub const ALLOWED_HOSTS: &str = "ALLOWED_HOSTS";
pub const INTERNAL_IPS: &str = "INTERNAL_IPS";
pub const LOCALE_PATHS: &str = "LOCALE_PATHS";
pub const DATABASE_ENGINE: &str = "DATABASE_ENGINE";
pub const DATABASE_NAME: &str = "DATABASE_NAME";
pub const DATABASE_HOST: &str = "DATABASE_HOST";
pub const DATABASE_CLIENT_ENCODING: &str = "DATABASE_CLIENT_ENCODING";
pub const DATABASE_DATABASE: &str = "DATABASE_DATABASE";
pub const DATABASE_USER: &str = "DATABASE_USER";
pub const DATABASE_PASSWORD: &str = "DATABASE_PASSWORD";

/// Credentials that may stay `None` with a sqlite engine.
const DATABASE_CREDENTIALS: &[&str] = &[
    DATABASE_HOST,
    DATABASE_CLIENT_ENCODING,
    DATABASE_DATABASE,
    DATABASE_USER,
    DATABASE_PASSWORD,
];

fn join_path(base: &str, child: &str) -> String {
    Path::new(base).join(child).to_string_lossy().into_owned()
}

fn locale_paths_default(base_dir: &str) -> String {
    Value::Tuple(vec![Value::Str(join_path(base_dir, "locale"))]).to_string()
}

fn sqlite_name_default(base_dir: &str) -> String {
    join_path(base_dir, "db.sqlite3")
}

/// The web application settings schema. Defaults that depend on the
/// project directory are computed from `base_dir` when read.
pub fn web_schema(base_dir: impl AsRef<Path>) -> ConfigResult<Schema> {
    let base_dir = base_dir.as_ref().to_string_lossy().into_owned();
    let credentials = parsers::sqlite_optional(
        "Your database isn't sqlite, this var must be configured",
        DATABASE_ENGINE,
    );

    let mut builder = Schema::builder()
        .var(VarSpec::new(DEBUG).required().pipeline(parsers::boolean()))
        .var(VarSpec::new(SECRET_KEY).required())
        .var(VarSpec::new(MEDIA_ROOT).default_value("uploads"))
        .var(
            VarSpec::new(STATIC_ROOT)
                .default_value("../production_static_files")
                .pipeline(parsers::directory("Production folder doesn't exist.", DEBUG)),
        )
        .var(
            VarSpec::new(COMPRESS_ROOT)
                .default_value("../production_static_files/compress")
                .pipeline(parsers::directory(
                    "Compress production folder doesn't exist.",
                    DEBUG,
                )),
        )
        // None means no limit on the number of fields in an upload
        .var(
            VarSpec::new(DATA_UPLOAD_MAX_NUMBER_FIELDS)
                .required()
                .pipeline(parsers::optional_int(
                    "DATA_UPLOAD_MAX_NUMBER_FIELDS = int or None only!",
                )),
        )
        .var(VarSpec::new(UPLOAD_FOLDER_DOCUMENTS).default_value("documents"))
        .var(VarSpec::new(UPLOAD_FOLDER_CHATS_DOCUMENT).default_value("chats/documents"))
        .var(VarSpec::new(UPLOAD_FOLDER_IMAGES).default_value("images"))
        .var(VarSpec::new(THUMBNAIL_SUBDIRECTORY).default_value("th"))
        .var(
            VarSpec::new(THUMBNAIL_DIMENSIONS)
                .default_value("(1125, 2436)")
                .pipeline(parsers::tuple(
                    Some(2),
                    "THUMBNAIL_DIMENSIONS = (width, height) only!",
                )),
        )
        .var(
            VarSpec::new(ALLOWED_HOSTS)
                .default_value("[]")
                .required()
                .pipeline(parsers::string_list("ALLOWED_HOSTS = list of str only!")),
        )
        .var(
            VarSpec::new(INTERNAL_IPS)
                .default_value(r#"["127.0.0.1", ]"#)
                .required()
                .pipeline(parsers::string_list("INTERNAL_IPS = list of str only!")),
        )
        .var(
            VarSpec::new(LOCALE_PATHS)
                .deferred_default(locale_paths_default, base_dir.clone())
                .pipeline(parsers::tuple(None, "LOCALE_PATHS = tuple only!")),
        )
        .var(VarSpec::new(DATABASE_ENGINE).default_value("django.db.backends.sqlite3"))
        .var(VarSpec::new(DATABASE_NAME).deferred_default(sqlite_name_default, base_dir));

    for name in DATABASE_CREDENTIALS {
        builder = builder.var(
            VarSpec::new(*name)
                .default_value("None")
                .pipeline(credentials.clone()),
        );
    }

    Ok(builder.resolve_first(DEBUG).build()?)
}

/// Database connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatabaseSettings {
    pub engine: String,
    pub name: String,
    pub host: Option<String>,
    pub client_encoding: Option<String>,
    pub database: Option<String>,
    pub user: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
}

/// Typed web settings, read from a configuration resolved with
/// [`web_schema`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebSettings {
    pub debug: bool,
    #[serde(skip_serializing)]
    pub secret_key: String,
    pub media_root: String,
    pub static_root: String,
    pub compress_root: String,
    /// `None` means unlimited.
    pub data_upload_max_number_fields: Option<i64>,
    pub upload_folder_documents: String,
    pub upload_folder_chats_document: String,
    pub upload_folder_images: String,
    pub thumbnail_subdirectory: String,
    pub thumbnail_dimensions: (i64, i64),
    pub allowed_hosts: Vec<String>,
    pub internal_ips: Vec<String>,
    pub locale_paths: Vec<String>,
    pub database: DatabaseSettings,
}

impl WebSettings {
    pub fn from_config(config: &ResolvedConfig) -> ConfigResult<Self> {
        let dimensions = match get(config, THUMBNAIL_DIMENSIONS)?.as_items() {
            Some([Value::Int(w), Value::Int(h)]) => (*w, *h),
            _ => return Err(invalid(THUMBNAIL_DIMENSIONS, "expected (width, height)")),
        };

        let data_upload_max_number_fields = match get(config, DATA_UPLOAD_MAX_NUMBER_FIELDS)? {
            Value::None => None,
            Value::Int(n) => Some(*n),
            _ => return Err(invalid(DATA_UPLOAD_MAX_NUMBER_FIELDS, "expected int or None")),
        };

        Ok(Self {
            debug: get(config, DEBUG)?
                .as_bool()
                .ok_or_else(|| invalid(DEBUG, "expected bool"))?,
            secret_key: get_string(config, SECRET_KEY)?,
            media_root: get_string(config, MEDIA_ROOT)?,
            static_root: get_string(config, STATIC_ROOT)?,
            compress_root: get_string(config, COMPRESS_ROOT)?,
            data_upload_max_number_fields,
            upload_folder_documents: get_string(config, UPLOAD_FOLDER_DOCUMENTS)?,
            upload_folder_chats_document: get_string(config, UPLOAD_FOLDER_CHATS_DOCUMENT)?,
            upload_folder_images: get_string(config, UPLOAD_FOLDER_IMAGES)?,
            thumbnail_subdirectory: get_string(config, THUMBNAIL_SUBDIRECTORY)?,
            thumbnail_dimensions: dimensions,
            allowed_hosts: get_strings(config, ALLOWED_HOSTS)?,
            internal_ips: get_strings(config, INTERNAL_IPS)?,
            locale_paths: get_strings(config, LOCALE_PATHS)?,
            database: DatabaseSettings {
                engine: get_string(config, DATABASE_ENGINE)?,
                name: get_string(config, DATABASE_NAME)?,
                host: get_credential(config, DATABASE_HOST)?,
                client_encoding: get_credential(config, DATABASE_CLIENT_ENCODING)?,
                database: get_credential(config, DATABASE_DATABASE)?,
                user: get_credential(config, DATABASE_USER)?,
                password: get_credential(config, DATABASE_PASSWORD)?,
            },
        })
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
}

fn get<'a>(config: &'a ResolvedConfig, name: &str) -> ConfigResult<&'a Value> {
    config
        .get(name)
        .ok_or_else(|| ConfigError::MissingField(name.to_string()))
}

fn get_string(config: &ResolvedConfig, name: &str) -> ConfigResult<String> {
    get(config, name)?
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| invalid(name, "expected str"))
}

fn get_strings(config: &ResolvedConfig, name: &str) -> ConfigResult<Vec<String>> {
    get(config, name)?
        .as_str_items()
        .map(|items| items.into_iter().map(str::to_string).collect())
        .ok_or_else(|| invalid(name, "expected a sequence of str"))
}

fn get_credential(config: &ResolvedConfig, name: &str) -> ConfigResult<Option<String>> {
    match get(config, name)? {
        Value::None => Ok(None),
        Value::Str(s) => Ok(Some(s.clone())),
        _ => Err(invalid(name, "expected str or None")),
    }
}
