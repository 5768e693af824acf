use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tenderflow_core::config::{AppConfig, LoadOptions, DEFAULT_CONFIG_FILE, NESTED_CONFIG_FILE};
use toml::Value;

use crate::commands::CommandResult;

/// Config keys paired with the environment variable that overrides them.
const FIELDS: &[(&str, &str)] = &[
    ("database.url", "TENDERFLOW_DATABASE_URL"),
    ("database.max_connections", "TENDERFLOW_DATABASE_MAX_CONNECTIONS"),
    ("database.timeout_secs", "TENDERFLOW_DATABASE_TIMEOUT_SECS"),
    ("server.bind_address", "TENDERFLOW_SERVER_BIND_ADDRESS"),
    ("server.port", "TENDERFLOW_SERVER_PORT"),
    ("server.health_check_port", "TENDERFLOW_SERVER_HEALTH_CHECK_PORT"),
    ("server.graceful_shutdown_secs", "TENDERFLOW_SERVER_GRACEFUL_SHUTDOWN_SECS"),
    ("decisions.max_quorum", "TENDERFLOW_DECISIONS_MAX_QUORUM"),
    ("pagination.default_limit", "TENDERFLOW_PAGINATION_DEFAULT_LIMIT"),
    ("pagination.max_limit", "TENDERFLOW_PAGINATION_MAX_LIMIT"),
    ("logging.level", "TENDERFLOW_LOGGING_LEVEL"),
    ("logging.format", "TENDERFLOW_LOGGING_FORMAT"),
];

fn effective_value(config: &AppConfig, key: &str) -> String {
    match key {
        "database.url" => redact_url(&config.database.url),
        "database.max_connections" => config.database.max_connections.to_string(),
        "database.timeout_secs" => config.database.timeout_secs.to_string(),
        "server.bind_address" => config.server.bind_address.clone(),
        "server.port" => config.server.port.to_string(),
        "server.health_check_port" => config.server.health_check_port.to_string(),
        "server.graceful_shutdown_secs" => config.server.graceful_shutdown_secs.to_string(),
        "decisions.max_quorum" => config.decisions.max_quorum.to_string(),
        "pagination.default_limit" => config.pagination.default_limit.to_string(),
        "pagination.max_limit" => config.pagination.max_limit.to_string(),
        "logging.level" => config.logging.level.clone(),
        "logging.format" => format!("{:?}", config.logging.format).to_lowercase(),
        _ => "<unknown>".to_string(),
    }
}

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "config",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            )
        }
    };

    CommandResult::success("config", render(&config, detect_config_path().as_deref()))
}

pub fn render(config: &AppConfig, config_file_path: Option<&Path>) -> String {
    let config_file_doc = load_config_file_doc(config_file_path);

    let mut lines =
        vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, env_key) in FIELDS {
        let source = field_source(key, env_key, config_file_doc.as_ref(), config_file_path);
        lines.push(format!("- {key} = {} (source: {source})", effective_value(config, key)));
    }
    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    [DEFAULT_CONFIG_FILE, NESTED_CONFIG_FILE].into_iter().map(PathBuf::from).find(|p| p.exists())
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let raw = fs::read_to_string(path?).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

/// Hides credentials embedded in a connection URL.
fn redact_url(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            format!("{}://***{}", &url[..scheme_end], &url[at..])
        }
        _ => url.to_string(),
    }
}
