use std::env;
use std::fs;
use std::path::Path;

use giftmatch_core::config::{config_file_path, AppConfig, LoadOptions, ENV_KEYS};
use toml::Value;

pub fn run(options: LoadOptions) -> String {
    let explicit_path = options.config_path.clone();
    let config = match AppConfig::load(options) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let file_path = config_file_path(explicit_path.as_deref());
    let file_doc = load_config_file_doc(file_path.as_deref());
    let source = |key_path: &str| {
        let env_key = ENV_KEYS
            .iter()
            .find(|(field, _)| *field == key_path)
            .map_or("", |(_, env_key)| *env_key);
        field_source(key_path, env_key, file_doc.as_ref(), file_path.as_deref())
    };

    let weights = config
        .matching
        .weights
        .entries()
        .iter()
        .map(|(name, weight)| format!("{name}={weight}"))
        .collect::<Vec<_>>()
        .join(", ");
    let max_per_category = config
        .matching
        .max_per_category
        .map(|cap| cap.to_string())
        .unwrap_or_else(|| "<unset>".to_string());

    let rows = [
        ("database.url", config.database.url.clone()),
        ("database.max_connections", config.database.max_connections.to_string()),
        ("database.timeout_secs", config.database.timeout_secs.to_string()),
        ("server.bind_address", config.server.bind_address.clone()),
        ("server.port", config.server.port.to_string()),
        ("server.graceful_shutdown_secs", config.server.graceful_shutdown_secs.to_string()),
        ("matching.weights", weights),
        ("matching.browse_limit", config.matching.browse_limit.to_string()),
        ("matching.max_retries", config.matching.max_retries.to_string()),
        ("matching.max_per_category", max_per_category),
        ("logging.level", config.logging.level.clone()),
        ("logging.format", format!("{:?}", config.logging.format)),
    ];

    let mut lines =
        vec!["effective config (source precedence: override > env > file > default):".to_string()];
    for (key, value) in rows {
        lines.push(render_line(key, &value, source(key)));
    }
    lines.join("\n")
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if !env_key.is_empty() && env::var_os(env_key).is_some() {
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

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use super::{contains_path, field_source};

    #[test]
    fn file_source_is_reported_for_keys_present_in_the_document() {
        let doc: toml::Value = "[matching]\nbrowse_limit = 6\n".parse().expect("toml");

        assert!(contains_path(&doc, "matching.browse_limit"));
        assert!(!contains_path(&doc, "matching.max_retries"));
        assert_eq!(
            field_source(
                "matching.browse_limit",
                "GIFTMATCH_TEST_UNSET_KEY",
                Some(&doc),
                Some(std::path::Path::new("giftmatch.toml")),
            ),
            "file (giftmatch.toml)"
        );
        assert_eq!(field_source("matching.max_retries", "", Some(&doc), None), "default");
    }
}
