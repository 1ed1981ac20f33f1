mod types;

pub use types::*;

use crate::{Error, Result};
use std::env;
use tracing::debug;

pub async fn load() -> Result<Config> {
    let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

    debug!("Loading configuration from: {}", config_path);

    let config_str = tokio::fs::read_to_string(&config_path).await?;
    let config = parse(&config_str)?;

    apply_overrides(config, |key| env::var(key).ok())
}

pub fn parse(config_str: &str) -> Result<Config> {
    Ok(serde_yaml::from_str(config_str)?)
}

/// Layers environment variables over the parsed file. `lookup` is injected so
/// tests do not have to mutate the process environment.
pub fn apply_overrides<F>(mut config: Config, lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(dir) = lookup("UPLOADS_DIR") {
        config.server.uploads_dir = dir.into();
    }
    if let Some(path) = lookup("MODEL_PATH") {
        config.model.path = path.into();
    }

    let proxy_keys = ["GROQ_API_KEY", "GROQ_ENDPOINT", "GROQ_MODEL", "PROXY_PORT"];
    if config.proxy.is_some() || proxy_keys.iter().any(|key| lookup(key).is_some()) {
        let proxy = config.proxy.get_or_insert_with(ProxyConfig::default);
        if let Some(key) = lookup("GROQ_API_KEY") {
            proxy.api_key = key;
        }
        if let Some(endpoint) = lookup("GROQ_ENDPOINT") {
            proxy.endpoint = endpoint;
        }
        if let Some(model) = lookup("GROQ_MODEL") {
            proxy.model = model;
        }
        if let Some(port) = lookup("PROXY_PORT") {
            proxy.port = port
                .parse()
                .map_err(|_| Error::config(format!("Invalid PROXY_PORT: '{}'", port)))?;
        }
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::path::PathBuf;

    const MINIMAL: &str = r#"
model:
  path: "best.onnx"
"#;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse(MINIMAL).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 10000);
        assert_eq!(config.server.logs.level, "info");
        assert_eq!(config.server.uploads_dir, PathBuf::from("uploads"));
        assert_eq!(config.server.max_upload_bytes, 16 * 1024 * 1024);
        assert_eq!(config.model.input_size, 224);
        assert!(!config.model.softmax);
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_missing_model_section_is_rejected() {
        assert!(parse("server:\n  port: 9000\n").is_err());
    }

    #[test]
    fn test_proxy_section_defaults() {
        let config = parse(&format!("{}proxy: {{}}\n", MINIMAL)).unwrap();
        let proxy = config.proxy.unwrap();

        assert_eq!(proxy.port, 5000);
        assert_eq!(proxy.model, "llama-3.1-8b-instant");
        assert_eq!(proxy.timeout_secs, 30);
        assert!(proxy.api_key.is_empty());
    }

    #[test]
    fn test_env_overrides_take_precedence() {
        let config = parse(MINIMAL).unwrap();
        let config = apply_overrides(
            config,
            env_of(&[
                ("UPLOADS_DIR", "/tmp/staging"),
                ("GROQ_API_KEY", "secret"),
                ("PROXY_PORT", "5050"),
            ]),
        )
        .unwrap();

        assert_eq!(config.server.uploads_dir, PathBuf::from("/tmp/staging"));
        let proxy = config.proxy.unwrap();
        assert_eq!(proxy.api_key, "secret");
        assert_eq!(proxy.port, 5050);
    }

    #[test]
    fn test_no_proxy_env_keeps_proxy_disabled() {
        let config = apply_overrides(parse(MINIMAL).unwrap(), env_of(&[])).unwrap();
        assert!(config.proxy.is_none());
    }

    #[test]
    fn test_invalid_proxy_port_is_config_error() {
        let result = apply_overrides(parse(MINIMAL).unwrap(), env_of(&[("PROXY_PORT", "abc")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
