use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Settings for the token service client, loaded from YAML:
///
/// ```yaml
/// token_service_url: https://sso.example.com/token
/// proxy_url: http://proxy.example.com:8080   # optional
/// api_key_env: AUTH_TOKEN_API_KEY            # optional, this is the default
/// ```
///
/// The API key itself never lives in the file; only the name of the
/// environment variable it is read from.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthorizationSettings {
    pub token_service_url: String,
    #[serde(default)]
    pub proxy_url: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

fn default_api_key_env() -> String {
    "AUTH_TOKEN_API_KEY".to_owned()
}

impl AuthorizationSettings {
    /// Resolve the API key from the configured environment variable.
    pub fn api_key(&self) -> Result<String> {
        let api_key = env::var(&self.api_key_env)
            .with_context(|| format!("environment variable '{}' is not set", self.api_key_env))?;
        if api_key.is_empty() {
            bail!("environment variable '{}' is empty", self.api_key_env);
        }
        Ok(api_key)
    }
}

/// Load and validate settings from a YAML file.
pub fn load_settings(path: impl AsRef<Path>) -> Result<AuthorizationSettings> {
    let path = path.as_ref();
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
    let settings: AuthorizationSettings = serde_yaml::from_str(&raw)
        .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
    if settings.token_service_url.is_empty() {
        bail!("settings file '{}' has an empty token_service_url", path.display());
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_settings(yaml: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("temp file");
        file.write_all(yaml.as_bytes()).expect("write settings");
        file
    }

    #[test]
    fn load_settings_applies_defaults() {
        let file = write_settings("token_service_url: https://sso.example.com/token\n");
        let settings = load_settings(file.path()).unwrap();
        assert_eq!(settings.token_service_url, "https://sso.example.com/token");
        assert_eq!(settings.api_key_env, "AUTH_TOKEN_API_KEY");
        assert!(settings.proxy_url.is_none());
    }

    #[test]
    fn load_settings_reads_proxy_and_api_key_env() {
        let file = write_settings(
            "token_service_url: https://sso.example.com/token\n\
             proxy_url: http://proxy.example.com:8080\n\
             api_key_env: SSO_API_KEY\n",
        );
        let settings = load_settings(file.path()).unwrap();
        assert_eq!(settings.proxy_url.as_deref(), Some("http://proxy.example.com:8080"));
        assert_eq!(settings.api_key_env, "SSO_API_KEY");
    }

    #[test]
    fn load_settings_rejects_empty_url() {
        let file = write_settings("token_service_url: \"\"\n");
        assert!(load_settings(file.path()).is_err());
    }

    #[test]
    #[serial]
    fn api_key_resolves_from_environment() {
        let settings = AuthorizationSettings {
            token_service_url: "https://sso.example.com/token".into(),
            proxy_url: None,
            api_key_env: "TEST_AUTH_TOKEN_API_KEY".into(),
        };
        std::env::set_var("TEST_AUTH_TOKEN_API_KEY", "api-key-123");
        assert_eq!(settings.api_key().unwrap(), "api-key-123");

        std::env::set_var("TEST_AUTH_TOKEN_API_KEY", "");
        assert!(settings.api_key().is_err());

        std::env::remove_var("TEST_AUTH_TOKEN_API_KEY");
        assert!(settings.api_key().is_err());
    }
}
