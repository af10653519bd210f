//! CLI configuration utilities

use anyhow::Result;
use portal_client::ClientConfig;
use std::path::{Path, PathBuf};

/// Environment prefix; `PORTAL_API_BASE_URL` sets `api_base_url`
const ENV_PREFIX: &str = "PORTAL";

/// Overrides where the session file lives
const STATE_DIR_ENV: &str = "PORTAL_STATE_DIR";

/// Settings the environment may override
const CONFIG_KEYS: [&str; 4] = ["api_base_url", "timeout_ms", "token_key", "login_path"];

/// Load client configuration: defaults, then the config file, then environment
pub fn load_client_config(config_file: Option<&Path>) -> Result<ClientConfig> {
    load_client_config_from(config_file, std::env::vars())
}

/// `PORTAL_*` variables that name a config key; `PORTAL_PASSWORD` and
/// `PORTAL_STATE_DIR` never reach the settings tree
fn config_env(vars: impl IntoIterator<Item = (String, String)>) -> config::Map<String, String> {
    let prefix = format!("{ENV_PREFIX}_");
    vars.into_iter()
        .filter(|(name, _)| {
            name.strip_prefix(&prefix)
                .is_some_and(|key| CONFIG_KEYS.contains(&key.to_lowercase().as_str()))
        })
        .collect()
}

fn load_client_config_from(
    config_file: Option<&Path>,
    vars: impl IntoIterator<Item = (String, String)>,
) -> Result<ClientConfig> {
    let defaults = ClientConfig::default();

    let mut builder = config::Config::builder()
        .set_default("api_base_url", defaults.api_base_url)?
        .set_default("timeout_ms", defaults.timeout_ms)?
        .set_default("token_key", defaults.token_key)?
        .set_default("login_path", defaults.login_path)?;

    builder = match config_file {
        // An explicit file has to exist
        Some(path) => builder.add_source(config::File::from(path)),
        None => match default_config_path() {
            Some(path) => builder.add_source(config::File::from(path).required(false)),
            None => builder,
        },
    };

    let settings = builder
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .ignore_empty(true)
                .try_parsing(true)
                .source(Some(config_env(vars))),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// `<config_dir>/portal/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("portal").join("config.toml"))
}

/// Directory holding the session file
pub fn state_dir(data_dir: Option<PathBuf>) -> PathBuf {
    data_dir.unwrap_or_else(|| {
        // Check environment variable first, then fall back to system data dir
        if let Ok(dir) = std::env::var(STATE_DIR_ENV) {
            PathBuf::from(dir)
        } else {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("portal")
        }
    })
}

pub fn session_file(state_dir: &Path) -> PathBuf {
    state_dir.join("session.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "api_base_url = \"https://portal.example.com\"\ntimeout_ms = 5000\n",
        )
        .unwrap();

        let config = load_client_config_from(Some(&path), Vec::new()).unwrap();
        assert_eq!(config.timeout_ms, 5000);
        assert_eq!(config.token_key, "access_token");
        assert_eq!(config.login_path, "/auth/login");
        assert_eq!(config.api_url(), "https://portal.example.com/api/v1");
    }

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_env_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "api_base_url = \"https://portal.example.com\"\n").unwrap();

        let env = vars(&[
            ("PORTAL_API_BASE_URL", "https://staging.example.com"),
            ("PORTAL_TIMEOUT_MS", "1500"),
            ("PORTAL_LOGIN_PATH", ""),
        ]);
        let config = load_client_config_from(Some(&path), env).unwrap();
        assert_eq!(config.api_url(), "https://staging.example.com/api/v1");
        assert_eq!(config.timeout_ms, 1500);
        // Empty values are ignored
        assert_eq!(config.login_path, "/auth/login");
    }

    #[test]
    fn test_env_keeps_unrelated_portal_vars_out() {
        let env = config_env(vars(&[
            ("PORTAL_API_BASE_URL", "https://staging.example.com"),
            ("PORTAL_PASSWORD", "hunter2"),
            ("PORTAL_STATE_DIR", "/tmp/portal"),
            ("HOME", "/root"),
        ]));
        assert_eq!(env.len(), 1);
        assert!(env.contains_key("PORTAL_API_BASE_URL"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");
        assert!(load_client_config_from(Some(&path), Vec::new()).is_err());
    }

    #[test]
    fn test_explicit_state_dir_wins() {
        let dir = PathBuf::from("/tmp/portal-state");
        assert_eq!(state_dir(Some(dir.clone())), dir);
        assert_eq!(
            session_file(&dir),
            PathBuf::from("/tmp/portal-state/session.json")
        );
    }
}
