use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use client_core::{views::DEFAULT_PAGE_SIZE, DEFAULT_MODEL};
use serde::Deserialize;

pub const DEFAULT_CONFIG_FILE: &str = "dashboard.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub store_url: String,
    pub model: String,
    pub page_size: usize,
    pub request_timeout_secs: Option<u64>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_url: "http://127.0.0.1:8787".into(),
            model: DEFAULT_MODEL.into(),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout_secs: None,
            log_filter: "warn".into(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    store_url: Option<String>,
    model: Option<String>,
    page_size: Option<usize>,
    request_timeout_secs: Option<u64>,
    log_filter: Option<String>,
}

/// Defaults, then the TOML file, then environment variables.
///
/// An explicitly named file must exist; the default `dashboard.toml` is optional.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    load_settings_with(path, |key| std::env::var(key).ok())
}

fn load_settings_with(
    path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => {
            let file_cfg: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("invalid config file '{}'", path.display()))?;
            apply_file(&mut settings, file_cfg);
        }
        Err(err) if required => {
            return Err(anyhow::Error::new(err)
                .context(format!("failed to read config file '{}'", path.display())));
        }
        Err(_) => {}
    }

    if let Some(v) = env("DASHBOARD_STORE_URL") {
        settings.store_url = v;
    }
    if let Some(v) = env("APP__STORE_URL") {
        settings.store_url = v;
    }

    if let Some(v) = env("DASHBOARD_MODEL") {
        settings.model = v;
    }
    if let Some(v) = env("APP__MODEL") {
        settings.model = v;
    }

    if let Some(v) = env("APP__PAGE_SIZE") {
        if let Ok(parsed) = v.parse::<usize>() {
            settings.page_size = parsed.max(1);
        }
    }

    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = Some(parsed);
        }
    }

    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    Ok(settings)
}

fn apply_file(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.store_url {
        settings.store_url = v;
    }
    if let Some(v) = file_cfg.model {
        settings.model = v;
    }
    if let Some(v) = file_cfg.page_size {
        settings.page_size = v.max(1);
    }
    if let Some(v) = file_cfg.request_timeout_secs {
        settings.request_timeout_secs = Some(v);
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn explicit_file_overrides_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dashboard.toml");
        fs::write(
            &path,
            "store_url = \"http://store.internal:9000\"\npage_size = 25\n",
        )
        .expect("write config");

        let settings = load_settings_with(Some(path.as_path()), no_env).expect("settings");
        assert_eq!(settings.store_url, "http://store.internal:9000");
        assert_eq!(settings.page_size, 25);
        assert_eq!(settings.model, DEFAULT_MODEL);
    }

    #[test]
    fn environment_wins_over_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dashboard.toml");
        fs::write(&path, "model = \"from_file\"\nrequest_timeout_secs = 5\n").expect("write");

        let env: HashMap<&str, &str> = HashMap::from([
            ("DASHBOARD_MODEL", "legacy_env"),
            ("APP__MODEL", "from_env"),
            ("APP__PAGE_SIZE", "not-a-number"),
        ]);
        let settings = load_settings_with(Some(path.as_path()), |key| {
            env.get(key).map(|value| value.to_string())
        })
        .expect("settings");

        assert_eq!(settings.model, "from_env");
        assert_eq!(settings.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(settings.request_timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("absent.toml");
        assert!(load_settings_with(Some(path.as_path()), no_env).is_err());
    }

    #[test]
    fn malformed_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dashboard.toml");
        fs::write(&path, "page_size = \"many\"").expect("write");

        let err = load_settings_with(Some(path.as_path()), no_env).expect_err("bad type");
        assert!(err.to_string().contains("invalid config file"));
    }

    #[test]
    fn zero_timeout_means_no_timeout() {
        let settings = Settings {
            request_timeout_secs: Some(0),
            ..Settings::default()
        };
        assert_eq!(settings.request_timeout(), None);
    }
}
