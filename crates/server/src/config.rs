use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use dataset::LoaderConfig;
use url::Url;

pub const SETTINGS_FILE: &str = "dashboard.toml";

#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub data_dir: PathBuf,
    pub cache_file: String,
    pub mapping_file: String,
    pub refresh: bool,
    pub source_url: String,
    pub country_code: String,
    pub country_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8050".into(),
            data_dir: PathBuf::from("."),
            cache_file: "Google Movements GB.csv".into(),
            mapping_file: "regions_csv.csv".into(),
            refresh: false,
            source_url: "https://www.gstatic.com/covid19/mobility/Global_Mobility_Report.csv"
                .into(),
            country_code: "GB".into(),
            country_name: "United Kingdom".into(),
        }
    }
}

impl Settings {
    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join(&self.cache_file)
    }

    pub fn mapping_path(&self) -> PathBuf {
        self.data_dir.join(&self.mapping_file)
    }

    pub fn loader_config(&self) -> anyhow::Result<LoaderConfig> {
        if self.refresh {
            Url::parse(&self.source_url)
                .with_context(|| format!("invalid source url '{}'", self.source_url))?;
        }

        Ok(LoaderConfig {
            cache_path: self.cache_path(),
            mapping_path: self.mapping_path(),
            source_url: self.source_url.clone(),
            country_code: self.country_code.clone(),
        })
    }

    fn apply(&mut self, key: &str, value: String) {
        match key {
            "bind_addr" => self.bind_addr = value,
            "data_dir" => self.data_dir = PathBuf::from(value),
            "cache_file" => self.cache_file = value,
            "mapping_file" => self.mapping_file = value,
            "refresh" => {
                if let Some(flag) = parse_flag(&value) {
                    self.refresh = flag;
                }
            }
            "source_url" => self.source_url = value,
            "country_code" => self.country_code = value,
            "country_name" => self.country_name = value,
            _ => {}
        }
    }
}

const KEYS: [&str; 8] = [
    "bind_addr",
    "data_dir",
    "cache_file",
    "mapping_file",
    "refresh",
    "source_url",
    "country_code",
    "country_name",
];

pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn load_settings() -> Settings {
    load_settings_from(Path::new(SETTINGS_FILE), |name| std::env::var(name).ok())
}

/// Defaults, then `file` (flat keys), then environment variables.
pub fn load_settings_from(file: &Path, env: impl Fn(&str) -> Option<String>) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(file) {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            for (key, value) in file_cfg {
                let value = match value {
                    toml::Value::String(text) => text,
                    other => other.to_string(),
                };
                settings.apply(&key, value);
            }
        }
    }

    if let Some(v) = env("DASHBOARD_BIND") {
        settings.bind_addr = v;
    }
    for key in KEYS {
        if let Some(v) = env(&format!("APP__{}", key.to_ascii_uppercase())) {
            settings.apply(key, v);
        }
    }

    settings
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
