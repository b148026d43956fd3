use config::{Config, ConfigError, File as ConfigFile};
use serde::Deserialize;

fn default_cache_path() -> String {
    "mail_hash_cache.db".to_string()
}

fn default_chunk_size() -> usize {
    100
}

fn default_max_workers() -> usize {
    4
}

fn default_criteria() -> String {
    "strict".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub root_paths: Vec<String>,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
    #[serde(default = "default_cache_path")]
    pub cache_path: String,
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    #[serde(default = "default_criteria")]
    pub criteria: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root_paths: Vec::new(),
            ignore_patterns: Vec::new(),
            cache_path: default_cache_path(),
            chunk_size: default_chunk_size(),
            max_workers: default_max_workers(),
            criteria: default_criteria(),
        }
    }
}

pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
