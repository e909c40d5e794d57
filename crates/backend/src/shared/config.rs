use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    pub path: String,
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
port = 3000

[store]
path = "target/db/rental.db"
"#;

/// Load configuration from a config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. The current working directory
/// 3. Falls back to the embedded default config
pub fn load_config() -> anyhow::Result<Config> {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.push(exe_dir.join("config.toml"));
        }
    }
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join("config.toml"));
    }

    for candidate in candidates {
        if candidate.exists() {
            tracing::info!("Loading config from: {}", candidate.display());
            let contents = std::fs::read_to_string(&candidate)?;
            let config: Config = toml::from_str(&contents)?;
            return Ok(config);
        }
    }

    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}

/// Resolve the document database path from configuration.
/// Relative paths are resolved against the executable directory.
pub fn resolve_store_path(config: &Config) -> anyhow::Result<PathBuf> {
    let raw = Path::new(&config.store.path);
    if raw.is_absolute() {
        return Ok(raw.to_path_buf());
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            return Ok(exe_dir.join(raw));
        }
    }

    // Fallback: relative to the current directory
    Ok(raw.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.store.path, "target/db/rental.db");
    }

    #[test]
    fn test_absolute_store_path_is_kept() {
        let mut config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        config.store.path = "/var/lib/rental/rental.db".into();
        let resolved = resolve_store_path(&config).unwrap();
        assert_eq!(resolved, PathBuf::from("/var/lib/rental/rental.db"));
    }
}
