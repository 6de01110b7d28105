use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub facility: FacilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

/// Where records are persisted.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// One JSON file per store under `data_dir`.
    #[default]
    File,
    /// Process-local; nothing survives a restart.
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default)]
    pub backend: StorageBackend,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { data_dir: default_data_dir(), backend: StorageBackend::default() }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FacilityConfig {
    /// Principal recorded as owner on first start.
    #[serde(default)]
    pub owner: String,
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u8,
}

impl Default for FacilityConfig {
    fn default() -> Self {
        Self { owner: String::new(), max_capacity: default_max_capacity() }
    }
}

fn default_data_dir() -> String { "data".to_string() }
pub fn default_max_capacity() -> u8 { 50 }

pub const ANONYMOUS_OWNER: &str = "anonymous";

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Like `load_and_validate`, but a missing config file yields defaults.
    pub fn load_or_default() -> Result<Self> {
        let mut cfg = match load_default() {
            Ok(cfg) => cfg,
            Err(e) if e.downcast_ref::<std::io::Error>().is_some() => AppConfig::default(),
            Err(e) => return Err(e),
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.storage.normalize();
        self.facility.normalize_from_env();
        self.facility.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        match self.worker_threads {
            Some(w) if w > 0 => {}
            _ => self.worker_threads = Some(4),
        }
        Ok(())
    }
}

impl StorageConfig {
    fn normalize(&mut self) {
        if self.data_dir.trim().is_empty() {
            self.data_dir = default_data_dir();
        }
    }
}

impl FacilityConfig {
    pub fn normalize_from_env(&mut self) {
        // owner falls back to CARE_HOME_OWNER, then to the anonymous principal
        if self.owner.trim().is_empty() {
            self.owner = std::env::var("CARE_HOME_OWNER")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| ANONYMOUS_OWNER.to_string());
        }
        self.owner = self.owner.trim().to_string();
    }

    /// True when no owner was configured and the anonymous principal stands in.
    pub fn uses_anonymous_owner(&self) -> bool {
        self.owner == ANONYMOUS_OWNER
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_capacity == 0 {
            return Err(anyhow!("facility.max_capacity must be >= 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_toml_with_defaults() -> Result<()> {
        let mut cfg: AppConfig = toml::from_str(
            r#"
            [server]
            host = ""
            port = 9000

            [storage]
            backend = "memory"

            [facility]
            owner = "  admin-principal  "
            "#,
        )?;
        cfg.normalize_and_validate()?;
        assert_eq!(cfg.server.host, "127.0.0.1");
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.worker_threads, Some(4));
        assert_eq!(cfg.storage.backend, StorageBackend::Memory);
        assert_eq!(cfg.storage.data_dir, "data");
        assert_eq!(cfg.facility.owner, "admin-principal");
        assert_eq!(cfg.facility.max_capacity, 50);
        Ok(())
    }

    #[test]
    fn rejects_zero_capacity_and_port() {
        let mut cfg: AppConfig = toml::from_str("[facility]\nowner = \"a\"\nmax_capacity = 0\n").unwrap();
        assert!(cfg.normalize_and_validate().is_err());

        let mut cfg: AppConfig = toml::from_str("[server]\nhost = \"0.0.0.0\"\nport = 0\n").unwrap();
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn anonymous_owner_is_flagged() {
        let fallback = FacilityConfig { owner: ANONYMOUS_OWNER.into(), max_capacity: 5 };
        assert!(fallback.uses_anonymous_owner());

        let named = FacilityConfig { owner: "admin".into(), max_capacity: 5 };
        assert!(!named.uses_anonymous_owner());
    }

    #[test]
    fn empty_config_uses_defaults() -> Result<()> {
        let mut cfg: AppConfig = toml::from_str("")?;
        cfg.facility.owner = "owner-a".into();
        cfg.normalize_and_validate()?;
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.storage.backend, StorageBackend::File);
        assert_eq!(cfg.facility.max_capacity, 50);
        Ok(())
    }
}
