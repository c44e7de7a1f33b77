use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DB_FILE_NAME: &str = "campus.db";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// Lifetime of a login session token, in hours.
    pub session_ttl_hours: i64,
}

impl ServerConfig {
    /// Reads a TOML config file. Missing keys fall back to the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.session_ttl_hours <= 0 {
            return Err(Error::Config(
                "session_ttl_hours must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            session_ttl_hours: 24,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_partial_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("campus.toml");
        fs::write(&path, "port = 9090\n").unwrap();

        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.session_ttl_hours, 24);
        assert_eq!(config.db_path(), PathBuf::from("./data/campus.db"));
    }

    #[test]
    fn test_load_rejects_unknown_keys() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("campus.toml");
        fs::write(&path, "prot = 9090\n").unwrap();

        assert!(matches!(ServerConfig::load(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_load_rejects_non_positive_ttl() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("campus.toml");
        fs::write(&path, "session_ttl_hours = 0\n").unwrap();

        assert!(ServerConfig::load(&path).is_err());
    }
}
