use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

/// Configuration for the numtree server and tooling.
///
/// Every field has a default, so a partial (or absent) config file is fine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NumtreeConfig {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub auth: AuthSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: SocketAddr,
    /// Mirror any origin (development only)
    pub cors_permissive: bool,
    /// Origins allowed to make credentialed requests
    pub allowed_origins: Vec<String>,
    /// Built single-page UI to serve for non-API paths
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            cors_permissive: false,
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
            static_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/numtree".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    pub session_ttl_hours: u32,
    /// Mark the session cookie `Secure` (HTTPS deployments)
    pub secure_cookies: bool,
}

impl Default for AuthSection {
    fn default() -> Self {
        Self {
            session_ttl_hours: 24 * 7,
            secure_cookies: false,
        }
    }
}

impl NumtreeConfig {
    /// Load configuration.
    ///
    /// With an explicit `path` the file must exist. Without one,
    /// `~/.numtree/config.toml` is used when present, built-in defaults
    /// otherwise. Environment overrides are applied on top, then the result
    /// is validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let default_path = Self::config_path();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    tracing::debug!(path = ?default_path, "no config file, using defaults");
                    Self::default()
                }
            }
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| CoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&content).map_err(|source| CoreError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get config file path: ~/.numtree/config.toml
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".numtree/config.toml")
    }

    /// Apply environment overrides.
    ///
    /// - `DATABASE_URL` replaces `database.url`
    /// - `NUMTREE_BIND` replaces `server.bind`
    /// - `PORT` replaces only the port of `server.bind`
    /// - `NUMTREE_STATIC_DIR` sets `server.static_dir`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database.url = url;
        }

        if let Some(bind) = lookup("NUMTREE_BIND") {
            self.server.bind = bind
                .parse()
                .map_err(|_| CoreError::config(format!("NUMTREE_BIND is not an address: {bind}")))?;
        }

        if let Some(port) = lookup("PORT") {
            let port: u16 = port
                .parse()
                .map_err(|_| CoreError::config(format!("PORT is not a port number: {port}")))?;
            self.server.bind.set_port(port);
        }

        if let Some(dir) = lookup("NUMTREE_STATIC_DIR") {
            self.server.static_dir = Some(PathBuf::from(dir));
        }

        Ok(())
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.database.url.trim().is_empty() {
            return Err(CoreError::config("database.url cannot be empty"));
        }
        if self.database.max_connections == 0 {
            return Err(CoreError::config("database.max_connections must be at least 1"));
        }
        if self.auth.session_ttl_hours == 0 {
            return Err(CoreError::config("auth.session_ttl_hours must be at least 1"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_valid() {
        let config = NumtreeConfig::default();
        assert_eq!(config.server.bind.port(), 8080);
        assert!(!config.server.cors_permissive);
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.auth.session_ttl_hours, 168);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[database]\nurl = \"postgres://db/numtree\"\n\n[server]\nstatic_dir = \"dist\""
        )
        .unwrap();

        let config = NumtreeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.database.url, "postgres://db/numtree");
        assert_eq!(config.database.max_connections, 5);
        assert_eq!(config.server.static_dir, Some(PathBuf::from("dist")));
        assert_eq!(config.server.bind.port(), 8080);
    }

    #[test]
    fn invalid_toml_is_reported() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nbind = 42").unwrap();

        let err = NumtreeConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, CoreError::Toml { .. }));
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let err = NumtreeConfig::load(Some(Path::new("/nonexistent/numtree.toml"))).unwrap_err();
        assert!(matches!(err, CoreError::Io { .. }));
    }

    #[test]
    fn env_overrides() {
        let mut config = NumtreeConfig::default();
        config
            .apply_env(env(&[
                ("DATABASE_URL", "postgres://env/db"),
                ("PORT", "9000"),
                ("NUMTREE_STATIC_DIR", "/srv/ui"),
            ]))
            .unwrap();

        assert_eq!(config.database.url, "postgres://env/db");
        assert_eq!(config.server.bind.to_string(), "127.0.0.1:9000");
        assert_eq!(config.server.static_dir, Some(PathBuf::from("/srv/ui")));
    }

    #[test]
    fn port_applies_after_bind() {
        let mut config = NumtreeConfig::default();
        config
            .apply_env(env(&[("NUMTREE_BIND", "0.0.0.0:3000"), ("PORT", "8081")]))
            .unwrap();
        assert_eq!(config.server.bind.to_string(), "0.0.0.0:8081");
    }

    #[test]
    fn bad_env_values_rejected() {
        let mut config = NumtreeConfig::default();
        assert!(config.apply_env(env(&[("PORT", "eighty")])).is_err());
        assert!(config.apply_env(env(&[("NUMTREE_BIND", "nowhere")])).is_err());
    }

    #[test]
    fn validate_rejects_zero_limits() {
        let mut config = NumtreeConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());

        let mut config = NumtreeConfig::default();
        config.auth.session_ttl_hours = 0;
        assert!(config.validate().is_err());
    }
}
