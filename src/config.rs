//! Configuration manager for AgoraX.

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

const DEFAULT_CONFIG_PATH: &str = "config.yaml";
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    /// Instance name.
    pub name: String,
    /// Socket address to listen on.
    pub address: Option<String>,
    #[serde(default)]
    version: String,
    #[serde(skip)]
    path: PathBuf,
    /// Related to session token configuration.
    #[serde(skip_serializing)]
    pub token: Option<Token>,
    /// Related to document store configuration.
    #[serde(skip_serializing)]
    pub store: Option<Store>,
    /// Related to Argon2 configuration.
    #[serde(skip_serializing)]
    pub argon2: Option<Argon2>,
    /// Related to the federated identity provider.
    #[serde(skip_serializing)]
    pub identity: Option<Identity>,
    /// Related to automatic mail sending.
    #[serde(skip_serializing)]
    pub mail: Option<Mail>,
}

/// Document store configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Store {
    /// Backend holding the collections.
    pub backend: Backend,
    /// Connection string for the MongoDB instance.
    pub address: Option<String>,
    /// Database name.
    pub database: Option<String>,
}

/// Supported document store backends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Volatile in-process store.
    #[default]
    Memory,
    /// MongoDB collections.
    Mongodb,
}

/// Argon2 configuration.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Argon2 {
    /// Memory used while hashing.
    pub memory_cost: u32,
    /// Iterations of hash.
    pub iterations: u32,
    /// Parallelism degree.
    pub parallelism: u32,
    /// Output hash length.
    pub hash_length: usize,
}

impl Default for Argon2 {
    fn default() -> Self {
        Self {
            memory_cost: 1024 * 64, // 64 MiB.
            iterations: 4,
            parallelism: 2,
            hash_length: 32,
        }
    }
}

/// Federated identity provider configuration.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Base URL of the provider's REST API.
    pub endpoint: String,
}

/// Transactional mail configuration.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mail {
    /// Base URL of the mail API.
    pub endpoint: Option<String>,
    /// Sender mailbox, as `Name <mailbox@domain>`.
    pub from: String,
    /// Base URL used to build reset links.
    pub frontend_url: String,
}

/// Session token configuration.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Seconds before an issued token expires.
    pub expiration: Option<u64>,
}

impl Configuration {
    pub fn path(mut self, path: PathBuf) -> Self {
        self.path = path;
        self
    }

    /// Reads the `config.yaml` file from the specified path or the default
    /// location.
    pub fn read(self) -> Arc<Self> {
        let file_path = if self.path.is_file() {
            &self.path
        } else {
            &Path::new(DEFAULT_CONFIG_PATH).to_path_buf()
        };

        match File::open(file_path) {
            Ok(file) => {
                let mut config: Configuration = match serde_yaml::from_reader(file) {
                    Ok(config) => config,
                    Err(err) => {
                        return Arc::new(self.error(err));
                    },
                };

                // set app version.
                config.version = VERSION.to_owned();

                Arc::new(config)
            },
            Err(err) => Arc::new(self.error(err)),
        }
    }

    /// Return a default configuration as fallback.
    fn error(&self, err: impl std::error::Error) -> Self {
        tracing::error!(error = %err, "`config.yaml` file not found");
        Self {
            version: VERSION.to_owned(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_custom_path() {
        let path = std::env::temp_dir().join("agorax-config-test.yaml");
        std::fs::write(
            &path,
            "name: test\naddress: \"127.0.0.1:3000\"\nstore:\n  backend: memory\n",
        )
        .unwrap();

        let config = Configuration::default().path(path.clone()).read();

        assert_eq!(config.name, "test");
        assert_eq!(config.address.as_deref(), Some("127.0.0.1:3000"));
        assert_eq!(
            config.store.as_ref().map(|store| store.backend),
            Some(Backend::Memory)
        );

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn read_malformed_file_falls_back() {
        let path = std::env::temp_dir().join("agorax-config-broken.yaml");
        std::fs::write(&path, "name: [unclosed\n").unwrap();

        let config = Configuration::default().path(path.clone()).read();

        assert!(config.name.is_empty());
        assert!(config.store.is_none());

        std::fs::remove_file(path).unwrap();
    }
}
