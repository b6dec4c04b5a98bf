//! Configuration needed to talk to a Chef server.
//!
//! Settings come from the command line (or their environment variables) first,
//! then from a profile in the TOML credentials file (`~/.chef/credentials` by default):
//!
//! ```toml
//! [default]
//! client_name = "admin"
//! client_key = "admin.pem"
//! chef_server_url = "https://chef.example.com/organizations/acme"
//! ```
//!
//! A relative `client_key` is resolved against the directory of the credentials file.
//! The key can also be inlined as a PEM string.
use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use directories::BaseDirs;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Profile used when none is selected.
pub const DEFAULT_PROFILE: &str = "default";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read credentials file {}", .path.display())]
    ReadCredentials {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse credentials file {}", .path.display())]
    ParseCredentials {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("profile '{profile}' not found in the credentials file")]
    MissingProfile { profile: String },
    #[error("no {field} configured, set it in the credentials file or pass {flag}")]
    Missing {
        field: &'static str,
        flag: &'static str,
    },
    #[error("invalid Chef server URL '{url}'")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to read client key {}", .path.display())]
    ReadKey {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Values given on the command line or through environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub profile: Option<String>,
    pub server_url: Option<String>,
    pub client_name: Option<String>,
    pub client_key: Option<PathBuf>,
    pub credentials_file: Option<PathBuf>,
}

/// One table of the credentials file.
///
/// Other knife settings may live in the same table, they are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Profile {
    pub client_name: Option<String>,
    pub client_key: Option<String>,
    pub chef_server_url: Option<String>,
}

/// Parsed credentials file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialsFile {
    pub path: PathBuf,
    pub profiles: BTreeMap<String, Profile>,
}

impl CredentialsFile {
    pub fn parse(path: impl Into<PathBuf>, contents: &str) -> Result<Self, ConfigError> {
        let path = path.into();
        let profiles = toml::from_str(contents).map_err(|source| ConfigError::ParseCredentials {
            path: path.clone(),
            source,
        })?;

        Ok(Self { path, profiles })
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::ReadCredentials {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(path, &contents)
    }

    fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Where the private key used to sign requests comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientKey {
    File(PathBuf),
    Inline(String),
}

impl ClientKey {
    /// Return the PEM encoded key, reading it from disk if needed.
    pub fn read_pem(&self) -> Result<String, ConfigError> {
        match self {
            Self::File(path) => fs::read_to_string(path).map_err(|source| ConfigError::ReadKey {
                path: path.clone(),
                source,
            }),
            Self::Inline(pem) => Ok(pem.clone()),
        }
    }
}

/// Fully resolved settings for the Chef server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChefConfig {
    pub server_url: Url,
    pub client_name: String,
    pub client_key: ClientKey,
}

impl ChefConfig {
    /// Load the credentials file (if any) and resolve the settings.
    ///
    /// The default credentials file is optional, a file passed explicitly must exist.
    pub fn load(overrides: &ConfigOverrides) -> Result<Self, ConfigError> {
        let credentials = match &overrides.credentials_file {
            Some(path) => Some(CredentialsFile::read(path)?),
            None => match default_credentials_path() {
                Some(path) if path.is_file() => Some(CredentialsFile::read(&path)?),
                _ => None,
            },
        };

        Self::resolve(overrides, credentials.as_ref())
    }

    /// Combine the overrides with the selected profile of the credentials file.
    pub fn resolve(
        overrides: &ConfigOverrides,
        credentials: Option<&CredentialsFile>,
    ) -> Result<Self, ConfigError> {
        let profile_name = overrides.profile.as_deref().unwrap_or(DEFAULT_PROFILE);
        let profile = credentials.and_then(|file| file.profiles.get(profile_name));

        // Only a profile that was asked for explicitly has to exist.
        if profile.is_none() && overrides.profile.is_some() {
            return Err(ConfigError::MissingProfile {
                profile: profile_name.to_string(),
            });
        }

        let profile = profile.cloned().unwrap_or_default();
        debug!(profile = profile_name, "resolving Chef server configuration");

        let server_url = overrides
            .server_url
            .clone()
            .or(profile.chef_server_url)
            .ok_or(ConfigError::Missing {
                field: "chef_server_url",
                flag: "--server-url",
            })?;
        let server_url = Url::parse(&server_url).map_err(|source| ConfigError::InvalidUrl {
            url: server_url.clone(),
            source,
        })?;

        let client_name = overrides
            .client_name
            .clone()
            .or(profile.client_name)
            .ok_or(ConfigError::Missing {
                field: "client_name",
                flag: "--user",
            })?;

        let client_key = match (&overrides.client_key, profile.client_key) {
            (Some(path), _) => ClientKey::File(path.clone()),
            (None, Some(key)) if key.trim_start().starts_with("-----BEGIN") => {
                ClientKey::Inline(key)
            }
            (None, Some(key)) => {
                let base = credentials
                    .map(CredentialsFile::directory)
                    .unwrap_or_else(|| Path::new("."));
                ClientKey::File(base.join(key))
            }
            (None, None) => {
                return Err(ConfigError::Missing {
                    field: "client_key",
                    flag: "--key",
                });
            }
        };

        Ok(Self {
            server_url,
            client_name,
            client_key,
        })
    }
}

/// `~/.chef/credentials`, when the home directory is known.
pub fn default_credentials_path() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().join(".chef").join("credentials"))
}
