//! Server settings loaded from the config file.

use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use sidgate_core::{Configuration, ParseError};
use sidgate_oauth::GoogleClientConfig;

/// Settings error. Every variant names the file it came from.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("{origin}: {source}")]
    Open {
        origin: String,
        source: std::io::Error,
    },
    #[error("{origin}: {source}")]
    Parse { origin: String, source: ParseError },
    #[error("{origin}: must select either server.address or server.socket")]
    NoListener { origin: String },
    #[error("{origin}: cannot use both server.address and server.socket")]
    BothListeners { origin: String },
}

/// Where the server accepts connections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Listen {
    Tcp(String),
    Unix(PathBuf),
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub listen: Listen,
    pub base_dir: String,
    pub user_dir: PathBuf,
    pub data_dir: PathBuf,
    pub google: GoogleClientConfig,
}

#[derive(Default)]
struct ServerSection {
    address: String,
    socket: String,
    datastore: String,
}

impl Settings {
    /// Load settings from a config file.
    ///
    /// # Errors
    /// Returns error if the file cannot be read or its contents are invalid.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let origin = path.display().to_string();
        let file = File::open(path).map_err(|source| SettingsError::Open {
            origin: origin.clone(),
            source,
        })?;
        Self::from_reader(BufReader::new(file), &origin)
    }

    /// Parse settings from any reader; `origin` labels errors.
    ///
    /// # Errors
    /// Returns error on malformed config or an invalid listener choice.
    pub fn from_reader(reader: impl BufRead, origin: &str) -> Result<Self, SettingsError> {
        let mut server = ServerSection::default();
        let mut google = GoogleClientConfig::default();

        let mut cfg = Configuration::new();
        cfg.section("google-auth")
            .bind("client-id", &mut google.client_id)
            .bind("client-secret", &mut google.client_secret)
            .bind("redirect-uri", &mut google.redirect_uri);
        cfg.section("server")
            .bind("address", &mut server.address)
            .bind("fcgi-socket", &mut server.socket)
            .bind("datastore", &mut server.datastore);
        cfg.parse(reader).map_err(|source| SettingsError::Parse {
            origin: origin.to_string(),
            source,
        })?;

        let listen = match (server.address.is_empty(), server.socket.is_empty()) {
            (true, true) => {
                return Err(SettingsError::NoListener {
                    origin: origin.to_string(),
                });
            }
            (false, false) => {
                return Err(SettingsError::BothListeners {
                    origin: origin.to_string(),
                });
            }
            (false, true) => Listen::Tcp(normalize_address(&server.address)),
            (true, false) => Listen::Unix(PathBuf::from(server.socket)),
        };

        let mut base_dir = server.datastore;
        if !base_dir.ends_with('/') {
            base_dir.push('/');
        }

        Ok(Self {
            listen,
            user_dir: PathBuf::from(format!("{base_dir}user/")),
            data_dir: PathBuf::from(format!("{base_dir}data/")),
            base_dir,
            google,
        })
    }
}

/// `:8080` means every interface.
fn normalize_address(address: &str) -> String {
    if address.starts_with(':') {
        format!("0.0.0.0{address}")
    } else {
        address.to_string()
    }
}
