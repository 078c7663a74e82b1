//! Default locations of the `ascp` binary and its identity key.
//!
//! # Design
//! - Explicit configuration always wins over the per-OS defaults.
//! - macOS prefers the per-user app bundle and falls back to the system one.

use std::path::{Path, PathBuf};

use gaffer_config::TransferConfig;

use crate::error::{TransferError, TransferResult};

const MAC_BUNDLE: &str = "Applications/Aspera Connect.app/Contents/Resources";
const WINDOWS_ROOT: &str = r"C:\Program Files (x86)\Aspera\Aspera Connect";
const LINUX_ROOT: &str = ".aspera/connect";
const KEY_FILE: &str = "asperaweb_id_dsa.openssh";

/// Operating systems with a known client layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    /// macOS app bundle.
    MacOs,
    /// Windows Program Files install.
    Windows,
    /// Per-user Linux install.
    Linux,
}

impl HostOs {
    /// The platform this binary runs on.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::UnsupportedPlatform`] on any other OS.
    pub fn current() -> TransferResult<Self> {
        match std::env::consts::OS {
            "macos" => Ok(Self::MacOs),
            "windows" => Ok(Self::Windows),
            "linux" => Ok(Self::Linux),
            os => Err(TransferError::UnsupportedPlatform { os }),
        }
    }
}

/// Resolved client binary and key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsperaPaths {
    /// `ascp` executable.
    pub ascp: PathBuf,
    /// Identity key passed with `-i`.
    pub key: PathBuf,
}

impl AsperaPaths {
    /// Resolve from configuration, filling gaps with the defaults of this platform.
    ///
    /// # Errors
    ///
    /// Returns [`TransferError::UnsupportedPlatform`] when a default is needed on an
    /// unknown platform.
    pub fn resolve(config: &TransferConfig) -> TransferResult<Self> {
        if let (Some(ascp), Some(key)) = (&config.ascp_path, &config.key_path) {
            return Ok(Self {
                ascp: ascp.clone(),
                key: key.clone(),
            });
        }
        let defaults = Self::defaults_for(HostOs::current()?, dirs::home_dir().as_deref(), |p| {
            p.exists()
        });
        Ok(Self {
            ascp: config.ascp_path.clone().unwrap_or(defaults.ascp),
            key: config.key_path.clone().unwrap_or(defaults.key),
        })
    }

    /// Default layout for `os`, probing user-local installs with `exists`.
    pub fn defaults_for(os: HostOs, home: Option<&Path>, exists: impl Fn(&Path) -> bool) -> Self {
        let home = home.map_or_else(|| PathBuf::from("~"), Path::to_path_buf);
        match os {
            HostOs::MacOs => {
                let user = home.join(MAC_BUNDLE);
                let system = Path::new("/").join(MAC_BUNDLE);
                let pick = |name: &str| {
                    let candidate = user.join(name);
                    if exists(&candidate) {
                        candidate
                    } else {
                        system.join(name)
                    }
                };
                Self {
                    ascp: pick("ascp"),
                    key: pick(KEY_FILE),
                }
            }
            HostOs::Windows => {
                let root = PathBuf::from(WINDOWS_ROOT);
                Self {
                    ascp: root.join("bin").join("ascp.exe"),
                    key: root.join("etc").join(KEY_FILE),
                }
            }
            HostOs::Linux => {
                let root = home.join(LINUX_ROOT);
                Self {
                    ascp: root.join("bin").join("ascp"),
                    key: root.join("etc").join(KEY_FILE),
                }
            }
        }
    }
}
