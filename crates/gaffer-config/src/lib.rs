#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! File- and environment-backed configuration for the gaffer workspace.
//!
//! Layout: `model.rs` (typed sections), `defaults.rs` (built-in values),
//! `loader.rs` (YAML + environment layering), `validate.rs` (field checks),
//! `error.rs` (`ConfigError`).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{CONFIG_ENV, from_yaml_str, load, load_with_env};
pub use model::{
    GafferConfig, HttpConfig, LoggingSettings, LoginConfig, LoginMode, NotifyConfig,
    OAuthConfig, PortalConfig, StorageConfig, TransferConfig,
};
pub use validate::validate;
