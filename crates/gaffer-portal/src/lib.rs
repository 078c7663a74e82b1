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
#![allow(clippy::module_name_repetitions)]

//! Client side of the studio portal: session upkeep, catalog search and manifest setup.
//!
//! Layout:
//! - `credentials.rs`: persisted cookie jar
//! - `auth.rs`: session validation, interactive login orchestration, token exchange
//! - `login.rs`: interactive login collaborators
//! - `reauth.rs`: shared session context and the one-retry policy for protected calls
//! - `catalog.rs`: request and material search, response flattening
//! - `manifest.rs`: manifest setup and batch extraction
//! - `sse.rs`: subscription frame scanning
//! - `http.rs`, `endpoints.rs`, `queries.rs`: transport plumbing
//! - `portal.rs`: facade wiring the pieces from configuration

pub mod auth;
pub mod catalog;
pub mod credentials;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod login;
pub mod manifest;
pub mod portal;
pub(crate) mod queries;
pub mod reauth;
pub mod sse;
#[cfg(test)]
mod testing;

pub use auth::{SessionAuthenticator, random_string};
pub use catalog::{CatalogClient, MaterialSearch, extract_asset_info};
pub use credentials::{CredentialStore, FileCredentialStore, PersistedSession};
pub use endpoints::PortalEndpoints;
pub use error::{PortalError, PortalResult};
pub use http::PortalClient;
pub use login::{
    CommandLogin, InteractiveLogin, LoginRequest, PromptLogin, login_from_config,
    parse_cookie_header,
};
pub use manifest::{Manifest, ManifestResolver};
pub use portal::Portal;
pub use reauth::{AuthScheme, Credentials, SessionContext};
pub use sse::FrameScanner;
