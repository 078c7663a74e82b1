//! Built-in configuration values.
//!
//! # Design
//! - Endpoint defaults point at the production portal; override them in YAML for tests.
//! - Time-based defaults are explicit so the bounded waits are auditable.

/// Portal base URL; the OAuth redirect target is `<base>/meechum`.
pub const PORTAL_BASE_URL: &str = "https://backlot.netflixstudios.com";
/// Streaming subscription endpoint used for material search and manifest setup.
pub const GATEWAY_URL: &str = "https://studiogateway.prod.netflixstudios.com/subscriptions/sse";
/// Source type filter applied to request search.
pub const SOURCE_TYPE: &str = "SECONDARY_AUDIO_SOURCE";
/// Page size for request search; one page covers every request of a title.
pub const REQUEST_LIMIT: u32 = 25_000;

/// OAuth authorization endpoint.
pub const AUTHORIZE_URL: &str = "https://meechum.netflix.com/as/authorization.oauth2";
/// OAuth client identifier.
pub const CLIENT_ID: &str = "sourcedeliveriesui";
/// OAuth scope list.
pub const SCOPE: &str =
    "default+sourcedeliveriesui+studiogateway+jet_sap_sap_ui_backlot_ui-prod+studioplayback+e2eToken";
/// OAuth authentication strategy hint.
pub const AUTH_STRATEGY: &str = "NetflixPartnerLogin";

/// Upper bound on the interactive login wait.
pub const LOGIN_TIMEOUT_SECS: u64 = 300;
/// Timeout for ordinary JSON requests.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;
/// Timeout for subscription streams, covering the wait for the first data frame.
pub const STREAM_TIMEOUT_SECS: u64 = 120;
/// Browser-like user agent sent with every request.
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36";

/// Profile directory holding the persisted session.
pub const PROFILE_DIR: &str = "./profile";
/// File name of the persisted session inside the profile directory.
pub const SESSION_FILE: &str = "session.json";
/// Directory receiving per-title JSON artifacts.
pub const ARTIFACTS_DIR: &str = "./artifacts";
/// Download root handed to the transfer client.
pub const DOWNLOAD_DIR: &str = "./dl";
/// Transfer user when the manifest does not name one.
pub const TRANSFER_USER: &str = "filetransfer";
/// Overwrite policy passed to the transfer client.
pub const OVERWRITE_POLICY: &str = "diff";
/// Overwrite policies the transfer client accepts.
pub const OVERWRITE_POLICIES: [&str; 5] = ["never", "always", "diff", "older", "diff+older"];

/// Log level when neither `RUST_LOG` nor configuration set one.
pub const LOG_LEVEL: &str = "info";
