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

//! Boundary to the external managed file-transfer client.
//!
//! Layout: `client.rs` (`TransferClient` trait and the `ascp` runner), `paths.rs`
//! (per-OS binary and key defaults), `error.rs` (`TransferError`).

pub mod client;
pub mod error;
pub mod paths;

pub use client::{AsperaClient, TransferClient, TransferReport, write_pair_list};
pub use error::{TransferError, TransferResult};
pub use paths::{AsperaPaths, HostOs};
