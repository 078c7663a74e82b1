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

//! Domain model and selection policy for studio deliverable retrieval.
//!
//! Layout: `model/` (session, source request, material, batch and category types),
//! `selector.rs` (filtering, dedupe, categorization and best-bucket selection),
//! `error.rs` (model validation errors).

pub mod error;
pub mod model;
pub mod selector;

pub use error::{CoreError, CoreResult};
pub use model::{
    AccessToken, CategorizedAssetSet, Category, CategoryGroup, FileInfo, FileLocation, FilePair,
    Material, MaterialFilter, MaterialRequest, MaterialStatus, RequestFilter, ScalarId, Session,
    SessionEvent, SessionState, SourceRequest, StoredCookie, TransferBatch, TransportToken,
    is_plain_relative,
};
pub use selector::{
    categorize, dedupe_by_filename, filter_active, sanitize_for_transfer, select_best,
};
