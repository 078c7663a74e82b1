//! Typed domain records exchanged between the portal client, the selector and the
//! transfer client.

mod batch;
mod category;
mod material;
mod session;

pub use batch::{FilePair, TransferBatch, TransportToken, is_plain_relative};
pub use category::{CategorizedAssetSet, Category, CategoryGroup};
pub use material::{
    FileInfo, FileLocation, Material, MaterialFilter, MaterialRequest, MaterialStatus,
    RequestFilter, ScalarId, SourceRequest,
};
pub use session::{AccessToken, Session, SessionEvent, SessionState, StoredCookie};
