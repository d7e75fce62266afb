//! Viewer session over one opened safetensors container.
//!
//! A [`Session`] bundles the catalog, the hierarchy tree, and the lazy tensor
//! cache as one unit: all three are built together by [`Session::open`] and
//! replaced together when a new file is opened, so callers never observe one
//! refreshed and the others stale.
//!
//! On top of the session sit the paged value listing ([`Session::view`]), the
//! case-insensitive name search ([`search`]), and the serializable export
//! snapshot ([`snapshot`]).

#![warn(missing_docs)]

mod cache;
mod error;
mod export;
mod page;
mod search;
mod session;
mod source;

pub use cache::{CachedTensor, TensorCache};
pub use error::AccessError;
pub use export::{snapshot, BranchExport, ExportDocument, FileSummary, TensorExport};
pub use page::PageView;
pub use search::{search, SearchHit, SearchResults};
pub use session::Session;
pub use source::{FileSource, TensorSource};
