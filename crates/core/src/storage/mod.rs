//! Storage module for finished downloads.
//!
//! Downloads live in a single flat directory; the directory listing is the
//! only persistence. Each backend attempt works inside its own hidden staging
//! directory and the result is moved into place with a name that never
//! clobbers an existing file.

mod error;
mod fs_storage;
mod naming;
mod types;

pub use error::StorageError;
pub use fs_storage::DownloadStorage;
pub use naming::safe_filename;
pub use types::{StagingArea, StoredFile};
