//! Blob storage: opaque file persistence behind the `BlobStore` trait.

pub mod blob;
pub mod local;

pub use blob::{BlobStore, StoredBlob};
pub use local::LocalBlobStore;
