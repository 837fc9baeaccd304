//! Release catalog domain model and retrieval.
//!
//! The catalog is the ordered list of upstream releases, each carrying the
//! archive download location and the SHA-1 digest the archive must match.
//! Index 0 is the latest release.
//!
//! # Sub-modules
//!
//! - [`error`] — Catalog parsing errors.
//! - [`fetcher`] — Catalog retrieval over HTTP (`ReleaseCatalogFetcher`).
//! - [`parser`] — Catalog JSON deserialization and validation.
//! - [`release`] — `ReleaseDescriptor` and `Catalog` types.
//! - [`sha1_digest`] — SHA-1 digest newtype (`Sha1Digest`).

pub mod error;
pub mod fetcher;
pub mod parser;
pub mod release;
pub mod sha1_digest;

pub use fetcher::{CatalogSource, ReleaseCatalogFetcher};
pub use release::{Catalog, ReleaseDescriptor};
pub use sha1_digest::Sha1Digest;
