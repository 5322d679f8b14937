//! Leakdex Core - Record types, documents and fingerprinting shared by the
//! ingestion pipeline and the search sink.

mod error;
mod fingerprint;
mod types;

pub use error::{Error, Result};
pub use fingerprint::{fingerprint, Fingerprint};
pub use types::*;
