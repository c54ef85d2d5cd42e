//! # prooff-core: Foundational Types
//!
//! Every other crate in the workspace depends on `prooff-core`; it depends on
//! nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **`CanonicalBytes` newtype.** All digest computation flows through
//!    `CanonicalBytes::new()`. An anchor digest computed over
//!    `serde_json::to_vec()` output would not survive a field reorder, so the
//!    raw path is not offered.
//!
//! 2. **`sha256_digest()` accepts only `&CanonicalBytes`.** Raw content
//!    hashing for uploaded works lives in `prooff-crypto`.
//!
//! 3. **Newtype identifiers.** `CertificateId`, `ContentHash`, `WorkId` and
//!    `WalletId` have validated constructors. No bare strings cross crate
//!    boundaries.
//!
//! 4. **Injected clocks.** Anything that stamps wall-clock time takes a
//!    [`Clock`] so tests can pin it.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `prooff-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod digest;
pub mod error;
pub mod identity;
pub mod temporal;

pub use canonical::CanonicalBytes;
pub use digest::{sha256_digest, sha256_hex, ContentDigest, DigestAlgorithm};
pub use error::{CanonicalizationError, ProoffError, ValidationError};
pub use identity::{CertificateId, ContentHash, WalletId, WorkId};
pub use temporal::{Clock, FixedClock, SystemClock, Timestamp};
