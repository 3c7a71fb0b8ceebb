//! Orchestration layer for Reclaim.
//!
//! The [`Sweeper`] turns a technique id plus a request body into a scan or
//! remediation report: it resolves the technique, loads credentials from a
//! [`CredentialSupplier`], builds a fresh optimizer and aggregates what it
//! returns. Credential storage lives here too, with an in-memory store for
//! tests and an AES-GCM encrypted file store for real use.

pub mod credentials;
pub mod error;
pub mod file_store;
pub mod metrics;
pub mod sweeper;

pub use credentials::{CredentialStore, CredentialSupplier, MemoryCredentialStore};
pub use error::{CredentialError, SweepError};
pub use file_store::EncryptedFileCredentialStore;
pub use metrics::{MetricsSnapshot, SweepMetrics};
pub use sweeper::{RemediationRequest, ScanRequest, Sweeper, SweeperBuilder};
