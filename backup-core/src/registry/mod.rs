//! Shared job registry.
//!
//! The registry is a single JSON file recording every in-flight or recently
//! terminal backup job. It is the only state shared between processes and the
//! sole synchronization point: there is no cross-process lock, so writers use
//! whole-file last-writer-wins overwrites and readers tolerate a concurrent
//! in-progress write through bounded retries.

pub mod entry;
pub mod store;

pub use entry::{next_status, JobStatus, RegistryEntry};
pub use store::RegistryStore;
