//! Durable storage collaborators: object store client, checkpoint store
//! and secret retrieval.

pub mod object_store;
pub mod secrets;
pub mod state_store;

pub use object_store::{HttpObjectStore, ObjectStore};
pub use secrets::SecretsClient;
pub use state_store::ObjectStateStore;
