pub mod kv_store;
pub mod profile_repository;

pub use kv_store::{FileStore, InMemoryStore, KeyValueStore};
pub use profile_repository::ProfileRepository;
