//! Session token registry.
//!
//! Provides:
//! - `SessionRegistry` - Owns the worker task that holds every session
//! - `SessionHandle` - Cloneable caller side for `start` / `lookup` / `end`

pub mod registry;
mod table;

pub use registry::{
    DEFAULT_QUEUE_CAPACITY, MAX_TOKEN_LEN, RegistryError, SessionHandle, SessionRegistry,
};
