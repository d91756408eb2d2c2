//! Rating store: the single serialization point for competitor state
//!
//! This module contains the actor that owns every competitor record, the
//! message protocol used to talk to it, and the pluggable record backend it
//! writes through to.

pub mod actor;
pub mod backend;
pub mod messages;

// Re-export commonly used types
pub use actor::{RatingStore, RatingStoreActor};
pub use backend::{
    decode_record, encode_record, FaultInjectingRecordStore, InMemoryRecordStore, RecordStore,
    SharedRecordStore,
};
pub use messages::{OutcomeApplied, StoreRequest};
