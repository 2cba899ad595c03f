//! Domain layer - Canonical model and port definitions
//!
//! This module defines the backend-independent resource records, the
//! per-version state vocabularies and the traits (ports) that adapters
//! implement, following hexagonal architecture principles.

pub mod model;
pub mod ports;
pub mod vocabulary;

pub use model::*;
pub use ports::*;
pub use vocabulary::*;
