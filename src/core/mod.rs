//! Core business logic - framework-agnostic numbering, document and maintenance operations.

/// Number allocation against the counters table
pub mod allocator;
/// Atomic counter primitive and counter lookups
pub mod counter;
/// Invoice creation and queries
pub mod invoice;
/// Kitchen order ticket creation and queries
pub mod kot;
/// Bulk reset and counter audit
pub mod maintenance;
/// Scope derivation and display formatting rules
pub mod numbering;
/// Order creation and queries
pub mod order;

pub use allocator::{IssuedNumber, NumberAllocator};
pub use numbering::DocumentKind;
