/// Event emitter: listener registry, entries, synchronous dispatch.
pub mod emitter;

// -----------------------------------------------------------------------------
//  Frequently used public types
// -----------------------------------------------------------------------------

/// Emitter API: registration, removal, introspection, dispatch.
pub use emitter::{listener, Emitter, Listener};
