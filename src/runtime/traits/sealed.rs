// ABOUTME: Sealed trait pattern for runtime traits.
// ABOUTME: Prevents external implementations, allowing non-breaking evolution.

/// Sealed trait to prevent external implementations.
///
/// Only engine clients defined in this crate (the bollard client and the
/// in-crate test double) can implement the runtime traits.
pub trait Sealed {}
