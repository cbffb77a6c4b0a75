/// Router Module Index
///
/// Splits the gate's routes by whether the access guard applies to them.

/// Probes and the decision preview; never guarded.
pub mod public;

/// The marketplace front-end; every request is decided by the access guard.
pub mod frontend;
