//! Typed query layer over compiled SELinux policies.
//!
//! [`policy`] wraps raw policy elements (network labeling statements, MLS
//! sensitivities) into comparable, hashable objects; [`query`] filters them
//! by name, alias, regular expression, or dominance.

pub mod cli;
pub mod error;
pub mod net;
pub mod policy;
pub mod query;
