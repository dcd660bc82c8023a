//! String-keyed registries for pipeline Steps and resume Handlers.
//! Rust has no import-time registration side
//! effect, so population happens via explicit calls from
//! [`crate::service_registry::register_all_services`] rather than at
//! module load.

pub mod handlers;
pub mod steps;
