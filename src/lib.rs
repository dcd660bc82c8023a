//! Root crate for the MediaFlow workspace.
//!
//! Carries no library code of its own — it exists to host cross-crate
//! scenario tests under `tests/` against `mediaflow-shared`,
//! `mediaflow-orchestration`, and `mediaflow-worker` as dev-dependencies,
//! keeping the three library crates free of a circular dependency back
//! onto a "test harness" crate.
