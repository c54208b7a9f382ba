//! Purpose: Shared core library crate used by the `plotpipe` CLI and tests.
//! Exports: `core` (data-block serialization, command assembly, palettes,
//! histograms, errors) and `api` (sessions, registry, figures).
//! Role: Library backing the binary; embeddable by programs that drive a
//! plotting engine themselves.
//! Invariants: `core` modules are pure and perform no process I/O.
//! Invariants: All engine writes go through `api::Session`.
pub mod api;
pub mod core;
