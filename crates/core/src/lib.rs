//! slngen-core
//!
//! Core library for turning a configured Meson build directory into an IDE
//! solution graph.
//!
//! This crate owns introspection loading, header attribution, graph assembly,
//! build-step coordination and the engine adapter. The CLI is a thin wrapper
//! so everything here stays testable without spawning processes.

pub mod coordination;
pub mod graph;
pub mod headers;
pub mod identity;
pub mod introspect;
pub mod layout;
pub mod model;
pub mod services;

/// Returns the library version as encoded at compile time.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
