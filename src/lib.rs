// Public API exports (shared between browser and server)
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod shared;

// Server-only modules (NOT compiled for WASM)
#[cfg(not(target_arch = "wasm32"))]
pub mod handlers;

// Browser-only wiring
#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(all(test, not(target_arch = "wasm32")))]
pub(crate) mod testing;
