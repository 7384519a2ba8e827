//! WASM bindings for the collaborative editing core
//!
//! Operations and sessions cross the boundary as JSON strings in the wire
//! format of [`crate::protocol`].

#[cfg(feature = "wasm")]
pub mod bindings;

#[cfg(feature = "wasm")]
pub mod utils;

#[cfg(feature = "wasm")]
pub use bindings::{WasmEditorClient, WasmOperation};
