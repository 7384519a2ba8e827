//! Wire protocol
//!
//! - [`wire`]: JSON encoding of operations with change-mask metadata
//! - [`message`]: envelopes exchanged with the sequencing authority
//! - [`binary`]: Protocol Buffers encoding of deltas (feature
//!   `protocol-binary`)

pub mod message;
pub mod wire;

#[cfg(feature = "protocol-binary")]
pub mod binary;

pub use message::{ClientMessage, ServerMessage};
pub use wire::{decode_operation, encode_operation, operation_from_json, operation_to_json, WireMeta, WireOp};
