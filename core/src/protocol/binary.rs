//! Protocol Buffers encoding of deltas
//!
//! Same content as the JSON wire format, for transports that carry
//! binary frames. The message types are declared directly with prost's
//! derives.

use super::wire::{decode_operation, encode_operation, WireDelete, WireInsert, WireMeta, WireOp, WireRetain};
use crate::error::{OtError, Result};
use crate::ot::Operation;
use bytes::{Bytes, BytesMut};
use prost::Message;

#[derive(Clone, Copy, PartialEq, Message)]
pub struct PMeta {
    #[prost(uint32, tag = "1")]
    pub changemask: u32,
    #[prost(bool, tag = "2")]
    pub bold: bool,
    #[prost(bool, tag = "3")]
    pub italic: bool,
    #[prost(bool, tag = "4")]
    pub underline: bool,
    #[prost(bool, tag = "5")]
    pub strike: bool,
    #[prost(uint32, tag = "6")]
    pub font_size: u32,
    #[prost(uint32, tag = "7")]
    pub user_id: u32,
}

#[derive(Clone, PartialEq, Message)]
pub struct PInsert {
    #[prost(message, optional, tag = "1")]
    pub meta: Option<PMeta>,
    #[prost(string, tag = "2")]
    pub text: String,
}

#[derive(Clone, Copy, PartialEq, Message)]
pub struct PRetain {
    #[prost(message, optional, tag = "1")]
    pub meta: Option<PMeta>,
    #[prost(uint64, tag = "2")]
    pub len: u64,
}

#[derive(Clone, Copy, PartialEq, Message)]
pub struct PDelete {
    #[prost(uint64, tag = "1")]
    pub len: u64,
}

#[derive(Clone, PartialEq, Message)]
pub struct POp {
    #[prost(oneof = "p_op::Op", tags = "1, 2, 3")]
    pub op: Option<p_op::Op>,
}

pub mod p_op {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Op {
        #[prost(message, tag = "1")]
        Insert(super::PInsert),
        #[prost(message, tag = "2")]
        Retain(super::PRetain),
        #[prost(message, tag = "3")]
        Delete(super::PDelete),
    }
}

#[derive(Clone, PartialEq, Message)]
pub struct PDelta {
    #[prost(uint64, tag = "1")]
    pub revision: u64,
    #[prost(message, repeated, tag = "2")]
    pub ops: Vec<POp>,
}

impl From<WireMeta> for PMeta {
    fn from(meta: WireMeta) -> Self {
        PMeta {
            changemask: meta.changemask,
            bold: meta.bold,
            italic: meta.italic,
            underline: meta.underline,
            strike: meta.strike,
            font_size: meta.font_size,
            user_id: meta.user_id,
        }
    }
}

impl From<PMeta> for WireMeta {
    fn from(meta: PMeta) -> Self {
        WireMeta {
            changemask: meta.changemask,
            bold: meta.bold,
            italic: meta.italic,
            underline: meta.underline,
            strike: meta.strike,
            font_size: meta.font_size,
            user_id: meta.user_id,
        }
    }
}

impl From<WireOp> for POp {
    fn from(op: WireOp) -> Self {
        let op = match op {
            WireOp::Insert { insert } => p_op::Op::Insert(PInsert {
                meta: insert.meta.map(PMeta::from),
                text: insert.text,
            }),
            WireOp::Retain { retain } => p_op::Op::Retain(PRetain {
                meta: retain.meta.map(PMeta::from),
                len: retain.len,
            }),
            WireOp::Delete { delete } => p_op::Op::Delete(PDelete { len: delete.len }),
        };
        POp { op: Some(op) }
    }
}

impl TryFrom<POp> for WireOp {
    type Error = OtError;

    fn try_from(op: POp) -> Result<Self> {
        match op.op {
            Some(p_op::Op::Insert(insert)) => Ok(WireOp::Insert {
                insert: WireInsert {
                    meta: insert.meta.map(WireMeta::from),
                    text: insert.text,
                },
            }),
            Some(p_op::Op::Retain(retain)) => Ok(WireOp::Retain {
                retain: WireRetain {
                    meta: retain.meta.map(WireMeta::from),
                    len: retain.len,
                },
            }),
            Some(p_op::Op::Delete(delete)) => Ok(WireOp::Delete {
                delete: WireDelete { len: delete.len },
            }),
            None => Err(OtError::Protocol("op without a kind".to_string())),
        }
    }
}

/// Encode a delta to protocol buffer bytes
pub fn encode_delta(revision: u64, operation: &Operation) -> Result<Bytes> {
    let message = PDelta {
        revision,
        ops: encode_operation(operation).into_iter().map(POp::from).collect(),
    };
    let mut buf = BytesMut::with_capacity(message.encoded_len());
    message
        .encode(&mut buf)
        .map_err(|e| OtError::Protocol(format!("failed to encode delta: {}", e)))?;
    Ok(buf.freeze())
}

/// Decode a delta from protocol buffer bytes
pub fn decode_delta(bytes: &[u8]) -> Result<(u64, Operation)> {
    let message = PDelta::decode(bytes)
        .map_err(|e| OtError::Protocol(format!("failed to decode delta: {}", e)))?;
    let ops = message
        .ops
        .into_iter()
        .map(WireOp::try_from)
        .collect::<Result<Vec<_>>>()?;
    Ok((message.revision, decode_operation(&ops)?))
}
