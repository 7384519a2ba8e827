//! Wire encoding of operations
//!
//! Each op travels as a tagged record; metadata is sent as a change-mask
//! plus values, so a receiver can tell "bold: false" apart from "bold not
//! specified":
//!
//! ```json
//! {"op":"insert","insert":{"meta":{"changemask":33,"bold":true,"userId":7},"text":"hi"}}
//! {"op":"retain","retain":{"len":5}}
//! {"op":"delete","delete":{"len":2}}
//! ```

use crate::error::{OtError, Result};
use crate::ot::{Attribute, Meta, Op, Operation};
use serde::{Deserialize, Serialize};

/// Metadata as sent over the wire
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WireMeta {
    /// Which of the fields below are meaningful
    pub changemask: u32,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strike: bool,
    pub font_size: u32,
    pub user_id: u32,
}

impl WireMeta {
    /// `None` for metadata that specifies nothing
    pub fn from_meta(meta: &Meta) -> Option<WireMeta> {
        if meta.is_empty() {
            return None;
        }
        Some(WireMeta {
            changemask: meta.changemask(),
            bold: meta.bold.unwrap_or(false),
            italic: meta.italic.unwrap_or(false),
            underline: meta.underline.unwrap_or(false),
            strike: meta.strike.unwrap_or(false),
            font_size: meta.font_size.unwrap_or(0),
            user_id: meta.user_id.unwrap_or(0),
        })
    }

    /// Exactly the attributes whose mask bit is set
    pub fn to_meta(&self) -> Meta {
        let masked = |attribute: Attribute| self.changemask & attribute.bit() != 0;
        Meta {
            bold: masked(Attribute::Bold).then_some(self.bold),
            italic: masked(Attribute::Italic).then_some(self.italic),
            underline: masked(Attribute::Underline).then_some(self.underline),
            strike: masked(Attribute::Strike).then_some(self.strike),
            font_size: masked(Attribute::FontSize).then_some(self.font_size),
            user_id: masked(Attribute::UserId).then_some(self.user_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireInsert {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<WireMeta>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireRetain {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<WireMeta>,
    pub len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireDelete {
    pub len: u64,
}

/// One op as sent over the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum WireOp {
    Insert { insert: WireInsert },
    Retain { retain: WireRetain },
    Delete { delete: WireDelete },
}

impl From<&Op> for WireOp {
    fn from(op: &Op) -> Self {
        match op {
            Op::Insert { text, meta } => WireOp::Insert {
                insert: WireInsert {
                    meta: WireMeta::from_meta(meta),
                    text: text.clone(),
                },
            },
            Op::Retain { len, meta } => WireOp::Retain {
                retain: WireRetain {
                    meta: WireMeta::from_meta(meta),
                    len: *len as u64,
                },
            },
            Op::Delete { len } => WireOp::Delete {
                delete: WireDelete { len: *len as u64 },
            },
        }
    }
}

impl TryFrom<&WireOp> for Op {
    type Error = OtError;

    fn try_from(op: &WireOp) -> Result<Self> {
        let meta = |wire: &Option<WireMeta>| wire.map(|meta| meta.to_meta()).unwrap_or_default();
        let len = |len: u64| {
            usize::try_from(len).map_err(|_| OtError::Protocol(format!("op length {len} too large")))
        };
        Ok(match op {
            WireOp::Insert { insert } => Op::insert(insert.text.clone(), meta(&insert.meta)),
            WireOp::Retain { retain } => Op::retain(len(retain.len)?, meta(&retain.meta)),
            WireOp::Delete { delete } => Op::delete(len(delete.len)?),
        })
    }
}

pub fn encode_operation(operation: &Operation) -> Vec<WireOp> {
    operation.ops().iter().map(WireOp::from).collect()
}

/// Rebuild an operation; the result is canonical whatever the sender did
pub fn decode_operation(ops: &[WireOp]) -> Result<Operation> {
    ops.iter().map(Op::try_from).collect()
}

pub fn operation_to_json(operation: &Operation) -> Result<String> {
    Ok(serde_json::to_string(&encode_operation(operation))?)
}

pub fn operation_from_json(json: &str) -> Result<Operation> {
    let ops: Vec<WireOp> = serde_json::from_str(json)?;
    decode_operation(&ops)
}
