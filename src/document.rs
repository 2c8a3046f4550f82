//! The spriteops document model (`spec.md` §3).
//!
//! Decoding is deliberately two-staged: this module only knows the JSON
//! *shape* (objects, arrays, strings), never op argument semantics. The
//! validator (`crate::validate`) is the sole place that interprets an
//! op's arguments against the schema table in `crate::ops`.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::DecodeError;

/// A single operation: `["name", arg, arg, ...]` in the source JSON.
pub type RawOp = Vec<serde_json::Value>;

#[derive(Deserialize, Debug, Clone)]
pub struct Canvas {
    pub w: serde_json::Value,
    pub h: serde_json::Value,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Override {
    pub op_index: serde_json::Value,
    pub op: RawOp,
}

/// A frame is either a concrete op list or derived from an earlier frame.
///
/// `serde(untagged)` matches the document's field-presence discrimination:
/// a frame carrying `base` is `Derived`, everything else must be `Concrete`.
#[derive(Deserialize, Debug, Clone)]
#[serde(untagged)]
pub enum Frame {
    Derived {
        base: serde_json::Value,
        #[serde(default)]
        overrides: Vec<Override>,
        #[serde(default, rename = "append_ops")]
        append_ops: Vec<RawOp>,
    },
    Concrete {
        ops: Vec<RawOp>,
        #[serde(default, rename = "durationMs")]
        duration_ms: Option<u32>,
    },
}

impl Frame {
    pub const DEFAULT_DURATION_MS: u32 = 100;

    pub fn duration_ms(&self) -> u32 {
        match self {
            Frame::Concrete { duration_ms, .. } => duration_ms.unwrap_or(Self::DEFAULT_DURATION_MS),
            Frame::Derived { .. } => Self::DEFAULT_DURATION_MS,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct Animation {
    pub frames: Vec<serde_json::Value>,
    #[serde(default = "default_true")]
    pub r#loop: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Deserialize, Debug, Clone)]
pub struct Document {
    pub format: Option<String>,
    #[serde(default)]
    pub version: Option<i64>,
    pub canvas: Option<Canvas>,
    #[serde(default)]
    pub palette: Vec<serde_json::Value>,
    #[serde(default)]
    pub frames: Vec<Frame>,
    #[serde(default)]
    pub animations: BTreeMap<String, Animation>,
    #[serde(default)]
    pub name: Option<String>,
}

impl Document {
    /// Decodes a spriteops document from UTF-8 bytes, stripping a leading
    /// BOM if present (`spec.md` §6.1).
    pub fn from_slice(bytes: &[u8]) -> Result<Document, DecodeError> {
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let doc: Document = serde_json::from_slice(bytes)?;
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(br#"{"format":"spriteops","canvas":{"w":1,"h":1},"palette":["#000"],"frames":[{"ops":[]}]}"#);
        let doc = Document::from_slice(&bytes).unwrap();
        assert_eq!(doc.format.as_deref(), Some("spriteops"));
    }

    #[test]
    fn derived_frame_decodes() {
        let json = br#"{"base":0,"overrides":[{"op_index":1,"op":["pixel",1,1,0]}],"append_ops":[["pixel",1,2,0]]}"#;
        let frame: Frame = serde_json::from_slice(json).unwrap();
        match frame {
            Frame::Derived { overrides, append_ops, .. } => {
                assert_eq!(overrides.len(), 1);
                assert_eq!(append_ops.len(), 1);
            }
            _ => panic!("expected derived frame"),
        }
    }

    #[test]
    fn concrete_frame_default_duration() {
        let json = br#"{"ops":[["clear",0]]}"#;
        let frame: Frame = serde_json::from_slice(json).unwrap();
        assert_eq!(frame.duration_ms(), 100);
    }
}
