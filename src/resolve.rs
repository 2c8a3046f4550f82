//! Frame-inheritance resolver (`spec.md` §4.4). Assumes the document has
//! already passed `validate()`; every `base` index is in range.

use crate::document::{Document, Frame, RawOp};

/// Resolves every frame's final op list, left to right. A concrete frame's
/// ops are used as-is; a derived frame starts from its (already resolved)
/// base frame's ops, applies overrides by position, then appends.
pub fn resolve(doc: &Document) -> Vec<Vec<RawOp>> {
    let mut resolved: Vec<Vec<RawOp>> = Vec::with_capacity(doc.frames.len());

    for frame in &doc.frames {
        match frame {
            Frame::Concrete { ops, .. } => resolved.push(ops.clone()),
            Frame::Derived { base, overrides, append_ops } => {
                let base_idx = base.as_i64().unwrap_or(0) as usize;
                let mut ops = resolved[base_idx].clone();
                for ov in overrides {
                    if let Some(op_index) = ov.op_index.as_i64() {
                        if op_index >= 0 && (op_index as usize) < ops.len() {
                            ops[op_index as usize] = ov.op.clone();
                        }
                    }
                }
                ops.extend(append_ops.iter().cloned());
                resolved.push(ops);
            }
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn scenario_4_frame_inheritance() {
        let doc = Document::from_slice(
            br#"{"format":"spriteops","canvas":{"w":3,"h":1},"palette":["#000","#fff"],"frames":[
                {"ops":[["clear",0],["pixel",1,0,0]]},
                {"base":0,"overrides":[{"op_index":1,"op":["pixel",1,1,0]}],"append_ops":[["pixel",1,2,0]]}
            ]}"#,
        )
        .unwrap();

        let resolved = resolve(&doc);
        assert_eq!(resolved[1].len(), 3);
        assert_eq!(resolved[1][1][1].as_i64(), Some(1));
        assert_eq!(resolved[1][1][2].as_i64(), Some(1));
        assert_eq!(resolved[1][2][0].as_str(), Some("pixel"));
    }

    #[test]
    fn derived_frame_with_no_overrides_or_appends_equals_base() {
        let doc = Document::from_slice(
            br#"{"format":"spriteops","canvas":{"w":1,"h":1},"palette":["#000"],"frames":[
                {"ops":[["clear",0]]},
                {"base":0,"append_ops":[]}
            ]}"#,
        )
        .unwrap();
        let resolved = resolve(&doc);
        assert_eq!(resolved[0], resolved[1]);
    }

    #[test]
    fn out_of_range_override_index_is_ignored() {
        let doc = Document::from_slice(
            br#"{"format":"spriteops","canvas":{"w":1,"h":1},"palette":["#000"],"frames":[
                {"ops":[["clear",0]]},
                {"base":0,"overrides":[{"op_index":99,"op":["clear",0]}],"append_ops":[["clear",0]]}
            ]}"#,
        )
        .unwrap();
        let resolved = resolve(&doc);
        assert_eq!(resolved[1].len(), 2);
    }
}
