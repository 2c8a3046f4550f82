//! Static validator (`spec.md` §4.4). Pure: never throws on the first
//! problem, always accumulates every diagnostic found in the document.

use std::collections::HashSet;

use serde_json::Value;

use crate::document::{Document, Frame, RawOp};
use crate::ops::{get_op_spec, ArgType};

/// One validation finding, with as much location context as is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
    pub path: Option<String>,
    pub frame: Option<usize>,
    pub op_index: Option<usize>,
}

impl Diagnostic {
    fn new(message: impl Into<String>, path: Option<&str>) -> Self {
        Diagnostic { message: message.into(), path: path.map(str::to_string), frame: None, op_index: None }
    }

    fn at_frame(mut self, frame: usize) -> Self {
        self.frame = Some(frame);
        self
    }

    fn at_op(mut self, op_index: usize) -> Self {
        self.op_index = Some(op_index);
        self
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut parts = Vec::new();
        if let Some(p) = &self.path {
            parts.push(format!("File: {p}"));
        }
        if let Some(fr) = self.frame {
            parts.push(format!("Frame: {fr}"));
        }
        if let Some(op) = self.op_index {
            parts.push(format!("Op #{op}"));
        }
        if parts.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}\n  Error: {}", parts.join(" | "), self.message)
        }
    }
}

fn value_is_positive_int(v: &Value) -> bool {
    v.as_i64().map(|n| n > 0).unwrap_or(false)
}

/// Validates a full document, returning every diagnostic found.
pub fn validate(doc: &Document, path: Option<&str>, strict: bool) -> Vec<Diagnostic> {
    let mut errors = Vec::new();

    if doc.format.as_deref() != Some("spriteops") {
        errors.push(Diagnostic::new("Missing or invalid 'format' field (expected 'spriteops')", path));
    }

    match &doc.canvas {
        None => errors.push(Diagnostic::new("Missing 'canvas' field", path)),
        Some(canvas) => {
            if !value_is_positive_int(&canvas.w) || !value_is_positive_int(&canvas.h) {
                errors.push(Diagnostic::new("Canvas 'w' and 'h' must be positive integers", path));
            }
        }
    }

    if doc.palette.is_empty() {
        errors.push(Diagnostic::new("'palette' cannot be empty", path));
    } else {
        for (i, color) in doc.palette.iter().enumerate() {
            match color.as_str() {
                Some(s) if s.starts_with('#') => {}
                Some(_) => errors.push(Diagnostic::new(format!("Palette color {i} must start with '#'"), path)),
                None => errors.push(Diagnostic::new(format!("Palette color {i} must be a hex string"), path)),
            }
        }
    }
    let palette_size = doc.palette.len();

    if doc.frames.is_empty() {
        errors.push(Diagnostic::new("'frames' cannot be empty", path));
    } else {
        for (frame_idx, frame) in doc.frames.iter().enumerate() {
            errors.extend(validate_frame(frame, frame_idx, palette_size, path, strict));
        }
    }

    let frame_count = doc.frames.len();
    for (anim_name, anim) in &doc.animations {
        for f in &anim.frames {
            let idx = f.as_i64();
            if idx.map(|i| i < 0 || i as usize >= frame_count).unwrap_or(true) {
                errors.push(Diagnostic::new(format!("Animation '{anim_name}' references invalid frame index: {f}"), path));
            }
        }
    }

    errors
}

fn validate_frame(frame: &Frame, frame_idx: usize, palette_size: usize, path: Option<&str>, strict: bool) -> Vec<Diagnostic> {
    let mut errors = Vec::new();

    match frame {
        Frame::Derived { base, overrides, append_ops } => {
            match base.as_i64() {
                None => errors.push(Diagnostic::new("Frame 'base' must be an integer", path).at_frame(frame_idx)),
                Some(b) => {
                    if b < 0 || b as usize >= frame_idx {
                        errors.push(
                            Diagnostic::new(format!("Frame 'base' must reference an earlier frame (got {b})"), path)
                                .at_frame(frame_idx),
                        );
                    }
                }
            }
            if overrides.is_empty() && append_ops.is_empty() {
                errors.push(Diagnostic::new("Inherited frame must have 'overrides' or 'append_ops'", path).at_frame(frame_idx));
            }
        }
        Frame::Concrete { ops, .. } => {
            let mut defined_layers: HashSet<String> = HashSet::new();
            defined_layers.insert("base".to_string());

            for (op_idx, op) in ops.iter().enumerate() {
                errors.extend(validate_op(op, op_idx, palette_size, &defined_layers, path, frame_idx, strict));

                if let (Some(Value::String(name)), Some(arg)) = (op.get(0), op.get(1)) {
                    if name == "layer_begin" {
                        defined_layers.insert(as_layer_name(arg));
                    }
                }
            }
        }
    }

    errors
}

fn as_layer_name(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn validate_op(
    op: &RawOp,
    op_idx: usize,
    palette_size: usize,
    defined_layers: &HashSet<String>,
    path: Option<&str>,
    frame_idx: usize,
    strict: bool,
) -> Vec<Diagnostic> {
    let mut errors = Vec::new();

    if op.is_empty() {
        errors.push(Diagnostic::new("Operation cannot be empty", path).at_frame(frame_idx).at_op(op_idx));
        return errors;
    }

    let op_name = match op[0].as_str() {
        Some(s) => s,
        None => {
            errors.push(Diagnostic::new("Operation name must be a string", path).at_frame(frame_idx).at_op(op_idx));
            return errors;
        }
    };

    let spec = match get_op_spec(op_name) {
        Some(s) => s,
        None => {
            errors.push(Diagnostic::new(format!("Unknown operation: '{op_name}'"), path).at_frame(frame_idx).at_op(op_idx));
            return errors;
        }
    };

    let arg_count = op.len() - 1;
    if arg_count < spec.min_args {
        errors.push(
            Diagnostic::new(format!("Operation '{op_name}' requires at least {} arguments, got {arg_count}", spec.min_args), path)
                .at_frame(frame_idx)
                .at_op(op_idx),
        );
    } else if arg_count > spec.max_args {
        errors.push(
            Diagnostic::new(format!("Operation '{op_name}' accepts at most {} arguments, got {arg_count}", spec.max_args), path)
                .at_frame(frame_idx)
                .at_op(op_idx),
        );
    }

    for (i, arg) in op[1..].iter().enumerate() {
        if let Some(ArgType::ColorIdx) = spec.arg_types.get(i) {
            if let Some(n) = arg.as_i64() {
                if n < 0 || n as usize >= palette_size {
                    errors.push(
                        Diagnostic::new(format!("Palette index {n} out of bounds (palette has {palette_size} colors)"), path)
                            .at_frame(frame_idx)
                            .at_op(op_idx),
                    );
                }
            }
        }
    }

    if let Some(layer_arg_idx) = spec.requires_layer {
        if let Some(arg) = op.get(layer_arg_idx + 1) {
            let layer_name = as_layer_name(arg);
            if !defined_layers.contains(&layer_name) {
                errors.push(
                    Diagnostic::new(format!("Operation '{op_name}' references undefined layer: '{layer_name}'"), path)
                        .at_frame(frame_idx)
                        .at_op(op_idx),
                );
            }
        }
    }

    if spec.requires_seed && strict && op_name == "noise_points" && op.len() < 5 {
        errors.push(
            Diagnostic::new("Operation 'noise_points' requires a seed for deterministic output", path)
                .at_frame(frame_idx)
                .at_op(op_idx),
        );
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    fn doc_from(json: &str) -> Document {
        Document::from_slice(json.as_bytes()).unwrap()
    }

    #[test]
    fn valid_document_has_no_diagnostics() {
        let doc = doc_from(r#"{"format":"spriteops","canvas":{"w":4,"h":1},"palette":["#000","#fff"],"frames":[{"ops":[["clear",0],["pixel",1,2,0]]}]}"#);
        assert!(validate(&doc, None, false).is_empty());
    }

    #[test]
    fn scenario_5_base_must_be_earlier() {
        let doc = doc_from(
            r#"{"format":"spriteops","canvas":{"w":1,"h":1},"palette":["#000"],"frames":[
                {"ops":[["clear",0]]},
                {"ops":[["clear",0]]},
                {"ops":[["clear",0]]},
                {"base":5,"append_ops":[["clear",0]]}
            ]}"#,
        );
        let diags = validate(&doc, None, false);
        let matching: Vec<_> = diags.iter().filter(|d| d.message.contains("earlier frame")).collect();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].frame, Some(3));
    }

    #[test]
    fn unknown_op_is_a_diagnostic() {
        let doc = doc_from(r#"{"format":"spriteops","canvas":{"w":1,"h":1},"palette":["#000"],"frames":[{"ops":[["frobnicate"]]}]}"#);
        let diags = validate(&doc, None, false);
        assert!(diags.iter().any(|d| d.message.contains("Unknown operation")));
    }

    #[test]
    fn out_of_range_palette_index_is_a_diagnostic() {
        let doc = doc_from(r#"{"format":"spriteops","canvas":{"w":1,"h":1},"palette":["#000"],"frames":[{"ops":[["clear",5]]}]}"#);
        let diags = validate(&doc, None, false);
        assert!(diags.iter().any(|d| d.message.contains("out of bounds")));
    }

    #[test]
    fn undefined_layer_reference_is_a_diagnostic() {
        let doc = doc_from(r#"{"format":"spriteops","canvas":{"w":2,"h":2},"palette":["#000"],"frames":[{"ops":[["mask_layer","ghost"]]}]}"#);
        let diags = validate(&doc, None, false);
        assert!(diags.iter().any(|d| d.message.contains("undefined layer")));
    }

    #[test]
    fn strict_mode_requires_noise_seed() {
        let doc = doc_from(r#"{"format":"spriteops","canvas":{"w":2,"h":2},"palette":["#000"],"frames":[{"ops":[["layer_begin","m"],["noise_points",0,"m",3]]}]}"#);
        assert!(validate(&doc, None, true).iter().any(|d| d.message.contains("requires a seed")));
        assert!(!validate(&doc, None, false).iter().any(|d| d.message.contains("requires a seed")));
    }

    #[test]
    fn derived_frame_without_overrides_or_appends_is_invalid() {
        let doc = doc_from(r#"{"format":"spriteops","canvas":{"w":1,"h":1},"palette":["#000"],"frames":[{"ops":[]},{"base":0}]}"#);
        let diags = validate(&doc, None, false);
        assert!(diags.iter().any(|d| d.message.contains("overrides")));
    }
}
