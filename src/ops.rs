//! The op schema table (`spec.md` §6.2) — the shared source of truth for
//! both the validator and (indirectly, via op names) the interpreter.

/// Argument type tags used by the schema table.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ArgType {
    /// Palette index, must satisfy `0 <= i < palette.len()`.
    ColorIdx,
    Int,
    Float,
    Str,
    /// References a layer introduced by `layer_begin` earlier in the frame.
    LayerName,
}

/// Specification for one spriteops operation.
#[derive(Clone, Debug)]
pub struct OpSpec {
    pub name: &'static str,
    pub min_args: usize,
    pub max_args: usize,
    pub arg_types: &'static [ArgType],
    /// Position (0-based, into the argument list) of a `layer_name`
    /// argument that must reference an already-introduced layer.
    pub requires_layer: Option<usize>,
    /// `noise_points` requires a seed argument in strict mode.
    pub requires_seed: bool,
}

const fn spec(
    name: &'static str,
    min_args: usize,
    max_args: usize,
    arg_types: &'static [ArgType],
) -> OpSpec {
    OpSpec { name, min_args, max_args, arg_types, requires_layer: None, requires_seed: false }
}

const fn spec_layer(
    name: &'static str,
    min_args: usize,
    max_args: usize,
    arg_types: &'static [ArgType],
    requires_layer: usize,
) -> OpSpec {
    OpSpec { name, min_args, max_args, arg_types, requires_layer: Some(requires_layer), requires_seed: false }
}

use ArgType::*;

/// Complete operation table. Argument order is exactly as in `spec.md` §6.2
/// — do not reorder fields of any op, that would change wire compatibility.
pub static OP_SPECS: &[OpSpec] = &[
    spec("clear", 1, 1, &[ColorIdx]),
    spec("pixel", 3, 3, &[ColorIdx, Int, Int]),
    spec("layer_begin", 1, 1, &[Str]),
    spec("layer_end", 0, 0, &[]),
    spec("layer_merge", 0, 1, &[Str]),
    spec("copy_layer", 2, 2, &[Str, Str]),
    spec("line", 5, 5, &[ColorIdx, Int, Int, Int, Int]),
    spec("thick_line", 6, 6, &[ColorIdx, Int, Int, Int, Int, Int]),
    spec("rect", 5, 5, &[ColorIdx, Int, Int, Int, Int]),
    spec("rect_stroke", 5, 5, &[ColorIdx, Int, Int, Int, Int]),
    spec("rect_fill", 5, 5, &[ColorIdx, Int, Int, Int, Int]),
    spec("ellipse_fill", 5, 5, &[ColorIdx, Int, Int, Int, Int]),
    spec("ellipse_stroke", 5, 5, &[ColorIdx, Int, Int, Int, Int]),
    spec("circle_fill", 4, 4, &[ColorIdx, Int, Int, Int]),
    spec("capsule_fill", 6, 6, &[ColorIdx, Int, Int, Int, Int, Int]),
    spec("poly_fill", 3, 100, &[ColorIdx]),
    spec("bezier", 7, 7, &[ColorIdx, Int, Int, Int, Int, Int, Int]),
    spec("fill", 3, 3, &[ColorIdx, Int, Int]),
    spec("inset_fill", 6, 6, &[ColorIdx, Int, Int, Int, Int, Int]),
    spec("dither_rect", 5, 6, &[ColorIdx, Int, Int, Int, Int, Str]),
    spec("gradient_radial", 4, 4, &[Str, Int, Int, Int]),
    spec("gradient_linear", 5, 5, &[Str, Int, Int, Int, Int]),
    spec_layer("mask_layer", 1, 1, &[LayerName], 0),
    spec("outline", 1, 2, &[ColorIdx, Int]),
    spec("outline_layer", 1, 2, &[ColorIdx, Int]),
    {
        let mut s = spec_layer("shade_band", 3, 4, &[ColorIdx, LayerName, Str, Int], 1);
        s.requires_seed = false;
        s
    },
    {
        let mut s = spec_layer("noise_points", 4, 4, &[ColorIdx, LayerName, Int, Int], 1);
        s.requires_seed = true;
        s
    },
    spec("color_replace", 2, 3, &[ColorIdx, ColorIdx, LayerName]),
    spec("translate", 2, 2, &[Int, Int]),
    spec("rotate", 1, 3, &[Float, Float, Float]),
    spec("mirror", 0, 1, &[Str]),
];

pub fn get_op_spec(name: &str) -> Option<&'static OpSpec> {
    OP_SPECS.iter().find(|s| s.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_has_no_duplicate_names() {
        let mut names: Vec<_> = OP_SPECS.iter().map(|s| s.name).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(before, names.len());
    }

    #[test]
    fn noise_points_requires_seed() {
        assert!(get_op_spec("noise_points").unwrap().requires_seed);
    }

    #[test]
    fn unknown_op_is_none() {
        assert!(get_op_spec("frobnicate").is_none());
    }
}
