//! Op interpreter (`spec.md` §4.3).
//!
//! Dispatches each resolved op to the raster primitives and/or layer
//! helpers, tracking a "current layer" cursor by name. Assumes the op
//! list has already passed validation — an op reaching dispatch with an
//! unknown name, a missing mask layer, or an unsupported `shade_band`
//! side is the only way a `RenderError` can still occur here.

use serde_json::Value;

use crate::document::RawOp;
use crate::error::RenderError;
use crate::layers::{inset_fill_on_mask, noise_points, shade_band, Layers};
use crate::raster;

fn as_i64(v: &Value) -> i64 {
    v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)).unwrap_or(0)
}

fn as_f64(v: &Value) -> f64 {
    v.as_f64().unwrap_or(0.0)
}

fn as_str(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Decodes a gradient index-list argument: either a bare integer or a
/// comma-separated string of integers (`spec.md` §4.3).
fn gradient_indices(v: &Value) -> Vec<i32> {
    match v {
        Value::String(s) => s.split(',').filter_map(|p| p.trim().parse::<i32>().ok()).collect(),
        other => vec![as_i64(other) as i32],
    }
}

/// Renders one frame's resolved op list against a `w`x`h` canvas, returning
/// the final merged palette-index buffer.
pub fn render_frame(ops: &[RawOp], w: i64, h: i64) -> Result<Vec<i32>, RenderError> {
    let mut layers = Layers::new(w, h);
    let mut current = "base".to_string();

    for op in ops {
        let name = op[0].as_str().unwrap_or_default();
        let args = &op[1..];

        match name {
            "clear" => {
                layers.set_all(as_i64(&args[0]) as i32);
            }
            "layer_begin" => {
                current = as_str(&args[0]);
                layers.ensure(&current);
            }
            "layer_end" => {
                current = "base".to_string();
            }
            "layer_merge" => {
                let target = args.get(0).map(as_str).unwrap_or_else(|| "base".to_string());
                let m = layers.merged();
                layers.collapse_to(&target, m);
                current = target;
            }
            "copy_layer" => {
                let src = as_str(&args[0]);
                let dst = as_str(&args[1]);
                layers.copy_layer(&src, &dst);
            }
            "pixel" => {
                let (c, x, y) = (as_i64(&args[0]) as i32, as_i64(&args[1]), as_i64(&args[2]));
                let buf = layers.ensure(&current);
                if raster::in_bounds(x, y, w, h) {
                    buf[(y * w + x) as usize] = c;
                }
            }
            "line" => {
                let (c, x0, y0, x1, y1) = (as_i64(&args[0]) as i32, as_i64(&args[1]), as_i64(&args[2]), as_i64(&args[3]), as_i64(&args[4]));
                raster::draw_line(layers.ensure(&current), w, h, c, x0, y0, x1, y1);
            }
            "thick_line" => {
                let (c, x0, y0, x1, y1, t) = (
                    as_i64(&args[0]) as i32,
                    as_i64(&args[1]),
                    as_i64(&args[2]),
                    as_i64(&args[3]),
                    as_i64(&args[4]),
                    as_i64(&args[5]),
                );
                raster::draw_thick_line(layers.ensure(&current), w, h, c, x0, y0, x1, y1, t);
            }
            "capsule_fill" => {
                let (c, x0, y0, x1, y1, r) = (
                    as_i64(&args[0]) as i32,
                    as_i64(&args[1]),
                    as_i64(&args[2]),
                    as_i64(&args[3]),
                    as_i64(&args[4]),
                    as_i64(&args[5]),
                );
                raster::capsule_fill(layers.ensure(&current), w, h, c, x0, y0, x1, y1, r);
            }
            "rect" | "rect_stroke" => {
                let (c, x, y, rw, rh) = (as_i64(&args[0]) as i32, as_i64(&args[1]), as_i64(&args[2]), as_i64(&args[3]), as_i64(&args[4]));
                raster::rect_stroke(layers.ensure(&current), w, h, c, x, y, rw, rh);
            }
            "rect_fill" => {
                let (c, x, y, rw, rh) = (as_i64(&args[0]) as i32, as_i64(&args[1]), as_i64(&args[2]), as_i64(&args[3]), as_i64(&args[4]));
                raster::rect_fill(layers.ensure(&current), w, h, c, x, y, rw, rh);
            }
            "ellipse_fill" => {
                let (c, cx, cy, rx, ry) = (as_i64(&args[0]) as i32, as_i64(&args[1]), as_i64(&args[2]), as_i64(&args[3]), as_i64(&args[4]));
                raster::ellipse_fill(layers.ensure(&current), w, h, c, cx, cy, rx, ry);
            }
            "ellipse_stroke" => {
                let (c, cx, cy, rx, ry) = (as_i64(&args[0]) as i32, as_i64(&args[1]), as_i64(&args[2]), as_i64(&args[3]), as_i64(&args[4]));
                raster::ellipse_stroke(layers.ensure(&current), w, h, c, cx, cy, rx, ry);
            }
            "circle_fill" => {
                let (c, cx, cy, r) = (as_i64(&args[0]) as i32, as_i64(&args[1]), as_i64(&args[2]), as_i64(&args[3]));
                raster::ellipse_fill(layers.ensure(&current), w, h, c, cx, cy, r, r);
            }
            "bezier" => {
                let (c, x0, y0, cxp, cyp, x1, y1) = (
                    as_i64(&args[0]) as i32,
                    as_i64(&args[1]),
                    as_i64(&args[2]),
                    as_i64(&args[3]),
                    as_i64(&args[4]),
                    as_i64(&args[5]),
                    as_i64(&args[6]),
                );
                raster::draw_bezier(layers.ensure(&current), w, h, c, x0, y0, cxp, cyp, x1, y1);
            }
            "poly_fill" => {
                let c = as_i64(&args[0]) as i32;
                let mut points = Vec::new();
                let mut i = 1;
                while i + 1 < args.len() {
                    points.push((as_f64(&args[i]), as_f64(&args[i + 1])));
                    i += 2;
                }
                raster::draw_poly(layers.ensure(&current), w, h, c, &points);
            }
            "fill" => {
                let (c, x, y) = (as_i64(&args[0]) as i32, as_i64(&args[1]), as_i64(&args[2]));
                raster::flood_fill(layers.ensure(&current), w, h, c, x, y);
            }
            "inset_fill" => {
                let (c, x, y, rw, rh, inset) = (
                    as_i64(&args[0]) as i32,
                    as_i64(&args[1]),
                    as_i64(&args[2]),
                    as_i64(&args[3]),
                    as_i64(&args[4]),
                    as_i64(&args[5]),
                );
                let mask = layers.merged();
                inset_fill_on_mask(layers.ensure(&current), &mask, w, h, c, x, y, rw, rh, inset);
            }
            "dither_rect" => {
                let (c, x, y, rw, rh) = (as_i64(&args[0]) as i32, as_i64(&args[1]), as_i64(&args[2]), as_i64(&args[3]), as_i64(&args[4]));
                let pattern = args.get(5).map(as_str).unwrap_or_else(|| "checker".to_string());
                raster::dither_rect(layers.ensure(&current), w, h, c, x, y, rw, rh, &pattern);
            }
            "gradient_radial" => {
                let indices = gradient_indices(&args[0]);
                let (cx, cy, r) = (as_i64(&args[1]), as_i64(&args[2]), as_i64(&args[3]));
                raster::gradient_radial(layers.ensure(&current), w, h, &indices, cx, cy, r);
            }
            "gradient_linear" => {
                let indices = gradient_indices(&args[0]);
                let (x0, y0, x1, y1) = (as_i64(&args[1]), as_i64(&args[2]), as_i64(&args[3]), as_i64(&args[4]));
                raster::gradient_linear(layers.ensure(&current), w, h, &indices, x0, y0, x1, y1);
            }
            "mask_layer" => {
                let mask_name = as_str(&args[0]);
                if let Some(mask) = layers.get(&mask_name).cloned() {
                    raster::mask_layer_fn(layers.ensure(&current), &mask);
                }
            }
            "outline" => {
                let color = as_i64(&args[0]) as i32;
                let thickness = args.get(1).map(as_i64).unwrap_or(1);
                let merged = layers.merged();
                let mask: Vec<i32> = merged.iter().map(|&v| if v != 0 { 1 } else { 0 }).collect();
                raster::outline_from_mask(layers.ensure(&current), &mask, w, h, color, thickness);
            }
            "outline_layer" => {
                let color = as_i64(&args[0]) as i32;
                let thickness = args.get(1).map(as_i64).unwrap_or(1);
                raster::outline_layer(layers.ensure(&current), w, h, thickness, color);
            }
            "shade_band" => {
                let color = as_i64(&args[0]) as i32;
                let layer_name = as_str(&args[1]);
                let side = as_str(&args[2]);
                let thickness = args.get(3).map(as_i64).unwrap_or(1);
                let mask = layers
                    .get(&layer_name)
                    .cloned()
                    .ok_or_else(|| RenderError::MissingLayer { op: "shade_band", layer: layer_name.clone() })?;
                shade_band(layers.ensure(&current), &mask, w, h, color, &side, thickness)
                    .map_err(|_| RenderError::UnsupportedShadeSide(side.clone()))?;
            }
            "noise_points" => {
                let color = as_i64(&args[0]) as i32;
                let layer_name = as_str(&args[1]);
                let count = as_i64(&args[2]);
                let seed = as_i64(&args[3]);
                let mask = layers
                    .get(&layer_name)
                    .cloned()
                    .ok_or_else(|| RenderError::MissingLayer { op: "noise_points", layer: layer_name.clone() })?;
                noise_points(layers.ensure(&current), &mask, color, count, seed);
            }
            "color_replace" => {
                let old_c = as_i64(&args[0]) as i32;
                let new_c = as_i64(&args[1]) as i32;
                let mask = args.get(2).map(as_str).and_then(|n| layers.get(&n).cloned());
                raster::color_replace(layers.ensure(&current), old_c, new_c, mask.as_deref());
            }
            "translate" => {
                let (dx, dy) = (as_i64(&args[0]), as_i64(&args[1]));
                raster::translate(layers.ensure(&current), w, h, dx, dy);
            }
            "rotate" => {
                let angle = as_f64(&args[0]);
                let cx = args.get(1).map(as_f64).unwrap_or(w as f64 / 2.0);
                let cy = args.get(2).map(as_f64).unwrap_or(h as f64 / 2.0);
                raster::rotate(layers.ensure(&current), w, h, angle, cx, cy);
            }
            "mirror" => {
                let axis = args.get(0).map(as_str).unwrap_or_else(|| "x".to_string());
                let buf = layers.ensure(&current);
                match axis.as_str() {
                    "x" => raster::mirror_x(buf, w, h),
                    "y" => raster::mirror_y(buf, w, h),
                    _ => {}
                }
            }
            other => return Err(RenderError::UnknownOp(other.to_string())),
        }
        log::trace!("executed op '{}'", name);
    }

    Ok(layers.merged())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn op(vals: Vec<Value>) -> RawOp {
        vals
    }

    #[test]
    fn scenario_1() {
        let ops = vec![op(vec![json!("clear"), json!(0)]), op(vec![json!("pixel"), json!(1), json!(2), json!(0)])];
        let buf = render_frame(&ops, 4, 1).unwrap();
        assert_eq!(buf, vec![0, 0, 1, 0]);
    }

    #[test]
    fn scenario_2_outline_on_fully_covered_canvas() {
        let ops = vec![
            op(vec![json!("clear"), json!(0)]),
            op(vec![json!("rect_fill"), json!(1), json!(0), json!(0), json!(3), json!(3)]),
            op(vec![json!("outline"), json!(2), json!(1)]),
        ];
        let buf = render_frame(&ops, 3, 3).unwrap();
        assert_eq!(buf, vec![1; 9]);
    }

    #[test]
    fn clear_wipes_every_existing_layer() {
        let ops = vec![
            op(vec![json!("layer_begin"), json!("fx")]),
            op(vec![json!("pixel"), json!(1), json!(0), json!(0)]),
            op(vec![json!("layer_end")]),
            op(vec![json!("clear"), json!(3)]),
        ];
        let buf = render_frame(&ops, 2, 2).unwrap();
        assert_eq!(buf, vec![3, 3, 3, 3]);
    }

    #[test]
    fn unknown_op_is_runtime_error() {
        let ops = vec![op(vec![json!("not_an_op")])];
        assert!(matches!(render_frame(&ops, 2, 2), Err(RenderError::UnknownOp(_))));
    }

    #[test]
    fn noise_points_missing_layer_is_runtime_error() {
        let ops = vec![op(vec![json!("noise_points"), json!(1), json!("nope"), json!(3), json!(1)])];
        assert!(matches!(render_frame(&ops, 2, 2), Err(RenderError::MissingLayer { .. })));
    }

    #[test]
    fn render_frame_is_pure() {
        let ops = vec![
            op(vec![json!("clear"), json!(0)]),
            op(vec![json!("rect_fill"), json!(1), json!(0), json!(0), json!(2), json!(2)]),
        ];
        let a = render_frame(&ops, 2, 2).unwrap();
        let b = render_frame(&ops, 2, 2).unwrap();
        assert_eq!(a, b);
    }
}
