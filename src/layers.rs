//! Layer state and masked effects (`spec.md` §3, §4.2).
//!
//! Layer order must be preserved as an explicit list alongside the name ->
//! buffer map: a `HashMap`'s iteration order is not insertion order, and
//! insertion order is part of the determinism contract.

use std::collections::HashMap;

use crate::raster::Buf;

/// Per-frame layer state: named buffers plus first-insertion order.
pub struct Layers {
    pub w: i64,
    pub h: i64,
    buffers: HashMap<String, Vec<i32>>,
    pub order: Vec<String>,
}

impl Layers {
    pub fn new(w: i64, h: i64) -> Self {
        let mut buffers = HashMap::new();
        buffers.insert("base".to_string(), vec![0; (w * h) as usize]);
        Layers { w, h, buffers, order: vec!["base".to_string()] }
    }

    /// Creates `name` zero-filled if it doesn't exist yet, appending it to
    /// the insertion-order list (`spec.md`'s "ensure layer").
    pub fn ensure(&mut self, name: &str) -> &mut Vec<i32> {
        if !self.buffers.contains_key(name) {
            self.buffers.insert(name.to_string(), vec![0; (self.w * self.h) as usize]);
            self.order.push(name.to_string());
        }
        self.buffers.get_mut(name).unwrap()
    }

    pub fn get(&self, name: &str) -> Option<&Vec<i32>> {
        self.buffers.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Vec<i32>> {
        self.buffers.get_mut(name)
    }

    pub fn set_all(&mut self, color: i32) {
        let len = (self.w * self.h) as usize;
        for buf in self.buffers.values_mut() {
            *buf = vec![color; len];
        }
    }

    pub fn copy_layer(&mut self, src: &str, dst: &str) {
        let src_buf = match self.buffers.get(src) {
            Some(b) => b.clone(),
            None => return,
        };
        if !self.buffers.contains_key(dst) {
            self.order.push(dst.to_string());
        }
        self.buffers.insert(dst.to_string(), src_buf);
    }

    /// Replaces the whole layer set with a single layer holding `data`;
    /// order collapses to `[name]`.
    pub fn collapse_to(&mut self, name: &str, data: Vec<i32>) {
        self.buffers.clear();
        self.buffers.insert(name.to_string(), data);
        self.order = vec![name.to_string()];
    }

    /// Overlays every layer in insertion order: non-zero source pixels
    /// overwrite the destination, starting from all-zero.
    pub fn merged(&self) -> Vec<i32> {
        let mut out = vec![0i32; (self.w * self.h) as usize];
        for name in &self.order {
            if let Some(src) = self.buffers.get(name) {
                for (o, &v) in out.iter_mut().zip(src.iter()) {
                    if v != 0 {
                        *o = v;
                    }
                }
            }
        }
        out
    }
}

/// Fills a rectangle inset by `inset` pixels on every side, restricted to
/// pixels where `mask` is non-zero.
pub fn inset_fill_on_mask(
    dest: &mut Buf,
    mask: &Buf,
    w: i64,
    h: i64,
    color: i32,
    x: i64,
    y: i64,
    rw: i64,
    rh: i64,
    inset: i64,
) {
    let x0 = x + inset;
    let y0 = y + inset;
    let x1 = x + rw - inset - 1;
    let y1 = y + rh - inset - 1;
    for yy in y0..=y1 {
        if yy < 0 || yy >= h {
            continue;
        }
        let row = yy * w;
        for xx in x0..=x1 {
            if xx < 0 || xx >= w {
                continue;
            }
            let i = (row + xx) as usize;
            if mask[i] != 0 {
                dest[i] = color;
            }
        }
    }
}

/// Sided boundary shading, `spec.md`'s "shade band".
pub fn shade_band(dest: &mut Buf, mask: &Buf, w: i64, h: i64, color: i32, side: &str, thickness: i64) -> Result<(), ()> {
    let side = side.to_lowercase();
    let at = |x: i64, y: i64| -> i32 {
        if x < 0 || x >= w || y < 0 || y >= h {
            0
        } else {
            mask[(y * w + x) as usize]
        }
    };

    for y in 0..h {
        for x in 0..w {
            let i = (y * w + x) as usize;
            if mask[i] == 0 {
                continue;
            }
            let near = match side.as_str() {
                "right" => (1..=thickness).any(|t| at(x + t, y) == 0),
                "bottom" => (1..=thickness).any(|t| at(x, y + t) == 0),
                "top_left" => (1..=thickness).any(|t| at(x - t, y) == 0 || at(x, y - t) == 0),
                "edge" => [(1, 0), (-1, 0), (0, 1), (0, -1)].iter().any(|&(dx, dy)| at(x + dx, y + dy) == 0),
                _ => return Err(()),
            };
            if near {
                dest[i] = color;
            }
        }
    }
    Ok(())
}

/// Deterministic noise placement via the LCG contracted in `spec.md` §4.2.
pub fn noise_points(dest: &mut Buf, mask: &Buf, color: i32, count: i64, seed: i64) {
    let eligible: Vec<usize> = mask.iter().enumerate().filter(|&(_, &v)| v != 0).map(|(i, _)| i).collect();
    if eligible.is_empty() || count <= 0 {
        return;
    }
    let mut x: i64 = seed & 0x7FFF_FFFF;
    for _ in 0..count {
        x = (1_103_515_245i64.wrapping_mul(x).wrapping_add(12345)) & 0x7FFF_FFFF;
        let idx = eligible[(x as usize) % eligible.len()];
        dest[idx] = color;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_idempotent_for_single_layer() {
        let mut layers = Layers::new(2, 2);
        let buf = layers.ensure("base");
        buf[0] = 7;
        assert_eq!(layers.merged(), vec![7, 0, 0, 0]);
    }

    #[test]
    fn merge_is_insertion_ordered() {
        let mut layers = Layers::new(2, 2);
        layers.ensure("top")[0] = 5;
        layers.ensure("base")[0] = 3;
        // "base" was inserted first, "top" second: top wins at index 0.
        assert_eq!(layers.merged()[0], 5);
    }

    #[test]
    fn noise_points_is_deterministic() {
        let mask = vec![1; 100];
        let mut a = vec![0; 100];
        let mut b = vec![0; 100];
        noise_points(&mut a, &mask, 2, 5, 42);
        noise_points(&mut b, &mask, 2, 5, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn noise_points_scenario_3() {
        // Matches spec.md §8 scenario 3's LCG recurrence exactly.
        let mut x: i64 = 42;
        let mut expected_idxs = Vec::new();
        for _ in 0..5 {
            x = (1_103_515_245i64 * x + 12345) & 0x7FFF_FFFF;
            expected_idxs.push((x % 100) as usize);
        }
        let mask = vec![1; 100];
        let mut dest = vec![0; 100];
        noise_points(&mut dest, &mask, 2, 5, 42);
        for i in expected_idxs {
            assert_eq!(dest[i], 2);
        }
    }

    #[test]
    fn shade_band_rejects_unknown_side() {
        let mask = vec![1; 4];
        let mut dest = vec![0; 4];
        assert!(shade_band(&mut dest, &mask, 2, 2, 9, "diagonal", 1).is_err());
    }
}
