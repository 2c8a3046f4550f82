//! Stateless raster primitives (`spec.md` §4.1).
//!
//! Every primitive mutates a flat, row-major buffer of palette indices in
//! place and is total: out-of-range geometry is clipped, never an error.
//! All clipping uses half-open bounds `0 <= x < w, 0 <= y < h`. Rounding
//! of the handful of float-producing primitives (`rotate`, `bezier`,
//! polygon crossings, gradient `t`) is round-half-away-from-zero, which is
//! exactly what `f64::round` does in Rust.

use std::collections::VecDeque;

pub type Buf = [i32];

#[inline]
pub fn in_bounds(x: i64, y: i64, w: i64, h: i64) -> bool {
    x >= 0 && x < w && y >= 0 && y < h
}

#[inline]
fn idx(x: i64, y: i64, w: i64) -> usize {
    (y * w + x) as usize
}

#[inline]
fn set(buf: &mut Buf, w: i64, h: i64, x: i64, y: i64, color: i32) {
    if in_bounds(x, y, w, h) {
        buf[idx(x, y, w)] = color;
    }
}

/// Bresenham integer line, inclusive of both endpoints.
pub fn draw_line(buf: &mut Buf, w: i64, h: i64, color: i32, x0: i64, y0: i64, x1: i64, y1: i64) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (x0, y0);
    loop {
        set(buf, w, h, x, y, color);
        if x == x1 && y == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Draws a thick line by stamping filled circles along the segment.
pub fn draw_thick_line(
    buf: &mut Buf,
    w: i64,
    h: i64,
    color: i32,
    x0: i64,
    y0: i64,
    x1: i64,
    y1: i64,
    thickness: i64,
) {
    if thickness <= 1 {
        draw_line(buf, w, h, color, x0, y0, x1, y1);
        return;
    }
    let dx = (x1 - x0) as f64;
    let dy = (y1 - y0) as f64;
    let dist = (dx * dx + dy * dy).sqrt();
    let r = thickness / 2;
    if dist == 0.0 {
        ellipse_fill(buf, w, h, color, x0, y0, r, r);
        return;
    }
    let steps = (dist * 2.0) as i64;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let tx = x0 as f64 + t * dx;
        let ty = y0 as f64 + t * dy;
        ellipse_fill(buf, w, h, color, tx.round() as i64, ty.round() as i64, r, r);
    }
}

/// A capsule is a thick line with radius `r`, i.e. thickness `r * 2`.
pub fn capsule_fill(buf: &mut Buf, w: i64, h: i64, color: i32, x0: i64, y0: i64, x1: i64, y1: i64, r: i64) {
    draw_thick_line(buf, w, h, color, x0, y0, x1, y1, r * 2);
}

pub fn rect_stroke(buf: &mut Buf, w: i64, h: i64, color: i32, x: i64, y: i64, rw: i64, rh: i64) {
    for i in 0..rw {
        set(buf, w, h, x + i, y, color);
        set(buf, w, h, x + i, y + rh - 1, color);
    }
    for j in 0..rh {
        set(buf, w, h, x, y + j, color);
        set(buf, w, h, x + rw - 1, y + j, color);
    }
}

pub fn rect_fill(buf: &mut Buf, w: i64, h: i64, color: i32, x: i64, y: i64, rw: i64, rh: i64) {
    for yy in y..y + rh {
        if yy < 0 || yy >= h {
            continue;
        }
        let row = yy * w;
        for xx in x..x + rw {
            if xx >= 0 && xx < w {
                buf[(row + xx) as usize] = color;
            }
        }
    }
}

pub fn ellipse_fill(buf: &mut Buf, w: i64, h: i64, color: i32, cx: i64, cy: i64, rx: i64, ry: i64) {
    if rx <= 0 || ry <= 0 {
        if rx == 0 && ry == 0 {
            set(buf, w, h, cx, cy, color);
        }
        return;
    }
    for yy in cy - ry..=cy + ry {
        if yy < 0 || yy >= h {
            continue;
        }
        let dy = (yy - cy) as f64 / ry as f64;
        let inside = 1.0 - dy * dy;
        if inside < 0.0 {
            continue;
        }
        let span = (rx as f64 * inside.sqrt()).floor() as i64;
        let row = yy * w;
        for xx in (cx - span)..=(cx + span) {
            if xx >= 0 && xx < w {
                buf[(row + xx) as usize] = color;
            }
        }
    }
}

/// Midpoint-ellipse stroke, four-way symmetric.
pub fn ellipse_stroke(buf: &mut Buf, w: i64, h: i64, color: i32, cx: i64, cy: i64, rx: i64, ry: i64) {
    if rx <= 0 || ry <= 0 {
        return;
    }
    let rx2 = (rx * rx) as f64;
    let ry2 = (ry * ry) as f64;
    let two_rx2 = 2.0 * rx2;
    let two_ry2 = 2.0 * ry2;

    let mut x = 0i64;
    let mut y = ry;
    let mut px = 0f64;
    let mut py = two_rx2 * y as f64;

    let plot = |buf: &mut Buf, x: i64, y: i64| {
        set(buf, w, h, cx + x, cy + y, color);
        set(buf, w, h, cx - x, cy + y, color);
        set(buf, w, h, cx + x, cy - y, color);
        set(buf, w, h, cx - x, cy - y, color);
    };

    plot(buf, x, y);
    let mut p = ry2 - (rx2 * ry as f64) + (0.25 * rx2);
    p = p.round();
    while px < py {
        x += 1;
        px += two_ry2;
        if p < 0.0 {
            p += ry2 + px;
        } else {
            y -= 1;
            py -= two_rx2;
            p += ry2 + px - py;
        }
        plot(buf, x, y);
    }

    let mut p = ry2 * (x as f64 + 0.5) * (x as f64 + 0.5) + rx2 * (y as f64 - 1.0) * (y as f64 - 1.0) - rx2 * ry2;
    p = p.round();
    while y > 0 {
        y -= 1;
        py -= two_rx2;
        if p > 0.0 {
            p += rx2 - py;
        } else {
            x += 1;
            px += two_ry2;
            p += rx2 - py + px;
        }
        plot(buf, x, y);
    }
}

/// Quadratic Bezier, sampled parametrically.
pub fn draw_bezier(buf: &mut Buf, w: i64, h: i64, color: i32, x0: i64, y0: i64, cxp: i64, cyp: i64, x1: i64, y1: i64) {
    let steps = (x0 - x1).abs().max((y0 - y1).abs()).max((x0 - cxp).abs()).max((y0 - cyp).abs()).max(10) * 2;
    for i in 0..=steps {
        let t = i as f64 / steps as f64;
        let one_minus_t = 1.0 - t;
        let tx = one_minus_t * one_minus_t * x0 as f64
            + 2.0 * one_minus_t * t * cxp as f64
            + t * t * x1 as f64;
        let ty = one_minus_t * one_minus_t * y0 as f64
            + 2.0 * one_minus_t * t * cyp as f64
            + t * t * y1 as f64;
        set(buf, w, h, tx.round() as i64, ty.round() as i64, color);
    }
}

pub fn dither_rect(buf: &mut Buf, w: i64, h: i64, color: i32, x: i64, y: i64, rw: i64, rh: i64, pattern: &str) {
    for yy in y..y + rh {
        if yy < 0 || yy >= h {
            continue;
        }
        let row = yy * w;
        for xx in x..x + rw {
            if xx < 0 || xx >= w {
                continue;
            }
            let hit = match pattern {
                "checker" => (xx + yy).rem_euclid(2) == 0,
                "dots" => xx.rem_euclid(2) == 0 && yy.rem_euclid(2) == 0,
                _ => false,
            };
            if hit {
                buf[(row + xx) as usize] = color;
            }
        }
    }
}

/// Scanline fill of a polygon given as a flat list of (x, y) vertices.
pub fn draw_poly(buf: &mut Buf, w: i64, h: i64, color: i32, points: &[(f64, f64)]) {
    if points.is_empty() {
        return;
    }
    let min_y = points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min) as i64;
    let max_y = points.iter().map(|p| p.1).fold(f64::NEG_INFINITY, f64::max) as i64;

    for y in min_y..=max_y {
        if y < 0 || y >= h {
            continue;
        }
        let yf = y as f64;
        let mut nodes = Vec::new();
        let n = points.len();
        let mut j = n - 1;
        for i in 0..n {
            let (xi, yi) = points[i];
            let (xj, yj) = points[j];
            if (yi < yf && yf <= yj) || (yj < yf && yf <= yi) {
                if yj != yi {
                    nodes.push(xi + (yf - yi) / (yj - yi) * (xj - xi));
                }
            }
            j = i;
        }
        nodes.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let mut i = 0;
        while i + 1 < nodes.len() {
            let x0 = nodes[i].ceil() as i64;
            let x1 = nodes[i + 1].floor() as i64;
            for x in x0..=x1 {
                if x >= 0 && x < w {
                    buf[(y * w + x) as usize] = color;
                }
            }
            i += 2;
        }
    }
}

/// 4-connected breadth-first flood fill. No-op if the seed already matches.
pub fn flood_fill(buf: &mut Buf, w: i64, h: i64, color: i32, sx: i64, sy: i64) {
    if !in_bounds(sx, sy, w, h) {
        return;
    }
    let target = buf[idx(sx, sy, w)];
    if target == color {
        return;
    }
    let mut q = VecDeque::new();
    q.push_back((sx, sy));
    while let Some((x, y)) = q.pop_front() {
        if !in_bounds(x, y, w, h) {
            continue;
        }
        let i = idx(x, y, w);
        if buf[i] != target {
            continue;
        }
        buf[i] = color;
        q.push_back((x + 1, y));
        q.push_back((x - 1, y));
        q.push_back((x, y + 1));
        q.push_back((x, y - 1));
    }
}

pub fn gradient_radial(buf: &mut Buf, w: i64, h: i64, palette_indices: &[i32], cx: i64, cy: i64, r: i64) {
    if palette_indices.is_empty() || r <= 0 {
        return;
    }
    for yy in cy - r..=cy + r {
        for xx in cx - r..=cx + r {
            if !in_bounds(xx, yy, w, h) {
                continue;
            }
            let dist = (((xx - cx) * (xx - cx) + (yy - cy) * (yy - cy)) as f64).sqrt();
            if dist <= r as f64 {
                let t = dist / r as f64;
                let i = (t * (palette_indices.len() - 1) as f64) as usize;
                buf[idx(xx, yy, w)] = palette_indices[i.min(palette_indices.len() - 1)];
            }
        }
    }
}

pub fn gradient_linear(buf: &mut Buf, w: i64, h: i64, palette_indices: &[i32], x0: i64, y0: i64, x1: i64, y1: i64) {
    if palette_indices.is_empty() {
        return;
    }
    let dx = (x1 - x0) as f64;
    let dy = (y1 - y0) as f64;
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0.0 {
        return;
    }
    for y in 0..h {
        for x in 0..w {
            let t = ((x - x0) as f64 * dx + (y - y0) as f64 * dy) / len_sq;
            let t = t.clamp(0.0, 1.0);
            let i = (t * (palette_indices.len() - 1) as f64) as usize;
            buf[idx(x, y, w)] = palette_indices[i.min(palette_indices.len() - 1)];
        }
    }
}

/// Replaces every pixel equal to `old` with `new`, optionally gated by a
/// mask buffer (pixels where `mask[i] == 0` are skipped).
pub fn color_replace(buf: &mut Buf, old: i32, new: i32, mask: Option<&Buf>) {
    for i in 0..buf.len() {
        if let Some(m) = mask {
            if m[i] == 0 {
                continue;
            }
        }
        if buf[i] == old {
            buf[i] = new;
        }
    }
}

/// Clears every pixel of `buf` where `mask` is zero.
pub fn mask_layer_fn(buf: &mut Buf, mask: &Buf) {
    for i in 0..buf.len() {
        if mask[i] == 0 {
            buf[i] = 0;
        }
    }
}

/// Dilates the non-zero pixels of `buf` itself by `thickness`, stamping
/// `color` onto each newly-covered ring.
pub fn outline_layer(buf: &mut Buf, w: i64, h: i64, thickness: i64, color: i32) {
    let mask: Vec<i32> = buf.iter().map(|&v| if v != 0 { 1 } else { 0 }).collect();
    dilate_and_stamp(buf, &mask, w, h, thickness, color);
}

/// Dilates `mask` by `thickness`, writing `color` into `dest` for every
/// newly-covered pixel (`spec.md`'s "outline from mask").
pub fn outline_from_mask(dest: &mut Buf, mask: &Buf, w: i64, h: i64, color: i32, thickness: i64) {
    dilate_and_stamp(dest, mask, w, h, thickness, color);
}

fn dilate_and_stamp(dest: &mut Buf, mask: &Buf, w: i64, h: i64, thickness: i64, color: i32) {
    let mut work = mask.to_vec();
    for _ in 0..thickness {
        let mut add = Vec::new();
        for y in 0..h {
            for x in 0..w {
                let i = idx(x, y, w);
                if work[i] != 0 {
                    continue;
                }
                let touches = [(1, 0), (-1, 0), (0, 1), (0, -1)].iter().any(|&(dx, dy)| {
                    let (nx, ny) = (x + dx, y + dy);
                    in_bounds(nx, ny, w, h) && work[idx(nx, ny, w)] != 0
                });
                if touches {
                    add.push(i);
                }
            }
        }
        for i in &add {
            dest[*i] = color;
            work[*i] = 1;
        }
    }
}

pub fn mirror_x(buf: &mut Buf, w: i64, h: i64) {
    for y in 0..h {
        let row = y * w;
        for x in 0..w / 2 {
            buf[(row + w - 1 - x) as usize] = buf[(row + x) as usize];
        }
    }
}

pub fn mirror_y(buf: &mut Buf, w: i64, h: i64) {
    for x in 0..w {
        for y in 0..h / 2 {
            buf[((h - 1 - y) * w + x) as usize] = buf[(y * w + x) as usize];
        }
    }
}

pub fn translate(buf: &mut Buf, w: i64, h: i64, dx: i64, dy: i64) {
    let old = buf.to_vec();
    for v in buf.iter_mut() {
        *v = 0;
    }
    for y in 0..h {
        for x in 0..w {
            let (sx, sy) = (x - dx, y - dy);
            if in_bounds(sx, sy, w, h) {
                buf[idx(x, y, w)] = old[idx(sx, sy, w)];
            }
        }
    }
}

/// Nearest-neighbour rotation by `angle_deg` degrees around `(cx, cy)`.
pub fn rotate(buf: &mut Buf, w: i64, h: i64, angle_deg: f64, cx: f64, cy: f64) {
    let old = buf.to_vec();
    for v in buf.iter_mut() {
        *v = 0;
    }
    let angle = angle_deg.to_radians();
    let cos_a = angle.cos();
    let sin_a = angle.sin();
    for y in 0..h {
        for x in 0..w {
            let tx = x as f64 - cx;
            let ty = y as f64 - cy;
            let sx = (tx * cos_a + ty * sin_a + cx).round() as i64;
            let sy = (-tx * sin_a + ty * cos_a + cy).round() as i64;
            if in_bounds(sx, sy, w, h) {
                buf[idx(x, y, w)] = old[idx(sx, sy, w)];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_buf(w: i64, h: i64) -> Vec<i32> {
        vec![0; (w * h) as usize]
    }

    #[test]
    fn scenario_1_pixel_on_cleared_buffer() {
        let mut buf = new_buf(4, 1);
        buf.iter_mut().for_each(|v| *v = 0);
        set(&mut buf, 4, 1, 2, 0, 1);
        assert_eq!(buf, vec![0, 0, 1, 0]);
    }

    #[test]
    fn line_is_bounds_safe_for_huge_coordinates() {
        let mut buf = new_buf(4, 4);
        draw_line(&mut buf, 4, 4, 1, -1000, -1000, 1000, 1000);
        assert!(buf.iter().all(|&v| v == 0 || v == 1));
    }

    #[test]
    fn ellipse_fill_zero_radius_plots_one_pixel() {
        let mut buf = new_buf(3, 3);
        ellipse_fill(&mut buf, 3, 3, 5, 1, 1, 0, 0);
        assert_eq!(buf, vec![0, 0, 0, 0, 5, 0, 0, 0, 0]);
    }

    #[test]
    fn ellipse_fill_negative_radius_is_noop() {
        let mut buf = new_buf(3, 3);
        ellipse_fill(&mut buf, 3, 3, 5, 1, 1, -1, -1);
        assert_eq!(buf, vec![0; 9]);
    }

    #[test]
    fn gradient_linear_matches_formula_and_reference_source() {
        // t = x/3 for this segment; idx = floor(t * (N-1)) only reaches
        // index 1 once t hits exactly 1.0 (x == 3). See DESIGN.md for why
        // this differs from spec.md's worked example.
        let mut buf = new_buf(4, 1);
        gradient_linear(&mut buf, 4, 1, &[1, 2], 0, 0, 3, 0);
        assert_eq!(buf, vec![1, 1, 1, 2]);
    }

    #[test]
    fn flood_fill_is_noop_when_seed_matches_target() {
        let mut buf = vec![5; 9];
        flood_fill(&mut buf, 3, 3, 5, 1, 1);
        assert_eq!(buf, vec![5; 9]);
    }

    #[test]
    fn flood_fill_bounds_safe() {
        let mut buf = new_buf(3, 3);
        flood_fill(&mut buf, 3, 3, 9, -5, -5);
        assert_eq!(buf, vec![0; 9]);
    }

    #[test]
    fn outline_on_fully_covered_mask_adds_nothing() {
        // Scenario 2: a 3x3 canvas fully covered by the mask has no
        // "outside" pixels for the outline to dilate into.
        let mask = vec![1; 9];
        let mut dest = vec![1; 9];
        outline_from_mask(&mut dest, &mask, 3, 3, 2, 1);
        assert_eq!(dest, vec![1; 9]);
    }

    #[test]
    fn dither_checker_pattern() {
        let mut buf = new_buf(2, 2);
        dither_rect(&mut buf, 2, 2, 9, 0, 0, 2, 2, "checker");
        assert_eq!(buf, vec![9, 0, 0, 9]);
    }

    #[test]
    fn mirror_x_reflects_left_half() {
        let mut buf = vec![1, 2, 0, 0];
        mirror_x(&mut buf, 4, 1);
        assert_eq!(buf, vec![1, 2, 2, 1]);
    }

    #[test]
    fn translate_shifts_and_zero_fills() {
        let mut buf = vec![1, 2, 3, 4];
        translate(&mut buf, 2, 2, 1, 0);
        assert_eq!(buf, vec![0, 1, 0, 3]);
    }
}
