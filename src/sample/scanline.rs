//! Scanline primitives shared by every backend.
//!
//! Coordinates advance by a fixed step per output pixel and are never renormalized, so a
//! scanline's last sample is exactly `vx + (n - 1) * unit_x`.

use crate::foundation::fixed::Fixed;

/// Fractional bits kept for bilinear weights.
pub const BILINEAR_INTERPOLATION_BITS: u32 = 7;
/// Sum of the two weights on one axis.
pub const BILINEAR_WEIGHT_ONE: u32 = 1 << BILINEAR_INTERPOLATION_BITS;

/// Weight of the right (or bottom) neighbour for a sample origin `x` (already shifted by
/// `-HALF`).
#[inline]
pub const fn bilinear_weight(x: Fixed) -> u32 {
    ((x.0 >> (16 - BILINEAR_INTERPOLATION_BITS)) as u32) & (BILINEAR_WEIGHT_ONE - 1)
}

/// Blend four ARGB corners. `wx` weighs the right column, `wy` the bottom row.
///
/// Every channel is `sum(corner * w_h * w_v) >> 14`; the products are exact, so any
/// evaluation order gives the same bits.
#[inline]
pub fn interpolate(tl: u32, tr: u32, bl: u32, br: u32, wx: u32, wy: u32) -> u32 {
    let w_tl = (BILINEAR_WEIGHT_ONE - wx) * (BILINEAR_WEIGHT_ONE - wy);
    let w_tr = wx * (BILINEAR_WEIGHT_ONE - wy);
    let w_bl = (BILINEAR_WEIGHT_ONE - wx) * wy;
    let w_br = wx * wy;
    let mut out = 0;
    for shift in [0, 8, 16, 24] {
        let c = |p: u32| (p >> shift) & 0xff;
        let sum = c(tl) * w_tl + c(tr) * w_tr + c(bl) * w_bl + c(br) * w_br;
        out |= (sum >> (2 * BILINEAR_INTERPOLATION_BITS)) << shift;
    }
    out
}

/// Gather `row[floor(vx)]` for each output pixel. Every index must be in range.
#[inline]
pub fn nearest_scanline(out: &mut [u32], row: &[u32], mut vx: Fixed, unit_x: Fixed) {
    for px in out {
        *px = row[vx.to_int() as usize];
        vx += unit_x;
    }
}

/// Bilinear scanline over two rows; `wb` weighs `bottom`. Every `floor(vx)` and its right
/// neighbour must be in range.
pub fn bilinear_scanline(
    out: &mut [u32],
    top: &[u32],
    bottom: &[u32],
    wb: u32,
    mut vx: Fixed,
    unit_x: Fixed,
) {
    for px in out {
        let x = vx.to_int() as usize;
        *px = interpolate(
            top[x],
            top[x + 1],
            bottom[x],
            bottom[x + 1],
            bilinear_weight(vx),
            wb,
        );
        vx += unit_x;
    }
}

/// How a scanline splits around the in-range part of a source row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScanlineRuns {
    /// Samples left of the row.
    pub left: usize,
    /// Samples whose whole neighbourhood is addressable.
    pub middle: usize,
    /// Everything after the middle run.
    pub right: usize,
}

/// Split `width` samples starting at `vx` (step `unit_x`) into the runs before, inside
/// and after `[0, limit)`, where `limit` is a 48.16 coordinate.
///
/// A step that does not advance puts every sample in the right run, where the caller
/// resolves them one at a time.
pub fn scanline_runs(limit: i64, vx: Fixed, unit_x: Fixed, width: usize) -> ScanlineRuns {
    if unit_x.0 <= 0 {
        return ScanlineRuns {
            left: 0,
            middle: 0,
            right: width,
        };
    }
    let vx = i64::from(vx.0);
    let ux = i64::from(unit_x.0);
    let width = width as i64;

    // Samples with vx + i * ux < 0, then samples with vx + i * ux < limit.
    let left = if vx < 0 { ((ux - 1 - vx) / ux).min(width) } else { 0 };
    let inside = if limit > vx {
        ((ux - 1 + limit - vx) / ux).min(width)
    } else {
        0
    };
    let middle = (inside - left).max(0);
    ScanlineRuns {
        left: left as usize,
        middle: middle as usize,
        right: (width - left - middle) as usize,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sample/scanline.rs"]
mod tests;
