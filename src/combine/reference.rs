//! Per-channel reference combiners.
//!
//! These are the slowest and simplest formulation of every operator and define the exact
//! output every other backend must reproduce.

use crate::combine::op::Operator;
use crate::foundation::math::{add_sat_un8, alpha, div_one_un8, div_un8, mul_div255};

/// Combine a source scanline (optionally masked) into a destination scanline in place.
pub(crate) type CombineFn = fn(Operator, &mut [u32], &[u32], Option<&[u32]>);

pub(crate) fn combine(op: Operator, dest: &mut [u32], src: &[u32], mask: Option<&[u32]>) {
    match mask {
        None => {
            for (d, &s) in dest.iter_mut().zip(src) {
                *d = combine_pixel(op, s, *d);
            }
        }
        Some(mask) => {
            for ((d, &s), &m) in dest.iter_mut().zip(src).zip(mask) {
                *d = combine_pixel(op, apply_mask(s, m), *d);
            }
        }
    }
}

/// Scale every channel of `s` by the mask's alpha.
#[inline]
pub(crate) fn apply_mask(s: u32, m: u32) -> u32 {
    match alpha(m) {
        0 => 0,
        0xff => s,
        ma => map_channels(s, 0, |c, _| mul_div255(c, ma)),
    }
}

#[inline]
fn map_channels(s: u32, d: u32, f: impl Fn(u32, u32) -> u32) -> u32 {
    let mut out = 0;
    for shift in [0, 8, 16, 24] {
        out |= f((s >> shift) & 0xff, (d >> shift) & 0xff) << shift;
    }
    out
}

/// One premultiplied source pixel combined with one destination pixel.
pub(crate) fn combine_pixel(op: Operator, s: u32, d: u32) -> u32 {
    let sa = alpha(s);
    let da = alpha(d);
    let isa = 0xff - sa;
    let ida = 0xff - da;
    match op {
        Operator::Clear => 0,
        Operator::Src => s,
        Operator::Dst => d,
        Operator::Over => map_channels(s, d, |s, d| add_sat_un8(s, mul_div255(d, isa))),
        Operator::OverReverse => map_channels(s, d, |s, d| add_sat_un8(d, mul_div255(s, ida))),
        Operator::In => map_channels(s, d, |s, _| mul_div255(s, da)),
        Operator::InReverse => map_channels(s, d, |_, d| mul_div255(d, sa)),
        Operator::Out => map_channels(s, d, |s, _| mul_div255(s, ida)),
        Operator::OutReverse => map_channels(s, d, |_, d| mul_div255(d, isa)),
        Operator::Atop => map_channels(s, d, |s, d| {
            add_sat_un8(mul_div255(s, da), mul_div255(d, isa))
        }),
        Operator::AtopReverse => map_channels(s, d, |s, d| {
            add_sat_un8(mul_div255(s, ida), mul_div255(d, sa))
        }),
        Operator::Xor => map_channels(s, d, |s, d| {
            add_sat_un8(mul_div255(s, ida), mul_div255(d, isa))
        }),
        Operator::Add => map_channels(s, d, add_sat_un8),
        Operator::Saturate => {
            if sa > ida {
                let f = div_un8(ida, sa);
                map_channels(s, d, |s, d| add_sat_un8(mul_div255(s, f), d))
            } else {
                map_channels(s, d, add_sat_un8)
            }
        }
        Operator::Multiply
        | Operator::Screen
        | Operator::Overlay
        | Operator::Darken
        | Operator::Lighten
        | Operator::Difference
        | Operator::Exclusion => blend_separable(op, s, d),
    }
}

/// Separable blend term for one channel, in the 255^2 domain.
fn blend_term(op: Operator, d: i32, ad: i32, s: i32, sa: i32) -> i32 {
    match op {
        Operator::Multiply => s * d,
        Operator::Screen => s * ad + d * sa - s * d,
        Operator::Overlay => {
            if 2 * d < ad {
                2 * s * d
            } else {
                sa * ad - 2 * (ad - d) * (sa - s)
            }
        }
        Operator::Darken => (s * ad).min(d * sa),
        Operator::Lighten => (s * ad).max(d * sa),
        Operator::Difference => (s * ad - d * sa).abs(),
        Operator::Exclusion => s * ad + d * sa - 2 * d * s,
        _ => 0,
    }
}

fn blend_separable(op: Operator, s: u32, d: u32) -> u32 {
    const MAX: i32 = 255 * 255;
    let sa = alpha(s) as i32;
    let da = alpha(d) as i32;
    let isa = 255 - sa;
    let ida = 255 - da;

    let ra = (da * 255 + sa * 255 - sa * da).clamp(0, MAX);
    let mut out = div_one_un8(ra as u32) << 24;
    for shift in [0, 8, 16] {
        let sc = ((s >> shift) & 0xff) as i32;
        let dc = ((d >> shift) & 0xff) as i32;
        let rc = isa * dc + ida * sc + blend_term(op, dc, da, sc, sa);
        out |= div_one_un8(rc.clamp(0, MAX) as u32) << shift;
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/combine/reference.rs"]
mod tests;
