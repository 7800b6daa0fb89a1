//! SSE2 kernels: four pixels per step, 16-bit lanes.
//!
//! Every kernel reproduces the reference rounding exactly: `pix_multiply` is the rounded
//! `a * b / 255` and bilinear blends truncate the same exact sum.
#![allow(unsafe_code)]

#[cfg(target_arch = "x86")]
use std::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use crate::backend::fast::{self, solid_in_order};
use crate::backend::general::general_composite;
use crate::backend::scaled::{ScanlineKernels, fast_path_table};
use crate::combine::op::Operator;
use crate::combine::reference::{CombineFn, apply_mask, combine_pixel};
use crate::composite::CompositeInfo;
use crate::dispatch::fast_path::{FastPath, FormatPattern};
use crate::dispatch::flags::PathFlags;
use crate::dispatch::implementation::Implementation;
use crate::foundation::fixed::Fixed;
use crate::image::format::PixelFormat;
use crate::sample::scanline::bilinear_weight;

use FormatPattern::{Exact, IgnoringAlpha};
use PixelFormat::*;

const STD: PathFlags = PathFlags::STANDARD_SOURCE;

pub(crate) struct Sse2;

impl ScanlineKernels for Sse2 {
    fn over(dest: &mut [u32], src: &[u32]) {
        // SAFETY: this backend is only built after runtime detection of SSE2.
        unsafe { over_run(dest, src) }
    }

    fn bilinear(out: &mut [u32], top: &[u32], bottom: &[u32], wb: u32, vx: Fixed, unit_x: Fixed) {
        // SAFETY: as above.
        unsafe { bilinear_run(out, top, bottom, wb, vx, unit_x) }
    }
}

fast_path_table!(Sse2;
    FastPath::unmasked(Operator::Over, Exact(A8R8G8B8), STD, IgnoringAlpha(A8R8G8B8), over_8888_8888),
    FastPath::unmasked(Operator::Over, Exact(A8B8G8R8), STD, IgnoringAlpha(A8B8G8R8), over_8888_8888),
    FastPath::solid_masked(Operator::Over, A8, IgnoringAlpha(A8R8G8B8), over_n_8_8888),
    FastPath::solid_masked(Operator::Over, A8, IgnoringAlpha(A8B8G8R8), over_n_8_8888),
    FastPath::unmasked(Operator::Add, Exact(A8R8G8B8), STD, Exact(A8R8G8B8), add_8888_8888),
    FastPath::unmasked(Operator::Add, Exact(A8B8G8R8), STD, Exact(A8B8G8R8), add_8888_8888),
    FastPath::unmasked(Operator::Src, Exact(X8R8G8B8), STD, Exact(A8R8G8B8), src_x888_8888),
    FastPath::unmasked(Operator::Src, Exact(X8B8G8R8), STD, Exact(A8B8G8R8), src_x888_8888),
);

pub(crate) static COMBINERS: &[(Operator, CombineFn)] = &[
    (Operator::Over, combine_over),
    (Operator::Add, combine_add),
    (Operator::Src, combine_src),
];

#[inline]
#[target_feature(enable = "sse2")]
fn load(src: &[u32]) -> __m128i {
    debug_assert!(src.len() >= 4);
    // SAFETY: `src` holds at least four words; the load is unaligned.
    unsafe { _mm_loadu_si128(src.as_ptr().cast()) }
}

#[inline]
#[target_feature(enable = "sse2")]
fn store(dest: &mut [u32], v: __m128i) {
    debug_assert!(dest.len() >= 4);
    // SAFETY: `dest` holds at least four words; the store is unaligned.
    unsafe { _mm_storeu_si128(dest.as_mut_ptr().cast(), v) }
}

/// Rounded `a * b / 255` on 16-bit lanes holding 8-bit values.
#[inline]
#[target_feature(enable = "sse2")]
fn pix_multiply(a: __m128i, b: __m128i) -> __m128i {
    let t = _mm_adds_epu16(_mm_mullo_epi16(a, b), _mm_set1_epi16(0x0080));
    _mm_mulhi_epu16(t, _mm_set1_epi16(0x0101))
}

/// Broadcast each pixel's alpha lane over its four lanes.
#[inline]
#[target_feature(enable = "sse2")]
fn expand_alpha(v: __m128i) -> __m128i {
    _mm_shufflehi_epi16::<0xff>(_mm_shufflelo_epi16::<0xff>(v))
}

#[inline]
#[target_feature(enable = "sse2")]
fn negate(v: __m128i) -> __m128i {
    _mm_xor_si128(v, _mm_set1_epi16(0x00ff))
}

/// `src OVER dest` for four pixels.
#[inline]
#[target_feature(enable = "sse2")]
fn over4(s: __m128i, d: __m128i) -> __m128i {
    let zero = _mm_setzero_si128();
    let ia_lo = negate(expand_alpha(_mm_unpacklo_epi8(s, zero)));
    let ia_hi = negate(expand_alpha(_mm_unpackhi_epi8(s, zero)));
    let d_lo = pix_multiply(_mm_unpacklo_epi8(d, zero), ia_lo);
    let d_hi = pix_multiply(_mm_unpackhi_epi8(d, zero), ia_hi);
    _mm_adds_epu8(s, _mm_packus_epi16(d_lo, d_hi))
}

/// Every channel of four pixels scaled by the matching mask pixel's alpha.
#[inline]
#[target_feature(enable = "sse2")]
fn in4(s: __m128i, m: __m128i) -> __m128i {
    let zero = _mm_setzero_si128();
    let m_lo = expand_alpha(_mm_unpacklo_epi8(m, zero));
    let m_hi = expand_alpha(_mm_unpackhi_epi8(m, zero));
    let lo = pix_multiply(_mm_unpacklo_epi8(s, zero), m_lo);
    let hi = pix_multiply(_mm_unpackhi_epi8(s, zero), m_hi);
    _mm_packus_epi16(lo, hi)
}

#[inline]
#[target_feature(enable = "sse2")]
fn all_opaque(s: __m128i) -> bool {
    let a = _mm_and_si128(s, _mm_set1_epi32(0xff00_0000_u32 as i32));
    _mm_movemask_epi8(_mm_cmpeq_epi32(a, _mm_set1_epi32(0xff00_0000_u32 as i32))) == 0xffff
}

#[inline]
#[target_feature(enable = "sse2")]
fn all_zero(s: __m128i) -> bool {
    _mm_movemask_epi8(_mm_cmpeq_epi32(s, _mm_setzero_si128())) == 0xffff
}

/// # Safety
/// The CPU must support SSE2.
#[target_feature(enable = "sse2")]
pub(crate) unsafe fn over_run(dest: &mut [u32], src: &[u32]) {
    let mut d4 = dest.chunks_exact_mut(4);
    let mut s4 = src.chunks_exact(4);
    for (d, s) in (&mut d4).zip(&mut s4) {
        let sv = load(s);
        if all_zero(sv) {
            continue;
        }
        if all_opaque(sv) {
            store(d, sv);
        } else {
            store(d, over4(sv, load(d)));
        }
    }
    fast::over_run(d4.into_remainder(), s4.remainder());
}

/// # Safety
/// The CPU must support SSE2.
#[target_feature(enable = "sse2")]
pub(crate) unsafe fn add_run(dest: &mut [u32], src: &[u32]) {
    let mut d4 = dest.chunks_exact_mut(4);
    let mut s4 = src.chunks_exact(4);
    for (d, s) in (&mut d4).zip(&mut s4) {
        store(d, _mm_adds_epu8(load(s), load(d)));
    }
    fast::add_run(d4.into_remainder(), s4.remainder());
}

/// # Safety
/// The CPU must support SSE2.
#[target_feature(enable = "sse2")]
unsafe fn src_x888_run(dest: &mut [u32], src: &[u32]) {
    let opaque = _mm_set1_epi32(0xff00_0000_u32 as i32);
    let mut d4 = dest.chunks_exact_mut(4);
    let mut s4 = src.chunks_exact(4);
    for (d, s) in (&mut d4).zip(&mut s4) {
        store(d, _mm_or_si128(load(s), opaque));
    }
    for (d, &s) in d4.into_remainder().iter_mut().zip(s4.remainder()) {
        *d = s | 0xff00_0000;
    }
}

/// Bilinear scanline: vertical blend in 16-bit lanes, then a multiply-add across the two
/// columns.
///
/// # Safety
/// The CPU must support SSE2.
#[target_feature(enable = "sse2")]
pub(crate) unsafe fn bilinear_run(
    out: &mut [u32],
    top: &[u32],
    bottom: &[u32],
    wb: u32,
    mut vx: Fixed,
    unit_x: Fixed,
) {
    let zero = _mm_setzero_si128();
    let wt = _mm_set1_epi16((128 - wb) as i16);
    let wb = _mm_set1_epi16(wb as i16);
    for px in out {
        let x = vx.to_int() as usize;
        let t = _mm_set_epi32(0, 0, top[x + 1] as i32, top[x] as i32);
        let b = _mm_set_epi32(0, 0, bottom[x + 1] as i32, bottom[x] as i32);
        // Lanes 0..4 hold the left column, 4..8 the right one; at most 255 * 128.
        let v = _mm_add_epi16(
            _mm_mullo_epi16(_mm_unpacklo_epi8(t, zero), wt),
            _mm_mullo_epi16(_mm_unpacklo_epi8(b, zero), wb),
        );
        let pairs = _mm_unpacklo_epi16(v, _mm_srli_si128::<8>(v));
        let wh = bilinear_weight(vx) as i16;
        let wx = _mm_set_epi16(wh, 128 - wh, wh, 128 - wh, wh, 128 - wh, wh, 128 - wh);
        let sum = _mm_srli_epi32::<14>(_mm_madd_epi16(pairs, wx));
        let packed = _mm_packs_epi32(sum, sum);
        *px = _mm_cvtsi128_si32(_mm_packus_epi16(packed, packed)) as u32;
        vx += unit_x;
    }
}

/// # Safety
/// The CPU must support SSE2.
#[target_feature(enable = "sse2")]
unsafe fn over_n_8_run(dest: &mut [u32], color: u32, mask: impl Fn(usize) -> u32) {
    let zero = _mm_setzero_si128();
    let solid = _mm_set1_epi32(color as i32);
    let solid_lo = _mm_unpacklo_epi8(solid, zero);
    let mut d4 = dest.chunks_exact_mut(4);
    let mut i = 0;
    for d in &mut d4 {
        let m = [mask(i), mask(i + 1), mask(i + 2), mask(i + 3)];
        i += 4;
        if m == [0; 4] {
            continue;
        }
        let spread = |m: u32| (m * 0x0101_0101) as i32;
        let mv = _mm_set_epi32(spread(m[3]), spread(m[2]), spread(m[1]), spread(m[0]));
        let lo = pix_multiply(solid_lo, _mm_unpacklo_epi8(mv, zero));
        let hi = pix_multiply(solid_lo, _mm_unpackhi_epi8(mv, zero));
        store(d, over4(_mm_packus_epi16(lo, hi), load(d)));
    }
    for (k, d) in d4.into_remainder().iter_mut().enumerate() {
        let m = mask(i + k) << 24;
        *d = combine_pixel(Operator::Over, apply_mask(color, m), *d);
    }
}

/// # Safety
/// The CPU must support SSE2.
#[target_feature(enable = "sse2")]
unsafe fn masked_run(dest: &mut [u32], src: &[u32], mask: &[u32], op: Operator) {
    let mut d4 = dest.chunks_exact_mut(4);
    let mut s4 = src.chunks_exact(4);
    let mut m4 = mask.chunks_exact(4);
    for ((d, s), m) in (&mut d4).zip(&mut s4).zip(&mut m4) {
        let s = in4(load(s), load(m));
        let v = match op {
            Operator::Over => over4(s, load(d)),
            Operator::Add => _mm_adds_epu8(s, load(d)),
            _ => s,
        };
        store(d, v);
    }
    let tail = d4.into_remainder().iter_mut().zip(s4.remainder()).zip(m4.remainder());
    for ((d, &s), &m) in tail {
        *d = combine_pixel(op, apply_mask(s, m), *d);
    }
}

fn combine_over(op: Operator, dest: &mut [u32], src: &[u32], mask: Option<&[u32]>) {
    // SAFETY: SSE2 was detected before this combiner was registered.
    unsafe {
        match mask {
            None => over_run(dest, src),
            Some(mask) => masked_run(dest, src, mask, op),
        }
    }
}

fn combine_add(op: Operator, dest: &mut [u32], src: &[u32], mask: Option<&[u32]>) {
    // SAFETY: as above.
    unsafe {
        match mask {
            None => add_run(dest, src),
            Some(mask) => masked_run(dest, src, mask, op),
        }
    }
}

fn combine_src(op: Operator, dest: &mut [u32], src: &[u32], mask: Option<&[u32]>) {
    match mask {
        None => dest.copy_from_slice(&src[..dest.len()]),
        // SAFETY: as above.
        Some(mask) => unsafe { masked_run(dest, src, mask, op) },
    }
}

fn for_each_row(
    toplevel: &Implementation,
    info: &mut CompositeInfo<'_>,
    kernel: unsafe fn(&mut [u32], &[u32]),
) {
    let src = info.src;
    let Some(bits) = src.bits() else {
        return general_composite(toplevel, info);
    };
    let (w, sx, dx) = (info.width as usize, info.src_x as usize, info.dest_x as usize);
    for j in 0..info.height {
        let s = &bits.row(info.src_y + j)[sx..sx + w];
        let d = &mut info.dest.row_mut(info.dest_y + j)[dx..dx + w];
        // SAFETY: SSE2 was detected before this fast path was registered.
        unsafe { kernel(d, s) };
    }
}

fn over_8888_8888(toplevel: &Implementation, info: &mut CompositeInfo<'_>) {
    for_each_row(toplevel, info, over_run);
}

fn add_8888_8888(toplevel: &Implementation, info: &mut CompositeInfo<'_>) {
    for_each_row(toplevel, info, add_run);
}

fn src_x888_8888(toplevel: &Implementation, info: &mut CompositeInfo<'_>) {
    for_each_row(toplevel, info, src_x888_run);
}

fn over_n_8_8888(toplevel: &Implementation, info: &mut CompositeInfo<'_>) {
    let (src, mask) = (info.src, info.mask);
    let (Some(color), Some(mask)) = (src.solid_color(), mask.and_then(|m| m.bits())) else {
        return general_composite(toplevel, info);
    };
    let color = solid_in_order(info.dest.format, color);
    if color == 0 {
        return;
    }
    let dx = info.dest_x as usize;
    for j in 0..info.height {
        let row = &mut info.dest.row_mut(info.dest_y + j)[dx..dx + info.width as usize];
        let (mx, my) = (info.mask_x, info.mask_y + j);
        // SAFETY: SSE2 was detected before this fast path was registered.
        unsafe { over_n_8_run(row, color, |i| mask.fetch_raw(mx + i as i32, my)) };
    }
}

#[cfg(test)]
#[path = "../../tests/unit/backend/sse2.rs"]
mod tests;
