//! AVX2 kernels: eight pixels per step. Tails and everything not listed here go to SSE2.
#![allow(unsafe_code)]

#[cfg(target_arch = "x86")]
use std::arch::x86::*;
#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

use crate::backend::general::general_composite;
use crate::backend::sse2;
use crate::combine::op::Operator;
use crate::combine::reference::{self, CombineFn};
use crate::composite::CompositeInfo;
use crate::dispatch::fast_path::{FastPath, FormatPattern};
use crate::dispatch::flags::PathFlags;
use crate::dispatch::implementation::Implementation;
use crate::image::format::PixelFormat;

use FormatPattern::{Exact, IgnoringAlpha};
use PixelFormat::*;

const STD: PathFlags = PathFlags::STANDARD_SOURCE;

pub(crate) static FAST_PATHS: &[FastPath] = &[
    FastPath::unmasked(Operator::Over, Exact(A8R8G8B8), STD, IgnoringAlpha(A8R8G8B8), over_8888_8888),
    FastPath::unmasked(Operator::Over, Exact(A8B8G8R8), STD, IgnoringAlpha(A8B8G8R8), over_8888_8888),
    FastPath::unmasked(Operator::Add, Exact(A8R8G8B8), STD, Exact(A8R8G8B8), add_8888_8888),
    FastPath::unmasked(Operator::Add, Exact(A8B8G8R8), STD, Exact(A8B8G8R8), add_8888_8888),
    FastPath::unmasked(Operator::Src, Exact(X8R8G8B8), STD, Exact(A8R8G8B8), src_x888_8888),
    FastPath::unmasked(Operator::Src, Exact(X8B8G8R8), STD, Exact(A8B8G8R8), src_x888_8888),
];

pub(crate) static COMBINERS: &[(Operator, CombineFn)] = &[
    (Operator::Over, combine_over),
    (Operator::Add, combine_add),
];

#[inline]
#[target_feature(enable = "avx2")]
fn load(src: &[u32]) -> __m256i {
    debug_assert!(src.len() >= 8);
    // SAFETY: `src` holds at least eight words; the load is unaligned.
    unsafe { _mm256_loadu_si256(src.as_ptr().cast()) }
}

#[inline]
#[target_feature(enable = "avx2")]
fn store(dest: &mut [u32], v: __m256i) {
    debug_assert!(dest.len() >= 8);
    // SAFETY: `dest` holds at least eight words; the store is unaligned.
    unsafe { _mm256_storeu_si256(dest.as_mut_ptr().cast(), v) }
}

#[inline]
#[target_feature(enable = "avx2")]
fn pix_multiply(a: __m256i, b: __m256i) -> __m256i {
    let t = _mm256_adds_epu16(_mm256_mullo_epi16(a, b), _mm256_set1_epi16(0x0080));
    _mm256_mulhi_epu16(t, _mm256_set1_epi16(0x0101))
}

#[inline]
#[target_feature(enable = "avx2")]
fn negated_alpha(v: __m256i) -> __m256i {
    let a = _mm256_shufflehi_epi16::<0xff>(_mm256_shufflelo_epi16::<0xff>(v));
    _mm256_xor_si256(a, _mm256_set1_epi16(0x00ff))
}

/// Unpack and pack both work within 128-bit halves, so pixel order survives the round trip.
#[inline]
#[target_feature(enable = "avx2")]
fn over8(s: __m256i, d: __m256i) -> __m256i {
    let zero = _mm256_setzero_si256();
    let ia_lo = negated_alpha(_mm256_unpacklo_epi8(s, zero));
    let ia_hi = negated_alpha(_mm256_unpackhi_epi8(s, zero));
    let d_lo = pix_multiply(_mm256_unpacklo_epi8(d, zero), ia_lo);
    let d_hi = pix_multiply(_mm256_unpackhi_epi8(d, zero), ia_hi);
    _mm256_adds_epu8(s, _mm256_packus_epi16(d_lo, d_hi))
}

#[inline]
#[target_feature(enable = "avx2")]
fn all_lanes_eq(v: __m256i, want: __m256i) -> bool {
    _mm256_movemask_epi8(_mm256_cmpeq_epi32(v, want)) == -1
}

/// # Safety
/// The CPU must support AVX2.
#[target_feature(enable = "avx2")]
unsafe fn over_run(dest: &mut [u32], src: &[u32]) {
    let opaque = _mm256_set1_epi32(0xff00_0000_u32 as i32);
    let zero = _mm256_setzero_si256();
    let mut d8 = dest.chunks_exact_mut(8);
    let mut s8 = src.chunks_exact(8);
    for (d, s) in (&mut d8).zip(&mut s8) {
        let sv = load(s);
        if all_lanes_eq(sv, zero) {
            continue;
        }
        if all_lanes_eq(_mm256_and_si256(sv, opaque), opaque) {
            store(d, sv);
        } else {
            store(d, over8(sv, load(d)));
        }
    }
    // SAFETY: AVX2 implies SSE2.
    unsafe { sse2::over_run(d8.into_remainder(), s8.remainder()) }
}

/// # Safety
/// The CPU must support AVX2.
#[target_feature(enable = "avx2")]
unsafe fn add_run(dest: &mut [u32], src: &[u32]) {
    let mut d8 = dest.chunks_exact_mut(8);
    let mut s8 = src.chunks_exact(8);
    for (d, s) in (&mut d8).zip(&mut s8) {
        store(d, _mm256_adds_epu8(load(s), load(d)));
    }
    // SAFETY: AVX2 implies SSE2.
    unsafe { sse2::add_run(d8.into_remainder(), s8.remainder()) }
}

/// # Safety
/// The CPU must support AVX2.
#[target_feature(enable = "avx2")]
unsafe fn src_x888_run(dest: &mut [u32], src: &[u32]) {
    let opaque = _mm256_set1_epi32(0xff00_0000_u32 as i32);
    let mut d8 = dest.chunks_exact_mut(8);
    let mut s8 = src.chunks_exact(8);
    for (d, s) in (&mut d8).zip(&mut s8) {
        store(d, _mm256_or_si256(load(s), opaque));
    }
    for (d, &s) in d8.into_remainder().iter_mut().zip(s8.remainder()) {
        *d = s | 0xff00_0000;
    }
}

fn combine_over(op: Operator, dest: &mut [u32], src: &[u32], mask: Option<&[u32]>) {
    match mask {
        // SAFETY: AVX2 was detected before this combiner was registered.
        None => unsafe { over_run(dest, src) },
        Some(_) => masked(op, dest, src, mask),
    }
}

fn combine_add(op: Operator, dest: &mut [u32], src: &[u32], mask: Option<&[u32]>) {
    match mask {
        // SAFETY: as above.
        None => unsafe { add_run(dest, src) },
        Some(_) => masked(op, dest, src, mask),
    }
}

/// Masked scanlines use the SSE2 combiners further down the chain.
fn masked(op: Operator, dest: &mut [u32], src: &[u32], mask: Option<&[u32]>) {
    let next = sse2::COMBINERS
        .iter()
        .find(|(o, _)| *o == op)
        .map_or(reference::combine as CombineFn, |&(_, f)| f);
    next(op, dest, src, mask);
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
        // SAFETY: AVX2 was detected before this fast path was registered.
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

#[cfg(test)]
#[path = "../../tests/unit/backend/avx2.rs"]
mod tests;
