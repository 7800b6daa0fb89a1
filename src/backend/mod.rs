//! Composite backends, from the catch-all general path to the SIMD kernels.

pub(crate) mod fast;
pub(crate) mod general;
pub(crate) mod noop;
pub(crate) mod scaled;

#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub(crate) mod avx2;
#[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
pub(crate) mod sse2;

/// Scanline scratch kept inline before spilling to the heap.
pub(crate) const SCANLINE_INLINE: usize = 1024;

pub(crate) type Scanline = smallvec::SmallVec<[u32; SCANLINE_INLINE]>;
