//! pixmix is a software pixel compositing engine.
//!
//! It combines a source image, an optional mask and a destination with Porter-Duff and
//! separable blend operators on premultiplied 8-bit pixels:
//!
//! - Describe operands as [`Image`]s: solid colours or pixel rectangles in one of the
//!   [`PixelFormat`]s, each with an optional [`Transform`], a [`Filter`] and a [`Repeat`] mode
//! - Call [`composite`] (or [`composite_with`] and an explicit [`ImplementationChain`])
//!
//! Every call is clipped, classified and dispatched once to the most specialized backend in
//! the chain that handles it. All backends produce bit-identical results.
#![deny(missing_docs)]
#![deny(unsafe_code)]

mod foundation;

pub(crate) mod backend;
pub(crate) mod combine;
pub(crate) mod composite;
pub(crate) mod dispatch;
pub(crate) mod image;
pub(crate) mod sample;

pub use crate::foundation::error::{PixmixError, PixmixResult};
pub use crate::foundation::fixed::{Fixed, double_to_fixed, fixed_to_double};

pub use crate::combine::op::Operator;
pub use crate::composite::{composite, composite_with};
pub use crate::dispatch::fast_path::PathKey;
pub use crate::dispatch::flags::{FormatCode, PathFlags};
pub use crate::dispatch::implementation::{
    BackendKind, ChainConfig, DISABLE_ENV, Implementation, ImplementationChain,
    create_general_implementation, create_implementation, default_chain,
};
pub use crate::image::filter::{Filter, FilterKind, Kernel, create_separable_convolution};
pub use crate::image::format::PixelFormat;
pub use crate::image::model::{Image, MAX_DIMENSION, PixelStorage};
pub use crate::image::transform::{Transform, TransformKind};
pub use crate::sample::repeat::Repeat;
pub use crate::sample::scanline::{
    BILINEAR_INTERPOLATION_BITS, BILINEAR_WEIGHT_ONE, ScanlineRuns, bilinear_scanline,
    bilinear_weight, interpolate, nearest_scanline, scanline_runs,
};
