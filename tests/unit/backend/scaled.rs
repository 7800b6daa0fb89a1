use super::*;
use crate::dispatch::fast_path::PathKey;
use crate::dispatch::flags::FormatCode;
use crate::dispatch::implementation::{
    BackendKind, ImplementationChain, create_general_implementation, create_implementation,
};
use crate::image::filter::FilterKind;
use crate::image::model::Image;

fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn fast_chain() -> ImplementationChain {
    let fast = create_implementation(BackendKind::Fast, create_general_implementation())
        .expect("fast backend");
    ImplementationChain::from_head(fast)
}

fn source(w: u32, h: u32, seed: u64) -> Image<'static> {
    let mut img = Image::new(PixelFormat::A8R8G8B8, w, h, None, 0).expect("source");
    for y in 0..h {
        for x in 0..w {
            let r = mix64(seed ^ u64::from(y * w + x));
            let a = (r >> 56) as u32 | 0x0f;
            let c = (r as u32 & 0x00ff_ffff) & (a * 0x0001_0101);
            img.set_pixel(x, y, (a << 24) | c).expect("pixel");
        }
    }
    img
}

fn render(chain: &ImplementationChain, op: Operator, src: &Image<'_>, seed: u64) -> Vec<u32> {
    let mut dst = source(13, 11, seed);
    crate::composite::composite_with(chain, op, src, None, &mut dst, -3, -2, 0, 0, 0, 0, 13, 11)
        .expect("composite");
    dst.data().expect("bits").to_vec()
}

#[test]
fn scaled_sources_resolve_to_the_packed_lane_backend() {
    let chain = fast_chain();
    let key = PathKey {
        op: Operator::Over,
        src: FormatCode::Bits(PixelFormat::A8B8G8R8),
        src_flags: PathFlags::SCALED_BILINEAR | PathFlags::REPEAT_PAD,
        mask: FormatCode::Null,
        mask_flags: PathFlags::empty(),
        dest: FormatCode::Bits(PixelFormat::X8B8G8R8),
        dest_flags: PathFlags::STANDARD_SOURCE,
    };
    assert_eq!(chain.head().resolve_backend(&key), BackendKind::Fast);

    let reflect = PathKey {
        src_flags: PathFlags::SCALED_BILINEAR | PathFlags::REPEAT_REFLECT,
        ..key
    };
    assert_eq!(chain.head().resolve_backend(&reflect), BackendKind::General);
}

#[test]
fn scaling_matches_the_general_path() {
    let scales = [
        (Fixed::HALF, Fixed::HALF),
        (Fixed(0xc000), Fixed(0x1_4000)),
        (Fixed(0x2_3456), Fixed(0x0_9abc)),
    ];
    let fast = fast_chain();
    let reference = ImplementationChain::reference();
    for (i, &(sx, sy)) in scales.iter().enumerate() {
        for filter in [FilterKind::Nearest, FilterKind::Bilinear] {
            for repeat in [Repeat::None, Repeat::Pad, Repeat::Normal, Repeat::Reflect] {
                let mut src = source(7, 5, i as u64);
                src.set_transform(Some(Transform::scale(sx, sy)));
                src.set_filter(filter, &[]).expect("filter");
                src.set_repeat(repeat);
                for op in [Operator::Src, Operator::Over] {
                    assert_eq!(
                        render(&fast, op, &src, 99),
                        render(&reference, op, &src, 99),
                        "{filter:?} {repeat:?} {op:?} scale #{i}"
                    );
                }
            }
        }
    }
}

#[test]
fn edge_texels_follow_the_repeat_mode() {
    let row = [1, 2, 3];
    assert_eq!(texel(Some(&row), Repeat::None, -1 << 16, 3), 0);
    assert_eq!(texel(Some(&row), Repeat::Pad, -5 << 16, 3), 1);
    assert_eq!(texel(Some(&row), Repeat::Normal, 4 << 16, 3), 2);
    assert_eq!(texel(Some(&row), Repeat::Reflect, 3 << 16, 3), 3);
    assert_eq!(texel(None, Repeat::Pad, 0, 3), 0);
}

#[test]
fn padded_bilinear_repeats_the_last_column_exactly() {
    let row = [0xff10_2030, 0xff80_8080, 0xffc0_4020];
    let mut src = Image::new(PixelFormat::A8R8G8B8, 3, 1, None, 0).expect("source");
    for (x, &px) in row.iter().enumerate() {
        src.set_pixel(x as u32, 0, px).expect("pixel");
    }
    src.set_transform(Some(Transform::scale(Fixed::HALF, Fixed::HALF)));
    src.set_filter(FilterKind::Bilinear, &[]).expect("filter");
    src.set_repeat(Repeat::Pad);

    let chain = fast_chain();
    let key = PathKey {
        op: Operator::Src,
        src: FormatCode::Bits(PixelFormat::A8R8G8B8),
        src_flags: PathFlags::SCALED_BILINEAR | PathFlags::REPEAT_PAD,
        mask: FormatCode::Null,
        mask_flags: PathFlags::empty(),
        dest: FormatCode::Bits(PixelFormat::A8R8G8B8),
        dest_flags: PathFlags::STANDARD_SOURCE,
    };
    assert_eq!(chain.head().resolve_backend(&key), BackendKind::Fast);

    let mut dst = Image::new(PixelFormat::A8R8G8B8, 12, 2, None, 0).expect("dest");
    let (w, h) = (12, 2);
    crate::composite::composite_with(&chain, Operator::Src, &src, None, &mut dst, 0, 0, 0, 0, 0, 0, w, h)
        .expect("composite");
    for y in 0..2 {
        // Samples land at (i + 0.5) / 2 - 0.5, so from i = 5 on both taps pad to column 2.
        for x in 5..12 {
            assert_eq!(dst.pixel(x, y).expect("pixel"), row[2], "({x}, {y})");
        }
        assert_eq!(dst.pixel(0, y).expect("pixel"), row[0]);
        assert_ne!(dst.pixel(4, y).expect("pixel"), row[2]);
    }
}
