use super::*;
use crate::foundation::fixed::Fixed;
use crate::image::transform::Transform;

fn bits(format: PixelFormat) -> Image<'static> {
    Image::new(format, 4, 4, None, 0).expect("image")
}

#[test]
fn untransformed_image_has_every_transform_flag() {
    let f = image_flags(&bits(PixelFormat::A8R8G8B8));
    assert!(f.contains(
        PathFlags::ID_TRANSFORM
            | PathFlags::SCALE_TRANSFORM
            | PathFlags::AFFINE_TRANSFORM
            | PathFlags::X_UNIT_POSITIVE
            | PathFlags::NEAREST_FILTER
            | PathFlags::REPEAT_NONE
    ));
    assert!(!f.contains(PathFlags::IS_OPAQUE));
    assert!(!f.intersects(PathFlags::SAMPLES_COVER_CLIP_NEAREST | PathFlags::SAMPLES_COVER_CLIP_BILINEAR));
}

#[test]
fn scale_transform_flags() {
    let mut img = bits(PixelFormat::A8R8G8B8);
    img.set_transform(Some(Transform::scale(Fixed::HALF, Fixed::HALF)));
    img.set_filter(FilterKind::Bilinear, &[]).expect("filter");
    let f = image_flags(&img);
    assert!(f.contains(PathFlags::SCALED_BILINEAR));
    assert!(!f.contains(PathFlags::ID_TRANSFORM));
    assert!(!f.contains(PathFlags::NEAREST_FILTER));

    img.set_transform(Some(Transform::scale(Fixed(-Fixed::ONE.0), Fixed::ONE)));
    assert!(!image_flags(&img).contains(PathFlags::X_UNIT_POSITIVE));
}

#[test]
fn bilinear_under_integer_translation_counts_as_nearest() {
    let mut img = bits(PixelFormat::A8R8G8B8);
    img.set_filter(FilterKind::Bilinear, &[]).expect("filter");
    assert!(image_flags(&img).contains(PathFlags::NEAREST_FILTER | PathFlags::BILINEAR_FILTER));

    img.set_transform(Some(Transform::translate(Fixed::from_int(2), Fixed::from_int(-1))));
    assert!(image_flags(&img).contains(PathFlags::NEAREST_FILTER));

    img.set_transform(Some(Transform::translate(Fixed::HALF, Fixed::ZERO)));
    assert!(!image_flags(&img).contains(PathFlags::NEAREST_FILTER));
}

#[test]
fn opacity_needs_an_opaque_format_and_edge_extension() {
    let mut img = bits(PixelFormat::X8R8G8B8);
    assert!(!image_flags(&img).contains(PathFlags::IS_OPAQUE));
    img.set_repeat(Repeat::Pad);
    assert!(image_flags(&img).contains(PathFlags::IS_OPAQUE | PathFlags::REPEAT_PAD));

    let mut conv = bits(PixelFormat::R5G6B5);
    conv.set_repeat(Repeat::Normal);
    conv.set_filter(
        FilterKind::Convolution,
        &[Fixed::ONE, Fixed::ONE, Fixed::ONE],
    )
    .expect("filter");
    assert!(!image_flags(&conv).contains(PathFlags::IS_OPAQUE));
}

#[test]
fn solid_images_cover_everything() {
    let f = image_flags(&Image::solid(0xff00_ff00));
    assert!(f.contains(
        PathFlags::STANDARD_SOURCE
            | PathFlags::SAMPLES_COVER_CLIP_BILINEAR
            | PathFlags::IS_OPAQUE
    ));
    assert!(!image_flags(&Image::solid(0x8000_8000)).contains(PathFlags::IS_OPAQUE));
}

#[test]
fn format_codes() {
    assert_eq!(FormatCode::of(None), FormatCode::Null);
    assert_eq!(FormatCode::of(Some(&Image::solid(0))), FormatCode::Solid);
    let mut tile = Image::new(PixelFormat::A8, 1, 1, None, 0).expect("tile");
    assert_eq!(FormatCode::of(Some(&tile)), FormatCode::Bits(PixelFormat::A8));
    tile.set_repeat(Repeat::Normal);
    assert_eq!(FormatCode::of(Some(&tile)), FormatCode::Solid);
}

#[test]
fn destinations_are_opaque_only_without_alpha() {
    assert!(destination_flags(PixelFormat::X8B8G8R8).contains(PathFlags::IS_OPAQUE));
    assert!(destination_flags(PixelFormat::R5G6B5).contains(PathFlags::IS_OPAQUE));
    assert!(!destination_flags(PixelFormat::A8).contains(PathFlags::IS_OPAQUE));
    assert!(destination_flags(PixelFormat::A8R8G8B8).contains(PathFlags::STANDARD_SOURCE));
}
