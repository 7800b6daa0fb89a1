use super::*;
use crate::combine::op::Operator;
use crate::dispatch::implementation::ImplementationChain;
use crate::image::format::PixelFormat;
use crate::image::model::Image;

fn run(op: Operator, src: &Image<'_>, mask: Option<&Image<'_>>, dst: &mut Image<'_>) {
    let (w, h) = (dst.width(), dst.height());
    crate::composite::composite_with(
        &ImplementationChain::reference(),
        op,
        src,
        mask,
        dst,
        0,
        0,
        0,
        0,
        0,
        0,
        w,
        h,
    )
    .expect("composite");
}

#[test]
fn catch_all_entry_matches_everything() {
    assert_eq!(FAST_PATHS.len(), 1);
    assert_eq!(FAST_PATHS[0].op, crate::dispatch::fast_path::OpPattern::Any);
}

#[test]
fn converts_through_argb() {
    let mut src = Image::new(PixelFormat::R5G6B5, 2, 1, None, 0).expect("src");
    src.set_pixel_argb(0, 0, 0xffff_0000).expect("px");
    src.set_pixel_argb(1, 0, 0xff00_00ff).expect("px");
    let mut dst = Image::new(PixelFormat::A8B8G8R8, 2, 1, None, 0).expect("dst");
    run(Operator::Src, &src, None, &mut dst);
    assert_eq!(dst.pixel(0, 0), Some(0xff00_00ff));
    assert_eq!(dst.pixel(1, 0), Some(0xffff_0000));
}

#[test]
fn masks_scale_the_source() {
    let src = Image::solid(0xffff_ffff);
    let mut mask = Image::new(PixelFormat::A8, 2, 1, None, 0).expect("mask");
    mask.set_pixel(0, 0, 0x80).expect("px");
    let mut dst = Image::new(PixelFormat::A8R8G8B8, 2, 1, None, 0).expect("dst");
    run(Operator::Add, &src, Some(&mask), &mut dst);
    assert_eq!(dst.pixel(0, 0), Some(0x8080_8080));
    assert_eq!(dst.pixel(1, 0), Some(0));
}

#[test]
fn blend_modes_run_through_the_reference_combiner() {
    let src = Image::solid(0xff80_8080);
    let mut dst = Image::new(PixelFormat::X8R8G8B8, 1, 1, None, 0).expect("dst");
    dst.set_pixel_argb(0, 0, 0xffff_ffff).expect("px");
    run(Operator::Multiply, &src, None, &mut dst);
    assert_eq!(dst.pixel_argb(0, 0), Some(0xff80_8080));
}
