use super::*;

const RED: u32 = 0xffff_0000;
const HALF_BLUE: u32 = 0x8000_0080;

#[test]
fn porter_duff_table() {
    let cases = [
        (Operator::Clear, 0),
        (Operator::Src, RED),
        (Operator::Dst, HALF_BLUE),
        (Operator::Over, RED),
        (Operator::OverReverse, 0xff7f_0080),
        (Operator::In, 0x8080_0000),
        (Operator::InReverse, HALF_BLUE),
        (Operator::Out, 0x7f7f_0000),
        (Operator::OutReverse, 0),
        (Operator::Atop, 0x8080_0000),
        (Operator::AtopReverse, 0xff7f_0080),
        (Operator::Xor, 0x7f7f_0000),
        (Operator::Add, 0xffff_0080),
        (Operator::Saturate, 0xff7f_0080),
    ];
    for (op, expect) in cases {
        assert_eq!(combine_pixel(op, RED, HALF_BLUE), expect, "{op:?}");
    }
}

#[test]
fn add_saturates_every_lane() {
    assert_eq!(combine_pixel(Operator::Add, 0x0010_0000, 0x00ff_0000), 0x00ff_0000);
    assert_eq!(combine_pixel(Operator::Add, 0xffff_0000, 0xff00_0000), 0xffff_0000);
    assert_eq!(combine_pixel(Operator::Add, 0x8001_0203, 0x90ff_0a0b), 0xffff_0c0e);
}

#[test]
fn mask_scales_source_first() {
    let mut dest = [HALF_BLUE, HALF_BLUE, HALF_BLUE];
    let src = [RED, RED, RED];
    let mask = [0, 0x8000_0000, 0xff00_0000];
    combine(Operator::Over, &mut dest, &src, Some(&mask));
    assert_eq!(dest[0], HALF_BLUE);
    assert_eq!(dest[1], combine_pixel(Operator::Over, 0x8080_0000, HALF_BLUE));
    assert_eq!(dest[2], RED);
}

#[test]
fn mask_colour_channels_are_ignored() {
    assert_eq!(apply_mask(RED, 0x80ff_ffff), apply_mask(RED, 0x8000_0000));
    assert_eq!(apply_mask(RED, 0x00ff_ffff), 0);
}

#[test]
fn blend_mode_identities() {
    let c = 0xff33_6699;
    assert_eq!(combine_pixel(Operator::Multiply, 0xffff_ffff, c), c);
    assert_eq!(combine_pixel(Operator::Screen, 0xff00_0000, c), c);
    assert_eq!(combine_pixel(Operator::Difference, c, c), 0xff00_0000);
    assert_eq!(combine_pixel(Operator::Darken, 0, c), c);
    assert_eq!(combine_pixel(Operator::Lighten, 0xffff_ffff, c), 0xffff_ffff);
    assert_eq!(combine_pixel(Operator::Exclusion, 0xff00_0000, c), c);
}

#[test]
fn blend_modes_onto_transparent_return_source() {
    let s = 0x8040_2010;
    for op in Operator::ALL.into_iter().filter(|op| op.is_blend_mode()) {
        assert_eq!(combine_pixel(op, s, 0), s, "{op:?}");
    }
}
