use super::*;
use crate::combine::reference::combine_pixel;
use crate::sample::scanline::interpolate;

fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// A valid premultiplied pixel: no channel exceeds alpha.
fn premul(seed: u64) -> u32 {
    let r = mix64(seed);
    let a = match r & 3 {
        0 => 0,
        1 => 0xff,
        _ => (r >> 8) as u32 & 0xff,
    };
    let ch = |shift: u32| if a == 0 { 0 } else { ((r >> shift) as u32 & 0xff) % (a + 1) };
    (a << 24) | (ch(16) << 16) | (ch(24) << 8) | ch(32)
}

#[test]
fn over_matches_reference() {
    for i in 0..4096u64 {
        let (s, d) = (premul(i), premul(i ^ 0xdead_beef));
        assert_eq!(over_pixel(s, d), combine_pixel(Operator::Over, s, d), "{s:08x} {d:08x}");
    }
    let src: Vec<u32> = (0..37).map(premul).collect();
    let mut dest: Vec<u32> = (100..137).map(premul).collect();
    let expect: Vec<u32> = dest
        .iter()
        .zip(&src)
        .map(|(&d, &s)| combine_pixel(Operator::Over, s, d))
        .collect();
    over_run(&mut dest, &src);
    assert_eq!(dest, expect);
}

#[test]
fn add_saturates_each_lane() {
    let mut dest = [0x00ff_0000, 0x80ff_1020, 0xffff_ffff];
    add_run(&mut dest, &[0x0010_0000, 0x9001_0a0b, 0x0000_0001]);
    assert_eq!(dest, [0x00ff_0000, 0xffff_1a2b, 0xffff_ffff]);
}

#[test]
fn packed_bilinear_matches_four_weight_blend() {
    for i in 0..4096u64 {
        let r = mix64(i);
        let c = [premul(i), premul(i + 7), premul(i + 13), premul(i + 29)];
        let (wx, wy) = ((r & 0x7f) as u32, ((r >> 7) & 0x7f) as u32);
        assert_eq!(
            bilinear_pixel(c, wx, wy),
            interpolate(c[0], c[1], c[2], c[3], wx, wy),
            "{c:08x?} wx={wx} wy={wy}"
        );
    }
}

#[test]
fn portable_bilinear_kernel_walks_the_row() {
    let top = [0xff00_0000, 0xffff_ffff, 0xff00_0000];
    let bottom = top;
    let mut out = [0; 3];
    Portable::bilinear(&mut out, &top, &bottom, 0, Fixed::ZERO, Fixed::HALF);
    assert_eq!(out, [0xff00_0000, 0xff7f_7f7f, 0xffff_ffff]);
}

#[test]
fn solid_colours_follow_destination_order() {
    assert_eq!(solid_in_order(A8R8G8B8, 0x8011_2233), 0x8011_2233);
    assert_eq!(solid_in_order(X8B8G8R8, 0x8011_2233), 0x8033_2211);
}

#[test]
fn table_covers_only_cheap_operators() {
    for path in FAST_PATHS {
        assert!(matches!(
            path.op,
            crate::dispatch::fast_path::OpPattern::Is(Operator::Over | Operator::Add | Operator::Src)
        ));
    }
}
