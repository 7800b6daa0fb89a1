use super::*;

fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn pixels(n: usize, seed: u64) -> Vec<u32> {
    (0..n as u64)
        .map(|i| {
            let r = mix64(seed ^ (i << 8));
            let a = (r >> 24) as u32 & 0xff;
            let c = r as u32 & 0x00ff_ffff & (a * 0x0001_0101);
            (a << 24) | c
        })
        .collect()
}

#[test]
fn combiners_match_reference() {
    if !std::arch::is_x86_feature_detected!("avx2") {
        return;
    }
    for n in [0, 7, 8, 9, 31, 100] {
        let src = pixels(n, 11);
        let mask = pixels(n, 12);
        for (op, combine) in COMBINERS {
            for m in [None, Some(&mask[..])] {
                let mut expect = pixels(n, 13);
                let mut got = expect.clone();
                reference::combine(*op, &mut expect, &src, m);
                combine(*op, &mut got, &src, m);
                assert_eq!(got, expect, "{op:?} n={n} masked={}", m.is_some());
            }
        }
    }
}

#[test]
fn opaque_sources_replace_and_x888_sets_alpha() {
    if !std::arch::is_x86_feature_detected!("avx2") {
        return;
    }
    let src: Vec<u32> = (0..11).map(|i| 0xff00_0000 | i * 0x0001_0203).collect();
    let mut dest = pixels(11, 21);
    // SAFETY: AVX2 was detected above.
    unsafe { over_run(&mut dest, &src) };
    assert_eq!(dest, src);

    let x888: Vec<u32> = (0..11).map(|i| i * 0x0001_0203).collect();
    let mut dest = vec![0; 11];
    // SAFETY: AVX2 was detected above.
    unsafe { src_x888_run(&mut dest, &x888) };
    assert_eq!(dest, src);
}
