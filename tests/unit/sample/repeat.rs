use super::*;

#[test]
fn none_is_transparent_outside() {
    assert_eq!(Repeat::None.resolve(-1, 4), None);
    assert_eq!(Repeat::None.resolve(4, 4), None);
    assert_eq!(Repeat::None.resolve(3, 4), Some(3));
}

#[test]
fn pad_clamps() {
    assert_eq!(Repeat::Pad.resolve(-100, 4), Some(0));
    assert_eq!(Repeat::Pad.resolve(100, 4), Some(3));
}

#[test]
fn normal_wraps_negative_indices() {
    let got: Vec<_> = (-5..5).map(|i| Repeat::Normal.resolve(i, 3).unwrap()).collect();
    assert_eq!(got, vec![1, 2, 0, 1, 2, 0, 1, 2, 0, 1]);
}

#[test]
fn reflect_mirrors_with_double_period() {
    let got: Vec<_> = (-4..8).map(|i| Repeat::Reflect.resolve(i, 3).unwrap()).collect();
    assert_eq!(got, vec![2, 2, 1, 0, 0, 1, 2, 2, 1, 0, 0, 1]);
}

#[test]
fn empty_axis_never_resolves() {
    for r in [Repeat::None, Repeat::Pad, Repeat::Normal, Repeat::Reflect] {
        assert_eq!(r.resolve(0, 0), None);
    }
}
