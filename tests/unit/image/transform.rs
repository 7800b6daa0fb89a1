use super::*;

#[test]
fn classification_tracks_matrix_shape() {
    assert_eq!(Transform::IDENTITY.kind(), TransformKind::Identity);
    assert_eq!(
        Transform::scale(Fixed::HALF, Fixed::ONE).kind(),
        TransformKind::Scale
    );
    assert_eq!(
        Transform::translate(Fixed::from_int(3), Fixed::ZERO).kind(),
        TransformKind::Scale
    );
    let rot = Transform::from_affine(Affine::rotate(0.3)).unwrap();
    assert_eq!(rot.kind(), TransformKind::Affine);
    let mut proj = Transform::IDENTITY;
    proj.matrix[2][0] = Fixed(10);
    assert_eq!(proj.kind(), TransformKind::Projective);
    assert!(proj.to_affine().is_none());
}

#[test]
fn integer_translation_detection() {
    assert!(Transform::translate(Fixed::from_int(-2), Fixed::from_int(5)).is_integer_translation());
    assert!(!Transform::translate(Fixed::HALF, Fixed::ZERO).is_integer_translation());
    assert!(!Transform::scale(Fixed::from_int(2), Fixed::ONE).is_integer_translation());
}

#[test]
fn scale_maps_pixel_centres() {
    let t = Transform::scale(Fixed::HALF, Fixed::from_int(2));
    let (x, y) = t
        .transform_point(Fixed::from_int(3) + Fixed::HALF, Fixed::HALF)
        .unwrap();
    assert_eq!(x, (Fixed::from_int(1) + Fixed(0xc000)).to_48_16());
    assert_eq!(y, Fixed::ONE.to_48_16());
}

#[test]
fn affine_bridge_round_trips_representable_values() {
    let a = Affine::new([2.0, 0.0, 0.5, 1.0, -3.25, 8.0]);
    let t = Transform::from_affine(a).unwrap();
    assert_eq!(t.to_affine().unwrap(), a);
}

#[test]
fn rejects_out_of_range_coefficients() {
    assert!(Transform::from_affine(Affine::scale(40000.0)).is_err());
    assert!(Transform::from_affine(Affine::scale(f64::NAN)).is_err());
    assert!(Transform::from_placement(Affine::scale(0.0)).is_err());
}

#[test]
fn placement_is_inverted() {
    let t = Transform::from_placement(Affine::scale(2.0)).unwrap();
    assert_eq!(t, Transform::scale(Fixed::HALF, Fixed::HALF));
}
