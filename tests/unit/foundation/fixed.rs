use super::*;

#[test]
fn constants_have_expected_bits() {
    assert_eq!(Fixed::ONE.0, 0x10000);
    assert_eq!(Fixed::HALF.0, 0x8000);
    assert_eq!(Fixed::EPSILON.0, 1);
}

#[test]
fn to_int_floors_negative_values() {
    assert_eq!(Fixed(-1).to_int(), -1);
    assert_eq!(Fixed::from_int(-3).to_int(), -3);
    assert_eq!((Fixed::from_int(2) + Fixed::HALF).to_int(), 2);
    assert_eq!((Fixed::from_int(-2) + Fixed::HALF).to_int(), -2);
}

#[test]
fn ceil_and_floor_bracket_fraction() {
    let v = Fixed::from_int(5) + Fixed(1);
    assert_eq!(v.floor(), Fixed::from_int(5));
    assert_eq!(v.ceil(), Fixed::from_int(6));
    assert_eq!(Fixed::from_int(5).ceil(), Fixed::from_int(5));
}

#[test]
fn double_conversion_truncates() {
    assert_eq!(double_to_fixed(1.5), Fixed(0x18000));
    assert_eq!(double_to_fixed(-0.25), Fixed(-0x4000));
    assert_eq!(double_to_fixed(f64::NAN), Fixed::ZERO);
    assert_eq!(fixed_to_double(Fixed::HALF), 0.5);
    // 1/3 is not representable; the stored value is below it.
    assert!(fixed_to_double(double_to_fixed(1.0 / 3.0)) <= 1.0 / 3.0);
}

#[test]
fn mul_uses_wide_product() {
    let a = Fixed::from_int(300);
    let b = Fixed::from_int(100);
    assert_eq!(a.mul(b), Fixed::from_int(30000));
    assert_eq!(Fixed::HALF.mul(Fixed::HALF), Fixed(0x4000));
}

#[test]
fn narrowing_from_48_16_checks_range() {
    assert_eq!(Fixed::from_48_16(0x7fff_0000), Some(Fixed(0x7fff_0000)));
    assert_eq!(Fixed::from_48_16(0x1_0000_0000), None);
}
