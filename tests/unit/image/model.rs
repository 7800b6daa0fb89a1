use super::*;

#[test]
fn default_stride_is_word_aligned() {
    let img = Image::new(PixelFormat::A8R8G8B8, 3, 2, None, 0).unwrap();
    assert_eq!(img.stride(), 12);
    let img = Image::new(PixelFormat::R5G6B5, 3, 2, None, 0).unwrap();
    assert_eq!(img.stride(), 8);
    let img = Image::new(PixelFormat::A8, 5, 2, None, 0).unwrap();
    assert_eq!(img.stride(), 8);
    assert_eq!(img.data().unwrap().len(), 4);
}

#[test]
fn invalid_geometry_is_rejected() {
    assert!(matches!(
        Image::new(PixelFormat::A8R8G8B8, 4, 4, None, 10),
        Err(PixmixError::Validation(_))
    ));
    assert!(Image::new(PixelFormat::A8R8G8B8, 4, 4, None, 8).is_err());
    assert!(Image::new(PixelFormat::A8R8G8B8, MAX_DIMENSION + 1, 1, None, 0).is_err());
    let words = [0u32; 7];
    assert!(
        Image::new(
            PixelFormat::A8R8G8B8,
            4,
            2,
            Some(PixelStorage::Borrowed(&words)),
            0
        )
        .is_err()
    );
}

#[test]
fn packed_pixels_do_not_clobber_neighbours() {
    let mut img = Image::new(PixelFormat::A8, 6, 1, None, 0).unwrap();
    img.set_pixel(1, 0, 0x11).unwrap();
    img.set_pixel(2, 0, 0x22).unwrap();
    img.set_pixel(5, 0, 0x55).unwrap();
    assert_eq!(img.pixel(0, 0), Some(0));
    assert_eq!(img.pixel(1, 0), Some(0x11));
    assert_eq!(img.pixel(2, 0), Some(0x22));
    assert_eq!(img.pixel(5, 0), Some(0x55));
    assert_eq!(img.pixel_argb(2, 0), Some(0x2200_0000));

    let mut img = Image::new(PixelFormat::R5G6B5, 3, 1, None, 0).unwrap();
    img.set_pixel(1, 0, 0xf800).unwrap();
    assert_eq!(img.pixel(0, 0), Some(0));
    assert_eq!(img.pixel(1, 0), Some(0xf800));
    assert_eq!(img.pixel(2, 0), Some(0));
    assert_eq!(img.pixel_argb(1, 0), Some(0xffff_0000));
}

#[test]
fn borrowed_storage_stays_with_caller() {
    let mut words = vec![0u32; 4];
    {
        let mut img = Image::new(
            PixelFormat::A8R8G8B8,
            2,
            2,
            Some(PixelStorage::BorrowedMut(&mut words)),
            0,
        )
        .unwrap();
        img.fill_argb(0xff00_ff00).unwrap();
    }
    assert!(words.iter().all(|&w| w == 0xff00_ff00));

    let img = Image::new(
        PixelFormat::A8R8G8B8,
        2,
        2,
        Some(PixelStorage::Borrowed(&words)),
        0,
    )
    .unwrap();
    assert!(!img.is_writable());
    let mut img = img;
    assert!(img.set_pixel(0, 0, 1).is_err());
    assert!(img.data_mut().is_err());
}

#[test]
fn one_by_one_tiles_count_as_solid() {
    let mut img = Image::new(PixelFormat::X8R8G8B8, 1, 1, None, 0).unwrap();
    img.set_pixel(0, 0, 0x0012_3456).unwrap();
    assert_eq!(img.solid_color(), None);
    img.set_repeat(Repeat::Normal);
    assert_eq!(img.solid_color(), Some(0xff12_3456));
    assert_eq!(Image::solid(0x8000_0000).solid_color(), Some(0x8000_0000));
}

#[test]
fn identity_transform_is_normalized_away() {
    let mut img = Image::new(PixelFormat::A8R8G8B8, 1, 1, None, 0).unwrap();
    img.set_transform(Some(Transform::IDENTITY));
    assert!(img.transform().is_none());
    img.set_transform(Some(Transform::scale(Fixed::HALF, Fixed::HALF)));
    assert!(img.transform().is_some());
}

#[test]
fn solid_images_cannot_be_written() {
    let mut img = Image::solid(0xffff_ffff);
    assert!(img.fill_argb(0).is_err());
    assert!(img.dest_raster().is_err());
    assert_eq!(img.pixel_argb(1000, 1000), Some(0xffff_ffff));
    assert_eq!(img.format(), None);
}

#[test]
fn oversized_strides_are_errors_not_panics() {
    let stride = usize::MAX & !3;
    assert!(matches!(
        Image::new(PixelFormat::A8R8G8B8, 1, 8, None, stride),
        Err(PixmixError::Validation(_))
    ));
    let words = [0u32; 4];
    assert!(matches!(
        Image::new(
            PixelFormat::A8R8G8B8,
            1,
            8,
            Some(PixelStorage::Borrowed(&words)),
            stride
        ),
        Err(PixmixError::Validation(_))
    ));
    // A single huge row does not overflow the word count, but it cannot be allocated.
    assert!(matches!(
        Image::new(PixelFormat::A8R8G8B8, 1, 1, None, stride),
        Err(PixmixError::Allocation(_))
    ));
}
