use crate::foundation::error::{PixmixError, PixmixResult};
use crate::foundation::fixed::Fixed;
use crate::image::filter::{Filter, FilterKind};
use crate::image::format::PixelFormat;
use crate::image::transform::Transform;
use crate::sample::repeat::Repeat;

/// Largest accepted width or height, so every pixel coordinate fits in 16.16.
pub const MAX_DIMENSION: u32 = 0x7fff;

/// Backing words of a bits image. Rows are `stride` bytes apart.
#[derive(Debug)]
pub enum PixelStorage<'a> {
    /// Allocated and owned by the image.
    Owned(Vec<u32>),
    /// Caller-owned, read-only: usable as a source or mask, never as a destination.
    Borrowed(&'a [u32]),
    /// Caller-owned and writable.
    BorrowedMut(&'a mut [u32]),
}

impl AsRef<[u32]> for PixelStorage<'_> {
    fn as_ref(&self) -> &[u32] {
        match self {
            Self::Owned(v) => v.as_slice(),
            Self::Borrowed(s) => *s,
            Self::BorrowedMut(s) => &**s,
        }
    }
}

impl PixelStorage<'_> {
    fn as_mut_slice(&mut self) -> Option<&mut [u32]> {
        match self {
            Self::Owned(v) => Some(v.as_mut_slice()),
            Self::Borrowed(_) => None,
            Self::BorrowedMut(s) => Some(&mut **s),
        }
    }
}

/// A pixel rectangle over some word storage.
///
/// `stride` is in 32-bit words. Pixels narrower than a word are packed in memory order,
/// so a 16-bit row reads like a `[u16]` and an 8-bit row like a `[u8]`.
#[derive(Debug)]
pub(crate) struct Raster<D> {
    pub format: PixelFormat,
    pub width: i32,
    pub height: i32,
    pub stride: usize,
    pub data: D,
}

pub(crate) type Bits<'a> = Raster<PixelStorage<'a>>;
pub(crate) type DestRaster<'a> = Raster<&'a mut [u32]>;

#[inline]
fn read_packed(row: &[u32], bpp: u32, x: usize) -> u32 {
    match bpp {
        32 => row[x],
        16 => {
            let b = row[x / 2].to_ne_bytes();
            let i = (x % 2) * 2;
            u32::from(u16::from_ne_bytes([b[i], b[i + 1]]))
        }
        _ => u32::from(row[x / 4].to_ne_bytes()[x % 4]),
    }
}

#[inline]
fn write_packed(row: &mut [u32], bpp: u32, x: usize, v: u32) {
    match bpp {
        32 => row[x] = v,
        16 => {
            let mut b = row[x / 2].to_ne_bytes();
            let i = (x % 2) * 2;
            b[i..i + 2].copy_from_slice(&(v as u16).to_ne_bytes());
            row[x / 2] = u32::from_ne_bytes(b);
        }
        _ => {
            let mut b = row[x / 4].to_ne_bytes();
            b[x % 4] = v as u8;
            row[x / 4] = u32::from_ne_bytes(b);
        }
    }
}

impl<D: AsRef<[u32]>> Raster<D> {
    /// The full stride of row `y`; callers guarantee `0 <= y < height`.
    #[inline]
    pub fn row(&self, y: i32) -> &[u32] {
        let start = y as usize * self.stride;
        &self.data.as_ref()[start..start + self.stride]
    }

    #[inline]
    pub fn fetch_raw(&self, x: i32, y: i32) -> u32 {
        read_packed(self.row(y), self.format.bpp(), x as usize)
    }

    #[inline]
    pub fn fetch_argb(&self, x: i32, y: i32) -> u32 {
        self.format.to_argb(self.fetch_raw(x, y))
    }

    /// Fetch `out.len()` in-range pixels of row `y` starting at `x`, as ARGB.
    pub fn fetch_argb_run(&self, x: i32, y: i32, out: &mut [u32]) {
        let row = self.row(y);
        let bpp = self.format.bpp();
        let x = x as usize;
        if self.format == PixelFormat::A8R8G8B8 {
            out.copy_from_slice(&row[x..x + out.len()]);
            return;
        }
        for (i, px) in out.iter_mut().enumerate() {
            *px = self.format.to_argb(read_packed(row, bpp, x + i));
        }
    }

    /// Whether `[x, x + w) x [y, y + h)` lies inside the image.
    pub fn contains(&self, x: i64, y: i64, w: i64, h: i64) -> bool {
        x >= 0 && y >= 0 && x + w <= i64::from(self.width) && y + h <= i64::from(self.height)
    }
}

impl<D: AsRef<[u32]> + AsMut<[u32]>> Raster<D> {
    #[inline]
    pub fn row_mut(&mut self, y: i32) -> &mut [u32] {
        let start = y as usize * self.stride;
        &mut self.data.as_mut()[start..start + self.stride]
    }

    #[inline]
    pub fn store_raw(&mut self, x: i32, y: i32, v: u32) {
        let bpp = self.format.bpp();
        write_packed(self.row_mut(y), bpp, x as usize, v);
    }

    /// Store ARGB pixels into row `y` starting at `x`.
    pub fn store_argb_run(&mut self, x: i32, y: i32, src: &[u32]) {
        let format = self.format;
        let bpp = format.bpp();
        let x = x as usize;
        let row = self.row_mut(y);
        if format == PixelFormat::A8R8G8B8 {
            row[x..x + src.len()].copy_from_slice(src);
            return;
        }
        for (i, &px) in src.iter().enumerate() {
            write_packed(row, bpp, x + i, format.from_argb(px));
        }
    }
}

#[derive(Debug)]
pub(crate) enum ImageKind<'a> {
    /// Premultiplied ARGB, conceptually infinite.
    Solid(u32),
    Bits(Bits<'a>),
}

/// A compositing operand: a solid colour or a rectangle of pixels, plus how it is sampled.
///
/// Dropping the image releases owned storage; borrowed storage stays with the caller.
#[derive(Debug)]
pub struct Image<'a> {
    kind: ImageKind<'a>,
    transform: Option<Transform>,
    filter: Filter,
    repeat: Repeat,
}

impl<'a> Image<'a> {
    /// Create a bits image.
    ///
    /// `stride` is in bytes; `0` picks the tightest multiple of 4. Without `storage` the
    /// pixels are allocated zeroed. Borrowed storage must hold at least
    /// `stride / 4 * height` words.
    pub fn new(
        format: PixelFormat,
        width: u32,
        height: u32,
        storage: Option<PixelStorage<'a>>,
        stride: usize,
    ) -> PixmixResult<Self> {
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(PixmixError::validation(format!(
                "image {width}x{height} exceeds the {MAX_DIMENSION} pixel limit"
            )));
        }
        let min_stride = (width as usize * format.bpp() as usize).div_ceil(32) * 4;
        let stride = if stride == 0 { min_stride } else { stride };
        if stride % 4 != 0 || stride < min_stride {
            return Err(PixmixError::validation(format!(
                "stride {stride} must be a multiple of 4 and at least {min_stride}"
            )));
        }
        let stride_words = stride / 4;
        let needed = stride_words.checked_mul(height as usize).ok_or_else(|| {
            PixmixError::validation(format!(
                "stride {stride} x height {height} overflows the address space"
            ))
        })?;

        let storage = match storage {
            Some(storage) => {
                let len = storage.as_ref().len();
                if len < needed {
                    return Err(PixmixError::validation(format!(
                        "storage holds {len} words, {needed} needed"
                    )));
                }
                storage
            }
            None => {
                let mut words = Vec::new();
                words.try_reserve_exact(needed)?;
                words.resize(needed, 0);
                PixelStorage::Owned(words)
            }
        };

        Ok(Self::from_kind(ImageKind::Bits(Raster {
            format,
            width: width as i32,
            height: height as i32,
            stride: stride_words,
            data: storage,
        })))
    }

    /// An infinite image of one premultiplied ARGB colour.
    pub fn solid(argb: u32) -> Image<'static> {
        Image::from_kind(ImageKind::Solid(argb))
    }

    fn from_kind(kind: ImageKind<'a>) -> Self {
        Self {
            kind,
            transform: None,
            filter: Filter::default(),
            repeat: Repeat::None,
        }
    }

    pub(crate) fn kind(&self) -> &ImageKind<'a> {
        &self.kind
    }

    pub(crate) fn bits(&self) -> Option<&Bits<'a>> {
        match &self.kind {
            ImageKind::Bits(b) => Some(b),
            ImageKind::Solid(_) => None,
        }
    }

    /// Writable view for use as a composite destination.
    pub(crate) fn dest_raster(&mut self) -> PixmixResult<DestRaster<'_>> {
        let bits = match &mut self.kind {
            ImageKind::Bits(b) => b,
            ImageKind::Solid(_) => {
                return Err(PixmixError::validation("a solid image cannot be a destination"));
            }
        };
        let data = bits
            .data
            .as_mut_slice()
            .ok_or_else(|| PixmixError::validation("destination storage is read-only"))?;
        Ok(Raster {
            format: bits.format,
            width: bits.width,
            height: bits.height,
            stride: bits.stride,
            data,
        })
    }

    /// Whether this is a solid colour rather than a pixel rectangle.
    pub fn is_solid(&self) -> bool {
        matches!(self.kind, ImageKind::Solid(_))
    }

    /// The colour of a solid image, or of a 1x1 untransformed bits image that tiles.
    pub fn solid_color(&self) -> Option<u32> {
        match &self.kind {
            ImageKind::Solid(c) => Some(*c),
            ImageKind::Bits(b)
                if b.width == 1
                    && b.height == 1
                    && self.repeat == Repeat::Normal
                    && self.transform.is_none() =>
            {
                Some(b.fetch_argb(0, 0))
            }
            ImageKind::Bits(_) => None,
        }
    }

    /// Whether the image can be a composite destination.
    pub fn is_writable(&self) -> bool {
        matches!(
            &self.kind,
            ImageKind::Bits(Raster {
                data: PixelStorage::Owned(_) | PixelStorage::BorrowedMut(_),
                ..
            })
        )
    }

    /// `None` for solid images.
    pub fn format(&self) -> Option<PixelFormat> {
        self.bits().map(|b| b.format)
    }

    /// Zero for solid images.
    pub fn width(&self) -> u32 {
        self.bits().map_or(0, |b| b.width as u32)
    }

    /// Zero for solid images.
    pub fn height(&self) -> u32 {
        self.bits().map_or(0, |b| b.height as u32)
    }

    /// Row pitch in bytes.
    pub fn stride(&self) -> usize {
        self.bits().map_or(0, |b| b.stride * 4)
    }

    /// All backing words, padding included. `None` for solid images.
    pub fn data(&self) -> Option<&[u32]> {
        self.bits().map(|b| b.data.as_ref())
    }

    /// Writable backing words; fails for solid images and read-only storage.
    pub fn data_mut(&mut self) -> PixmixResult<&mut [u32]> {
        match &mut self.kind {
            ImageKind::Bits(b) => b
                .data
                .as_mut_slice()
                .ok_or_else(|| PixmixError::validation("image storage is read-only")),
            ImageKind::Solid(_) => Err(PixmixError::validation("solid images have no storage")),
        }
    }

    /// Give the storage back, e.g. to recover a borrowed buffer's lifetime.
    pub fn into_storage(self) -> Option<PixelStorage<'a>> {
        match self.kind {
            ImageKind::Bits(b) => Some(b.data),
            ImageKind::Solid(_) => None,
        }
    }

    fn checked_xy(&self, x: u32, y: u32) -> Option<(&Bits<'a>, i32, i32)> {
        let b = self.bits()?;
        let (x, y) = (i32::try_from(x).ok()?, i32::try_from(y).ok()?);
        (x < b.width && y < b.height).then_some((b, x, y))
    }

    /// Raw stored value of a pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        self.checked_xy(x, y).map(|(b, x, y)| b.fetch_raw(x, y))
    }

    /// A pixel as premultiplied ARGB; solid images answer everywhere.
    pub fn pixel_argb(&self, x: u32, y: u32) -> Option<u32> {
        if let ImageKind::Solid(c) = self.kind {
            return Some(c);
        }
        self.checked_xy(x, y).map(|(b, x, y)| b.fetch_argb(x, y))
    }

    /// Store a raw value in this image's format.
    pub fn set_pixel(&mut self, x: u32, y: u32, raw: u32) -> PixmixResult<()> {
        let (w, h) = (self.width(), self.height());
        if x >= w || y >= h {
            return Err(PixmixError::validation(format!(
                "pixel ({x}, {y}) outside {w}x{h} image"
            )));
        }
        self.dest_raster()?.store_raw(x as i32, y as i32, raw);
        Ok(())
    }

    /// Store a premultiplied ARGB colour, converted to this image's format.
    pub fn set_pixel_argb(&mut self, x: u32, y: u32, argb: u32) -> PixmixResult<()> {
        let format = self
            .format()
            .ok_or_else(|| PixmixError::validation("solid images have no pixels"))?;
        self.set_pixel(x, y, format.from_argb(argb))
    }

    /// Fill every pixel with one ARGB colour.
    pub fn fill_argb(&mut self, argb: u32) -> PixmixResult<()> {
        let mut dest = self.dest_raster()?;
        let raw = dest.format.from_argb(argb);
        for y in 0..dest.height {
            for x in 0..dest.width {
                dest.store_raw(x, y, raw);
            }
        }
        Ok(())
    }

    /// `None` when untransformed.
    pub fn transform(&self) -> Option<&Transform> {
        self.transform.as_ref()
    }

    /// Set the destination-to-source transform. The identity is stored as no transform.
    pub fn set_transform(&mut self, transform: Option<Transform>) {
        self.transform = transform.filter(|t| !t.is_identity());
    }

    /// Current sampling filter.
    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// Replace the filter; the old one stays when `params` do not fit `kind`.
    pub fn set_filter(&mut self, kind: FilterKind, params: &[Fixed]) -> PixmixResult<()> {
        self.filter = Filter::new(kind, params)?;
        Ok(())
    }

    /// How samples outside the image resolve.
    pub fn repeat(&self) -> Repeat {
        self.repeat
    }

    /// Set the repeat mode.
    pub fn set_repeat(&mut self, repeat: Repeat) {
        self.repeat = repeat;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/image/model.rs"]
mod tests;
