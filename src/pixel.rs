use bytemuck::{Pod, Zeroable};

use crate::consts::QOI_INDEX_SIZE;

/// A single RGBA pixel, 8 bits per channel.
///
/// The layout matches four consecutive bytes of an RGBA buffer, so byte
/// slices can be viewed as pixel slices with [`bytemuck::cast_slice`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
#[repr(C)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Pixel {
    /// Fully transparent black; every cache slot starts out as this.
    pub const ZERO: Self = Self::new(0, 0, 0, 0);

    /// Opaque black; the implicit pixel before the first one in the stream.
    pub const START: Self = Self::new(0, 0, 0, 0xff);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    #[inline]
    pub const fn from_array(arr: [u8; 4]) -> Self {
        Self::new(arr[0], arr[1], arr[2], arr[3])
    }

    #[inline]
    pub const fn with_rgb(mut self, [r, g, b]: [u8; 3]) -> Self {
        self.r = r;
        self.g = g;
        self.b = b;
        self
    }

    /// Cache slot for this pixel: `(3r + 5g + 7b + 11a) mod 64`.
    #[inline]
    pub const fn hash_index(self) -> u8 {
        let r = self.r.wrapping_mul(3);
        let g = self.g.wrapping_mul(5);
        let b = self.b.wrapping_mul(7);
        let a = self.a.wrapping_mul(11);
        r.wrapping_add(g).wrapping_add(b).wrapping_add(a) % (QOI_INDEX_SIZE as u8)
    }

    /// Adds signed per-channel deltas to r, g, b with wrap-around; alpha is kept.
    #[inline]
    pub const fn rgb_add(mut self, dr: i8, dg: i8, db: i8) -> Self {
        self.r = self.r.wrapping_add(dr as u8);
        self.g = self.g.wrapping_add(dg as u8);
        self.b = self.b.wrapping_add(db as u8);
        self
    }

    /// Signed differences `self - prev` for r, g, b.
    #[inline]
    pub const fn rgb_sub(self, prev: Self) -> (i16, i16, i16) {
        (
            self.r as i16 - prev.r as i16,
            self.g as i16 - prev.g as i16,
            self.b as i16 - prev.b as i16,
        )
    }
}

impl From<[u8; 4]> for Pixel {
    #[inline]
    fn from(arr: [u8; 4]) -> Self {
        Self::from_array(arr)
    }
}

impl From<Pixel> for [u8; 4] {
    #[inline(always)]
    fn from(px: Pixel) -> Self {
        [px.r, px.g, px.b, px.a]
    }
}

/// Direct-mapped cache of recently seen pixels, addressed by [`Pixel::hash_index`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ColorCache([Pixel; QOI_INDEX_SIZE]);

impl ColorCache {
    #[inline]
    pub const fn new() -> Self {
        Self([Pixel::ZERO; QOI_INDEX_SIZE])
    }

    #[inline]
    pub fn get(&self, slot: u8) -> Pixel {
        self.0[usize::from(slot) % QOI_INDEX_SIZE]
    }

    #[inline]
    pub fn insert(&mut self, px: Pixel) {
        self.0[usize::from(px.hash_index())] = px;
    }
}

impl Default for ColorCache {
    fn default() -> Self {
        Self::new()
    }
}

/// The state both encoder and decoder replay chunk by chunk.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RunningState {
    pub prev: Pixel,
    pub cache: ColorCache,
}

impl RunningState {
    #[inline]
    pub const fn new() -> Self {
        Self { prev: Pixel::START, cache: ColorCache::new() }
    }

    /// Records `px` as the most recent pixel.
    #[inline]
    pub fn push(&mut self, px: Pixel) {
        self.cache.insert(px);
        self.prev = px;
    }
}

impl Default for RunningState {
    fn default() -> Self {
        Self::new()
    }
}
