//! Layer-mask volume model: per-layer occupancy bitmaps plus stack validation.
#![forbid(unsafe_code)]

use thiserror::Error;

// Bitset configuration (u64-based)
pub(crate) const BITS_PER_WORD: usize = 64;
pub(crate) const WORD_INDEX_SHIFT: usize = 6; // log2(64)
pub(crate) const WORD_INDEX_MASK: usize = 63; // (1<<6) - 1

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StackError {
    #[error("layer {layer} is {got_w}x{got_h}, expected {want_w}x{want_h}")]
    MismatchedDimensions {
        layer: usize,
        want_w: usize,
        want_h: usize,
        got_w: usize,
        got_h: usize,
    },
    #[error("pixel buffer holds {got} entries, expected {want}")]
    PixelCountMismatch { want: usize, got: usize },
    #[error("pixel pitch must be positive, got {x_mm}x{y_mm} mm")]
    NonPositivePitch { x_mm: f32, y_mm: f32 },
    #[error("layer {layer} has non-positive thickness {thickness_mm} mm")]
    NonPositiveThickness { layer: usize, thickness_mm: f32 },
}

/// Dense 2D occupancy bitset, row-major, one bit per pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct BitGrid {
    width: usize,
    height: usize,
    words: Vec<u64>,
}

impl BitGrid {
    pub fn new(width: usize, height: usize) -> Self {
        let nbits = width * height;
        Self {
            width,
            height,
            words: vec![0; (nbits + WORD_INDEX_MASK) / BITS_PER_WORD],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn idx(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> bool {
        let i = self.idx(x, y);
        (self.words[i >> WORD_INDEX_SHIFT] >> (i & WORD_INDEX_MASK)) & 1 != 0
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, v: bool) {
        let i = self.idx(x, y);
        let w = i >> WORD_INDEX_SHIFT;
        let b = i & WORD_INDEX_MASK;
        if v {
            self.words[w] |= 1u64 << b;
        } else {
            self.words[w] &= !(1u64 << b);
        }
    }

    #[inline]
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Word-parallel set difference: bits set in `self` but not in `other`.
    /// Grids must share dimensions.
    pub fn difference(&self, other: &BitGrid) -> BitGrid {
        debug_assert!(self.width == other.width && self.height == other.height);
        BitGrid {
            width: self.width,
            height: self.height,
            words: self
                .words
                .iter()
                .zip(&other.words)
                .map(|(a, b)| a & !b)
                .collect(),
        }
    }

    /// Word-parallel in-place union. Grids must share dimensions.
    pub fn union_with(&mut self, other: &BitGrid) {
        debug_assert!(self.width == other.width && self.height == other.height);
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a |= b;
        }
    }

    /// True if every set bit of `self` is also set in `other`.
    pub fn is_subset_of(&self, other: &BitGrid) -> bool {
        debug_assert!(self.width == other.width && self.height == other.height);
        self.words.iter().zip(&other.words).all(|(a, b)| a & !b == 0)
    }

    /// Calls `f(x, y)` for every set bit in row-major order.
    pub fn for_each_set(&self, mut f: impl FnMut(usize, usize)) {
        for (wi, &word) in self.words.iter().enumerate() {
            let mut w = word;
            while w != 0 {
                let b = w.trailing_zeros() as usize;
                let i = wi * BITS_PER_WORD + b;
                f(i % self.width, i / self.width);
                w &= w - 1;
            }
        }
    }
}

/// XY millimetres per pixel; the two axes may differ.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PixelPitch {
    pub x_mm: f32,
    pub y_mm: f32,
}

impl PixelPitch {
    #[inline]
    pub const fn new(x_mm: f32, y_mm: f32) -> Self {
        Self { x_mm, y_mm }
    }

    #[inline]
    pub const fn square(mm: f32) -> Self {
        Self { x_mm: mm, y_mm: mm }
    }
}

/// One rasterized cross-section: an occupancy grid plus its physical thickness.
/// Immutable once constructed.
#[derive(Clone, Debug)]
pub struct LayerMask {
    grid: BitGrid,
    thickness_mm: f32,
}

impl LayerMask {
    /// Builds a mask from a row-major `bool` slice; the slice length must be
    /// exactly `width * height`.
    pub fn from_pixels(
        width: usize,
        height: usize,
        pixels: &[bool],
        thickness_mm: f32,
    ) -> Result<Self, StackError> {
        if pixels.len() != width * height {
            return Err(StackError::PixelCountMismatch {
                want: width * height,
                got: pixels.len(),
            });
        }
        let mut grid = BitGrid::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if pixels[y * width + x] {
                    grid.set(x, y, true);
                }
            }
        }
        Ok(Self { grid, thickness_mm })
    }

    /// Builds a mask by sampling `solid(x, y)` over the grid.
    pub fn from_fn(
        width: usize,
        height: usize,
        thickness_mm: f32,
        mut solid: impl FnMut(usize, usize) -> bool,
    ) -> Self {
        let mut grid = BitGrid::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if solid(x, y) {
                    grid.set(x, y, true);
                }
            }
        }
        Self { grid, thickness_mm }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.grid.height()
    }

    #[inline]
    pub fn thickness_mm(&self) -> f32 {
        self.thickness_mm
    }

    #[inline]
    pub fn solid(&self, x: usize, y: usize) -> bool {
        self.grid.get(x, y)
    }

    #[inline]
    pub fn grid(&self) -> &BitGrid {
        &self.grid
    }

    #[inline]
    pub fn solid_count(&self) -> usize {
        self.grid.count_ones()
    }

    #[inline]
    pub fn has_solid(&self) -> bool {
        !self.grid.is_empty()
    }
}

/// An ordered stack of layer masks sharing one pixel resolution and pitch.
#[derive(Clone, Debug)]
pub struct LayerStack {
    layers: Vec<LayerMask>,
    pitch: PixelPitch,
}

impl LayerStack {
    /// Validates the whole stack up front: all layers must agree on
    /// dimensions, pitch and thicknesses must be strictly positive. Nothing
    /// downstream re-checks these.
    pub fn try_new(layers: Vec<LayerMask>, pitch: PixelPitch) -> Result<Self, StackError> {
        if !(pitch.x_mm > 0.0 && pitch.y_mm > 0.0) {
            return Err(StackError::NonPositivePitch {
                x_mm: pitch.x_mm,
                y_mm: pitch.y_mm,
            });
        }
        if let Some(first) = layers.first() {
            let (want_w, want_h) = (first.width(), first.height());
            for (i, layer) in layers.iter().enumerate() {
                if layer.width() != want_w || layer.height() != want_h {
                    return Err(StackError::MismatchedDimensions {
                        layer: i,
                        want_w,
                        want_h,
                        got_w: layer.width(),
                        got_h: layer.height(),
                    });
                }
                if !(layer.thickness_mm() > 0.0) {
                    return Err(StackError::NonPositiveThickness {
                        layer: i,
                        thickness_mm: layer.thickness_mm(),
                    });
                }
            }
        }
        log::debug!(
            "layer stack validated: {} layers at {:?}",
            layers.len(),
            layers.first().map(|l| (l.width(), l.height()))
        );
        Ok(Self { layers, pitch })
    }

    #[inline]
    pub fn layer(&self, i: usize) -> Option<&LayerMask> {
        self.layers.get(i)
    }

    #[inline]
    pub fn layers(&self) -> &[LayerMask] {
        &self.layers
    }

    #[inline]
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn pitch(&self) -> PixelPitch {
        self.pitch
    }

    /// `(width, height)` of every layer, or `(0, 0)` for an empty stack.
    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        self.layers
            .first()
            .map_or((0, 0), |l| (l.width(), l.height()))
    }

    /// Physical Z of the bottom of each layer (prefix sums of thickness).
    pub fn z_origins(&self) -> Vec<f32> {
        let mut z = 0.0f32;
        self.layers
            .iter()
            .map(|l| {
                let z0 = z;
                z += l.thickness_mm();
                z0
            })
            .collect()
    }

    #[inline]
    pub fn total_height(&self) -> f32 {
        self.layers.iter().map(|l| l.thickness_mm()).sum()
    }
}
