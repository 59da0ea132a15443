//! Basic geometric types for element placement

/// A point in 2D space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl Point {
    /// Create a new point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Origin point (0, 0)
    pub fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }
}

/// Affine transform `[a b c d e f]` as used by `cm` and `Tm`.
///
/// Only `a`, `d` (scale) and `e`, `f` (translation) take part in element
/// geometry; `b` and `c` are carried through unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix(pub [f64; 6]);

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    pub fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self([a, b, c, d, e, f])
    }

    pub fn identity() -> Self {
        Self([1.0, 0.0, 0.0, 1.0, 0.0, 0.0])
    }

    /// `[sx 0 0 sy tx ty]`
    pub fn scale_translate(sx: f64, sy: f64, tx: f64, ty: f64) -> Self {
        Self([sx, 0.0, 0.0, sy, tx, ty])
    }

    /// Builds a matrix from exactly six numbers.
    pub fn from_slice(values: &[f64]) -> Option<Self> {
        let values: [f64; 6] = values.try_into().ok()?;
        Some(Self(values))
    }

    pub fn values(&self) -> [f64; 6] {
        self.0
    }

    pub fn a(&self) -> f64 {
        self.0[0]
    }

    pub fn d(&self) -> f64 {
        self.0[3]
    }

    pub fn e(&self) -> f64 {
        self.0[4]
    }

    pub fn f(&self) -> f64 {
        self.0[5]
    }

    pub fn set_a(&mut self, a: f64) {
        self.0[0] = a;
    }

    pub fn set_d(&mut self, d: f64) {
        self.0[3] = d;
    }

    pub fn set_translation(&mut self, e: f64, f: f64) {
        self.0[4] = e;
        self.0[5] = f;
    }

    pub fn translation(&self) -> Point {
        Point::new(self.e(), self.f())
    }
}
