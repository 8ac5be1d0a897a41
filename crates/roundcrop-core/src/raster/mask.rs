//! Circular clip mask for the exported bitmap.
//!
//! The mask is a disc centred on the output square with radius `edge / 2`.
//! Coverage is evaluated at pixel centres with a one-pixel linear rim, which
//! gives a smooth edge without any sampling randomness.

/// Disc-shaped clip region in output pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleMask {
    pub center_x: f64,
    pub center_y: f64,
    pub radius: f64,
}

impl CircleMask {
    pub fn new(center_x: f64, center_y: f64, radius: f64) -> Self {
        Self {
            center_x,
            center_y,
            radius: radius.max(0.0),
        }
    }

    /// The inscribed disc of an `edge × edge` square.
    pub fn inscribed(edge: u32) -> Self {
        let half = edge as f64 / 2.0;
        Self::new(half, half, half)
    }

    /// Check if a point is inside the circle boundary (ignoring the rim).
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let dx = x - self.center_x;
        let dy = y - self.center_y;
        dx * dx + dy * dy <= self.radius * self.radius
    }

    /// Fraction of the pixel at `(px, py)` inside the circle, 0.0 to 1.0.
    ///
    /// Measured at the pixel centre; pixels whose centre lies within half a
    /// pixel of the boundary get partial coverage.
    #[inline]
    pub fn coverage(&self, px: u32, py: u32) -> f64 {
        let dx = px as f64 + 0.5 - self.center_x;
        let dy = py as f64 + 0.5 - self.center_y;
        let dist = (dx * dx + dy * dy).sqrt();
        (self.radius - dist + 0.5).clamp(0.0, 1.0)
    }
}
