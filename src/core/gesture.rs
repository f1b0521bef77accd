/// Drag offset relative to the pointer-down origin
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DragVector {
    pub dx: f64,
    pub dy: f64,
}

impl DragVector {
    pub const ZERO: DragVector = DragVector { dx: 0.0, dy: 0.0 };

    pub fn new(dx: f64, dy: f64) -> Self {
        Self { dx, dy }
    }
}

/// Converts raw pointer/touch coordinates into a drag vector
///
/// Purely geometric: it never classifies the vector, that is left to the card.
#[derive(Debug, Clone, Default)]
pub struct GestureTracker {
    origin: Option<(f64, f64)>,
    last: DragVector,
}

impl GestureTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dragging(&self) -> bool {
        self.origin.is_some()
    }

    /// Record the drag origin
    ///
    /// Returns `false` and keeps the existing origin when a drag is already in
    /// progress (duplicate pointer-down / touch-start).
    pub fn start(&mut self, x: f64, y: f64) -> bool {
        if self.origin.is_some() {
            tracing::trace!("Ignoring gesture start while already dragging");
            return false;
        }

        self.origin = Some((x, y));
        self.last = DragVector::ZERO;
        true
    }

    /// Current offset from the origin, or `None` when idle
    pub fn move_to(&mut self, x: f64, y: f64) -> Option<DragVector> {
        let (origin_x, origin_y) = self.origin?;
        self.last = DragVector::new(x - origin_x, y - origin_y);
        Some(self.last)
    }

    /// Final offset of the drag; the tracker returns to idle
    pub fn end(&mut self) -> Option<DragVector> {
        self.origin.take()?;
        let vector = self.last;
        self.last = DragVector::ZERO;
        Some(vector)
    }

    /// Drop an in-flight drag without producing a vector
    pub fn cancel(&mut self) {
        self.origin = None;
        self.last = DragVector::ZERO;
    }
}
