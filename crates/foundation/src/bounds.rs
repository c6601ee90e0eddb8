/// Axis-aligned bounding box in two dimensions.
///
/// An empty box has `min > max` on both axes and absorbs the first point
/// passed to [`Aabb2::extend`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    pub fn empty() -> Self {
        Aabb2 {
            min: [f64::INFINITY, f64::INFINITY],
            max: [f64::NEG_INFINITY, f64::NEG_INFINITY],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0] || self.min[1] > self.max[1]
    }

    pub fn extend(&mut self, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        self.min[0] = self.min[0].min(x);
        self.min[1] = self.min[1].min(y);
        self.max[0] = self.max[0].max(x);
        self.max[1] = self.max[1].max(y);
    }

    pub fn union(&self, other: &Aabb2) -> Aabb2 {
        if other.is_empty() {
            return *self;
        }
        let mut out = *self;
        out.extend(other.min[0], other.min[1]);
        out.extend(other.max[0], other.max[1]);
        out
    }

    pub fn width(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max[0] - self.min[0] }
    }

    pub fn height(&self) -> f64 {
        if self.is_empty() { 0.0 } else { self.max[1] - self.min[1] }
    }
}

impl Default for Aabb2 {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Aabb2;

    #[test]
    fn extend_grows_from_empty() {
        let mut b = Aabb2::empty();
        assert!(b.is_empty());
        b.extend(1.0, 2.0);
        b.extend(-1.0, 5.0);
        assert_eq!(b, Aabb2::new([-1.0, 2.0], [1.0, 5.0]));
        assert_eq!(b.width(), 2.0);
        assert_eq!(b.height(), 3.0);
    }

    #[test]
    fn non_finite_points_are_ignored() {
        let mut b = Aabb2::empty();
        b.extend(f64::NAN, 1.0);
        assert!(b.is_empty());
    }

    #[test]
    fn union_skips_empty_operand() {
        let a = Aabb2::new([0.0, 0.0], [1.0, 1.0]);
        assert_eq!(a.union(&Aabb2::empty()), a);
        let b = Aabb2::new([2.0, -1.0], [3.0, 0.5]);
        assert_eq!(a.union(&b), Aabb2::new([0.0, -1.0], [3.0, 1.0]));
    }
}
