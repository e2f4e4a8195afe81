/// Accepted range of signed hit depths along a ray, bounds included.
///
/// Intersection queries start from [`Interval::FORWARD`] and shrink the
/// upper bound with [`Interval::with_max`] each time a nearer hit turns up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f32,
    pub max: f32,
}

impl Interval {
    /// Everything in front of the ray origin, origin included.
    pub const FORWARD: Interval = Interval {
        min: 0.0,
        max: f32::INFINITY,
    };

    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, depth: f32) -> bool {
        self.min <= depth && depth <= self.max
    }

    /// Same lower bound, new upper bound.
    pub fn with_max(&self, max: f32) -> Interval {
        Interval::new(self.min, max)
    }
}
