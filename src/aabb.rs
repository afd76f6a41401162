use crate::vec::{Point3, Vec3};

#[derive(Clone, Debug)]
pub struct AABB {
    pub min: Point3,
    pub max: Point3,
}

impl Default for AABB {
    fn default() -> Self {
        let min = Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY);
        let max = Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        Self { min, max }
    }
}

impl AABB {
    #[must_use]
    pub const fn from_points(p1: Point3, p2: Point3) -> Self {
        let min = Point3::new(p1.x.min(p2.x), p1.y.min(p2.y), p1.z.min(p2.z));
        let max = Point3::new(p1.x.max(p2.x), p1.y.max(p2.y), p1.z.max(p2.z));
        Self { min, max }
    }

    pub const fn extend(&mut self, v: Point3) {
        self.min.x = self.min.x.min(v.x);
        self.min.y = self.min.y.min(v.y);
        self.min.z = self.min.z.min(v.z);

        self.max.x = self.max.x.max(v.x);
        self.max.y = self.max.y.max(v.y);
        self.max.z = self.max.z.max(v.z);
    }

    #[must_use]
    pub fn center(&self) -> Point3 {
        Point3::new(
            self.min.x + self.max.x,
            self.min.y + self.max.y,
            self.min.z + self.max.z,
        ) / 2.0
    }

    #[must_use]
    pub fn diagonal(&self) -> Vec3 {
        self.max - self.min
    }

    #[must_use]
    pub fn contains(&self, p: &Point3) -> bool {
        (0..3).all(|d| p[d] >= self.min[d] && p[d] <= self.max[d])
    }
}
