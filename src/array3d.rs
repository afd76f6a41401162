use crate::vec::Vec3i;

/// Dense cubic array stored flat, `k` varying fastest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Array3d<T> {
    data: Vec<T>,
    side: usize,
}

impl<T: Clone> Array3d<T> {
    pub fn with_side(side: usize, value: T) -> Self {
        Self {
            data: vec![value; side * side * side],
            side,
        }
    }

    #[must_use]
    pub const fn get_index_1d(&self, i: usize, j: usize, k: usize) -> usize {
        (i * self.side + j) * self.side + k
    }

    #[must_use]
    pub const fn side(&self) -> usize {
        self.side
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn at(&self, i: usize, j: usize, k: usize) -> &T {
        &self.data[self.get_index_1d(i, j, k)]
    }

    pub fn at_mut(&mut self, i: usize, j: usize, k: usize) -> &mut T {
        let index = self.get_index_1d(i, j, k);
        &mut self.data[index]
    }

    /// Bounds-checked access with signed coordinates, `None` outside the cube
    #[must_use]
    pub fn get(&self, p: Vec3i) -> Option<&T> {
        let side = self.side as i64;
        if (0..side).contains(&p.x) && (0..side).contains(&p.y) && (0..side).contains(&p.z) {
            Some(self.at(p.x as usize, p.y as usize, p.z as usize))
        } else {
            None
        }
    }

    /// Write `value` over the sub-cube `[lo, hi)` on every axis.
    ///
    /// Rows along `k` are contiguous, so each one is a single slice fill.
    pub fn fill_block(&mut self, lo: [usize; 3], hi: [usize; 3], value: &T) {
        for i in lo[0]..hi[0] {
            for j in lo[1]..hi[1] {
                let start = self.get_index_1d(i, j, lo[2]);
                let end = start + (hi[2] - lo[2]);
                self.data[start..end].fill(value.clone());
            }
        }
    }

    #[must_use]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Apply `f` to every cell, keeping the layout
    pub fn map<U: Clone>(&self, f: impl Fn(&T) -> U) -> Array3d<U> {
        Array3d {
            data: self.data.iter().map(f).collect(),
            side: self.side,
        }
    }
}
