use std::collections::HashMap;

use crate::{Error, aabb::AABB, vec::Point3};

/// Indexed triangle mesh. Normals are derived from the winding when needed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Point3>,
    pub faces: Vec<[u32; 3]>,
}

impl Mesh {
    #[must_use]
    pub const fn new(vertices: Vec<Point3>, faces: Vec<[u32; 3]>) -> Self {
        Self { vertices, faces }
    }

    /// Check that every face references an existing vertex.
    pub fn validate(&self) -> crate::Result<()> {
        validate_faces(&self.vertices, &self.faces)
    }

    #[must_use]
    pub fn bounds(&self) -> AABB {
        let mut aabb = AABB::default();
        for v in &self.vertices {
            aabb.extend(*v);
        }
        aabb
    }

    /// `V - E + F`, counting each undirected edge once
    #[must_use]
    pub fn euler_characteristic(&self) -> i64 {
        let edges = self.edge_uses().len();
        self.vertices.len() as i64 - edges as i64 + self.faces.len() as i64
    }

    /// Closed two-manifold check: every edge is shared by exactly two faces
    /// that traverse it in opposite directions.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        !self.faces.is_empty()
            && self
                .edge_uses()
                .values()
                .all(|&(forward, backward)| forward == 1 && backward == 1)
    }

    // Undirected edge -> (uses as low->high, uses as high->low)
    fn edge_uses(&self) -> HashMap<(u32, u32), (u32, u32)> {
        let mut edges: HashMap<(u32, u32), (u32, u32)> = HashMap::new();
        for f in &self.faces {
            for e in 0..3 {
                let (a, b) = (f[e], f[(e + 1) % 3]);
                let uses = edges.entry((a.min(b), a.max(b))).or_default();
                if a < b {
                    uses.0 += 1;
                } else {
                    uses.1 += 1;
                }
            }
        }
        edges
    }
}

pub(crate) fn validate_faces(vertices: &[Point3], faces: &[[u32; 3]]) -> crate::Result<()> {
    for (id, f) in faces.iter().enumerate() {
        if let Some(&index) = f.iter().find(|&&index| index as usize >= vertices.len()) {
            return Err(Error::FaceIndexOutOfRange(id, index, vertices.len()));
        }
    }
    Ok(())
}
