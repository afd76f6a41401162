use std::collections::HashMap;

use log::info;

use crate::{mesh::Mesh, vec::Vec3i, voxelizer::VoxelMask};

/// Turns a solid/void voxel classification into a triangle mesh.
pub trait IsoSurfaceExtractor: Send + Sync {
    fn extract(&self, mask: &VoxelMask) -> Mesh;
}

/// Blocky surface made of the voxel faces separating solid from void.
///
/// Every exposed face gives two triangles wound counter-clockwise when seen
/// from the void side. Corners shared by several faces are emitted once, so
/// the mesh of a face-connected solid without cavities or tunnels is closed
/// with Euler characteristic 2.
#[derive(Clone, Copy, Debug, Default)]
pub struct VoxelFaceExtractor;

const AXES: [Vec3i; 3] = [
    Vec3i::new(1, 0, 0),
    Vec3i::new(0, 1, 0),
    Vec3i::new(0, 0, 1),
];

/// Lattice corners get a single index each.
struct Welder {
    indices: HashMap<[i64; 3], u32>,
    mesh: Mesh,
}

impl Welder {
    fn vertex(&mut self, mask: &VoxelMask, p: Vec3i) -> u32 {
        let next = self.mesh.vertices.len() as u32;
        let index = *self.indices.entry([p.x, p.y, p.z]).or_insert(next);
        if index == next {
            self.mesh.vertices.push(mask.corner(p));
        }
        index
    }

    fn quad(&mut self, mask: &VoxelMask, corners: [Vec3i; 4]) {
        let [a, b, c, d] = corners.map(|p| self.vertex(mask, p));
        self.mesh.faces.push([a, b, c]);
        self.mesh.faces.push([a, c, d]);
    }
}

impl IsoSurfaceExtractor for VoxelFaceExtractor {
    fn extract(&self, mask: &VoxelMask) -> Mesh {
        let side = mask.side() as i64;
        let mut welder = Welder {
            indices: HashMap::new(),
            mesh: Mesh::default(),
        };

        for i in 0..side {
            for j in 0..side {
                for k in 0..side {
                    let cell = Vec3i::new(i, j, k);
                    if !mask.is_solid(cell) {
                        continue;
                    }
                    for a in 0..3 {
                        // (u, v, n) is right-handed for a cyclic permutation
                        let n = AXES[a];
                        let u = AXES[(a + 1) % 3];
                        let v = AXES[(a + 2) % 3];
                        if !mask.is_solid(cell + n) {
                            let o = cell + n;
                            welder.quad(mask, [o, o + u, o + u + v, o + v]);
                        }
                        if !mask.is_solid(cell - n) {
                            let o = cell;
                            welder.quad(mask, [o, o + v, o + u + v, o + u]);
                        }
                    }
                }
            }
        }

        let mesh = welder.mesh;
        info!(
            "Extracted {} vertices and {} triangles",
            mesh.vertices.len(),
            mesh.faces.len()
        );
        mesh
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{EuclideanSpace, InnerSpace};

    use super::{IsoSurfaceExtractor, VoxelFaceExtractor};
    use crate::{
        array3d::Array3d,
        sdf::{SdfSphere, SphereParameters},
        vec::{Point3, triangle_normal},
        voxelizer::{VoxelMask, VoxelizerSettings, voxelize},
    };

    fn single_voxel() -> VoxelMask {
        let mut solid = Array3d::with_side(3, false);
        *solid.at_mut(1, 1, 1) = true;
        VoxelMask {
            solid,
            origin: Point3::new(0.0, 0.0, 0.0),
            resolution: 0.5,
        }
    }

    #[test]
    fn single_voxel_is_a_cube() {
        let mesh = VoxelFaceExtractor.extract(&single_voxel());
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.faces.len(), 12);
        assert!(mesh.is_closed());
        assert_eq!(mesh.euler_characteristic(), 2);
        let bounds = mesh.bounds();
        assert_eq!(bounds.min, Point3::new(0.5, 0.5, 0.5));
        assert_eq!(bounds.max, Point3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn faces_point_away_from_the_solid() {
        let mesh = VoxelFaceExtractor.extract(&single_voxel());
        let center = Point3::new(0.75, 0.75, 0.75);
        for f in &mesh.faces {
            let [a, b, c] = f.map(|i| mesh.vertices[i as usize]);
            let n = triangle_normal(&a, &b, &c).unwrap();
            let centroid = Point3::centroid(&[a, b, c]);
            assert!(n.dot(centroid - center) > 0.0);
        }
    }

    #[test]
    fn empty_mask_gives_empty_mesh() {
        let mask = VoxelMask {
            solid: Array3d::with_side(9, false),
            origin: Point3::new(0.0, 0.0, 0.0),
            resolution: 1.0,
        };
        let mesh = VoxelFaceExtractor.extract(&mask);
        assert!(mesh.vertices.is_empty());
        assert!(mesh.faces.is_empty());
    }

    #[test]
    fn voxelized_sphere_is_closed() {
        let sphere = SdfSphere::new(SphereParameters::default());
        let settings = VoxelizerSettings {
            levels: 4,
            size: 2.8,
            ..VoxelizerSettings::default()
        };
        let voxels = voxelize(&sphere, &settings).unwrap();
        let mesh = VoxelFaceExtractor.extract(&voxels.mask);
        assert!(mesh.validate().is_ok());
        assert!(mesh.is_closed());
        assert_eq!(mesh.euler_characteristic(), 2);

        // The blocky surface stays within one voxel diagonal of the sphere
        let tolerance = settings.resolution() * 3f64.sqrt();
        let bounds = voxels.mask.bounds();
        for v in &mesh.vertices {
            assert!(bounds.contains(v));
            let r = v.to_vec().magnitude();
            assert!((r - 1.0).abs() <= tolerance, "vertex {v:?} at radius {r}");
        }
    }
}
