//! Binary STL.
//!
//! Layout, all little-endian:
//! - 80-byte header, padded with spaces
//! - `u32` triangle count
//! - per triangle: `f32` normal (3), `f32` vertices (3 × 3), `u16` attribute (0)

use std::{
    fs::File,
    io::{BufWriter, ErrorKind, Read, Write},
    path::Path,
};

use itertools::Itertools;
use log::{info, warn};

use crate::{
    Error,
    constants::STL_HEADER_SIZE,
    mesh::validate_faces,
    vec::{Point3, Vec3, Vec3f, to_f32, triangle_normal},
};

/// Header used when the caller does not give one
pub const DEFAULT_HEADER: &str = "fractal_printer binary STL";

/// Bytes of one triangle record
const TRIANGLE_SIZE: usize = 50;

/// Triangle as stored in the file
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StlTriangle {
    pub normal: Vec3f,
    pub vertices: [Vec3f; 3],
}

#[derive(Clone, Debug, PartialEq)]
pub struct StlFile {
    /// Header with the trailing padding removed
    pub header: String,
    pub triangles: Vec<StlTriangle>,
}

fn header_bytes(header: Option<&str>) -> crate::Result<[u8; STL_HEADER_SIZE]> {
    let text = header.unwrap_or(DEFAULT_HEADER).as_bytes();
    if text.len() > STL_HEADER_SIZE {
        return Err(Error::HeaderTooLong(text.len()));
    }
    let mut bytes = [b' '; STL_HEADER_SIZE];
    bytes[..text.len()].copy_from_slice(text);
    Ok(bytes)
}

fn write_vec3<W: Write>(writer: &mut W, v: &Vec3f) -> std::io::Result<()> {
    writer.write_all(&v.x.to_le_bytes())?;
    writer.write_all(&v.y.to_le_bytes())?;
    writer.write_all(&v.z.to_le_bytes())
}

/// Write a binary STL to `writer` and return the number of triangles written.
///
/// Faces without area (repeated indices, collinear corners) are left out and
/// not counted. Out-of-range indices and oversized headers are reported
/// before anything is written.
pub fn write_stl<W: Write>(
    writer: &mut W,
    vertices: &[Point3],
    faces: &[[u32; 3]],
    header: Option<&str>,
) -> crate::Result<usize> {
    validate_faces(vertices, faces)?;
    let header = header_bytes(header)?;

    // Corners are narrowed first: area and normal are judged on what the
    // file stores, and the declared count matches what follows
    let triangles = faces
        .iter()
        .filter_map(|f| {
            let corners = f.map(|i| {
                let p = vertices[i as usize];
                to_f32(&Vec3::new(p.x, p.y, p.z))
            });
            let [a, b, c] = corners.map(|v| Point3::new(f64::from(v.x), f64::from(v.y), f64::from(v.z)));
            triangle_normal(&a, &b, &c).map(|n| (to_f32(&n), corners))
        })
        .collect_vec();
    let skipped = faces.len() - triangles.len();
    if skipped > 0 {
        warn!("Skipped {skipped} faces without area");
    }
    let count = u32::try_from(triangles.len()).map_err(|_| {
        Error::InvalidParameter(
            "faces".to_string(),
            format!("{} triangles do not fit a binary STL", triangles.len()),
        )
    })?;

    writer.write_all(&header)?;
    writer.write_all(&count.to_le_bytes())?;
    for (normal, corners) in &triangles {
        write_vec3(writer, normal)?;
        for v in corners {
            write_vec3(writer, v)?;
        }
        writer.write_all(&0u16.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(triangles.len())
}

/// Write a binary STL file next to `path` and move it into place once complete.
///
/// Returns the number of triangles written.
pub fn export_stl<P: AsRef<Path>>(
    path: P,
    vertices: &[Point3],
    faces: &[[u32; 3]],
    header: Option<&str>,
) -> crate::Result<usize> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    let count = {
        let mut writer = BufWriter::new(file.as_file_mut());
        write_stl(&mut writer, vertices, faces, header)?
    };
    file.as_file().sync_all()?;
    file.persist(path).map_err(|err| Error::Io(err.error))?;
    info!("Wrote {count} triangles to {}", path.display());
    Ok(count)
}

fn read_exact_or<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> crate::Result<()> {
    reader.read_exact(buf).map_err(|err| match err.kind() {
        ErrorKind::UnexpectedEof => Error::InvalidStl(format!("truncated {what}")),
        _ => Error::Io(err),
    })
}

fn read_vec3(buf: &[u8]) -> Vec3f {
    let (x, y, z) = buf
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect_tuple()
        .unwrap_or_default();
    Vec3f::new(x, y, z)
}

/// Parse a binary STL stream.
pub fn read_stl_binary<R: Read>(reader: &mut R) -> crate::Result<StlFile> {
    let mut header = [0u8; STL_HEADER_SIZE];
    read_exact_or(reader, &mut header, "header")?;
    let mut count = [0u8; 4];
    read_exact_or(reader, &mut count, "triangle count")?;
    let count = u32::from_le_bytes(count) as usize;

    let mut triangles = Vec::with_capacity(count.min(1 << 20));
    let mut record = [0u8; TRIANGLE_SIZE];
    for id in 0..count {
        read_exact_or(reader, &mut record, &format!("triangle {id}"))?;
        triangles.push(StlTriangle {
            normal: read_vec3(&record[0..12]),
            vertices: [
                read_vec3(&record[12..24]),
                read_vec3(&record[24..36]),
                read_vec3(&record[36..48]),
            ],
        });
    }

    let mut rest = [0u8; 1];
    if reader.read(&mut rest)? != 0 {
        return Err(Error::InvalidStl(format!(
            "data after the {count} declared triangles"
        )));
    }

    Ok(StlFile {
        header: String::from_utf8_lossy(&header).trim_end().to_string(),
        triangles,
    })
}

/// Parse a binary STL file.
pub fn load_stl_binary<P: AsRef<Path>>(path: P) -> crate::Result<StlFile> {
    let mut file = File::open(path)?;
    read_stl_binary(&mut file)
}
