//! Geometry assembly: polygon groups plus the shared buffers become final
//! mesh records.

use std::sync::Arc;

use crate::{
    error::{DecodeError, Result},
    format::{
        d3dmesh::{ImportOptions, PolygonGroup},
        Vec3f,
    },
};

/// Assembled output geometry. All records from one decode share a single
/// vertex buffer; only the face lists differ and they are pre-offset.
/// Face indices are one-based (the format's convention), so OBJ-style
/// consumers can use them as-is.
#[derive(Debug, Clone)]
pub struct MeshRecord {
    pub name: String,
    pub vertices: Arc<Vec<Vec3f>>,
    pub faces: Vec<[u32; 3]>,
}

impl MeshRecord {
    /// Face triples corrected for zero-based consumers.
    pub fn zero_based_faces(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.faces.iter().map(|f| [f[0] - 1, f[1] - 1, f[2] - 1])
    }
}

/// Slice a group's polygon range out of the shared face buffer and rebase
/// its indices by the group's vertex start. Range violations mean the
/// decoder desynchronized upstream and are fatal.
fn group_faces(group: &PolygonGroup, faces: &[[u32; 3]], out: &mut Vec<[u32; 3]>) -> Result<()> {
    let start = group.polygon_start as usize - 1;
    let end = start + group.polygon_count as usize;
    if end > faces.len() {
        return Err(DecodeError::FaceRangeOutOfBounds {
            lod: group.lod,
            start,
            end,
            len: faces.len(),
        });
    }
    // vertex_start is already one-based; wrapping keeps hostile values from
    // panicking in debug builds.
    let rebase = group.vertex_start.wrapping_sub(1);
    out.extend(faces[start..end].iter().map(|f| {
        [f[0].wrapping_add(rebase), f[1].wrapping_add(rebase), f[2].wrapping_add(rebase)]
    }));
    Ok(())
}

/// Group the decoded polygon ranges into one record per LOD (default) or one
/// per group (`split_groups`).
pub(crate) fn assemble(
    name: &str,
    groups: Vec<PolygonGroup>,
    lod_count: u32,
    vertices: Vec<Vec3f>,
    faces: Vec<[u32; 3]>,
    options: &ImportOptions<'_>,
) -> Result<Vec<MeshRecord>> {
    // A single-LOD file never needs LOD suffixes.
    let parse_lods = options.parse_lods && lod_count > 1;
    let vertices = Arc::new(vertices);
    let mut records = Vec::new();

    if options.split_groups {
        for (i, group) in groups.iter().enumerate() {
            let mut group_face_list = Vec::new();
            group_faces(group, &faces, &mut group_face_list)?;
            records.push(MeshRecord {
                name: format!("{name}_{i:03}"),
                vertices: Arc::clone(&vertices),
                faces: group_face_list,
            });
        }
        return Ok(records);
    }

    let retained_lods = if parse_lods { lod_count } else { 1 };
    for lod in 0..retained_lods {
        let mut combined = Vec::new();
        let mut any = false;
        for group in groups.iter().filter(|g| g.lod == lod) {
            group_faces(group, &faces, &mut combined)?;
            any = true;
        }
        if !any {
            continue;
        }
        let record_name = if lod == 0 || !parse_lods {
            name.to_owned()
        } else {
            format!("{name} (LOD #{lod})")
        };
        records.push(MeshRecord {
            name: record_name,
            vertices: Arc::clone(&vertices),
            faces: combined,
        });
    }
    Ok(records)
}
