//! D3DMesh container decoding.
//!
//! The format is a sequence of length-delimited sections. Most section
//! lengths are read as a u32 whose value is the section end relative to the
//! position just after the length field, so unknown content inside a section
//! is skippable with an absolute seek. Layouts are known empirically; the
//! decoder reads what it understands, logs what it does not, and relies on
//! the section ends to stay synchronized.

use std::path::Path;

use binrw::{binrw, BinReaderExt};

use crate::{
    error::{DecodeError, Result},
    format::{geom, geom::MeshRecord, hashdb::HashDatabase, magic_string, material, AABox, SplitHash, Vec3f},
    util::{file::map_file, read::Reader},
};

/// The only supported container version. Earlier games used pre-55 variants
/// with different section layouts; see [`EarlyGameFix`].
pub const SUPPORTED_VERSION: u8 = 55;

/// Vertex-flags values known to carry no extra sub-block before the buffer
/// descriptors.
const PLAIN_VERTEX_FLAGS: [u32; 6] = [0x00, 0x01, 0x03, 0x05, 0x09, 0x21];

/// How UV layers should be surfaced by the host importer. Advisory: the
/// decode path is identical for all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UvMode {
    #[default]
    Merge,
    Split,
    Ignore,
}

/// Pre-version-55 game variants with known layout deviations. Declared for
/// the option surface; no fixups are wired to them yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EarlyGameFix {
    /// Texas Hold'em, Bone, CSI 3/4, Sam & Max Season 1 and Season 2 ep. 1-2.
    Oldest,
    SamMaxS2Ep34,
    SamMaxS2Ep5,
    StrongBadEp1,
    StrongBadEp2,
    StrongBadEp3,
    StrongBadEp4,
    StrongBadEp5,
    WallaceGromit,
}

/// Per-decode configuration. Databases are borrowed so one loaded database
/// can serve many concurrent decodes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportOptions<'a> {
    /// Retain LODs beyond the first. Forced off when the file declares a
    /// single LOD.
    pub parse_lods: bool,
    /// Emit one record per polygon group instead of one per LOD.
    pub split_groups: bool,
    pub uv_mode: UvMode,
    pub early_game_fix: Option<EarlyGameFix>,
    pub texture_db: Option<&'a HashDatabase>,
    /// Reserved for the skeleton path; accepted but not consulted.
    pub bone_db: Option<&'a HashDatabase>,
}

/// Which buffer a recognized vertex attribute lives in and its numeric
/// format. Recognition and decoding are separate: every slot here is
/// recognized from the descriptors, but only position data is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrSlot {
    pub buffer: u32,
    pub format: u32,
}

/// Attribute-to-buffer assignment from the Section 12 descriptors.
#[derive(Debug, Clone, Default)]
pub struct VertexLayout {
    pub position: Option<AttrSlot>,
    pub normal: Option<AttrSlot>,
    pub tangent: Option<AttrSlot>,
    pub binormal: Option<AttrSlot>,
    pub weights: Option<AttrSlot>,
    pub bones: Option<AttrSlot>,
    pub color: Option<AttrSlot>,
    pub color2: Option<AttrSlot>,
    pub uv: [Option<AttrSlot>; 6],
}

impl VertexLayout {
    /// Map a descriptor's (type, layer) pair onto an attribute slot.
    /// Returns false for combinations outside the known set.
    fn assign(&mut self, ty: u32, layer: u32, slot: AttrSlot) -> bool {
        let target = match (ty, layer) {
            (1, 1) => &mut self.position,
            (2, 1) => &mut self.normal,
            (2, 2) => &mut self.binormal,
            (3, 1) => &mut self.tangent,
            (4, 1) => &mut self.weights,
            (5, 1) => &mut self.bones,
            (6, 1) => &mut self.color,
            (6, 2) => &mut self.color2,
            (7, n @ 1..=6) => &mut self.uv[(n - 1) as usize],
            _ => return false,
        };
        *target = Some(slot);
        true
    }
}

/// One Section 3A descriptor retained for assembly. Ranges keep the format's
/// one-based convention.
#[derive(Debug, Clone, Copy)]
pub struct PolygonGroup {
    pub lod: u32,
    pub bounds: AABox,
    pub vertex_start: u32,
    pub vertex_end: u32,
    pub polygon_start: u32,
    pub polygon_count: u32,
    pub material_index: u32,
}

/// Axis singled out by the Section 10 trigger floats. Receives the 2-bit
/// refinement in position format 42; `Q` means no axis does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    X,
    Y,
    Z,
    #[default]
    Q,
}

impl Orientation {
    /// Last non-zero trigger wins, checked in X, Y, Z order.
    pub fn from_triggers(x: f32, y: f32, z: f32) -> Self {
        let mut orient = Orientation::Q;
        if x != 0.0 {
            orient = Orientation::X;
        }
        if y != 0.0 {
            orient = Orientation::Y;
        }
        if z != 0.0 {
            orient = Orientation::Z;
        }
        orient
    }
}

/// Section 10 output needed by the packed position formats.
#[derive(Debug, Clone, Copy, Default)]
struct ModelClamps {
    min: Vec3f,
    mult: Vec3f,
    orientation: Orientation,
}

/// Section 5 record shape, parsed for the logs only.
#[binrw]
#[derive(Debug, Clone)]
struct MaterialGroupRecord {
    length: u32,
    mat_hash2: u32,
    mat_hash1: u32,
    unk_hash2: u32,
    unk_hash1: u32,
    floats: [f32; 10],
    sub_length: u32,
    sub_floats: [f32; 4],
    trailing: u32,
}

/// Descriptor entry shapes in Section 12. All five fields of a vertex entry
/// are stored off by one.
#[binrw]
#[derive(Debug, Clone, Copy)]
struct RawBufferEntry {
    a: u32,
    b: u32,
    c: u32,
    d: u32,
    e: u32,
}

/// Decode a whole in-memory mesh file into assembled records.
pub fn decode(data: &[u8], options: &ImportOptions<'_>) -> Result<Vec<MeshRecord>> {
    Decoder { r: Reader::new(data) }.run(options)
}

/// Memory-map `path` and decode it.
pub fn decode_file<P: AsRef<Path>>(path: P, options: &ImportOptions<'_>) -> Result<Vec<MeshRecord>> {
    let data = map_file(path)?;
    decode(&data, options)
}

struct Decoder<'a> {
    r: Reader<'a>,
}

impl<'a> Decoder<'a> {
    /// Read a length field and return the absolute end it delimits, relative
    /// to the position just past the field itself.
    fn section_end(&mut self) -> Result<usize> {
        let len = self.r.read_u32()? as usize;
        Ok(self.r.position() + len)
    }

    fn run(&mut self, options: &ImportOptions<'_>) -> Result<Vec<MeshRecord>> {
        let name = self.read_header()?;

        // Section 1 (model info): fixed opaque block.
        log::debug!("Section 1 (model info) start @{:#x}", self.r.position());
        self.r.seek_rel(0x14);

        let materials = material::read_materials(&mut self.r, options.texture_db)?;
        for (i, mat) in materials.iter().enumerate() {
            log::debug!("Material #{} {} texture {}", i + 1, mat.hash, mat.tex_dif_name);
        }

        let _unk = self.r.read_u32()?;
        let _pad = self.r.read_u8()?;
        let face_data_start = self.section_end()?;
        log::debug!("Face data start @{face_data_start:#x}");

        let (groups, lod_count) = self.read_lod_section(options.parse_lods)?;

        self.skip_counted_section("4")?;
        self.read_material_groups()?;
        self.read_section6()?;
        self.read_bone_ids()?;
        self.skip_counted_section("8")?;
        self.skip_counted_section("9")?;

        let clamps = self.read_model_clamps()?;

        // Section 11A: vertex count and flags, then a skipped subsection.
        log::debug!("Section 11 start @{:#x}", self.r.position());
        let vertex_count = self.r.read_u32()?;
        let vertex_flags = self.r.read_u32()?;
        let sect11a_end = self.section_end()?;
        let sect11a_count = self.r.read_u32()?;
        log::debug!("Vertex count {vertex_count}, flags {vertex_flags:#x}, 11A count {sect11a_count}");
        self.r.seek_abs(sect11a_end);

        self.read_uv_clamps()?;

        if vertex_count == 0 {
            log::debug!("Vertex count is zero, emitting no records for {name}");
            return Ok(Vec::new());
        }

        let sub_buffer_start = self.read_vertex_flag_block(vertex_flags)?;
        let (layout, face_point_counts) = self.read_buffer_descriptors()?;

        self.r.seek_abs(face_data_start);
        // A file declaring no face buffers has an empty primary stream.
        let faces = self.read_face_buffer(face_point_counts[0].unwrap_or(0))?;
        if let Some(count_b) = face_point_counts[1] {
            // Second face stream: kept aligned, not assembled.
            let faces_b = self.read_face_buffer(count_b)?;
            log::debug!("Secondary face buffer holds {} triples", faces_b.len());
        }

        if let Some(start) = sub_buffer_start {
            self.read_vertex_sub_buffer(start, vertex_count)?;
        }

        let Some(position) = layout.position else {
            log::debug!("No position attribute declared, emitting no records for {name}");
            return Ok(Vec::new());
        };
        let vertices = self.read_positions(position.format, vertex_count, &clamps)?;

        geom::assemble(&name, groups, lod_count, vertices, faces, options)
    }

    /// Header through the version gate. Returns the model's display name.
    fn read_header(&mut self) -> Result<String> {
        let magic = self.r.read_u32()?;
        let file_size = self.r.read_u32()?;
        log::debug!("Header magic {:?}, file size {file_size}", magic_string(magic));
        self.r.seek_rel(0x08);
        let param_count = self.r.read_u32()?;
        self.r.seek_rel(param_count as i64 * 0x0c);

        let name_header_len = self.r.read_u32()?;
        let mut name_len = self.r.read_u32()?;
        if name_len > name_header_len {
            // Some files omit the inner length; the header length governs.
            self.r.seek_rel(-0x04);
            name_len = name_header_len;
        }
        let name = self.r.read_fixed_string(name_len as usize)?;

        let version = self.r.read_u8()?;
        log::info!("Decoding {name} version {version}");
        if version != SUPPORTED_VERSION {
            return Err(DecodeError::UnsupportedVersion(version));
        }
        Ok(name)
    }

    /// Section 3: per-LOD polygon-group descriptors (3A), a second descriptor
    /// array (3B) and a scalar/bone block (3C), both decoded only for cursor
    /// alignment.
    fn read_lod_section(&mut self, parse_lods: bool) -> Result<(Vec<PolygonGroup>, u32)> {
        let end = self.section_end()?;
        let lod_count = self.r.read_u32()?;
        log::debug!("Section 3 (LOD info) start @{:#x}, {lod_count} LODs", self.r.position());

        let mut groups = Vec::new();
        for lod in 0..lod_count {
            let group_count = self.r.read_u32()?;
            for _ in 0..group_count {
                let group = self.read_polygon_group(lod)?;
                if lod == 0 || parse_lods {
                    groups.push(group);
                }
            }

            // 3B: separately counted, same entry shape, dead data.
            let alt_count = self.r.read_u32()?;
            for _ in 0..alt_count {
                self.read_polygon_group(lod)?;
            }

            // 3C: fixed scalar block and a bone-ID list.
            for _ in 0..13 {
                self.r.read_f32()?;
            }
            let bone_count = self.r.read_u32()?;
            for _ in 0..bone_count {
                self.r.read_u32()?;
            }
        }
        self.r.seek_abs(end);
        Ok((groups, lod_count))
    }

    fn read_polygon_group(&mut self, lod: u32) -> Result<PolygonGroup> {
        let entry_end = self.section_end()?;
        let bounds: AABox = self.r.read_le()?;
        // Stored off by one; wrap rather than panic on hostile values.
        let vertex_start = self.r.read_u32()?.wrapping_add(1);
        let vertex_end = self.r.read_u32()?.wrapping_add(1);
        let face_point_start = self.r.read_u32()?;
        let face_point_count = self.r.read_u32()?;
        let material_index = self.r.read_u32()?;
        // Longer headers carry extra fields we do not interpret.
        self.r.seek_abs(entry_end);
        Ok(PolygonGroup {
            lod,
            bounds,
            vertex_start,
            vertex_end,
            polygon_start: face_point_start / 3 + 1,
            polygon_count: face_point_count / 3,
            material_index,
        })
    }

    /// Length-delimited, count-prefixed, structurally opaque in all observed
    /// files.
    fn skip_counted_section(&mut self, label: &str) -> Result<()> {
        let end = self.section_end()?;
        let count = self.r.read_u32()?;
        log::debug!("Section {label} start @{:#x}, count {count}", self.r.position());
        self.r.seek_abs(end);
        Ok(())
    }

    /// Section 5: fixed-shape records, logged only.
    fn read_material_groups(&mut self) -> Result<()> {
        let end = self.section_end()?;
        let count = self.r.read_u32()?;
        log::debug!("Section 5 (material groups) start @{:#x}, count {count}", self.r.position());
        for _ in 0..count {
            let record: MaterialGroupRecord = self.r.read_le()?;
            log::debug!(
                "Material group {} floats {:?} {:?}",
                SplitHash::new(record.mat_hash1, record.mat_hash2),
                record.floats,
                record.sub_floats
            );
        }
        self.r.seek_abs(end);
        Ok(())
    }

    fn read_section6(&mut self) -> Result<()> {
        let end = self.section_end()?;
        let count = self.r.read_u32()?;
        log::debug!("Section 6 start @{:#x}, count {count}", self.r.position());
        for _ in 0..count {
            let _header_len = self.r.read_u32()?;
            SplitHash::read(&mut self.r)?;
            let _unk = self.r.read_u32()?;
        }
        self.r.seek_abs(end);
        Ok(())
    }

    /// Section 7: only the count is meaningful at this feature level.
    fn read_bone_ids(&mut self) -> Result<()> {
        let end = self.section_end()?;
        let count = self.r.read_u32()?;
        let has_bone_sets = count > 0;
        log::debug!(
            "Section 7 (bone IDs) start @{:#x}, count {count}, has bone sets {has_bone_sets}",
            self.r.position()
        );
        self.r.seek_abs(end);
        Ok(())
    }

    /// Section 10: bounding clamps and the orientation trigger floats.
    fn read_model_clamps(&mut self) -> Result<ModelClamps> {
        log::debug!("Section 10 (model clamps) start @{:#x}", self.r.position());
        let _unk1 = self.r.read_u32()?;
        let flags = [self.r.read_u8()?, self.r.read_u8()?, self.r.read_u8()?, self.r.read_u8()?];
        let bounds: AABox = self.r.read_le()?;
        let mult = Vec3f {
            x: bounds.max.x - bounds.min.x,
            y: bounds.max.y - bounds.min.y,
            z: bounds.max.z - bounds.min.z,
        };

        let _sub_length = self.r.read_u32()?;
        for _ in 0..4 {
            self.r.read_f32()?;
        }
        let _unk3 = self.r.read_u32()?;
        for _ in 0..3 {
            self.r.read_f32()?;
        }
        let tx = self.r.read_f32()?;
        let ty = self.r.read_f32()?;
        let tz = self.r.read_f32()?;
        for _ in 0..3 {
            self.r.read_f32()?;
        }
        let _unk4 = self.r.read_u32()?;
        SplitHash::read(&mut self.r)?;

        let orientation = Orientation::from_triggers(tx, ty, tz);
        log::debug!("Clamp flags {flags:#x?}, orientation {orientation:?}");
        Ok(ModelClamps { min: bounds.min, mult, orientation })
    }

    /// Section 11B: UV multiplier/start pairs per layer. Layers outside 0..5
    /// are skipped, not stored.
    fn read_uv_clamps(&mut self) -> Result<()> {
        log::debug!("Section 11B (UV clamps) start @{:#x}", self.r.position());
        let count = self.r.read_u32()?;
        let mut mults = [[1.0f32, 1.0]; 6];
        let mut starts = [[0.0f32, 0.0]; 6];
        for _ in 0..count {
            let layer = self.r.read_u32()?;
            let mult = [self.r.read_f32()?, self.r.read_f32()?];
            let start = [self.r.read_f32()?, self.r.read_f32()?];
            let Some(slot) = mults.get_mut(layer as usize) else {
                log::warn!("Unknown UV layer {layer}");
                continue;
            };
            *slot = mult;
            starts[layer as usize] = start;
            log::debug!("UV layer #{} mult {mult:?}, start {start:?}", layer + 1);
        }
        Ok(())
    }

    /// Section 11C: flags 0x31 carries a sub-block locating a secondary
    /// vertex sub-buffer; the cursor then jumps ahead to the descriptor
    /// section. Returns the sub-buffer start, if any.
    fn read_vertex_flag_block(&mut self, vertex_flags: u32) -> Result<Option<usize>> {
        if PLAIN_VERTEX_FLAGS.contains(&vertex_flags) {
            return Ok(None);
        }
        if vertex_flags != 0x31 {
            log::warn!("Unknown vertex flags {vertex_flags:#x}");
            return Ok(None);
        }
        log::debug!("Section 11C start @{:#x}", self.r.position());
        for _ in 0..9 {
            self.r.read_u32()?;
        }
        let descriptor_start = self.section_end()?;
        let _sub_buffer_size = self.r.read_u32()?;
        let sub_buffer_start = self.r.position();
        self.r.seek_abs(descriptor_start);
        Ok(Some(sub_buffer_start))
    }

    /// Section 12: vertex buffer descriptors, face buffer descriptors, and
    /// the discarded trailer.
    fn read_buffer_descriptors(&mut self) -> Result<(VertexLayout, [Option<u32>; 2])> {
        log::debug!("Section 12 (buffer descriptors) start @{:#x}", self.r.position());
        let _unk1 = self.r.read_u32()?;
        let _unk2 = self.r.read_u32()?;
        let face_buffer_count = self.r.read_u32()?;
        let buffer_count1 = self.r.read_u32()?;
        let buffer_count2 = self.r.read_u32()?;

        let mut layout = VertexLayout::default();
        for _ in 0..buffer_count1 {
            let raw: RawBufferEntry = self.r.read_le()?;
            // All five descriptor fields are stored off by one.
            let (ty, format, layer, buffer, offset) = (
                raw.a.wrapping_add(1),
                raw.b.wrapping_add(1),
                raw.c.wrapping_add(1),
                raw.d.wrapping_add(1),
                raw.e.wrapping_add(1),
            );
            log::debug!(
                "Vertex attribute type {ty}, format {format}, layer {layer}, buffer {buffer}, offset {offset}"
            );
            if !layout.assign(ty, layer, AttrSlot { buffer, format }) {
                log::warn!("Unknown vertex buffer combo (type {ty}, layer {layer})");
            }
        }

        let mut face_point_counts = [None; 2];
        for fb in 0..face_buffer_count {
            let entry: RawBufferEntry = self.r.read_le()?;
            log::debug!("Face buffer #{}: count {}, length {}", fb + 1, entry.d, entry.e);
            if let Some(slot) = face_point_counts.get_mut(fb as usize) {
                *slot = Some(entry.d);
            }
        }

        // Trailer is one entry longer than its count field states.
        for _ in 0..buffer_count2 + 1 {
            let _: RawBufferEntry = self.r.read_le()?;
        }
        Ok((layout, face_point_counts))
    }

    /// Face points are u16, stored zero-based and lifted to the format's
    /// one-based convention on read.
    fn read_face_buffer(&mut self, face_point_count: u32) -> Result<Vec<[u32; 3]>> {
        let triple_count = face_point_count / 3;
        // Declared counts are untrusted; never reserve more than the bytes
        // left can hold.
        let cap = (triple_count as usize).min(self.r.remaining() / 6);
        let mut faces = Vec::with_capacity(cap);
        for _ in 0..triple_count {
            faces.push([
                self.r.read_u16()? as u32 + 1,
                self.r.read_u16()? as u32 + 1,
                self.r.read_u16()? as u32 + 1,
            ]);
        }
        Ok(faces)
    }

    /// Flags-0x31 side buffer: duplicate positions plus bone indices. Only
    /// the bone indices are meaningful and only their count is surfaced.
    fn read_vertex_sub_buffer(&mut self, start: usize, vertex_count: u32) -> Result<()> {
        let resume = self.r.position();
        self.r.seek_abs(start);
        let cap = (vertex_count as usize).min(self.r.remaining() / 24);
        let mut bone_indices = Vec::with_capacity(cap);
        for _ in 0..vertex_count {
            for _ in 0..3 {
                self.r.read_f32()?;
            }
            let raw = self.r.read_bytes(4)?;
            bone_indices.push([raw[0], raw[1], raw[2], raw[3]]);
            self.r.seek_rel(8);
        }
        log::debug!("Vertex sub-buffer: {} bone index sets", bone_indices.len());
        self.r.seek_abs(resume);
        Ok(())
    }

    fn read_positions(
        &mut self,
        format: u32,
        vertex_count: u32,
        clamps: &ModelClamps,
    ) -> Result<Vec<Vec3f>> {
        // Smallest encoding is 4 bytes per vertex (format 42); cap the
        // reservation by what the file can actually hold.
        let cap = (vertex_count as usize).min(self.r.remaining() / 4);
        let mut vertices = Vec::with_capacity(cap);
        match format {
            4 => {
                for _ in 0..vertex_count {
                    vertices.push(self.r.read_le()?);
                }
            }
            27 => {
                for _ in 0..vertex_count {
                    let x = self.r.read_u16()? as f32 / 65535.0;
                    let y = self.r.read_u16()? as f32 / 65535.0;
                    let z = self.r.read_u16()? as f32 / 65535.0;
                    let _w = self.r.read_u16()? as f32 / 65535.0;
                    vertices.push(Vec3f {
                        x: x * clamps.mult.x + clamps.min.x,
                        y: y * clamps.mult.y + clamps.min.y,
                        z: z * clamps.mult.z + clamps.min.z,
                    });
                }
            }
            42 => {
                for _ in 0..vertex_count {
                    let packed = self.r.read_u32()?;
                    let (x, y, z) = unpack_position_42(packed, clamps.orientation);
                    vertices.push(Vec3f {
                        x: x * clamps.mult.x + clamps.min.x,
                        y: y * clamps.mult.y + clamps.min.y,
                        z: z * clamps.mult.z + clamps.min.z,
                    });
                }
            }
            other => return Err(DecodeError::UnsupportedVertexFormat(other)),
        }
        Ok(vertices)
    }
}

/// Unpack a format-42 position: three 10-bit fields scaled to 0..1, plus a
/// 2-bit high field refining the orientation axis. The refined axis trades
/// range for precision: its 10-bit value covers a quarter of the range and
/// the high field selects which quarter.
fn unpack_position_42(packed: u32, orientation: Orientation) -> (f32, f32, f32) {
    let mut x = (packed & 0x3ff) as f32 / 1023.0;
    let mut y = ((packed >> 10) & 0x3ff) as f32 / 1023.0;
    let mut z = ((packed >> 20) & 0x3ff) as f32 / 1023.0;
    let high = (packed >> 30) as f32;
    match orientation {
        Orientation::X => x = x / 4.0 + high / 4.0,
        Orientation::Y => y = y / 4.0 + high / 4.0,
        Orientation::Z => z = z / 4.0 + high / 4.0,
        Orientation::Q => {}
    }
    (x, y, z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orientation_last_nonzero_trigger_wins() {
        assert_eq!(Orientation::from_triggers(0.0, 0.0, 0.0), Orientation::Q);
        assert_eq!(Orientation::from_triggers(1.0, 0.0, 0.0), Orientation::X);
        assert_eq!(Orientation::from_triggers(1.0, 2.0, 0.0), Orientation::Y);
        assert_eq!(Orientation::from_triggers(0.0, 2.0, 3.0), Orientation::Z);
        assert_eq!(Orientation::from_triggers(1.0, 2.0, 3.0), Orientation::Z);
    }

    #[test]
    fn format_42_zero_unpacks_to_origin() {
        assert_eq!(unpack_position_42(0, Orientation::Q), (0.0, 0.0, 0.0));
        assert_eq!(unpack_position_42(0, Orientation::X), (0.0, 0.0, 0.0));
    }

    #[test]
    fn format_42_full_x_field_is_one() {
        let (x, y, z) = unpack_position_42(0x3ff, Orientation::Q);
        assert_eq!(x, 1.0);
        assert_eq!(y, 0.0);
        assert_eq!(z, 0.0);
    }

    #[test]
    fn format_42_high_field_refines_matched_axis() {
        // Full 10-bit y with high field 3: y covers its top quarter.
        let packed = (0x3ffu32 << 10) | (3 << 30);
        let (_, y, _) = unpack_position_42(packed, Orientation::Y);
        assert_eq!(y, 1.0);
        let (_, y_unrefined, _) = unpack_position_42(packed, Orientation::Q);
        assert_eq!(y_unrefined, 1.0);
        let (_, y_low, _) = unpack_position_42(0x3ffu32 << 10, Orientation::Y);
        assert_eq!(y_low, 0.25);
    }

    #[test]
    fn layout_assigns_known_combos_only() {
        let mut layout = VertexLayout::default();
        let slot = AttrSlot { buffer: 1, format: 4 };
        assert!(layout.assign(1, 1, slot));
        assert!(layout.assign(7, 3, slot));
        assert!(layout.assign(6, 2, slot));
        assert!(!layout.assign(8, 1, slot));
        assert!(!layout.assign(7, 7, slot));
        assert_eq!(layout.position, Some(slot));
        assert_eq!(layout.uv[2], Some(slot));
        assert_eq!(layout.color2, Some(slot));
        assert!(layout.normal.is_none());
    }
}
