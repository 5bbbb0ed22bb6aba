//! End-to-end decode tests over synthetic mesh files.

use tellib::{
    format::{
        d3dmesh::{decode, ImportOptions},
        Vec3f,
    },
    DecodeError,
};

struct Buf(Vec<u8>);

impl Buf {
    fn u8(&mut self, v: u8) {
        self.0.push(v);
    }

    fn u16(&mut self, v: u16) {
        self.0.extend_from_slice(&v.to_le_bytes());
    }

    fn u32(&mut self, v: u32) {
        self.0.extend_from_slice(&v.to_le_bytes());
    }

    fn f32(&mut self, v: f32) {
        self.0.extend_from_slice(&v.to_le_bytes());
    }

    /// Reserve a length field; the section end is relative to the position
    /// just past the field.
    fn begin(&mut self) -> usize {
        let at = self.0.len();
        self.u32(0);
        at
    }

    fn end(&mut self, at: usize) {
        let len = (self.0.len() - (at + 4)) as u32;
        self.0[at..at + 4].copy_from_slice(&len.to_le_bytes());
    }
}

#[derive(Clone, Copy)]
struct Group {
    vertex_start_raw: u32,
    face_point_start: u32,
    face_point_count: u32,
}

enum Positions {
    F32(Vec<[f32; 3]>),
    U16(Vec<[u16; 4]>),
    Packed(Vec<u32>),
}

struct MeshFile {
    name: &'static str,
    version: u8,
    /// One inner vec per LOD.
    groups: Vec<Vec<Group>>,
    vertex_count: u32,
    vertex_flags: u32,
    /// Stored value; the decoder adds 1.
    position_format_raw: u32,
    /// Value written into the face buffer descriptor.
    face_points_declared: u32,
    face_buffer_count: u32,
    /// Stored zero-based; the decoder adds 1.
    faces: Vec<[u16; 3]>,
    /// Secondary face stream, present when `face_buffer_count` is 2.
    faces_b: Vec<[u16; 3]>,
    positions: Positions,
    clamp_min: [f32; 3],
    clamp_max: [f32; 3],
    orientation_triggers: [f32; 3],
}

impl MeshFile {
    /// Plain single-LOD, single-group, format-4 file with `n` vertices on
    /// the x axis and a triangle fan over them.
    fn basic(n: u16) -> Self {
        let faces: Vec<[u16; 3]> = (0..n - 2).map(|i| [0, i + 1, i + 2]).collect();
        let positions =
            Positions::F32((0..n).map(|i| [i as f32, i as f32 * 2.0, 0.5]).collect());
        Self {
            name: "crate01",
            version: 55,
            groups: vec![vec![Group {
                vertex_start_raw: 0,
                face_point_start: 0,
                face_point_count: faces.len() as u32 * 3,
            }]],
            vertex_count: n as u32,
            vertex_flags: 0,
            position_format_raw: 3,
            face_points_declared: faces.len() as u32 * 3,
            face_buffer_count: 1,
            faces,
            faces_b: Vec::new(),
            positions,
            clamp_min: [0.0; 3],
            clamp_max: [1.0; 3],
            orientation_triggers: [0.0; 3],
        }
    }

    fn build(&self) -> Vec<u8> {
        let mut b = Buf(Vec::new());

        // Header.
        b.u32(u32::from_be_bytes(*b"D3DM"));
        b.u32(0); // file size, informational
        b.u32(0);
        b.u32(0); // skipped 8 bytes
        b.u32(0); // param count
        b.u32(self.name.len() as u32); // name header length
        b.u32(self.name.len() as u32); // name length
        b.0.extend_from_slice(self.name.as_bytes());
        b.u8(self.version);

        // Section 1.
        for _ in 0..5 {
            b.u32(0);
        }

        // Section 2: no materials.
        b.u32(0);

        b.u32(0); // unk
        b.u8(0); // pad
        let face_data_len = b.begin(); // patched once face data is placed

        // Section 3.
        let s3 = b.begin();
        b.u32(self.groups.len() as u32);
        for lod_groups in &self.groups {
            b.u32(lod_groups.len() as u32);
            for g in lod_groups {
                let entry = b.begin();
                for _ in 0..6 {
                    b.f32(0.0); // bounds
                }
                b.u32(g.vertex_start_raw);
                b.u32(g.vertex_start_raw.wrapping_add(self.vertex_count));
                b.u32(g.face_point_start);
                b.u32(g.face_point_count);
                b.u32(0); // material index
                b.end(entry);
            }
            b.u32(0); // 3B count
            for _ in 0..13 {
                b.f32(0.0); // 3C scalars
            }
            b.u32(0); // 3C bone count
        }
        b.end(s3);

        // Sections 4..9: length + zero count.
        for _ in 0..6 {
            let s = b.begin();
            b.u32(0);
            b.end(s);
        }

        // Section 10 (model clamps).
        b.u32(0);
        for _ in 0..4 {
            b.u8(0); // flag bytes
        }
        for v in self.clamp_min {
            b.f32(v);
        }
        for v in self.clamp_max {
            b.f32(v);
        }
        b.u32(0); // sub length
        for _ in 0..4 {
            b.f32(0.0);
        }
        b.u32(0);
        for _ in 0..3 {
            b.f32(0.0);
        }
        for v in self.orientation_triggers {
            b.f32(v);
        }
        for _ in 0..3 {
            b.f32(0.0);
        }
        b.u32(0);
        b.u32(0);
        b.u32(0); // trailing hash pair

        // Section 11A.
        b.u32(self.vertex_count);
        b.u32(self.vertex_flags);
        let s11a = b.begin();
        b.u32(0);
        b.end(s11a);

        // Section 11B: no UV clamps.
        b.u32(0);

        if self.vertex_count == 0 {
            return b.0;
        }

        // Section 11C: flags 0x31 carries the vertex sub-buffer between its
        // header and the descriptor section it jumps to.
        if self.vertex_flags == 0x31 {
            for _ in 0..9 {
                b.u32(0);
            }
            let jump = b.begin();
            b.u32(0); // sub-buffer size
            for i in 0..self.vertex_count {
                for _ in 0..3 {
                    b.f32(0.0); // duplicate position data
                }
                for _ in 0..4 {
                    b.u8(i as u8); // bone indices
                }
                for _ in 0..8 {
                    b.u8(0);
                }
            }
            b.end(jump);
        }

        // Section 12.
        b.u32(0);
        b.u32(0);
        b.u32(self.face_buffer_count);
        b.u32(1); // buffer count 1
        b.u32(0); // buffer count 2
        // Position descriptor, all fields stored off by one.
        b.u32(0); // type 1
        b.u32(self.position_format_raw);
        b.u32(0); // layer 1
        b.u32(0); // buffer 1
        b.u32(0); // offset 1
        // Face buffer entries.
        if self.face_buffer_count >= 1 {
            b.u32(0);
            b.u32(0);
            b.u32(0);
            b.u32(self.face_points_declared);
            b.u32(self.face_points_declared * 2);
        }
        if self.face_buffer_count >= 2 {
            b.u32(0);
            b.u32(0);
            b.u32(0);
            b.u32(self.faces_b.len() as u32 * 3);
            b.u32(self.faces_b.len() as u32 * 6);
        }
        // Trailer: count 0 still reads one entry.
        for _ in 0..5 {
            b.u32(0);
        }

        // Face data (primary, then secondary), then positions.
        b.end(face_data_len);
        for f in self.faces.iter().chain(&self.faces_b) {
            b.u16(f[0]);
            b.u16(f[1]);
            b.u16(f[2]);
        }
        match &self.positions {
            Positions::F32(list) => {
                for p in list {
                    for v in p {
                        b.f32(*v);
                    }
                }
            }
            Positions::U16(list) => {
                for p in list {
                    for v in p {
                        b.u16(*v);
                    }
                }
            }
            Positions::Packed(list) => {
                for p in list {
                    b.u32(*p);
                }
            }
        }
        b.0
    }
}

#[test]
fn basic_single_lod_round_trip() {
    let file = MeshFile::basic(4);
    let records = decode(&file.build(), &ImportOptions::default()).unwrap();
    assert_eq!(records.len(), 1);
    let r = &records[0];
    assert_eq!(r.name, "crate01");
    assert_eq!(r.vertices.len(), 4);
    assert_eq!(r.faces.len(), 2);
    for face in &r.faces {
        for &i in face {
            assert!((1..=4).contains(&i), "face index {i} out of [1, 4]");
        }
    }
    assert_eq!(r.vertices[2], Vec3f { x: 2.0, y: 4.0, z: 0.5 });
    // Stored zero-based triples come back one-based.
    assert_eq!(r.faces[0], [1, 2, 3]);
}

#[test]
fn decoding_twice_is_identical() {
    let data = MeshFile::basic(5).build();
    let a = decode(&data, &ImportOptions::default()).unwrap();
    let b = decode(&data, &ImportOptions::default()).unwrap();
    assert_eq!(a.len(), b.len());
    for (ra, rb) in a.iter().zip(&b) {
        assert_eq!(ra.name, rb.name);
        assert_eq!(*ra.vertices, *rb.vertices);
        assert_eq!(ra.faces, rb.faces);
    }
}

#[test]
fn version_54_is_rejected_with_no_records() {
    let mut file = MeshFile::basic(4);
    file.version = 54;
    match decode(&file.build(), &ImportOptions::default()) {
        Err(DecodeError::UnsupportedVersion(54)) => {}
        other => panic!("expected version error, got {other:?}"),
    }
}

#[test]
fn zero_vertex_count_yields_empty_ok() {
    let mut file = MeshFile::basic(4);
    file.vertex_count = 0;
    file.faces.clear();
    let records = decode(&file.build(), &ImportOptions::default()).unwrap();
    assert!(records.is_empty());
}

#[test]
fn group_range_past_face_buffer_is_fatal() {
    let mut file = MeshFile::basic(4);
    // Group claims twice the polygons the face buffer holds.
    file.groups[0][0].face_point_count *= 2;
    match decode(&file.build(), &ImportOptions::default()) {
        Err(DecodeError::FaceRangeOutOfBounds { .. }) => {}
        other => panic!("expected bounds error, got {other:?}"),
    }
}

#[test]
fn split_groups_emit_numbered_records() {
    let mut file = MeshFile::basic(6);
    // Two groups of two polygons each over the same buffer.
    let g = Group { vertex_start_raw: 0, face_point_start: 0, face_point_count: 6 };
    file.groups = vec![vec![g, Group { face_point_start: 6, ..g }]];
    let options = ImportOptions { split_groups: true, ..Default::default() };
    let records = decode(&file.build(), &options).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name, "crate01_000");
    assert_eq!(records[1].name, "crate01_001");
    assert_eq!(records[0].faces.len(), 2);
    assert_eq!(records[1].faces.len(), 2);
}

#[test]
fn lods_are_dropped_unless_requested() {
    let mut file = MeshFile::basic(6);
    let g = Group { vertex_start_raw: 0, face_point_start: 0, face_point_count: 6 };
    file.groups = vec![vec![g], vec![Group { face_point_start: 6, ..g }]];
    let data = file.build();

    let first_only = decode(&data, &ImportOptions::default()).unwrap();
    assert_eq!(first_only.len(), 1);
    assert_eq!(first_only[0].name, "crate01");

    let options = ImportOptions { parse_lods: true, ..Default::default() };
    let all = decode(&data, &options).unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].name, "crate01");
    assert_eq!(all[1].name, "crate01 (LOD #1)");
}

#[test]
fn format_27_scales_by_clamps() {
    let mut file = MeshFile::basic(3);
    file.position_format_raw = 26; // format 27
    file.clamp_min = [-1.0, -1.0, -1.0];
    file.clamp_max = [1.0, 1.0, 1.0];
    file.positions = Positions::U16(vec![
        [65535, 0, 65535, 1234],
        [0, 65535, 0, 0],
        [65535, 65535, 0, 9999],
    ]);
    let records = decode(&file.build(), &ImportOptions::default()).unwrap();
    let v = &records[0].vertices;
    assert_eq!(v[0], Vec3f { x: 1.0, y: -1.0, z: 1.0 });
    assert_eq!(v[1], Vec3f { x: -1.0, y: 1.0, z: -1.0 });
    assert_eq!(v[2], Vec3f { x: 1.0, y: 1.0, z: -1.0 });
}

#[test]
fn format_42_unpacks_ten_bit_fields() {
    let mut file = MeshFile::basic(3);
    file.position_format_raw = 41; // format 42
    // Clamps chosen so post-scale equals the pre-scale field value.
    file.clamp_min = [0.0; 3];
    file.clamp_max = [1.0; 3];
    file.positions = Positions::Packed(vec![0, 0x3ff, 0x3ff << 20]);
    let records = decode(&file.build(), &ImportOptions::default()).unwrap();
    let v = &records[0].vertices;
    assert_eq!(v[0], Vec3f { x: 0.0, y: 0.0, z: 0.0 });
    assert_eq!(v[1], Vec3f { x: 1.0, y: 0.0, z: 0.0 });
    assert_eq!(v[2], Vec3f { x: 0.0, y: 0.0, z: 1.0 });
}

#[test]
fn unknown_position_format_fails_fast() {
    let mut file = MeshFile::basic(3);
    file.position_format_raw = 8; // format 9, no decoder
    match decode(&file.build(), &ImportOptions::default()) {
        Err(DecodeError::UnsupportedVertexFormat(9)) => {}
        other => panic!("expected format error, got {other:?}"),
    }
}

#[test]
fn unrecognized_vertex_flags_degrade_gracefully() {
    let mut file = MeshFile::basic(4);
    file.vertex_flags = 0x07;
    let records = decode(&file.build(), &ImportOptions::default()).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].faces.len(), 2);
}

#[test]
fn flags_0x31_sub_buffer_keeps_cursor_aligned() {
    // The sub-block, its jump to the descriptors and the sub-buffer read
    // must all leave the same geometry as a plain-flags file.
    let mut file = MeshFile::basic(4);
    file.vertex_flags = 0x31;
    let records = decode(&file.build(), &ImportOptions::default()).unwrap();
    assert_eq!(records.len(), 1);
    let r = &records[0];
    assert_eq!(r.vertices.len(), 4);
    assert_eq!(r.faces.len(), 2);
    assert_eq!(r.vertices[2], Vec3f { x: 2.0, y: 4.0, z: 0.5 });
    assert_eq!(r.faces[0], [1, 2, 3]);
}

#[test]
fn secondary_face_buffer_is_consumed_not_assembled() {
    let mut file = MeshFile::basic(4);
    file.face_buffer_count = 2;
    file.faces_b = vec![[0, 1, 2], [1, 2, 3], [0, 2, 3]];
    let records = decode(&file.build(), &ImportOptions::default()).unwrap();
    assert_eq!(records.len(), 1);
    // Primary geometry is unchanged and the positions that follow the
    // secondary stream still decode correctly.
    assert_eq!(records[0].faces.len(), 2);
    assert_eq!(records[0].vertices[3], Vec3f { x: 3.0, y: 6.0, z: 0.5 });
}

#[test]
fn zero_face_buffers_yield_an_empty_face_list() {
    let mut file = MeshFile::basic(4);
    file.face_buffer_count = 0;
    file.face_points_declared = 0;
    file.faces.clear();
    file.groups[0][0].face_point_count = 0;
    let records = decode(&file.build(), &ImportOptions::default()).unwrap();
    assert_eq!(records.len(), 1);
    assert!(records[0].faces.is_empty());
    assert_eq!(records[0].vertices.len(), 4);
}

#[test]
fn absurd_face_point_count_fails_with_eof() {
    let mut file = MeshFile::basic(4);
    file.face_points_declared = 0x3000_0000;
    match decode(&file.build(), &ImportOptions::default()) {
        Err(DecodeError::UnexpectedEof { .. }) => {}
        other => panic!("expected eof error, got {other:?}"),
    }
}

#[test]
fn absurd_vertex_count_fails_with_eof() {
    let mut file = MeshFile::basic(4);
    file.vertex_count = 0x2000_0000;
    match decode(&file.build(), &ImportOptions::default()) {
        Err(DecodeError::UnexpectedEof { .. }) => {}
        other => panic!("expected eof error, got {other:?}"),
    }
}

#[test]
fn max_vertex_start_wraps_without_panicking() {
    let mut file = MeshFile::basic(4);
    file.groups[0][0].vertex_start_raw = u32::MAX;
    assert!(decode(&file.build(), &ImportOptions::default()).is_ok());
}
