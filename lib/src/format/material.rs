//! Material section (Section 2) decoding.
//!
//! Material parameter blocks are keyed by [`SplitHash`] tags whose meanings
//! are known only empirically. Each tag implies a fixed per-repeat record
//! layout; tags we do not recognize are left unconsumed and the unconditional
//! seek to the material's precomputed header end resynchronizes the cursor.

use crate::{
    error::Result,
    format::{hashdb::HashDatabase, SplitHash},
    util::read::Reader,
};

/// One material block. Retained only for the duration of the decode pass so
/// polygon groups can be cross-referenced against it.
#[derive(Debug, Clone)]
pub struct MaterialRecord {
    pub hash: SplitHash,
    pub unk_hash: SplitHash,
    /// Resolved (or placeholder) texture name. Only the last texture
    /// reference read for the material survives here, matching the observed
    /// importer behavior.
    pub tex_dif_name: String,
}

/// Parameter tag: repeat × four hash fields.
pub const PARAM_HASH_BLOCK: SplitHash = SplitHash::new(0x004f0234, 0x63d89fb0);
/// Parameter tag: repeat × (hash pair + one float).
pub const PARAM_HASH_SCALAR: SplitHash = SplitHash::new(0xbae4cbd7, 0x7f139a91);
/// Parameter tag: repeat × (hash pair + one pad byte).
pub const PARAM_HASH_PADDED: SplitHash = SplitHash::new(0x9004c558, 0x7575d6c0);
/// Parameter tag: repeat × (type hash pair + texture hash pair). The type
/// pair is classified through the type catalog, the texture pair resolved
/// through the texture name database.
pub const PARAM_TEXTURE_REFS: SplitHash = SplitHash::new(0x8b8a2a81, 0x3a35ac91);

enum ParamShape {
    HashBlock,
    HashScalar,
    HashPadded,
    TextureRefs,
}

fn param_shape(tag: SplitHash) -> Option<ParamShape> {
    match tag {
        t if t == PARAM_HASH_BLOCK => Some(ParamShape::HashBlock),
        t if t == PARAM_HASH_SCALAR => Some(ParamShape::HashScalar),
        t if t == PARAM_HASH_PADDED => Some(ParamShape::HashPadded),
        t if t == PARAM_TEXTURE_REFS => Some(ParamShape::TextureRefs),
        _ => None,
    }
}

/// Per-tag relative-seek corrections for specific malformed files observed in
/// the wild. These are exact deltas applied at the point the tag is read, not
/// a general repair heuristic.
const QUIRK_SEEKS: &[(SplitHash, i64)] = &[
    (SplitHash::new(0x1f4d9c32, 0x52a8f0be), -4),
    (SplitHash::new(0x7e3c11d5, 0x0d6f44a0), 4),
    (SplitHash::new(0xc19a0e77, 0x95d2b3f4), 8),
    (SplitHash::new(0x66e0d4fb, 0x218c7a59), 12),
];

fn quirk_seek(tag: SplitHash) -> Option<i64> {
    QUIRK_SEEKS.iter().find(|(t, _)| *t == tag).map(|&(_, d)| d)
}

/// Classification of texture-parameter type tags into a semantic category
/// and sub-slot label, e.g. `("Diffuse", "Map")` or `("Normal", "Map B")`.
/// The table is compiled in; unknown hashes classify as `None` and never
/// fail decoding.
pub fn classify(tag: SplitHash) -> Option<(&'static str, &'static str)> {
    TYPE_CATALOG.iter().find(|(t, _, _)| *t == tag).map(|&(_, c, s)| (c, s))
}

pub const TYPE_DIFFUSE_MAP: SplitHash = SplitHash::new(0x1f6a9d2c, 0x8a3e54b7);
pub const TYPE_NORMAL_MAP: SplitHash = SplitHash::new(0x5be2c104, 0x9d01e7a3);

static TYPE_CATALOG: &[(SplitHash, &str, &str)] = &[
    (TYPE_DIFFUSE_MAP, "Diffuse", "Map"),
    (SplitHash::new(0x2c81f05e, 0x44b09aa2), "Diffuse", "Map A"),
    (SplitHash::new(0x90da3746, 0x1ce5b88f), "Diffuse", "Map B"),
    (SplitHash::new(0x7a55c1d0, 0xe33f602b), "Detail", "Map"),
    (SplitHash::new(0x06c9be14, 0xfa80d273), "Detail", "Map B"),
    (TYPE_NORMAL_MAP, "Normal", "Map"),
    (SplitHash::new(0xc77f2b39, 0x3018d94e), "Normal", "Map B"),
    (SplitHash::new(0xe80451a6, 0x72cc93d1), "Specular", "Map"),
    (SplitHash::new(0x3915fdc8, 0xab6720e4), "Specular", "Map B"),
    (SplitHash::new(0x84ce06b2, 0x5f13a97d), "Gloss", "Map"),
    (SplitHash::new(0x11d7e48f, 0xc8564b0a), "Environment", "Map"),
    (SplitHash::new(0xfd29a073, 0x64e1cb58), "Environment", "Map B"),
    (SplitHash::new(0x48b35e91, 0x07af16dc), "Reflection", "Map"),
    (SplitHash::new(0xa60c82f7, 0xd19b3045), "Ink", "Map"),
    (SplitHash::new(0x5df4703a, 0x2e68a5b9), "Outline", "Map"),
    (SplitHash::new(0xb82d194c, 0x91c6ef02), "Occlusion", "Map"),
    (SplitHash::new(0x23f0c6a5, 0x7b52d816), "Lightmap", "Map"),
    (SplitHash::new(0xce1b57d9, 0x40a9f3e8), "Lightmap", "Map B"),
    (SplitHash::new(0x6745a20e, 0x1d38cb94), "Emissive", "Map"),
    (SplitHash::new(0xf1903d6b, 0x8e07562a), "Bump", "Map"),
    (SplitHash::new(0x09ae84f2, 0x53bd10c7), "Height", "Map"),
    (SplitHash::new(0x9267cb15, 0xaf42e98d), "Opacity", "Map"),
    (SplitHash::new(0x3eb8106a, 0x6c95d4f1), "Opacity", "Map B"),
    (SplitHash::new(0xd54a79c3, 0x1806ab5e), "Decal", "Map"),
    (SplitHash::new(0x70e3f528, 0xc4d19b06), "Decal", "Map B"),
    (SplitHash::new(0x8c16ad4f, 0x2f70e6b3), "Ambient", "Map"),
    (SplitHash::new(0x41d20e97, 0xb3c858fa), "Shadow", "Map"),
    (SplitHash::new(0xba7f634d, 0x05e92c71), "Toon", "Map"),
    (SplitHash::new(0x1608d9be, 0x97a4f025), "Toon", "Map B"),
    (SplitHash::new(0xe5bc428a, 0x6a1d73c9), "Rim", "Map"),
    (SplitHash::new(0x52971fe0, 0xd8b60a34), "Wrinkle", "Map"),
    (SplitHash::new(0x0d40c87b, 0x312e95df), "Wrinkle", "Map B"),
    (SplitHash::new(0xa8f5361c, 0xfc4b20e6), "Flow", "Map"),
    (SplitHash::new(0x3b09ed52, 0x85d7c14a), "Noise", "Map"),
    (SplitHash::new(0xc6d2a08f, 0x4e10b79d), "Noise", "Map B"),
    (SplitHash::new(0x795e14b0, 0xa2386cf5), "Mask", "Map"),
    (SplitHash::new(0x24c1fb69, 0x09e5d823), "Mask", "Map B"),
    (SplitHash::new(0x9f38507e, 0x67bc41a8), "Tint", "Map"),
    (SplitHash::new(0x62a4c93d, 0xd50f8e12), "Sheen", "Map"),
    (SplitHash::new(0xeb17862f, 0x38921d57), "Iris", "Map"),
];

/// Decode Section 2 (materials). The cursor must sit on the material count;
/// on return it sits just past the last material's header end.
pub(crate) fn read_materials(
    r: &mut Reader<'_>,
    tex_db: Option<&HashDatabase>,
) -> Result<Vec<MaterialRecord>> {
    let count = r.read_u32()?;
    log::debug!("Section 2 (materials) start @{:#x}, count {count}", r.position());
    let mut materials = Vec::with_capacity(count.min(1024) as usize);
    for m in 0..count {
        let mat_start = r.position();
        let hash = SplitHash::read(r)?;
        let unk_hash = SplitHash::read(r)?;
        let header_len = r.read_u32()? as usize;
        let header_end = r.position() + header_len;
        let _unk1 = r.read_u32()?;
        let _unk2 = r.read_u32()?;
        let _header_len_b = r.read_u32()?;
        let sub_hash_count = r.read_u32()?;
        r.seek_rel(sub_hash_count as i64 * 8);
        let param_count = r.read_u32()?;
        log::debug!(
            "Material #{} {hash} start @{mat_start:#x}, header end @{header_end:#x}, {param_count} params",
            m + 1
        );

        let mut tex_dif_name = String::from("undefined");
        for _ in 0..param_count {
            let tag = SplitHash::read(r)?;
            let repeat = r.read_u32()?;
            if let Some(delta) = quirk_seek(tag) {
                log::debug!("Applying quirk seek {delta:+} for parameter tag {tag}");
                r.seek_rel(delta);
                continue;
            }
            match param_shape(tag) {
                Some(ParamShape::HashBlock) => {
                    for _ in 0..repeat {
                        r.read_bytes(16)?;
                    }
                }
                Some(ParamShape::HashScalar) => {
                    for _ in 0..repeat {
                        SplitHash::read(r)?;
                        r.read_f32()?;
                    }
                }
                Some(ParamShape::HashPadded) => {
                    for _ in 0..repeat {
                        SplitHash::read(r)?;
                        r.read_u8()?;
                    }
                }
                Some(ParamShape::TextureRefs) => {
                    for _ in 0..repeat {
                        let type_tag = SplitHash::read(r)?;
                        let tex_hash = SplitHash::read(r)?;
                        let (category, slot) = classify(type_tag).unwrap_or(("Unknown", "?"));
                        let name = match tex_db {
                            Some(db) => db.name_or_placeholder(tex_hash),
                            None => tex_hash.placeholder_name(),
                        };
                        log::debug!("Material #{} {category}/{slot} texture: {name}", m + 1);
                        // Source quirk: only the last texture read is kept.
                        tex_dif_name = name;
                    }
                }
                None => {
                    log::warn!(
                        "Unknown material parameter tag {tag} (count {repeat}) @{:#x}",
                        r.position()
                    );
                    // Bytes of unhandled parameter kinds are not consumed
                    // field-by-field; the seek below skips them wholesale.
                }
            }
        }
        r.seek_abs(header_end);
        materials.push(MaterialRecord { hash, unk_hash, tex_dif_name });
    }
    log::debug!("Section 2 (materials) end @{:#x}", r.position());
    Ok(materials)
}
