use thiserror::Error;

/// Failure modes for a single mesh file decode.
///
/// Unrecognized-but-skippable content (unknown material parameter tags,
/// vertex type/layer combos, UV layer indices, vertex flag values) is never
/// an error; the format's section length fields make such content skippable
/// and the decoder only logs it. Everything in this enum is fatal for the
/// file it occurred in, and callers batch-processing multiple files should
/// isolate failures per file.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A fixed-width read ran past the available bytes.
    #[error("unexpected end of input at {offset:#x}: needed {needed} bytes, {available} available")]
    UnexpectedEof { offset: usize, needed: usize, available: usize },
    /// The header version byte is the format's single compatibility gate.
    #[error("unsupported d3dmesh version {0}, only version 55 is supported")]
    UnsupportedVersion(u8),
    /// A polygon group referenced faces outside the decoded face buffer.
    /// This indicates a parsing desynchronization upstream and is reported
    /// loudly instead of being clamped.
    #[error("polygon group for LOD {lod} spans face triples {start}..{end}, face buffer holds {len}")]
    FaceRangeOutOfBounds { lod: u32, start: usize, end: usize, len: usize },
    /// The vertex buffer descriptors declared a position format we have no
    /// decoding for. The loop behavior for such files is unknown, so the
    /// decoder fails fast rather than zero-filling.
    #[error("unsupported vertex position format {0}")]
    UnsupportedVertexFormat(u32),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] binrw::Error),
}

pub type Result<T, E = DecodeError> = std::result::Result<T, E>;
