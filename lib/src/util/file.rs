use std::{fs::File, io, path::Path};

use memmap2::{Mmap, MmapOptions};

/// Opens a memory mapped file.
pub fn map_file<P: AsRef<Path>>(path: P) -> io::Result<Mmap> {
    let file = File::open(&path).map_err(|e| {
        io::Error::new(e.kind(), format!("Failed to open file '{}': {e}", path.as_ref().display()))
    })?;
    let map = unsafe { MmapOptions::new().map(&file) }.map_err(|e| {
        io::Error::new(e.kind(), format!("Failed to mmap file '{}': {e}", path.as_ref().display()))
    })?;
    Ok(map)
}
