//! Hash-to-name lookup databases.
//!
//! Telltale content is addressed by [`SplitHash`] values; two externally
//! supplied databases (bone names and texture names) map those hashes back to
//! human-readable strings. Databases are loaded once and immutable afterward,
//! so they can be shared read-only across concurrent file decodes. Whether
//! the blob came from the raw database file or from a caller-side cache is
//! indistinguishable here.

use std::collections::HashMap;

use crate::{format::SplitHash, util::read::Reader};

/// Blob format: u32 entry count, then per entry a `(hash2, hash1)` u32 pair
/// followed by a NUL-terminated name.
#[derive(Debug, Default, Clone)]
pub struct HashDatabase {
    entries: HashMap<SplitHash, String>,
}

impl HashDatabase {
    /// Load a database blob. The declared count may legitimately exceed what
    /// is actually present: loading stops early, without error, when fewer
    /// than 9 bytes remain for the next entry (the smallest possible entry
    /// is two hashes plus an empty name's terminator) or when a trailing
    /// entry is missing its terminator. Partial loads are valid databases.
    pub fn load(data: &[u8]) -> Self {
        let mut r = Reader::new(data);
        let Ok(count) = r.read_u32() else {
            return Self::default();
        };
        // The declared count is untrusted; a 9-byte minimum per entry bounds
        // how many the blob can actually hold.
        let cap = (count as usize).min(r.remaining() / 9);
        let mut entries = HashMap::with_capacity(cap);
        for _ in 0..count {
            if r.remaining() < 9 {
                break;
            }
            // Stream order is hash2 then hash1; remaining() was checked.
            let Ok(hash) = SplitHash::read(&mut r) else { break };
            let Ok(name) = r.read_cstring() else { break };
            entries.insert(hash, name);
        }
        if entries.len() < count as usize {
            log::debug!("Hash database truncated: {} of {} entries present", entries.len(), count);
        }
        Self { entries }
    }

    #[inline]
    pub fn lookup(&self, hash: SplitHash) -> Option<&str> {
        self.entries.get(&hash).map(String::as_str)
    }

    /// Resolved name, or the hex placeholder for absent entries.
    pub fn name_or_placeholder(&self, hash: SplitHash) -> String {
        match self.lookup(hash) {
            Some(name) => name.to_owned(),
            None => hash.placeholder_name(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize { self.entries.len() }

    #[inline]
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (SplitHash, &str)> {
        self.entries.iter().map(|(h, n)| (*h, n.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(buf: &mut Vec<u8>, hash: SplitHash, name: &str) {
        buf.extend_from_slice(&hash.hash2.to_le_bytes());
        buf.extend_from_slice(&hash.hash1.to_le_bytes());
        buf.extend_from_slice(name.as_bytes());
        buf.push(0);
    }

    fn blob(count: u32, names: &[(SplitHash, &str)]) -> Vec<u8> {
        let mut buf = count.to_le_bytes().to_vec();
        for &(hash, name) in names {
            entry(&mut buf, hash, name);
        }
        buf
    }

    #[test]
    fn load_and_lookup() {
        let a = SplitHash::new(0x1111, 0x2222);
        let b = SplitHash::new(0x3333, 0x4444);
        let db = HashDatabase::load(&blob(2, &[(a, "adv_env_door"), (b, "sk55_gromit")]));
        assert_eq!(db.len(), 2);
        assert_eq!(db.lookup(a), Some("adv_env_door"));
        assert_eq!(db.lookup(b), Some("sk55_gromit"));
        assert_eq!(db.lookup(SplitHash::new(9, 9)), None);
    }

    #[test]
    fn declared_count_exceeding_data_is_not_an_error() {
        // Count claims 5 entries, only 3 are present.
        let names: Vec<(SplitHash, &str)> =
            (0..3u32).map(|i| (SplitHash::new(i, i + 100), "tex")).collect();
        let db = HashDatabase::load(&blob(5, &names));
        assert_eq!(db.len(), 3);
    }

    #[test]
    fn entry_missing_terminator_truncates() {
        let a = SplitHash::new(1, 2);
        let mut buf = blob(2, &[(a, "ok")]);
        // Second entry: hashes plus an unterminated name.
        buf.extend_from_slice(&5u32.to_le_bytes());
        buf.extend_from_slice(&6u32.to_le_bytes());
        buf.extend_from_slice(b"cut");
        let db = HashDatabase::load(&buf);
        assert_eq!(db.len(), 1);
        assert_eq!(db.lookup(a), Some("ok"));
    }

    #[test]
    fn absurd_declared_count_does_not_reserve() {
        // Count claims u32::MAX entries over a single real one; loading must
        // stay proportional to the data, not the claim.
        let a = SplitHash::new(0xa, 0xb);
        let db = HashDatabase::load(&blob(u32::MAX, &[(a, "lone")]));
        assert_eq!(db.len(), 1);
        assert_eq!(db.lookup(a), Some("lone"));
    }

    #[test]
    fn placeholder_on_miss() {
        let db = HashDatabase::load(&blob(0, &[]));
        assert_eq!(db.name_or_placeholder(SplitHash::new(0xbeef, 0xcafe)), "beefcafe");
    }

    #[test]
    fn empty_blob() {
        assert!(HashDatabase::load(&[]).is_empty());
    }
}
