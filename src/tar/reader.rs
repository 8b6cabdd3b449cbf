//! Sequential ustar header walk over an in-memory buffer.

use super::{
    parse_octal, read_str, EntryInfo, EntryKind, BLOCK_LEN, NAME_LEN, NAME_OFFSET, SIZE_LEN,
    SIZE_OFFSET, TYPEFLAG_OFFSET,
};

/// A read-only view over a tar byte buffer.
///
/// Parsing happens once, at construction, and never fails: an empty name field
/// or fewer than 512 remaining bytes both signal end-of-archive, so trailing
/// zero blocks and truncated garbage are treated as a clean end rather than an
/// error. Entries keep their physical archive order.
pub struct TarReader {
    buffer: Vec<u8>,
    entries: Vec<EntryInfo>,
}

impl TarReader {
    /// Parses `buffer` into an entry directory.
    pub fn new(buffer: Vec<u8>) -> Self {
        let mut entries = Vec::new();
        let mut offset = 0usize;

        while offset + BLOCK_LEN <= buffer.len() {
            let header = &buffer[offset..offset + BLOCK_LEN];

            let name = read_str(&header[NAME_OFFSET..NAME_OFFSET + NAME_LEN]);
            if name.is_empty() {
                // End of archive: the trailing padding is all-zero blocks.
                break;
            }

            let kind = EntryKind::from_flag(header[TYPEFLAG_OFFSET]);
            let size = parse_octal(&header[SIZE_OFFSET..SIZE_OFFSET + SIZE_LEN]);

            entries.push(EntryInfo {
                name,
                kind,
                size,
                header_offset: offset,
            });

            offset += BLOCK_LEN + super::round_up_block(size);
        }

        Self { buffer, entries }
    }

    /// The parsed entries, in physical archive order.
    pub fn entries(&self) -> &[EntryInfo] {
        &self.entries
    }

    /// Finds the first entry named `name`.
    ///
    /// First match wins: with duplicate names, later entries are unreachable by
    /// name lookup (tar's append-only semantics).
    pub fn find(&self, name: &str) -> Option<&EntryInfo> {
        self.entries.iter().find(|info| info.name == name)
    }

    /// Returns the raw content bytes of the first entry named `name`.
    pub fn get_file_binary(&self, name: &str) -> Option<&[u8]> {
        self.find(name).map(|info| self.content(info))
    }

    /// Returns the content of the first entry named `name`, decoded as UTF-8
    /// text (lossy).
    pub fn get_text_file(&self, name: &str) -> Option<String> {
        self.get_file_binary(name)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    /// Content bytes for `info`: the `size` bytes following the header block,
    /// excluding the zero padding up to the next block boundary.
    pub fn content(&self, info: &EntryInfo) -> &[u8] {
        let start = (info.header_offset + BLOCK_LEN).min(self.buffer.len());
        // A header may claim more content than the buffer holds; clamp rather
        // than panic, the walk above already stopped at the claimed length.
        let end = (start + info.size).min(self.buffer.len());
        &self.buffer[start..end]
    }

    /// Total length of the underlying buffer.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
