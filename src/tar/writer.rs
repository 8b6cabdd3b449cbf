//! Archive construction: accumulate entries, then emit one finalized buffer.

use std::fs;
use std::path::PathBuf;

use rayon::prelude::*;

use crate::error::{LockwhyError, Result};

use super::{
    round_up_block, write_octal, write_str, EntryKind, ARCHIVE_PAD, BLOCK_LEN, CHECKSUM_LEN,
    CHECKSUM_OFFSET, GID_LEN, GID_OFFSET, GNAME_LEN, GNAME_OFFSET, MAGIC_LEN, MAGIC_OFFSET,
    MODE_LEN, MODE_OFFSET, MTIME_LEN, MTIME_OFFSET, NAME_LEN, NAME_OFFSET, SIZE_LEN, SIZE_OFFSET,
    TYPEFLAG_OFFSET, UID_LEN, UID_OFFSET, UNAME_LEN, UNAME_OFFSET, VERSION_LEN, VERSION_OFFSET,
};

const DEFAULT_UID: u64 = 1000;
const DEFAULT_GID: u64 = 1000;
const DEFAULT_FILE_MODE: u32 = 0o664;
const DEFAULT_DIR_MODE: u32 = 0o775;
const DEFAULT_OWNER: &str = "lockwhy";

/// Per-entry header metadata. Every field is independently defaulted when absent:
/// uid/gid 1000, mode 0o664 for files and 0o775 for directories, mtime = now,
/// user/group "lockwhy".
#[derive(Debug, Clone, Default)]
pub struct EntryOptions {
    pub uid: Option<u64>,
    pub gid: Option<u64>,
    pub mode: Option<u32>,
    /// Unix timestamp in seconds.
    pub mtime: Option<i64>,
    pub user: Option<String>,
    pub group: Option<String>,
}

enum EntrySource {
    /// Content already in memory.
    Bytes(Vec<u8>),
    /// Lazily-read source, resolved at finalize time.
    Path(PathBuf),
    /// No content block (directories).
    None,
}

struct PendingEntry {
    name: String,
    kind: EntryKind,
    source: EntrySource,
    opts: EntryOptions,
}

/// Accumulates entries and produces a ustar archive buffer.
///
/// The writer has exactly two states: accumulating (add operations allowed) and
/// finalized. [`TarWriter::finalize`] consumes the writer, so the terminal state
/// is enforced by ownership; there is no unfinalize.
#[derive(Default)]
pub struct TarWriter {
    pending: Vec<PendingEntry>,
}

impl TarWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file entry whose content is `text` encoded as UTF-8.
    pub fn add_text_file(&mut self, name: &str, text: &str, opts: Option<EntryOptions>) {
        self.add_file_from_bytes(name, text.as_bytes().to_vec(), opts);
    }

    /// Adds a file entry with in-memory content.
    pub fn add_file_from_bytes(&mut self, name: &str, bytes: Vec<u8>, opts: Option<EntryOptions>) {
        self.pending.push(PendingEntry {
            name: name.to_string(),
            kind: EntryKind::File,
            source: EntrySource::Bytes(bytes),
            opts: opts.unwrap_or_default(),
        });
    }

    /// Adds a file entry backed by a file on disk, read when the archive is
    /// finalized.
    pub fn add_file_from_path(
        &mut self,
        name: &str,
        path: impl Into<PathBuf>,
        opts: Option<EntryOptions>,
    ) {
        self.pending.push(PendingEntry {
            name: name.to_string(),
            kind: EntryKind::File,
            source: EntrySource::Path(path.into()),
            opts: opts.unwrap_or_default(),
        });
    }

    /// Adds a zero-size directory entry.
    pub fn add_folder(&mut self, name: &str, opts: Option<EntryOptions>) {
        self.pending.push(PendingEntry {
            name: name.to_string(),
            kind: EntryKind::Directory,
            source: EntrySource::None,
            opts: opts.unwrap_or_default(),
        });
    }

    /// Number of entries added so far.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Produces the archive buffer, consuming the writer.
    ///
    /// Every lazily-read source is resolved to bytes before any header is
    /// written (file-backed sources are read in parallel; the write pass does
    /// not start until all of them have completed). If any source cannot be
    /// read, the whole buffer is abandoned and nothing partial is returned.
    ///
    /// Entries are emitted in insertion order: a 512-byte header, the content
    /// bytes zero-padded to the next block boundary, and the total buffer
    /// length rounded up to a multiple of 10240 bytes (at least one such
    /// block even for an empty archive).
    pub fn finalize(self) -> Result<Vec<u8>> {
        let resolved = self
            .pending
            .into_par_iter()
            .map(|entry| {
                let content = match entry.source {
                    EntrySource::Bytes(bytes) => bytes,
                    EntrySource::Path(path) => {
                        fs::read(&path).map_err(|source| LockwhyError::Io { source, path })?
                    }
                    EntrySource::None => Vec::new(),
                };
                Ok((entry.name, entry.kind, entry.opts, content))
            })
            .collect::<Result<Vec<_>>>()?;

        let data_len: usize = resolved
            .iter()
            .map(|(_, _, _, content)| BLOCK_LEN + round_up_block(content.len()))
            .sum();
        let total_len = data_len.div_ceil(ARCHIVE_PAD).max(1) * ARCHIVE_PAD;

        let mut buffer = vec![0u8; total_len];
        let mut offset = 0usize;
        for (name, kind, opts, content) in &resolved {
            write_header(
                &mut buffer[offset..offset + BLOCK_LEN],
                name,
                *kind,
                content.len(),
                opts,
            );
            buffer[offset + BLOCK_LEN..offset + BLOCK_LEN + content.len()]
                .copy_from_slice(content);
            offset += BLOCK_LEN + round_up_block(content.len());
        }

        Ok(buffer)
    }
}

/// Fills one 512-byte header block for an entry.
fn write_header(header: &mut [u8], name: &str, kind: EntryKind, size: usize, opts: &EntryOptions) {
    let mode = opts.mode.unwrap_or(match kind {
        EntryKind::Directory => DEFAULT_DIR_MODE,
        _ => DEFAULT_FILE_MODE,
    });
    let mtime = opts
        .mtime
        .unwrap_or_else(|| chrono::Utc::now().timestamp())
        .max(0) as u64;
    let user = opts.user.as_deref().unwrap_or(DEFAULT_OWNER);
    let group = opts.group.as_deref().unwrap_or(DEFAULT_OWNER);

    write_str(&mut header[NAME_OFFSET..NAME_OFFSET + NAME_LEN], name);
    write_octal(&mut header[MODE_OFFSET..MODE_OFFSET + MODE_LEN], mode as u64);
    write_octal(
        &mut header[UID_OFFSET..UID_OFFSET + UID_LEN],
        opts.uid.unwrap_or(DEFAULT_UID),
    );
    write_octal(
        &mut header[GID_OFFSET..GID_OFFSET + GID_LEN],
        opts.gid.unwrap_or(DEFAULT_GID),
    );
    write_octal(&mut header[SIZE_OFFSET..SIZE_OFFSET + SIZE_LEN], size as u64);
    write_octal(&mut header[MTIME_OFFSET..MTIME_OFFSET + MTIME_LEN], mtime);
    header[TYPEFLAG_OFFSET] = kind.flag();
    write_str(&mut header[MAGIC_OFFSET..MAGIC_OFFSET + MAGIC_LEN], "ustar");
    write_str(
        &mut header[VERSION_OFFSET..VERSION_OFFSET + VERSION_LEN],
        "00",
    );
    write_str(&mut header[UNAME_OFFSET..UNAME_OFFSET + UNAME_LEN], user);
    write_str(&mut header[GNAME_OFFSET..GNAME_OFFSET + GNAME_LEN], group);

    // Two-pass checksum required by the format: the field counts as spaces
    // while the header bytes are summed, then receives the unpadded octal sum.
    header[CHECKSUM_OFFSET..CHECKSUM_OFFSET + CHECKSUM_LEN].fill(b' ');
    let sum: u32 = header.iter().map(|&b| b as u32).sum();
    write_str(
        &mut header[CHECKSUM_OFFSET..CHECKSUM_OFFSET + CHECKSUM_LEN],
        &format!("{sum:o}"),
    );
}
