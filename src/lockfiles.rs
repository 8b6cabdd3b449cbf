//! # Lockfiles Archive
//!
//! Acquisition and indexing of the bundled lockfiles archive: a gzip-compressed
//! ustar stream containing one `yarn.lock` per repository, named
//! `<repository>/yarn.lock`.
//!
//! The transport (local file or HTTP) and the gzip layer live here; the tar
//! layer only ever sees a plain byte buffer.

use std::collections::BTreeMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{LockwhyError, Result};
use crate::tar::{TarReader, TarWriter};

/// File name the archive producer collects, one per repository.
pub const LOCKFILE_NAME: &str = "yarn.lock";

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Repository name → lockfile text, in deterministic (sorted) order.
pub type LockfilesMap = BTreeMap<String, String>;

/// Loads a lockfiles archive from a local path or an `http(s)://` URL and
/// builds the repository map.
pub fn load(source: &str) -> Result<LockfilesMap> {
    let raw = fetch_bytes(source)?;
    let reader = TarReader::new(decompress(raw)?);
    let map = lockfiles_map(&reader);
    info!(repositories = map.len(), source, "loaded lockfiles archive");
    Ok(map)
}

fn fetch_bytes(source: &str) -> Result<Vec<u8>> {
    if source.starts_with("http://") || source.starts_with("https://") {
        debug!(url = source, "fetching lockfiles archive");
        let response = ureq::get(source)
            .call()
            .map_err(|e| LockwhyError::Http(Box::new(e)))?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| LockwhyError::io(e, source))?;
        Ok(bytes)
    } else {
        fs::read(source).map_err(|e| LockwhyError::io(e, source))
    }
}

/// Gunzips `bytes` when they carry the gzip magic; plain (already-decompressed)
/// buffers pass through untouched so `.tar` inputs work too.
pub fn decompress(bytes: Vec<u8>) -> Result<Vec<u8>> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(bytes);
    }
    let mut decoder = GzDecoder::new(&bytes[..]);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).map_err(LockwhyError::Gzip)?;
    Ok(out)
}

/// Builds the repository map from a parsed archive.
///
/// Only file entries are considered. The repository name is the entry name with
/// a trailing `/yarn.lock` stripped; entries without that suffix keep their
/// full name. Content is resolved by name lookup, so with duplicate names the
/// first occurrence wins.
pub fn lockfiles_map(reader: &TarReader) -> LockfilesMap {
    reader
        .entries()
        .iter()
        .filter(|info| info.kind.is_file())
        .map(|info| {
            let repo = info
                .name
                .strip_suffix(&format!("/{LOCKFILE_NAME}"))
                .unwrap_or(&info.name)
                .to_string();
            let text = reader.get_text_file(&info.name).unwrap_or_default();
            (repo, text)
        })
        .collect()
}

/// Builds a gzip-compressed lockfiles archive from a directory tree.
///
/// Walks `root` for files named `yarn.lock`, stores each under its
/// `/`-separated path relative to `root`, and writes the finished `.tar.gz` to
/// `output`. Returns the number of lockfiles packed.
pub fn pack(root: &Path, output: &Path) -> Result<usize> {
    let mut found: Vec<(String, PathBuf)> = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| LockwhyError::Other(Box::new(e)))?;
        if entry.file_type().is_file() && entry.file_name() == LOCKFILE_NAME {
            let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let name = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            found.push((name, entry.path().to_path_buf()));
        }
    }

    let mut writer = TarWriter::new();
    for (name, path) in &found {
        writer.add_file_from_path(name, path, None);
    }
    let buffer = writer.finalize()?;

    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&buffer).map_err(LockwhyError::Gzip)?;
    let compressed = encoder.finish().map_err(LockwhyError::Gzip)?;
    fs::write(output, compressed).map_err(|e| LockwhyError::io(e, output))?;

    info!(
        lockfiles = found.len(),
        output = %output.display(),
        "packed lockfiles archive"
    );
    Ok(found.len())
}
