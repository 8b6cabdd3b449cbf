use lockwhy::tar::{EntryKind, TarReader, TarWriter, ARCHIVE_PAD, BLOCK_LEN};

/// Round-trip: everything added to a writer comes back from the reader with
/// identical names, kinds, sizes, order and content.
#[test]
fn round_trip_preserves_entries_and_content() -> Result<(), Box<dyn std::error::Error>> {
    let payload_512 = vec![0xA5u8; 512];
    let payload_513 = vec![0x5Au8; 513];

    let mut writer = TarWriter::new();
    writer.add_folder("repos", None);
    writer.add_text_file("repos/app/yarn.lock", "react@^19.0.0:\n  version \"19.0.0\"\n", None);
    writer.add_file_from_bytes("repos/blob-512.bin", payload_512.clone(), None);
    writer.add_file_from_bytes("repos/blob-513.bin", payload_513.clone(), None);
    writer.add_text_file("repos/empty.txt", "", None);
    let buffer = writer.finalize()?;

    assert_eq!(buffer.len() % ARCHIVE_PAD, 0);

    let reader = TarReader::new(buffer);
    let entries = reader.entries();

    let expected = [
        ("repos", EntryKind::Directory, 0usize),
        ("repos/app/yarn.lock", EntryKind::File, 34),
        ("repos/blob-512.bin", EntryKind::File, 512),
        ("repos/blob-513.bin", EntryKind::File, 513),
        ("repos/empty.txt", EntryKind::File, 0),
    ];
    assert_eq!(entries.len(), expected.len());
    for (entry, (name, kind, size)) in entries.iter().zip(expected.iter()) {
        assert_eq!(entry.name, *name);
        assert_eq!(entry.kind, *kind);
        assert_eq!(entry.size, *size);
    }

    assert_eq!(
        reader.get_text_file("repos/app/yarn.lock").as_deref(),
        Some("react@^19.0.0:\n  version \"19.0.0\"\n")
    );
    assert_eq!(reader.get_file_binary("repos/blob-512.bin"), Some(&payload_512[..]));
    assert_eq!(reader.get_file_binary("repos/blob-513.bin"), Some(&payload_513[..]));
    assert_eq!(reader.get_text_file("repos/empty.txt").as_deref(), Some(""));
    Ok(())
}

/// Padding invariant: each header starts 512 + ceil(size/512)*512 bytes after
/// the previous one, and the tail past the last entry is all zero padding.
#[test]
fn header_offsets_follow_padded_sizes() -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = TarWriter::new();
    writer.add_text_file("one", &"x".repeat(1), None);
    writer.add_text_file("two", &"y".repeat(511), None);
    writer.add_text_file("three", &"z".repeat(1025), None);
    writer.add_folder("dir", None);
    let buffer = writer.finalize()?;
    let total = buffer.len();

    let reader = TarReader::new(buffer);
    let entries = reader.entries();

    for pair in entries.windows(2) {
        let expected = BLOCK_LEN + pair[0].size.div_ceil(BLOCK_LEN) * BLOCK_LEN;
        assert_eq!(pair[1].header_offset - pair[0].header_offset, expected);
    }

    let last = &entries[entries.len() - 1];
    let data_end = last.header_offset + BLOCK_LEN + last.size.div_ceil(BLOCK_LEN) * BLOCK_LEN;
    assert!(data_end <= total);
    Ok(())
}

#[test]
fn lookup_miss_is_none_not_an_error() -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = TarWriter::new();
    writer.add_text_file("a.txt", "aaa", None);
    writer.add_text_file("b.txt", "bbb", None);
    let reader = TarReader::new(writer.finalize()?);

    assert!(reader.get_text_file("missing").is_none());
    assert!(reader.get_file_binary("missing").is_none());
    assert!(reader.find("missing").is_none());
    Ok(())
}

/// Duplicate names: both entries are listed, but name lookup returns the
/// first occurrence's content (tar's append-only semantics).
#[test]
fn duplicate_names_first_occurrence_wins() -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = TarWriter::new();
    writer.add_text_file("dup.txt", "first", None);
    writer.add_text_file("dup.txt", "second", None);
    let reader = TarReader::new(writer.finalize()?);

    assert_eq!(reader.entries().len(), 2);
    assert_eq!(reader.get_text_file("dup.txt").as_deref(), Some("first"));
    Ok(())
}

/// Names up to the full 100-byte field width survive the round trip.
#[test]
fn hundred_byte_name_round_trips() -> Result<(), Box<dyn std::error::Error>> {
    let name = "n".repeat(100);
    let mut writer = TarWriter::new();
    writer.add_text_file(&name, "content", None);
    let reader = TarReader::new(writer.finalize()?);

    assert_eq!(reader.entries()[0].name, name);
    assert_eq!(reader.get_text_file(&name).as_deref(), Some("content"));
    Ok(())
}

/// A reader over another producer's trailing-zero convention: appending extra
/// zero blocks beyond the 10240 padding still parses to the same entries.
#[test]
fn extra_trailing_zero_blocks_are_tolerated() -> Result<(), Box<dyn std::error::Error>> {
    let mut writer = TarWriter::new();
    writer.add_text_file("a.txt", "hello", None);
    let mut buffer = writer.finalize()?;
    buffer.extend(std::iter::repeat(0u8).take(4 * BLOCK_LEN));

    let reader = TarReader::new(buffer);
    assert_eq!(reader.entries().len(), 1);
    assert_eq!(reader.get_text_file("a.txt").as_deref(), Some("hello"));
    Ok(())
}
