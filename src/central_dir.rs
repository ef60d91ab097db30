//! End-of-central-directory parsing and central-directory record iteration
//! (spec §4.3, §4.4).

use crate::byte_source::{read_u16_le, read_u32_le, ByteSource};
use crate::entry::{dos_time_to_unix, Entry, ResolveState};
use crate::eocd::find_eocd;
use crate::error::{Error, Result};

const CENTRAL_DIR_SIGNATURE: u32 = 0x0201_4B50;

/// Outcome of parsing the EOCD record: where the central directory starts
/// (already fixed up for prepended bytes), how many entries it holds, and
/// the prepended-byte count itself (`data_start`), which every local-header
/// offset must also be adjusted by.
struct EocdFields {
    total_entries: u16,
    central_dir_offset: u32,
    data_start: u32,
}

/// Validates the EOCD record and computes the prepended-data fix-up
/// (spec §4.3). `src`'s cursor is left wherever the last read leaves it;
/// callers seek explicitly before using it further.
fn parse_eocd(src: &mut dyn ByteSource) -> Result<EocdFields> {
    let eocd = find_eocd(src)?;
    src.seek(eocd.offset)?;

    let signature = read_u32_le(src)?;
    if signature != 0x0605_4B50 {
        return Err(Error::NotAnArchive);
    }

    let disk_number = read_u16_le(src)?;
    let disk_with_central_dir = read_u16_le(src)?;
    if disk_number != 0 || disk_with_central_dir != 0 {
        return Err(Error::unsupported("spanned (multi-disk) archive"));
    }

    let entries_on_this_disk = read_u16_le(src)?;
    let total_entries = read_u16_le(src)?;
    if entries_on_this_disk != total_entries {
        return Err(Error::unsupported(
            "entries-on-disk count disagrees with total entry count",
        ));
    }

    let central_dir_size = read_u32_le(src)?;
    let central_dir_offset_raw = read_u32_le(src)?;
    if eocd.offset < central_dir_offset_raw as u64 + central_dir_size as u64 {
        return Err(Error::unsupported(
            "end-of-central-directory precedes the central directory it points at",
        ));
    }

    let comment_length = read_u16_le(src)?;
    if eocd.offset + 22 + comment_length as u64 != eocd.file_length {
        return Err(Error::unsupported(
            "archive comment length disagrees with the file's actual length",
        ));
    }

    let data_start = (eocd.offset - (central_dir_offset_raw as u64 + central_dir_size as u64)) as u32;
    let central_dir_offset = central_dir_offset_raw + data_start;

    log::debug!(
        "eocd: {} entries, central dir at {}, {} prepended bytes",
        total_entries,
        central_dir_offset,
        data_start
    );

    Ok(EocdFields {
        total_entries,
        central_dir_offset,
        data_start,
    })
}

/// Parses a single central-directory record at the stream's current
/// position, fixing up its local-header offset by `data_start`. Leaves the
/// cursor at the start of the next record.
fn parse_one_entry(src: &mut dyn ByteSource, data_start: u32) -> Result<Entry> {
    let signature = read_u32_le(src)?;
    if signature != CENTRAL_DIR_SIGNATURE {
        return Err(Error::corrupted("bad central directory record signature"));
    }

    let version_made_by = read_u16_le(src)?;
    let version_needed = read_u16_le(src)?;
    let _flags = read_u16_le(src)?;
    let compression_method = read_u16_le(src)?;
    let dos_time = read_u32_le(src)?;
    let last_mod_time = dos_time_to_unix(dos_time);
    let crc32 = read_u32_le(src)?;
    let compressed_size = read_u32_le(src)?;
    let uncompressed_size = read_u32_le(src)?;
    let filename_len = read_u16_le(src)?;
    let extra_len = read_u16_le(src)?;
    let comment_len = read_u16_le(src)?;
    let _disk_number_start = read_u16_le(src)?;
    let _internal_attr = read_u16_le(src)?;
    let external_attr = read_u32_le(src)?;
    let local_header_offset = read_u32_le(src)?;

    let mut name_buf = vec![0u8; filename_len as usize];
    src.read_exact(&mut name_buf)?;
    let mut name = String::from_utf8_lossy(&name_buf).into_owned();
    Entry::convert_dos_path(version_made_by, &mut name);

    // skip extra + comment to land on the next record
    let mut skip = vec![0u8; extra_len as usize + comment_len as usize];
    src.read_exact(&mut skip)?;

    let resolved = if Entry::external_attr_is_symlink(version_made_by, uncompressed_size, external_attr) {
        ResolveState::UnresolvedSymlink
    } else {
        ResolveState::UnresolvedFile
    };

    Ok(Entry {
        name,
        version_made_by,
        version_needed,
        compression_method,
        crc32,
        compressed_size,
        uncompressed_size,
        last_mod_time,
        offset: local_header_offset + data_start,
        resolved,
        symlink_target: None,
    })
}

/// Parses the end-of-central-directory record and the full central
/// directory that follows it, returning every entry in file order
/// (unsorted — sorting is the `Index`'s job).
///
/// On any short read or signature mismatch partway through, the entries
/// parsed so far are dropped and the whole mount fails with `Corrupted`,
/// matching the original's "free everything, fail the open" discipline.
pub fn parse_archive(src: &mut dyn ByteSource) -> Result<Vec<Entry>> {
    let fields = parse_eocd(src)?;
    src.seek(fields.central_dir_offset as u64)?;

    let mut entries = Vec::with_capacity(fields.total_entries as usize);
    for _ in 0..fields.total_entries {
        entries.push(parse_one_entry(src, fields.data_start)?);
    }
    Ok(entries)
}

