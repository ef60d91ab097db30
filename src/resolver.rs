//! Lazy entry resolution: local file header validation, symlink target
//! chasing, and `.`/`..` path normalization (spec §4.9, §4.10, §4.11).

use crate::byte_source::{read_u16_le, read_u32_le, ByteSource};
use crate::entry::{Entry, ResolveState};
use crate::error::{Error, Result};
use crate::index::Index;
use crate::inflate::inflate_all;

const LOCAL_FILE_SIGNATURE: u32 = 0x0403_4B50;
const LOCAL_HEADER_FIXED_SIZE: u32 = 30;

/// Resolves `index.entries()[idx]`, dispatching on its current
/// `ResolveState` (spec §4.9). On success, a symlink entry's
/// `symlink_target` names the index of its final, non-symlink target.
pub fn resolve(index: &mut Index, idx: usize, src: &mut dyn ByteSource) -> Result<()> {
    let state = index.entry_mut(idx).resolved;

    match state {
        ResolveState::Resolved => Ok(()),
        ResolveState::BrokenFile | ResolveState::BrokenSymlink => {
            Err(Error::corrupted("entry failed to resolve on a previous attempt"))
        }
        ResolveState::Resolving => Err(Error::SymlinkLoop {
            path: index.entries()[idx].name.clone(),
        }),
        ResolveState::UnresolvedFile | ResolveState::UnresolvedSymlink => {
            resolve_unresolved(index, idx, src, state)
        }
    }
}

fn resolve_unresolved(index: &mut Index, idx: usize, src: &mut dyn ByteSource, state: ResolveState) -> Result<()> {
    index.entry_mut(idx).resolved = ResolveState::Resolving;
    log::trace!("resolving entry {} ({:?})", idx, state);

    let broken_state = if state == ResolveState::UnresolvedSymlink {
        ResolveState::BrokenSymlink
    } else {
        ResolveState::BrokenFile
    };

    let result = parse_local_header(index.entry_mut(idx), src).and_then(|()| {
        if state == ResolveState::UnresolvedSymlink {
            resolve_symlink(index, idx, src)
        } else {
            Ok(())
        }
    });

    match result {
        Ok(()) => {
            index.entry_mut(idx).resolved = ResolveState::Resolved;
            Ok(())
        }
        Err(err) => {
            log::warn!("entry {} failed to resolve: {}", idx, err);
            index.entry_mut(idx).resolved = broken_state;
            Err(err)
        }
    }
}

/// Validates the entry's local file header against the central-directory
/// record and advances `entry.offset` past the header to the start of the
/// entry's actual data (spec §4.10).
fn parse_local_header(entry: &mut Entry, src: &mut dyn ByteSource) -> Result<()> {
    src.seek(entry.offset as u64)?;

    let signature = read_u32_le(src)?;
    if signature != LOCAL_FILE_SIGNATURE {
        return Err(Error::corrupted("bad local file header signature"));
    }

    let version_needed = read_u16_le(src)?;
    if version_needed != entry.version_needed {
        return Err(Error::corrupted("local header version disagrees with central directory"));
    }

    let _flags = read_u16_le(src)?;

    let compression_method = read_u16_le(src)?;
    if compression_method != entry.compression_method {
        return Err(Error::corrupted("local header compression method disagrees with central directory"));
    }

    let _dos_time = read_u32_le(src)?;

    let crc32 = read_u32_le(src)?;
    if crc32 != entry.crc32 {
        return Err(Error::corrupted("local header CRC-32 disagrees with central directory"));
    }

    let compressed_size = read_u32_le(src)?;
    if compressed_size != entry.compressed_size {
        return Err(Error::corrupted("local header compressed size disagrees with central directory"));
    }

    let uncompressed_size = read_u32_le(src)?;
    if uncompressed_size != entry.uncompressed_size {
        return Err(Error::corrupted("local header uncompressed size disagrees with central directory"));
    }

    let filename_len = read_u16_le(src)?;
    let extra_len = read_u16_le(src)?;

    entry.offset += LOCAL_HEADER_FIXED_SIZE + filename_len as u32 + extra_len as u32;
    Ok(())
}

/// Reads and decompresses the symlink's target path, normalizes it, and
/// recursively resolves the entry it names (spec §4.9 step 3).
fn resolve_symlink(index: &mut Index, idx: usize, src: &mut dyn ByteSource) -> Result<()> {
    let entry = &index.entries()[idx];
    let offset = entry.offset as u64;
    let compression_method = entry.compression_method;
    let compressed_size = entry.compressed_size;
    let uncompressed_size = entry.uncompressed_size;
    let version_made_by = entry.version_made_by;

    src.seek(offset)?;
    let raw = match compression_method {
        0 => {
            let mut buf = vec![0u8; uncompressed_size as usize];
            src.read_exact(&mut buf)?;
            buf
        }
        8 => inflate_all(src, compressed_size, uncompressed_size)?,
        other => return Err(Error::UnsupportedCompression(other)),
    };

    let mut target = String::from_utf8_lossy(&raw).into_owned();
    Entry::convert_dos_path(version_made_by, &mut target);
    let target = normalize_symlink_path(&target);

    log::trace!("entry {} is a symlink to {:?}", idx, target);

    let Some(target_idx) = index.find_entry(&target) else {
        return Err(Error::corrupted("symlink target does not exist in archive"));
    };

    resolve(index, target_idx, src)?;

    // Chase through to the final non-symlink entry, not just one hop.
    let final_idx = match index.entries()[target_idx].symlink_target {
        Some(final_idx) => final_idx,
        None => target_idx,
    };

    index.entry_mut(idx).symlink_target = Some(final_idx);
    Ok(())
}

/// Removes `.` and `..` segments from a `/`-separated archive path,
/// purely textually (spec §4.11). The moment a `..` segment has no
/// preceding segment left to remove, the entire path is truncated to
/// empty — spec §4.11 is explicit that there is no upward escape past
/// root, and this is a security-relevant rule, not a style choice, so it's
/// implemented literally rather than as a per-segment "drop and keep
/// going".
fn normalize_symlink_path(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "." => {}
            ".." => {
                if out.pop().is_none() {
                    return String::new();
                }
            }
            _ => out.push(segment),
        }
    }
    out.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_removes_current_dir_segments() {
        assert_eq!(normalize_symlink_path("a/./b"), "a/b");
        assert_eq!(normalize_symlink_path("a/."), "a");
    }

    #[test]
    fn normalize_removes_parent_dir_segments() {
        assert_eq!(normalize_symlink_path("a/b/../c"), "a/c");
        assert_eq!(normalize_symlink_path("a/.."), "");
    }

    #[test]
    fn normalize_parent_dir_at_root_truncates_whole_path() {
        assert_eq!(normalize_symlink_path(".."), "");
        assert_eq!(normalize_symlink_path("../../a"), "");
        assert_eq!(normalize_symlink_path("../x/../../y"), "");
    }

    #[test]
    fn normalize_mid_path_escape_truncates_whole_path() {
        // "a" is pushed, then popped by the first "..", leaving no
        // preceding segment for the second "..": the whole path (including
        // the trailing "b") is truncated to empty, not just the escaping
        // segment.
        assert_eq!(normalize_symlink_path("a/../../b"), "");
    }
}
