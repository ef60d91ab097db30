//! The `Entry` data model: one per archive member.

use chrono::{Local, NaiveDate, TimeZone};

const UNIX_FILETYPE_MASK: u32 = 0o170000;
const UNIX_FILETYPE_SYMLINK: u32 = 0o120000;

/// Resolution state of an [`Entry`]. See spec §4.9 / §9 "Tagged variants vs
/// integer state": `Resolving` is an internal marker and must never be
/// observed by a caller outside of a single resolution call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveState {
    /// Not yet opened; local file header unchecked, plain file.
    UnresolvedFile,
    /// Not yet opened; local file header unchecked, Unix symlink.
    UnresolvedSymlink,
    /// Resolution of this entry is in progress on the current call chain.
    Resolving,
    /// Local file header validated (and, for symlinks, target chased).
    Resolved,
    /// Resolution of a plain file failed; pinned so we don't retry.
    BrokenFile,
    /// Resolution of a symlink failed; pinned so we don't retry.
    BrokenSymlink,
}

/// One ZIP archive member, as parsed from a central-directory record.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Forward-slash-separated path within the archive, no leading slash.
    /// Directory entries end with `/`.
    pub name: String,
    /// Raw "version made by" field; upper byte is the host-OS code.
    pub version_made_by: u16,
    /// Raw "version needed to extract" field.
    pub version_needed: u16,
    /// 0 (STORE) or 8 (DEFLATE); anything else is a hard error on open.
    pub compression_method: u16,
    /// Stored CRC-32 of the uncompressed data.
    pub crc32: u32,
    /// Compressed size in bytes.
    pub compressed_size: u32,
    /// Uncompressed size in bytes.
    pub uncompressed_size: u32,
    /// Seconds since the Unix epoch, decoded from the DOS date/time pair.
    pub last_mod_time: i64,
    /// Local-header offset, fixed up by `data_start` at parse time; after
    /// resolution, the offset of the first byte of file data.
    pub offset: u32,
    /// Current resolution state.
    pub resolved: ResolveState,
    /// Index, in the owning `Index`'s entry table, of the final
    /// non-symlink target — set only once `resolved == Resolved` and this
    /// entry was itself a symlink.
    pub symlink_target: Option<usize>,
}

impl Entry {
    /// True if `host_os_byte` (the upper byte of a "version made by" field)
    /// identifies a platform whose ZIP writers are known to never encode
    /// Unix symlink permission bits. Mirrors `zip_version_does_symlinks`.
    pub(crate) fn host_supports_symlinks(host_os_byte: u8) -> bool {
        !matches!(host_os_byte, 0 | 1 | 2 | 4 | 6 | 11 | 13 | 14 | 15 | 18)
    }

    /// True if `external_attr`'s upper 16 bits, read as a Unix mode, mark
    /// this record as a symlink, given it also came from a symlink-capable
    /// host and has nonzero uncompressed size. Mirrors `zip_has_symlink_attr`.
    pub(crate) fn external_attr_is_symlink(version_made_by: u16, uncompressed_size: u32, external_attr: u32) -> bool {
        let host_os_byte = (version_made_by >> 8) as u8;
        let unix_mode = (external_attr >> 16) & 0xFFFF;
        Entry::host_supports_symlinks(host_os_byte)
            && uncompressed_size > 0
            && (unix_mode & UNIX_FILETYPE_MASK) == UNIX_FILETYPE_SYMLINK
    }

    /// True if this entry is a directory marker (name ends with `/`).
    pub fn is_directory_marker(&self) -> bool {
        self.name.ends_with('/')
    }

    /// Replaces backslashes with forward slashes for entries written by
    /// old FAT-family zippers (spec §4.5). No other canonicalization
    /// happens at parse time. Shared by central-directory parsing and
    /// symlink-target decoding, both of which need the same conversion
    /// keyed off a "version made by" field's host-OS byte.
    pub(crate) fn convert_dos_path(version_made_by: u16, name: &mut String) {
        let host_os_byte = (version_made_by >> 8) as u8;
        if host_os_byte == 0 {
            *name = name.replace('\\', "/");
        }
    }

    /// True if this entry is, or was, a symlink: still unresolved/broken as
    /// one, or already resolved with a recorded target. Mirrors
    /// `zip_entry_is_symlink`.
    pub fn is_symlink(&self) -> bool {
        matches!(
            self.resolved,
            ResolveState::UnresolvedSymlink | ResolveState::BrokenSymlink
        ) || self.symlink_target.is_some()
    }
}

/// Converts a DOS date/time pair (as packed in the 32-bit field read from a
/// central-directory or local-file-header record: date in the high 16 bits,
/// time in the low 16 bits) into seconds since the Unix epoch.
///
/// Spec §6 is explicit that this decodes as the host's *local* wall-clock
/// time, the same way the PhysicsFS original builds a `struct tm` and calls
/// `mktime` (folding in the host's timezone and DST rules, so the same
/// archive can decode to a different instant on different hosts). `chrono`'s
/// `Local` timezone is used here to get that host-DST-aware conversion
/// without hand-rolling `mktime` over raw libc bindings.
///
/// The year is computed directly as `1980 + dos_year_field` (spec §9 flags
/// the original's `tm_year + 80` as tied to that specific struct's 1900
/// base) and fed straight into `chrono`, not through an intermediate
/// 1900-based representation.
///
/// A corrupted or adversarial date/time field (out-of-range month/day, or a
/// wall-clock time that a DST transition skips entirely) never panics:
/// `NaiveDate`/`NaiveTime` construction failures and `Local`'s "this local
/// time doesn't exist" case both fall back to the Unix epoch.
pub fn dos_time_to_unix(dostime: u32) -> i64 {
    let dosdate = (dostime >> 16) & 0xFFFF;
    let dostime = dostime & 0xFFFF;

    let year = ((dosdate >> 9) & 0x7F) as i32 + 1980;
    let month = (dosdate >> 5) & 0x0F;
    let day = dosdate & 0x1F;

    let hour = (dostime >> 11) & 0x1F;
    let minute = (dostime >> 5) & 0x3F;
    let second = (dostime & 0x1F) * 2;

    let Some(date) = NaiveDate::from_ymd_opt(year, month, day) else {
        return 0;
    };
    let Some(naive) = date.and_hms_opt(hour, minute, second) else {
        return 0;
    };

    match Local.from_local_datetime(&naive).earliest() {
        Some(dt) => dt.timestamp(),
        // A DST spring-forward gap: this local time was never observed.
        // `mktime` would normalize it forward; approximate with the UTC
        // reading of the same wall-clock fields instead of guessing which
        // direction libc would have shifted it.
        None => Local.from_utc_datetime(&naive).timestamp(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dos_epoch_decodes_as_local_wall_clock_time() {
        // 1980-01-01 00:00:00: dosdate = 1<<9|1<<5|1 = 0x21, dostime = 0.
        // The decoded instant is host-timezone-dependent (spec §6), so
        // round-trip it back through `Local` rather than asserting a fixed
        // epoch value that would only hold in UTC.
        let dostime = (0x21u32) << 16;
        let ts = dos_time_to_unix(dostime);
        let decoded = Local.timestamp_opt(ts, 0).single().unwrap().naive_local();
        let expected = NaiveDate::from_ymd_opt(1980, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn dos_time_with_seconds_and_minutes_decodes() {
        // 2024-03-15 14:32:46: date = ((44)<<9)|(3<<5)|15, time = (14<<11)|(32<<5)|23
        let dosdate: u32 = (44 << 9) | (3 << 5) | 15;
        let dostime_lo: u32 = (14 << 11) | (32 << 5) | 23;
        let packed = (dosdate << 16) | dostime_lo;
        let ts = dos_time_to_unix(packed);
        let decoded = Local.timestamp_opt(ts, 0).single().unwrap().naive_local();
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(14, 32, 46)
            .unwrap();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn dos_path_conversion_only_for_fat_hosts() {
        let mut name = "a\\b\\c".to_string();
        Entry::convert_dos_path(0 << 8, &mut name);
        assert_eq!(name, "a/b/c");

        let mut name = "a\\b\\c".to_string();
        Entry::convert_dos_path(3 << 8, &mut name);
        assert_eq!(name, "a\\b\\c");
    }

    #[test]
    fn host_supports_symlinks_excludes_dos_family() {
        assert!(!Entry::host_supports_symlinks(0));
        assert!(!Entry::host_supports_symlinks(11));
        assert!(Entry::host_supports_symlinks(3)); // Unix
        assert!(Entry::host_supports_symlinks(19)); // unlisted -> assume unix-like
    }

    #[test]
    fn external_attr_symlink_detection() {
        let mode = 0o120777u32;
        let attr = mode << 16;
        assert!(Entry::external_attr_is_symlink(3 << 8, 5, attr));
        assert!(!Entry::external_attr_is_symlink(0 << 8, 5, attr)); // FAT host
        assert!(!Entry::external_attr_is_symlink(3 << 8, 0, attr)); // empty target
    }
}
