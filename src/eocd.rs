//! End-of-central-directory discovery (spec §4.2).

use crate::byte_source::ByteSource;
use crate::error::{Error, Result};

const EOCD_SIGNATURE: [u8; 4] = *b"PK\x05\x06";
const EOCD_MIN_SIZE: u64 = 22;
const MAX_COMMENT_LEN: u64 = 0xFFFF;
const MAX_SCAN: u64 = EOCD_MIN_SIZE + MAX_COMMENT_LEN;

/// Window size used for each backward read, matching the original's fixed
/// 256-byte scan buffer.
const WINDOW: u64 = 256;

/// Result of locating the end-of-central-directory record: its absolute
/// file offset, and the total file length.
pub struct Eocd {
    pub offset: u64,
    pub file_length: u64,
}

/// Scans backwards from the end of the file for the EOCD signature.
///
/// Each window overlaps the previous one by 3 bytes so a signature
/// straddling a window boundary is never missed — spec §9 flags the
/// original's overwrite-the-last-4-bytes trick as subtle and easy to get
/// wrong; this is the "explicit 4-byte overlap" re-derivation it asks for.
pub fn find_eocd(src: &mut dyn ByteSource) -> Result<Eocd> {
    let file_length = src.length()?;
    if file_length < EOCD_MIN_SIZE {
        return Err(Error::NotAnArchive);
    }

    let mut scanned: u64 = 0;
    // Start of the window we're about to scan, relative to EOF.
    let mut window_end = file_length;

    while scanned < MAX_SCAN && window_end > 0 {
        let window_start = window_end.saturating_sub(WINDOW).max(0);
        let want = (window_end - window_start) as usize;
        let mut buf = vec![0u8; want];
        src.seek(window_start)?;
        src.read_exact(&mut buf)?;
        log::trace!(
            "eocd scan: window [{}, {}) ({} bytes)",
            window_start,
            window_end,
            want
        );

        if let Some(rel) = buf
            .windows(4)
            .enumerate()
            .rev()
            .find(|(_, w)| *w == EOCD_SIGNATURE)
            .map(|(i, _)| i)
        {
            let offset = window_start + rel as u64;
            log::debug!("eocd found at offset {}", offset);
            return Ok(Eocd { offset, file_length });
        }

        scanned += (window_end - window_start).saturating_sub(3);
        if window_start == 0 {
            break;
        }
        // overlap by 3 bytes so a signature split across the boundary is
        // still fully contained in the next window.
        window_end = window_start + 3;
    }

    Err(Error::NotAnArchive)
}

/// Fast-path + fallback archive detection (spec §4.1). Case (a) is a quick
/// check for plain archives with no prepended bytes; case (b) catches
/// self-extracting executables and other prepended-data archives.
///
/// The PhysicsFS original inverts this: `ZIP_isArchive` treats *failure* of
/// `zip_find_end_of_central_dir` as "might be an archive" (spec §9, bug 3).
/// This is the corrected condition: the EOCD scan must *succeed*.
pub fn is_archive(src: &mut dyn ByteSource) -> bool {
    let mut sig = [0u8; 4];
    if src.seek(0).is_ok() && src.read_exact(&mut sig).is_ok() && sig == *b"PK\x03\x04" {
        return true;
    }
    find_eocd(src).is_ok()
}
