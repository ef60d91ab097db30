//! The sorted, binary-searchable, directory-aware entry index (spec §4.6,
//! §4.8).

use crate::entry::Entry;

/// Something that can receive enumerated child names. The enclosing VFS
/// framework's `LinkedStringList` is out of scope for this crate; any
/// collector — a `Vec<String>`, a channel sender, a UI model — can
/// implement this instead.
pub trait NameSink {
    /// Appends one child name.
    fn push(&mut self, name: &str);
}

impl NameSink for Vec<String> {
    fn push(&mut self, name: &str) {
        Vec::push(self, name.to_string());
    }
}

/// Sorted, immutable-after-construction table of an archive's entries.
///
/// Spec §9 calls out that the original's `zip_sort_entries` inverts its own
/// quicksort/insertion-sort threshold; this crate doesn't replicate a
/// hand-rolled sort at all — `sort_unstable_by` already falls back to
/// insertion sort for short runs internally.
pub struct Index {
    entries: Vec<Entry>,
}

impl Index {
    /// Takes ownership of an unsorted entry vector and sorts it by
    /// byte-wise name comparison.
    pub fn new(mut entries: Vec<Entry>) -> Self {
        entries.sort_unstable_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
        Self { entries }
    }

    /// Number of entries in the archive.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True if the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Immutable view of the underlying sorted slice.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Mutable access to one entry by index — used by the resolver, which
    /// needs to mutate `resolved`/`offset`/`symlink_target` in place.
    pub fn entry_mut(&mut self, index: usize) -> &mut Entry {
        &mut self.entries[index]
    }

    /// Exact binary-search lookup by name. Returns the entry's index in
    /// the sorted table, or `None` on a miss. Mirrors `zip_find_entry`.
    pub fn find_entry(&self, name: &str) -> Option<usize> {
        self.entries
            .binary_search_by(|e| e.name.as_bytes().cmp(name.as_bytes()))
            .ok()
    }

    /// Finds the index of the first entry whose name begins with
    /// `path` + `/` (i.e. the first child of directory `path`).
    ///
    /// If `stop_on_first` is true, returns *any* matching index (used by
    /// `is_directory`, which only needs to know one exists). If false,
    /// narrows leftward to the earliest matching index, so a caller can
    /// iterate the directory's children in sorted order from there.
    ///
    /// `path == ""` names the archive root and always returns `Some(0)`
    /// (or `None` for a genuinely empty archive). Returns `None` if no
    /// entry begins with `path/`.
    ///
    /// The original's `zip_find_start_of_dir` initializes `hi =
    /// entryCount` (spec §9, bug 5) — one past the last valid index. This
    /// version uses `hi = entries.len() - 1`, the ordinary inclusive bound,
    /// and handles the empty table as a special case instead of relying on
    /// the loop to terminate safely on its own.
    pub fn find_start_of_dir(&self, path: &str, stop_on_first: bool) -> Option<usize> {
        if path.is_empty() {
            return if self.entries.is_empty() { None } else { Some(0) };
        }
        if self.entries.is_empty() {
            return None;
        }

        let dir = path.strip_suffix('/').unwrap_or(path);
        let dlen = dir.len();

        let mut lo: isize = 0;
        let mut hi: isize = self.entries.len() as isize - 1;
        let mut found: Option<usize> = None;

        while lo <= hi {
            let mid = lo + (hi - lo) / 2;
            let name = self.entries[mid as usize].name.as_bytes();

            let cmp = compare_dir_prefix(dir.as_bytes(), name, dlen);
            match cmp {
                std::cmp::Ordering::Equal => {
                    if stop_on_first {
                        return Some(mid as usize);
                    }
                    found = Some(mid as usize);
                    hi = mid - 1;
                }
                std::cmp::Ordering::Greater => lo = mid + 1,
                std::cmp::Ordering::Less => hi = mid - 1,
            }
        }

        found
    }

    /// Appends each immediate child's basename under `dir` exactly once,
    /// in sorted order, to `sink` (spec §4.8). `omit_symlinks` skips
    /// entries that are themselves symlinks (subdirectories containing
    /// symlinks are still descended into and their non-symlink children
    /// still emitted).
    pub fn enumerate(&self, dir: &str, omit_symlinks: bool, sink: &mut dyn NameSink) {
        let dir = dir.strip_suffix('/').unwrap_or(dir);
        let dlen = dir.len();

        let Some(mut i) = self.find_start_of_dir(dir, false) else {
            return;
        };
        let total = self.entries.len();

        while i < total {
            let entry = &self.entries[i];
            if dlen > 0 && !name_has_dir_prefix(entry.name.as_bytes(), dir.as_bytes(), dlen) {
                break;
            }

            let skip_prefix = dlen + usize::from(dlen > 0);
            let tail = &entry.name[skip_prefix.min(entry.name.len())..];

            if tail.is_empty() || (omit_symlinks && entry.is_symlink()) {
                i += 1;
                continue;
            }

            let (child, is_subdir) = match tail.find('/') {
                Some(slash) => (&tail[..slash], true),
                None => (tail, false),
            };
            sink.push(child);

            i += 1;
            if is_subdir {
                // skip the subdirectory's own deeper children
                while i < total {
                    let candidate = &self.entries[i];
                    if dlen > 0 && !name_has_dir_prefix(candidate.name.as_bytes(), dir.as_bytes(), dlen) {
                        break;
                    }
                    let candidate_tail = &candidate.name[skip_prefix.min(candidate.name.len())..];
                    if candidate_tail.starts_with(&format!("{}/", child)) {
                        i += 1;
                    } else {
                        break;
                    }
                }
            }
        }
    }
}

/// Compares `name`'s first `dlen` bytes against `dir`, requiring the byte
/// right after the shared prefix to be `/` for a real directory-prefix
/// match (so `"d"` doesn't spuriously match `"dd/x"`).
fn compare_dir_prefix(dir: &[u8], name: &[u8], dlen: usize) -> std::cmp::Ordering {
    let prefix_len = dlen.min(name.len());
    match dir.cmp(&name[..prefix_len]) {
        std::cmp::Ordering::Equal if name.len() > dlen => {
            if name[dlen] == b'/' {
                std::cmp::Ordering::Equal
            } else if name[dlen] < b'/' {
                // e.g. dir="d", name="d\x01x": name's continuation byte is
                // below '/', so name sorts before any "d/..." child and the
                // search must continue rightward to find them.
                std::cmp::Ordering::Greater
            } else {
                // e.g. dir="dir", name="direct": name sorts after every
                // "dir/..." child, so the search must continue leftward.
                std::cmp::Ordering::Less
            }
        }
        other if prefix_len < dlen => {
            // name is a strict, non-'/'-terminated prefix of dir — name is too short.
            other
        }
        std::cmp::Ordering::Equal => std::cmp::Ordering::Greater, // name == dir exactly, no trailing slash: not a child
        other => other,
    }
}

fn name_has_dir_prefix(name: &[u8], dir: &[u8], dlen: usize) -> bool {
    name.len() > dlen && name[dlen] == b'/' && &name[..dlen] == dir
}
