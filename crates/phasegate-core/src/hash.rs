//! Content hashing for phase directories.
//!
//! Digests are SHA-256 truncated to 16 hex characters. That is plenty to
//! notice an edited or swapped file between invocations; it is not meant to
//! resist a deliberate collision.

use crate::error::Result;
use crate::paths;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::io::{ErrorKind, Read};
use std::path::Path;
use walkdir::WalkDir;

/// Project-relative path (`/` separated) → short digest, ordered by path.
pub type FileHashes = BTreeMap<String, String>;

pub const SHORT_HASH_LEN: usize = 16;
const CHUNK_SIZE: usize = 8192;

/// Stream `path` through SHA-256 and return the short hex digest.
pub fn hash_file(path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        let n = match file.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        hasher.update(&buf[..n]);
    }
    let digest = format!("{:x}", hasher.finalize());
    Ok(digest[..SHORT_HASH_LEN].to_string())
}

/// Hash every regular file under `dir`, keyed relative to `root`.
///
/// Gate-generated files (manifest, conversation log, state label) are
/// skipped wherever they appear. Symlinks are followed and hashed by target
/// content; a link loop is an error. A missing `dir` yields an empty map.
pub fn hash_directory(root: &Path, dir: &Path) -> Result<FileHashes> {
    let mut hashes = FileHashes::new();
    if !dir.exists() {
        return Ok(hashes);
    }
    for entry in WalkDir::new(dir).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_str().is_some_and(paths::is_generated) {
            continue;
        }
        hashes.insert(relative_key(root, entry.path()), hash_file(entry.path())?);
    }
    Ok(hashes)
}

/// Union of [`hash_directory`] over several directories.
pub fn hash_directories<'a>(
    root: &Path,
    dirs: impl IntoIterator<Item = &'a Path>,
) -> Result<FileHashes> {
    let mut all = FileHashes::new();
    for dir in dirs {
        all.extend(hash_directory(root, dir)?);
    }
    Ok(all)
}

/// `path` relative to `root`, always with `/` separators so manifests are
/// portable between platforms.
pub fn relative_key(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn hash_is_stable_and_short() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        std::fs::write(&path, b"observations").unwrap();
        let first = hash_file(&path).unwrap();
        let second = hash_file(&path).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), SHORT_HASH_LEN);
        assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn identical_bytes_identical_digest() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("one.csv"), b"x,y\n1,2\n").unwrap();
        std::fs::create_dir_all(dir.path().join("nested")).unwrap();
        std::fs::write(dir.path().join("nested/two.csv"), b"x,y\n1,2\n").unwrap();
        assert_eq!(
            hash_file(&dir.path().join("one.csv")).unwrap(),
            hash_file(&dir.path().join("nested/two.csv")).unwrap()
        );
    }

    #[test]
    fn known_digest_prefix() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty");
        std::fs::write(&path, b"").unwrap();
        // SHA-256 of the empty string
        assert_eq!(hash_file(&path).unwrap(), "e3b0c44298fc1c14");
    }

    #[test]
    fn files_larger_than_one_chunk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("big.bin");
        let mut data = vec![7u8; CHUNK_SIZE * 3 + 17];
        std::fs::write(&path, &data).unwrap();
        let before = hash_file(&path).unwrap();
        *data.last_mut().unwrap() = 8;
        std::fs::write(&path, &data).unwrap();
        assert_ne!(before, hash_file(&path).unwrap());
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(hash_file(&dir.path().join("missing")).is_err());
    }

    #[test]
    fn directory_keys_are_root_relative_and_sorted() {
        let dir = TempDir::new().unwrap();
        let phase = dir.path().join("phase1");
        std::fs::create_dir_all(phase.join("sub")).unwrap();
        std::fs::write(phase.join("b.md"), b"b").unwrap();
        std::fs::write(phase.join("a.md"), b"a").unwrap();
        std::fs::write(phase.join("sub/c.md"), b"c").unwrap();

        let hashes = hash_directory(dir.path(), &phase).unwrap();
        let keys: Vec<_> = hashes.keys().cloned().collect();
        assert_eq!(keys, vec!["phase1/a.md", "phase1/b.md", "phase1/sub/c.md"]);
    }

    #[test]
    fn generated_files_are_excluded() {
        let dir = TempDir::new().unwrap();
        let phase = dir.path().join("p");
        std::fs::create_dir_all(&phase).unwrap();
        std::fs::write(phase.join("MANIFEST.json"), b"{}").unwrap();
        std::fs::write(phase.join("conversation_log.md"), b"log").unwrap();
        std::fs::write(phase.join("PHASE_STATE.yaml"), b"state: REVIEW").unwrap();
        std::fs::write(phase.join("GATE.md"), b"summary").unwrap();

        let hashes = hash_directory(dir.path(), &phase).unwrap();
        assert_eq!(hashes.len(), 1);
        assert!(hashes.contains_key("p/GATE.md"));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_files_are_hashed_by_target() {
        let dir = TempDir::new().unwrap();
        let phase = dir.path().join("p");
        std::fs::create_dir_all(&phase).unwrap();
        std::fs::write(dir.path().join("external.csv"), b"1,2").unwrap();
        std::os::unix::fs::symlink(dir.path().join("external.csv"), phase.join("data.csv"))
            .unwrap();

        let before = hash_directory(dir.path(), &phase).unwrap();
        assert_eq!(before.keys().collect::<Vec<_>>(), vec!["p/data.csv"]);
        std::fs::write(dir.path().join("external.csv"), b"3,4").unwrap();
        let after = hash_directory(dir.path(), &phase).unwrap();
        assert_ne!(before["p/data.csv"], after["p/data.csv"]);
    }

    #[cfg(unix)]
    #[test]
    fn symlink_loop_is_an_error() {
        let dir = TempDir::new().unwrap();
        let phase = dir.path().join("p");
        std::fs::create_dir_all(&phase).unwrap();
        std::os::unix::fs::symlink(&phase, phase.join("again")).unwrap();
        assert!(hash_directory(dir.path(), &phase).is_err());
    }

    #[test]
    fn missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let hashes = hash_directory(dir.path(), &dir.path().join("nope")).unwrap();
        assert!(hashes.is_empty());
    }

    #[test]
    fn union_of_directories() {
        let dir = TempDir::new().unwrap();
        for d in ["p1", "p2"] {
            std::fs::create_dir_all(dir.path().join(d)).unwrap();
            std::fs::write(dir.path().join(d).join("out.txt"), d.as_bytes()).unwrap();
        }
        let p1 = dir.path().join("p1");
        let p2 = dir.path().join("p2");
        let all = hash_directories(dir.path(), [p1.as_path(), p2.as_path()]).unwrap();
        assert_eq!(all.len(), 2);
        assert!(all.contains_key("p1/out.txt") && all.contains_key("p2/out.txt"));
    }
}
