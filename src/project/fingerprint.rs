//! Content fingerprints for step sources and dependencies.
//!
//! A fingerprint is a SHA-256 digest over every file reachable from a path:
//! the relative file path, its size, and its bytes. Directories are walked in
//! sorted order so the digest does not depend on filesystem iteration order.

use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};

/// Compute the fingerprint of `relative` under `root`.
///
/// Returns `None` when the path does not exist.
pub fn fingerprint(root: &Path, relative: &str) -> Option<String> {
    let full_path = root.join(relative);
    if !full_path.exists() {
        return None;
    }

    let mut files = Vec::new();
    collect_files(&full_path, &mut files);
    files.sort();

    let mut hasher = Sha256::new();
    for file in &files {
        let display = file
            .strip_prefix(root)
            .unwrap_or(file)
            .to_string_lossy()
            .replace('\\', "/");
        hasher.update(display.as_bytes());

        if let Ok(content) = fs::read(file) {
            hasher.update((content.len() as u64).to_le_bytes());
            hasher.update(&content);
        }
    }

    Some(hex::encode(hasher.finalize()))
}

fn collect_files(path: &Path, files: &mut Vec<PathBuf>) {
    if path.is_file() {
        files.push(path.to_path_buf());
        return;
    }

    let Ok(entries) = fs::read_dir(path) else {
        return;
    };

    for entry in entries.flatten() {
        let child = entry.path();
        // Skip our own bookkeeping directory if a dependency points at the root.
        if child.file_name().is_some_and(|n| n == ".kettle") {
            continue;
        }
        collect_files(&child, files);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_path_has_no_fingerprint() {
        let temp = TempDir::new().unwrap();
        assert!(fingerprint(temp.path(), "nope.sh").is_none());
    }

    #[test]
    fn same_content_same_fingerprint() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a.sh"), "echo hi").unwrap();

        let first = fingerprint(temp.path(), "a.sh").unwrap();
        let second = fingerprint(temp.path(), "a.sh").unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn content_change_changes_fingerprint() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.sh");
        fs::write(&file, "echo hi").unwrap();
        let before = fingerprint(temp.path(), "a.sh").unwrap();

        fs::write(&file, "echo bye").unwrap();
        let after = fingerprint(temp.path(), "a.sh").unwrap();

        assert_ne!(before, after);
    }

    #[test]
    fn directory_fingerprint_covers_nested_files() {
        let temp = TempDir::new().unwrap();
        let libs = temp.path().join("libs");
        fs::create_dir_all(libs.join("geo")).unwrap();
        fs::write(libs.join("util.sh"), "x=1").unwrap();
        fs::write(libs.join("geo").join("proj.sh"), "y=2").unwrap();
        let before = fingerprint(temp.path(), "libs").unwrap();

        fs::write(libs.join("geo").join("proj.sh"), "y=3").unwrap();
        let after = fingerprint(temp.path(), "libs").unwrap();

        assert_ne!(before, after);
    }

    #[test]
    fn renaming_a_file_changes_fingerprint() {
        let temp = TempDir::new().unwrap();
        let libs = temp.path().join("libs");
        fs::create_dir_all(&libs).unwrap();
        fs::write(libs.join("a.sh"), "x").unwrap();
        let before = fingerprint(temp.path(), "libs").unwrap();

        fs::rename(libs.join("a.sh"), libs.join("b.sh")).unwrap();
        let after = fingerprint(temp.path(), "libs").unwrap();

        assert_ne!(before, after);
    }
}
