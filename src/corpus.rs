use crate::ScaleError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

pub const EXTENSIONS: [&str; 2] = ["sgy", "segy"];

pub fn is_container(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
}

/// Every SEG-Y file under `root`, recursively, sorted by path.
pub fn discover(root: &Path) -> Result<Vec<PathBuf>, ScaleError> {
    if !root.is_dir() {
        return Err(ScaleError::NotFound(root.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        match entry {
            Ok(entry) if entry.file_type().is_file() && is_container(entry.path()) => {
                files.push(entry.into_path());
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "skipping unreadable entry"),
        }
    }
    files.sort();
    debug!(root = %root.display(), count = files.len(), "discovered files");
    Ok(files)
}

/// Where `file` lands under `output_root`, keeping its path relative to `input_root`.
pub fn mirror_path(input_root: &Path, output_root: &Path, file: &Path) -> Result<PathBuf, ScaleError> {
    file.strip_prefix(input_root)
        .map(|relative| output_root.join(relative))
        .map_err(|_| {
            ScaleError::Other(format!(
                "{} is not under input root {}",
                file.display(),
                input_root.display()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_extension_match_is_case_insensitive() {
        assert!(is_container(Path::new("a/line.sgy")));
        assert!(is_container(Path::new("a/LINE.SGY")));
        assert!(is_container(Path::new("a/line.SeGy")));
        assert!(!is_container(Path::new("a/line.sgy.bak")));
        assert!(!is_container(Path::new("a/sgy")));
    }

    #[test]
    fn test_discover_walks_recursively() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("survey/north")).unwrap();
        fs::write(root.join("top.sgy"), b"").unwrap();
        fs::write(root.join("survey/north/deep.SGY"), b"").unwrap();
        fs::write(root.join("survey/notes.txt"), b"").unwrap();
        fs::create_dir_all(root.join("survey/dir.sgy")).unwrap();

        let files = discover(root).unwrap();
        assert_eq!(
            files,
            vec![root.join("survey/north/deep.SGY"), root.join("top.sgy")]
        );
    }

    #[test]
    fn test_discover_missing_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            discover(&dir.path().join("absent")),
            Err(ScaleError::NotFound(_))
        ));
    }

    #[test]
    fn test_mirror_path_keeps_relative_structure() {
        let out = mirror_path(
            Path::new("/data/in"),
            Path::new("/data/out"),
            Path::new("/data/in/2024/line7.sgy"),
        )
        .unwrap();
        assert_eq!(out, PathBuf::from("/data/out/2024/line7.sgy"));
        assert!(mirror_path(Path::new("/data/in"), Path::new("/o"), Path::new("/else/a.sgy")).is_err());
    }
}
