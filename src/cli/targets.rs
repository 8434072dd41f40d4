//! Target resolution for the check and package entry points.

use std::path::{Path, PathBuf};

/// Marker file that makes a directory a Python package.
const PACKAGE_MARKER: &str = "__init__.py";

/// Keep only the paths that look like Python sources.
pub fn python_files(files: &[PathBuf]) -> Vec<PathBuf> {
    files.iter().filter(|p| is_python_file(p)).cloned().collect()
}

fn is_python_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("py") | Some("pyi")
    )
}

/// Owning package directories of the given files, first-seen order,
/// without duplicates. A file's owning package is its parent directory
/// when that directory carries an `__init__.py`.
pub fn owning_packages(files: &[PathBuf]) -> Vec<PathBuf> {
    let mut packages: Vec<PathBuf> = Vec::new();
    for file in files {
        let Some(dir) = file.parent() else {
            continue;
        };
        if dir.join(PACKAGE_MARKER).is_file() && !packages.iter().any(|p| p == dir) {
            packages.push(dir.to_path_buf());
        }
    }
    packages
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_python_files_filters_by_extension() {
        let files = vec![
            PathBuf::from("a.py"),
            PathBuf::from("b.txt"),
            PathBuf::from("c.pyi"),
            PathBuf::from("noext"),
        ];
        assert_eq!(
            python_files(&files),
            vec![PathBuf::from("a.py"), PathBuf::from("c.pyi")]
        );
    }

    #[test]
    fn test_owning_packages_requires_marker() {
        let temp = TempDir::new().unwrap();
        let pkg = temp.path().join("pkg");
        let plain = temp.path().join("plain");
        fs::create_dir_all(&pkg).unwrap();
        fs::create_dir_all(&plain).unwrap();
        fs::write(pkg.join(PACKAGE_MARKER), "").unwrap();

        let files = vec![pkg.join("a.py"), plain.join("b.py")];
        assert_eq!(owning_packages(&files), vec![pkg]);
    }

    #[test]
    fn test_owning_packages_deduplicates_preserving_order() {
        let temp = TempDir::new().unwrap();
        let first = temp.path().join("first");
        let second = temp.path().join("second");
        for pkg in [&first, &second] {
            fs::create_dir_all(pkg).unwrap();
            fs::write(pkg.join(PACKAGE_MARKER), "").unwrap();
        }

        let files = vec![
            first.join("a.py"),
            second.join("b.py"),
            first.join("c.py"),
        ];
        assert_eq!(owning_packages(&files), vec![first, second]);
    }
}
