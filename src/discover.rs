// Copyright (c) 2021 James O. D. Hunt.
//
// SPDX-License-Identifier: Apache-2.0
//

//! Input discovery: glob pattern expansion and row identifiers.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Expand a glob pattern into an ordered list of files.
///
/// Entries that cannot be read are logged and skipped; directories are
/// ignored.
pub fn expand(pattern: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in glob::glob(pattern)? {
        match entry {
            Ok(path) => {
                if path.is_file() {
                    files.push(path);
                }
            }
            Err(e) => log::warn!("skipping unreadable entry: {}", e),
        }
    }

    Ok(files)
}

/// Identifier of one input item: the file stem.
pub fn item_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    #[test]
    fn test_item_id() {
        #[derive(Debug)]
        struct TestData<'a> {
            path: &'a str,
            id: &'a str,
        }

        let tests = &[
            TestData {
                path: "/data/pair_0042.dat",
                id: "pair_0042",
            },
            TestData {
                path: "relative.csv",
                id: "relative",
            },
            TestData {
                path: "/data/noext",
                id: "noext",
            },
        ];

        for (i, d) in tests.iter().enumerate() {
            let msg = format!("test[{}]: {:?}", i, d);

            assert_eq!(item_id(Path::new(d.path)), d.id, "{}", msg);
        }
    }

    #[test]
    fn test_expand() {
        let dir = std::env::temp_dir().join(format!("datproc-discover-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        fs::write(dir.join("b.dat"), "1;2\n3;4\n").unwrap();
        fs::write(dir.join("a.dat"), "1;2\n3;4\n").unwrap();
        fs::write(dir.join("ignored.txt"), "").unwrap();
        fs::create_dir_all(dir.join("sub.dat")).unwrap();

        let pattern = format!("{}/*.dat", dir.display());
        let files = expand(&pattern).unwrap();

        // Ordered, files only.
        let ids: Vec<String> = files.iter().map(|p| item_id(p)).collect();
        assert_eq!(ids, vec!["a", "b"]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_expand_bad_pattern() {
        let result = expand("data/***");

        assert!(result.is_err());
    }
}
