use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Recursive, name-sorted traversal of every regular file under a root.
///
/// The listing is taken in full before the first visit, so renames made by a
/// visitor never feed back into the same walk.
#[derive(Debug, Clone)]
pub struct TreeWalker {
    root: PathBuf,
    include_hidden: bool,
}

impl TreeWalker {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            include_hidden: true,
        }
    }

    pub fn include_hidden(mut self, include_hidden: bool) -> Self {
        self.include_hidden = include_hidden;
        self
    }

    pub fn collect_files(&self) -> Result<Vec<PathBuf>> {
        let include_hidden = self.include_hidden;
        let mut out = Vec::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |entry| include_hidden || entry.depth() == 0 || !is_hidden(entry));

        for entry in walker {
            let entry = entry
                .with_context(|| format!("フォルダ走査に失敗しました: {}", self.root.display()))?;
            if entry.file_type().is_file() {
                out.push(entry.into_path());
            }
        }

        Ok(out)
    }

    /// Visits each file in walk order, stopping at the first error.
    pub fn visit_files<F>(&self, mut visit: F) -> Result<usize>
    where
        F: FnMut(&Path) -> Result<()>,
    {
        let files = self.collect_files()?;
        for path in &files {
            visit(path.as_path())?;
        }
        Ok(files.len())
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::TreeWalker;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::tempdir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dirs must be creatable");
        }
        fs::write(path, b"x").expect("file must be creatable");
    }

    fn names(root: &Path, files: &[PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|p| {
                p.strip_prefix(root)
                    .expect("under root")
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn walks_files_recursively_in_name_order() {
        let temp = tempdir().expect("tempdir");
        touch(&temp.path().join("b.jpg"));
        touch(&temp.path().join("a.jpg.json"));
        touch(&temp.path().join("2024/c.HEIC"));

        let files = TreeWalker::new(temp.path())
            .collect_files()
            .expect("walk");
        assert_eq!(names(temp.path(), &files), vec!["2024/c.HEIC", "a.jpg.json", "b.jpg"]);
    }

    #[test]
    fn hidden_entries_are_walked_unless_excluded() {
        let temp = tempdir().expect("tempdir");
        touch(&temp.path().join(".DS_Store"));
        touch(&temp.path().join(".cache/x.json"));
        touch(&temp.path().join("IMG_1.jpg"));

        let all = TreeWalker::new(temp.path())
            .collect_files()
            .expect("walk");
        assert_eq!(
            names(temp.path(), &all),
            vec![".DS_Store", ".cache/x.json", "IMG_1.jpg"]
        );

        let visible = TreeWalker::new(temp.path())
            .include_hidden(false)
            .collect_files()
            .expect("walk");
        assert_eq!(names(temp.path(), &visible), vec!["IMG_1.jpg"]);
    }

    #[test]
    fn visit_stops_on_first_error() {
        let temp = tempdir().expect("tempdir");
        touch(&temp.path().join("a.jpg"));
        touch(&temp.path().join("b.jpg"));

        let mut seen = 0usize;
        let err = TreeWalker::new(temp.path())
            .visit_files(|_| {
                seen += 1;
                anyhow::bail!("stop")
            })
            .expect_err("visitor error must propagate");
        assert_eq!(err.to_string(), "stop");
        assert_eq!(seen, 1);
    }

    #[test]
    fn missing_root_is_an_error() {
        let temp = tempdir().expect("tempdir");
        let err = TreeWalker::new(temp.path().join("missing"))
            .collect_files()
            .expect_err("missing root");
        assert!(err.to_string().contains("フォルダ走査に失敗しました"));
    }
}
