use crate::adapters::storage::LocalStorage;
use crate::domain::ports::Storage;
use crate::utils::error::{CouncilError, Result};
use crate::utils::validation::validate_project_name;
use std::path::{Component, Path, PathBuf};

/// 不送進模型的檔案類型
pub const BINARY_EXTENSIONS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".ico", ".svg", ".mp4", ".woff", ".woff2", ".ttf",
];

/// 掃描既有專案時略過的目錄
pub const SKIPPED_DIRS: &[&str] = &["node_modules", ".git", "__pycache__", "dist", "build"];

pub fn is_binary_path(path: &str) -> bool {
    let lower = path.to_lowercase();
    BINARY_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// A project directory the coding team reads and writes.
#[derive(Debug, Clone)]
pub struct ProjectWorkspace {
    storage: LocalStorage,
}

impl ProjectWorkspace {
    /// Create `<base>/<name>` (or reuse it if it already exists).
    pub async fn create(base: &Path, name: &str) -> Result<Self> {
        validate_project_name(name)?;
        let root = base.join(name);
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self {
            storage: LocalStorage::new(root),
        })
    }

    /// Open an existing project directory.
    pub async fn open(path: &Path) -> Result<Self> {
        let is_dir = tokio::fs::metadata(path)
            .await
            .map(|meta| meta.is_dir())
            .unwrap_or(false);
        if !is_dir {
            return Err(CouncilError::ProjectNotFound {
                path: path.display().to_string(),
            });
        }
        Ok(Self {
            storage: LocalStorage::new(path),
        })
    }

    pub fn root(&self) -> &Path {
        self.storage.root()
    }

    /// Absolute location of a project-relative path; rejects escapes.
    pub fn full_path(&self, relative: &str) -> Result<PathBuf> {
        self.storage.full_path(relative)
    }

    pub async fn exists(&self, relative: &str) -> bool {
        self.storage.exists(relative).await
    }

    pub async fn read_text(&self, relative: &str) -> Result<String> {
        let bytes = self.storage.read_file(relative).await?;
        String::from_utf8(bytes).map_err(|e| {
            CouncilError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
        })
    }

    pub async fn write_text(&self, relative: &str, content: &str) -> Result<()> {
        self.storage.write_file(relative, content.as_bytes()).await
    }

    pub async fn create_dir(&self, relative: &str) -> Result<()> {
        let full = self.full_path(relative.trim_end_matches('/'))?;
        tokio::fs::create_dir_all(full).await?;
        Ok(())
    }

    /// Every readable text file, as (relative path, content), sorted by path.
    pub async fn text_files(&self) -> Result<Vec<(String, String)>> {
        let root = self.root().to_path_buf();
        let paths = tokio::task::spawn_blocking(move || {
            let mut found = Vec::new();
            walk(&root, &root, &mut found);
            found.sort();
            found
        })
        .await
        .map_err(|e| CouncilError::IoError(std::io::Error::other(e)))?;

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            match self.read_text(&path).await {
                Ok(content) => files.push((path, content)),
                Err(e) => tracing::debug!("Skipping unreadable file {}: {}", path, e),
            }
        }
        Ok(files)
    }

    /// File names in the project root (not recursive), sorted.
    pub async fn root_files(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut entries = tokio::fs::read_dir(self.root()).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

fn walk(dir: &Path, root: &Path, found: &mut Vec<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        if path.is_dir() {
            if !SKIPPED_DIRS.contains(&name.as_str()) {
                walk(&path, root, found);
            }
        } else if !is_binary_path(&name) {
            if let Ok(rel) = path.strip_prefix(root) {
                found.push(to_slash_path(rel));
            }
        }
    }
}

fn to_slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_binary_extensions() {
        assert!(is_binary_path("assets/logo.PNG"));
        assert!(is_binary_path("fonts/inter.woff2"));
        assert!(!is_binary_path("index.html"));
    }

    #[tokio::test]
    async fn test_create_rejects_bad_names() {
        let dir = TempDir::new().unwrap();
        assert!(ProjectWorkspace::create(dir.path(), "../up").await.is_err());
        assert!(ProjectWorkspace::create(dir.path(), "a/b").await.is_err());

        let ws = ProjectWorkspace::create(dir.path(), "WatchShop").await.unwrap();
        assert!(ws.root().is_dir());
    }

    #[tokio::test]
    async fn test_open_missing_project() {
        let dir = TempDir::new().unwrap();
        let err = ProjectWorkspace::open(&dir.path().join("nope")).await.unwrap_err();
        assert!(matches!(err, CouncilError::ProjectNotFound { .. }));
    }

    #[tokio::test]
    async fn test_text_files_skip_vendor_dirs_and_binaries() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("src")).unwrap();
        std::fs::create_dir_all(root.join("node_modules/left-pad")).unwrap();
        std::fs::create_dir_all(root.join(".git")).unwrap();
        std::fs::write(root.join("index.html"), "<html></html>").unwrap();
        std::fs::write(root.join("src/app.js"), "run()").unwrap();
        std::fs::write(root.join("logo.png"), [0u8, 159, 146]).unwrap();
        std::fs::write(root.join("blob.txt"), [0xffu8, 0xfe, 0x00]).unwrap();
        std::fs::write(root.join("node_modules/left-pad/index.js"), "x").unwrap();
        std::fs::write(root.join(".git/HEAD"), "ref").unwrap();

        let ws = ProjectWorkspace::open(root).await.unwrap();
        let files = ws.text_files().await.unwrap();
        let paths: Vec<_> = files.iter().map(|(p, _)| p.as_str()).collect();

        assert_eq!(paths, vec!["index.html", "src/app.js"]);
        assert_eq!(files[1].1, "run()");
    }

    #[tokio::test]
    async fn test_root_files_ignore_directories() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("lib.py")).unwrap();
        std::fs::write(dir.path().join("b.py"), "").unwrap();
        std::fs::write(dir.path().join("a.py"), "").unwrap();

        let ws = ProjectWorkspace::open(dir.path()).await.unwrap();
        assert_eq!(ws.root_files().await.unwrap(), vec!["a.py", "b.py"]);
    }
}
