//! Filesystem-backed vault and path helpers

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

use super::Vault;

/// Normalize a vault-relative path.
///
/// Backslashes become `/`, repeated separators collapse, leading and
/// trailing separators are trimmed, and non-breaking spaces become plain
/// spaces. An empty result denotes the vault root, `/`.
pub fn normalize_path(path: &str) -> String {
    let unified: String = path
        .chars()
        .map(|c| match c {
            '\\' => '/',
            '\u{00A0}' | '\u{202F}' => ' ',
            other => other,
        })
        .collect();

    let joined = unified
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/");

    if joined.is_empty() {
        "/".to_string()
    } else {
        joined
    }
}

/// Directory part of a normalized path, or `None` for files at the root
pub fn parent_dir(path: &str) -> Option<&str> {
    path.rfind('/').map(|idx| &path[..idx]).filter(|dir| !dir.is_empty())
}

/// Vault rooted at a directory on the local filesystem
///
/// Directory structure mirrors vault paths:
/// ```text
/// <root>/
///   Cooksync/
///     Pan Fried Eggs.md
///     Soup.md
///     Soup (1).md
/// ```
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    /// Open a vault at `root`, creating the directory if needed
    pub fn new(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create vault directory: {}", root.display()))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a vault path onto the filesystem, refusing to leave the root
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let normalized = normalize_path(path);
        if normalized == "/" {
            return Ok(self.root.clone());
        }

        let relative = Path::new(&normalized);
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => anyhow::bail!("Path escapes the vault: {}", path),
            }
        }

        Ok(self.root.join(relative))
    }
}

impl Vault for FsVault {
    fn exists(&self, path: &str) -> Result<bool> {
        let full = self.resolve(path)?;
        full.try_exists()
            .with_context(|| format!("Failed to check {}", full.display()))
    }

    fn create_dir(&self, path: &str) -> Result<()> {
        let full = self.resolve(path)?;
        fs::create_dir_all(&full)
            .with_context(|| format!("Failed to create directory {}", full.display()))
    }

    fn create_file(&self, path: &str, content: &str) -> Result<()> {
        let full = self.resolve(path)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)
            .with_context(|| format!("Failed to create {}", full.display()))?;
        file.write_all(content.as_bytes())
            .with_context(|| format!("Failed to write {}", full.display()))?;
        file.sync_all()
            .with_context(|| format!("Failed to flush {}", full.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("Cooksync/Soup.md"), "Cooksync/Soup.md");
        assert_eq!(normalize_path("/Cooksync//Soup.md/"), "Cooksync/Soup.md");
        assert_eq!(normalize_path("Recipes\\Cooksync\\\\a.md"), "Recipes/Cooksync/a.md");
        assert_eq!(normalize_path("My\u{00A0}Recipes"), "My Recipes");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("///"), "/");
    }

    #[test]
    fn test_parent_dir() {
        assert_eq!(parent_dir("Cooksync/Soup.md"), Some("Cooksync"));
        assert_eq!(parent_dir("a/b/c.md"), Some("a/b"));
        assert_eq!(parent_dir("Soup.md"), None);
    }

    #[test]
    fn test_create_and_exists() {
        let temp = TempDir::new().unwrap();
        let vault = FsVault::new(temp.path()).unwrap();

        assert!(!vault.exists("Cooksync").unwrap());
        vault.create_dir("Cooksync").unwrap();
        vault.create_dir("Cooksync").unwrap();
        assert!(vault.exists("Cooksync").unwrap());

        vault.create_file("Cooksync/Soup.md", "# Soup").unwrap();
        assert!(vault.exists("Cooksync/Soup.md").unwrap());
        assert_eq!(
            fs::read_to_string(temp.path().join("Cooksync/Soup.md")).unwrap(),
            "# Soup"
        );
    }

    #[test]
    fn test_create_file_never_overwrites() {
        let temp = TempDir::new().unwrap();
        let vault = FsVault::new(temp.path()).unwrap();

        vault.create_file("Soup.md", "first").unwrap();
        assert!(vault.create_file("Soup.md", "second").is_err());
        assert_eq!(fs::read_to_string(temp.path().join("Soup.md")).unwrap(), "first");
    }

    #[test]
    fn test_rejects_paths_outside_root() {
        let temp = TempDir::new().unwrap();
        let vault = FsVault::new(temp.path().join("vault")).unwrap();

        assert!(vault.create_dir("../outside").is_err());
        assert!(vault.create_file("a/../../escape.md", "x").is_err());
    }
}
