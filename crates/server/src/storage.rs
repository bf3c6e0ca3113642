//! Two-tier physical lookup of stored files.

use std::path::{Component, Path, PathBuf};

/// Where a stored file was found on disk.
///
/// The miss case is `None` from [`locate`], never an error: relocation of
/// aged files from the hot to the cold tier is routine, not exceptional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Located {
    /// Found in the hot (uploads) directory.
    Primary(PathBuf),
    /// Found in the cold (archive) directory.
    Secondary(PathBuf),
}

impl Located {
    /// The absolute path of the file, whichever tier holds it.
    #[must_use]
    pub fn into_path(self) -> PathBuf {
        match self {
            Self::Primary(path) | Self::Secondary(path) => path,
        }
    }
}

/// Look up a storage file name in the hot directory, then the cold one.
///
/// The hot tier wins when both hold the name. Storage names are generated
/// flat, so anything carrying a path separator or a parent component never
/// resolves. Dots inside a name are fine; sanitization keeps them, so
/// names like `{uuid}_a..b.txt` are legitimate catalog entries.
pub async fn locate(file: &str, primary: &Path, secondary: &Path) -> Option<Located> {
    if !is_flat_name(file) {
        return None;
    }

    let hot = primary.join(file);
    if tokio::fs::try_exists(&hot).await.unwrap_or(false) {
        return Some(Located::Primary(hot));
    }

    let cold = secondary.join(file);
    if tokio::fs::try_exists(&cold).await.unwrap_or(false) {
        return Some(Located::Secondary(cold));
    }

    None
}

/// A storage name must be exactly one normal path component: no separators,
/// no `.` or `..` components, not empty. The backslash check is explicit
/// because Unix treats it as an ordinary name byte.
fn is_flat_name(file: &str) -> bool {
    if file.contains('\\') {
        return false;
    }
    let mut components = Path::new(file).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn dirs() -> (TempDir, TempDir) {
        (TempDir::new().unwrap(), TempDir::new().unwrap())
    }

    #[tokio::test]
    async fn finds_hot_files_first() {
        let (hot, cold) = dirs();
        std::fs::write(hot.path().join("a.bin"), b"hot").unwrap();
        std::fs::write(cold.path().join("a.bin"), b"cold").unwrap();

        let located = locate("a.bin", hot.path(), cold.path()).await.unwrap();
        assert_eq!(located, Located::Primary(hot.path().join("a.bin")));
    }

    #[tokio::test]
    async fn falls_back_to_the_cold_tier() {
        let (hot, cold) = dirs();
        std::fs::write(cold.path().join("a.bin"), b"cold").unwrap();

        let located = locate("a.bin", hot.path(), cold.path()).await.unwrap();
        assert_eq!(located, Located::Secondary(cold.path().join("a.bin")));
    }

    #[tokio::test]
    async fn absent_everywhere_is_none() {
        let (hot, cold) = dirs();
        assert_eq!(locate("a.bin", hot.path(), cold.path()).await, None);
    }

    #[tokio::test]
    async fn path_escapes_never_resolve() {
        let (hot, cold) = dirs();
        std::fs::write(hot.path().join("a.bin"), b"hot").unwrap();

        assert_eq!(locate("../a.bin", hot.path(), cold.path()).await, None);
        assert_eq!(locate("..", hot.path(), cold.path()).await, None);
        assert_eq!(locate(".", hot.path(), cold.path()).await, None);
        assert_eq!(locate("sub/a.bin", hot.path(), cold.path()).await, None);
        assert_eq!(locate("/a.bin", hot.path(), cold.path()).await, None);
        assert_eq!(locate("", hot.path(), cold.path()).await, None);
    }

    #[tokio::test]
    async fn consecutive_dots_inside_a_name_resolve() {
        let (hot, cold) = dirs();
        std::fs::write(hot.path().join("0191_a..b.txt"), b"dotted").unwrap();

        let located = locate("0191_a..b.txt", hot.path(), cold.path())
            .await
            .expect("a dotted name is a single flat component");
        assert_eq!(located, Located::Primary(hot.path().join("0191_a..b.txt")));
    }
}
