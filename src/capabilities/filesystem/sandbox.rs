//! Lexical path resolution confined to a root directory

use std::path::{Component, Path, PathBuf};
use url::Url;

use super::error::FsError;

/// Root directory that every capability path resolves under.
///
/// `..` may walk back up but never above the root, and absolute paths or
/// `file://` URIs outside the root are rejected. Symlinks already inside the
/// root must not lead outside it either.
#[derive(Debug, Clone)]
pub struct Sandbox {
    root: PathBuf,
}

impl Sandbox {
    /// Create the root if needed and pin it to its canonical location
    pub fn new(root: impl AsRef<Path>) -> Result<Self, FsError> {
        let root = root.as_ref();
        let display = root.display().to_string();
        std::fs::create_dir_all(root).map_err(|e| FsError::io(&display, e))?;
        let root = root
            .canonicalize()
            .map_err(|e| FsError::io(&display, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a relative path or `file://` URI to an absolute path inside the root
    pub fn resolve(&self, path: &str) -> Result<PathBuf, FsError> {
        let out_of_scope = || FsError::OutOfScope {
            path: path.to_string(),
        };

        let relative = if path.starts_with("file://") {
            let url = Url::parse(path).map_err(|_| out_of_scope())?;
            let absolute = url.to_file_path().map_err(|_| out_of_scope())?;
            absolute
                .strip_prefix(&self.root)
                .map_err(|_| out_of_scope())?
                .to_path_buf()
        } else {
            PathBuf::from(path)
        };

        let mut resolved = self.root.clone();
        let mut depth = 0usize;
        for component in relative.components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir if depth > 0 => {
                    resolved.pop();
                    depth -= 1;
                }
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                    return Err(out_of_scope())
                }
            }
        }

        if !self.stays_inside(&resolved) {
            return Err(out_of_scope());
        }
        Ok(resolved)
    }

    /// Follow symlinks on the deepest existing ancestor of `resolved`
    fn stays_inside(&self, resolved: &Path) -> bool {
        let mut probe = resolved;
        loop {
            match probe.canonicalize() {
                Ok(real) => return real.starts_with(&self.root),
                // a dangling link could be written through to anywhere
                Err(_) if probe.symlink_metadata().is_ok() => return false,
                Err(_) => match probe.parent() {
                    Some(parent) if parent.starts_with(&self.root) => probe = parent,
                    _ => return true,
                },
            }
        }
    }

    pub fn is_root(&self, resolved: &Path) -> bool {
        resolved == self.root
    }

    /// `file://` URI of a resolved path
    pub fn uri_for(&self, resolved: &Path) -> String {
        Url::from_file_path(resolved)
            .map(String::from)
            .unwrap_or_else(|_| format!("file://{}", resolved.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn sandbox() -> (TempDir, Sandbox) {
        let dir = TempDir::new().unwrap();
        let sandbox = Sandbox::new(dir.path()).unwrap();
        (dir, sandbox)
    }

    #[test]
    fn test_resolves_relative_paths_under_root() {
        let (_dir, sandbox) = sandbox();
        assert_eq!(
            sandbox.resolve("dir/child1/file3").unwrap(),
            sandbox.root().join("dir/child1/file3")
        );
        assert_eq!(
            sandbox.resolve("dir/./child/../file").unwrap(),
            sandbox.root().join("dir/file")
        );
        assert!(sandbox.is_root(&sandbox.resolve("").unwrap()));
    }

    #[test]
    fn test_rejects_escapes() {
        let (_dir, sandbox) = sandbox();
        for path in ["../hello/world", "dir/../../x", "/etc/passwd", "file:///etc/passwd"] {
            assert!(
                matches!(sandbox.resolve(path), Err(FsError::OutOfScope { .. })),
                "{path} should be out of scope"
            );
        }
    }

    #[test]
    fn test_file_uri_round_trip() {
        let (_dir, sandbox) = sandbox();
        let resolved = sandbox.resolve("download1.png").unwrap();
        let uri = sandbox.uri_for(&resolved);

        assert!(uri.starts_with("file://"));
        assert!(uri.ends_with("download1.png"));
        assert_eq!(sandbox.resolve(&uri).unwrap(), resolved);
    }

    #[cfg(unix)]
    #[test]
    fn test_rejects_symlinks_leading_outside() {
        let outside = TempDir::new().unwrap();
        let (dir, sandbox) = sandbox();
        std::fs::create_dir(dir.path().join("inner")).unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("escape")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("inner"), dir.path().join("alias")).unwrap();
        std::os::unix::fs::symlink("/nonexistent/target", dir.path().join("dangling")).unwrap();

        for path in ["escape", "escape/file.txt", "escape/a/b", "dangling"] {
            assert!(
                matches!(sandbox.resolve(path), Err(FsError::OutOfScope { .. })),
                "{path} should be out of scope"
            );
        }
        assert!(sandbox.resolve("alias/file.txt").is_ok());
        assert!(sandbox.resolve("missing/deeper/file").is_ok());
    }

    proptest! {
        #[test]
        fn prop_resolution_never_leaves_root(
            parts in proptest::collection::vec(
                prop_oneof![Just("..".to_string()), Just(".".to_string()), "[a-z]{1,8}"],
                0..8,
            )
        ) {
            let (_dir, sandbox) = sandbox();
            let path = parts.join("/");
            if let Ok(resolved) = sandbox.resolve(&path) {
                prop_assert!(resolved.starts_with(sandbox.root()));
            }
        }
    }
}
