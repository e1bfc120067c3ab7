use crate::{arch::Arch, repo::RepoWrapper};
use anyhow::Context;
use std::path::{Path, PathBuf};

// Cross builds get their own target dir, otherwise they keep invalidating the native
// incremental cache.
const CROSS_TARGET_DIR: &str = "target.cross";
const DIST_DIR: &str = "dist";
const MANIFEST: &str = "Cargo.toml";

/// Filesystem locations of one project checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    root: PathBuf,
}

impl Layout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// An explicitly given root, made absolute. Subprocesses resolve `--target-dir` from inside the
    /// root, staging resolves it from the current directory.
    pub fn absolute(root: impl AsRef<Path>) -> anyhow::Result<Self> {
        let root = root.as_ref();
        let root = root
            .canonicalize()
            .with_context(|| format!("resolving project root {}", root.display()))?;
        Ok(Self::new(root))
    }

    /// Root of the git checkout containing `cwd`, or `cwd` itself outside of one.
    pub fn discover(cwd: impl AsRef<Path>) -> Self {
        let cwd = cwd.as_ref();
        match RepoWrapper::discover(cwd).and_then(|repo| repo.workdir()) {
            Ok(root) => Self::new(root),
            Err(e) => {
                log::debug!("{} is not inside a git checkout ({:#})", cwd.display(), e);
                Self::new(cwd)
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn target_dir(&self) -> PathBuf {
        self.root.join(CROSS_TARGET_DIR)
    }

    pub fn release_dir(&self, arch: Arch) -> PathBuf {
        self.target_dir().join(arch.triple()).join("release")
    }

    pub fn dist_dir(&self) -> PathBuf {
        self.root.join(DIST_DIR)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST)
    }
}
