use git2::Repository;
use std::path::{Path, PathBuf};

pub struct RepoWrapper(Repository);

impl RepoWrapper {
    /// Opens the repository containing `path`, searching parent directories.
    pub fn discover(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        Ok(Self(Repository::discover(path)?))
    }
    pub fn workdir(&self) -> anyhow::Result<PathBuf> {
        let wd = self
            .0
            .workdir()
            .ok_or_else(|| anyhow::anyhow!("did not get working dir for repository"))?;

        Ok(wd.to_path_buf().canonicalize()?)
    }
    /// Abbreviated hash of HEAD, as `git rev-parse --short HEAD` prints it.
    pub fn short_head_id(&self) -> anyhow::Result<String> {
        let commit = self.0.head()?.peel_to_commit()?;
        let short = commit.as_object().short_id()?;
        short
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| anyhow::anyhow!("short id of {} is not utf-8", commit.id()))
    }
}

/// Short commit id of the checkout at `root`, if there is one.
pub fn resolve_commit_id(root: impl AsRef<Path>) -> Option<String> {
    match RepoWrapper::discover(&root).and_then(|repo| repo.short_head_id()) {
        Ok(id) => Some(id),
        Err(e) => {
            log::debug!("no commit id for {}: {:#}", root.as_ref().display(), e);
            None
        }
    }
}
