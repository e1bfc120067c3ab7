use crate::{
    config::BuildConfig,
    dist,
    env::EnvOverlay,
    error::Error,
    layout::Layout,
    manifest, repo,
    runner::{Invocation, Runner},
};
use std::path::PathBuf;

/// Cargo package cleaned before every release build.
const PACKAGE: &str = "nmk";
const CLEAN_TOOL: &str = "cargo";
const BUILD_TOOL: &str = "cross";

/// Drives one release build: clean, build, and optionally stage the results.
///
/// Holds everything the steps need, so nothing reaches for process-wide state beyond the
/// logger.
pub struct Orchestrator<'a, R> {
    config: &'a BuildConfig,
    layout: &'a Layout,
    runner: R,
}

impl<'a, R: Runner> Orchestrator<'a, R> {
    pub fn new(config: &'a BuildConfig, layout: &'a Layout, runner: R) -> Self {
        Self { config, layout, runner }
    }

    /// Runs the whole sequence and returns the staged files (empty without `--dist`).
    ///
    /// A failed build ends the run with [`Error::ToolFailed`] before anything is staged.
    pub fn run(&self) -> Result<Vec<PathBuf>, Error> {
        let triple = self.config.triple();
        let commit_id = repo::resolve_commit_id(self.layout.root());
        self.clean_prior_artifacts(triple);
        self.build_release(triple, commit_id.as_deref())?;

        if !self.config.distribute {
            return Ok(vec![]);
        }
        let arch = self.config.arch;
        let staged = dist::stage_distribution(&self.layout.release_dir(arch), &self.layout.dist_dir(), arch)?;
        for path in &staged {
            log::info!("Staged {}", path.display());
        }
        Ok(staged)
    }

    pub fn clean_invocation(&self, triple: &str) -> Invocation {
        Invocation::new(CLEAN_TOOL, self.layout.root()).args([
            "clean".to_string(),
            "--release".to_string(),
            "--package".to_string(),
            PACKAGE.to_string(),
            "--target".to_string(),
            triple.to_string(),
            "--target-dir".to_string(),
            self.layout.target_dir().display().to_string(),
        ])
    }

    pub fn build_invocation(&self, triple: &str, commit_id: Option<&str>) -> Invocation {
        let env = EnvOverlay::for_release(self.config.strip, self.config.lto, commit_id);
        Invocation::new(BUILD_TOOL, self.layout.root())
            .args([
                "build".to_string(),
                "--release".to_string(),
                "--target".to_string(),
                triple.to_string(),
                "--target-dir".to_string(),
                self.layout.target_dir().display().to_string(),
            ])
            .args(self.config.extra_args.iter().cloned())
            .env(env)
    }

    /// Removes the previous build of the package, so build time and commit id embedded in the
    /// binary are fresh. Failures are only logged.
    pub fn clean_prior_artifacts(&self, triple: &str) {
        let invocation = self.clean_invocation(triple);
        log::info!("Cleaning packages");
        log::debug!("cmd: {}", invocation);
        match self.runner.run(&invocation) {
            Ok(0) => {}
            Ok(code) => log::warn!("`{}` exited with status {}, continuing", invocation, code),
            Err(e) => log::warn!("{:#}, continuing", anyhow::Error::from(e)),
        }
    }

    pub fn build_release(&self, triple: &str, commit_id: Option<&str>) -> Result<(), Error> {
        let invocation = self.build_invocation(triple, commit_id);
        log::info!("Building {} for {} target", self.package_label(), triple);
        log::debug!("env: {}", invocation.env);
        log::debug!("cmd: {}", invocation);
        match self.runner.run(&invocation)? {
            0 => Ok(()),
            code => Err(Error::ToolFailed {
                program: invocation.program,
                code,
            }),
        }
    }

    fn package_label(&self) -> String {
        let path = self.layout.manifest_path();
        match manifest::package_version(&path) {
            Ok(Some(version)) => format!("{} {}", PACKAGE, version),
            Ok(None) => PACKAGE.to_string(),
            Err(e) => {
                log::debug!("no package version: {:#}", e);
                PACKAGE.to_string()
            }
        }
    }
}
