use crate::{env::EnvOverlay, error::Error};
use std::{
    fmt::{self, Display, Formatter},
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
};

/// One external command: program, arguments, working directory and environment overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: EnvOverlay,
}

impl Invocation {
    pub fn new(program: impl Into<String>, cwd: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            args: vec![],
            cwd: cwd.as_ref().to_path_buf(),
            env: EnvOverlay::default(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, env: EnvOverlay) -> Self {
        self.env = env;
        self
    }
}

impl Display for Invocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Runs an invocation to completion and reports its exit code.
///
/// Only a failure to launch is an `Err`; a non-zero exit is a normal return value and the
/// caller decides whether it is fatal.
pub trait Runner {
    fn run(&self, invocation: &Invocation) -> Result<i32, Error>;
}

impl<R: Runner + ?Sized> Runner for &R {
    fn run(&self, invocation: &Invocation) -> Result<i32, Error> {
        (**self).run(invocation)
    }
}

/// Spawns real processes, inheriting stdio and the parent environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessRunner;

impl Runner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<i32, Error> {
        let status = Command::new(&invocation.program)
            .args(&invocation.args)
            .envs(invocation.env.iter())
            .current_dir(&invocation.cwd)
            .status()
            .map_err(|source| Error::Spawn {
                program: invocation.program.clone(),
                source,
            })?;
        log::trace!("`{}` finished with {}", invocation.program, status);
        Ok(exit_code(status))
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_command_line() {
        let inv = Invocation::new("cargo", "/src").args(["clean", "--package", "nmk"]);
        assert_eq!(inv.to_string(), "cargo clean --package nmk");
        assert_eq!(inv.cwd, PathBuf::from("/src"));
        assert_eq!(inv.env, EnvOverlay::default());
    }

    #[cfg(unix)]
    #[test]
    fn process_runner_reports_exit_code() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let inv = Invocation::new("sh", dir.path()).args(["-c", "exit 3"]);
        assert_eq!(ProcessRunner.run(&inv)?, 3);
        let inv = Invocation::new("sh", dir.path()).args(["-c", "true"]);
        assert_eq!(ProcessRunner.run(&inv)?, 0);
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn child_sees_overlay_on_top_of_inherited_environment() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let env = EnvOverlay::for_release(true, false, None);
        let inv = Invocation::new("sh", dir.path())
            .args(["-c", r#"test "$RUSTFLAGS" = "-C link-arg=-s" && test -n "$PATH""#])
            .env(env);
        assert_eq!(ProcessRunner.run(&inv)?, 0);
        Ok(())
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let inv = Invocation::new("nmk-release-no-such-program", ".");
        match ProcessRunner.run(&inv) {
            Err(Error::Spawn { program, .. }) => assert_eq!(program, "nmk-release-no-such-program"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
