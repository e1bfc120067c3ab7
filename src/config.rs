use crate::arch::Arch;

/// Options of one release build. Built once from the command line and only borrowed after.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildConfig {
    pub arch: Arch,
    /// Passed through to `cross build` untouched.
    pub extra_args: Vec<String>,
    pub distribute: bool,
    pub lto: bool,
    pub strip: bool,
    pub verbosity: u8,
}

impl BuildConfig {
    pub fn triple(&self) -> &'static str {
        self.arch.triple()
    }

    pub fn log_level(&self) -> log::LevelFilter {
        match self.verbosity {
            0 => log::LevelFilter::Info,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}
