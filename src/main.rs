use anyhow::Context;
use clap::{ArgAction, Parser};
use std::path::PathBuf;

mod arch;
mod config;
mod dist;
mod env;
mod error;
mod layout;
mod manifest;
mod orchestrator;
mod repo;
mod runner;

use crate::{
    arch::Arch, config::BuildConfig, error::Error, layout::Layout, orchestrator::Orchestrator,
    runner::ProcessRunner,
};

#[derive(Parser, Debug)]
#[clap(
    name = "nmk-release",
    version,
    about = "Cross-compiles nmk release binaries and packages them for distribution"
)]
struct Opts {
    /// Request verbose logging (repeat for more)
    #[clap(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbosity: u8,
    /// Sets link-time optimization to true
    #[clap(long)]
    lto: bool,
    /// Strip build
    #[clap(long)]
    strip: bool,
    /// Copy compressed binaries to dist/
    #[clap(long)]
    dist: bool,
    /// Set build target
    #[clap(long, value_enum, default_value_t = Arch::default())]
    target: Arch,
    /// Project root. Defaults to the enclosing git checkout, or the current directory
    #[clap(long)]
    root: Option<PathBuf>,
    /// Extra arguments for `cross build`
    #[clap(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

impl Opts {
    fn build_config(&self) -> BuildConfig {
        BuildConfig {
            arch: self.target,
            extra_args: self.args.clone(),
            distribute: self.dist,
            lto: self.lto,
            strip: self.strip,
            verbosity: self.verbosity,
        }
    }
}

fn setup_logging(level: log::LevelFilter) -> anyhow::Result<()> {
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .try_init()?;
    Ok(())
}

fn try_main(opts: Opts) -> anyhow::Result<()> {
    let config = opts.build_config();
    let layout = match opts.root {
        Some(root) => Layout::absolute(root)?,
        None => Layout::discover(std::env::current_dir().context("getting current directory")?),
    };
    log::debug!("project root: {}", layout.root().display());
    Orchestrator::new(&config, &layout, ProcessRunner).run()?;
    Ok(())
}

fn main() {
    let opts = Opts::parse();
    if let Err(e) = setup_logging(opts.build_config().log_level()) {
        eprintln!("Warning: could not set up logging: {}", e);
    }
    if let Err(e) = try_main(opts) {
        log::error!("{:#}", e);
        let code = e.downcast_ref::<Error>().map(Error::exit_code).unwrap_or(1);
        std::process::exit(code);
    }
}
