use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "skinmenu")]
#[command(about = "Builds skin shortcut template includes")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Build(BuildArgs),
}

#[derive(Debug, Args)]
pub(crate) struct BuildArgs {
    #[arg(long = "skin-dir")]
    pub(crate) skin_dir: String,
    /// Defaults to `script-skinshortcuts-includes.xml` inside the skin directory.
    #[arg(long = "out")]
    pub(crate) out: Option<String>,
    #[arg(long = "container")]
    pub(crate) container: Option<String>,
    #[arg(long = "report")]
    pub(crate) report: Option<String>,
}
