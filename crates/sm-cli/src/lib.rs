use std::ffi::OsString;

use clap::Parser;
use sm_core::SkinMenuError;

mod build;
mod cli_args;
mod error_map;
mod models;
mod source_loader;

pub(crate) use cli_args::{BuildArgs, Cli, Mode};
pub(crate) use error_map::{
    emit_error, map_cli_output_write, map_cli_report_encode, map_cli_report_write,
    map_cli_source_path, map_cli_source_read, map_cli_source_scan,
};
pub(crate) use models::{BuildReport, BUILD_REPORT_SCHEMA, DEFAULT_OUTPUT_FILE};
pub(crate) use source_loader::{read_skin_xml_from_dir, resolve_skin_dir};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, SkinMenuError> {
    match cli.command {
        Mode::Build(args) => build::run_build(args),
    }
}
