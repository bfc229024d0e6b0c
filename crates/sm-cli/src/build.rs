use std::fs;
use std::path::{Path, PathBuf};

use sm_api::{build_includes_from_xml_map, BuildIncludesResult, BuildOptions};
use sm_core::SkinMenuError;

use crate::{
    map_cli_output_write, map_cli_report_encode, map_cli_report_write, read_skin_xml_from_dir,
    resolve_skin_dir, BuildArgs, BuildReport, BUILD_REPORT_SCHEMA, DEFAULT_OUTPUT_FILE,
};

pub(super) fn run_build(args: BuildArgs) -> Result<i32, SkinMenuError> {
    let skin_root = resolve_skin_dir(&args.skin_dir)?;
    let sources = read_skin_xml_from_dir(&skin_root)?;

    let mut options = BuildOptions::default();
    if let Some(container) = args.container {
        options.container = container;
    }

    let result = build_includes_from_xml_map(&sources, &options)?;
    let out_path = args
        .out
        .map(PathBuf::from)
        .unwrap_or_else(|| skin_root.join(DEFAULT_OUTPUT_FILE));
    write_output(&out_path, &result.document)?;

    let report = make_report(&out_path, &result);
    if let Some(report_path) = args.report {
        save_report(Path::new(&report_path), &report)?;
    }

    emit_report(&report);
    Ok(0)
}

fn make_report(out_path: &Path, result: &BuildIncludesResult) -> BuildReport {
    let count = |name: &str| {
        result
            .root
            .element_children()
            .filter(|child| child.name == name)
            .count()
    };
    BuildReport {
        schema_version: BUILD_REPORT_SCHEMA.to_string(),
        output: out_path.display().to_string(),
        includes: count("include"),
        variables: count("variable"),
        diagnostics: result.diagnostics.clone(),
    }
}

fn emit_report(report: &BuildReport) {
    println!("RESULT:OK");
    println!("OUTPUT:{}", report.output);
    println!("INCLUDES:{}", report.includes);
    println!("VARIABLES:{}", report.variables);
    println!("DIAGNOSTICS:{}", report.diagnostics.len());
    for diagnostic in &report.diagnostics {
        println!(
            "DIAGNOSTIC:{}:{}",
            diagnostic.code,
            serde_json::to_string(&diagnostic.message).expect("string json")
        );
    }
}

fn write_output(path: &Path, document: &str) -> Result<(), SkinMenuError> {
    ensure_parent_dir(path).map_err(map_cli_output_write)?;
    fs::write(path, document).map_err(map_cli_output_write)
}

pub(crate) fn save_report(path: &Path, report: &BuildReport) -> Result<(), SkinMenuError> {
    ensure_parent_dir(path).map_err(map_cli_report_write)?;
    let payload = serde_json::to_string_pretty(report).map_err(map_cli_report_encode)?;
    fs::write(path, payload).map_err(map_cli_report_write)
}

fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}
