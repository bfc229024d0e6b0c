use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use sm_api::{MENUS_FILE, PROPERTIES_FILE, TEMPLATES_FILE};
use sm_core::SkinMenuError;
use walkdir::WalkDir;

use crate::{map_cli_source_path, map_cli_source_read, map_cli_source_scan};

const SKIN_SOURCE_FILES: &[&str] = &[TEMPLATES_FILE, PROPERTIES_FILE, MENUS_FILE];

pub(crate) fn resolve_skin_dir(skin_dir: &str) -> Result<PathBuf, SkinMenuError> {
    let path = PathBuf::from(skin_dir);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(map_cli_source_path)?
            .join(path)
    };

    if !absolute.exists() {
        return Err(SkinMenuError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("skin-dir does not exist: {}", absolute.display()),
        ));
    }

    if !absolute.is_dir() {
        return Err(SkinMenuError::new(
            "CLI_SOURCE_NOT_DIR",
            format!("skin-dir is not a directory: {}", absolute.display()),
        ));
    }

    Ok(absolute)
}

/// Reads the shortcut definition files found anywhere under `skin_dir`,
/// keyed by their `/`-separated relative path. The shallowest copy of
/// each file name wins.
pub(crate) fn read_skin_xml_from_dir(
    skin_dir: &Path,
) -> Result<BTreeMap<String, String>, SkinMenuError> {
    let mut found: BTreeMap<String, (usize, PathBuf)> = BTreeMap::new();

    for entry in WalkDir::new(skin_dir)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().to_string();
        if !SKIN_SOURCE_FILES.contains(&file_name.as_str()) {
            continue;
        }
        let depth = entry.depth();
        if found
            .get(&file_name)
            .is_some_and(|(seen_depth, _)| *seen_depth <= depth)
        {
            log::debug!("ignoring duplicate {}", entry.path().display());
            continue;
        }
        found.insert(file_name, (depth, entry.into_path()));
    }

    let mut sources = BTreeMap::new();
    for (_, path) in found.into_values() {
        let relative = path
            .strip_prefix(skin_dir)
            .map_err(map_cli_source_scan)?
            .to_string_lossy()
            .replace('\\', "/");

        let content = fs::read_to_string(&path).map_err(map_cli_source_read)?;
        sources.insert(relative, content);
    }

    if sources.is_empty() {
        return Err(SkinMenuError::new(
            "CLI_SOURCE_EMPTY",
            format!(
                "No {} files under {}",
                SKIN_SOURCE_FILES.join("/"),
                skin_dir.display()
            ),
        ));
    }

    Ok(sources)
}
