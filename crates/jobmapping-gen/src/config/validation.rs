//! Configuration validation.

use std::collections::HashMap;
use std::path::{Component, Path};

use super::{Config, GeneratorOptions};
use crate::error::{GenError, Result};

/// Validate the request list.
pub fn validate(config: &Config) -> Result<()> {
    if config.requests.is_empty() {
        return Err(GenError::ConfigRead("request list is empty".into()));
    }

    let mut seen: HashMap<&Path, usize> = HashMap::new();
    for (idx, request) in config.requests.iter().enumerate() {
        if request.folder.trim().is_empty() {
            return Err(GenError::ConfigRead(format!(
                "request {}: folder is required",
                idx
            )));
        }
        if request.sql_file.trim().is_empty() {
            return Err(GenError::ConfigRead(format!(
                "request {}: sql_file is required",
                idx
            )));
        }

        // Two requests writing the same folder would race on one output file.
        let folder = Path::new(request.folder.trim_end_matches('/'));
        if let Some(first) = seen.insert(folder, idx) {
            return Err(GenError::ConfigRead(format!(
                "requests {} and {} both target folder '{}'",
                first, idx, request.folder
            )));
        }
    }

    Ok(())
}

/// Validate run options.
pub fn validate_options(options: &GeneratorOptions) -> Result<()> {
    if let Some(0) = options.workers {
        return Err(GenError::ConfigRead("workers must be at least 1".into()));
    }
    if !is_plain_file_name(&options.output_file_name) {
        return Err(GenError::ConfigRead(format!(
            "output file name '{}' must be a plain file name",
            options.output_file_name
        )));
    }
    Ok(())
}

/// A single normal path component, with no separator of either platform.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(part)), None) if part == name
    ) && !name.contains(['/', '\\'])
}
