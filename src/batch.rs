//! Batch label files: one label per line.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{LabelError, LabelResult};
use crate::export::ExportFormat;

/// A label to generate and the path it is written to
#[derive(Debug, Clone, PartialEq)]
pub struct LabelJob {
    pub text: String,
    pub output: PathBuf,
}

/// Read a batch file into jobs writing to `output_dir`
pub fn read_jobs(file: &Path, output_dir: &Path, format: ExportFormat) -> LabelResult<Vec<LabelJob>> {
    let contents = std::fs::read_to_string(file).map_err(|e| LabelError::IoRead {
        path: file.to_path_buf(),
        source: e,
    })?;

    let jobs = jobs_from_lines(&contents, output_dir, format);
    if jobs.is_empty() {
        return Err(LabelError::EmptyBatch {
            path: file.to_path_buf(),
        });
    }
    debug!(file = %file.display(), labels = jobs.len(), "read batch file");
    Ok(jobs)
}

/// Jobs for every non-blank line of `contents`
pub fn jobs_from_lines(contents: &str, output_dir: &Path, format: ExportFormat) -> Vec<LabelJob> {
    let mut used: HashSet<String> = HashSet::new();
    let mut jobs = Vec::new();

    for (index, line) in contents.lines().enumerate() {
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        let mut base = slugify(text);
        if base.is_empty() {
            base = format!("label_{}", index + 1);
        }
        let mut name = base.clone();
        let mut suffix = 1;
        while used.contains(&name) {
            suffix += 1;
            name = format!("{}_{}", base, suffix);
        }
        used.insert(name.clone());

        jobs.push(LabelJob {
            text: text.to_string(),
            output: output_dir.join(format!("{}.{}", name, format.extension())),
        });
    }
    jobs
}

/// Lowercase ASCII alphanumerics; every other run becomes a single `_`
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_sep = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }
    slug
}
