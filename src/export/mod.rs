//! Writing finished labels to disk.
//!
//! Every file of a label is encoded in memory, written to a temporary file
//! in the destination directory and only persisted once all of them have
//! been written. A failure part-way leaves nothing behind.

mod step;
mod stl;

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::builder::LabelAssembly;
use crate::error::{LabelError, LabelResult};

pub use step::step_string;
pub use stl::stl_bytes;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    /// One STEP file holding both bodies
    #[default]
    Step,
    /// Binary STL, one file per body
    Stl,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Step => "step",
            ExportFormat::Stl => "stl",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub bytes: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub files: Vec<ExportedFile>,
}

impl ExportReport {
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.bytes).sum()
    }
}

/// Paths written for `output`: the file itself for STEP, or
/// `<stem>_body.stl` and `<stem>_text.stl` beside it for STL
pub fn output_paths(output: &Path, format: ExportFormat) -> Vec<PathBuf> {
    match format {
        ExportFormat::Step => vec![output.to_path_buf()],
        ExportFormat::Stl => {
            let stem = output
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "label".to_string());
            let dir = output.parent().unwrap_or(Path::new(""));
            vec![
                dir.join(format!("{stem}_body.stl")),
                dir.join(format!("{stem}_text.stl")),
            ]
        }
    }
}

/// Write `assembly` to `output` in `format`
pub fn export(assembly: &LabelAssembly, output: &Path, format: ExportFormat) -> LabelResult<ExportReport> {
    let paths = output_paths(output, format);
    let contents: Vec<Vec<u8>> = match format {
        ExportFormat::Step => {
            let product = output
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "label".to_string());
            vec![step_string(&product, &[&assembly.body, &assembly.insert])?.into_bytes()]
        }
        ExportFormat::Stl => vec![
            encode_stl(&assembly.body, &paths[0])?,
            encode_stl(&assembly.insert, &paths[1])?,
        ],
    };

    let mut staged = Vec::with_capacity(paths.len());
    for (path, data) in paths.iter().zip(&contents) {
        staged.push((stage(path, data)?, path));
    }

    let mut report = ExportReport::default();
    for (temp, path) in staged {
        let persisted = temp
            .persist(path)
            .map_err(|e| LabelError::IoWrite {
                path: path.clone(),
                source: e.error,
            })
            .and_then(|_| {
                std::fs::metadata(path)
                    .map(|m| m.len())
                    .map_err(|e| LabelError::IoRead {
                        path: path.clone(),
                        source: e,
                    })
            });
        let bytes = match persisted {
            Ok(bytes) => bytes,
            Err(e) => {
                // Staged files still pending are removed when dropped
                remove_written(&report);
                return Err(e);
            }
        };
        info!(path = %path.display(), bytes, "wrote {}", format);
        report.files.push(ExportedFile {
            path: path.clone(),
            bytes,
        });
    }

    Ok(report)
}

/// Undo the files of a partially persisted label
fn remove_written(report: &ExportReport) {
    for file in &report.files {
        if let Err(e) = std::fs::remove_file(&file.path) {
            warn!(path = %file.path.display(), error = %e, "could not remove partial output");
        }
    }
}

fn encode_stl(mesh: &crate::geometry::TriMesh, path: &Path) -> LabelResult<Vec<u8>> {
    stl_bytes(mesh).map_err(|e| LabelError::IoWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Write `data` to a temporary file next to `path`
fn stage(path: &Path, data: &[u8]) -> LabelResult<NamedTempFile> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let io_err = |source| LabelError::IoWrite {
        path: path.to_path_buf(),
        source,
    };

    std::fs::create_dir_all(&dir).map_err(io_err)?;
    let mut temp = NamedTempFile::new_in(&dir).map_err(io_err)?;
    temp.write_all(data).map_err(io_err)?;
    temp.flush().map_err(io_err)?;
    Ok(temp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{TriMesh, Vec3};

    fn assembly() -> LabelAssembly {
        let mut body = TriMesh::new("label_body");
        body.push_triangle(Vec3::new(0.0, 0.0, 0.0), Vec3::X, Vec3::Y, Vec3::Z);
        let mut insert = TriMesh::new("text_insert");
        insert.push_triangle(Vec3::new(0.0, 0.0, 1.0), Vec3::X, Vec3::Y, Vec3::Z);
        LabelAssembly { body, insert }
    }

    #[test]
    fn test_output_paths() {
        assert_eq!(
            output_paths(Path::new("out/tags.step"), ExportFormat::Step),
            vec![PathBuf::from("out/tags.step")]
        );
        assert_eq!(
            output_paths(Path::new("out/tags.stl"), ExportFormat::Stl),
            vec![
                PathBuf::from("out/tags_body.stl"),
                PathBuf::from("out/tags_text.stl")
            ]
        );
    }

    #[test]
    fn test_stl_export_writes_both_bodies() {
        let dir = tempfile::tempdir().unwrap();
        let report = export(&assembly(), &dir.path().join("label.stl"), ExportFormat::Stl).unwrap();

        assert_eq!(report.files.len(), 2);
        for file in &report.files {
            assert!(file.path.exists());
            assert_eq!(file.bytes, 84 + 50);
        }
        assert_eq!(report.total_bytes(), 2 * (84 + 50));
        // Only the persisted files remain
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn test_failed_export_leaves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let empty = LabelAssembly {
            body: TriMesh::new("label_body"),
            insert: TriMesh::new("text_insert"),
        };
        let output = dir.path().join("label.step");
        assert!(export(&empty, &output, ExportFormat::Step).is_err());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_failed_persist_removes_written_files() {
        let dir = tempfile::tempdir().unwrap();
        // The text file cannot replace an existing directory
        std::fs::create_dir(dir.path().join("tags_text.stl")).unwrap();

        let err = export(&assembly(), &dir.path().join("tags.stl"), ExportFormat::Stl).unwrap_err();
        assert!(matches!(err, LabelError::IoWrite { .. }));
        assert!(!dir.path().join("tags_body.stl").exists());
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["tags_text.stl"]);
    }

    #[test]
    fn test_format_names() {
        assert_eq!(ExportFormat::Step.to_string(), "step");
        assert_eq!(ExportFormat::Stl.extension(), "stl");
        assert_eq!(ExportFormat::default(), ExportFormat::Step);
    }
}
