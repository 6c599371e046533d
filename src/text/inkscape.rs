//! Text-to-path conversion through the Inkscape command line.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use super::TextOutliner;
use crate::error::{LabelError, LabelResult};

#[cfg(target_os = "macos")]
const PLATFORM_DEFAULT: Option<&str> = Some("/Applications/Inkscape.app/Contents/MacOS/inkscape");
#[cfg(target_os = "windows")]
const PLATFORM_DEFAULT: Option<&str> = Some(r"C:\Program Files\Inkscape\bin\inkscape.exe");
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const PLATFORM_DEFAULT: Option<&str> = None;

#[cfg(target_os = "windows")]
const EXECUTABLE: &str = "inkscape.exe";
#[cfg(not(target_os = "windows"))]
const EXECUTABLE: &str = "inkscape";

/// An Inkscape executable that has been found on this machine
#[derive(Debug, Clone)]
pub struct Inkscape {
    program: PathBuf,
}

impl Inkscape {
    /// Resolve the executable: an explicit path, the platform's install
    /// location, then `PATH`.
    pub fn locate(explicit: Option<&Path>) -> LabelResult<Self> {
        if let Some(path) = explicit {
            return if path.is_file() {
                Ok(Self::at(path))
            } else {
                Err(LabelError::ToolNotFound {
                    program: path.display().to_string(),
                })
            };
        }

        if let Some(default) = PLATFORM_DEFAULT.map(Path::new) {
            if is_executable(default) {
                return Ok(Self::at(default));
            }
        }

        find_on_path(EXECUTABLE, std::env::var_os("PATH"))
            .map(|p| Self::at(&p))
            .ok_or_else(|| LabelError::ToolNotFound {
                program: EXECUTABLE.to_string(),
            })
    }

    pub fn at(program: &Path) -> Self {
        debug!(program = %program.display(), "using inkscape");
        Self {
            program: program.to_path_buf(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl TextOutliner for Inkscape {
    fn outline(&self, text_svg: &str) -> LabelResult<String> {
        let workdir = tempfile::tempdir().map_err(|e| LabelError::IoWrite {
            path: std::env::temp_dir(),
            source: e,
        })?;
        let input = workdir.path().join("text_input.svg");
        let output = workdir.path().join("text_outlined.svg");

        std::fs::write(&input, text_svg).map_err(|e| LabelError::IoWrite {
            path: input.clone(),
            source: e,
        })?;

        info!(program = %self.program.display(), "converting text to paths");
        let result = Command::new(&self.program)
            .arg(&input)
            .arg("--export-type=svg")
            .arg("--export-text-to-path")
            .arg(format!("--export-filename={}", output.display()))
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => LabelError::ToolNotFound {
                    program: self.program.display().to_string(),
                },
                _ => LabelError::ToolFailed {
                    program: self.program.display().to_string(),
                    status: "not started".to_string(),
                    stderr: e.to_string(),
                },
            })?;

        if !result.status.success() {
            return Err(LabelError::ToolFailed {
                program: self.program.display().to_string(),
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        std::fs::read_to_string(&output).map_err(|e| LabelError::IoRead {
            path: output.clone(),
            source: e,
        })
    }
}

/// Search `path_var` (a `PATH`-style list) for an executable file
fn find_on_path(name: &str, path_var: Option<std::ffi::OsString>) -> Option<PathBuf> {
    let path_var = path_var?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(name))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_missing_program() {
        let err = Inkscape::locate(Some(Path::new("/nonexistent/bin/inkscape"))).unwrap_err();
        match err {
            LabelError::ToolNotFound { program } => {
                assert_eq!(program, "/nonexistent/bin/inkscape");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_explicit_existing_program() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let inkscape = Inkscape::locate(Some(file.path())).unwrap();
        assert_eq!(inkscape.program(), file.path());
    }

    /// Write `contents` as an executable file
    fn write_program(path: &Path, contents: &str) {
        std::fs::write(path, contents).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
    }

    #[test]
    fn test_find_on_path() {
        let dir = tempfile::tempdir().unwrap();
        let exe = dir.path().join(EXECUTABLE);
        write_program(&exe, "");

        let path_var = std::env::join_paths([Path::new("/nonexistent"), dir.path()]).unwrap();
        assert_eq!(find_on_path(EXECUTABLE, Some(path_var)), Some(exe));
    }

    #[test]
    fn test_find_on_empty_path() {
        assert_eq!(find_on_path(EXECUTABLE, None), None);
        let dir = tempfile::tempdir().unwrap();
        let path_var = std::env::join_paths([dir.path()]).unwrap();
        assert_eq!(find_on_path(EXECUTABLE, Some(path_var)), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_find_on_path_skips_non_executable() {
        let plain = tempfile::tempdir().unwrap();
        std::fs::write(plain.path().join(EXECUTABLE), "").unwrap();
        let path_var = std::env::join_paths([plain.path()]).unwrap();
        assert_eq!(find_on_path(EXECUTABLE, Some(path_var)), None);

        let bin = tempfile::tempdir().unwrap();
        let exe = bin.path().join(EXECUTABLE);
        write_program(&exe, "");
        let path_var = std::env::join_paths([plain.path(), bin.path()]).unwrap();
        assert_eq!(find_on_path(EXECUTABLE, Some(path_var)), Some(exe));
    }

    /// Stands in for Inkscape: checks the export flags, copies the input to
    /// the export filename and records the input path next to itself
    #[cfg(unix)]
    const FAKE_INKSCAPE: &str = r#"#!/bin/sh
[ "$2" = "--export-type=svg" ] || { echo "bad type: $2" >&2; exit 2; }
[ "$3" = "--export-text-to-path" ] || { echo "bad flag: $3" >&2; exit 3; }
case "$4" in
  --export-filename=*) out="${4#--export-filename=}" ;;
  *) echo "bad output: $4" >&2; exit 4 ;;
esac
printf '%s' "$1" > "$(dirname "$0")/last_input"
cp "$1" "$out"
"#;

    #[cfg(unix)]
    #[test]
    fn test_outline_runs_program() {
        let bin = tempfile::tempdir().unwrap();
        let program = bin.path().join("inkscape");
        write_program(&program, FAKE_INKSCAPE);

        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><text>Nuts &amp; Bolts</text></svg>"#;
        let outlined = Inkscape::at(&program).outline(svg).unwrap();
        assert_eq!(outlined, svg);

        // The scratch directory is gone once outlining returns
        let input = std::fs::read_to_string(bin.path().join("last_input")).unwrap();
        let input = Path::new(&input);
        assert!(input.ends_with("text_input.svg"));
        assert!(!input.exists());
        assert!(!input.parent().unwrap().exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_outline_reports_stderr() {
        let bin = tempfile::tempdir().unwrap();
        let program = bin.path().join("inkscape");
        write_program(&program, "#!/bin/sh\necho 'font not found' >&2\nexit 1\n");

        match Inkscape::at(&program).outline("<svg/>").unwrap_err() {
            LabelError::ToolFailed { stderr, .. } => assert_eq!(stderr, "font not found"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_failing_tool_reports_error() {
        // A file that exists but cannot be executed as a program
        let file = tempfile::NamedTempFile::new().unwrap();
        let inkscape = Inkscape::at(file.path());
        let err = inkscape.outline("<svg/>").unwrap_err();
        assert!(matches!(
            err,
            LabelError::ToolFailed { .. } | LabelError::ToolNotFound { .. }
        ));
    }
}
