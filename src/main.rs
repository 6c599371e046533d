use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use toolbox_labels::{
    ExportFormat, Inkscape, JobEvent, LabelError, LabelJob, LabelOptions, LabelText, load_profile,
    read_jobs, run_jobs,
};

/// Generate 3D printable toolbox labels
#[derive(Parser, Debug)]
#[command(name = "toolbox-labels", version, about)]
#[command(after_help = "Example: toolbox-labels \"Socket Wrenches\" -o socket_wrenches.step")]
struct Cli {
    /// Text to display on the label
    #[arg(required_unless_present = "file", conflicts_with = "file")]
    text: Option<String>,

    /// Output file path (default: label.<format>); relative paths go inside --output-dir
    #[arg(short, long, conflicts_with = "file")]
    output: Option<PathBuf>,

    /// Output format: step (single file) or stl (one file per body)
    #[arg(short, long, value_enum, default_value_t = ExportFormat::Step)]
    format: ExportFormat,

    /// Batch file with one label per line
    #[arg(long, value_name = "LABELS")]
    file: Option<PathBuf>,

    /// Directory for generated files
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// SVG file with the clip cross-section
    #[arg(long, default_value = "cross-section.svg")]
    profile: PathBuf,

    /// TTF/OTF font file for the text
    #[arg(long)]
    font: Option<PathBuf>,

    /// Font family used when no font file is given
    #[arg(long, default_value = "sans-serif")]
    font_family: String,

    /// Font size in mm
    #[arg(long, default_value_t = 16.0, value_parser = positive_mm)]
    font_size: f64,

    /// Depth of the text insert in mm
    #[arg(long, default_value_t = 0.8, value_parser = positive_mm)]
    text_depth: f64,

    /// Extra label width around the text in mm
    #[arg(long, default_value_t = 20.0, value_parser = positive_mm)]
    padding: f64,

    /// Path to the Inkscape executable
    #[arg(long, value_name = "PATH")]
    inkscape: Option<PathBuf>,

    /// Suppress progress output and logging
    #[arg(long, short)]
    quiet: bool,

    /// Increase log verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn options(&self) -> LabelOptions {
        LabelOptions {
            font_size: self.font_size,
            font_family: self.font_family.clone(),
            font_file: self.font.clone(),
            padding: self.padding,
            text_depth: self.text_depth,
            ..Default::default()
        }
    }

    fn jobs(&self) -> Result<Vec<LabelJob>> {
        if let Some(file) = &self.file {
            return Ok(read_jobs(file, &self.output_dir, self.format)?);
        }

        let text = LabelText::new(self.text.as_deref().unwrap_or_default())?;
        Ok(vec![LabelJob {
            text: text.text().to_string(),
            output: resolve_output(self.output.as_deref(), &self.output_dir, self.format),
        }])
    }
}

/// A length in mm that must be greater than zero
fn positive_mm(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(format!("must be greater than 0, got {s}"))
    }
}

/// `label.<format>` by default; relative paths are placed in `output_dir`
fn resolve_output(output: Option<&Path>, output_dir: &Path, format: ExportFormat) -> PathBuf {
    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(format!("label.{}", format.extension())));
    if output.is_absolute() {
        output
    } else {
        output_dir.join(output)
    }
}

/// Initialize the tracing subscriber based on verbosity level.
fn init_tracing(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    // RUST_LOG wins over -v
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match verbose {
            0 => "warn",
            1 => "toolbox_labels=info",
            2 => "toolbox_labels=debug",
            _ => "trace",
        };
        EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .with(filter)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let options = cli.options();

    // Check inputs before any label is processed
    if !cli.profile.exists() {
        return Err(LabelError::ProfileNotFound {
            path: cli.profile.clone(),
        }
        .into());
    }
    if let Some(font) = &cli.font {
        if !font.exists() {
            return Err(LabelError::FontNotFound { path: font.clone() }.into());
        }
    }
    let inkscape = Inkscape::locate(cli.inkscape.as_deref())?;
    let jobs = cli.jobs()?;
    info!(labels = jobs.len(), format = %cli.format, "starting");

    let profile = load_profile(&cli.profile, &options)?;
    let say = |line: String| {
        if !cli.quiet {
            println!("{}", line);
        }
    };
    say(format!(
        "✓ Profile loaded and scaled ({:.1} x {:.1}mm)",
        profile.bounds.width(),
        profile.bounds.height()
    ));

    let count = run_jobs(&jobs, &profile, &inkscape, &options, cli.format, |event| match event {
        JobEvent::Started(job) => say(format!("\nGenerating label: \"{}\"", job.text)),
        JobEvent::Finished { label, report, .. } => {
            say(format!(
                "  ✓ Text created (width: {:.1}mm, label: {:.1}mm)",
                label.text_width, label.label_width
            ));
            say(format!(
                "  ✓ Label assembled (volume: {:.0}mm³)",
                label.assembly.body.volume()
            ));
            for file in &report.files {
                say(format!("  ✓ Exported to: {}", file.path.display()));
            }
            say(format!(
                "✓ Label generated successfully ({:.1} KB)",
                report.total_bytes() as f64 / 1024.0
            ));
        }
    })?;

    if cli.file.is_some() {
        say(format!(
            "\n✓ Generated {} labels in {}",
            count,
            cli.output_dir.display()
        ));
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    if let Err(e) = run(&cli) {
        eprintln!("\nError: {}", e);
        for cause in e.chain().skip(1) {
            eprintln!("  Caused by: {}", cause);
        }
        if let Some(label_err) = e.downcast_ref::<LabelError>() {
            eprintln!("  Hint: {}", label_err.hint());
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_label_options() {
        let cli = Cli::try_parse_from(["toolbox-labels", "Pliers"]).unwrap();
        let defaults = LabelOptions::default();
        let options = cli.options();
        assert_eq!(options.font_size, defaults.font_size);
        assert_eq!(options.font_family, defaults.font_family);
        assert_eq!(options.padding, defaults.padding);
        assert_eq!(options.text_depth, defaults.text_depth);
        assert_eq!(cli.format, ExportFormat::Step);
        assert_eq!(cli.profile, PathBuf::from("cross-section.svg"));
    }

    #[test]
    fn test_text_or_file_required() {
        assert!(Cli::try_parse_from(["toolbox-labels"]).is_err());
        assert!(Cli::try_parse_from(["toolbox-labels", "Pliers", "--file", "labels.txt"]).is_err());
        assert!(Cli::try_parse_from(["toolbox-labels", "--file", "labels.txt"]).is_ok());
    }

    #[test]
    fn test_format_flag() {
        let cli = Cli::try_parse_from(["toolbox-labels", "Pliers", "-f", "stl"]).unwrap();
        assert_eq!(cli.format, ExportFormat::Stl);
        assert!(Cli::try_parse_from(["toolbox-labels", "Pliers", "-f", "obj"]).is_err());
    }

    #[test]
    fn test_sizes_must_be_positive() {
        for flag in ["--text-depth", "--padding", "--font-size"] {
            for value in ["0", "-1", "nan", "abc"] {
                let arg = format!("{flag}={value}");
                assert!(
                    Cli::try_parse_from(["toolbox-labels", "Pliers", arg.as_str()]).is_err(),
                    "{arg} accepted"
                );
            }
        }
        let cli = Cli::try_parse_from(["toolbox-labels", "Pliers", "--text-depth", "1.2"]).unwrap();
        assert_eq!(cli.text_depth, 1.2);
    }

    #[test]
    fn test_resolve_output() {
        let dir = Path::new("out");
        assert_eq!(
            resolve_output(None, dir, ExportFormat::Stl),
            PathBuf::from("out/label.stl")
        );
        assert_eq!(
            resolve_output(Some(Path::new("tags.step")), dir, ExportFormat::Step),
            PathBuf::from("out/tags.step")
        );
        let absolute = std::env::temp_dir().join("tags.step");
        assert_eq!(
            resolve_output(Some(&absolute), dir, ExportFormat::Step),
            absolute
        );
    }

    #[test]
    fn test_single_job() {
        let cli = Cli::try_parse_from(["toolbox-labels", "  Hex Keys ", "-o", "hex.step"]).unwrap();
        let jobs = cli.jobs().unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].text, "Hex Keys");
        assert_eq!(jobs[0].output, PathBuf::from("./hex.step"));
    }
}
