//! End-to-end label generation: profile, text, assembly, export.

use std::path::Path;

use tracing::{info, info_span};

use crate::batch::LabelJob;
use crate::builder::{LabelAssembly, LabelBuilder};
use crate::config::LabelOptions;
use crate::error::LabelResult;
use crate::export::{ExportFormat, ExportReport, export};
use crate::profile::{ClipProfile, ScaledProfile};
use crate::text::{LabelText, TextOutliner};

/// A generated label together with the measurements reported to the user
#[derive(Debug, Clone)]
pub struct GeneratedLabel {
    pub text: String,
    pub text_width: f64,
    pub label_width: f64,
    pub assembly: LabelAssembly,
}

/// Progress of a batch run
#[derive(Debug)]
pub enum JobEvent<'a> {
    Started(&'a LabelJob),
    Finished {
        job: &'a LabelJob,
        label: &'a GeneratedLabel,
        report: &'a ExportReport,
    },
}

/// Load the profile SVG and scale it to the label cross-section
pub fn load_profile(path: &Path, options: &LabelOptions) -> LabelResult<ScaledProfile> {
    ClipProfile::load(path, options.tolerance)?.scale_to_dimensions(options)
}

/// Build the body and insert for one line of text
pub fn generate_label(
    text: &str,
    profile: &ScaledProfile,
    outliner: &dyn TextOutliner,
    options: &LabelOptions,
) -> LabelResult<GeneratedLabel> {
    options.validate()?;
    let mut label_text = LabelText::new(text)?;
    let geometry = label_text.create_text(outliner, options)?.clone();
    let text_width = geometry.width();
    let label_width = geometry.label_width(options);

    let assembly = LabelBuilder::new(profile, &geometry, label_width, options)?.build()?;
    info!(
        text = label_text.text(),
        label_width,
        body_volume = assembly.body.volume(),
        "label assembled"
    );

    Ok(GeneratedLabel {
        text: label_text.text().to_string(),
        text_width,
        label_width,
        assembly,
    })
}

/// Generate and export every job in order, stopping at the first failure.
/// Returns the number of labels written.
pub fn run_jobs<F>(
    jobs: &[LabelJob],
    profile: &ScaledProfile,
    outliner: &dyn TextOutliner,
    options: &LabelOptions,
    format: ExportFormat,
    mut on_event: F,
) -> LabelResult<usize>
where
    F: FnMut(JobEvent<'_>),
{
    for job in jobs {
        let _span = info_span!("label", text = %job.text).entered();
        on_event(JobEvent::Started(job));

        let label = generate_label(&job.text, profile, outliner, options)?;
        let report = export(&label.assembly, &job.output, format)?;

        on_event(JobEvent::Finished {
            job,
            label: &label,
            report: &report,
        });
    }
    Ok(jobs.len())
}
