//! # toolbox-labels
//!
//! Generates 3D printable toolbox labels from text.
//!
//! ## Features
//!
//! - **Profile import**: The clip cross-section is read from an SVG and scaled to size
//! - **Text outlines**: Text is converted to paths by Inkscape and tessellated
//! - **Assembly**: The profile is extruded to the label width and the text is
//!   recessed into its front face, with a separate insert body filling the recess
//! - **Export**: STEP (one file, both bodies) or STL (one file per body)
//!
//! ## Example
//!
//! ```rust,ignore
//! use toolbox_labels::{ExportFormat, Inkscape, LabelOptions, export, generate_label, load_profile};
//!
//! let options = LabelOptions::default();
//! let profile = load_profile("cross-section.svg".as_ref(), &options).unwrap();
//! let inkscape = Inkscape::locate(None).unwrap();
//! let label = generate_label("Socket Wrenches", &profile, &inkscape, &options).unwrap();
//! export(&label.assembly, "socket_wrenches.step".as_ref(), ExportFormat::Step).unwrap();
//! ```

pub mod batch;
pub mod builder;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod pipeline;
pub mod profile;
pub mod text;

// Re-export commonly used items
pub use batch::{LabelJob, read_jobs, slugify};
pub use builder::{LabelAssembly, LabelBuilder};
pub use config::LabelOptions;
pub use error::{LabelError, LabelResult};
pub use export::{ExportFormat, ExportReport, export};
pub use pipeline::{GeneratedLabel, JobEvent, generate_label, load_profile, run_jobs};
pub use profile::{ClipProfile, ScaledProfile};
pub use text::{Inkscape, LabelText, TextOutliner};
