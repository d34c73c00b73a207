//! Error kinds and the recoverable-error diagnostic sink.
//!
//! Most errors the pipeline encounters are *recoverable*: a single
//! unreadable photograph or a degenerate triangle should not abort a run
//! over thousands of cameras and millions of triangles. Those are recorded
//! as [`Diagnostic`]s in a [`Diagnostics`] sink rather than propagated, per
//! spec §7 ("Recovered errors must not silently zero the output").
//! [`TexturingError`] is reserved for the kinds that are fatal.

use std::fmt;

/// Fatal error conditions the pipeline can report.
#[derive(Debug, thiserror::Error)]
pub enum TexturingError {
    #[error("invalid input: {0}")]
    InputInvalid(String),

    #[error(
        "requested atlas area {requested} texels cannot hold all charts even after \
         minimum-scale packing; try dimension >= {suggested}"
    )]
    PackingOverflow { requested: u64, suggested: u64 },

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

/// A recoverable error occurrence, kept for diagnostics rather than
/// aborting the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// A specific camera's photograph could not be decoded; that camera
    /// contributes nothing from here on (spec §7 `ImageUnavailable`).
    ImageUnavailable { camera_index: usize, path: String, reason: String },
    /// A triangle was degenerate (zero area) or numerically ill-conditioned
    /// for a given camera; it is skipped for that camera (spec §7
    /// `Degenerate`).
    Degenerate { triangle_index: usize, camera_index: Option<usize>, reason: String },
    /// Informational: something worth surfacing but not an error, e.g. an
    /// empty camera set (spec §8 scenario 5).
    Warning(String),
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::ImageUnavailable { camera_index, path, reason } => write!(
                f,
                "image unavailable for camera {camera_index} ({path}): {reason}"
            ),
            Diagnostic::Degenerate { triangle_index, camera_index, reason } => match camera_index {
                Some(c) => write!(f, "triangle {triangle_index} degenerate for camera {c}: {reason}"),
                None => write!(f, "triangle {triangle_index} degenerate: {reason}"),
            },
            Diagnostic::Warning(msg) => write!(f, "{msg}"),
        }
    }
}

/// An append-only log of recovered errors, accumulated over a pipeline run.
///
/// Cheap to clone-free share via `&mut` since every stage appends to the
/// same sink; never resets mid-run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::warn!(%diagnostic, "recovered error");
        self.records.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.records
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for d in &self.records {
            writeln!(f, "{d}")?;
        }
        Ok(())
    }
}
