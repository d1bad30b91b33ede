//! The per-upload pipeline: validate, classify, build, package.
//!
//! ```text
//! Idle -> Validating -> Validated | Rejected
//!      -> Classifying -> Classified | NoQualifyingSheets
//!      -> Building -> Built | PartiallyFailed
//!      -> Packaging -> Ready | PackagingFailed
//! ```
//!
//! A sheet whose template cannot be built is recorded and skipped; the
//! others are still built and packaged.

use serde::Serialize;

use crate::archive::{package, ArchiveBundle, DownloadSummary, PackagingError};
use crate::classify::qualifying_sheets;
use crate::config::ConverterConfig;
use crate::error::UserMessage;
use crate::template::{ConstructionError, FileNames, TemplateBuilder, TemplateFile};
use crate::validation::{Gate, Upload, ValidationError};

/// Where an upload is in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Validating,
    Validated,
    Rejected,
    Classifying,
    Classified,
    NoQualifyingSheets,
    Building,
    Built,
    PartiallyFailed,
    Packaging,
    Ready,
    PackagingFailed,
}

impl Stage {
    /// Whether the pipeline can stop in this stage.
    ///
    /// `PartiallyFailed` only ends a run when no template was built.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Rejected
                | Self::NoQualifyingSheets
                | Self::Ready
                | Self::PackagingFailed
                | Self::PartiallyFailed
        )
    }
}

/// One progress report. `completed`/`total` count sheets while building and
/// are zero in every other stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub stage: Stage,
    pub completed: usize,
    pub total: usize,
}

/// Receives every stage transition and per-sheet build progress.
pub trait ProgressSink {
    fn report(&mut self, progress: Progress);
}

impl<F: FnMut(Progress)> ProgressSink for F {
    fn report(&mut self, progress: Progress) {
        self(progress);
    }
}

/// A sink that ignores all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _progress: Progress) {}
}

/// Everything one processed upload produced.
#[derive(Debug)]
pub struct OutputBundle {
    pub source_name: String,
    /// Qualifying sheet names, in workbook order.
    pub qualifying: Vec<String>,
    pub templates: Vec<TemplateFile>,
    pub failures: Vec<ConstructionError>,
    pub archive: Option<ArchiveBundle>,
    pub packaging_error: Option<PackagingError>,
}

impl OutputBundle {
    /// `Built` when every qualifying sheet got a template, else `PartiallyFailed`.
    #[must_use]
    pub fn build_stage(&self) -> Stage {
        if self.failures.is_empty() {
            Stage::Built
        } else {
            Stage::PartiallyFailed
        }
    }

    #[must_use]
    pub fn download_summary(&self) -> DownloadSummary {
        DownloadSummary::new(&self.templates)
    }

    pub fn failed_sheets(&self) -> impl Iterator<Item = &str> {
        self.failures.iter().map(|f| f.sheet_name.as_str())
    }
}

/// Result of one pipeline run.
#[derive(Debug)]
pub enum Outcome {
    Rejected {
        source_name: String,
        error: ValidationError,
    },
    /// Not an error: the workbook simply has no data.
    NoQualifyingSheets {
        source_name: String,
        sheet_names: Vec<String>,
    },
    Processed(OutputBundle),
}

impl Outcome {
    /// Terminal stage the run ended in.
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::Rejected { .. } => Stage::Rejected,
            Self::NoQualifyingSheets { .. } => Stage::NoQualifyingSheets,
            Self::Processed(bundle) => {
                if bundle.templates.is_empty() {
                    Stage::PartiallyFailed
                } else if bundle.packaging_error.is_some() {
                    Stage::PackagingFailed
                } else {
                    Stage::Ready
                }
            }
        }
    }

    /// Whether the run produced something to download with no fatal error.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self.stage(), Stage::Ready | Stage::NoQualifyingSheets)
    }

    #[must_use]
    pub fn source_name(&self) -> &str {
        match self {
            Self::Rejected { source_name, .. } | Self::NoQualifyingSheets { source_name, .. } => {
                source_name
            }
            Self::Processed(bundle) => &bundle.source_name,
        }
    }

    #[must_use]
    pub fn bundle(&self) -> Option<&OutputBundle> {
        match self {
            Self::Processed(bundle) => Some(bundle),
            _ => None,
        }
    }

    /// Headline message for the run, if there is anything to tell beyond success.
    #[must_use]
    pub fn user_message(&self) -> Option<UserMessage> {
        match self {
            Self::Rejected { error, .. } => Some(error.user_message()),
            Self::NoQualifyingSheets { sheet_names, .. } => Some(
                UserMessage::new("No sheets with data were found")
                    .with_detail(format!("{} sheet(s) checked", sheet_names.len())),
            ),
            Self::Processed(bundle) => {
                if bundle.templates.is_empty() {
                    Some(
                        UserMessage::new("No templates could be created").with_detail(
                            bundle
                                .failures
                                .iter()
                                .map(ToString::to_string)
                                .collect::<Vec<_>>()
                                .join("; "),
                        ),
                    )
                } else if let Some(err) = &bundle.packaging_error {
                    Some(err.user_message())
                } else if !bundle.failures.is_empty() {
                    Some(UserMessage::new(format!(
                        "{} of {} templates created; skipped: {}",
                        bundle.templates.len(),
                        bundle.qualifying.len(),
                        bundle.failed_sheets().collect::<Vec<_>>().join(", ")
                    )))
                } else {
                    None
                }
            }
        }
    }

    /// Serializable summary of the run.
    #[must_use]
    pub fn report(&self) -> RunReport {
        let bundle = self.bundle();
        RunReport {
            source: self.source_name().to_string(),
            stage: self.stage(),
            message: self.user_message(),
            qualifying: bundle.map(|b| b.qualifying.clone()).unwrap_or_default(),
            templates: bundle.map(|b| b.templates.clone()).unwrap_or_default(),
            failures: bundle
                .map(|b| {
                    b.failures
                        .iter()
                        .map(|f| FailureReport {
                            sheet_name: f.sheet_name.clone(),
                            message: f.user_message(),
                        })
                        .collect()
                })
                .unwrap_or_default(),
            archive: bundle.and_then(|b| b.archive.clone()),
            summary: bundle
                .filter(|b| !b.templates.is_empty())
                .map(OutputBundle::download_summary),
        }
    }
}

/// One skipped sheet in a [`RunReport`].
#[derive(Debug, Clone, Serialize)]
pub struct FailureReport {
    pub sheet_name: String,
    pub message: UserMessage,
}

/// JSON-friendly view of an [`Outcome`].
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub source: String,
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<UserMessage>,
    pub qualifying: Vec<String>,
    pub templates: Vec<TemplateFile>,
    pub failures: Vec<FailureReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<ArchiveBundle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<DownloadSummary>,
}

/// Runs uploads through every stage with one configuration.
#[derive(Debug, Clone, Copy)]
pub struct Pipeline<'c> {
    config: &'c ConverterConfig,
}

impl<'c> Pipeline<'c> {
    #[must_use]
    pub fn new(config: &'c ConverterConfig) -> Self {
        Self { config }
    }

    /// Process one upload, reporting each transition to `sink`.
    pub fn run<S: ProgressSink + ?Sized>(&self, upload: Upload<'_>, sink: &mut S) -> Outcome {
        let source_name = upload.filename.to_string();
        let _span = tracing::info_span!("pipeline", source = %source_name).entered();

        enter(sink, Stage::Validating);
        let workbook = match Gate::new(self.config).admit(&upload) {
            Ok(workbook) => workbook,
            Err(error) => {
                enter(sink, Stage::Rejected);
                return Outcome::Rejected { source_name, error };
            }
        };
        enter(sink, Stage::Validated);

        enter(sink, Stage::Classifying);
        let qualifying = qualifying_sheets(&workbook);
        if qualifying.is_empty() {
            tracing::info!(sheets = workbook.sheets.len(), "no sheet holds data");
            enter(sink, Stage::NoQualifyingSheets);
            return Outcome::NoQualifyingSheets {
                source_name,
                sheet_names: workbook.sheet_names().map(ToString::to_string).collect(),
            };
        }
        tracing::info!(qualifying = ?qualifying, "sheets classified");
        enter(sink, Stage::Classified);

        let total = qualifying.len();
        sink.report(Progress {
            stage: Stage::Building,
            completed: 0,
            total,
        });

        let builder = TemplateBuilder::new(self.config);
        let mut names = FileNames::new();
        let mut templates = Vec::with_capacity(total);
        let mut failures = Vec::new();

        for (idx, sheet_name) in qualifying.iter().enumerate() {
            match builder.build(sheet_name) {
                Ok(mut template) => {
                    template.file_name = names.claim(sheet_name);
                    tracing::info!(
                        sheet = %sheet_name,
                        file = %template.file_name,
                        "template created"
                    );
                    templates.push(template);
                }
                Err(err) => failures.push(err),
            }
            sink.report(Progress {
                stage: Stage::Building,
                completed: idx + 1,
                total,
            });
        }

        let mut bundle = OutputBundle {
            source_name,
            qualifying,
            templates,
            failures,
            archive: None,
            packaging_error: None,
        };
        enter(sink, bundle.build_stage());

        if bundle.templates.is_empty() {
            tracing::warn!(
                failed = bundle.failures.len(),
                "every template failed; nothing to package"
            );
            return Outcome::Processed(bundle);
        }

        enter(sink, Stage::Packaging);
        match package(&bundle.templates, &bundle.source_name) {
            Ok(archive) => {
                bundle.archive = Some(archive);
                enter(sink, Stage::Ready);
            }
            Err(err) => {
                tracing::error!(error = %err, "packaging failed");
                bundle.packaging_error = Some(err);
                enter(sink, Stage::PackagingFailed);
            }
        }

        Outcome::Processed(bundle)
    }
}

fn enter<S: ProgressSink + ?Sized>(sink: &mut S, stage: Stage) {
    tracing::debug!(?stage, "stage");
    sink.report(Progress {
        stage,
        completed: 0,
        total: 0,
    });
}
