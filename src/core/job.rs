//! Jobs, prompt presets and redo tokens.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::util::serde::{ActorId, UnixSeconds};

/// Negative prompt used by [`Preset::Raw`] when none is given.
pub const DEFAULT_NEGATIVE: &str = "text, blurry, fuzziness, watermark";

/// Negative prompt of [`Preset::Realistic`].
pub const REALISTIC_NEGATIVE: &str = "locality, ugly, noise, blur, low resolution, text, \
    worst quality, deformed, deformed eyes, out of focus, monochrome, anthropomorphic, watermark";

/// Negative prompt of [`Preset::Logo`].
pub const LOGO_NEGATIVE: &str = "old, vintage, retro, classic, traditional, ancient, outdated, \
    detailed, obsolete, old-fashioned, text, blurry, fuzziness, watermark";

/// Suffix appended to logo prompts.
pub const LOGO_SUFFIX: &str = ", digital art, minimal logo";

/// One request for the compute capability. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Positive prompt.
    pub positive_parameter: String,
    /// Negative prompt.
    pub negative_parameter: String,
    /// Actor that submitted the job.
    pub submitted_by: ActorId,
    /// Submission time.
    pub submitted_at: UnixSeconds,
}

impl Job {
    /// Build a job from raw parameters.
    pub fn new(
        positive: impl Into<String>,
        negative: impl Into<String>,
        submitted_by: ActorId,
        submitted_at: UnixSeconds,
    ) -> Self {
        Self {
            positive_parameter: positive.into(),
            negative_parameter: negative.into(),
            submitted_by,
            submitted_at,
        }
    }
}

/// Prompt presets exposed to users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Preset {
    /// Raw prompts, passed through unchanged.
    Raw {
        /// Positive prompt.
        positive: String,
        /// Optional negative prompt; [`DEFAULT_NEGATIVE`] when absent.
        negative: Option<String>,
    },
    /// Photo-realistic rendering of a prompt.
    Realistic {
        /// User prompt.
        prompt: String,
    },
    /// Minimal digital-art logo from a prompt.
    Logo {
        /// User prompt.
        prompt: String,
    },
}

/// Parameters as the user typed them, for display next to the result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayParameters {
    /// Positive text shown to the user.
    pub positive: String,
    /// Negative text shown to the user, if the user gave one.
    pub negative: Option<String>,
}

impl Preset {
    /// Expand the preset into a job plus its display form.
    #[must_use]
    pub fn into_job(self, by: ActorId, at: UnixSeconds) -> (Job, DisplayParameters) {
        match self {
            Self::Raw { positive, negative } => {
                let display = DisplayParameters {
                    positive: positive.clone(),
                    negative: negative.clone(),
                };
                let negative = negative.unwrap_or_else(|| DEFAULT_NEGATIVE.to_string());
                (Job::new(positive, negative, by, at), display)
            }
            Self::Realistic { prompt } => {
                let display = DisplayParameters {
                    positive: prompt.clone(),
                    negative: None,
                };
                (Job::new(prompt, REALISTIC_NEGATIVE, by, at), display)
            }
            Self::Logo { prompt } => {
                let positive = format!("{prompt}{LOGO_SUFFIX}");
                let display = DisplayParameters {
                    positive: prompt,
                    negative: None,
                };
                (Job::new(positive, LOGO_NEGATIVE, by, at), display)
            }
        }
    }
}

/// Captured job parameters that can be resubmitted any number of times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedoToken {
    /// Token identifier.
    pub id: Uuid,
    /// Exact positive prompt of the captured job.
    pub positive_parameter: String,
    /// Exact negative prompt of the captured job.
    pub negative_parameter: String,
    /// Original submitter.
    pub submitted_by: ActorId,
    /// Original submission time.
    pub submitted_at: UnixSeconds,
    /// Human-readable variant of the parameters.
    pub display: DisplayParameters,
}

impl RedoToken {
    /// Capture `job`, displaying its parameters verbatim.
    #[must_use]
    pub fn capture(job: &Job) -> Self {
        let display = DisplayParameters {
            positive: job.positive_parameter.clone(),
            negative: Some(job.negative_parameter.clone()),
        };
        Self::capture_with_display(job, display)
    }

    /// Capture `job` with a separate display form.
    #[must_use]
    pub fn capture_with_display(job: &Job, display: DisplayParameters) -> Self {
        Self {
            id: Uuid::new_v4(),
            positive_parameter: job.positive_parameter.clone(),
            negative_parameter: job.negative_parameter.clone(),
            submitted_by: job.submitted_by,
            submitted_at: job.submitted_at,
            display,
        }
    }

    /// Fresh job with the captured parameters and a new submitter.
    #[must_use]
    pub fn to_job(&self, by: ActorId, at: UnixSeconds) -> Job {
        Job::new(
            self.positive_parameter.clone(),
            self.negative_parameter.clone(),
            by,
            at,
        )
    }
}

/// Encoded image produced by the compute capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    /// Encoded bytes (PNG for the diffusion backend).
    pub bytes: Vec<u8>,
}

impl Image {
    /// Wrap encoded bytes.
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Size of the encoded image.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the image holds no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
