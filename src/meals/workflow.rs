use std::sync::Arc;

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

use crate::errors::{TrackerError, TrackerResult};
use crate::estimation::{CalorieEstimationDraft, EstimationClient, EstimationRequest, InputKind};
use crate::ledger::repo::LedgerStore;
use crate::ledger::repo_types::{DailyLog, DateKey};

const MISSING_INPUT: &str = "Please enter a description or upload an image.";
const INVALID_DRAFT: &str =
    "Description cannot be empty and calories must be greater than zero.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    Idle,
    Estimating,
    PendingConfirmation,
}

/// A single field change on the held draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DraftEdit {
    Description(String),
    TotalCalories(i64),
}

#[derive(Debug)]
enum State {
    Idle,
    Estimating {
        attempt: u64,
    },
    Pending {
        estimation: CalorieEstimationDraft,
        draft: CalorieEstimationDraft,
    },
}

#[derive(Debug)]
struct Inner {
    state: State,
    input: Option<EstimationRequest>,
    attempts: u64,
    last_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageInputInfo {
    pub mime_type: String,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSnapshot {
    pub phase: Phase,
    pub input: Option<InputKind>,
    pub text: Option<String>,
    pub image: Option<ImageInputInfo>,
    /// Estimate as the service returned it.
    pub estimation: Option<CalorieEstimationDraft>,
    /// User-editable copy of `estimation`.
    pub draft: Option<CalorieEstimationDraft>,
    pub last_error: Option<String>,
}

/// Drives one meal-logging attempt at a time: input, estimate, confirm.
pub struct ConfirmationWorkflow {
    estimator: Arc<dyn EstimationClient>,
    ledger: Arc<LedgerStore>,
    inner: Mutex<Inner>,
}

impl ConfirmationWorkflow {
    pub fn new(estimator: Arc<dyn EstimationClient>, ledger: Arc<LedgerStore>) -> Self {
        Self {
            estimator,
            ledger,
            inner: Mutex::new(Inner {
                state: State::Idle,
                input: None,
                attempts: 0,
                last_error: None,
            }),
        }
    }

    pub async fn snapshot(&self) -> WorkflowSnapshot {
        let inner = self.inner.lock().await;
        let (phase, estimation, draft) = match &inner.state {
            State::Idle => (Phase::Idle, None, None),
            State::Estimating { .. } => (Phase::Estimating, None, None),
            State::Pending { estimation, draft } => (
                Phase::PendingConfirmation,
                Some(estimation.clone()),
                Some(draft.clone()),
            ),
        };
        let (text, image) = match &inner.input {
            Some(EstimationRequest::Text { content }) => (Some(content.clone()), None),
            Some(EstimationRequest::Image { bytes, mime_type }) => (
                None,
                Some(ImageInputInfo {
                    mime_type: mime_type.clone(),
                    size: bytes.len(),
                }),
            ),
            None => (None, None),
        };
        WorkflowSnapshot {
            phase,
            input: inner.input.as_ref().map(EstimationRequest::kind),
            text,
            image,
            estimation,
            draft,
            last_error: inner.last_error.clone(),
        }
    }

    fn ensure_idle(inner: &Inner) -> TrackerResult<()> {
        match inner.state {
            State::Idle => Ok(()),
            State::Estimating { .. } => {
                Err(TrackerError::InvalidState("an estimate is already in progress"))
            }
            State::Pending { .. } => Err(TrackerError::InvalidState(
                "confirm or cancel the pending estimate first",
            )),
        }
    }

    /// Replaces any image input. Empty text only clears previous text.
    pub async fn set_text(&self, content: impl Into<String>) -> TrackerResult<()> {
        let content = content.into();
        let mut inner = self.inner.lock().await;
        Self::ensure_idle(&inner)?;
        if content.is_empty() {
            if matches!(inner.input, Some(EstimationRequest::Text { .. })) {
                inner.input = None;
            }
        } else {
            inner.input = Some(EstimationRequest::Text { content });
        }
        Ok(())
    }

    /// Replaces any text input.
    pub async fn set_image(&self, bytes: Bytes, mime_type: impl Into<String>) -> TrackerResult<()> {
        if bytes.is_empty() {
            return Err(TrackerError::validation("image must not be empty"));
        }
        let mut inner = self.inner.lock().await;
        Self::ensure_idle(&inner)?;
        inner.input = Some(EstimationRequest::Image {
            bytes,
            mime_type: mime_type.into(),
        });
        Ok(())
    }

    pub async fn clear_input(&self) -> TrackerResult<()> {
        let mut inner = self.inner.lock().await;
        Self::ensure_idle(&inner)?;
        inner.input = None;
        inner.last_error = None;
        Ok(())
    }

    /// Runs the estimation for the current input. The lock is released while
    /// the external call is in flight.
    #[instrument(skip(self))]
    pub async fn start(&self) -> TrackerResult<CalorieEstimationDraft> {
        let (attempt, request) = {
            let mut inner = self.inner.lock().await;
            Self::ensure_idle(&inner)?;
            let request = match &inner.input {
                Some(EstimationRequest::Text { content }) if content.trim().is_empty() => None,
                other => other.clone(),
            };
            let Some(request) = request else {
                inner.last_error = Some(MISSING_INPUT.to_string());
                return Err(TrackerError::validation(MISSING_INPUT));
            };
            inner.attempts += 1;
            inner.state = State::Estimating {
                attempt: inner.attempts,
            };
            inner.last_error = None;
            (inner.attempts, request)
        };

        info!(attempt, kind = ?request.kind(), "estimating meal");
        let result = self.estimator.estimate(&request).await;

        let mut inner = self.inner.lock().await;
        if !matches!(inner.state, State::Estimating { attempt: current } if current == attempt) {
            warn!(attempt, "discarding result of abandoned estimate");
            return Err(TrackerError::InvalidState("estimate was abandoned"));
        }
        match result {
            Ok(estimation) => {
                inner.state = State::Pending {
                    draft: estimation.clone(),
                    estimation: estimation.clone(),
                };
                Ok(estimation)
            }
            Err(e) => {
                warn!(attempt, error = %e, "estimation failed; input kept for retry");
                inner.state = State::Idle;
                inner.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Gives up on an in-flight estimate. Input is kept.
    pub async fn abandon(&self) -> TrackerResult<()> {
        let mut inner = self.inner.lock().await;
        match inner.state {
            State::Estimating { attempt } => {
                info!(attempt, "estimate abandoned");
                inner.state = State::Idle;
                Ok(())
            }
            _ => Err(TrackerError::InvalidState("no estimate in progress")),
        }
    }

    /// Changes the held draft only; the service is not queried again.
    pub async fn edit_draft(&self, edit: DraftEdit) -> TrackerResult<CalorieEstimationDraft> {
        self.edit_draft_all([edit]).await
    }

    /// Applies every edit under one lock: either all land or, outside
    /// PendingConfirmation, none do.
    pub async fn edit_draft_all(
        &self,
        edits: impl IntoIterator<Item = DraftEdit>,
    ) -> TrackerResult<CalorieEstimationDraft> {
        let mut inner = self.inner.lock().await;
        let State::Pending { draft, .. } = &mut inner.state else {
            return Err(TrackerError::InvalidState("no estimate awaiting confirmation"));
        };
        for edit in edits {
            match edit {
                DraftEdit::Description(description) => draft.description = description,
                DraftEdit::TotalCalories(calories) => draft.total_calories = calories,
            }
        }
        Ok(draft.clone())
    }

    /// Drops the draft without touching the ledger. Input is kept.
    pub async fn cancel(&self) -> TrackerResult<()> {
        let mut inner = self.inner.lock().await;
        match inner.state {
            State::Pending { .. } | State::Idle => {
                inner.state = State::Idle;
                inner.last_error = None;
                Ok(())
            }
            State::Estimating { .. } => Err(TrackerError::InvalidState(
                "an estimate is in progress; abandon it instead",
            )),
        }
    }

    /// Logs the draft into today's ledger entry and resets the workflow.
    #[instrument(skip(self))]
    pub async fn commit(&self) -> TrackerResult<DailyLog> {
        let mut inner = self.inner.lock().await;
        let (description, calories) = match &inner.state {
            State::Pending { draft, .. } => (draft.description.trim().to_string(), draft.total_calories),
            _ => return Err(TrackerError::InvalidState("no estimate awaiting confirmation")),
        };
        if description.is_empty() || calories <= 0 {
            inner.last_error = Some(INVALID_DRAFT.to_string());
            return Err(TrackerError::validation(INVALID_DRAFT));
        }

        let log = match self
            .ledger
            .append_meal(DateKey::today(), &description, calories)
            .await
        {
            Ok(log) => log,
            Err(e) => {
                inner.last_error = Some(e.to_string());
                return Err(e);
            }
        };

        inner.state = State::Idle;
        inner.input = None;
        inner.last_error = None;
        Ok(log)
    }
}
