use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use shared::{
    domain::{Answer, CandidateId, Identifier, Question, Role},
    error::ServiceError,
    protocol::FeedbackReport,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{
    api::InterviewApi,
    error::{SessionError, SessionOperation},
    handoff::{Entry, Handoff},
    session::{InterviewSession, SessionStatus},
};

/// What the interview screen shows after an accepted answer.
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    Next(Question),
    Finished(FeedbackReport),
}

/// Drives one [`InterviewSession`] through start, answers and completion.
///
/// The session lock is never held across a service call. At most one mutating
/// call runs at a time; an overlapping call is rejected with
/// [`SessionError::ConcurrentOperation`] instead of queueing behind it.
pub struct SessionController {
    api: Arc<dyn InterviewApi>,
    session: Mutex<InterviewSession>,
    in_flight: AtomicBool,
    abandoned: AtomicBool,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SessionController {
    pub fn new(api: Arc<dyn InterviewApi>) -> Arc<Self> {
        Arc::new(Self {
            api,
            session: Mutex::new(InterviewSession::default()),
            in_flight: AtomicBool::new(false),
            abandoned: AtomicBool::new(false),
        })
    }

    pub async fn snapshot(&self) -> InterviewSession {
        self.session.lock().await.clone()
    }

    pub async fn status(&self) -> SessionStatus {
        self.session.lock().await.status()
    }

    pub async fn is_last_question(&self) -> bool {
        self.session.lock().await.is_last_question()
    }

    /// The owning screen went away. Responses still in flight are dropped
    /// without touching the session and later calls are refused.
    pub fn abandon(&self) {
        if !self.abandoned.swap(true, Ordering::AcqRel) {
            info!("interview session abandoned by its screen");
        }
    }

    pub fn is_abandoned(&self) -> bool {
        self.abandoned.load(Ordering::Acquire)
    }

    fn begin(&self, operation: SessionOperation) -> Result<InFlightGuard<'_>, SessionError> {
        if self.is_abandoned() {
            return Err(SessionError::Abandoned);
        }
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SessionError::ConcurrentOperation { operation })?;
        Ok(InFlightGuard(&self.in_flight))
    }

    /// Guarded entry for the interview screen: an incomplete hand-off becomes
    /// a redirect, anything else starts the session.
    pub async fn enter(&self, handoff: Handoff) -> Result<Entry<InterviewSession>, SessionError> {
        match handoff.into_interview() {
            Entry::Redirect(redirect) => {
                let _guard = self.begin(SessionOperation::Start)?;
                let mut session = self.session.lock().await;
                if session.status() == SessionStatus::Uninitialized {
                    fail_missing_context(&mut session, redirect.missing);
                }
                Ok(Entry::Redirect(redirect))
            }
            Entry::Ready(context) => self
                .start(&context.candidate_id, &context.role)
                .await
                .map(Entry::Ready),
        }
    }

    pub async fn start(
        &self,
        candidate_id: &CandidateId,
        role: &Role,
    ) -> Result<InterviewSession, SessionError> {
        let _guard = self.begin(SessionOperation::Start)?;
        {
            let mut session = self.session.lock().await;
            if session.status() != SessionStatus::Uninitialized {
                return Err(SessionError::InvalidState {
                    operation: SessionOperation::Start,
                    status: session.status(),
                });
            }
            if candidate_id.is_blank() {
                return Err(fail_missing_context(&mut session, "candidate id"));
            }
            if role.is_blank() {
                return Err(fail_missing_context(&mut session, "role"));
            }
        }

        info!(candidate_id = %candidate_id, role = %role, "starting interview session");
        let result = self.api.start_interview(candidate_id, role).await;

        let mut session = self.session.lock().await;
        if self.is_abandoned() {
            debug!("dropping start response for abandoned session");
            return Err(SessionError::Abandoned);
        }
        let started = result.and_then(|started| {
            if started.questions.is_empty() {
                Err(ServiceError::malformed(
                    "start interview: service returned no questions",
                ))
            } else {
                Ok(started)
            }
        });
        match started {
            Ok(started) => {
                info!(
                    session_id = %started.session_id,
                    questions = started.questions.len(),
                    "interview session active"
                );
                session.activate(
                    started.session_id,
                    candidate_id.clone(),
                    role.clone(),
                    started.questions,
                );
                Ok(session.clone())
            }
            Err(source) => {
                warn!(
                    candidate_id = %candidate_id,
                    role = %role,
                    error = %source,
                    "failed to start interview session"
                );
                let err = SessionError::SessionStartFailed(source);
                session.record_error(err.clone());
                Err(err)
            }
        }
    }

    /// Submits `text` for the question under the cursor. A failure leaves the
    /// cursor and the collected answers exactly as they were.
    pub async fn submit_current_answer(
        &self,
        text: &str,
    ) -> Result<InterviewSession, SessionError> {
        let _guard = self.begin(SessionOperation::Submit)?;
        let (session_id, question_id) = {
            let mut session = self.session.lock().await;
            ensure_active(&session, SessionOperation::Submit)?;
            let pending = session
                .current_question()
                .map(|question| question.question_id.clone());
            let Some(question_id) = pending else {
                let err = SessionError::NoPendingQuestion;
                session.record_error(err.clone());
                return Err(err);
            };
            if text.trim().is_empty() {
                return Err(SessionError::EmptyAnswer);
            }
            let session_id = session
                .session_id()
                .cloned()
                .ok_or(SessionError::InvalidState {
                    operation: SessionOperation::Submit,
                    status: session.status(),
                })?;
            (session_id, question_id)
        };

        debug!(session_id = %session_id, question_id = %question_id, "submitting answer");
        let result = self.api.submit_answer(&session_id, &question_id, text).await;

        let mut session = self.session.lock().await;
        if self.is_abandoned() {
            debug!(session_id = %session_id, "dropping submit response for abandoned session");
            return Err(SessionError::Abandoned);
        }
        match result {
            Ok(_) => {
                session.record_answer(Answer {
                    question_id,
                    text: text.to_string(),
                });
                info!(
                    session_id = %session_id,
                    answered = session.cursor(),
                    total = session.total_questions(),
                    "answer accepted"
                );
                Ok(session.clone())
            }
            Err(source) => {
                warn!(
                    session_id = %session_id,
                    question_id = %question_id,
                    error = %source,
                    "answer submission failed"
                );
                let err = SessionError::SubmitFailed(source);
                session.record_error(err.clone());
                Err(err)
            }
        }
    }

    /// Finalizes a fully answered session. A failed call puts the session
    /// back to active so completion can be retried without re-answering.
    pub async fn complete(&self) -> Result<FeedbackReport, SessionError> {
        let _guard = self.begin(SessionOperation::Complete)?;
        let session_id = {
            let mut session = self.session.lock().await;
            ensure_active(&session, SessionOperation::Complete)?;
            if !session.all_answered() {
                let err = SessionError::IncompleteSession {
                    answered: session.cursor(),
                    total: session.total_questions(),
                };
                session.record_error(err.clone());
                return Err(err);
            }
            let session_id = session
                .session_id()
                .cloned()
                .ok_or(SessionError::InvalidState {
                    operation: SessionOperation::Complete,
                    status: session.status(),
                })?;
            session.set_status(SessionStatus::Completing);
            session_id
        };

        info!(session_id = %session_id, "completing interview session");
        let result = self.api.complete_interview(&session_id).await;

        let mut session = self.session.lock().await;
        if self.is_abandoned() {
            debug!(
                session_id = %session_id,
                "dropping completion response for abandoned session"
            );
            session.set_status(SessionStatus::Active);
            return Err(SessionError::Abandoned);
        }
        match result {
            Ok(report) => {
                session.set_status(SessionStatus::Completed);
                session.clear_error();
                info!(
                    session_id = %session_id,
                    overall_score = report.evaluation.overall_score,
                    "interview session completed"
                );
                Ok(report)
            }
            Err(source) => {
                warn!(session_id = %session_id, error = %source, "interview completion failed");
                session.set_status(SessionStatus::Active);
                let err = SessionError::CompletionFailed(source);
                session.record_error(err.clone());
                Err(err)
            }
        }
    }

    /// Submit, then either move to the next question or, when the answered
    /// question was the last one, complete the session.
    ///
    /// If the answer is accepted but completion fails, the session stays
    /// active with every answer recorded; call [`Self::complete`] to retry.
    pub async fn submit_and_advance(&self, text: &str) -> Result<Advance, SessionError> {
        let was_last = self.is_last_question().await;
        let session = self.submit_current_answer(text).await?;
        if was_last {
            return self.complete().await.map(Advance::Finished);
        }
        session
            .current_question()
            .cloned()
            .map(Advance::Next)
            .ok_or(SessionError::NoPendingQuestion)
    }
}

fn ensure_active(
    session: &InterviewSession,
    operation: SessionOperation,
) -> Result<(), SessionError> {
    if session.status() == SessionStatus::Active {
        Ok(())
    } else {
        Err(SessionError::InvalidState {
            operation,
            status: session.status(),
        })
    }
}

fn fail_missing_context(session: &mut InterviewSession, missing: &'static str) -> SessionError {
    warn!(missing, "interview session cannot start without context");
    let err = SessionError::MissingContext { missing };
    session.set_status(SessionStatus::Failed);
    session.record_error(err.clone());
    err
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
