use std::fmt;

use shared::domain::{Answer, CandidateId, Question, Role, SessionId};

use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionStatus {
    #[default]
    Uninitialized,
    Active,
    Completing,
    Completed,
    Failed,
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionStatus::Uninitialized => "uninitialized",
            SessionStatus::Active => "active",
            SessionStatus::Completing => "completing",
            SessionStatus::Completed => "completed",
            SessionStatus::Failed => "failed",
        })
    }
}

/// One interview attempt: the question list the service issued, how far the
/// candidate got, and what they answered.
///
/// Only [`crate::controller::SessionController`] mutates a session; everything
/// else reads cloned snapshots. `answers().len() == cursor()` always holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterviewSession {
    session_id: Option<SessionId>,
    candidate_id: Option<CandidateId>,
    role: Option<Role>,
    questions: Vec<Question>,
    cursor: usize,
    answers: Vec<Answer>,
    status: SessionStatus,
    last_error: Option<SessionError>,
}

impl InterviewSession {
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    pub fn candidate_id(&self) -> Option<&CandidateId> {
        self.candidate_id.as_ref()
    }

    pub fn role(&self) -> Option<&Role> {
        self.role.as_ref()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref()
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.cursor)
    }

    /// True while the question under the cursor is the final one, i.e. the
    /// next accepted answer should be followed by completion.
    pub fn is_last_question(&self) -> bool {
        !self.questions.is_empty() && self.cursor == self.questions.len() - 1
    }

    pub fn all_answered(&self) -> bool {
        !self.questions.is_empty() && self.cursor == self.questions.len()
    }

    pub fn total_questions(&self) -> usize {
        self.questions.len()
    }

    /// 1-based position of the question being answered, for "3 / 10" headers.
    pub fn position(&self) -> usize {
        (self.cursor + 1).min(self.questions.len())
    }

    pub(crate) fn activate(
        &mut self,
        session_id: SessionId,
        candidate_id: CandidateId,
        role: Role,
        questions: Vec<Question>,
    ) {
        self.session_id = Some(session_id);
        self.candidate_id = Some(candidate_id);
        self.role = Some(role);
        self.questions = questions;
        self.cursor = 0;
        self.answers.clear();
        self.status = SessionStatus::Active;
        self.last_error = None;
    }

    pub(crate) fn record_answer(&mut self, answer: Answer) {
        debug_assert!(self.cursor < self.questions.len());
        self.answers.push(answer);
        self.cursor += 1;
        self.last_error = None;
    }

    pub(crate) fn set_status(&mut self, status: SessionStatus) {
        self.status = status;
    }

    pub(crate) fn record_error(&mut self, error: SessionError) {
        self.last_error = Some(error);
    }

    pub(crate) fn clear_error(&mut self) {
        self.last_error = None;
    }
}
