use std::fmt;

use shared::error::ServiceError;
use thiserror::Error;

use crate::session::SessionStatus;

/// Mutating operations the session controller performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionOperation {
    Start,
    Submit,
    Complete,
}

impl fmt::Display for SessionOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionOperation::Start => "start the session",
            SessionOperation::Submit => "submit an answer",
            SessionOperation::Complete => "complete the session",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("missing {missing}; pick a profile and role before starting an interview")]
    MissingContext { missing: &'static str },
    #[error("please provide an answer")]
    EmptyAnswer,
    #[error("failed to start interview session: {0}")]
    SessionStartFailed(#[source] ServiceError),
    #[error("failed to submit answer: {0}")]
    SubmitFailed(#[source] ServiceError),
    #[error("failed to complete interview: {0}")]
    CompletionFailed(#[source] ServiceError),
    #[error("cannot {operation} while another call for this session is in flight")]
    ConcurrentOperation { operation: SessionOperation },
    #[error("cannot {operation} while the session is {status}")]
    InvalidState {
        operation: SessionOperation,
        status: SessionStatus,
    },
    #[error("every question in this session has already been answered")]
    NoPendingQuestion,
    #[error("only {answered} of {total} questions answered")]
    IncompleteSession { answered: usize, total: usize },
    #[error("session was abandoned")]
    Abandoned,
}

/// Fieldless mirror of [`SessionError`] for matching and UI classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionErrorKind {
    MissingContext,
    EmptyAnswer,
    SessionStartFailed,
    SubmitFailed,
    CompletionFailed,
    ConcurrentOperation,
    InvalidState,
    NoPendingQuestion,
    IncompleteSession,
    Abandoned,
}

impl SessionError {
    pub fn kind(&self) -> SessionErrorKind {
        match self {
            SessionError::MissingContext { .. } => SessionErrorKind::MissingContext,
            SessionError::EmptyAnswer => SessionErrorKind::EmptyAnswer,
            SessionError::SessionStartFailed(_) => SessionErrorKind::SessionStartFailed,
            SessionError::SubmitFailed(_) => SessionErrorKind::SubmitFailed,
            SessionError::CompletionFailed(_) => SessionErrorKind::CompletionFailed,
            SessionError::ConcurrentOperation { .. } => SessionErrorKind::ConcurrentOperation,
            SessionError::InvalidState { .. } => SessionErrorKind::InvalidState,
            SessionError::NoPendingQuestion => SessionErrorKind::NoPendingQuestion,
            SessionError::IncompleteSession { .. } => SessionErrorKind::IncompleteSession,
            SessionError::Abandoned => SessionErrorKind::Abandoned,
        }
    }

    /// Remote failures; re-invoking the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SessionError::SessionStartFailed(_)
                | SessionError::SubmitFailed(_)
                | SessionError::CompletionFailed(_)
                | SessionError::ConcurrentOperation { .. }
        )
    }

    /// The screen has to send the user back to profile or role selection.
    pub fn requires_redirect(&self) -> bool {
        matches!(self, SessionError::MissingContext { .. })
    }

    pub fn service_error(&self) -> Option<&ServiceError> {
        match self {
            SessionError::SessionStartFailed(source)
            | SessionError::SubmitFailed(source)
            | SessionError::CompletionFailed(source) => Some(source),
            _ => None,
        }
    }
}
