//! Client side of the interview practice service: the HTTP API client, the
//! session controller that walks one interview from start to feedback, and
//! the hand-off rules between screens.

pub mod api;
pub mod controller;
pub mod error;
pub mod handoff;
pub mod session;
pub mod upload;

pub use api::{HttpInterviewClient, InterviewApi, StartedInterview, DEFAULT_REQUEST_TIMEOUT};
pub use controller::{Advance, SessionController};
pub use error::{SessionError, SessionErrorKind, SessionOperation};
pub use handoff::{
    DashboardContext, Entry, FeedbackContext, Handoff, InterviewContext, ProgressContext,
    Redirect, Screen,
};
pub use session::{InterviewSession, SessionStatus};
pub use upload::{parse_target_roles, ResumeUpload, UploadError, MAX_RESUME_BYTES};
