//! Single-use context passed from one screen to the next.
//!
//! A [`Handoff`] is what a screen attaches to a transition. The receiving
//! screen validates it through one of the `into_*` guards, which either yield
//! the typed context that screen needs or a [`Redirect`] to the nearest valid
//! entry point. An absent carrier (deep link) is `Handoff::default()`.

use std::fmt;

use shared::{
    domain::{CandidateId, Identifier, Role, SessionId},
    protocol::FeedbackReport,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    Upload,
    Dashboard,
    Interview,
    Feedback,
    Progress,
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Screen::Upload => "upload",
            Screen::Dashboard => "dashboard",
            Screen::Interview => "interview",
            Screen::Feedback => "feedback",
            Screen::Progress => "progress",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redirect {
    pub to: Screen,
    pub missing: &'static str,
}

impl fmt::Display for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing {}; continue from the {} screen", self.missing, self.to)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Entry<T> {
    Ready(T),
    Redirect(Redirect),
}

impl<T> Entry<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Entry::Ready(value) => Some(value),
            Entry::Redirect(_) => None,
        }
    }

    pub fn redirect(&self) -> Option<Redirect> {
        match self {
            Entry::Ready(_) => None,
            Entry::Redirect(redirect) => Some(*redirect),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Handoff {
    pub candidate_id: Option<CandidateId>,
    pub candidate_name: Option<String>,
    pub role: Option<Role>,
    pub session_id: Option<SessionId>,
    pub feedback: Option<FeedbackReport>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardContext {
    pub candidate_id: CandidateId,
    pub candidate_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterviewContext {
    pub candidate_id: CandidateId,
    pub role: Role,
    pub candidate_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeedbackContext {
    pub feedback: FeedbackReport,
    pub session_id: Option<SessionId>,
    pub candidate_id: Option<CandidateId>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressContext {
    pub candidate_id: CandidateId,
}

impl Handoff {
    pub fn to_dashboard(candidate_id: CandidateId, candidate_name: Option<String>) -> Self {
        Self {
            candidate_id: Some(candidate_id),
            candidate_name,
            ..Self::default()
        }
    }

    pub fn to_interview(
        candidate_id: CandidateId,
        role: Role,
        candidate_name: Option<String>,
    ) -> Self {
        Self {
            candidate_id: Some(candidate_id),
            candidate_name,
            role: Some(role),
            ..Self::default()
        }
    }

    pub fn to_feedback(
        session_id: SessionId,
        candidate_id: CandidateId,
        role: Role,
        feedback: FeedbackReport,
    ) -> Self {
        Self {
            candidate_id: Some(candidate_id),
            role: Some(role),
            session_id: Some(session_id),
            feedback: Some(feedback),
            ..Self::default()
        }
    }

    pub fn to_progress(candidate_id: CandidateId) -> Self {
        Self {
            candidate_id: Some(candidate_id),
            ..Self::default()
        }
    }

    pub fn into_dashboard(self) -> Entry<DashboardContext> {
        match present(self.candidate_id) {
            Some(candidate_id) => Entry::Ready(DashboardContext {
                candidate_id,
                candidate_name: self.candidate_name,
            }),
            None => Entry::Redirect(Redirect {
                to: Screen::Upload,
                missing: "candidate id",
            }),
        }
    }

    pub fn into_interview(self) -> Entry<InterviewContext> {
        let Some(candidate_id) = present(self.candidate_id) else {
            return Entry::Redirect(Redirect {
                to: Screen::Upload,
                missing: "candidate id",
            });
        };
        let Some(role) = present(self.role) else {
            return Entry::Redirect(Redirect {
                to: Screen::Dashboard,
                missing: "role",
            });
        };
        Entry::Ready(InterviewContext {
            candidate_id,
            role,
            candidate_name: self.candidate_name,
        })
    }

    pub fn into_feedback(self) -> Entry<FeedbackContext> {
        match self.feedback {
            Some(feedback) => Entry::Ready(FeedbackContext {
                feedback,
                session_id: present(self.session_id),
                candidate_id: present(self.candidate_id),
                role: present(self.role),
            }),
            None => Entry::Redirect(Redirect {
                to: Screen::Dashboard,
                missing: "feedback report",
            }),
        }
    }

    pub fn into_progress(self) -> Entry<ProgressContext> {
        match present(self.candidate_id) {
            Some(candidate_id) => Entry::Ready(ProgressContext { candidate_id }),
            None => Entry::Redirect(Redirect {
                to: Screen::Upload,
                missing: "candidate id",
            }),
        }
    }
}

fn present<T: Identifier>(value: Option<T>) -> Option<T> {
    value.filter(|value| !value.is_blank())
}

#[cfg(test)]
#[path = "tests/handoff_tests.rs"]
mod tests;
