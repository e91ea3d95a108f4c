use std::fmt;

use serde::{
    de::{MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::domain::{CandidateId, Question, QuestionId, Role, SessionId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartInterviewRequest {
    pub candidate_id: CandidateId,
    pub role: Role,
}

/// Session opened by the service. Fields are optional on the wire so the
/// client can report a missing id or an empty question list precisely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StartInterviewResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<SessionId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_questions: Option<usize>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitAnswerRequest {
    pub session_id: SessionId,
    pub question_id: QuestionId,
    pub answer: String,
}

/// Acknowledgement of a recorded answer. The counters are informational.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitAnswerAck {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answered: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteInterviewRequest {
    pub session_id: SessionId,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EvaluationScores {
    pub overall_score: f64,
    pub communication_clarity: f64,
    pub technical_accuracy: f64,
    pub confidence_score: f64,
    pub relevance_score: f64,
}

/// Scored evaluation produced by the service when a session completes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackReport {
    pub evaluation: EvaluationScores,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness_score: Option<f64>,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub skill_gaps: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub improvement_roadmap: ImprovementRoadmap,
}

impl FeedbackReport {
    /// Readiness when the service computed one, otherwise the overall score.
    pub fn headline_score(&self) -> f64 {
        self.readiness_score.unwrap_or(self.evaluation.overall_score)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoadmapPeriod {
    pub period: String,
    pub actions: Vec<String>,
}

/// Action items keyed by time horizon (`week_1`, `month_1`, ...), kept in the
/// order the service listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImprovementRoadmap(pub Vec<RoadmapPeriod>);

impl ImprovementRoadmap {
    pub fn periods(&self) -> impl Iterator<Item = &RoadmapPeriod> {
        self.0.iter()
    }

    pub fn get(&self, period: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|entry| entry.period == period)
            .map(|entry| entry.actions.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ImprovementRoadmap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in &self.0 {
            map.serialize_entry(&entry.period, &entry.actions)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ImprovementRoadmap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RoadmapVisitor;

        impl<'de> Visitor<'de> for RoadmapVisitor {
            type Value = ImprovementRoadmap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of period to action list")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut periods = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((period, actions)) = access.next_entry::<String, Vec<String>>()? {
                    periods.push(RoadmapPeriod { period, actions });
                }
                Ok(ImprovementRoadmap(periods))
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(ImprovementRoadmap::default())
            }
        }

        deserializer.deserialize_any(RoadmapVisitor)
    }
}

/// Feedback fetched again by session id after the session completed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFeedback {
    pub session_id: SessionId,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(flatten)]
    pub report: FeedbackReport,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub candidate_id: CandidateId,
    pub name: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Vec<serde_json::Value>,
    #[serde(default)]
    pub education: Vec<serde_json::Value>,
    #[serde(default)]
    pub projects: Vec<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub target_roles: Vec<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    pub candidate_id: CandidateId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub skills_count: usize,
    #[serde(default)]
    pub experience_count: usize,
    #[serde(default)]
    pub projects_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableRoles {
    #[serde(default)]
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionHistoryEntry {
    pub date: String,
    pub role: Role,
    pub overall_score: f64,
    pub communication: f64,
    pub technical: f64,
    pub confidence: f64,
}

/// Completed-session history. A candidate without completed sessions only
/// gets `total_sessions == 0` and a message; the rest defaults to empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressReport {
    pub candidate_id: CandidateId,
    #[serde(default)]
    pub total_sessions: usize,
    #[serde(default)]
    pub current_readiness_score: f64,
    #[serde(default)]
    pub session_history: Vec<SessionHistoryEntry>,
    #[serde(default)]
    pub roles_practiced: Vec<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ProgressReport {
    pub fn latest(&self) -> Option<&SessionHistoryEntry> {
        self.session_history.last()
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
