use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, RequestBuilder,
};
use serde::de::DeserializeOwned;
use shared::{
    domain::{CandidateId, Identifier, Question, QuestionId, Role, SessionId},
    error::{ErrorBody, ServiceError},
    protocol::{
        AvailableRoles, CompleteInterviewRequest, CreatedProfile, FeedbackReport, Profile,
        ProgressReport, StartInterviewRequest, StartInterviewResponse, StoredFeedback,
        SubmitAnswerAck, SubmitAnswerRequest,
    },
};
use tracing::{debug, warn};

use crate::upload::{ResumeUpload, RESUME_MIME_TYPE};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// A session the service opened: its id and the full, fixed question list.
#[derive(Debug, Clone, PartialEq)]
pub struct StartedInterview {
    pub session_id: SessionId,
    pub questions: Vec<Question>,
}

impl StartedInterview {
    /// Rejects a start payload without a session id or without questions.
    pub fn validate(response: StartInterviewResponse) -> Result<Self, ServiceError> {
        let session_id = response
            .session_id
            .filter(|id| !id.is_blank())
            .ok_or_else(|| ServiceError::malformed("start interview: missing session_id"))?;
        if response.questions.is_empty() {
            return Err(ServiceError::malformed(
                "start interview: service returned no questions",
            ));
        }
        Ok(Self {
            session_id,
            questions: response.questions,
        })
    }
}

/// Remote practice service. One method per round trip; implementations do
/// not retry or cache.
#[async_trait]
pub trait InterviewApi: Send + Sync {
    async fn start_interview(
        &self,
        candidate_id: &CandidateId,
        role: &Role,
    ) -> Result<StartedInterview, ServiceError>;
    async fn submit_answer(
        &self,
        session_id: &SessionId,
        question_id: &QuestionId,
        text: &str,
    ) -> Result<SubmitAnswerAck, ServiceError>;
    async fn complete_interview(&self, session_id: &SessionId)
        -> Result<FeedbackReport, ServiceError>;
    async fn create_profile(&self, upload: &ResumeUpload) -> Result<CreatedProfile, ServiceError>;
    async fn get_profile(&self, candidate_id: &CandidateId) -> Result<Profile, ServiceError>;
    async fn get_available_roles(&self) -> Result<Vec<Role>, ServiceError>;
    async fn get_progress(&self, candidate_id: &CandidateId)
        -> Result<ProgressReport, ServiceError>;
    async fn get_feedback(&self, session_id: &SessionId) -> Result<StoredFeedback, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct HttpInterviewClient {
    http: Client,
    server_url: String,
    timeout: Duration,
}

impl HttpInterviewClient {
    pub fn new(server_url: impl Into<String>) -> Result<Self, ServiceError> {
        Self::with_timeout(server_url, DEFAULT_REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        server_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| ServiceError::Transport(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            http,
            server_url: server_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.server_url)
    }

    fn transport_error(&self, err: reqwest::Error) -> ServiceError {
        if err.is_timeout() {
            ServiceError::Timeout {
                after_ms: self.timeout.as_millis() as u64,
            }
        } else {
            ServiceError::Transport(err.to_string())
        }
    }

    /// Sends the request and returns the raw body of a successful response.
    async fn send_raw(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Vec<u8>, ServiceError> {
        debug!(operation, "sending practice service request");
        let response = request
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = ErrorBody::message_from_body(&body);
            warn!(
                operation,
                status = status.as_u16(),
                detail = message.as_deref().unwrap_or(""),
                "practice service rejected request"
            );
            return Err(ServiceError::status(status.as_u16(), message));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|err| self.transport_error(err))?;
        Ok(bytes.to_vec())
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<T, ServiceError> {
        let body = self.send_raw(operation, request).await?;
        serde_json::from_slice(&body)
            .map_err(|err| ServiceError::malformed(format!("{operation}: {err}")))
    }
}

#[async_trait]
impl InterviewApi for HttpInterviewClient {
    async fn start_interview(
        &self,
        candidate_id: &CandidateId,
        role: &Role,
    ) -> Result<StartedInterview, ServiceError> {
        let response: StartInterviewResponse = self
            .send(
                "start_interview",
                self.http
                    .post(self.url("/api/interview/start"))
                    .form(&StartInterviewRequest {
                        candidate_id: candidate_id.clone(),
                        role: role.clone(),
                    }),
            )
            .await?;
        StartedInterview::validate(response)
    }

    async fn submit_answer(
        &self,
        session_id: &SessionId,
        question_id: &QuestionId,
        text: &str,
    ) -> Result<SubmitAnswerAck, ServiceError> {
        let body = self
            .send_raw(
                "submit_answer",
                self.http
                    .post(self.url("/api/interview/answer"))
                    .form(&SubmitAnswerRequest {
                        session_id: session_id.clone(),
                        question_id: question_id.clone(),
                        answer: text.to_string(),
                    }),
            )
            .await?;
        // The acknowledgement carries no data the session depends on.
        Ok(serde_json::from_slice(&body).unwrap_or_default())
    }

    async fn complete_interview(
        &self,
        session_id: &SessionId,
    ) -> Result<FeedbackReport, ServiceError> {
        self.send(
            "complete_interview",
            self.http
                .post(self.url("/api/interview/complete"))
                .form(&CompleteInterviewRequest {
                    session_id: session_id.clone(),
                }),
        )
        .await
    }

    async fn create_profile(&self, upload: &ResumeUpload) -> Result<CreatedProfile, ServiceError> {
        let file = Part::bytes(upload.bytes().to_vec())
            .file_name(upload.file_name().to_string())
            .mime_str(RESUME_MIME_TYPE)
            .map_err(|err| ServiceError::Transport(err.to_string()))?;
        let form = Form::new()
            .part("file", file)
            .text("target_roles", upload.target_roles_field());

        let created: CreatedProfile = self
            .send(
                "create_profile",
                self.http
                    .post(self.url("/api/profile/create"))
                    .multipart(form),
            )
            .await?;
        if created.success == Some(false) || created.candidate_id.is_blank() {
            return Err(ServiceError::malformed(
                "create profile: service did not return a candidate id",
            ));
        }
        Ok(created)
    }

    async fn get_profile(&self, candidate_id: &CandidateId) -> Result<Profile, ServiceError> {
        self.send(
            "get_profile",
            self.http
                .get(self.url(&format!("/api/profile/{}", candidate_id.as_str()))),
        )
        .await
    }

    async fn get_available_roles(&self) -> Result<Vec<Role>, ServiceError> {
        let roles: AvailableRoles = self
            .send("get_available_roles", self.http.get(self.url("/api/roles")))
            .await?;
        Ok(roles.roles)
    }

    async fn get_progress(&self, candidate_id: &CandidateId) -> Result<ProgressReport, ServiceError> {
        self.send(
            "get_progress",
            self.http
                .get(self.url(&format!("/api/progress/{}", candidate_id.as_str()))),
        )
        .await
    }

    async fn get_feedback(&self, session_id: &SessionId) -> Result<StoredFeedback, ServiceError> {
        self.send(
            "get_feedback",
            self.http
                .get(self.url(&format!("/api/feedback/{}", session_id.as_str()))),
        )
        .await
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
