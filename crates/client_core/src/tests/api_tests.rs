use super::*;
use anyhow::Result;
use axum::{
    extract::{Form, Multipart, Path},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::{collections::HashMap, sync::Arc};
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};

type Fields = HashMap<String, String>;

async fn spawn_server(app: Router) -> Result<String> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(format!("http://{addr}"))
}

fn capture<T>() -> (Arc<Mutex<Option<oneshot::Sender<T>>>>, oneshot::Receiver<T>) {
    let (tx, rx) = oneshot::channel();
    (Arc::new(Mutex::new(Some(tx))), rx)
}

fn started_payload() -> serde_json::Value {
    json!({
        "session_id": "sess-42",
        "role": "Backend Developer",
        "total_questions": 2,
        "questions": [
            {
                "question_id": "q1",
                "question": "Walk me through a service you designed.",
                "category": "technical",
                "difficulty": "medium"
            },
            {
                "question_id": "q2",
                "question": "Tell me about a disagreement with a teammate.",
                "category": "behavioral",
                "difficulty": "easy"
            }
        ]
    })
}

const COMPLETION_BODY: &str = r#"{
    "evaluation": {
        "overall_score": 7.4,
        "communication_clarity": 8.0,
        "technical_accuracy": 7.0,
        "confidence_score": 7.5,
        "relevance_score": 7.1
    },
    "readiness_score": 71.5,
    "strengths": ["Structured answers"],
    "weaknesses": ["Little quantified impact"],
    "skill_gaps": ["Kubernetes"],
    "recommendations": ["Quantify results"],
    "improvement_roadmap": {
        "week_1": ["Rewrite two answers with numbers"],
        "week_2_3": ["Run a mock system design"],
        "month_1": ["Ship a side project on Kubernetes"]
    }
}"#;

#[tokio::test]
async fn start_interview_posts_form_fields() {
    let (tx, rx) = capture::<Fields>();
    let app = Router::new().route(
        "/api/interview/start",
        post(move |Form(fields): Form<Fields>| {
            let tx = tx.clone();
            async move {
                if let Some(tx) = tx.lock().await.take() {
                    let _ = tx.send(fields);
                }
                Json(started_payload())
            }
        }),
    );
    let server_url = spawn_server(app).await.expect("spawn server");
    let client = HttpInterviewClient::new(format!("{server_url}/")).expect("client");

    let started = client
        .start_interview(&CandidateId::from("cand-1"), &Role::from("Backend Developer"))
        .await
        .expect("start");
    assert_eq!(started.session_id, SessionId::from("sess-42"));
    assert_eq!(started.questions.len(), 2);
    assert_eq!(started.questions[1].prompt, "Tell me about a disagreement with a teammate.");

    let fields = rx.await.expect("fields");
    assert_eq!(fields.get("candidate_id").map(String::as_str), Some("cand-1"));
    assert_eq!(fields.get("role").map(String::as_str), Some("Backend Developer"));
}

#[tokio::test]
async fn submit_answer_posts_form_fields() {
    let (tx, rx) = capture::<Fields>();
    let app = Router::new().route(
        "/api/interview/answer",
        post(move |Form(fields): Form<Fields>| {
            let tx = tx.clone();
            async move {
                if let Some(tx) = tx.lock().await.take() {
                    let _ = tx.send(fields);
                }
                Json(json!({"message": "Answer submitted", "answered": 1, "total": 10}))
            }
        }),
    );
    let server_url = spawn_server(app).await.expect("spawn server");
    let client = HttpInterviewClient::new(server_url).expect("client");

    let ack = client
        .submit_answer(
            &SessionId::from("sess-42"),
            &QuestionId::from("q1"),
            "I split the monolith & kept the API stable.",
        )
        .await
        .expect("submit");
    assert_eq!(ack.answered, Some(1));
    assert_eq!(ack.total, Some(10));

    let fields = rx.await.expect("fields");
    assert_eq!(fields.get("session_id").map(String::as_str), Some("sess-42"));
    assert_eq!(fields.get("question_id").map(String::as_str), Some("q1"));
    assert_eq!(
        fields.get("answer").map(String::as_str),
        Some("I split the monolith & kept the API stable.")
    );
}

#[tokio::test]
async fn error_detail_is_surfaced() {
    let app = Router::new().route(
        "/api/interview/start",
        post(|| async {
            (
                StatusCode::NOT_FOUND,
                Json(json!({"detail": "Candidate profile not found"})),
            )
        }),
    );
    let server_url = spawn_server(app).await.expect("spawn server");
    let client = HttpInterviewClient::new(server_url).expect("client");

    let err = client
        .start_interview(&CandidateId::from("missing"), &Role::from("QA Engineer"))
        .await
        .expect_err("not found");
    assert_eq!(
        err,
        ServiceError::status(404, Some("Candidate profile not found".into()))
    );
}

#[tokio::test]
async fn start_without_questions_is_malformed() {
    let app = Router::new().route(
        "/api/interview/start",
        post(|| async { Json(json!({"session_id": "sess-1", "questions": []})) }),
    );
    let server_url = spawn_server(app).await.expect("spawn server");
    let client = HttpInterviewClient::new(server_url).expect("client");

    let err = client
        .start_interview(&CandidateId::from("cand-1"), &Role::from("QA Engineer"))
        .await
        .expect_err("no questions");
    assert!(matches!(err, ServiceError::Malformed(_)));
}

#[tokio::test]
async fn completion_keeps_roadmap_order_and_requires_evaluation() {
    let app = Router::new().route(
        "/api/interview/complete",
        post(|Form(fields): Form<Fields>| async move {
            if fields.get("session_id").map(String::as_str) == Some("sess-42") {
                ([(header::CONTENT_TYPE, "application/json")], COMPLETION_BODY).into_response()
            } else {
                Json(json!({"readiness_score": 40.0})).into_response()
            }
        }),
    );
    let server_url = spawn_server(app).await.expect("spawn server");
    let client = HttpInterviewClient::new(server_url).expect("client");

    let report = client
        .complete_interview(&SessionId::from("sess-42"))
        .await
        .expect("complete");
    assert_eq!(report.evaluation.overall_score, 7.4);
    assert_eq!(report.headline_score(), 71.5);
    let periods: Vec<&str> = report
        .improvement_roadmap
        .periods()
        .map(|entry| entry.period.as_str())
        .collect();
    assert_eq!(periods, vec!["week_1", "week_2_3", "month_1"]);

    let err = client
        .complete_interview(&SessionId::from("sess-other"))
        .await
        .expect_err("missing evaluation");
    match err {
        ServiceError::Malformed(message) => assert!(message.contains("complete_interview")),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn slow_service_times_out() {
    let app = Router::new().route(
        "/api/roles",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Json(json!({"roles": ["Backend Developer"]}))
        }),
    );
    let server_url = spawn_server(app).await.expect("spawn server");
    let client =
        HttpInterviewClient::with_timeout(server_url, Duration::from_millis(200)).expect("client");

    let err = client.get_available_roles().await.expect_err("timeout");
    assert_eq!(err, ServiceError::Timeout { after_ms: 200 });
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let client = HttpInterviewClient::new(format!("http://{addr}")).expect("client");

    let err = client
        .get_progress(&CandidateId::from("cand-1"))
        .await
        .expect_err("refused");
    assert!(matches!(err, ServiceError::Transport(_)));
}

#[derive(Debug)]
struct ReceivedUpload {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
    target_roles: Option<String>,
}

#[tokio::test]
async fn create_profile_sends_multipart_resume() {
    let (tx, rx) = capture::<ReceivedUpload>();
    let app = Router::new().route(
        "/api/profile/create",
        post(move |mut multipart: Multipart| {
            let tx = tx.clone();
            async move {
                let mut received = ReceivedUpload {
                    file_name: None,
                    content_type: None,
                    bytes: Vec::new(),
                    target_roles: None,
                };
                while let Ok(Some(field)) = multipart.next_field().await {
                    match field.name().unwrap_or_default().to_string().as_str() {
                        "file" => {
                            received.file_name = field.file_name().map(str::to_string);
                            received.content_type = field.content_type().map(str::to_string);
                            received.bytes = field
                                .bytes()
                                .await
                                .map(|bytes| bytes.to_vec())
                                .unwrap_or_default();
                        }
                        "target_roles" => {
                            received.target_roles = field.text().await.ok();
                        }
                        _ => {}
                    }
                }
                if let Some(tx) = tx.lock().await.take() {
                    let _ = tx.send(received);
                }
                Json(json!({
                    "success": true,
                    "candidate_id": "cand-9",
                    "name": "Ada Lovelace",
                    "skills_count": 12,
                    "experience_count": 3,
                    "projects_count": 4,
                    "message": "Profile created successfully"
                }))
            }
        }),
    );
    let server_url = spawn_server(app).await.expect("spawn server");
    let client = HttpInterviewClient::new(server_url).expect("client");

    let pdf = b"%PDF-1.4\n%%EOF\n".to_vec();
    let upload = ResumeUpload::new("resume.pdf", pdf.clone(), "Backend Developer, ML Engineer")
        .expect("upload");
    let created = client.create_profile(&upload).await.expect("create");
    assert_eq!(created.candidate_id, CandidateId::from("cand-9"));
    assert_eq!(created.name, "Ada Lovelace");
    assert_eq!(created.skills_count, 12);

    let received = rx.await.expect("upload");
    assert_eq!(received.file_name.as_deref(), Some("resume.pdf"));
    assert_eq!(received.content_type.as_deref(), Some(RESUME_MIME_TYPE));
    assert_eq!(received.bytes, pdf);
    assert_eq!(
        received.target_roles.as_deref(),
        Some("Backend Developer,ML Engineer")
    );
}

#[tokio::test]
async fn rejected_profile_creation_is_malformed() {
    let app = Router::new().route(
        "/api/profile/create",
        post(|| async { Json(json!({"success": false, "candidate_id": ""})) }),
    );
    let server_url = spawn_server(app).await.expect("spawn server");
    let client = HttpInterviewClient::new(server_url).expect("client");
    let upload = ResumeUpload::new("cv.pdf", b"%PDF-1.4".to_vec(), "Data Analyst").expect("upload");

    let err = client.create_profile(&upload).await.expect_err("rejected");
    assert!(matches!(err, ServiceError::Malformed(_)));
}

#[tokio::test]
async fn read_endpoints_decode_service_payloads() {
    let app = Router::new()
        .route(
            "/api/roles",
            get(|| async {
                Json(json!({"roles": ["Backend Developer", "Data Scientist", "ML Engineer"]}))
            }),
        )
        .route(
            "/api/profile/:candidate_id",
            get(|Path(candidate_id): Path<String>| async move {
                Json(json!({
                    "candidate_id": candidate_id,
                    "name": "Ada Lovelace",
                    "skills": ["Rust", "SQL"],
                    "experience": [{"title": "Engineer", "company": "Analytical Engines"}],
                    "target_roles": ["Backend Developer"]
                }))
            }),
        )
        .route(
            "/api/progress/:candidate_id",
            get(|Path(candidate_id): Path<String>| async move {
                Json(json!({
                    "candidate_id": candidate_id,
                    "total_sessions": 0,
                    "message": "No completed sessions yet"
                }))
            }),
        )
        .route(
            "/api/feedback/:session_id",
            get(|Path(session_id): Path<String>| async move {
                let mut body: serde_json::Value =
                    serde_json::from_str(COMPLETION_BODY).expect("fixture");
                body["session_id"] = json!(session_id);
                body["role"] = json!("Backend Developer");
                body["completed_at"] = json!("2024-05-01T10:00:00");
                Json(body)
            }),
        );
    let server_url = spawn_server(app).await.expect("spawn server");
    let client = HttpInterviewClient::new(server_url).expect("client");

    let roles = client.get_available_roles().await.expect("roles");
    assert_eq!(roles.len(), 3);
    assert_eq!(roles[2], Role::from("ML Engineer"));

    let profile = client
        .get_profile(&CandidateId::from("cand-3"))
        .await
        .expect("profile");
    assert_eq!(profile.candidate_id, CandidateId::from("cand-3"));
    assert_eq!(profile.skills, vec!["Rust".to_string(), "SQL".to_string()]);
    assert_eq!(profile.experience.len(), 1);

    let progress = client
        .get_progress(&CandidateId::from("cand-3"))
        .await
        .expect("progress");
    assert_eq!(progress.total_sessions, 0);
    assert!(progress.latest().is_none());
    assert_eq!(progress.message.as_deref(), Some("No completed sessions yet"));

    let stored = client
        .get_feedback(&SessionId::from("sess-42"))
        .await
        .expect("feedback");
    assert_eq!(stored.session_id, SessionId::from("sess-42"));
    assert_eq!(stored.report.readiness_score, Some(71.5));
    assert_eq!(stored.report.skill_gaps, vec!["Kubernetes".to_string()]);
}
