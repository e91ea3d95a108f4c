//! Terminal screens. Each screen takes the hand-off left by the previous one,
//! renders already-fetched data and, where the flow continues, builds the
//! hand-off for the next screen.

use std::{future::Future, io::Write, path::Path, pin::Pin, sync::Arc};

use anyhow::{Context, Result};
use client_core::{
    Advance, Entry, FeedbackContext, Handoff, InterviewApi, InterviewSession, Redirect,
    ResumeUpload, Screen, SessionController, SessionError,
};
use shared::{
    domain::{Identifier, Role, SessionId},
    protocol::{FeedbackReport, Profile, ProgressReport},
};
use tokio::io::{stdin, AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{info, warn};

const QUIT: &str = ":quit";

/// Line-oriented input from the terminal.
pub struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(stdin()).lines(),
        }
    }

    /// `None` once input is closed.
    pub async fn ask(&mut self, label: &str) -> Result<Option<String>> {
        print!("{label}");
        std::io::stdout().flush().context("failed to flush stdout")?;
        self.lines
            .next_line()
            .await
            .context("failed to read from stdin")
    }
}

pub struct App {
    api: Arc<dyn InterviewApi>,
    prompt: Prompt,
}

impl App {
    pub fn new(api: Arc<dyn InterviewApi>, prompt: Prompt) -> Self {
        Self { api, prompt }
    }

    pub async fn upload(&mut self, resume: &Path, target_roles: &str) -> Result<()> {
        let upload = ResumeUpload::from_path(resume, target_roles).await?;
        info!(
            file = upload.file_name(),
            bytes = upload.bytes().len(),
            roles = upload.target_roles().len(),
            "uploading résumé"
        );
        let created = self
            .api
            .create_profile(&upload)
            .await
            .context("failed to create profile")?;

        println!(
            "Profile created for {} ({})",
            created.name, created.candidate_id
        );
        println!(
            "  {} skills, {} positions, {} projects",
            created.skills_count, created.experience_count, created.projects_count
        );
        let name = Some(created.name).filter(|name| !name.trim().is_empty());
        self.dashboard(Handoff::to_dashboard(created.candidate_id, name))
            .await
    }

    pub async fn dashboard(&mut self, handoff: Handoff) -> Result<()> {
        let context = match handoff.into_dashboard() {
            Entry::Ready(context) => context,
            Entry::Redirect(redirect) => {
                show_redirect(redirect);
                return Ok(());
            }
        };

        let (profile, roles) = tokio::try_join!(
            self.api.get_profile(&context.candidate_id),
            self.api.get_available_roles()
        )
        .context("failed to load the dashboard")?;
        println!("{}", render_dashboard(&profile, &roles));

        let Some(input) = self
            .prompt
            .ask("Pick a role by number or name (blank to quit): ")
            .await?
        else {
            return Ok(());
        };
        let Some(role) = pick_role(&input, &roles) else {
            if !input.trim().is_empty() {
                println!("'{}' is not one of the listed roles", input.trim());
            }
            return Ok(());
        };

        let name = context.candidate_name.or(Some(profile.name));
        self.interview(Handoff::to_interview(context.candidate_id, role, name))
            .await
    }

    pub async fn interview(&mut self, handoff: Handoff) -> Result<()> {
        let controller = SessionController::new(self.api.clone());
        loop {
            match controller.enter(handoff.clone()).await {
                Ok(Entry::Ready(session)) => {
                    println!(
                        "Interview for {} started: {} questions. Type {QUIT} to leave.",
                        session.role().map(Role::as_str).unwrap_or_default(),
                        session.total_questions()
                    );
                    break;
                }
                Ok(Entry::Redirect(redirect)) => {
                    show_redirect(redirect);
                    return Ok(());
                }
                Err(err) if err.is_retryable() => {
                    eprintln!("{err}");
                    let retry = self.prompt.ask("Try again? [y/N] ").await?;
                    if !matches!(retry.as_deref().map(str::trim), Some("y" | "Y")) {
                        return Ok(());
                    }
                }
                Err(err) => return Err(err.into()),
            }
        }

        // One listener for the whole interview: once polled it replaces the
        // default SIGINT handling.
        let interrupt = tokio::signal::ctrl_c();
        tokio::pin!(interrupt);

        // An answer the service did not accept, resent on a blank line.
        let mut unsent: Option<String> = None;
        loop {
            let session = controller.snapshot().await;
            println!();
            println!("{}", render_question(&session));

            let input = tokio::select! {
                line = self.prompt.ask("> ") => line?,
                _ = interrupt.as_mut() => None,
            };
            let Some(input) = input else {
                return leave(&controller);
            };
            if input.trim() == QUIT {
                return leave(&controller);
            }
            let text = match unsent.take() {
                Some(previous) if input.trim().is_empty() => previous,
                _ => input,
            };

            let call = {
                let controller = controller.clone();
                let text = text.clone();
                async move { controller.submit_and_advance(&text).await }
            };
            let Some(outcome) = until_interrupted(call, interrupt.as_mut()).await? else {
                return leave(&controller);
            };

            match outcome {
                Ok(Advance::Next(_)) => {}
                Ok(Advance::Finished(report)) => {
                    return self.finish(&controller, report).await;
                }
                Err(SessionError::CompletionFailed(source)) => {
                    eprintln!(
                        "Every answer was saved but the interview could not be completed: {source}"
                    );
                    return self.retry_completion(&controller, interrupt.as_mut()).await;
                }
                Err(err @ SessionError::SubmitFailed(_)) => {
                    eprintln!("{err}");
                    println!("Press enter to resend this answer or type a new one.");
                    unsent = Some(text);
                }
                Err(err) => eprintln!("{err}"),
            }
        }
    }

    async fn retry_completion(
        &mut self,
        controller: &Arc<SessionController>,
        mut interrupt: Pin<&mut impl Future<Output = std::io::Result<()>>>,
    ) -> Result<()> {
        let label = format!("Press enter to retry completion or type {QUIT}: ");
        loop {
            let input = tokio::select! {
                line = self.prompt.ask(&label) => line?,
                _ = interrupt.as_mut() => None,
            };
            if input.as_deref().map(str::trim).map_or(true, |input| input == QUIT) {
                return leave(controller);
            }

            let call = {
                let controller = controller.clone();
                async move { controller.complete().await }
            };
            let Some(outcome) = until_interrupted(call, interrupt.as_mut()).await? else {
                return leave(controller);
            };
            match outcome {
                Ok(report) => return self.finish(controller, report).await,
                Err(err) => {
                    warn!(error = %err, "completion retry failed");
                    eprintln!("{err}");
                }
            }
        }
    }

    async fn finish(
        &mut self,
        controller: &SessionController,
        report: FeedbackReport,
    ) -> Result<()> {
        let session = controller.snapshot().await;
        let handoff = Handoff {
            candidate_id: session.candidate_id().cloned(),
            role: session.role().cloned(),
            session_id: session.session_id().cloned(),
            feedback: Some(report),
            ..Handoff::default()
        };
        self.feedback(handoff).await
    }

    pub async fn feedback(&mut self, handoff: Handoff) -> Result<()> {
        let context = match handoff.into_feedback() {
            Entry::Ready(context) => context,
            Entry::Redirect(redirect) => {
                show_redirect(redirect);
                return Ok(());
            }
        };
        println!("{}", render_feedback(&context));
        if let Some(candidate_id) = &context.candidate_id {
            println!();
            println!("Track your progress with: practice progress --candidate-id {candidate_id}");
        }
        Ok(())
    }

    /// Reopens the feedback of a completed session by its id.
    pub async fn stored_feedback(&mut self, session_id: Option<SessionId>) -> Result<()> {
        let Some(session_id) = session_id.filter(|id| !id.is_blank()) else {
            return self.feedback(Handoff::default()).await;
        };
        let stored = self
            .api
            .get_feedback(&session_id)
            .await
            .with_context(|| format!("failed to load feedback for session {session_id}"))?;
        self.feedback(Handoff {
            session_id: Some(stored.session_id),
            role: Some(stored.role),
            feedback: Some(stored.report),
            ..Handoff::default()
        })
        .await
    }

    pub async fn progress(&mut self, handoff: Handoff) -> Result<()> {
        let context = match handoff.into_progress() {
            Entry::Ready(context) => context,
            Entry::Redirect(redirect) => {
                show_redirect(redirect);
                return Ok(());
            }
        };
        let report = self
            .api
            .get_progress(&context.candidate_id)
            .await
            .context("failed to load progress")?;
        println!("{}", render_progress(&report));
        Ok(())
    }
}

/// Runs `call` on its own task. `None` when `interrupt` fires first; the task
/// is left running and the abandoned controller drops its response.
pub(crate) async fn until_interrupted<T: Send + 'static>(
    call: impl Future<Output = T> + Send + 'static,
    interrupt: Pin<&mut impl Future<Output = std::io::Result<()>>>,
) -> Result<Option<T>> {
    let task = tokio::spawn(call);
    tokio::select! {
        joined = task => joined.map(Some).context("service call task failed"),
        _ = interrupt => Ok(None),
    }
}

fn leave(controller: &SessionController) -> Result<()> {
    controller.abandon();
    println!("Interview abandoned.");
    Ok(())
}

fn show_redirect(redirect: Redirect) {
    warn!(to = %redirect.to, missing = redirect.missing, "screen entered without context");
    eprintln!("{redirect}: {}", entry_hint(redirect.to));
}

pub(crate) fn entry_hint(screen: Screen) -> &'static str {
    match screen {
        Screen::Upload => "run `practice upload <resume.pdf> --roles <roles>`",
        Screen::Dashboard => "run `practice dashboard --candidate-id <id>`",
        Screen::Interview => "run `practice interview --candidate-id <id> --role <role>`",
        Screen::Feedback => "run `practice feedback --session-id <id>`",
        Screen::Progress => "run `practice progress --candidate-id <id>`",
    }
}

/// A 1-based number from the listed roles or a role name, matched without
/// regard to case.
pub(crate) fn pick_role(input: &str, roles: &[Role]) -> Option<Role> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }
    if let Ok(number) = input.parse::<usize>() {
        return number.checked_sub(1).and_then(|index| roles.get(index)).cloned();
    }
    roles
        .iter()
        .find(|role| role.as_str().eq_ignore_ascii_case(input))
        .cloned()
}

pub(crate) fn render_dashboard(profile: &Profile, roles: &[Role]) -> String {
    let mut lines = vec![
        format!("{} ({})", profile.name, profile.candidate_id),
        format!(
            "  {} skills, {} positions, {} projects",
            profile.skills.len(),
            profile.experience.len(),
            profile.projects.len()
        ),
    ];
    if !profile.skills.is_empty() {
        lines.push(format!("  skills: {}", profile.skills.join(", ")));
    }
    if let Some(summary) = profile.summary.as_deref().filter(|s| !s.trim().is_empty()) {
        lines.push(format!("  {summary}"));
    }
    lines.push(String::new());
    lines.push("Roles:".to_string());
    for (index, role) in roles.iter().enumerate() {
        let marker = if profile.target_roles.contains(role) {
            " *"
        } else {
            ""
        };
        lines.push(format!("  {:>2}. {role}{marker}", index + 1));
    }
    if roles.is_empty() {
        lines.push("  (the service offered no roles)".to_string());
    }
    lines.join("\n")
}

pub(crate) fn render_question(session: &InterviewSession) -> String {
    let Some(question) = session.current_question() else {
        return format!("All {} questions answered.", session.total_questions());
    };
    let mut header = format!(
        "Question {}/{} [{}, {}]",
        session.position(),
        session.total_questions(),
        question.category,
        question.difficulty
    );
    if session.is_last_question() {
        header.push_str(" (last)");
    }
    format!("{header}\n{}", question.prompt)
}

pub(crate) fn period_label(period: &str) -> String {
    match period {
        "week_1" => "Week 1".to_string(),
        "week_2_3" => "Weeks 2-3".to_string(),
        "month_1" => "Month 1".to_string(),
        other => other.replace('_', " "),
    }
}

fn push_section(lines: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push(format!("{title}:"));
    lines.extend(items.iter().map(|item| format!("  - {item}")));
}

pub(crate) fn render_feedback(context: &FeedbackContext) -> String {
    let report = &context.feedback;
    let scores = &report.evaluation;
    let mut lines = Vec::new();
    match (&context.role, &context.session_id) {
        (Some(role), Some(session_id)) => lines.push(format!("Feedback: {role} ({session_id})")),
        (Some(role), None) => lines.push(format!("Feedback: {role}")),
        _ => lines.push("Feedback".to_string()),
    }
    if let Some(readiness) = report.readiness_score {
        lines.push(format!("Readiness: {readiness:.0}/100"));
    }
    lines.push(format!("Overall:        {:.1}/10", scores.overall_score));
    lines.push(format!("Communication:  {:.1}/10", scores.communication_clarity));
    lines.push(format!("Technical:      {:.1}/10", scores.technical_accuracy));
    lines.push(format!("Confidence:     {:.1}/10", scores.confidence_score));
    lines.push(format!("Relevance:      {:.1}/10", scores.relevance_score));

    push_section(&mut lines, "Strengths", &report.strengths);
    push_section(&mut lines, "To improve", &report.weaknesses);
    push_section(&mut lines, "Skill gaps", &report.skill_gaps);
    push_section(&mut lines, "Recommendations", &report.recommendations);

    if !report.improvement_roadmap.is_empty() {
        lines.push(String::new());
        lines.push("Roadmap:".to_string());
        for entry in report.improvement_roadmap.periods() {
            lines.push(format!("  {}", period_label(&entry.period)));
            lines.extend(entry.actions.iter().map(|action| format!("    - {action}")));
        }
    }
    lines.join("\n")
}

pub(crate) fn render_progress(report: &ProgressReport) -> String {
    if report.total_sessions == 0 {
        return report
            .message
            .clone()
            .unwrap_or_else(|| "No completed sessions yet.".to_string());
    }
    let mut lines = vec![
        format!(
            "{} completed sessions, readiness {:.0}/100",
            report.total_sessions, report.current_readiness_score
        ),
        format!(
            "Roles practised: {}",
            report
                .roles_practiced
                .iter()
                .map(Role::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        ),
        String::new(),
    ];
    for entry in &report.session_history {
        lines.push(format!(
            "  {}  {:<24} overall {:.1}  communication {:.1}  technical {:.1}  confidence {:.1}",
            entry.date,
            entry.role.as_str(),
            entry.overall_score,
            entry.communication,
            entry.technical,
            entry.confidence
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
#[path = "tests/screens_tests.rs"]
mod tests;
