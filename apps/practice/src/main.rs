use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use client_core::{Handoff, HttpInterviewClient};
use shared::domain::{CandidateId, Role, SessionId};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod screens;

use config::load_settings;
use screens::{App, Prompt};

#[derive(Parser, Debug)]
#[command(name = "practice", about = "Mock interview practice against the practice service")]
struct Args {
    /// Overrides `server_url` from practice.toml and the environment.
    #[arg(long, global = true)]
    server_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a profile from a PDF résumé, then continue to the dashboard.
    Upload {
        resume: PathBuf,
        /// Comma-separated target roles.
        #[arg(long)]
        roles: String,
    },
    Dashboard {
        #[arg(long)]
        candidate_id: Option<String>,
    },
    Interview {
        #[arg(long)]
        candidate_id: Option<String>,
        #[arg(long)]
        role: Option<String>,
    },
    /// Show the feedback of a completed session.
    Feedback {
        #[arg(long)]
        session_id: Option<String>,
    },
    Progress {
        #[arg(long)]
        candidate_id: Option<String>,
    },
}

fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings()?;
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    settings.validate()?;
    init_tracing(&settings.log_filter);

    let client = HttpInterviewClient::with_timeout(&settings.server_url, settings.request_timeout())
        .context("failed to build the practice service client")?;
    info!(
        server_url = client.server_url(),
        timeout_secs = settings.request_timeout_secs,
        "practice client ready"
    );
    let mut app = App::new(Arc::new(client), Prompt::stdin());

    match args.command {
        Command::Upload { resume, roles } => app.upload(&resume, &roles).await,
        Command::Dashboard { candidate_id } => {
            app.dashboard(Handoff {
                candidate_id: candidate_id.map(CandidateId::from),
                ..Handoff::default()
            })
            .await
        }
        Command::Interview { candidate_id, role } => {
            app.interview(Handoff {
                candidate_id: candidate_id.map(CandidateId::from),
                role: role.map(Role::from),
                ..Handoff::default()
            })
            .await
        }
        Command::Feedback { session_id } => {
            app.stored_feedback(session_id.map(SessionId::from)).await
        }
        Command::Progress { candidate_id } => {
            app.progress(Handoff {
                candidate_id: candidate_id.map(CandidateId::from),
                ..Handoff::default()
            })
            .await
        }
    }
}
