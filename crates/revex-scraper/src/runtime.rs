//! Command runtime: serializes trigger operations onto one coordinator.
//!
//! Every externally triggered operation arrives as a [`Command`] over an
//! mpsc channel and is answered over a oneshot. Long-running work is
//! acknowledged immediately and then executed; its outcome goes out over
//! the event bus, never through the reply. Quick queries answer inline.
//!
//! The run loop owns the coordinator, so commands execute strictly one at a
//! time. Status surfaces that must not queue behind a live run read the
//! durable slots instead of sending a command.

use std::path::{Path, PathBuf};

use revex_core::{ExtractionEvent, ExtractionSettings, SessionSummary};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, info, warn};

use crate::coordinator::Coordinator;
use crate::error::ExtractError;
use crate::page::PageSession;
use crate::store::{get_json, SUMMARY_KEY};

/// Operations accepted by the runtime, one per trigger surface.
#[derive(Debug)]
pub enum Command {
    /// Begin a manual page-by-page run on the current page.
    StartPageExtraction { settings: ExtractionSettings },
    /// Begin a full automatic walk from the current page.
    StartFullExtraction { settings: ExtractionSettings },
    /// Extract the current page, restoring a persisted run first.
    ExtractCurrentPage,
    /// Follow the next-page link (manual mode).
    NavigateNextPage,
    /// Probe whether the current page is the last review page.
    CheckLastPage,
    /// Write the accumulation to `path` as CSV and clear the session.
    ExportReviews { path: PathBuf },
    /// Clear the working state and both durable slots.
    ResetState,
    /// Read the current run summary.
    GetState,
}

/// Immediate reply to a [`Command`].
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Ack {
        message: String,
    },
    Failed {
        message: String,
    },
    LastPage {
        is_last_page: bool,
        total_pages: u32,
        total_reviews: u32,
    },
    State(SessionSummary),
}

/// The runtime task has stopped and can take no more commands.
#[derive(Debug, Error)]
#[error("extraction runtime is no longer running")]
pub struct RuntimeClosed;

type CommandEnvelope = (Command, oneshot::Sender<Reply>);

/// Cloneable sender side of the runtime.
#[derive(Clone)]
pub struct RuntimeHandle {
    sender: mpsc::Sender<CommandEnvelope>,
}

impl RuntimeHandle {
    /// Sends `command` and waits for its immediate reply.
    ///
    /// # Errors
    ///
    /// Returns [`RuntimeClosed`] when the runtime task has stopped.
    pub async fn send(&self, command: Command) -> Result<Reply, RuntimeClosed> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send((command, reply_tx))
            .await
            .map_err(|_| RuntimeClosed)?;
        reply_rx.await.map_err(|_| RuntimeClosed)
    }
}

/// Owns the coordinator and executes commands sequentially.
pub struct Runtime<S> {
    coordinator: Coordinator<S>,
    commands: mpsc::Receiver<CommandEnvelope>,
}

/// Builds a runtime around `coordinator` plus the handle that feeds it.
pub fn pair<S: PageSession>(coordinator: Coordinator<S>) -> (Runtime<S>, RuntimeHandle) {
    let (sender, commands) = mpsc::channel(16);
    (
        Runtime {
            coordinator,
            commands,
        },
        RuntimeHandle { sender },
    )
}

impl<S: PageSession> Runtime<S> {
    /// Processes commands until every handle is dropped.
    pub async fn run(mut self) {
        while let Some((command, reply)) = self.commands.recv().await {
            self.handle(command, reply).await;
        }
        info!("command channel closed, runtime stopping");
    }

    async fn handle(&mut self, command: Command, reply: oneshot::Sender<Reply>) {
        match command {
            Command::StartPageExtraction { settings } => {
                if self.coordinator.state().is_extracting {
                    respond(
                        reply,
                        Reply::Failed {
                            message: ExtractError::AlreadyRunning.to_string(),
                        },
                    );
                    return;
                }
                respond(
                    reply,
                    Reply::Ack {
                        message: "Extraction started".to_string(),
                    },
                );
                if let Err(err) = self.coordinator.start_page_extraction(settings).await {
                    self.report_failure("manual page extraction", &err);
                }
            }
            Command::StartFullExtraction { settings } => {
                respond(
                    reply,
                    Reply::Ack {
                        message: "Automatic extraction started".to_string(),
                    },
                );
                // The coordinator's run boundary already published the
                // failure as an event.
                if let Err(err) = self.coordinator.extract_all_reviews(settings).await {
                    warn!(error = %err, "full extraction failed");
                }
            }
            Command::ExtractCurrentPage => {
                respond(
                    reply,
                    Reply::Ack {
                        message: "Extracting page...".to_string(),
                    },
                );
                match self.coordinator.continue_page_extraction().await {
                    Ok(receipt) => info!(receipt = receipt.as_str(), "page extraction finished"),
                    Err(err) => self.report_failure("page extraction", &err),
                }
            }
            Command::NavigateNextPage => {
                respond(
                    reply,
                    Reply::Ack {
                        message: "Navigating...".to_string(),
                    },
                );
                if let Err(err) = self.coordinator.navigate_next_page().await {
                    self.report_failure("navigation", &err);
                }
            }
            Command::CheckLastPage => {
                let value = match self.coordinator.check_last_page().await {
                    Ok(status) => Reply::LastPage {
                        is_last_page: status.is_last_page,
                        total_pages: status.total_pages,
                        total_reviews: status.total_reviews,
                    },
                    Err(err) => Reply::Failed {
                        message: err.to_string(),
                    },
                };
                respond(reply, value);
            }
            Command::ExportReviews { path } => {
                respond(
                    reply,
                    Reply::Ack {
                        message: "Exporting...".to_string(),
                    },
                );
                if let Err(err) = self.export_to(&path).await {
                    self.report_failure("export", &err);
                }
            }
            Command::ResetState => {
                let value = match self.reset_all().await {
                    Ok(()) => Reply::Ack {
                        message: "State reset successfully".to_string(),
                    },
                    Err(err) => Reply::Failed {
                        message: err.to_string(),
                    },
                };
                respond(reply, value);
            }
            Command::GetState => {
                let summary = self.read_summary().await;
                respond(reply, Reply::State(summary));
            }
        }
    }

    async fn export_to(&mut self, path: &Path) -> Result<(), ExtractError> {
        let file = std::fs::File::create(path)?;
        let exported = self.coordinator.export_reviews(file).await?;
        info!(exported, path = %path.display(), "reviews exported");
        Ok(())
    }

    /// Clears the working state plus both slots. The coordinator owns the
    /// state slot; the summary slot is cleared here because no mirror event
    /// fires for an operator-requested reset.
    async fn reset_all(&mut self) -> Result<(), ExtractError> {
        self.coordinator.reset().await?;
        self.coordinator.store().remove(SUMMARY_KEY).await?;
        Ok(())
    }

    /// Prefers the mirrored summary slot, which survives other processes'
    /// runs, over this coordinator's own view.
    async fn read_summary(&self) -> SessionSummary {
        match get_json::<SessionSummary>(self.coordinator.store(), SUMMARY_KEY).await {
            Ok(Some(summary)) => summary,
            Ok(None) => self.coordinator.summary(),
            Err(err) => {
                warn!(error = %err, "ignoring unreadable summary slot");
                self.coordinator.summary()
            }
        }
    }

    fn report_failure(&self, operation: &str, err: &ExtractError) {
        error!(operation, error = %err, "command failed");
        self.coordinator
            .bus()
            .publish(ExtractionEvent::ExtractionError {
                message: err.to_string(),
            });
    }
}

fn respond(reply: oneshot::Sender<Reply>, value: Reply) {
    // The requester may have gone away; nothing to report then.
    let _ = reply.send(value);
}
