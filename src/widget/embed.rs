//! One-way result messages to an embedding host
//!
//! The widget never waits on the host: messages go into an unbounded channel and
//! a background task writes them out as JSON lines. A closed channel is ignored.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

use crate::calc::{LoanInputs, LoanResult};

pub const MESSAGE_TYPE: &str = "LOAN_CALCULATOR_DATA";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSnapshot {
    pub loan_amount: f64,
    pub financed_amount: f64,
    pub subsidy_amount: f64,
    pub monthly_payment: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbedMessage {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: ResultSnapshot,
}

impl EmbedMessage {
    pub fn results(inputs: &LoanInputs, result: &LoanResult) -> Self {
        Self {
            kind: MESSAGE_TYPE,
            data: ResultSnapshot {
                loan_amount: inputs.loan_amount,
                financed_amount: result.financed_principal,
                subsidy_amount: result.subsidy_amount,
                monthly_payment: result.monthly_payment,
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct Embedder {
    tx: mpsc::UnboundedSender<EmbedMessage>,
}

impl Embedder {
    /// Embedder plus the receiving end, for hosts that consume messages in-process
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<EmbedMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Spawn a writer task that appends every message to `target`.
    /// Must be called from within a tokio runtime.
    pub fn spawn_writer(target: PathBuf) -> Self {
        let (embedder, rx) = Self::channel();

        tokio::spawn(async move {
            if let Err(e) = write_messages(&target, rx).await {
                tracing::warn!("Embed writer for {} stopped: {:#}", target.display(), e);
            }
        });

        embedder
    }

    /// Fire and forget
    pub fn post(&self, message: EmbedMessage) {
        if self.tx.send(message).is_err() {
            tracing::debug!("Embed channel closed, dropping message");
        }
    }
}

async fn write_messages(target: &Path, mut rx: mpsc::UnboundedReceiver<EmbedMessage>) -> Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(target)
        .await
        .with_context(|| format!("opening embed target {}", target.display()))?;

    while let Some(message) = rx.recv().await {
        let mut line = serde_json::to_string(&message)?;
        line.push('\n');
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;
    }

    Ok(())
}
