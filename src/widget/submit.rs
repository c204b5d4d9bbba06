use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;

use crate::calc::{LoanInputs, LoanResult};
use crate::form::validate::{ContactFields, ContactInfo};

/// Lead data handed to the backend after a successful submit.
/// Numbers come straight from the calculator, never from display strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub loan_amount: f64,
    pub subsidy_percent: f64,
    #[serde(rename = "downpayment")]
    pub down_payment: f64,
    pub loan_duration_years: u32,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consent: Option<bool>,
    pub financed_amount: f64,
    pub subsidy_amount: f64,
    pub monthly_payment: f64,
}

impl SubmissionPayload {
    pub fn new(
        inputs: &LoanInputs,
        result: &LoanResult,
        fields: ContactFields,
        contact: &ContactInfo,
    ) -> Self {
        let (phone, consent) = match fields {
            ContactFields::EmailPhone => (Some(contact.phone.clone()), None),
            ContactFields::EmailConsent => (None, Some(contact.consent)),
        };

        Self {
            loan_amount: inputs.loan_amount,
            subsidy_percent: inputs.subsidy_percent,
            down_payment: inputs.down_payment,
            loan_duration_years: inputs.duration_years,
            email: contact.email.clone(),
            phone,
            consent,
            financed_amount: result.financed_principal,
            subsidy_amount: result.subsidy_amount,
            monthly_payment: result.monthly_payment,
        }
    }
}

/// Receiver of accepted applications
pub trait LeadSink: Send {
    fn submit(&self, payload: &SubmissionPayload) -> Result<()>;
}

/// Logs the lead and reports success; there is no real backend behind it
#[derive(Debug, Default)]
pub struct LogSink;

impl LeadSink for LogSink {
    fn submit(&self, payload: &SubmissionPayload) -> Result<()> {
        let json = serde_json::to_string(payload)?;
        tracing::info!(lead = %json, "Application accepted");
        Ok(())
    }
}

/// Appends each lead as one JSON line
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl LeadSink for JsonlSink {
    fn submit(&self, payload: &SubmissionPayload) -> Result<()> {
        let mut line = serde_json::to_string(payload)?;
        line.push('\n');

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening leads file {}", self.path.display()))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("writing leads file {}", self.path.display()))?;

        tracing::info!("Application stored in {}", self.path.display());
        Ok(())
    }
}
