use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::calc::ANNUAL_INTEREST_RATE;
use crate::widget::Variant;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanSettings {
    /// Annual interest rate in percent (5.5 = 5.5%)
    #[serde(default = "default_rate")]
    pub annual_rate_percent: f64,

    /// Upper bound for the loan amount field
    #[serde(default = "default_max_loan")]
    pub max_loan_amount: f64,

    // Overrides for the variant presets
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_loan_amount: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_subsidy_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_down_payment: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_fallback: Option<u32>,
}

fn default_rate() -> f64 {
    ANNUAL_INTEREST_RATE
}

fn default_max_loan() -> f64 {
    60_000.0
}

impl Default for LoanSettings {
    fn default() -> Self {
        Self {
            annual_rate_percent: default_rate(),
            max_loan_amount: default_max_loan(),
            default_loan_amount: None,
            default_subsidy_percent: None,
            default_down_payment: None,
            default_duration: None,
            duration_min: None,
            duration_max: None,
            duration_fallback: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaySettings {
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_currency_symbol() -> String {
    "€".to_string()
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            currency_symbol: default_currency_symbol(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmitSettings {
    /// Append accepted leads as JSON lines to this file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leads_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmbedSettings {
    /// File or FIFO the embedding host reads result messages from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<PathBuf>,
}

/// Optional `#RRGGBB` / `#RGB` overrides for the UI colors
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThemeColors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub danger: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_dim: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bg_selected: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inactive: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// Widget flavour: popup contact form (email + phone) or inline form (email + consent)
    #[serde(default)]
    pub variant: Variant,

    /// Show a desktop notification when an application is accepted
    #[serde(default)]
    pub notifications: bool,

    #[serde(default)]
    pub loan: LoanSettings,

    #[serde(default)]
    pub display: DisplaySettings,

    #[serde(default)]
    pub submit: SubmitSettings,

    #[serde(default)]
    pub embed: EmbedSettings,

    #[serde(default)]
    pub theme: ThemeColors,
}

impl AppConfig {
    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?
            .join("loanwidget");

        if let Err(e) = std::fs::create_dir_all(&config_dir) {
            tracing::warn!("Could not create config directory: {}", e);
        }

        Ok(config_dir.join("config.toml"))
    }

    /// Load config from `path` (or the default location), falling back to defaults.
    /// A missing default config is written out so users have something to edit.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match Self::config_path() {
                Ok(p) => (p, false),
                Err(_) => return Ok(AppConfig::default()),
            },
        };

        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match Self::parse(&content) {
                    Ok(config) => return Ok(config),
                    Err(e) => tracing::warn!("Failed to parse config {}: {:#}", path.display(), e),
                },
                Err(e) => tracing::warn!("Failed to read config {}: {}", path.display(), e),
            }
            return Ok(AppConfig::default());
        }

        let config = AppConfig::default();
        if !explicit {
            if let Err(e) = config.save_to(&path) {
                tracing::debug!("Could not write default config: {:#}", e);
            }
        }
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content).context("invalid config TOML")?;
        Ok(config.cleaned())
    }

    /// Save config to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;
        std::fs::write(path, content)
            .with_context(|| format!("writing {}", path.display()))?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(&self.cleaned())?)
    }

    /// Drop values that can't be meaningful
    fn cleaned(&self) -> Self {
        let mut clean = self.clone();

        // Empty paths mean "not configured"
        if clean.submit.leads_file.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            clean.submit.leads_file = None;
        }
        if clean.embed.target.as_ref().is_some_and(|p| p.as_os_str().is_empty()) {
            clean.embed.target = None;
        }

        if !clean.loan.annual_rate_percent.is_finite() || clean.loan.annual_rate_percent < 0.0 {
            tracing::warn!("Ignoring invalid interest rate {}", clean.loan.annual_rate_percent);
            clean.loan.annual_rate_percent = default_rate();
        }
        if !clean.loan.max_loan_amount.is_finite() || clean.loan.max_loan_amount <= 0.0 {
            clean.loan.max_loan_amount = default_max_loan();
        }

        clean
    }
}
