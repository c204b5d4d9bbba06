//! The widget controller
//!
//! `LoanWidget` owns all state of one calculator instance: the paired input
//! controls, the contact fields and the current result. Front ends forward user
//! events to it and render whatever it exposes; no state lives anywhere else.

pub mod embed;
pub mod host;
pub mod submit;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::calc::{compute_result, LoanInputs, LoanResult, ANNUAL_INTEREST_RATE};
use crate::config::AppConfig;
use crate::form::validate::{first_invalid_field, validate_contact, ContactError, ContactField, ContactFields, ContactInfo};
use crate::form::{Field, FormLimits, LoanForm};

use embed::{EmbedMessage, Embedder};
use host::WidgetHost;
use submit::{LeadSink, SubmissionPayload};

/// Widget flavour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Contact popup asking for email and phone
    #[default]
    Popup,
    /// Inline contact form asking for email and consent
    Inline,
}

/// Everything that differs between widget instances
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetConfig {
    pub variant: Variant,
    pub contact_fields: ContactFields,
    pub limits: FormLimits,
    pub defaults: LoanInputs,
    pub annual_rate_percent: f64,
    pub currency_symbol: String,
}

impl WidgetConfig {
    pub fn preset(variant: Variant) -> Self {
        match variant {
            Variant::Popup => Self {
                variant,
                contact_fields: ContactFields::EmailPhone,
                limits: FormLimits::default(),
                defaults: LoanInputs::default(),
                annual_rate_percent: ANNUAL_INTEREST_RATE,
                currency_symbol: "€".to_string(),
            },
            Variant::Inline => Self {
                variant,
                contact_fields: ContactFields::EmailConsent,
                limits: FormLimits {
                    duration_min: 4,
                    duration_fallback: 12,
                    ..FormLimits::default()
                },
                defaults: LoanInputs {
                    duration_years: 12,
                    ..LoanInputs::default()
                },
                annual_rate_percent: ANNUAL_INTEREST_RATE,
                currency_symbol: "€".to_string(),
            },
        }
    }

    /// Variant preset with the config file's overrides applied
    pub fn from_app_config(config: &AppConfig, variant: Option<Variant>) -> Self {
        let mut widget = Self::preset(variant.unwrap_or(config.variant));
        let loan = &config.loan;

        widget.annual_rate_percent = loan.annual_rate_percent;
        widget.limits.max_loan_amount = loan.max_loan_amount;
        widget.currency_symbol = config.display.currency_symbol.clone();

        if let Some(min) = loan.duration_min {
            widget.limits.duration_min = min;
        }
        if let Some(max) = loan.duration_max {
            widget.limits.duration_max = max;
        }
        if widget.limits.duration_max < widget.limits.duration_min {
            tracing::warn!(
                "duration_max {} below duration_min {}, using the minimum",
                widget.limits.duration_max,
                widget.limits.duration_min
            );
            widget.limits.duration_max = widget.limits.duration_min;
        }
        if let Some(fallback) = loan.duration_fallback {
            widget.limits.duration_fallback = fallback;
        }

        if let Some(amount) = loan.default_loan_amount {
            widget.defaults.loan_amount = amount;
        }
        if let Some(subsidy) = loan.default_subsidy_percent {
            widget.defaults.subsidy_percent = subsidy;
        }
        if let Some(down) = loan.default_down_payment {
            widget.defaults.down_payment = down;
        }
        if let Some(duration) = loan.default_duration {
            widget.defaults.duration_years = duration;
        }

        widget
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Accepted(SubmissionPayload),
    Rejected(Vec<ContactError>),
}

/// Message shown when the inline form is submitted incomplete
pub const INLINE_REJECT_MESSAGE: &str = "Please enter a valid email address and accept the privacy terms.";

pub struct LoanWidget {
    config: WidgetConfig,
    form: LoanForm,
    result: LoanResult,

    contact: ContactInfo,
    contact_open: bool,
    submit_enabled: bool,
    field_errors: HashMap<ContactField, ContactError>,
    generic_error: Option<String>,
    focus_request: Option<ContactField>,

    sink: Box<dyn LeadSink>,
    host: Box<dyn WidgetHost>,
    embedder: Option<Embedder>,
}

impl LoanWidget {
    pub fn new(config: WidgetConfig, sink: Box<dyn LeadSink>, host: Box<dyn WidgetHost>) -> Self {
        let form = LoanForm::new(&config.defaults, config.limits);
        let mut widget = Self {
            form,
            result: LoanResult::default(),
            contact: ContactInfo::default(),
            contact_open: false,
            submit_enabled: false,
            field_errors: HashMap::new(),
            generic_error: None,
            focus_request: None,
            sink,
            host,
            embedder: None,
            config,
        };

        widget.recompute();
        widget.update_submit_state();
        tracing::info!("Loan calculator initialized ({:?} variant)", widget.config.variant);
        widget
    }

    /// Attach an embedding host; it receives the current results right away
    pub fn with_embedder(mut self, embedder: Embedder) -> Self {
        self.embedder = Some(embedder);
        self.post_results();
        self
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn form(&self) -> &LoanForm {
        &self.form
    }

    pub fn inputs(&self) -> LoanInputs {
        self.form.inputs()
    }

    pub fn result(&self) -> &LoanResult {
        &self.result
    }

    pub fn contact(&self) -> &ContactInfo {
        &self.contact
    }

    pub fn is_contact_open(&self) -> bool {
        self.contact_open
    }

    pub fn submit_enabled(&self) -> bool {
        self.submit_enabled
    }

    pub fn field_error(&self, field: ContactField) -> Option<&ContactError> {
        self.field_errors.get(&field)
    }

    pub fn generic_error(&self) -> Option<&str> {
        self.generic_error.as_deref()
    }

    /// Field the front end should focus, consumed on read
    pub fn take_focus_request(&mut self) -> Option<ContactField> {
        self.focus_request.take()
    }

    // --- loan inputs ---

    pub fn edit_entry(&mut self, field: Field, raw: &str) {
        self.form.edit_entry(field, raw);
        self.recompute();
    }

    pub fn edit_slider(&mut self, field: Field, value: f64) {
        self.form.edit_slider(field, value);
        self.recompute();
    }

    pub fn step_slider(&mut self, field: Field, steps: i32) {
        self.form.step_slider(field, steps);
        self.recompute();
    }

    fn recompute(&mut self) {
        self.result = compute_result(&self.form.inputs(), self.config.annual_rate_percent);
        tracing::debug!(
            financed = self.result.financed_principal,
            subsidy = self.result.subsidy_amount,
            monthly = self.result.monthly_payment,
            "Recomputed loan results"
        );
        self.post_results();
    }

    fn post_results(&self) {
        if let Some(embedder) = &self.embedder {
            embedder.post(EmbedMessage::results(&self.form.inputs(), &self.result));
        }
    }

    // --- contact form ---

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.contact.email = email.into();
        self.update_submit_state();
    }

    pub fn set_phone(&mut self, phone: impl Into<String>) {
        self.contact.phone = phone.into();
        self.update_submit_state();
    }

    pub fn set_consent(&mut self, consent: bool) {
        self.contact.consent = consent;
        self.update_submit_state();
    }

    fn update_submit_state(&mut self) {
        self.submit_enabled = validate_contact(self.config.contact_fields, &self.contact).is_ok();
    }

    /// Show the contact form, focusing the email field
    pub fn open_contact(&mut self) {
        self.contact_open = true;
        self.focus_request = Some(ContactField::Email);
    }

    /// Hide the contact form and forget what was typed into it
    pub fn close_contact(&mut self) {
        self.contact_open = false;
        self.contact = ContactInfo::default();
        self.field_errors.clear();
        self.generic_error = None;
        self.focus_request = None;
        self.update_submit_state();
    }

    pub fn toggle_contact(&mut self) {
        if self.contact_open {
            self.close_contact();
        } else {
            self.open_contact();
        }
    }

    /// Validate and, if everything checks out, hand the application to the sink.
    ///
    /// A rejected submit emits nothing. An accepted one resets the whole widget
    /// to its defaults. Only a failing sink returns an error; the form is left
    /// untouched in that case so the user can retry.
    pub fn submit(&mut self) -> Result<SubmitOutcome> {
        self.field_errors.clear();
        self.generic_error = None;

        if let Err(errors) = validate_contact(self.config.contact_fields, &self.contact) {
            tracing::info!("Submission rejected: {} invalid field(s)", errors.len());

            for error in &errors {
                self.field_errors.entry(error.field()).or_insert(*error);
            }
            match self.config.variant {
                Variant::Popup => {
                    self.focus_request = first_invalid_field(self.config.contact_fields, &self.contact);
                }
                Variant::Inline => {
                    self.generic_error = Some(INLINE_REJECT_MESSAGE.to_string());
                    self.host.notify_user(INLINE_REJECT_MESSAGE);
                }
            }
            return Ok(SubmitOutcome::Rejected(errors));
        }

        let inputs = self.form.inputs();
        let payload = SubmissionPayload::new(&inputs, &self.result, self.config.contact_fields, &self.contact);
        self.sink.submit(&payload)?;

        let thanks = match self.config.contact_fields {
            ContactFields::EmailPhone => {
                "Thank you! We have received your application. We will contact you soon by email and phone."
            }
            ContactFields::EmailConsent => {
                "Thank you! We have received your application. We will contact you soon by email."
            }
        };
        self.host.notify_user(thanks);

        self.close_contact();
        self.reset();

        Ok(SubmitOutcome::Accepted(payload))
    }

    /// Restore default loan inputs and recompute
    pub fn reset(&mut self) {
        self.form.reset(&self.config.defaults);
        self.recompute();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, prop_assert_eq, prop_oneof, proptest, Just, Strategy};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingSink {
        leads: Arc<Mutex<Vec<SubmissionPayload>>>,
    }

    impl LeadSink for RecordingSink {
        fn submit(&self, payload: &SubmissionPayload) -> Result<()> {
            self.leads.lock().unwrap().push(payload.clone());
            Ok(())
        }
    }

    struct FailingSink;

    impl LeadSink for FailingSink {
        fn submit(&self, _payload: &SubmissionPayload) -> Result<()> {
            anyhow::bail!("backend unavailable")
        }
    }

    #[derive(Clone, Default)]
    struct RecordingHost {
        messages: Arc<Mutex<Vec<String>>>,
    }

    impl WidgetHost for RecordingHost {
        fn notify_user(&self, message: &str) {
            self.messages.lock().unwrap().push(message.to_string());
        }
    }

    fn widget(variant: Variant) -> (LoanWidget, RecordingSink, RecordingHost) {
        let sink = RecordingSink::default();
        let host = RecordingHost::default();
        let widget = LoanWidget::new(
            WidgetConfig::preset(variant),
            Box::new(sink.clone()),
            Box::new(host.clone()),
        );
        (widget, sink, host)
    }

    #[test]
    fn test_initial_results() {
        let (widget, _, _) = widget(Variant::Popup);
        let result = widget.result();
        assert_eq!(result.subsidy_amount, 5_000.0);
        assert_eq!(result.financed_principal, 15_000.0);
        assert!((result.monthly_payment - 1_287.55).abs() < 0.01);
        assert!(!widget.submit_enabled());
    }

    #[test]
    fn test_edits_recompute() {
        let (mut widget, _, _) = widget(Variant::Popup);
        widget.edit_entry(Field::Duration, "5");
        let five_years = widget.result().monthly_payment;
        assert!(five_years < 1_287.0);

        widget.edit_entry(Field::DownPayment, "99999");
        assert_eq!(widget.inputs().down_payment, 25_000.0);
        assert_eq!(widget.result().financed_principal, 0.0);
        assert_eq!(widget.result().monthly_payment, 0.0);
    }

    #[test]
    fn test_submit_button_follows_validation() {
        let (mut widget, _, _) = widget(Variant::Popup);
        widget.open_contact();
        widget.set_email("jane@example.com");
        assert!(!widget.submit_enabled());
        widget.set_phone("+491234567890");
        assert!(widget.submit_enabled());
        widget.set_phone("12345");
        assert!(!widget.submit_enabled());
    }

    #[test]
    fn test_rejected_popup_submit_focuses_first_invalid_field() {
        let (mut widget, sink, host) = widget(Variant::Popup);
        widget.open_contact();
        assert_eq!(widget.take_focus_request(), Some(ContactField::Email));

        widget.set_email("jane@example.com");
        widget.set_phone("123");
        let outcome = widget.submit().unwrap();

        assert_eq!(outcome, SubmitOutcome::Rejected(vec![ContactError::PhoneInvalid]));
        assert_eq!(widget.take_focus_request(), Some(ContactField::Phone));
        assert_eq!(widget.field_error(ContactField::Phone), Some(&ContactError::PhoneInvalid));
        assert!(widget.field_error(ContactField::Email).is_none());
        assert!(sink.leads.lock().unwrap().is_empty());
        assert!(host.messages.lock().unwrap().is_empty());
        assert!(widget.is_contact_open());
    }

    #[test]
    fn test_rejected_inline_submit_shows_generic_message() {
        let (mut widget, sink, host) = widget(Variant::Inline);
        widget.set_email("jane@example.com");
        let outcome = widget.submit().unwrap();

        assert_eq!(outcome, SubmitOutcome::Rejected(vec![ContactError::ConsentRequired]));
        assert_eq!(widget.generic_error(), Some(INLINE_REJECT_MESSAGE));
        assert_eq!(host.messages.lock().unwrap().len(), 1);
        assert!(sink.leads.lock().unwrap().is_empty());
    }

    #[test]
    fn test_accepted_submit_emits_payload_and_resets() {
        let (mut widget, sink, host) = widget(Variant::Popup);
        widget.edit_entry(Field::LoanAmount, "40000");
        widget.edit_entry(Field::Duration, "10");
        let expected_payment = widget.result().monthly_payment;

        widget.open_contact();
        widget.set_email("jane@example.com");
        widget.set_phone("02012345678");
        let outcome = widget.submit().unwrap();

        let SubmitOutcome::Accepted(payload) = outcome else {
            panic!("expected accepted submission");
        };
        assert_eq!(payload.loan_amount, 40_000.0);
        assert_eq!(payload.loan_duration_years, 10);
        assert_eq!(payload.monthly_payment, expected_payment);
        assert_eq!(payload.phone.as_deref(), Some("02012345678"));
        assert_eq!(sink.leads.lock().unwrap().len(), 1);
        assert!(host.messages.lock().unwrap()[0].starts_with("Thank you!"));

        // Back to defaults
        assert_eq!(widget.inputs(), LoanInputs::default());
        assert_eq!(widget.form().control(Field::DownPayment).entry, "5000");
        assert_eq!(widget.result().financed_principal, 15_000.0);
        assert!(!widget.is_contact_open());
        assert_eq!(widget.contact(), &ContactInfo::default());
        assert!(!widget.submit_enabled());
    }

    #[test]
    fn test_inline_defaults_and_bounds() {
        let (mut widget, sink, _) = widget(Variant::Inline);
        assert_eq!(widget.inputs().duration_years, 12);

        widget.edit_entry(Field::Duration, "1");
        assert_eq!(widget.inputs().duration_years, 4);

        widget.set_email("jane@example.com");
        widget.set_consent(true);
        assert!(widget.submit_enabled());
        let outcome = widget.submit().unwrap();
        assert!(matches!(outcome, SubmitOutcome::Accepted(ref p) if p.consent == Some(true) && p.phone.is_none()));
        assert_eq!(sink.leads.lock().unwrap().len(), 1);
        assert_eq!(widget.inputs().duration_years, 12);
    }

    #[test]
    fn test_sink_failure_keeps_form() {
        let mut widget = LoanWidget::new(
            WidgetConfig::preset(Variant::Popup),
            Box::new(FailingSink),
            Box::new(RecordingHost::default()),
        );
        widget.edit_entry(Field::LoanAmount, "30000");
        widget.open_contact();
        widget.set_email("jane@example.com");
        widget.set_phone("+491234567890");

        assert!(widget.submit().is_err());
        assert_eq!(widget.inputs().loan_amount, 30_000.0);
        assert!(widget.is_contact_open());
    }

    #[test]
    fn test_close_contact_clears_fields() {
        let (mut widget, _, _) = widget(Variant::Popup);
        widget.open_contact();
        widget.set_email("bad");
        let _ = widget.submit().unwrap();
        assert!(widget.field_error(ContactField::Email).is_some());

        widget.close_contact();
        assert!(widget.contact().email.is_empty());
        assert!(widget.field_error(ContactField::Email).is_none());
    }

    #[test]
    fn test_embedder_receives_every_recompute() {
        let (embedder, mut rx) = Embedder::channel();
        let (widget, _, _) = widget(Variant::Popup);
        let mut widget = widget.with_embedder(embedder);

        widget.edit_entry(Field::SubsidyPercent, "50");

        let first = rx.try_recv().unwrap();
        assert_eq!(first.data.financed_amount, 15_000.0);
        let second = rx.try_recv().unwrap();
        assert_eq!(second.data.subsidy_amount, 12_500.0);
        assert_eq!(second.data.financed_amount, 7_500.0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_config_overrides() {
        let mut config = AppConfig::default();
        config.loan.default_duration = Some(8);
        config.loan.duration_max = Some(10);
        config.display.currency_symbol = "$".to_string();

        let widget_config = WidgetConfig::from_app_config(&config, Some(Variant::Inline));
        assert_eq!(widget_config.variant, Variant::Inline);
        assert_eq!(widget_config.contact_fields, ContactFields::EmailConsent);
        assert_eq!(widget_config.limits.duration_min, 4);
        assert_eq!(widget_config.limits.duration_max, 10);
        assert_eq!(widget_config.defaults.duration_years, 8);
        assert_eq!(widget_config.currency_symbol, "$");
    }

    fn email_text() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            Just("jane@example.com".to_string()),
            "[a-z@. ]{0,16}",
            "\\PC{0,16}",
        ]
    }

    fn phone_text() -> impl Strategy<Value = String> {
        prop_oneof![
            Just(String::new()),
            Just("+491234567890".to_string()),
            "[0-9+ ()-]{0,20}",
            "\\PC{0,20}",
        ]
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(128))]

        #[test]
        fn prop_invalid_contact_never_reaches_sink(
            inline in proptest::bool::ANY,
            email in email_text(),
            phone in phone_text(),
            consent in proptest::bool::ANY,
        ) {
            let variant = if inline { Variant::Inline } else { Variant::Popup };
            let (mut widget, sink, _) = widget(variant);
            widget.open_contact();
            widget.set_email(email.clone());
            widget.set_phone(phone.clone());
            widget.set_consent(consent);

            let info = ContactInfo { email, phone, consent };
            let valid = validate_contact(widget.config().contact_fields, &info).is_ok();
            prop_assert_eq!(widget.submit_enabled(), valid);

            let outcome = widget.submit().unwrap();
            let leads = sink.leads.lock().unwrap().len();
            match outcome {
                SubmitOutcome::Accepted(_) => {
                    prop_assert!(valid);
                    prop_assert_eq!(leads, 1);
                }
                SubmitOutcome::Rejected(errors) => {
                    prop_assert!(!valid);
                    prop_assert!(!errors.is_empty());
                    prop_assert_eq!(leads, 0);
                }
            }
        }
    }
}
