use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::config::AppConfig;
use crate::form::validate::{first_invalid_field, ContactField, ContactFields};
use crate::form::Field;
use crate::theme::Theme;
use crate::widget::embed::Embedder;
use crate::widget::host::DesktopHost;
use crate::widget::submit::{JsonlSink, LeadSink, LogSink};
use crate::widget::{LoanWidget, SubmitOutcome, Variant, WidgetConfig};

/// How long a status message stays in the info line
const STATUS_TIMEOUT: Duration = Duration::from_secs(3);

/// Slider steps moved by PageUp/PageDown
const PAGE_STEPS: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactFocus {
    Email,
    Phone,
    Consent,
    Send,
}

impl ContactFocus {
    fn ring(fields: ContactFields) -> &'static [ContactFocus] {
        match fields {
            ContactFields::EmailPhone => &[ContactFocus::Email, ContactFocus::Phone, ContactFocus::Send],
            ContactFields::EmailConsent => &[ContactFocus::Email, ContactFocus::Consent, ContactFocus::Send],
        }
    }

    fn from_field(field: ContactField) -> Self {
        match field {
            ContactField::Email => ContactFocus::Email,
            ContactField::Phone => ContactFocus::Phone,
            ContactField::Consent => ContactFocus::Consent,
        }
    }

    fn is_text(&self) -> bool {
        matches!(self, ContactFocus::Email | ContactFocus::Phone)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input(Field),
    Apply,
    /// Inline contact form (only reachable when it is revealed)
    Contact(ContactFocus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Contact,
    Help,
}

pub struct App {
    pub widget: LoanWidget,
    pub theme: Theme,

    pub focus: Focus,
    pub popup: Popup,
    pub contact_focus: ContactFocus,

    // Status message (shown in info line, auto-clears after timeout)
    pub status_message: Option<String>,
    pub status_message_time: Option<Instant>,
}

impl App {
    pub fn new(config: &AppConfig, variant: Option<Variant>, embed_target: Option<PathBuf>) -> Self {
        let widget_config = WidgetConfig::from_app_config(config, variant);

        let sink: Box<dyn LeadSink> = match &config.submit.leads_file {
            Some(path) => Box::new(JsonlSink::new(path)),
            None => Box::new(LogSink),
        };
        let host = Box::new(DesktopHost::new(config.notifications));

        let mut widget = LoanWidget::new(widget_config, sink, host);
        if let Some(target) = embed_target.or_else(|| config.embed.target.clone()) {
            tracing::info!("Posting results to {}", target.display());
            widget = widget.with_embedder(Embedder::spawn_writer(target));
        }

        Self::with_widget(widget, Theme::from_config(&config.theme))
    }

    pub fn with_widget(widget: LoanWidget, theme: Theme) -> Self {
        Self {
            widget,
            theme,
            focus: Focus::Input(Field::LoanAmount),
            popup: Popup::None,
            contact_focus: ContactFocus::Email,
            status_message: None,
            status_message_time: None,
        }
    }

    /// Set a status message (auto-clears after a few seconds)
    fn set_status(&mut self, msg: impl Into<String>) {
        self.status_message = Some(msg.into());
        self.status_message_time = Some(Instant::now());
    }

    /// Periodic housekeeping between frames
    pub fn tick(&mut self) {
        if let Some(since) = self.status_message_time {
            if since.elapsed() >= STATUS_TIMEOUT {
                self.status_message = None;
                self.status_message_time = None;
            }
        }
    }

    /// True while a free-text contact field has focus, so letters are input, not commands
    pub fn is_typing(&self) -> bool {
        match (self.popup, self.focus) {
            (Popup::Contact, _) => self.contact_focus.is_text(),
            (Popup::None, Focus::Contact(f)) => f.is_text(),
            _ => false,
        }
    }

    /// The contact element that currently has focus, wherever the form is shown
    pub fn active_contact_focus(&self) -> Option<ContactFocus> {
        match (self.popup, self.focus) {
            (Popup::Contact, _) => Some(self.contact_focus),
            (Popup::None, Focus::Contact(f)) => Some(f),
            _ => None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        match self.popup {
            Popup::Help => {
                if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('h') | KeyCode::Enter | KeyCode::Char('q')) {
                    self.popup = Popup::None;
                }
                Ok(())
            }
            Popup::Contact => self.handle_contact_key(key),
            Popup::None => self.handle_normal_key(key),
        }
    }

    fn focus_ring(&self) -> Vec<Focus> {
        let mut ring: Vec<Focus> = Field::ALL.iter().map(|f| Focus::Input(*f)).collect();
        ring.push(Focus::Apply);

        if self.widget.config().variant == Variant::Inline && self.widget.is_contact_open() {
            ring.extend(
                ContactFocus::ring(self.widget.config().contact_fields)
                    .iter()
                    .map(|f| Focus::Contact(*f)),
            );
        }
        ring
    }

    fn move_focus(&mut self, forward: bool) {
        let ring = self.focus_ring();
        let pos = ring.iter().position(|f| *f == self.focus).unwrap_or(0);
        let next = if forward {
            (pos + 1) % ring.len()
        } else {
            pos.checked_sub(1).unwrap_or(ring.len() - 1)
        };
        self.focus = ring[next];
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> Result<()> {
        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.move_focus(true);
                return Ok(());
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.move_focus(false);
                return Ok(());
            }
            _ => {}
        }

        match self.focus {
            Focus::Input(field) => self.handle_input_key(field, key),
            Focus::Apply => {
                match key.code {
                    KeyCode::Enter | KeyCode::Char(' ') => self.activate_apply(),
                    KeyCode::Char('?') | KeyCode::Char('h') => self.popup = Popup::Help,
                    KeyCode::Char('r') => self.reset_inputs(),
                    _ => {}
                }
                Ok(())
            }
            Focus::Contact(contact) => {
                if key.code == KeyCode::Esc {
                    self.focus = Focus::Apply;
                    return Ok(());
                }
                if let Some(next) = self.handle_contact_input(contact, key)? {
                    self.focus = Focus::Contact(next);
                }
                Ok(())
            }
        }
    }

    fn handle_input_key(&mut self, field: Field, key: KeyEvent) -> Result<()> {
        let entry = self.widget.form().control(field).entry.clone();

        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() || c == '.' || c == '-' => {
                let mut text = entry;
                text.push(c);
                self.widget.edit_entry(field, &text);
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.widget.edit_entry(field, "");
            }
            KeyCode::Backspace => {
                let mut text = entry;
                text.pop();
                self.widget.edit_entry(field, &text);
            }
            KeyCode::Delete => self.widget.edit_entry(field, ""),
            KeyCode::Right => self.widget.step_slider(field, 1),
            KeyCode::Left => self.widget.step_slider(field, -1),
            KeyCode::PageUp => self.widget.step_slider(field, PAGE_STEPS),
            KeyCode::PageDown => self.widget.step_slider(field, -PAGE_STEPS),
            KeyCode::Home => {
                let min = self.widget.form().control(field).bounds.min;
                self.widget.edit_slider(field, min);
            }
            KeyCode::End => {
                let max = self.widget.form().control(field).bounds.max;
                self.widget.edit_slider(field, max);
            }
            KeyCode::Enter => self.move_focus(true),
            KeyCode::Char('?') | KeyCode::Char('h') => self.popup = Popup::Help,
            KeyCode::Char('r') => self.reset_inputs(),
            _ => {}
        }
        Ok(())
    }

    fn reset_inputs(&mut self) {
        self.widget.reset();
        self.set_status("Inputs reset to defaults");
    }

    /// The "apply" button opens the contact popup or reveals the inline form
    fn activate_apply(&mut self) {
        match self.widget.config().variant {
            Variant::Popup => {
                self.widget.open_contact();
                self.popup = Popup::Contact;
                self.contact_focus = ContactFocus::Email;
                self.sync_focus_request();
            }
            Variant::Inline => {
                self.widget.toggle_contact();
                if self.widget.is_contact_open() {
                    self.focus = Focus::Contact(ContactFocus::Email);
                    self.sync_focus_request();
                }
            }
        }
    }

    fn handle_contact_key(&mut self, key: KeyEvent) -> Result<()> {
        let ring = ContactFocus::ring(self.widget.config().contact_fields);
        let pos = ring.iter().position(|f| *f == self.contact_focus).unwrap_or(0);

        match key.code {
            KeyCode::Esc => {
                self.widget.close_contact();
                self.popup = Popup::None;
                self.focus = Focus::Apply;
            }
            KeyCode::Tab | KeyCode::Down => {
                self.contact_focus = ring[(pos + 1) % ring.len()];
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.contact_focus = ring[pos.checked_sub(1).unwrap_or(ring.len() - 1)];
            }
            _ => {
                if let Some(next) = self.handle_contact_input(self.contact_focus, key)? {
                    self.contact_focus = next;
                }
            }
        }
        Ok(())
    }

    /// Shared editing for the popup and inline contact forms.
    /// Returns the element that should receive focus next, if it changes.
    fn handle_contact_input(&mut self, focus: ContactFocus, key: KeyEvent) -> Result<Option<ContactFocus>> {
        let ring = ContactFocus::ring(self.widget.config().contact_fields);
        let next = ring
            .iter()
            .position(|f| *f == focus)
            .map(|pos| ring[(pos + 1) % ring.len()]);

        match (focus, key.code) {
            (ContactFocus::Send, KeyCode::Enter | KeyCode::Char(' ')) => {
                if self.widget.submit_enabled() {
                    return self.submit();
                }
                // Disabled until every field validates; point at the first one that doesn't
                self.set_status("Please fill in all fields before sending");
                let fields = self.widget.config().contact_fields;
                return Ok(first_invalid_field(fields, self.widget.contact()).map(ContactFocus::from_field));
            }
            (ContactFocus::Consent, KeyCode::Enter | KeyCode::Char(' ')) => {
                let consent = !self.widget.contact().consent;
                self.widget.set_consent(consent);
            }
            (ContactFocus::Email | ContactFocus::Phone, KeyCode::Enter) => return Ok(next),
            (ContactFocus::Email, KeyCode::Char(c)) => {
                let mut email = self.widget.contact().email.clone();
                email.push(c);
                self.widget.set_email(email);
            }
            (ContactFocus::Email, KeyCode::Backspace) => {
                let mut email = self.widget.contact().email.clone();
                email.pop();
                self.widget.set_email(email);
            }
            (ContactFocus::Phone, KeyCode::Char(c)) => {
                let mut phone = self.widget.contact().phone.clone();
                phone.push(c);
                self.widget.set_phone(phone);
            }
            (ContactFocus::Phone, KeyCode::Backspace) => {
                let mut phone = self.widget.contact().phone.clone();
                phone.pop();
                self.widget.set_phone(phone);
            }
            _ => {}
        }
        Ok(None)
    }

    fn submit(&mut self) -> Result<Option<ContactFocus>> {
        match self.widget.submit()? {
            SubmitOutcome::Accepted(_) => {
                self.set_status("Application sent. We will contact you soon.");
                self.popup = Popup::None;
                self.focus = Focus::Input(Field::LoanAmount);
                Ok(None)
            }
            SubmitOutcome::Rejected(errors) => {
                match self.widget.generic_error() {
                    Some(msg) => {
                        let msg = msg.to_string();
                        self.set_status(msg);
                    }
                    None => self.set_status(format!("Please correct {} field(s)", errors.len())),
                }
                Ok(self.widget.take_focus_request().map(ContactFocus::from_field))
            }
        }
    }

    fn sync_focus_request(&mut self) {
        if let Some(field) = self.widget.take_focus_request() {
            let focus = ContactFocus::from_field(field);
            match self.popup {
                Popup::Contact => self.contact_focus = focus,
                _ => self.focus = Focus::Contact(focus),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::widget::host::WidgetHost;
    use crate::widget::submit::SubmissionPayload;
    use crossterm::event::KeyEventKind;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Leads(Arc<Mutex<Vec<SubmissionPayload>>>);

    impl LeadSink for Leads {
        fn submit(&self, payload: &SubmissionPayload) -> Result<()> {
            self.0.lock().unwrap().push(payload.clone());
            Ok(())
        }
    }

    struct Quiet;

    impl WidgetHost for Quiet {
        fn notify_user(&self, _message: &str) {}
    }

    fn app(variant: Variant) -> (App, Leads) {
        let leads = Leads::default();
        let widget = LoanWidget::new(WidgetConfig::preset(variant), Box::new(leads.clone()), Box::new(Quiet));
        (App::with_widget(widget, Theme::default()), leads)
    }

    fn press(app: &mut App, code: KeyCode) {
        let key = KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Press);
        app.handle_key(key).unwrap();
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_typing_edits_focused_entry() {
        let (mut app, _) = app(Variant::Popup);
        press(&mut app, KeyCode::Delete);
        type_text(&mut app, "70000");

        let loan = app.widget.form().control(Field::LoanAmount);
        assert_eq!(loan.entry, "60000");
        assert_eq!(loan.slider, 60_000.0);
    }

    #[test]
    fn test_arrows_move_slider() {
        let (mut app, _) = app(Variant::Popup);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Input(Field::DownPayment));

        press(&mut app, KeyCode::Right);
        assert_eq!(app.widget.inputs().down_payment, 5_100.0);
        press(&mut app, KeyCode::End);
        assert_eq!(app.widget.inputs().down_payment, 25_000.0);
    }

    #[test]
    fn test_popup_flow_submits_and_resets() {
        let (mut app, leads) = app(Variant::Popup);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.focus, Focus::Apply);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.popup, Popup::Contact);
        assert_eq!(app.contact_focus, ContactFocus::Email);
        assert!(app.is_typing());

        type_text(&mut app, "jane@example.com");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.contact_focus, ContactFocus::Phone);

        type_text(&mut app, "123");
        press(&mut app, KeyCode::Tab);
        assert!(!app.widget.submit_enabled());
        press(&mut app, KeyCode::Enter);
        // Send is disabled: focus jumps back to the phone field
        assert_eq!(app.contact_focus, ContactFocus::Phone);
        assert!(leads.0.lock().unwrap().is_empty());

        type_text(&mut app, "4567890");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Enter);

        assert_eq!(leads.0.lock().unwrap().len(), 1);
        assert_eq!(app.popup, Popup::None);
        assert_eq!(app.focus, Focus::Input(Field::LoanAmount));
        assert!(app.status_message.is_some());
    }

    #[test]
    fn test_disabled_send_does_not_submit() {
        let (mut app, leads) = app(Variant::Popup);
        app.focus = Focus::Apply;
        press(&mut app, KeyCode::Enter);
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.contact_focus, ContactFocus::Send);
        assert!(!app.widget.submit_enabled());

        press(&mut app, KeyCode::Enter);

        // No submit attempt: no field errors recorded, nothing sent, popup stays open
        assert!(leads.0.lock().unwrap().is_empty());
        assert_eq!(app.widget.field_error(ContactField::Email), None);
        assert_eq!(app.widget.field_error(ContactField::Phone), None);
        assert_eq!(app.popup, Popup::Contact);
        assert_eq!(app.contact_focus, ContactFocus::Email);
        assert_eq!(app.status_message.as_deref(), Some("Please fill in all fields before sending"));
    }

    #[test]
    fn test_disabled_inline_send_does_not_submit() {
        let (mut app, leads) = app(Variant::Inline);
        app.focus = Focus::Apply;
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "a@b.co");
        app.focus = Focus::Contact(ContactFocus::Send);

        press(&mut app, KeyCode::Enter);

        assert!(leads.0.lock().unwrap().is_empty());
        assert!(app.widget.generic_error().is_none());
        assert!(app.widget.is_contact_open());
        assert_eq!(app.focus, Focus::Contact(ContactFocus::Consent));
    }

    #[test]
    fn test_escape_closes_popup_and_clears_contact() {
        let (mut app, _) = app(Variant::Popup);
        app.focus = Focus::Apply;
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "jane");
        press(&mut app, KeyCode::Esc);

        assert_eq!(app.popup, Popup::None);
        assert!(app.widget.contact().email.is_empty());
    }

    #[test]
    fn test_inline_form_joins_focus_ring() {
        let (mut app, leads) = app(Variant::Inline);
        app.focus = Focus::Apply;
        press(&mut app, KeyCode::Enter);
        assert!(app.widget.is_contact_open());
        assert_eq!(app.focus, Focus::Contact(ContactFocus::Email));

        type_text(&mut app, "a@b.co");
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Contact(ContactFocus::Consent));
        press(&mut app, KeyCode::Char(' '));
        assert!(app.widget.contact().consent);
        assert!(app.widget.submit_enabled());

        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Enter);
        assert_eq!(leads.0.lock().unwrap().len(), 1);
        assert!(!app.widget.is_contact_open());
    }

    #[test]
    fn test_status_clears_after_timeout() {
        let (mut app, _) = app(Variant::Popup);
        app.set_status("hello");
        app.tick();
        assert!(app.status_message.is_some());

        app.status_message_time = Some(Instant::now() - STATUS_TIMEOUT);
        app.tick();
        assert!(app.status_message.is_none());
    }
}
