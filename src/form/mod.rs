//! Paired entry/slider controls for the loan inputs
//!
//! Every bounded field is shown twice: a free-text entry and a slider. Editing
//! either one clamps the value into range and mirrors it onto the other, so both
//! always converge on the same number after each event.

pub mod validate;

use crate::calc::format::format_plain;
use crate::calc::LoanInputs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    LoanAmount,
    SubsidyPercent,
    DownPayment,
    Duration,
}

impl Field {
    pub const ALL: [Field; 4] = [
        Field::LoanAmount,
        Field::SubsidyPercent,
        Field::DownPayment,
        Field::Duration,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Field::LoanAmount => "Loan amount",
            Field::SubsidyPercent => "Subsidy",
            Field::DownPayment => "Down payment",
            Field::Duration => "Duration",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Field::SubsidyPercent => "%",
            Field::Duration => "years",
            _ => "",
        }
    }

    /// Slider increment for one arrow-key press
    pub fn slider_step(&self) -> f64 {
        match self {
            Field::LoanAmount => 500.0,
            Field::SubsidyPercent => 1.0,
            Field::DownPayment => 100.0,
            Field::Duration => 1.0,
        }
    }

    /// Whole numbers only; fractional input is cut at the decimal point
    pub fn is_integer(&self) -> bool {
        matches!(self, Field::Duration)
    }
}

/// Allowed range plus the value used when the entry can't be parsed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldBounds {
    pub min: f64,
    pub max: f64,
    pub fallback: f64,
}

impl FieldBounds {
    pub fn new(min: f64, max: f64, fallback: f64) -> Self {
        Self { min, max: max.max(min), fallback }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }
}

/// Range limits that depend on the widget configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormLimits {
    pub max_loan_amount: f64,
    pub duration_min: u32,
    pub duration_max: u32,
    pub duration_fallback: u32,
}

impl Default for FormLimits {
    fn default() -> Self {
        Self {
            max_loan_amount: 60_000.0,
            duration_min: 1,
            duration_max: 20,
            duration_fallback: 1,
        }
    }
}

/// One logical value with its two on-screen representations
#[derive(Debug, Clone, PartialEq)]
pub struct PairedControl {
    /// Text as shown in the entry box
    pub entry: String,
    /// Slider position; always the effective clamped value
    pub slider: f64,
    pub bounds: FieldBounds,
    integer: bool,
}

impl PairedControl {
    fn new(value: f64, bounds: FieldBounds, integer: bool) -> Self {
        let mut control = Self {
            entry: String::new(),
            slider: 0.0,
            bounds,
            integer,
        };
        control.set_from_slider(value);
        control
    }

    pub fn value(&self) -> f64 {
        self.slider
    }

    /// Fraction of the slider track that is filled (0.0..=1.0)
    pub fn ratio(&self) -> f64 {
        let span = self.bounds.max - self.bounds.min;
        if span <= 0.0 {
            return 0.0;
        }
        ((self.slider - self.bounds.min) / span).clamp(0.0, 1.0)
    }

    fn set_from_entry(&mut self, raw: &str) {
        let trimmed = raw.trim();

        match parse_number(trimmed, self.integer) {
            Some(parsed) => {
                let clamped = self.bounds.clamp(parsed);
                self.slider = clamped;
                // Keep partial text like "12." unless the value had to move
                self.entry = if clamped != parsed {
                    format_plain(clamped)
                } else {
                    raw.to_string()
                };
            }
            None if trimmed.is_empty() => {
                // Mid-edit: leave the box empty, compute with the fallback
                self.slider = self.bounds.clamp(self.bounds.fallback);
                self.entry = String::new();
            }
            None => {
                self.slider = self.bounds.clamp(self.bounds.fallback);
                self.entry = format_plain(self.slider);
            }
        }
    }

    fn set_from_slider(&mut self, value: f64) {
        let value = if value.is_finite() { value } else { self.bounds.fallback };
        let value = if self.integer { value.trunc() } else { value };
        self.slider = self.bounds.clamp(value);
        self.entry = format_plain(self.slider);
    }

    fn set_bounds(&mut self, bounds: FieldBounds) {
        self.bounds = bounds;
        if self.slider > bounds.max || self.slider < bounds.min {
            self.set_from_slider(self.slider);
        }
    }
}

/// Parse the leading number of `text` the way a browser's parseFloat/parseInt would
fn parse_number(text: &str, integer: bool) -> Option<f64> {
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut has_digits = end > digits_start;

    if !integer && end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if has_digits || frac_end > frac_start {
            has_digits = true;
            end = frac_end;
        }
    }

    if !has_digits {
        return None;
    }

    // Exponent only counts when at least one digit follows it
    if !integer && end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits {
            end = exp_end;
        }
    }

    text[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Clamp-and-mirror state for all four loan inputs
#[derive(Debug, Clone, PartialEq)]
pub struct LoanForm {
    limits: FormLimits,
    loan_amount: PairedControl,
    subsidy_percent: PairedControl,
    down_payment: PairedControl,
    duration: PairedControl,
}

impl LoanForm {
    pub fn new(defaults: &LoanInputs, limits: FormLimits) -> Self {
        let loan_amount = PairedControl::new(
            defaults.loan_amount,
            FieldBounds::new(0.0, limits.max_loan_amount, 0.0),
            Field::LoanAmount.is_integer(),
        );
        let down_payment = PairedControl::new(
            defaults.down_payment,
            FieldBounds::new(0.0, loan_amount.value(), 0.0),
            Field::DownPayment.is_integer(),
        );

        Self {
            limits,
            subsidy_percent: PairedControl::new(
                defaults.subsidy_percent,
                FieldBounds::new(0.0, 100.0, 0.0),
                Field::SubsidyPercent.is_integer(),
            ),
            duration: PairedControl::new(
                f64::from(defaults.duration_years),
                FieldBounds::new(
                    f64::from(limits.duration_min),
                    f64::from(limits.duration_max),
                    f64::from(limits.duration_fallback),
                ),
                Field::Duration.is_integer(),
            ),
            loan_amount,
            down_payment,
        }
    }

    pub fn limits(&self) -> &FormLimits {
        &self.limits
    }

    pub fn control(&self, field: Field) -> &PairedControl {
        match field {
            Field::LoanAmount => &self.loan_amount,
            Field::SubsidyPercent => &self.subsidy_percent,
            Field::DownPayment => &self.down_payment,
            Field::Duration => &self.duration,
        }
    }

    fn control_mut(&mut self, field: Field) -> &mut PairedControl {
        match field {
            Field::LoanAmount => &mut self.loan_amount,
            Field::SubsidyPercent => &mut self.subsidy_percent,
            Field::DownPayment => &mut self.down_payment,
            Field::Duration => &mut self.duration,
        }
    }

    /// Handle an edit of the text entry
    pub fn edit_entry(&mut self, field: Field, raw: &str) {
        self.control_mut(field).set_from_entry(raw);
        self.after_edit(field);
    }

    /// Handle a drag of the slider to an absolute position
    pub fn edit_slider(&mut self, field: Field, value: f64) {
        self.control_mut(field).set_from_slider(value);
        self.after_edit(field);
    }

    /// Move the slider by whole steps (negative moves left)
    pub fn step_slider(&mut self, field: Field, steps: i32) {
        let current = self.control(field).value();
        self.edit_slider(field, current + f64::from(steps) * field.slider_step());
    }

    fn after_edit(&mut self, field: Field) {
        if field == Field::LoanAmount {
            // Down payment can never exceed the loan it pays into
            let max = self.loan_amount.value();
            self.down_payment.set_bounds(FieldBounds::new(0.0, max, 0.0));
        }
    }

    /// Effective values for the calculator
    pub fn inputs(&self) -> LoanInputs {
        LoanInputs {
            loan_amount: self.loan_amount.value(),
            subsidy_percent: self.subsidy_percent.value(),
            down_payment: self.down_payment.value(),
            duration_years: self.duration.value() as u32,
        }
    }

    /// Restore both representations of every field to `defaults`
    pub fn reset(&mut self, defaults: &LoanInputs) {
        *self = Self::new(defaults, self.limits);
    }
}
