use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, ContactFocus, Focus, Popup};
use crate::calc::format::{format_currency, format_plain};
use crate::form::validate::{ContactField, ContactFields};
use crate::form::Field;
use crate::widget::Variant;

pub fn draw(f: &mut Frame, app: &App) {
    let area = f.area();

    let inline_open = app.widget.config().variant == Variant::Inline && app.widget.is_contact_open();
    let contact_height = if inline_open { Constraint::Length(9) } else { Constraint::Length(0) };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(1),  // Info line
            Constraint::Min(14),    // Inputs + results
            contact_height,         // Inline contact form
            Constraint::Length(1),  // Footer
        ])
        .split(area);

    draw_info_line(f, app, chunks[0]);

    // Side by side on wide terminals, stacked on narrow ones
    let body = if area.width >= 90 {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1])
    } else {
        Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(14), Constraint::Length(9)])
            .split(chunks[1])
    };

    draw_inputs_box(f, app, body[0]);
    draw_results_box(f, app, body[1]);

    if inline_open {
        let inner = Block::default()
            .title(Span::styled(" Your contact details ", Style::default().fg(app.theme.header)))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(if matches!(app.focus, Focus::Contact(_)) {
                app.theme.accent
            } else {
                app.theme.inactive
            }));
        let content_area = inner.inner(chunks[2]);
        f.render_widget(inner, chunks[2]);
        draw_contact_fields(f, app, content_area);
    }

    draw_footer(f, app, chunks[3]);

    match app.popup {
        Popup::None => {}
        Popup::Contact => draw_contact_popup(f, app),
        Popup::Help => draw_help_popup(f, app),
    }
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;

    // Priority: status message > validation summary > ready
    let line = if let Some(ref status) = app.status_message {
        Line::from(Span::styled(status, Style::default().fg(theme.warning)))
    } else if let Some(msg) = app.widget.generic_error() {
        Line::from(Span::styled(msg, Style::default().fg(theme.danger)))
    } else {
        Line::from(vec![
            Span::styled(
                format!("Fixed rate {}% p.a.", format_plain(app.widget.config().annual_rate_percent)),
                Style::default().fg(theme.text_dim),
            ),
            Span::styled(" │ ", Style::default().fg(theme.inactive)),
            Span::styled("Ready", Style::default().fg(theme.text_dim)),
        ])
    };

    let info = Paragraph::new(line).alignment(Alignment::Center);
    f.render_widget(info, area);
}

fn draw_inputs_box(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let is_active = matches!(app.focus, Focus::Input(_) | Focus::Apply) && app.popup == Popup::None;
    let border_color = if is_active { theme.accent } else { theme.inactive };
    let title_style = if is_active {
        Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.inactive)
    };

    let block = Block::default()
        .title(Span::styled(" Loan Calculator ", title_style))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
        ])
        .split(inner);

    for (i, field) in Field::ALL.iter().enumerate() {
        draw_paired_control(f, app, *field, rows[i]);
    }

    let apply_focused = app.focus == Focus::Apply && app.popup == Popup::None;
    let label = match app.widget.config().variant {
        Variant::Popup => "  Apply now  ",
        Variant::Inline if app.widget.is_contact_open() => "  Hide contact form  ",
        Variant::Inline => "  Apply now  ",
    };
    let button_style = if apply_focused {
        Style::default().fg(theme.text).bg(theme.bg_selected).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.accent)
    };
    let button = Paragraph::new(Line::from(vec![
        Span::styled("[", Style::default().fg(theme.text_dim)),
        Span::styled(label, button_style),
        Span::styled("]", Style::default().fg(theme.text_dim)),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(button, rows[4]);
}

fn draw_paired_control(f: &mut Frame, app: &App, field: Field, area: Rect) {
    let theme = &app.theme;
    let control = app.widget.form().control(field);
    let focused = app.focus == Focus::Input(field) && app.popup == Popup::None;

    let row_style = if focused {
        Style::default().bg(theme.bg_selected).fg(theme.text)
    } else {
        Style::default()
    };

    let cursor = if focused { "_" } else { "" };
    let unit = field.unit();
    let symbol = &app.widget.config().currency_symbol;
    let prefix = if unit.is_empty() { symbol.as_str() } else { "" };

    let entry_line = Line::from(vec![
        Span::styled(format!(" {:<14}", field.label()), Style::default().fg(theme.header)),
        Span::styled(format!("{}{}{}", prefix, control.entry, cursor), Style::default().fg(theme.text).add_modifier(Modifier::BOLD)),
        Span::styled(format!(" {}", unit), Style::default().fg(theme.text_dim)),
    ]);

    // Slider: min ━━━━●──── max
    let min_label = format_plain(control.bounds.min);
    let max_label = format_plain(control.bounds.max);
    let track_width = (area.width as usize)
        .saturating_sub(min_label.len() + max_label.len() + 6)
        .max(4);
    let filled = ((control.ratio() * (track_width - 1) as f64).round() as usize).min(track_width - 1);
    let knob_color = if focused { theme.accent } else { theme.text_dim };

    let slider_line = Line::from(vec![
        Span::styled(format!(" {} ", min_label), Style::default().fg(theme.text_dim)),
        Span::styled("━".repeat(filled), Style::default().fg(knob_color)),
        Span::styled("●", Style::default().fg(knob_color).add_modifier(Modifier::BOLD)),
        Span::styled("─".repeat(track_width - 1 - filled), Style::default().fg(theme.inactive)),
        Span::styled(format!(" {}", max_label), Style::default().fg(theme.text_dim)),
    ]);

    let paragraph = Paragraph::new(vec![entry_line, slider_line]).style(row_style);
    f.render_widget(paragraph, area);
}

fn draw_results_box(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let result = app.widget.result();
    let symbol = &app.widget.config().currency_symbol;

    let block = Block::default()
        .title(Span::styled(" Your Loan ", Style::default().fg(theme.header)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.inactive));

    let row = |label: &str, value: String, emphasize: bool| {
        let value_style = if emphasize {
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.text)
        };
        Line::from(vec![
            Span::styled(format!(" {:<18}", label), Style::default().fg(theme.text_dim)),
            Span::styled(value, value_style),
        ])
    };

    let lines = vec![
        Line::from(""),
        row("Financed amount", format_currency(result.financed_principal, symbol), false),
        row("Subsidy", format_currency(result.subsidy_amount, symbol), false),
        Line::from(""),
        row("Monthly payment", format_currency(result.monthly_payment, symbol), true),
        Line::from(""),
        row("Total repayment", format_currency(result.total_repayment(), symbol), false),
        row("Total interest", format_currency(result.total_interest(), symbol), false),
    ];

    let content = Paragraph::new(lines).block(block);
    f.render_widget(content, area);
}

/// Email/phone/consent rows plus the send button; shared by popup and inline form
fn draw_contact_fields(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let contact = app.widget.contact();
    let focus = app.active_contact_focus();

    let second = match app.widget.config().contact_fields {
        ContactFields::EmailPhone => ContactFocus::Phone,
        ContactFields::EmailConsent => ContactFocus::Consent,
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
        ])
        .split(area);

    // Email
    draw_text_input(
        f,
        app,
        rows[0],
        " Email ",
        &contact.email,
        focus == Some(ContactFocus::Email),
        app.widget.field_error(ContactField::Email).map(|e| e.to_string()),
    );

    // Phone or consent
    match second {
        ContactFocus::Phone => draw_text_input(
            f,
            app,
            rows[1],
            " Phone ",
            &contact.phone,
            focus == Some(ContactFocus::Phone),
            app.widget.field_error(ContactField::Phone).map(|e| e.to_string()),
        ),
        _ => {
            let focused = focus == Some(ContactFocus::Consent);
            let mark = if contact.consent { "[x]" } else { "[ ]" };
            let mut spans = vec![
                Span::styled(format!(" {} ", mark), Style::default().fg(if focused { theme.accent } else { theme.text })),
                Span::styled("I agree to be contacted about my application", Style::default().fg(theme.text)),
            ];
            if let Some(err) = app.widget.field_error(ContactField::Consent) {
                spans.push(Span::styled(format!("  {}", err), Style::default().fg(theme.danger)));
            }
            let style = if focused { Style::default().bg(theme.bg_selected) } else { Style::default() };
            let consent = Paragraph::new(vec![Line::from(""), Line::from(spans)]).style(style);
            f.render_widget(consent, rows[1]);
        }
    }

    // Send button, dimmed until the form validates
    let send_focused = focus == Some(ContactFocus::Send);
    let enabled = app.widget.submit_enabled();
    let send_color = if enabled { theme.success } else { theme.inactive };
    let mut send_style = Style::default().fg(send_color);
    if send_focused {
        send_style = send_style.bg(theme.bg_selected).add_modifier(Modifier::BOLD);
    }
    let send = Paragraph::new(Line::from(vec![
        Span::styled("[ ", Style::default().fg(theme.text_dim)),
        Span::styled(if enabled { "Send" } else { "Send (fill in all fields)" }, send_style),
        Span::styled(" ]", Style::default().fg(theme.text_dim)),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(send, rows[2]);
}

fn draw_text_input(
    f: &mut Frame,
    app: &App,
    area: Rect,
    title: &str,
    value: &str,
    focused: bool,
    error: Option<String>,
) {
    let theme = &app.theme;
    let border = if error.is_some() {
        theme.danger
    } else if focused {
        theme.accent
    } else {
        theme.inactive
    };
    let cursor = if focused { "_" } else { "" };

    let mut block = Block::default()
        .title(Span::styled(title.to_string(), Style::default().fg(if focused { theme.accent } else { theme.header })))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    if let Some(err) = error {
        block = block.title_bottom(Line::from(Span::styled(format!(" {} ", err), Style::default().fg(theme.danger))));
    }

    let input = Paragraph::new(format!("{}{}", value, cursor))
        .style(Style::default().fg(theme.text))
        .block(block);
    f.render_widget(input, area);
}

fn draw_contact_popup(f: &mut Frame, app: &App) {
    let theme = &app.theme;
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 90 } else { 60 },
        if area.height < 30 { 70 } else { 50 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let block = Block::default()
        .title(Span::styled(" Request your loan ", Style::default().fg(theme.accent)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.accent));
    f.render_widget(block, popup_area);

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(8),
            Constraint::Length(1),
        ])
        .split(popup_area);

    let result = app.widget.result();
    let symbol = &app.widget.config().currency_symbol;
    let summary = Paragraph::new(Line::from(vec![
        Span::styled("Monthly payment ", Style::default().fg(theme.text_dim)),
        Span::styled(
            format_currency(result.monthly_payment, symbol),
            Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" over {} years", result.duration_years),
            Style::default().fg(theme.text_dim),
        ),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(summary, inner[0]);

    draw_contact_fields(f, app, inner[1]);

    let hint = Paragraph::new(Line::from(vec![
        Span::styled("Tab", Style::default().fg(theme.accent)),
        Span::raw(" next │ "),
        Span::styled("Enter", Style::default().fg(theme.accent)),
        Span::raw(" send │ "),
        Span::styled("Esc", Style::default().fg(theme.accent)),
        Span::raw(" close"),
    ]))
    .alignment(Alignment::Center)
    .style(Style::default().fg(theme.text_dim));
    f.render_widget(hint, inner[2]);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let theme = &app.theme;
    let hints: Vec<(&str, &str)> = match app.focus {
        Focus::Input(_) => vec![
            ("0-9", "Type"),
            ("←→", "Slide"),
            ("PgUp/Dn", "Jump"),
            ("Tab", "Next"),
            ("r", "Reset"),
            ("h", "Help"),
            ("q", "Quit"),
        ],
        Focus::Apply => vec![
            ("Enter", "Apply"),
            ("Tab", "Next"),
            ("r", "Reset"),
            ("h", "Help"),
            ("q", "Quit"),
        ],
        Focus::Contact(_) => vec![
            ("Tab", "Next"),
            ("Space", "Toggle"),
            ("Enter", "Send"),
            ("Esc", "Back"),
        ],
    };

    // Responsive: show fewer hints on narrow terminals
    let max_hints = if area.width < 60 { 4 } else if area.width < 80 { 5 } else { hints.len() };

    let hint_spans: Vec<Span> = hints
        .iter()
        .take(max_hints)
        .flat_map(|(key, action)| {
            vec![
                Span::styled(*key, Style::default().fg(theme.accent)),
                Span::styled(format!(" {} │ ", action), Style::default().fg(theme.text_dim)),
            ]
        })
        .collect();

    let footer = Paragraph::new(Line::from(hint_spans)).alignment(Alignment::Center);
    f.render_widget(footer, area);
}

fn draw_help_popup(f: &mut Frame, app: &App) {
    let theme = &app.theme;
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 70 },
        if area.height < 40 { 95 } else { 80 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let config = app.widget.config();
    let limits = app.widget.form().limits();
    let section = |title: &str| {
        Line::from(Span::styled(
            format!("═══ {} ═══", title),
            Style::default().fg(theme.header).add_modifier(Modifier::BOLD),
        ))
    };
    let key = |k: &str, desc: String| {
        Line::from(vec![
            Span::styled(format!("  {:<12}", k), Style::default().fg(theme.accent)),
            Span::raw(desc),
        ])
    };

    let contact_rule = match config.contact_fields {
        ContactFields::EmailPhone => "Email and phone number (10-15 digits) are required",
        ContactFields::EmailConsent => "Email and consent to be contacted are required",
    };

    let help_text = vec![
        section("Navigation"),
        key("Tab ↓", "Next field".to_string()),
        key("S-Tab ↑", "Previous field".to_string()),
        Line::from(""),
        section("Editing"),
        key("0-9 .", "Type into the focused field".to_string()),
        key("Backspace", "Delete last character".to_string()),
        key("Del C-u", "Clear the field".to_string()),
        key("← →", "Move the slider one step".to_string()),
        key("PgUp PgDn", "Move the slider ten steps".to_string()),
        key("Home End", "Slider to minimum / maximum".to_string()),
        key("r", "Reset all inputs to defaults".to_string()),
        Line::from(""),
        section("Limits"),
        key("Loan", format!("up to {}", format_currency(limits.max_loan_amount, &config.currency_symbol))),
        key("Down payment", "never more than the loan amount".to_string()),
        key("Duration", format!("{} to {} years", limits.duration_min, limits.duration_max)),
        key("Rate", format!("{}% p.a., fixed", format_plain(config.annual_rate_percent))),
        Line::from(""),
        section("Applying"),
        key("Enter", "On \"Apply now\" opens the contact form".to_string()),
        Line::from(vec![Span::raw(format!("  {}", contact_rule))]),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(theme.text_dim)),
            Span::styled("h", Style::default().fg(theme.accent)),
            Span::styled("/", Style::default().fg(theme.text_dim)),
            Span::styled("?", Style::default().fg(theme.accent)),
            Span::styled("/", Style::default().fg(theme.text_dim)),
            Span::styled("Esc", Style::default().fg(theme.accent)),
            Span::styled(" to close", Style::default().fg(theme.text_dim)),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" loanwidget Help ", Style::default().fg(theme.accent)))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.accent)),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::Theme;
    use crate::widget::host::WidgetHost;
    use crate::widget::submit::LogSink;
    use crate::widget::{LoanWidget, WidgetConfig};
    use ratatui::{backend::TestBackend, Terminal};

    struct Quiet;

    impl WidgetHost for Quiet {
        fn notify_user(&self, _message: &str) {}
    }

    fn render(app: &App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|f| draw(f, app)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn app(variant: Variant) -> App {
        let widget = LoanWidget::new(WidgetConfig::preset(variant), Box::new(LogSink), Box::new(Quiet));
        App::with_widget(widget, Theme::default())
    }

    #[test]
    fn test_results_are_rendered_formatted() {
        let screen = render(&app(Variant::Popup), 120, 30);
        assert!(screen.contains("€15,000"));
        assert!(screen.contains("€5,000"));
        assert!(screen.contains("€1,288"));
        assert!(screen.contains("Apply now"));
    }

    #[test]
    fn test_contact_popup_renders() {
        let mut app = app(Variant::Popup);
        app.widget.open_contact();
        app.popup = Popup::Contact;
        let screen = render(&app, 120, 40);
        assert!(screen.contains("Request your loan"));
        assert!(screen.contains("Phone"));
        assert!(screen.contains("Send (fill in all fields)"));
    }

    #[test]
    fn test_inline_form_renders_consent() {
        let mut app = app(Variant::Inline);
        app.widget.open_contact();
        let screen = render(&app, 120, 40);
        assert!(screen.contains("Your contact details"));
        assert!(screen.contains("[ ]"));
    }

    #[test]
    fn test_narrow_terminal_does_not_panic() {
        let mut app = app(Variant::Inline);
        app.widget.open_contact();
        app.popup = Popup::Help;
        render(&app, 40, 20);
        render(&app, 10, 5);
    }

    #[test]
    fn test_centered_rect() {
        let r = centered_rect(50, 50, Rect::new(0, 0, 100, 40));
        assert_eq!(r.width, 50);
        assert_eq!(r.height, 20);
    }
}
