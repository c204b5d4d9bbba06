mod app;
mod calc;
mod config;
mod form;
mod theme;
mod ui;
mod widget;

use anyhow::Result;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app::{App, Popup};
use calc::format::format_currency;
use config::AppConfig;
use form::{Field, LoanForm};
use widget::{Variant, WidgetConfig};

#[derive(Parser, Debug)]
#[command(name = "loanwidget")]
#[command(author = "Sean Fournier")]
#[command(version = "0.1.0")]
#[command(about = "Interactive loan calculator with a lead capture form")]
struct Args {
    /// Widget flavour (overrides the config file)
    #[arg(long, value_enum)]
    variant: Option<Variant>,

    /// Append result messages to this file for an embedding page
    #[arg(long, value_name = "PATH")]
    embed: Option<PathBuf>,

    /// Use this config file instead of the default location
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print a quote as JSON and exit
    #[arg(short, long)]
    quote: bool,

    /// Loan amount for --quote
    #[arg(long, requires = "quote")]
    amount: Option<String>,

    /// Subsidy percentage for --quote
    #[arg(long, requires = "quote")]
    subsidy: Option<String>,

    /// Down payment for --quote
    #[arg(long, requires = "quote")]
    downpayment: Option<String>,

    /// Duration in years for --quote
    #[arg(long, requires = "quote")]
    years: Option<String>,

    /// Print the effective config as TOML and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let tui = !args.quote && !args.print_config;
    init_logging(tui);

    let config = AppConfig::load(args.config.as_deref())?;

    // Handle CLI-only commands
    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    if args.quote {
        return print_quote(&config, &args);
    }

    // Run TUI
    run_tui(&config, args.variant, args.embed).await
}

/// The TUI owns the terminal, so it logs to a file; CLI modes log to stderr
fn init_logging(tui: bool) {
    let filter = tracing_subscriber::EnvFilter::from_default_env();

    if !tui {
        tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
            .with(filter)
            .init();
        return;
    }

    match open_log_file() {
        Some(file) => tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .with(filter)
            .init(),
        None => tracing_subscriber::registry()
            .with(tracing_subscriber::fmt::layer().with_writer(io::sink))
            .with(filter)
            .init(),
    }
}

fn open_log_file() -> Option<std::fs::File> {
    let dir = dirs::data_dir().or_else(dirs::cache_dir)?.join("loanwidget");
    std::fs::create_dir_all(&dir).ok()?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("loanwidget.log"))
        .ok()
}

fn print_quote(config: &AppConfig, args: &Args) -> Result<()> {
    let widget_config = WidgetConfig::from_app_config(config, args.variant);
    let mut form = LoanForm::new(&widget_config.defaults, widget_config.limits);

    // Same clamping and fallbacks as typing into the form
    let overrides = [
        (Field::LoanAmount, &args.amount),
        (Field::SubsidyPercent, &args.subsidy),
        (Field::DownPayment, &args.downpayment),
        (Field::Duration, &args.years),
    ];
    for (field, value) in overrides {
        if let Some(text) = value {
            form.edit_entry(field, text);
        }
    }

    let inputs = form.inputs();
    let result = calc::compute_result(&inputs, widget_config.annual_rate_percent);
    let symbol = &widget_config.currency_symbol;

    let output = serde_json::json!({
        "inputs": inputs,
        "annualRatePercent": widget_config.annual_rate_percent,
        "financedAmount": result.financed_principal,
        "subsidyAmount": result.subsidy_amount,
        "monthlyPayment": result.monthly_payment,
        "totalRepayment": result.total_repayment(),
        "totalInterest": result.total_interest(),
        "formatted": {
            "financedAmount": format_currency(result.financed_principal, symbol),
            "subsidyAmount": format_currency(result.subsidy_amount, symbol),
            "monthlyPayment": format_currency(result.monthly_payment, symbol),
            "totalRepayment": format_currency(result.total_repayment(), symbol),
            "totalInterest": format_currency(result.total_interest(), symbol),
        }
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run_tui(config: &AppConfig, variant: Option<Variant>, embed: Option<PathBuf>) -> Result<()> {
    // Create app state before touching the terminal so config problems show up normally
    let mut app = App::new(config, variant, embed);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Let the embed writer drain what is already queued
    drop(app);
    tokio::task::yield_now().await;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') if app.popup == Popup::None && !app.is_typing() => {
                            return Ok(())
                        }
                        KeyCode::Char('c') if key.modifiers.contains(event::KeyModifiers::CONTROL) => {
                            return Ok(())
                        }
                        _ => {
                            // Handle key and catch any errors to prevent crashes
                            if let Err(e) = app.handle_key(key) {
                                tracing::error!("{:#}", e);
                                app.status_message = Some(format!("Error: {}", e));
                                app.status_message_time = Some(std::time::Instant::now());
                            }
                        }
                    }
                }
            }
        }

        app.tick();
    }
}
