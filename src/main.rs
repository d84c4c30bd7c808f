mod api;
mod app;
mod cli;
mod config;
mod download;
mod endpoint;
mod theme;
mod ui;

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
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::ApiClient;
use app::{App, Popup};
use config::AppConfig;
use download::DirDownloader;
use endpoint::catalog;
use theme::Theme;

#[derive(Parser, Debug)]
#[command(name = "quickstart-tui")]
#[command(version = "0.1.0")]
#[command(about = "A terminal client for exploring the quickstart demo API endpoints")]
struct Args {
    /// Backend base URL (overrides the config file)
    #[arg(short, long)]
    base_url: Option<String>,

    /// Directory PDFs are saved to (overrides the config file)
    #[arg(short, long)]
    download_dir: Option<PathBuf>,

    /// Print the endpoint catalog and exit
    #[arg(short, long)]
    list: bool,

    /// Request one endpoint and print its rows as JSON
    #[arg(short, long, value_name = "ENDPOINT")]
    fetch: Option<String>,

    /// Sync transactions and save transactions.pdf
    #[arg(short, long)]
    sync: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (stderr keeps stdout clean for --fetch output)
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut config = AppConfig::load().unwrap_or_default();
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(dir) = args.download_dir {
        config.download_dir = Some(dir);
    }

    // Handle CLI-only commands
    if args.list {
        return print_catalog(&config);
    }

    if let Some(endpoint) = args.fetch {
        return fetch_endpoint(&config, &endpoint).await;
    }

    if args.sync {
        return sync_transactions(&config).await;
    }

    // Run TUI
    run_tui(config).await
}

fn print_catalog(config: &AppConfig) -> Result<()> {
    let entries = cli::catalog_json(&catalog::select(&config.endpoints));
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

async fn fetch_endpoint(config: &AppConfig, endpoint: &str) -> Result<()> {
    let client = ApiClient::new(&config.base_url);
    let output = cli::fetch_rows(&client, endpoint).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn sync_transactions(config: &AppConfig) -> Result<()> {
    let client = ApiClient::new(&config.base_url);
    let downloader = DirDownloader::new(config.resolved_download_dir());

    let path = cli::sync_to_disk(&client, &downloader).await?;
    println!("{}", path.display());

    if config.notifications {
        cli::announce_saved(&path, app::notify);
    }
    Ok(())
}

async fn run_tui(config: AppConfig) -> Result<()> {
    ui::set_theme(Theme::from_config(&config.theme));

    let downloader = DirDownloader::new(config.resolved_download_dir());
    tracing::info!("Saving downloads to {}", downloader.dir().display());
    let mut app = App::new(
        catalog::select(&config.endpoints),
        ApiClient::new(&config.base_url),
        Arc::new(downloader),
        config.notifications,
    );

    // Restore the terminal even if drawing panics
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
        original_hook(info);
    }));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') if app.popup == Popup::None => return Ok(()),
                        KeyCode::Char('c')
                            if key.modifiers.contains(event::KeyModifiers::CONTROL) =>
                        {
                            return Ok(())
                        }
                        _ => {
                            // Handle key and catch any errors to prevent crashes
                            if let Err(e) = app.handle_key(key) {
                                tracing::warn!("Key handling failed: {:#}", e);
                                app.status_message = Some(format!("Error: {}", e));
                                app.status_message_time = Some(std::time::Instant::now());
                            }
                        }
                    }
                }
            }
        }

        // Apply finished requests
        app.drain_events();
        app.tick();
    }
}
