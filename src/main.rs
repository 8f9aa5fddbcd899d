use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::{ArgAction, Parser};
use ratatui::DefaultTerminal;
use tracing::{error, info};

use cview::controller::Controller;
use cview::domain::{CVConfig, CVError, Category, DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE};
use cview::fetcher::HttpSource;
use cview::logging;
use cview::model::{Model, Status};
use cview::ui::TableUI;

#[derive(Parser, Debug)]
#[command(version, about = "Browse posts and comments of a REST content API in the terminal.")]
struct Cli {
    /// Base url of the content API.
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Category shown on start.
    #[arg(long, value_enum, default_value_t = Category::Posts)]
    category: Category,

    /// Rows per table page.
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE as u16, value_parser = clap::value_parser!(u16).range(1..))]
    page_size: u16,

    /// Directory downloads are written to.
    #[arg(long, default_value = ".")]
    export_dir: PathBuf,

    /// Request timeout in seconds, none by default.
    #[arg(long)]
    timeout: Option<u64>,

    /// Log file.
    #[arg(long, default_value = "cview.log")]
    log_file: PathBuf,

    /// More verbose logging (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn config(&self) -> CVConfig {
        CVConfig::default()
            .base_url(self.base_url.clone())
            .category(self.category)
            .page_size(self.page_size as usize)
            .export_dir(self.export_dir.clone())
            .request_timeout(self.timeout.map(Duration::from_secs))
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = logging::init_logging(&cli.log_file, logging::level_from_verbosity(cli.verbose)) {
        eprintln!("Could not open log file {}: {e}", cli.log_file.display());
        return ExitCode::FAILURE;
    }

    match run(&cli.config()) {
        Err(e) => {
            error!("Terminating: {e:?}");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
        Ok(_) => ExitCode::SUCCESS,
    }
}

fn run(cfg: &CVConfig) -> Result<(), CVError> {
    info!("Starting cview with {cfg:?}");
    let source = HttpSource::new(&cfg.base_url, cfg.request_timeout)?;

    let mut model = Model::init(cfg, Arc::new(source));
    let controller = Controller::new(cfg);

    let mut terminal = ratatui::init();
    let result = event_loop(&mut terminal, &mut model, &controller);
    ratatui::restore();

    info!("Quitting cview");
    result
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    model: &mut Model,
    controller: &Controller,
) -> Result<(), CVError> {
    let mut ui = TableUI::new();
    model.load();
    while model.status != Status::QUITTING {
        model.poll_fetches();

        terminal.draw(|f| ui.draw(model, f))?;

        let message = controller.handle_event(model)?;
        model.update(message)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_builds_config() {
        let cli = Cli::parse_from([
            "cview",
            "--category",
            "comments",
            "--page-size",
            "25",
            "--timeout",
            "3",
            "--base-url",
            "http://localhost:3000",
        ]);
        let cfg = cli.config();
        assert_eq!(cfg.category, Category::Comments);
        assert_eq!(cfg.page_size, 25);
        assert_eq!(cfg.request_timeout, Some(Duration::from_secs(3)));
        assert_eq!(cfg.base_url, "http://localhost:3000");
    }

    #[test]
    fn cli_defaults() {
        let cfg = Cli::parse_from(["cview"]).config();
        assert_eq!(cfg.category, Category::Posts);
        assert_eq!(cfg.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(cfg.request_timeout, None);
    }

    #[test]
    fn cli_rejects_zero_page_size() {
        assert!(Cli::try_parse_from(["cview", "--page-size", "0"]).is_err());
    }
}
