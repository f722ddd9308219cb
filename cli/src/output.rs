/// cli/src/output.rs
/// Output utilities for the CLI
/// description: styles, the log subscriber, the progress bar and the
/// build summary table.

use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use console::Style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Styles for the different kinds of CLI messages
pub struct FormatStyle {
    pub title: Style,
    pub error: Style,
    pub success: Style,
}

impl Default for FormatStyle {
    fn default() -> Self {
        FormatStyle {
            title: Style::new().bold().underlined(),
            error: Style::new().red().bold(),
            success: Style::new().green().bold(),
        }
    }
}

/// ====================================================================
/// Logger

/// Map `-v` occurrences to a level: warnings by default, then info, debug,
/// trace.
pub fn level_for(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Install the stderr subscriber. `RUST_LOG` directives win over `-v`.
/// Records from the `log` facade are bridged into it.
pub fn init_logger(verbosity: u8) {
    let filter = EnvFilter::builder()
        .with_default_directive(level_for(verbosity).into())
        .from_env_lossy();
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_ansi(console::colors_enabled_stderr())
        .try_init();
    if let Err(e) = installed {
        eprintln!("logging disabled: {}", e);
    }
}

/// ====================================================================
/// Progress bar

pub fn progress_bar(total: usize, visible: bool) -> ProgressBar {
    if !visible || total < 2 {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::with_draw_target(Some(total as u64), ProgressDrawTarget::stderr());
    let style = ProgressStyle::with_template("{prefix:.bold} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
        .map(|s| s.progress_chars("█▒░"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb.set_prefix("compiling");
    pb
}

/// ====================================================================
/// Summary table

#[derive(Debug, Clone, serde::Serialize)]
pub struct FileOutcome {
    pub input: String,
    pub output: Option<String>,
    pub lines: usize,
    pub ok: bool,
}

pub fn summary_table(outcomes: &[FileOutcome]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["File", "Output", "Lines", "Status"]);
    for outcome in outcomes {
        let status = if outcome.ok {
            Cell::new("ok").fg(Color::Green)
        } else {
            Cell::new("failed").fg(Color::Red)
        };
        table.add_row(vec![
            Cell::new(&outcome.input),
            Cell::new(outcome.output.as_deref().unwrap_or("-")),
            Cell::new(outcome.lines),
            status,
        ]);
    }
    table
}
