//! CLI binary for workflow-player.
//!
//! A terminal renderer over the library crate: it plays a step catalog,
//! draws the progress bar and the active step's detail panel, and maps
//! typed commands to the sequencer's operations.

use anyhow::{Context, Result};
use clap::Parser;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use workflow_player::{
    change_stream, Sequencer, SequencerConfig, SequencerObserver, SequencerSnapshot, StepCatalog,
    StepStatus, Transition,
};

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── Terminal renderer ────────────────────────────────────────────────────────

/// Draws every state change: a detail panel for the active step and, unless
/// disabled, a progress bar with one position per step.
struct TerminalRenderer {
    bar: Option<ProgressBar>,
    json: bool,
}

impl TerminalRenderer {
    fn new(step_count: usize, show_progress: bool, json: bool) -> Arc<Self> {
        let bar = (show_progress && !json).then(|| {
            let bar = ProgressBar::new(step_count as u64);
            let style = ProgressStyle::with_template(
                "{prefix:.bold}  [{bar:42.green/238}] {pos}/{len} steps  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ");
            bar.set_style(style);
            bar.set_prefix("Stopped");
            bar.set_position(1);
            bar
        });
        Arc::new(Self { bar, json })
    }

    fn print(&self, line: String) {
        match self.bar {
            Some(ref bar) => bar.println(line),
            None => println!("{line}"),
        }
    }

    fn render_panel(&self, s: &SequencerSnapshot) {
        let marker = match s.transition {
            Transition::Started => cyan("▶"),
            Transition::Paused => cyan("⏸"),
            Transition::Wrapped => green("✔"),
            Transition::Reset => cyan("↺"),
            _ => cyan("◆"),
        };
        self.print(format!(
            "{} {}  {}",
            marker,
            bold(&format!("Step {}: {}", s.step.number(), s.step.title)),
            dim(&format!("{}%", s.progress_percent())),
        ));
        if !s.step.description.is_empty() {
            self.print(format!("  {}", s.step.description));
        }
        if !s.step.details.is_empty() {
            self.print(format!("  {}", dim(&s.step.details)));
        }
        if let Some(footer) = panel_footer(s) {
            self.print(footer);
        }
    }

    fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

impl SequencerObserver for TerminalRenderer {
    fn on_state_change(&self, snapshot: &SequencerSnapshot) {
        if self.json {
            match serde_json::to_string(snapshot) {
                Ok(line) => println!("{line}"),
                Err(e) => eprintln!("{} failed to serialise snapshot: {e}", red("✗")),
            }
            return;
        }

        if let Some(ref bar) = self.bar {
            bar.set_position(snapshot.current_index as u64 + 1);
            bar.set_prefix(if snapshot.running { "Playing" } else { "Stopped" });
            bar.set_message(snapshot.step.title.clone());
        }
        self.render_panel(snapshot);
    }
}

/// Closing line of the step panel, if the snapshot calls for one.
fn panel_footer(s: &SequencerSnapshot) -> Option<String> {
    if s.transition == Transition::Wrapped {
        Some(format!("{} Workflow complete; rewound to step 1", green("✔")))
    } else if s.running && s.is_last_step() {
        Some(dim("  Last step; the next tick rewinds to step 1 and stops"))
    } else {
        None
    }
}

/// One line per step, marked against a single snapshot so a tick landing
/// mid-listing cannot mark two steps active.
fn step_list(catalog: &StepCatalog, snapshot: &SequencerSnapshot) -> Vec<String> {
    catalog
        .iter()
        .map(|step| {
            let status = snapshot.status_of(step.index);
            let line = format!("  {} {}. {}", status.marker(), step.number(), step.title);
            match status {
                StepStatus::Active => bold(&line),
                StepStatus::Completed => green(&line),
                StepStatus::Pending => dim(&line),
            }
        })
        .collect()
}

// ── Commands ─────────────────────────────────────────────────────────────────

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Play/pause toggle.
    Toggle,
    Stop,
    Reset,
    /// Jump to a 1-based step number.
    GoTo(usize),
    List,
    Help,
    Quit,
}

const COMMAND_HELP: &str = "\
COMMANDS:
  p, play, pause, <enter>   Toggle automatic playback
  s, stop                   Pause playback
  r, reset                  Stop and return to step 1
  g N, N                    Jump to step N (stops playback)
  l, list                   List steps with their status
  h, help                   Show this help
  q, quit                   Exit";

/// Parse a line typed at the prompt into a [`Command`].
fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim().to_lowercase();
    let mut parts = line.split_whitespace();
    let head = parts.next().unwrap_or("");
    let arg = parts.next();

    if parts.next().is_some() {
        anyhow::bail!("Too many arguments in '{line}'");
    }

    let cmd = match (head, arg) {
        ("" | "p" | "play" | "pause", None) => Command::Toggle,
        ("s" | "stop", None) => Command::Stop,
        ("r" | "reset", None) => Command::Reset,
        ("l" | "list", None) => Command::List,
        ("h" | "help" | "?", None) => Command::Help,
        ("q" | "quit" | "exit", None) => Command::Quit,
        ("g" | "go" | "goto", Some(n)) => Command::GoTo(parse_step_number(n)?),
        ("g" | "go" | "goto", None) => anyhow::bail!("'{head}' needs a step number"),
        (n, None) if n.chars().all(|c| c.is_ascii_digit()) => {
            Command::GoTo(parse_step_number(n)?)
        }
        _ => anyhow::bail!("Unknown command '{line}' (type 'h' for help)"),
    };
    Ok(cmd)
}

fn parse_step_number(s: &str) -> Result<usize> {
    let n: usize = s
        .parse()
        .with_context(|| format!("Invalid step number: '{s}'"))?;
    if n < 1 {
        anyhow::bail!("Steps are 1-indexed, minimum is 1 (got {n})");
    }
    Ok(n)
}

/// Apply `cmd`. Returns `false` when the player should exit.
fn execute(cmd: Command, seq: &Sequencer, renderer: &TerminalRenderer) -> bool {
    match cmd {
        Command::Toggle => seq.start(),
        Command::Stop => seq.stop(),
        Command::Reset => seq.reset(),
        Command::GoTo(n) => {
            if let Err(e) = seq.go_to(n - 1) {
                renderer.print(format!("{} {e}", red("✗")));
            }
        }
        Command::List => {
            for line in step_list(seq.catalog(), &seq.snapshot()) {
                renderer.print(line);
            }
        }
        Command::Help => renderer.print(COMMAND_HELP.to_string()),
        Command::Quit => return false,
    }
    true
}

// ── CLI ──────────────────────────────────────────────────────────────────────

const EXAMPLES: &str = r#"EXAMPLES:
  # Play the built-in PDF translation workflow interactively
  workflow-player

  # Start playing immediately, one step per second
  workflow-player --autoplay --period-ms 1000

  # Play once through a custom catalog and exit, emitting JSON lines
  workflow-player --catalog steps.json --autoplay --exit-on-wrap --json

CATALOG FORMAT:
  A JSON array of steps, in order:
    [
      {"title": "PDF Input", "description": "…", "details": "…"},
      {"title": "Page Conversion", "description": "…"}
    ]
  "description" and "details" are optional.
"#;

/// `--help` epilogue: examples plus the same command table `h` prints.
fn after_long_help() -> String {
    format!("{EXAMPLES}\n{COMMAND_HELP}\n")
}

/// Play a workflow diagram's steps in the terminal.
#[derive(Parser, Debug)]
#[command(
    name = "workflow-player",
    version,
    about = "Play a workflow diagram's steps in the terminal",
    color = clap::ColorChoice::Auto,
    after_long_help = after_long_help()
)]
struct Cli {
    /// JSON step catalog. Default: the built-in PDF translation workflow.
    #[arg(long, env = "WORKFLOW_PLAYER_CATALOG")]
    catalog: Option<PathBuf>,

    /// Milliseconds between automatic advancements.
    #[arg(long, env = "WORKFLOW_PLAYER_PERIOD_MS", default_value_t = 2000,
          value_parser = clap::value_parser!(u64).range(100..))]
    period_ms: u64,

    /// Start playing immediately.
    #[arg(long, env = "WORKFLOW_PLAYER_AUTOPLAY")]
    autoplay: bool,

    /// Exit once playback reaches the end and rewinds.
    #[arg(long, env = "WORKFLOW_PLAYER_EXIT_ON_WRAP")]
    exit_on_wrap: bool,

    /// Print each state change as a JSON line instead of the step panel.
    #[arg(long, env = "WORKFLOW_PLAYER_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "WORKFLOW_PLAYER_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "WORKFLOW_PLAYER_VERBOSE")]
    verbose: bool,

    /// Suppress all logs except errors.
    #[arg(short, long, env = "WORKFLOW_PLAYER_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar and panel already narrate every transition; library
    // INFO logs would only duplicate them.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress || cli.json {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build sequencer ──────────────────────────────────────────────────
    let catalog = match cli.catalog {
        Some(ref path) => StepCatalog::from_json_file(path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        None => StepCatalog::pdf_translation_workflow(),
    };

    let renderer = TerminalRenderer::new(catalog.len(), show_progress, cli.json);
    let config = SequencerConfig::builder()
        .tick_period_ms(cli.period_ms)
        .observer(renderer.clone())
        .build()
        .context("Invalid configuration")?;
    let seq = Sequencer::new(catalog, &config).context("Failed to create sequencer")?;

    if !cli.json {
        renderer.print(format!(
            "{} {}  {}",
            cyan("◆"),
            bold(&format!("{} steps", seq.step_count())),
            dim("type 'h' for commands"),
        ));
        renderer.render_panel(&seq.snapshot());
    }

    // ── Event loop ───────────────────────────────────────────────────────
    let mut changes = change_stream(&seq);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    if cli.autoplay {
        seq.start();
    }

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                match line.context("Failed to read stdin")? {
                    Some(line) => match parse_command(&line) {
                        Ok(cmd) => {
                            if !execute(cmd, &seq, &renderer) {
                                break;
                            }
                        }
                        Err(e) => renderer.print(format!("{} {e}", red("✗"))),
                    },
                    // EOF: keep playing if asked to finish the run, else quit.
                    None if cli.exit_on_wrap && seq.is_running() => stdin_open = false,
                    None => break,
                }
            }
            Some(snapshot) = changes.next() => {
                if cli.exit_on_wrap && snapshot.transition == Transition::Wrapped {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    renderer.finish();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_line_toggles() {
        assert_eq!(parse_command("").unwrap(), Command::Toggle);
        assert_eq!(parse_command("  Play ").unwrap(), Command::Toggle);
        assert_eq!(parse_command("pause").unwrap(), Command::Toggle);
    }

    #[test]
    fn bare_number_jumps() {
        assert_eq!(parse_command("3").unwrap(), Command::GoTo(3));
        assert_eq!(parse_command("g 6").unwrap(), Command::GoTo(6));
    }

    #[test]
    fn step_zero_rejected() {
        assert!(parse_command("0").is_err());
        assert!(parse_command("goto 0").is_err());
    }

    #[test]
    fn goto_without_number_rejected() {
        let err = parse_command("g").unwrap_err();
        assert!(err.to_string().contains("step number"), "got: {err}");
    }

    #[test]
    fn unknown_command_rejected() {
        assert!(parse_command("fly").is_err());
        assert!(parse_command("g 1 2").is_err());
    }

    #[test]
    fn simple_commands() {
        assert_eq!(parse_command("s").unwrap(), Command::Stop);
        assert_eq!(parse_command("reset").unwrap(), Command::Reset);
        assert_eq!(parse_command("l").unwrap(), Command::List);
        assert_eq!(parse_command("?").unwrap(), Command::Help);
        assert_eq!(parse_command("q").unwrap(), Command::Quit);
    }

    fn snapshot_at(catalog: &StepCatalog, current_index: usize, running: bool) -> SequencerSnapshot {
        SequencerSnapshot {
            current_index,
            step_count: catalog.len(),
            running,
            step: catalog.steps()[current_index].clone(),
            progress: (current_index + 1) as f64 / catalog.len() as f64,
            transition: if running { Transition::Advanced } else { Transition::Jumped },
        }
    }

    #[test]
    fn list_marks_exactly_one_active_step() {
        let catalog = StepCatalog::pdf_translation_workflow();
        let lines = step_list(&catalog, &snapshot_at(&catalog, 2, true));
        assert_eq!(lines.len(), 6);
        assert_eq!(lines.iter().filter(|l| l.contains('▶')).count(), 1);
        assert!(lines[2].contains("▶ 3. OCR Processing"));
        assert!(lines[0].contains('✓') && lines[1].contains('✓'));
        assert!(lines[5].contains('·'));
    }

    #[test]
    fn footer_on_last_step_and_wrap() {
        let catalog = StepCatalog::pdf_translation_workflow();
        assert!(panel_footer(&snapshot_at(&catalog, 4, true)).is_none());
        assert!(panel_footer(&snapshot_at(&catalog, 5, false)).is_none());

        let last = panel_footer(&snapshot_at(&catalog, 5, true)).unwrap();
        assert!(last.contains("Last step"), "got: {last}");

        let mut wrapped = snapshot_at(&catalog, 0, false);
        wrapped.transition = Transition::Wrapped;
        let done = panel_footer(&wrapped).unwrap();
        assert!(done.contains("Workflow complete"), "got: {done}");
    }

    #[test]
    fn long_help_lists_every_command() {
        use clap::CommandFactory;
        let help = Cli::command().render_long_help().to_string();
        for line in COMMAND_HELP.lines().skip(1) {
            assert!(help.contains(line.trim()), "missing from --help: {line}");
        }
    }
}
