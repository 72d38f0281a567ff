//! CLI binary for edgequake-graph2docx.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ReportConfig`, captures the graphs and prints the result.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_graph2docx::{
    capture_entries, generate_report, resolve_report_path, CaptureRect, CaptureSource, GraphSlot,
    ImageFileCapturer, OverlaySelector, ProgressCallback, ReportConfig, ReportProgressCallback,
    ScreenCapturer, DEFAULT_REPORT_NAME,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a spinner for the current step and one log line per
/// finished graph.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ReportProgressCallback for CliProgressCallback {
    fn on_capture_start(&self, index: usize, total: usize, label: &str) {
        self.bar.set_prefix("Capturing");
        self.bar
            .set_message(format!("{label} ({index}/{total}) - focus the window to capture"));
    }

    fn on_capture_complete(&self, index: usize, total: usize, width: u32, height: u32) {
        self.bar.println(format!(
            "  {} Graph {:>2}/{:<2}  {}",
            green("✓"),
            index,
            total,
            dim(&format!("{width}x{height} px")),
        ));
    }

    fn on_template_ready(&self, paragraphs: usize, generated: bool) {
        self.bar.set_prefix("Binding");
        self.bar.set_message(if generated {
            format!("generated template ({paragraphs} paragraphs)")
        } else {
            format!("template with {paragraphs} paragraphs")
        });
    }

    fn on_bound(&self, entries: usize) {
        self.bar.set_prefix("Saving");
        self.bar.set_message(format!("{entries} placeholders filled"));
    }

    fn on_report_saved(&self, path: &Path) {
        self.bar
            .println(format!("  {} Saved {}", green("✓"), bold(&path.display().to_string())));
        self.bar.set_prefix("Exporting");
        self.bar.set_message("PDF…");
    }

    fn on_pdf_finished(&self, pdf_path: Option<&Path>, error: Option<&str>) {
        match (pdf_path, error) {
            (Some(p), _) => self
                .bar
                .println(format!("  {} PDF {}", green("✓"), p.display())),
            (None, Some(e)) => self.bar.println(format!("  {} PDF {}", red("✗"), red(e))),
            (None, None) => {}
        }
    }
}

impl Drop for CliProgressCallback {
    fn drop(&mut self) {
        self.bar.finish_and_clear();
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # One graph, selected with the mouse, default report name
  graph2docx

  # Three graphs into a customised template
  graph2docx -n 3 --template lab_template.docx -o week12

  # Fixed regions (x,y,width,height), no overlay
  graph2docx --region 100,100,600,400 --region 800,50,200,50

  # Capture a window by title and also export a PDF
  graph2docx --window "Oscilloscope" --pdf

  # Headless: cut regions from a saved screenshot, print JSON
  graph2docx --screenshot screen.png --region 0,0,640,480 --json -y

TEMPLATES:
  Placeholders are plain text in a paragraph: [GRAPH_1], [GRAPH_2], ...
  Each one is replaced by a bold "Graph N: <time stamp>" line followed by
  the picture. A missing --template file is generated with every marker
  in place so it can be styled in Word for the next run.

ENVIRONMENT VARIABLES:
  GRAPH2DOCX_OUTPUT       Report name
  GRAPH2DOCX_TEMPLATE     Template .docx
  GRAPH2DOCX_CONFIG       JSON configuration file
  GRAPH2DOCX_SCREENSHOT   Use this image instead of the live screen
  GRAPH2DOCX_SOFFICE      LibreOffice executable for --pdf
  RUST_LOG                Override log filter (e.g. edgequake_graph2docx=debug)
"#;

/// Capture graphs from the screen into a Word report.
#[derive(Parser, Debug)]
#[command(
    name = "graph2docx",
    version,
    about = "Capture graphs from the screen into a Word report",
    long_about = "Capture screen regions (interactively, by fixed coordinates, or by window \
title) and bind them into the placeholders of a .docx template, each with a time stamp. \
Optionally export the finished report to PDF through LibreOffice.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Report name; `.docx` is appended when missing.
    #[arg(short, long, env = "GRAPH2DOCX_OUTPUT")]
    output: Option<String>,

    /// Template .docx; generated there when the file does not exist.
    #[arg(short, long, env = "GRAPH2DOCX_TEMPLATE")]
    template: Option<PathBuf>,

    /// JSON configuration file; flags override its values.
    #[arg(short, long, env = "GRAPH2DOCX_CONFIG")]
    config: Option<PathBuf>,

    /// Number of graphs to select with the mouse.
    #[arg(short = 'n', long, env = "GRAPH2DOCX_COUNT",
          value_parser = clap::value_parser!(u16).range(1..=99))]
    count: Option<u16>,

    /// Fixed capture region X,Y,WIDTH,HEIGHT (repeatable).
    #[arg(long, value_parser = parse_region)]
    region: Vec<CaptureRect>,

    /// Capture the first window whose title contains this text (repeatable).
    #[arg(long)]
    window: Vec<String>,

    /// Use this image as the screen instead of capturing live.
    #[arg(long, env = "GRAPH2DOCX_SCREENSHOT")]
    screenshot: Option<PathBuf>,

    /// Title of generated templates.
    #[arg(long, env = "GRAPH2DOCX_TITLE")]
    title: Option<String>,

    /// strftime format of the time stamp.
    #[arg(long, env = "GRAPH2DOCX_DATE_FORMAT")]
    date_format: Option<String>,

    /// Width of inserted graphs in inches.
    #[arg(long, env = "GRAPH2DOCX_IMAGE_WIDTH")]
    image_width: Option<f32>,

    /// Pause before each capture in milliseconds.
    #[arg(long, env = "GRAPH2DOCX_DELAY")]
    delay: Option<u64>,

    /// Also export the report as PDF (needs LibreOffice).
    #[arg(long, env = "GRAPH2DOCX_PDF")]
    pdf: bool,

    /// LibreOffice executable.
    #[arg(long, env = "GRAPH2DOCX_SOFFICE")]
    soffice: Option<String>,

    /// Do not ask for the report name.
    #[arg(short = 'y', long)]
    yes: bool,

    /// Print the result (ReportOutput) as JSON on stdout.
    #[arg(long, env = "GRAPH2DOCX_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "GRAPH2DOCX_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "GRAPH2DOCX_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "GRAPH2DOCX_QUIET")]
    quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner replaces INFO logs; verbose always wins.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
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

    // ── Report name ──────────────────────────────────────────────────────
    let output = match cli.output.as_deref() {
        Some(name) => resolve_report_path(Some(name)),
        None if cli.config.is_none() && !cli.yes && !cli.json && io::stdin().is_terminal() => {
            prompt_report_name()?
        }
        None => resolve_report_path(None),
    };

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn ReportProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, output, progress_cb)?;
    let capturer = make_capturer(cli.screenshot.as_deref())?;

    // ── Capture (main thread: the overlay needs it) ──────────────────────
    let staged = capture_entries(&config, capturer.as_ref(), &OverlaySelector)
        .context("Capture failed")?;

    // ── Generate ─────────────────────────────────────────────────────────
    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    let result = runtime
        .block_on(generate_report(&config, staged))
        .context("Report generation failed")?;

    // Clears the spinner before the summary.
    drop(config);

    if cli.json {
        let json = serde_json::to_string_pretty(&result).context("Failed to serialise output")?;
        println!("{json}");
    } else if !cli.quiet {
        eprintln!(
            "{}  {} graphs  {}ms  →  {}",
            green("✔"),
            result.stats.entries_bound,
            result.stats.total_duration_ms,
            bold(&result.report_path.display().to_string()),
        );
        if let Some(ref p) = result.pdf_path {
            eprintln!("   {} {}", cyan("pdf"), p.display());
        }
        if let Some(ref e) = result.pdf_error {
            eprintln!("   {} PDF export failed: {}", cyan("⚠"), e);
        }
    }

    Ok(())
}

/// Ask for the report name on stdin, like the interactive tool always did.
fn prompt_report_name() -> Result<PathBuf> {
    eprint!(
        "Report name {}: ",
        dim(&format!("[{DEFAULT_REPORT_NAME}]"))
    );
    io::stderr().flush().ok();
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read report name")?;
    Ok(resolve_report_path(Some(&line)))
}

/// Map CLI args (on top of an optional config file) to `ReportConfig`.
fn build_config(
    cli: &Cli,
    output: PathBuf,
    progress: Option<ProgressCallback>,
) -> Result<ReportConfig> {
    let base = match cli.config {
        Some(ref path) => ReportConfig::from_json_file(path)
            .with_context(|| format!("Failed to load configuration from {:?}", path))?,
        None => ReportConfig::default(),
    };
    let from_file = cli.config.is_some();

    let mut builder = base.into_builder();

    if cli.output.is_some() || !from_file {
        builder = builder.output(output);
    }
    if let Some(ref t) = cli.template {
        builder = builder.template(t);
    }
    if let Some(ref t) = cli.title {
        builder = builder.title(t);
    }
    if let Some(ref f) = cli.date_format {
        builder = builder.date_format(f);
    }
    if let Some(w) = cli.image_width {
        builder = builder.image_width_inches(w);
    }
    if let Some(d) = cli.delay {
        builder = builder.capture_delay_ms(d);
    }
    if cli.pdf {
        builder = builder.export_pdf(true);
    }
    if let Some(ref s) = cli.soffice {
        builder = builder.pdf_converter(s);
    }

    let slots = slots_from_cli(&cli.region, &cli.window, cli.count);
    if !slots.is_empty() {
        builder = builder.slots(slots);
    }

    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

/// Regions first, then windows, then interactive graphs; numbered in that order.
fn slots_from_cli(regions: &[CaptureRect], windows: &[String], count: Option<u16>) -> Vec<GraphSlot> {
    let sources: Vec<CaptureSource> = regions
        .iter()
        .map(|r| CaptureSource::region(r.x, r.y, r.width, r.height))
        .chain(windows.iter().map(|t| CaptureSource::Window { title: t.clone() }))
        .chain((0..count.unwrap_or(0)).map(|_| CaptureSource::Interactive))
        .collect();

    let n = sources.len();
    sources
        .into_iter()
        .enumerate()
        .map(|(i, source)| {
            let label = if n == 1 {
                "Graph".to_string()
            } else {
                format!("Graph {}", i + 1)
            };
            GraphSlot::new(format!("[GRAPH_{}]", i + 1), label, source)
        })
        .collect()
}

fn make_capturer(screenshot: Option<&Path>) -> Result<Box<dyn ScreenCapturer>> {
    if let Some(path) = screenshot {
        anyhow::ensure!(path.exists(), "Screenshot {:?} does not exist", path);
        return Ok(Box::new(ImageFileCapturer::new(path)));
    }

    #[cfg(feature = "capture")]
    {
        Ok(Box::new(edgequake_graph2docx::XcapCapturer))
    }

    #[cfg(not(feature = "capture"))]
    {
        anyhow::bail!(
            "This build has no live screen capture.\n\
             Rebuild with `--features capture` or pass --screenshot <PNG>."
        )
    }
}

/// Parse `--region X,Y,WIDTH,HEIGHT`.
fn parse_region(s: &str) -> Result<CaptureRect, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, w, h] = parts.as_slice() else {
        return Err(format!("expected X,Y,WIDTH,HEIGHT, got '{s}'"));
    };
    let x: i32 = x.parse().map_err(|_| format!("invalid X '{x}'"))?;
    let y: i32 = y.parse().map_err(|_| format!("invalid Y '{y}'"))?;
    let w: u32 = w.parse().map_err(|_| format!("invalid WIDTH '{w}'"))?;
    let h: u32 = h.parse().map_err(|_| format!("invalid HEIGHT '{h}'"))?;
    if w == 0 || h == 0 {
        return Err("WIDTH and HEIGHT must be greater than zero".into());
    }
    Ok(CaptureRect::new(x, y, w, h))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn region_parsing() {
        assert_eq!(
            parse_region("100,100,600,400").unwrap(),
            CaptureRect::new(100, 100, 600, 400)
        );
        assert_eq!(
            parse_region(" -10, 5 ,20,30").unwrap(),
            CaptureRect::new(-10, 5, 20, 30)
        );
        assert!(parse_region("1,2,3").is_err());
        assert!(parse_region("1,2,0,4").is_err());
        assert!(parse_region("a,2,3,4").is_err());
    }

    #[test]
    fn slots_are_numbered_across_sources() {
        let slots = slots_from_cli(
            &[CaptureRect::new(0, 0, 10, 10)],
            &["Scope".to_string()],
            Some(1),
        );
        let markers: Vec<&str> = slots.iter().map(|s| s.marker.as_str()).collect();
        assert_eq!(markers, vec!["[GRAPH_1]", "[GRAPH_2]", "[GRAPH_3]"]);
        assert_eq!(slots[2].source, CaptureSource::Interactive);
        assert_eq!(slots[1].label, "Graph 2");
    }

    #[test]
    fn single_slot_label() {
        let slots = slots_from_cli(&[], &[], Some(1));
        assert_eq!(slots[0].label, "Graph");
        assert!(slots_from_cli(&[], &[], None).is_empty());
    }

    #[test]
    fn cli_parses_flags() {
        let cli = Cli::try_parse_from([
            "graph2docx",
            "--region",
            "1,2,3,4",
            "--region",
            "5,6,7,8",
            "-o",
            "week",
            "--pdf",
        ])
        .unwrap();
        assert_eq!(cli.region.len(), 2);
        assert!(cli.pdf);
        assert_eq!(cli.output.as_deref(), Some("week"));
    }
}
