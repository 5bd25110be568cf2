use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use stagegraph::config::{DEFAULT_LINK_BACK, DEFAULT_TITLE};
use stagegraph::report::{self, Tally};
use stagegraph::serve::PreviewSource;
use stagegraph::{build_report_graph, ReportConfig, ReportKind, StatusClass, StatusRule, ValidationSummary};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(name = "stagegraph")]
#[command(author, version, about = "Render pipeline validation summaries as a stage graph report")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Summary JSON file, or a directory to search for summaries
    path: Option<PathBuf>,

    /// Output report file (.html, .json); single summary only
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// File name of summaries when PATH is a directory
    #[arg(long, default_value = "summary.json")]
    summary_name: String,

    /// Report layout and link naming: validation or legacy
    #[arg(long, default_value = "validation")]
    kind: ReportKind,

    /// Class every element as pass, as the legacy top page did
    #[arg(long)]
    legacy_status_rule: bool,

    /// Page title
    #[arg(long, default_value = DEFAULT_TITLE)]
    title: String,

    /// Trace name shown in the notes (default: the summary's directory name)
    #[arg(long)]
    trace_name: Option<String>,

    /// HTML file placed above the diagram
    #[arg(long)]
    note_top: Option<PathBuf>,

    /// HTML file placed below the diagram
    #[arg(long)]
    note_bottom: Option<PathBuf>,

    /// Text of the link back to the parent report
    #[arg(long, default_value = DEFAULT_LINK_BACK)]
    link_back: String,

    /// Open the report in a browser when done
    #[arg(long)]
    open: bool,

    /// Exit 2 if anything failed, 1 if anything was not measured, 3 if a
    /// summary could not be rendered
    #[arg(long)]
    exit_status: bool,

    /// Number of parallel workers (default: number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Show debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Only show errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Preview a report directory in the browser
    Serve {
        /// Report directory holding the summary and detail pages
        dir: PathBuf,

        /// Port to listen on
        #[arg(short, long, default_value = "3001")]
        port: u16,
    },
}

/// One summary to render and where to write it
#[derive(Debug)]
struct Job {
    summary: PathBuf,
    output: PathBuf,
}

struct Rendered {
    job: Job,
    outcome: stagegraph::Result<Tally>,
}

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let base_config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to read note file: {}", e);
            std::process::exit(1);
        }
    };

    // Handle subcommands first
    if let Some(Command::Serve { ref dir, port }) = args.command {
        let dir = dir.clone();
        let config = with_trace_name(base_config, args.trace_name.as_deref(), &dir.join(&args.summary_name));
        let source = PreviewSource {
            dir,
            summary_name: args.summary_name.clone(),
            config,
        };
        if let Err(e) = stagegraph::serve::start(port, source) {
            eprintln!("Server error: {}", e);
            std::process::exit(1);
        }
        return;
    }

    let path = if let Some(p) = args.path.clone() {
        p
    } else {
        eprintln!("Usage: stagegraph <PATH>");
        eprintln!("Run 'stagegraph --help' for more options.");
        std::process::exit(1);
    };

    // Set up thread pool
    if let Some(jobs) = args.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build_global()
            .ok();
    }

    let jobs = match collect_jobs(&path, &args.summary_name, args.output.as_deref()) {
        Ok(jobs) => jobs,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };
    if jobs.is_empty() {
        eprintln!("No summaries named '{}' found under {}", args.summary_name, path.display());
        std::process::exit(1);
    }

    if !args.quiet {
        eprintln!("\x1b[1mstagegraph - Pipeline Validation Graph\x1b[0m");
        eprintln!("{}", "─".repeat(70));
        eprintln!("Found {} summary file(s)\n", jobs.len());
    }

    // Set up progress bar
    let pb = if !args.quiet && jobs.len() > 1 {
        let pb = ProgressBar::new(jobs.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    // Render reports in parallel
    let rendered: Vec<Rendered> = jobs
        .into_par_iter()
        .map(|job| {
            let config = with_trace_name(base_config.clone(), args.trace_name.as_deref(), &job.summary);
            let outcome = render(&job, &config);
            if let Some(ref pb) = pb {
                pb.inc(1);
                pb.set_message(format!("{}", job.summary.display()));
            }
            Rendered { job, outcome }
        })
        .collect();

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    // Print results
    let mut overall = Tally::default();
    let mut error_count = 0;
    for r in &rendered {
        match r.outcome {
            Ok(tally) => {
                overall.pass += tally.pass;
                overall.failed += tally.failed;
                overall.not_measured += tally.not_measured;
                if !args.quiet {
                    let (color, label) = match tally.worst() {
                        Some(StatusClass::Failed) => ("\x1b[31m", "FAILED"),       // Red
                        Some(StatusClass::NotMeasured) => ("\x1b[33m", "PARTIAL"), // Yellow
                        Some(StatusClass::Pass) => ("\x1b[32m", "PASS"),           // Green
                        None => ("\x1b[90m", "EMPTY"),                            // Gray
                    };
                    println!(
                        "{}{:<10}\x1b[0m {:>4} pass {:>4} failed {:>4} not measured  {}",
                        color,
                        format!("[{}]", label),
                        tally.pass,
                        tally.failed,
                        tally.not_measured,
                        r.job.output.display()
                    );
                }
            }
            Err(ref e) => {
                error_count += 1;
                eprintln!("\x1b[90m[ERROR]\x1b[0m    {}: {}", r.job.summary.display(), e);
            }
        }
    }

    // Summary
    if !args.quiet {
        eprintln!("\n{}", "─".repeat(70));
        eprintln!("\x1b[1mSummary:\x1b[0m");
        eprintln!("  \x1b[32m✓ Pass:\x1b[0m         {}", overall.pass);
        eprintln!("  \x1b[31m✗ Failed:\x1b[0m       {}", overall.failed);
        eprintln!("  \x1b[33m? Not measured:\x1b[0m {}", overall.not_measured);
        if error_count > 0 {
            eprintln!("  \x1b[90mErrors:\x1b[0m         {}", error_count);
        }
    }

    // Open report
    if args.open {
        if let Some(first) = rendered.iter().find(|r| r.outcome.is_ok()) {
            if let Err(e) = open::that(&first.job.output) {
                eprintln!("Failed to open report: {}", e);
            }
        }
    }

    let code = exit_code(args.exit_status, error_count, overall.worst());
    if code != 0 {
        std::process::exit(code);
    }
}

/// Without `--exit-status` only render errors fail the run (1). With it,
/// render errors exit 3, failed 2, not measured 1.
fn exit_code(exit_status: bool, error_count: usize, worst: Option<StatusClass>) -> i32 {
    if !exit_status {
        return if error_count > 0 { 1 } else { 0 };
    }
    if error_count > 0 {
        return 3;
    }
    match worst {
        Some(StatusClass::Failed) => 2,
        Some(StatusClass::NotMeasured) => 1,
        _ => 0,
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_config(args: &Args) -> std::io::Result<ReportConfig> {
    let rule = if args.legacy_status_rule {
        StatusRule::LegacyAlwaysPass
    } else {
        StatusRule::Prioritized
    };
    ReportConfig::new(args.kind)
        .with_status_rule(rule)
        .with_title(args.title.clone())
        .with_link_back(args.link_back.clone())
        .with_note_files(args.note_top.as_deref(), args.note_bottom.as_deref())
}

/// Explicit trace name, else the name of the directory holding the summary
fn with_trace_name(config: ReportConfig, explicit: Option<&str>, summary: &Path) -> ReportConfig {
    let name = explicit.map(str::to_string).or_else(|| {
        summary
            .parent()
            .and_then(|dir| dir.file_name())
            .map(|name| name.to_string_lossy().into_owned())
    });
    match name {
        Some(name) => config.with_trace_name(name),
        None => config,
    }
}

/// Summaries to render. A directory is walked for files named
/// `summary_name`, each rendered to `index.html` beside it; `--output` only
/// applies to a single summary file.
fn collect_jobs(path: &Path, summary_name: &str, output: Option<&Path>) -> Result<Vec<Job>, String> {
    if path.is_dir() {
        if output.is_some() {
            return Err(format!(
                "--output needs a single summary file, but {} is a directory",
                path.display()
            ));
        }
        let mut jobs: Vec<Job> = WalkDir::new(path)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && e.file_name().to_str() == Some(summary_name))
            .map(|e| {
                let summary = e.path().to_path_buf();
                let output = summary.with_file_name("index.html");
                Job { summary, output }
            })
            .collect();
        jobs.sort_by(|a, b| a.summary.cmp(&b.summary));
        Ok(jobs)
    } else {
        let output = output
            .map(Path::to_path_buf)
            .unwrap_or_else(|| path.with_file_name("index.html"));
        Ok(vec![Job { summary: path.to_path_buf(), output }])
    }
}

fn render(job: &Job, config: &ReportConfig) -> stagegraph::Result<Tally> {
    debug!(summary = %job.summary.display(), "loading summary");
    let summary = ValidationSummary::load(&job.summary)?;
    let graph = build_report_graph(&summary, config)?;
    report::generate(&job.output, &graph, config)?;
    info!(output = %job.output.display(), "report written");
    Ok(Tally::from_graph(&graph))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY: &str = r#"{"summary_callback_dict_component_metrics": {
        "sensing": {"FREQUENCY": {"cnt_pass": 1, "cnt_failed": 0, "cnt_not_measured": 0}}
    }}"#;

    #[test]
    fn test_collect_jobs_walks_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("run_a/nightly");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join("summary.json"), SUMMARY).unwrap();
        std::fs::write(nested.join("summary.json"), SUMMARY).unwrap();
        std::fs::write(nested.join("other.json"), SUMMARY).unwrap();

        let jobs = collect_jobs(dir.path(), "summary.json", None).unwrap();
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].summary, dir.path().join("run_a/nightly/summary.json"));
        assert_eq!(jobs[0].output, dir.path().join("run_a/nightly/index.html"));
        assert_eq!(jobs[1].summary, dir.path().join("summary.json"));
        assert_eq!(jobs[1].output, dir.path().join("index.html"));
    }

    #[test]
    fn test_collect_jobs_custom_summary_name() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("summary.json"), SUMMARY).unwrap();
        std::fs::write(dir.path().join("result.json"), SUMMARY).unwrap();

        let jobs = collect_jobs(dir.path(), "result.json", None).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].summary, dir.path().join("result.json"));
    }

    #[test]
    fn test_collect_jobs_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let summary = dir.path().join("summary.json");
        std::fs::write(&summary, SUMMARY).unwrap();

        let jobs = collect_jobs(&summary, "summary.json", None).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].output, dir.path().join("index.html"));

        let explicit = dir.path().join("out/graph.json");
        let jobs = collect_jobs(&summary, "summary.json", Some(explicit.as_path())).unwrap();
        assert_eq!(jobs[0].output, explicit);
    }

    #[test]
    fn test_output_rejected_for_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("summary.json"), SUMMARY).unwrap();

        let out = dir.path().join("report.html");
        let err = collect_jobs(dir.path(), "summary.json", Some(out.as_path())).unwrap_err();
        assert!(err.contains("--output"));
    }

    #[test]
    fn test_trace_name_falls_back_to_directory() {
        let summary = Path::new("/reports/drive_20230415123045/summary.json");
        let config = with_trace_name(ReportConfig::default(), None, summary);
        assert_eq!(config.trace_name.as_deref(), Some("drive_20230415123045"));

        let config = with_trace_name(ReportConfig::default(), Some("manual"), summary);
        assert_eq!(config.trace_name.as_deref(), Some("manual"));

        let config = with_trace_name(ReportConfig::default(), None, Path::new("summary.json"));
        assert!(config.trace_name.is_none());
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(false, 0, Some(StatusClass::Failed)), 0);
        assert_eq!(exit_code(false, 1, Some(StatusClass::Pass)), 1);

        assert_eq!(exit_code(true, 0, Some(StatusClass::Failed)), 2);
        assert_eq!(exit_code(true, 0, Some(StatusClass::NotMeasured)), 1);
        assert_eq!(exit_code(true, 0, Some(StatusClass::Pass)), 0);
        assert_eq!(exit_code(true, 0, None), 0);
        assert_eq!(exit_code(true, 2, Some(StatusClass::NotMeasured)), 3);
    }

    #[test]
    fn test_render_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let summary = dir.path().join("summary.json");
        std::fs::write(&summary, SUMMARY).unwrap();
        let job = collect_jobs(&summary, "summary.json", None).unwrap().remove(0);

        let tally = render(&job, &ReportConfig::default()).unwrap();
        assert_eq!(tally.pass, 1);
        assert!(dir.path().join("index.html").is_file());
    }
}
