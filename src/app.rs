use std::sync::Arc;
use std::time::Duration;

use clap::{error::ErrorKind, CommandFactory, Parser};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::fs::OpenOptions;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::time::Instant;
use tracing_subscriber::EnvFilter;

use crate::autocomplete::{AutocompleteController, Event};
use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::index::cache::DEFAULT_CACHE_KEY;
use crate::index::{IndexOrigin, LoadReport};
use crate::output::{self, OutputFormat};
use crate::runner::{CacheMode, Options, Runner};
use crate::session::{self, TerminalNavigator};

const DEFAULT_INPUT_ID: &str = "globalSearch";

fn print_banner() {
    const BANNER: &str = r#"
             __                                      __
  ____ _____/ /__________  ________  ____ ___________/ /_
 / __ `/ ___/ __/ ___/ __ \/ ___/ _ \/ __ `/ ___/ ___/ __ \
/ /_/ (__  ) /_/ /  / /_/ (__  )  __/ /_/ / /  / /__/ / / /
\__,_/____/\__/_/   \____/____/\___/\__,_/_/   \___/_/ /_/
        catalogue name search
    "#;
    eprint!("{}", BANNER);
    eprintln!();
}

fn format_kv_line(label: &str, value: &str) {
    eprintln!(":: {:<10}: {}", label, value);
}

const HELP_TEMPLATE: &str = "\
{name} {version}
{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

const SESSION_HELP: &str = "\
Interactive session (--interactive):
  <text>        set the input value and list matching names
  :down :up     move the highlighted row (wraps)
  :enter        open the highlighted name
  :click N      open row N (0-based)
  :outside      close the list, keep the value
  :clear        empty the input
  ::<text>      type text starting with ':'
  :quit         leave";

fn render_custom_help() -> String {
    let mut cmd = CliArgs::command()
        .help_template(HELP_TEMPLATE)
        .after_long_help(SESSION_HELP);
    cmd.render_long_help().to_string()
}

fn origin_label(origin: IndexOrigin) -> &'static str {
    match origin {
        IndexOrigin::CacheHit => "cache",
        IndexOrigin::Fetched => "fetched",
        IndexOrigin::Refreshed => "refetched (stale or unverified cache)",
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Mode {
    Query(String),
    Select(String),
    Interactive,
    Dump,
}

#[derive(Clone, Debug)]
struct RunConfig {
    options: Options,
    mode: Mode,
    input_id: String,
    output: Option<String>,
    output_format: Option<OutputFormat>,
    no_color: bool,
    verbose: u8,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let url = args
        .url
        .or(cfg.url)
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| "a catalogue URL is required (--url or `url` in config)".to_string())?;
    let collection_path = args.collection.or(cfg.collection);

    let no_cache = args.no_cache || cfg.no_cache.unwrap_or(false);
    let cache = if no_cache {
        CacheMode::Memory
    } else {
        let dir = match args.cache_dir.or(cfg.cache_dir) {
            Some(dir) => config::expand_tilde_string(&dir),
            None => config::default_cache_dir()
                .map(|p| p.to_string_lossy().to_string())
                .ok_or_else(|| "could not determine cache directory, use --cache-dir".to_string())?,
        };
        CacheMode::Directory(dir)
    };
    let cache_key = args
        .cache_key
        .or(cfg.cache_key)
        .unwrap_or_else(|| DEFAULT_CACHE_KEY.to_string());

    let timeout_seconds = args.timeout.or(cfg.timeout).unwrap_or(10);
    if timeout_seconds == 0 {
        return Err("invalid timeout, expected positive integer".to_string());
    }
    let max_pages = args.max_pages.or(cfg.max_pages);
    if max_pages == Some(0) {
        return Err("invalid max-pages, expected positive integer".to_string());
    }
    let proxy = args.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty());
    let header = args.header.or(cfg.header).filter(|h| !h.trim().is_empty());

    let mode = if let Some(query) = args.query {
        Mode::Query(query)
    } else if let Some(name) = args.select {
        Mode::Select(name)
    } else if args.interactive {
        Mode::Interactive
    } else {
        Mode::Dump
    };

    let output = args.output.map(|p| config::expand_tilde_string(&p));
    let format_raw = args.format.or(cfg.output_format);
    let output_format = match format_raw.as_deref() {
        Some(raw) => Some(
            OutputFormat::parse(raw).ok_or_else(|| format!("invalid output format '{raw}'"))?,
        ),
        None => None,
    };

    Ok(RunConfig {
        options: Options {
            url,
            collection_path,
            cache,
            cache_key,
            timeout_seconds,
            proxy,
            header,
            refresh: args.refresh,
            max_pages,
        },
        mode,
        input_id: args
            .input_id
            .or(cfg.input_id)
            .unwrap_or_else(|| DEFAULT_INPUT_ID.to_string()),
        output,
        output_format,
        no_color: args.no_color || cfg.no_color.unwrap_or(false),
        verbose: args.verbose,
    })
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "astrosearch=warn",
        1 => "astrosearch=debug",
        _ => "astrosearch=trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_progress_bar() -> Result<ProgressBar, String> {
    let pb = ProgressBar::new(1);
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.enable_steady_tick(Duration::from_millis(200));
    pb.set_style(
        ProgressStyle::with_template(
            ":: Names: [{pos}/{len}] :: Duration: [{elapsed_precise}] :: {msg}",
        )
        .map_err(|e| format!("failed to build progress bar style: {e}"))?
        .progress_chars(r#"#>-"#),
    );
    Ok(pb)
}

fn resolve_format(run: &RunConfig) -> OutputFormat {
    run.output_format
        .or_else(|| run.output.as_deref().and_then(output::infer_format_from_path))
        .unwrap_or(OutputFormat::Text)
}

async fn write_output(path: &str, rendered: &[u8]) -> Result<(), String> {
    let mut outfile = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)
        .await
        .map_err(|e| format!("failed to open output file: {e}"))?;
    outfile
        .write_all(rendered)
        .await
        .map_err(|e| format!("failed to write output file: {e}"))
}

fn summarize_load(report: &LoadReport) {
    let remote = report
        .remote_count
        .map(|c| c.to_string())
        .unwrap_or_else(|| "?".to_string());
    format_kv_line(
        "Index",
        &format!(
            "names={} remote={} source={} pages={} complete={}",
            report.index.len(),
            remote,
            origin_label(report.origin),
            report.pages,
            report.complete
        ),
    );
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    print_banner();

    let now = Instant::now();
    let mut runner = Runner::new(run.options.clone()).map_err(|e| e.to_string())?;
    format_kv_line("Target", runner.collection().as_str());
    format_kv_line(
        "Cache",
        &match &run.options.cache {
            CacheMode::Memory => "memory".to_string(),
            CacheMode::Directory(dir) => format!("{} key={}", dir, run.options.cache_key),
        },
    );
    if run.mode != Mode::Interactive {
        runner = runner.with_progress(build_progress_bar()?);
    }

    let report = runner.load().await;
    summarize_load(&report);

    let site = runner.site();
    let index = Arc::new(report.index);
    let format = resolve_format(&run);
    let mut controller = AutocompleteController::attach(run.input_id.clone(), index.clone());
    let mut navigator = TerminalNavigator::new(site);

    match &run.mode {
        Mode::Query(query) => {
            controller.handle(Event::Input(query.clone()));
            let rows = controller.suggestions();
            if rows.is_empty() {
                format_kv_line("Matches", "none");
            }
            match run.output.as_deref() {
                Some(path) => {
                    let rendered =
                        output::render_suggestions(&rows, controller.render_html(), format);
                    write_output(path, &rendered).await?;
                }
                None if format == OutputFormat::Text => session::print_state(&controller),
                None => {
                    let rendered =
                        output::render_suggestions(&rows, controller.render_html(), format);
                    print!("{}", String::from_utf8_lossy(&rendered));
                }
            }
        }
        Mode::Select(name) => {
            controller.handle(Event::Input(name.clone()));
            let position = controller
                .state()
                .candidates
                .iter()
                .position(|candidate| candidate == name)
                .ok_or_else(|| format!("no entry named '{name}'"))?;
            controller.dispatch(Event::ClickCandidate(position), &mut navigator);
            if navigator.last.is_none() {
                return Err(format!("entry '{name}' has no target"));
            }
        }
        Mode::Interactive => {
            format_kv_line(
                "Session",
                "type to search, :down :up :enter :click N :outside :clear :quit",
            );
            let stdin = BufReader::new(tokio::io::stdin());
            let navigations =
                session::run_session(&mut controller, stdin, &mut navigator, true).await;
            format_kv_line("Session", &format!("navigations={navigations}"));
        }
        Mode::Dump => {
            let rendered = output::render_index(&index, format);
            match run.output.as_deref() {
                Some(path) => write_output(path, &rendered).await?,
                None => print!("{}", String::from_utf8_lossy(&rendered)),
            }
        }
    }

    eprintln!();
    eprintln!(":: Completed :: took {}ms ::", now.elapsed().as_millis());
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{}", render_custom_help());
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };
    init_logging(args.verbose);

    let cfg = match args.config.as_deref() {
        Some(path) => ConfigFile::load(&config::expand_tilde(path)),
        None => match config::default_config_path() {
            Some(path) => {
                match config::write_default_config(&path) {
                    Ok(true) => tracing::debug!(path = %path.display(), "wrote default config"),
                    Ok(false) => {}
                    Err(e) => tracing::debug!(error = %e, "default config not written"),
                }
                ConfigFile::load_or_default(&path)
            }
            None => Ok(ConfigFile::default()),
        },
    }
    .map_err(|e| e.to_string())?;

    let run = build_run_config(args, cfg)?;
    tracing::debug!(mode = ?run.mode, verbose = run.verbose, "starting");

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
