pub mod calc;
pub mod class_table;
pub mod columns;
pub mod config;
pub mod container;
pub mod escape;
pub mod generator;
pub mod grid;
pub mod nesting;
pub mod overlay;
pub mod resolve;
pub mod root_vars;
pub mod rules;
pub mod scanner;
pub mod scrollbar;
pub mod vars;

use globset::GlobSet;
use std::collections::BTreeSet;
use std::env;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{RecvTimeoutError, Sender, channel};
use std::time::{Duration, Instant};

use crate::config::{Config, ConfigError};
use crate::escape::CssEscaper;
use crate::generator::{GeneratorConfig, render_rule};
use crate::resolve::ResolveError;
use crate::scanner::{ScanError, build_globset, glob_root};
use crate::scrollbar::Throttle;
use crate::vars::VarRegistry;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Scan {
        inputs: Vec<String>,
        ignore: Vec<String>,
    },
    Build {
        inputs: Vec<String>,
        out: Option<String>,
        minify: bool,
        config: Option<String>,
        ignore: Vec<String>,
    },
    Watch {
        inputs: Vec<String>,
        out: Option<String>,
        minify: bool,
        config: Option<String>,
        ignore: Vec<String>,
        poll: bool,
        poll_interval_ms: u64,
    },
    Inspect {
        class: String,
        breakpoint: Option<String>,
        config: Option<String>,
    },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliError {
    pub message: String,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError {
            message: err.to_string(),
        }
    }
}

impl From<ScanError> for CliError {
    fn from(err: ScanError) -> Self {
        CliError {
            message: err.to_string(),
        }
    }
}

impl From<ResolveError> for CliError {
    fn from(err: ResolveError) -> Self {
        CliError {
            message: err.to_string(),
        }
    }
}

pub fn run(command: Command) -> Result<(), CliError> {
    match command {
        Command::Scan { inputs, ignore } => run_scan(inputs, ignore),
        Command::Build {
            inputs,
            out,
            minify,
            config,
            ignore,
        } => run_build(&BuildOptions {
            inputs,
            out,
            minify,
            config,
            ignore,
        }),
        Command::Watch {
            inputs,
            out,
            minify,
            config,
            ignore,
            poll,
            poll_interval_ms,
        } => run_watch(
            BuildOptions {
                inputs,
                out,
                minify,
                config,
                ignore,
            },
            poll,
            poll_interval_ms,
        ),
        Command::Inspect {
            class,
            breakpoint,
            config,
        } => run_inspect(&class, breakpoint.as_deref(), config.as_deref()),
        Command::Help => {
            print_help();
            Ok(())
        }
    }
}

pub fn run_from_env() -> Result<(), CliError> {
    let command = parse_args(env::args().skip(1))?;
    run(command)
}

pub fn parse_args<I>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut iter = args.into_iter();
    let Some(cmd) = iter.next() else {
        return Ok(Command::Help);
    };

    match cmd.as_str() {
        "scan" => parse_scan_args(iter.collect()),
        "build" => parse_build_args(iter.collect()),
        "watch" => parse_watch_args(iter.collect()),
        "inspect" => parse_inspect_args(iter.collect()),
        "-h" | "--help" | "help" => Ok(Command::Help),
        _ => Err(CliError {
            message: format!("unknown command: {}", cmd),
        }),
    }
}

fn take_value(args: &[String], idx: &mut usize, cmd: &str, flag: &str) -> Result<String, CliError> {
    *idx += 1;
    args.get(*idx).cloned().ok_or_else(|| CliError {
        message: format!("{} requires a value for {}", cmd, flag),
    })
}

fn parse_build_args(args: Vec<String>) -> Result<Command, CliError> {
    let mut inputs = Vec::new();
    let mut out = None;
    let mut minify = false;
    let mut config = None;
    let mut ignore = Vec::new();
    let mut idx = 0;

    while idx < args.len() {
        match args[idx].as_str() {
            "--out" | "--output" | "-o" => {
                out = Some(take_value(&args, &mut idx, "build", "--output")?);
            }
            "--config" | "-c" => {
                config = Some(take_value(&args, &mut idx, "build", "--config")?);
            }
            "--ignore" | "-I" => {
                ignore.push(take_value(&args, &mut idx, "build", "--ignore")?);
            }
            "--minify" => {
                minify = true;
            }
            "--poll" | "--poll-interval" => {
                return Err(CliError {
                    message: format!("{} is only supported with watch", args[idx]),
                });
            }
            value => {
                inputs.push(value.to_string());
            }
        }
        idx += 1;
    }

    Ok(Command::Build {
        inputs,
        out,
        minify,
        config,
        ignore,
    })
}

fn parse_scan_args(args: Vec<String>) -> Result<Command, CliError> {
    let mut inputs = Vec::new();
    let mut ignore = Vec::new();
    let mut idx = 0;

    while idx < args.len() {
        match args[idx].as_str() {
            "--ignore" | "-i" | "-I" => {
                ignore.push(take_value(&args, &mut idx, "scan", "--ignore")?);
            }
            value => {
                inputs.push(value.to_string());
            }
        }
        idx += 1;
    }

    if inputs.is_empty() {
        return Err(CliError {
            message: "scan requires at least one path or glob pattern".to_string(),
        });
    }

    Ok(Command::Scan { inputs, ignore })
}

fn parse_watch_args(args: Vec<String>) -> Result<Command, CliError> {
    let mut inputs = Vec::new();
    let mut out = None;
    let mut minify = false;
    let mut config = None;
    let mut ignore = Vec::new();
    let mut poll = false;
    let mut poll_interval_ms = 500;
    let mut idx = 0;

    while idx < args.len() {
        match args[idx].as_str() {
            "--out" | "--output" | "-o" => {
                out = Some(take_value(&args, &mut idx, "watch", "--output")?);
            }
            "--config" | "-c" => {
                config = Some(take_value(&args, &mut idx, "watch", "--config")?);
            }
            "--ignore" | "-I" => {
                ignore.push(take_value(&args, &mut idx, "watch", "--ignore")?);
            }
            "--minify" => {
                minify = true;
            }
            "--poll" => {
                poll = true;
            }
            "--poll-interval" => {
                let value = take_value(&args, &mut idx, "watch", "--poll-interval")?;
                poll = true;
                poll_interval_ms = parse_u64_arg(&value, "--poll-interval")?;
            }
            value => {
                inputs.push(value.to_string());
            }
        }
        idx += 1;
    }

    if inputs.is_empty() && config.is_none() {
        return Err(CliError {
            message: "watch requires a path, glob pattern or --config to watch".to_string(),
        });
    }

    Ok(Command::Watch {
        inputs,
        out,
        minify,
        config,
        ignore,
        poll,
        poll_interval_ms,
    })
}

fn parse_inspect_args(args: Vec<String>) -> Result<Command, CliError> {
    let mut class = None;
    let mut breakpoint = None;
    let mut config = None;
    let mut idx = 0;

    while idx < args.len() {
        match args[idx].as_str() {
            "--breakpoint" | "-b" => {
                breakpoint = Some(take_value(&args, &mut idx, "inspect", "--breakpoint")?);
            }
            "--config" | "-c" => {
                config = Some(take_value(&args, &mut idx, "inspect", "--config")?);
            }
            value => {
                if class.is_some() {
                    return Err(CliError {
                        message: format!("inspect takes a single class, got extra '{}'", value),
                    });
                }
                class = Some(value.trim_start_matches('.').to_string());
            }
        }
        idx += 1;
    }

    let Some(class) = class.filter(|class| !class.is_empty()) else {
        return Err(CliError {
            message: "inspect requires a class name".to_string(),
        });
    };

    Ok(Command::Inspect {
        class,
        breakpoint,
        config,
    })
}

fn run_scan(inputs: Vec<String>, ignore: Vec<String>) -> Result<(), CliError> {
    let mut result = crate::scanner::scan_globs_with_ignore(&inputs, &ignore)?;

    result.classes.sort();
    result.classes.dedup();

    for class in &result.classes {
        println!("{}", class);
    }

    log::info!(
        "scanned {} files, found {} layout classes",
        result.files_scanned,
        result.classes.len()
    );

    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct BuildOptions {
    inputs: Vec<String>,
    out: Option<String>,
    minify: bool,
    config: Option<String>,
    ignore: Vec<String>,
}

fn load_config(path: Option<&str>) -> Result<Config, CliError> {
    match path {
        Some(path) => Ok(crate::config::load(Path::new(path))?),
        None => {
            log::debug!("no --config given, using built-in breakpoints");
            Ok(Config::default())
        }
    }
}

/// Generates the stylesheet for `options` without writing it.
fn build_css(options: &BuildOptions) -> Result<(String, usize), CliError> {
    let config = load_config(options.config.as_deref())?;
    let vars = VarRegistry::with_prefix(&config.prefix);

    let candidates = if options.inputs.is_empty() {
        None
    } else {
        let result = crate::scanner::scan_globs_with_ignore(&options.inputs, &options.ignore)?;
        log::debug!(
            "scanned {} files, found {} layout classes",
            result.files_scanned,
            result.classes.len()
        );
        Some(result.classes.into_iter().collect::<BTreeSet<_>>())
    };

    let generator = GeneratorConfig {
        minify: options.minify,
        candidates,
    };
    let result = crate::generator::build(&config, &vars, &CssEscaper, &generator);
    Ok((result.css.into(), result.rule_count))
}

fn run_build(options: &BuildOptions) -> Result<(), CliError> {
    let started = Instant::now();
    let (css, rule_count) = build_css(options)?;

    match options.out.as_deref() {
        Some(out) => {
            let path = Path::new(out);
            if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|err| CliError {
                    message: format!("failed to create {}: {}", parent.display(), err),
                })?;
            }
            fs::write(path, &css).map_err(|err| CliError {
                message: format!("failed to write {}: {}", path.display(), err),
            })?;
            log::info!(
                "wrote {} rules to {} in {:?}",
                rule_count,
                path.display(),
                started.elapsed()
            );
        }
        None => {
            println!("{}", css);
            log::info!("generated {} rules in {:?}", rule_count, started.elapsed());
        }
    }

    Ok(())
}

fn run_inspect(class: &str, breakpoint: Option<&str>, config: Option<&str>) -> Result<(), CliError> {
    let (config_name, output) = inspect_class(class, breakpoint, load_config(config)?)?;
    if output.is_empty() {
        return Err(CliError {
            message: format!("no rule mentions .{}", class),
        });
    }
    log::info!("resolved at breakpoint `{}`", config_name);
    println!("{}", output);
    Ok(())
}

/// Resolved rules for `class` rendered as CSS, plus the breakpoint they were
/// resolved at. The first configured tier is the unscoped one.
fn inspect_class(
    class: &str,
    breakpoint: Option<&str>,
    config: Config,
) -> Result<(String, String), CliError> {
    let first_tier = config
        .breakpoints()
        .first()
        .map(|tier| tier.name.clone())
        .unwrap_or_else(|| crate::config::DEFAULT_BREAKPOINT.to_string());
    let scoped = breakpoint.filter(|name| *name != first_tier);

    let vars = VarRegistry::with_prefix(&config.prefix);
    let styles = crate::generator::generate(&config, &vars, &CssEscaper);
    let rules = crate::resolve::inspect(&styles, class, scoped)?;

    let output = rules
        .iter()
        .filter_map(|rule| render_rule(rule, false))
        .collect::<Vec<_>>()
        .join("\n");
    Ok((scoped.unwrap_or(&first_tier).to_string(), output))
}

fn print_help() {
    println!("gridframe");
    println!();
    println!("USAGE:");
    println!("  gridframe scan [--ignore <glob>] <glob...>");
    println!(
        "  gridframe build [--output <path>] [--minify] [--config <path>] [--ignore <glob>] [glob...]"
    );
    println!(
        "  gridframe watch [--output <path>] [--minify] [--config <path>] [--ignore <glob>] [--poll] [--poll-interval <ms>] [glob...]"
    );
    println!("  gridframe inspect [--breakpoint <name>] [--config <path>] <class>");
    println!();
    println!("Without globs, build emits every layout utility.");
    println!();
    println!("EXAMPLES:");
    println!("  gridframe scan \"src/**/*.{{html,tsx}}\"");
    println!("  gridframe build --output dist/grid.css");
    println!("  gridframe build -c gridframe.toml -o dist/grid.css \"src/**/*.{{html,tsx}}\"");
    println!("  gridframe build -I \"**/generated/**\" --minify \"src/**/*.{{html,tsx}}\"");
    println!("  gridframe watch -c gridframe.toml --output dist/grid.css \"src/**/*.{{html,tsx}}\"");
    println!("  gridframe watch --poll --poll-interval 250 \"src/**/*.{{html,tsx}}\"");
    println!("  gridframe inspect --breakpoint md w-2-cols");
}

/// Minimum gap between rebuilds. Changes inside the gap fold into one
/// trailing rebuild.
const REBUILD_INTERVAL: Duration = Duration::from_millis(200);

fn run_watch(options: BuildOptions, poll: bool, poll_interval_ms: u64) -> Result<(), CliError> {
    run_build(&options)?;

    let (tx, rx) = channel();
    let poll_interval = poll.then(|| Duration::from_millis(poll_interval_ms));
    let mut watcher = start_watcher(tx, poll_interval)?;
    let roots = watch_roots_for_build(&options.inputs, options.config.as_deref());
    for root in &roots {
        watcher
            .watch(root, notify::RecursiveMode::Recursive)
            .map_err(|err| CliError {
                message: format!("failed to watch {}: {}", root.display(), err),
            })?;
    }
    log::info!(
        "watching {} for layout changes{} (press Ctrl+C to stop)",
        roots
            .iter()
            .map(|root| root.display().to_string())
            .collect::<Vec<_>>()
            .join(", "),
        poll_interval
            .map(|interval| format!(", polling every {:?}", interval))
            .unwrap_or_default()
    );

    let ignore_set = build_globset(&options.ignore).ok();
    let out_path = options.out.as_deref().map(PathBuf::from);
    let mut throttle = Throttle::new(REBUILD_INTERVAL);
    loop {
        let wait = throttle
            .deadline()
            .map_or(REBUILD_INTERVAL, |deadline| deadline.saturating_duration_since(Instant::now()));
        let due = match rx.recv_timeout(wait) {
            Ok(Ok(event)) => {
                !should_ignore_event(&event, ignore_set.as_ref(), out_path.as_deref())
                    && throttle.ready(Instant::now())
            }
            Ok(Err(err)) => {
                log::warn!("watch error: {}", err);
                false
            }
            Err(RecvTimeoutError::Timeout) => throttle.flush(Instant::now()),
            Err(RecvTimeoutError::Disconnected) => break,
        };
        if due {
            log::info!("layout inputs changed, regenerating");
            if let Err(err) = run_build(&options) {
                log::error!("build failed: {}", err);
            }
        }
    }

    Ok(())
}

fn start_watcher(
    tx: Sender<notify::Result<notify::Event>>,
    poll_interval: Option<Duration>,
) -> Result<Box<dyn notify::Watcher>, CliError> {
    let watcher: Box<dyn notify::Watcher> = match poll_interval {
        Some(interval) => Box::new(
            notify::PollWatcher::new(tx, notify::Config::default().with_poll_interval(interval))
                .map_err(|err| CliError {
                    message: format!("failed to start poll watcher: {}", err),
                })?,
        ),
        None => Box::new(notify::recommended_watcher(tx).map_err(|err| CliError {
            message: format!("failed to start watcher: {}", err),
        })?),
    };
    Ok(watcher)
}

/// Directories to watch: the literal root of every content glob plus the
/// config file's directory, deduplicated. Never empty.
fn watch_roots_for_build(patterns: &[String], config: Option<&str>) -> Vec<PathBuf> {
    let mut roots = Vec::new();
    for pattern in patterns.iter().map(String::as_str).chain(config) {
        let root = glob_root(pattern);
        let root = if root.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            root
        };
        if !roots.contains(&root) {
            roots.push(root);
        }
    }
    if roots.is_empty() {
        roots.push(PathBuf::from("."));
    }
    roots
}

fn parse_u64_arg(value: &str, flag: &str) -> Result<u64, CliError> {
    value.parse::<u64>().map_err(|_| CliError {
        message: format!("{} requires a positive integer, got '{}'", flag, value),
    })
}

/// True when every path in `event` is ignored or is the stylesheet we write.
fn should_ignore_event(event: &notify::Event, ignore_set: Option<&GlobSet>, out: Option<&Path>) -> bool {
    if event.paths.is_empty() {
        return false;
    }
    event.paths.iter().all(|path| {
        ignore_set.is_some_and(|set| set.is_match(path))
            || out.is_some_and(|out| path.ends_with(out))
    })
}
