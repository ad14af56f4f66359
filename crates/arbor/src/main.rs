//! arbor: inspect and exercise route tables.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use arbor_lib::{ResolveReport, RouteFile, RouteWatcher, SharedRouter};
use arbor_telemetry::{LogFormat, TelemetryConfig};

#[derive(Parser, Debug)]
#[command(name = "arbor", about = "Radix-tree HTTP router", version)]
struct Cli {
    /// Log level or filter directives (overridden by RUST_LOG).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    /// Log output format (json or pretty).
    #[arg(long, global = true, default_value = "pretty")]
    log_format: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load a route table and report conflicts or syntax errors.
    Check {
        /// Route table file (YAML, or JSON with a .json extension).
        #[arg(short, long)]
        routes: PathBuf,

        /// Print the routing trees after a successful check.
        #[arg(long)]
        tree: bool,
    },

    /// Resolve one request and print the outcome as JSON.
    Resolve {
        /// Route table file.
        #[arg(short, long)]
        routes: PathBuf,

        /// Request method.
        #[arg(short, long, default_value = "GET")]
        method: String,

        /// Request path; a query string is ignored.
        #[arg(short, long)]
        path: String,

        /// Host header value.
        #[arg(long)]
        host: Option<String>,
    },

    /// Serve lookups from stdin while hot-reloading the route table.
    ///
    /// Each input line is `METHOD PATH [HOST]`, `enable NAME` or
    /// `disable NAME`. Each lookup prints one JSON line.
    Watch {
        /// Route table file.
        #[arg(short, long)]
        routes: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let Some(log_format) = LogFormat::parse(&cli.log_format) else {
        eprintln!("error: unknown log format `{}` (expected json or pretty)", cli.log_format);
        return ExitCode::from(2);
    };
    let telemetry = TelemetryConfig::new()
        .with_log_level(cli.log_level.clone())
        .with_log_format(log_format);
    if let Err(e) = arbor_telemetry::init(&telemetry) {
        eprintln!("error: {}", e);
        return ExitCode::from(2);
    }

    let result = match &cli.command {
        Commands::Check { routes, tree } => run_check(routes, *tree),
        Commands::Resolve {
            routes,
            method,
            path,
            host,
        } => run_resolve(routes, method, path, host.as_deref()),
        Commands::Watch { routes } => run_watch(routes),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        }
    }
}

fn load(path: &Path) -> anyhow::Result<RouteFile> {
    RouteFile::load(path).with_context(|| format!("failed to load {}", path.display()))
}

fn run_check(path: &Path, print_tree: bool) -> anyhow::Result<()> {
    let file = load(path)?;
    let router = file.build_router()?;

    let disabled = file.routes.len() - file.enabled_count();
    println!(
        "{}: {} route(s), {} binding(s), {} disabled",
        path.display(),
        file.enabled_count(),
        router.len(),
        disabled
    );
    if print_tree {
        print!("{}", router);
    }
    Ok(())
}

fn run_resolve(path: &Path, method: &str, target: &str, host: Option<&str>) -> anyhow::Result<()> {
    let router = load(path)?.build_router()?;
    let report = ResolveReport::resolve(&router, method, host, target);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_watch(path: &Path) -> anyhow::Result<()> {
    let shared = Arc::new(SharedRouter::new(load(path)?)?);
    let _watcher = RouteWatcher::new(path, Arc::clone(&shared))
        .run()
        .context("failed to watch route file")?;

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line?;
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            [] => continue,
            [toggle @ ("enable" | "disable"), name] => {
                if let Err(e) = shared.set_enabled(name, *toggle == "enable") {
                    eprintln!("error: {}", e.detail());
                }
            }
            [method, target] | [method, target, _] => {
                let host = words.get(2).copied();
                let report = ResolveReport::resolve(&shared.snapshot(), method, host, target);
                writeln!(stdout, "{}", serde_json::to_string(&report)?)?;
                stdout.flush()?;
            }
            _ => bail!("cannot parse input line `{}`", line),
        }
    }
    Ok(())
}
