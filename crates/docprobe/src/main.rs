use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docprobe_core::{ProbeConfig, Strategy};
use docprobe_local::{
    analyze_structure, analyze_uniqueness, ContentNormalizer, IdMutationEngine, ProbeRunner,
};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "docprobe")]
#[command(
    about = "Probe neighbouring document ids and deduplicate hits by normalized content",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args, Debug)]
struct GlobalArgs {
    /// JSON probe config (url_templates, known_ids, timeout_ms, max_bytes, preview_chars, user_agent).
    #[arg(long, global = true, env = "DOCPROBE_CONFIG")]
    config: Option<PathBuf>,
    /// Per-request timeout (ms); overrides the config file.
    #[arg(long, global = true, env = "DOCPROBE_TIMEOUT_MS")]
    timeout_ms: Option<u64>,
    /// Seconds to wait between consecutive probes.
    #[arg(long, global = true, env = "DOCPROBE_DELAY", default_value_t = 1.0)]
    delay: f64,
    /// URL template with a `{}` id placeholder; repeat to try several in order.
    ///
    /// Replaces the configured templates when given.
    #[arg(long = "url-template", global = true, env = "DOCPROBE_URL_TEMPLATE")]
    url_templates: Vec<String>,
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    #[arg(long, global = true, env = "DOCPROBE_LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Structural features of one id (json).
    Analyze {
        id: String,
    },
    /// Candidate ids derived from a seed (json; no network).
    Mutate {
        seed: String,
        /// Strategy name; repeatable. Unknown names are ignored.
        #[arg(long = "strategy")]
        strategies: Vec<String>,
    },
    /// Normalize a document and print its content fingerprint (json).
    Fingerprint {
        /// Read the document from this file instead of stdin.
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Probe ids sequentially across the URL templates (json).
    Probe {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// List the configured known-good ids (json).
    Known,
    /// Probe every known id and report content uniqueness (json).
    ProbeKnown,
    /// Probe ids and group the accessible ones by fingerprint (json).
    Uniqueness {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Mutate a seed, probe the first candidates and summarize (json).
    Sweep {
        seed: String,
        /// Strategy name; repeatable. Unknown names are ignored.
        #[arg(long = "strategy")]
        strategies: Vec<String>,
        #[arg(long, default_value_t = 10)]
        max_increments: usize,
    },
    /// Print version info.
    Version {
        /// Output format: json|text
        #[arg(long = "output", alias = "format", default_value = "json")]
        output: String,
    },
}

fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file (or defaults) with command-line overrides applied, then validated.
fn probe_config(global: &GlobalArgs) -> Result<ProbeConfig> {
    let mut cfg = match &global.config {
        Some(p) => {
            let raw = std::fs::read_to_string(p)
                .with_context(|| format!("read config {}", p.display()))?;
            ProbeConfig::from_json(&raw).with_context(|| format!("parse config {}", p.display()))?
        }
        None => ProbeConfig::default(),
    };
    if let Some(ms) = global.timeout_ms {
        cfg.timeout_ms = ms;
    }
    if !global.url_templates.is_empty() {
        cfg.url_templates = global.url_templates.clone();
    }
    cfg.validate().context("invalid probe config")?;
    tracing::debug!(
        templates = cfg.url_templates.len(),
        timeout_ms = cfg.timeout_ms,
        "probe config resolved"
    );
    Ok(cfg)
}

fn strategies_or(names: &[String], default: &[Strategy]) -> Vec<Strategy> {
    if names.is_empty() {
        default.to_vec()
    } else {
        Strategy::parse_lenient(names)
    }
}

fn read_document(file: Option<&Path>) -> Result<String> {
    match file {
        Some(p) => std::fs::read_to_string(p).with_context(|| format!("read {}", p.display())),
        None => std::io::read_to_string(std::io::stdin()).context("read stdin"),
    }
}

/// Wraps a command payload with the `schema_version`/`kind` header every output carries.
fn envelope(kind: &str, body: serde_json::Value) -> serde_json::Value {
    let mut v = serde_json::json!({ "schema_version": 1, "kind": kind });
    if let (Some(obj), serde_json::Value::Object(extra)) = (v.as_object_mut(), body) {
        obj.extend(extra);
    }
    v
}

fn emit(kind: &str, body: serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&envelope(kind, body))?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.global.log_level);

    match cli.command {
        Commands::Analyze { id } => {
            let report = analyze_structure(&id);
            emit(
                "docprobe_analyze",
                serde_json::json!({ "id": id, "report": report }),
            )?;
        }
        Commands::Mutate { seed, strategies } => {
            let strategies = strategies_or(&strategies, &Strategy::DEFAULT_GENERATE);
            let candidates = IdMutationEngine::default().mutate(&seed, &strategies);
            emit(
                "docprobe_mutate",
                serde_json::json!({
                    "seed": seed,
                    "strategies": strategies,
                    "count": candidates.len(),
                    "candidates": candidates,
                }),
            )?;
        }
        Commands::Fingerprint { file } => {
            let raw = read_document(file.as_deref())?;
            let normalizer = ContentNormalizer::default();
            let canonical = normalizer.canonicalize(&raw);
            let fingerprint = normalizer.fingerprint(&raw);
            emit(
                "docprobe_fingerprint",
                serde_json::json!({
                    "engine": canonical.engine,
                    "canonical_chars": canonical.text.chars().count(),
                    "fingerprint": fingerprint,
                }),
            )?;
        }
        Commands::Probe { ids } => {
            let runner = ProbeRunner::local(probe_config(&cli.global)?)?;
            let results = runner.probe_batch(ids.as_slice(), cli.global.delay).await;
            emit("docprobe_probe", serde_json::json!({ "results": results }))?;
        }
        Commands::Known => {
            let cfg = probe_config(&cli.global)?;
            emit(
                "docprobe_known",
                serde_json::json!({
                    "count": cfg.known_ids.len(),
                    "known_ids": cfg.known_ids,
                }),
            )?;
        }
        Commands::ProbeKnown => {
            let runner = ProbeRunner::local(probe_config(&cli.global)?)?;
            let results = runner.probe_known(cli.global.delay).await;
            let uniqueness = analyze_uniqueness(&results);
            emit(
                "docprobe_probe_known",
                serde_json::json!({ "uniqueness": uniqueness, "results": results }),
            )?;
        }
        Commands::Uniqueness { ids } => {
            let runner = ProbeRunner::local(probe_config(&cli.global)?)?;
            let results = runner.probe_batch(ids.as_slice(), cli.global.delay).await;
            let uniqueness = analyze_uniqueness(&results);
            emit(
                "docprobe_uniqueness",
                serde_json::json!({ "uniqueness": uniqueness, "results": results }),
            )?;
        }
        Commands::Sweep {
            seed,
            strategies,
            max_increments,
        } => {
            let strategies = strategies_or(&strategies, &Strategy::DEFAULT_SWEEP);
            let runner = ProbeRunner::local(probe_config(&cli.global)?)?;
            let report = runner
                .sweep(&seed, &strategies, max_increments, cli.global.delay)
                .await;
            emit("docprobe_sweep", serde_json::json!({ "report": report }))?;
        }
        Commands::Version { output } => {
            let v = envelope(
                "version",
                serde_json::json!({
                    "ok": true,
                    "name": "docprobe",
                    "version": env!("CARGO_PKG_VERSION"),
                }),
            );
            match output.to_ascii_lowercase().as_str() {
                "text" => println!("docprobe {}", env!("CARGO_PKG_VERSION")),
                _ => println!("{}", v),
            }
        }
    }

    Ok(())
}
