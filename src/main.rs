//! Factgraph CLI - compute catalog metrics from fact graphs

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tokio_util::sync::CancellationToken;

use factgraph::ast::{Component, MetricSource};
use factgraph::binding::ComponentBinding;
use factgraph::config::{mask_secret, FactConfig, TokenSource};
use factgraph::dag::FactGraph;
use factgraph::error::{FactError, FixSuggestion};
use factgraph::runtime::{Processor, Run};
use factgraph::source::Sources;

#[derive(Parser)]
#[command(name = "factgraph")]
#[command(about = "Factgraph - compute catalog metrics from fact graphs")]
#[command(version)]
struct Cli {
    /// Config file (default: <config dir>/factgraph/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute metric values for a component
    Compute {
        /// Path to the component YAML file
        file: PathBuf,

        /// Metric to compute
        #[arg(short, long, conflicts_with = "all")]
        metric: Option<String>,

        /// Compute every metric source, continuing past failures
        #[arg(long)]
        all: bool,

        /// Use empty in-memory sources instead of the network
        #[arg(long)]
        dry_run: bool,

        /// Print every fact's result
        #[arg(long)]
        show_facts: bool,
    },

    /// Check fact graphs (duplicates, cycles, single sink) without fetching
    Check {
        /// Path to the component YAML file
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Compute {
            file,
            metric,
            all,
            dry_run,
            show_facts,
        } => {
            let options = ComputeOptions {
                metric,
                all,
                dry_run,
                show_facts,
            };
            compute(&file, cli.config.as_deref(), options).await
        }
        Commands::Check { file } => check(&file).await,
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.downcast_ref::<FactError>().and_then(|fe| fe.fix_suggestion()) {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

struct ComputeOptions {
    metric: Option<String>,
    all: bool,
    dry_run: bool,
    show_facts: bool,
}

async fn compute(
    file: &Path,
    config_path: Option<&Path>,
    options: ComputeOptions,
) -> anyhow::Result<()> {
    let component = load_component(file).await?;
    let selected = select_metrics(&component, options.metric.as_deref(), options.all)?;

    let (sources, tokens): (Sources, Arc<dyn TokenSource>) = if options.dry_run {
        println!("{} Dry run: sources are empty", "→".cyan());
        (Sources::empty(), Arc::new(HashMap::<String, String>::new()))
    } else {
        let config = match config_path {
            Some(path) => FactConfig::load_from(path)?,
            None => FactConfig::load()?,
        }
        .with_env();
        println!(
            "{} GitHub org: {} | token: {}",
            "→".cyan(),
            config.github_org().cyan().bold(),
            config
                .github
                .token
                .as_deref()
                .map(|t| mask_secret(t, 4))
                .unwrap_or_else(|| "(none)".to_string())
        );
        (Sources::from_config(&config)?, Arc::new(config))
    };

    let binding = ComponentBinding::new(&component)?;
    let processor = Processor::from_sources(sources, tokens);

    let mut failed = 0usize;
    for (name, source) in &selected {
        let facts = binding.bind_facts(&source.facts);
        match processor.run(CancellationToken::new(), facts).await {
            Ok(run) => {
                println!("{} = {}", name.cyan().bold(), run.value);
                if options.show_facts {
                    print_outcomes(&run);
                }
            }
            Err(e) if options.all => {
                failed += 1;
                let stage = if e.is_graph_error() {
                    "graph rejected, nothing fetched"
                } else {
                    "run failed"
                };
                eprintln!("{} {} ({}): {}", "✗".red(), name, stage, e);
                if let Some(suggestion) = e.fix_suggestion() {
                    eprintln!("  {} {}", "Fix:".yellow(), suggestion);
                }
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Metric '{}' failed", name));
            }
        }
    }

    if failed > 0 {
        println!(
            "{} {} of {} metrics failed",
            "!".yellow(),
            failed,
            selected.len()
        );
    }

    Ok(())
}

async fn check(file: &Path) -> anyhow::Result<()> {
    let component = load_component(file).await?;
    let sources = &component.spec.metric_sources;

    if sources.is_empty() {
        println!(
            "{} Component '{}' has no metric sources",
            "!".yellow(),
            component.metadata.name
        );
        return Ok(());
    }

    let mut failed = 0usize;
    for (name, source) in sources {
        let checked = FactGraph::from_facts(&source.facts).and_then(|graph| graph.validate());
        match checked {
            Ok(sink) => println!(
                "{} {} ({} facts, sink: {})",
                "✓".green(),
                name,
                source.facts.len(),
                sink.as_deref().unwrap_or("-")
            ),
            Err(e) => {
                failed += 1;
                println!("{} {}: {}", "✗".red(), name, e);
                if let Some(suggestion) = e.fix_suggestion() {
                    println!("  {} {}", "Fix:".yellow(), suggestion);
                }
            }
        }
    }

    if failed > 0 {
        bail!("{} of {} metric sources failed checks", failed, sources.len());
    }
    Ok(())
}

async fn load_component(file: &Path) -> anyhow::Result<Component> {
    let yaml = tokio::fs::read_to_string(file)
        .await
        .map_err(FactError::from)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let component: Component = serde_yaml::from_str(&yaml)
        .map_err(FactError::from)
        .with_context(|| format!("Failed to parse {}", file.display()))?;
    Ok(component)
}

/// Metric sources to compute, in metric-name order
fn select_metrics<'a>(
    component: &'a Component,
    metric: Option<&str>,
    all: bool,
) -> anyhow::Result<Vec<(&'a str, &'a MetricSource)>> {
    if let Some(metric) = metric {
        let (name, source) = component
            .spec
            .metric_sources
            .get_key_value(metric)
            .ok_or_else(|| FactError::UnknownMetric {
                metric: metric.to_string(),
                component: component.metadata.name.clone(),
            })?;
        return Ok(vec![(name.as_str(), source)]);
    }

    let available: Vec<(&str, &MetricSource)> = component
        .spec
        .metric_sources
        .iter()
        .map(|(name, source)| (name.as_str(), source))
        .collect();

    if !all {
        let names: Vec<&str> = available.iter().map(|(name, _)| *name).collect();
        bail!(
            "Pass --metric NAME or --all (available: {})",
            if names.is_empty() {
                "none".to_string()
            } else {
                names.join(", ")
            }
        );
    }

    Ok(available)
}

fn print_outcomes(run: &Run) {
    for outcome in &run.outcomes {
        let marker = if run.sink.as_deref() == Some(outcome.id.as_str()) {
            "*"
        } else {
            " "
        };
        let result = outcome
            .result
            .as_ref()
            .map(|value| value.to_json().to_string())
            .unwrap_or_else(|| "(unset)".dimmed().to_string());
        println!(
            "  {} {} [{}] {}",
            marker,
            outcome.id,
            outcome.task_type,
            result
        );
    }
}
