//! CLI entrypoint for toolweave
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use toolweave_application::{DependencyHints, Orchestrator};
use toolweave_domain::{ExecutionState, PlanStatus, ToolCategory};
use toolweave_infrastructure::{
    BuiltinToolRegistry, CommandProxyChannel, ConfigLoader, FileConfig, JsonlEventSink,
    TracingEventSink,
};
use toolweave_presentation::{
    Cli, Command, ConfigSourceLine, ConsoleFormatter, OutputFormat, format_json,
    parse_dependency_hints, render,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over the verbosity flags when set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting toolweave");

    // Load configuration
    let config = if cli.no_config {
        info!("Configuration files disabled (--no-config)");
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?
    };

    if let Command::Config = cli.command {
        print_config(&cli, &config);
        return Ok(());
    }

    let issues = config.validate();
    if !issues.is_empty() {
        for issue in &issues {
            warn!(%issue, "Invalid configuration");
        }
        bail!(
            "Configuration has {} issue(s); run `toolweave config` for details",
            issues.len()
        );
    }

    // === Dependency Injection ===
    let orchestrator = build_orchestrator(&config)?;
    run_command(cli.command, cli.format, &orchestrator).await
}

async fn run_command(
    command: Command,
    format: OutputFormat,
    orchestrator: &Orchestrator,
) -> Result<()> {
    match command {
        Command::Tools {
            category,
            capability,
        } => {
            let category = category
                .as_deref()
                .map(str::parse::<ToolCategory>)
                .transpose()
                .map_err(anyhow::Error::msg)?;

            let outcome = orchestrator.refresh_catalog(true).await?;
            let snapshot = orchestrator.catalog();
            let tools = snapshot.query(category, capability.as_deref());

            match format {
                OutputFormat::Text => {
                    print!("{}", ConsoleFormatter::format_refresh(&outcome));
                    println!(
                        "{}",
                        ConsoleFormatter::format_catalog(
                            &tools,
                            snapshot.conflicts(),
                            &snapshot.stats()
                        )
                    );
                }
                OutputFormat::Json => println!(
                    "{}",
                    format_json(&serde_json::json!({
                        "refresh": outcome,
                        "tools": tools,
                        "conflicts": snapshot.conflicts(),
                        "stats": snapshot.stats(),
                    }))
                ),
            }
        }

        Command::Plan {
            intent,
            depends,
            export,
        } => {
            let hints = dependency_hints(&depends)?;
            let plan = orchestrator
                .build_and_validate_plan(&intent, hints.as_ref())
                .await?;

            if let Some(path) = export {
                let text = orchestrator.export_plan(&plan)?;
                write_file(&path, &text)?;
                info!(path = %path.display(), "Plan exported");
            }
            println!("{}", render(format, &plan, ConsoleFormatter::format_plan));
        }

        Command::Run {
            intent,
            plan,
            depends,
            resume,
            export_state,
        } => {
            let plan = match (plan, intent) {
                (Some(path), _) => {
                    let text = read_file(&path)?;
                    // Imported plans skip the refresh done while planning
                    orchestrator.refresh_catalog(false).await?;
                    orchestrator.import_plan(&text)?
                }
                (None, Some(intent)) => {
                    let hints = dependency_hints(&depends)?;
                    orchestrator
                        .build_and_validate_plan(&intent, hints.as_ref())
                        .await?
                }
                (None, None) => bail!("Either an intent or --plan is required"),
            };

            let cancel = CancellationToken::new();
            spawn_ctrl_c_handler(cancel.clone());

            let report = match resume {
                Some(path) => {
                    let previous = ExecutionState::import(&read_file(&path)?)?;
                    orchestrator.resume_plan(&plan, &previous, cancel).await?
                }
                None => orchestrator.execute_plan(&plan, cancel).await?,
            };

            if let Some(path) = export_state {
                write_file(&path, &report.state().export()?)?;
                info!(path = %path.display(), "Execution state exported");
            }
            println!("{}", render(format, &report, ConsoleFormatter::format_report));

            if report.plan_status == PlanStatus::Failed {
                bail!("Plan {} failed", report.plan_id);
            }
        }

        Command::Config => {}
    }

    Ok(())
}

/// Register every configured source and event sink
fn build_orchestrator(config: &FileConfig) -> Result<Orchestrator> {
    let mut builder = Orchestrator::builder().config(config.to_engine_config());

    if config.builtin.enabled {
        let mut registry = BuiltinToolRegistry::new();
        if let Some(dir) = &config.builtin.working_dir {
            registry = registry.with_working_dir(dir.clone());
        }
        if !config.builtin.knowledge_store {
            registry = registry.without_knowledge_store();
        }
        builder = builder.internal(Arc::new(registry));
    }

    if !config.proxy.tools.is_empty() {
        let mut channel = CommandProxyChannel::from_config(&config.proxy);
        if let Some(dir) = &config.builtin.working_dir {
            channel = channel.with_working_dir(dir.clone());
        }
        info!(channel = %config.proxy.id, tools = channel.len(), "Registered proxy channel");
        builder = builder.proxy(Arc::new(channel));
    }

    if let Some(path) = &config.logging.event_log {
        let sink = JsonlEventSink::open(path)
            .with_context(|| format!("Failed to open event log {}", path.display()))?;
        builder = builder.event_sink(Arc::new(sink));
    }

    if config.logging.trace_events {
        builder = builder.event_sink(Arc::new(TracingEventSink));
    }

    Ok(builder.build())
}

fn print_config(cli: &Cli, config: &FileConfig) {
    let sources: Vec<ConfigSourceLine> = if cli.no_config {
        Vec::new()
    } else {
        ConfigLoader::sources(cli.config.as_deref())
            .into_iter()
            .map(|s| ConfigSourceLine {
                label: s.label.to_string(),
                location: s.location,
                found: s.found,
            })
            .collect()
    };
    let issues: Vec<String> = config.validate().iter().map(|e| e.to_string()).collect();

    match cli.format {
        OutputFormat::Text => {
            println!("{}", ConsoleFormatter::format_config(&sources, &issues));
        }
        OutputFormat::Json => println!(
            "{}",
            format_json(&serde_json::json!({
                "sources": sources,
                "issues": issues,
                "config": config,
            }))
        ),
    }
}

fn dependency_hints(pairs: &[String]) -> Result<Option<DependencyHints>> {
    if pairs.is_empty() {
        return Ok(None);
    }
    parse_dependency_hints(pairs)
        .map(Some)
        .map_err(anyhow::Error::msg)
}

fn spawn_ctrl_c_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling outstanding calls");
            cancel.cancel();
        }
    });
}

fn read_file(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}
