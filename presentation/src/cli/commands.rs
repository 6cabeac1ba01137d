//! CLI command definitions

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use toolweave_application::DependencyHints;

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Colored, human-readable text
    #[default]
    Text,
    /// JSON output
    Json,
}

/// CLI arguments for toolweave
#[derive(Parser, Debug)]
#[command(name = "toolweave")]
#[command(author, version, about = "Discover tools, plan calls and execute them resiliently")]
#[command(long_about = r#"
toolweave discovers tools from built-in registries and proxy channels,
turns an intent into a dependency-ordered plan and executes it with
retries, fallbacks and per-tool circuit breakers.

Configuration files are loaded from (in priority order):
1. TOOLWEAVE_* environment variables (nested keys split on "__")
2. --config <path>     Explicit config file
3. ./toolweave.toml    Project-level config
4. ~/.config/toolweave/config.toml   Global config

Example:
  toolweave tools --capability search
  toolweave plan "search the docs and store the results" --export plan.json
  toolweave run --plan plan.json --export-state state.json
  toolweave run --plan plan.json --resume state.json
"#)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long, global = true)]
    pub no_config: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the tools in the catalog
    Tools {
        /// Only tools in this category (e.g. file-system, search)
        #[arg(long, value_name = "CATEGORY")]
        category: Option<String>,

        /// Only tools offering this capability tag
        #[arg(long, value_name = "TAG")]
        capability: Option<String>,
    },

    /// Build and validate a plan for an intent
    Plan {
        /// What should be done, in plain words
        intent: String,

        /// Dependency hint `tool:dependency` (can be specified multiple times)
        #[arg(short, long = "depends", value_name = "TOOL:DEP")]
        depends: Vec<String>,

        /// Write the plan snapshot to this file
        #[arg(long, value_name = "FILE")]
        export: Option<PathBuf>,
    },

    /// Plan and execute an intent, or execute an exported plan
    Run {
        /// What should be done, in plain words
        #[arg(required_unless_present = "plan", conflicts_with = "plan")]
        intent: Option<String>,

        /// Execute a previously exported plan
        #[arg(long, value_name = "FILE")]
        plan: Option<PathBuf>,

        /// Dependency hint `tool:dependency` (can be specified multiple times)
        #[arg(short, long = "depends", value_name = "TOOL:DEP")]
        depends: Vec<String>,

        /// Resume from an exported execution state, keeping succeeded calls
        #[arg(long, value_name = "FILE", requires = "plan", conflicts_with = "intent")]
        resume: Option<PathBuf>,

        /// Write the final execution state to this file
        #[arg(long, value_name = "FILE")]
        export_state: Option<PathBuf>,
    },

    /// Show configuration sources and validation issues
    Config,
}

/// Parse `tool:dependency` pairs into planner hints
///
/// A tool may be named several times; its dependencies accumulate in order.
pub fn parse_dependency_hints(pairs: &[String]) -> Result<DependencyHints, String> {
    let mut hints = DependencyHints::new();
    for pair in pairs {
        let (tool, dep) = pair
            .split_once(':')
            .map(|(t, d)| (t.trim(), d.trim()))
            .filter(|(t, d)| !t.is_empty() && !d.is_empty())
            .ok_or_else(|| format!("Invalid dependency hint '{}': expected TOOL:DEP", pair))?;
        let deps = hints.entry(tool.to_string()).or_default();
        if !deps.iter().any(|d| d == dep) {
            deps.push(dep.to_string());
        }
    }
    Ok(hints)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_plan_file() {
        let cli = Cli::parse_from([
            "toolweave",
            "-vv",
            "run",
            "--plan",
            "plan.json",
            "--export-state",
            "state.json",
            "--format",
            "json",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.format, OutputFormat::Json);
        match cli.command {
            Command::Run {
                intent,
                plan,
                export_state,
                ..
            } => {
                assert!(intent.is_none());
                assert_eq!(plan, Some(PathBuf::from("plan.json")));
                assert_eq!(export_state, Some(PathBuf::from("state.json")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_run_requires_intent_or_plan() {
        assert!(Cli::try_parse_from(["toolweave", "run"]).is_err());
        assert!(
            Cli::try_parse_from(["toolweave", "run", "search", "--plan", "p.json"]).is_err()
        );
    }

    #[test]
    fn test_resume_only_applies_to_plan_files() {
        let with_intent =
            Cli::try_parse_from(["toolweave", "run", "search", "--resume", "s.json"]);
        assert!(with_intent.is_err());

        let cli = Cli::try_parse_from([
            "toolweave", "run", "--plan", "p.json", "--resume", "s.json",
        ])
        .unwrap();
        match cli.command {
            Command::Run { intent, resume, .. } => {
                assert_eq!(intent, None);
                assert_eq!(resume, Some(PathBuf::from("s.json")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_dependency_hints() {
        let hints = parse_dependency_hints(&[
            "archive_store:web_search".to_string(),
            "chat_notify:archive_store".to_string(),
            "chat_notify:web_search".to_string(),
            "chat_notify:web_search".to_string(),
        ])
        .unwrap();

        assert_eq!(hints["archive_store"], vec!["web_search"]);
        assert_eq!(hints["chat_notify"], vec!["archive_store", "web_search"]);
    }

    #[test]
    fn test_parse_dependency_hints_rejects_malformed() {
        assert!(parse_dependency_hints(&["no_colon".to_string()]).is_err());
        assert!(parse_dependency_hints(&[":dep".to_string()]).is_err());
    }
}
