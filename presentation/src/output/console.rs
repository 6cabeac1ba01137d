//! Console output for catalogs, plans and execution reports

use colored::Colorize;
use serde::Serialize;
use toolweave_application::{CatalogStats, NameConflict, RefreshOutcome};
use toolweave_domain::util::preview;
use toolweave_domain::{
    CallId, CallRecord, CallStatus, ExecutionReport, Plan, PlanStatus, ToolDescriptor,
};

/// One configuration layer as shown by `toolweave config`
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSourceLine {
    pub label: String,
    pub location: String,
    pub found: bool,
}

/// Formats engine results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Catalog listing with conflicts and statistics
    pub fn format_catalog(
        tools: &[ToolDescriptor],
        conflicts: &[NameConflict],
        stats: &CatalogStats,
    ) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("Tool Catalog"));
        output.push('\n');

        if tools.is_empty() {
            output.push_str(&format!("\n{}\n", "No matching tools.".dimmed()));
        }
        for tool in tools {
            output.push_str(&format!(
                "\n{} {}\n",
                tool.name.yellow().bold(),
                format!("[{} · {} · {}]", tool.kind, tool.source, tool.category).dimmed()
            ));
            output.push_str(&format!("  {}\n", tool.description));
            if !tool.capabilities.is_empty() {
                let caps: Vec<&str> = tool.capabilities.iter().map(String::as_str).collect();
                output.push_str(&format!("  {} {}\n", "capabilities:".cyan(), caps.join(", ")));
            }
            if !tool.parameters.is_empty() {
                let params: Vec<String> = tool
                    .parameters
                    .iter()
                    .map(|p| {
                        let marker = if p.required { "" } else { "?" };
                        format!("{}{}: {}", p.name, marker, p.param_type)
                    })
                    .collect();
                output.push_str(&format!("  {} {}\n", "parameters:".cyan(), params.join(", ")));
            }
            if tool.performance.usage_count > 0 {
                output.push_str(&format!(
                    "  {} {} calls, {:.0}% success, {:.0}ms mean\n",
                    "performance:".cyan(),
                    tool.performance.usage_count,
                    tool.performance.success_rate * 100.0,
                    tool.performance.mean_latency_ms
                ));
            }
        }

        if !conflicts.is_empty() {
            output.push_str(&Self::section_header("Name Conflicts"));
            for conflict in conflicts {
                output.push_str(&format!(
                    "  {} kept from {}, dropped from {}\n",
                    conflict.tool.yellow(),
                    conflict.kept_source,
                    conflict.dropped_source
                ));
            }
        }

        output.push_str(&Self::section_header("Statistics"));
        output.push_str(&format!(
            "  {} tools ({} internal, {} proxy)\n",
            stats.total_tools, stats.internal_tools, stats.proxy_tools
        ));
        for (source, count) in &stats.tools_per_source {
            output.push_str(&format!("  source {:<20} {}\n", source, count));
        }
        for (category, count) in &stats.tools_per_category {
            output.push_str(&format!("  category {:<18} {}\n", category.as_str(), count));
        }

        output.push_str(&Self::footer());
        output
    }

    /// One-line refresh outcome, plus a line per failed source
    pub fn format_refresh(outcome: &RefreshOutcome) -> String {
        let mut output = format!(
            "{} {} tools from {} source(s){}\n",
            "Catalog:".cyan().bold(),
            outcome.tool_count,
            outcome.sources_ok.len(),
            if outcome.cached { " (cached)" } else { "" }
        );
        for failure in &outcome.failures {
            output.push_str(&format!(
                "  {} {}: {}\n",
                "unavailable".red(),
                failure.source,
                failure.error
            ));
        }
        output
    }

    pub fn format_plan(plan: &Plan) -> String {
        let mut output = String::new();
        output.push_str(&Self::header(&format!("Plan {}", plan.id)));
        output.push('\n');
        if !plan.intent.is_empty() {
            output.push_str(&format!("\n{} {}\n", "Intent:".cyan().bold(), plan.intent));
        }

        output.push_str(&Self::section_header("Calls"));
        for (index, call) in plan.calls.iter().enumerate() {
            output.push_str(&format!(
                "  {}. {} {}\n",
                index + 1,
                call.id.as_str().yellow().bold(),
                format!("→ {}", call.tool_name).dimmed()
            ));
            if !call.depends_on.is_empty() {
                let deps: Vec<&str> = call.depends_on.iter().map(|d| d.as_str()).collect();
                output.push_str(&format!("     {} {}\n", "after:".cyan(), deps.join(", ")));
            }
            if !call.params.is_empty() {
                let params = serde_json::Value::Object(call.params.clone());
                output.push_str(&format!("     {} {}\n", "params:".cyan(), preview(&params, 80)));
            }
        }

        output.push_str(&Self::footer());
        output
    }

    /// Execution report: per-call lines, then the calls needing attention
    pub fn format_report(report: &ExecutionReport) -> String {
        let mut output = String::new();
        output.push_str(&Self::header(&format!("Execution {}", report.plan_id)));
        output.push('\n');

        output.push_str(&format!(
            "\n{} {} in {}ms{}\n",
            "Status:".cyan().bold(),
            Self::plan_status(report.plan_status),
            report.total_duration_ms,
            if report.cancelled { " (cancelled)" } else { "" }
        ));

        output.push_str(&Self::section_header("Calls"));
        for record in &report.calls {
            output.push_str(&Self::call_line(record));
        }

        if !report.retried_calls.is_empty() {
            output.push_str(&Self::section_header("Retried"));
            for retried in &report.retried_calls {
                output.push_str(&format!("  {} retried {}x\n", retried.id, retried.retries));
            }
        }

        if !report.fallback_calls.is_empty() {
            output.push_str(&Self::section_header("Fallbacks"));
            for record in Self::records(report, &report.fallback_calls) {
                if let Some(fallback) = &record.fallback {
                    output.push_str(&format!(
                        "  {} {} → {} (shared: {})\n",
                        record.id,
                        fallback.original_tool,
                        fallback.substitute_tool.green(),
                        fallback.shared_capabilities.join(", ")
                    ));
                }
            }
        }

        if !report.skipped_calls.is_empty() {
            output.push_str(&Self::section_header("Skipped"));
            for record in Self::records(report, &report.skipped_calls) {
                output.push_str(&format!(
                    "  {}: {}\n",
                    record.id,
                    record.skip_reason.as_deref().unwrap_or("no reason recorded")
                ));
            }
        }

        if !report.unsatisfied_calls.is_empty() {
            output.push_str(&Self::section_header("Unsatisfied"));
            for record in Self::records(report, &report.unsatisfied_calls) {
                if let Some(unsatisfied) = &record.unsatisfied {
                    output.push_str(&format!(
                        "  {} {} [{}]\n",
                        record.id.as_str().red().bold(),
                        "missing:".dimmed(),
                        unsatisfied.capabilities.join(", ")
                    ));
                    output.push_str(&format!(
                        "    considered: {}\n    {}\n",
                        unsatisfied.considered.join(", "),
                        unsatisfied.explanation
                    ));
                }
            }
        }

        output.push_str(&Self::footer());
        output
    }

    pub fn format_config(sources: &[ConfigSourceLine], issues: &[String]) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "{}\n",
            "Configuration sources (highest priority first):".cyan().bold()
        ));
        for source in sources {
            let marker = if source.found {
                "found".green()
            } else {
                "absent".dimmed()
            };
            output.push_str(&format!("  {:<12} {:<8} {}\n", source.label, marker, source.location));
        }

        if issues.is_empty() {
            output.push_str(&format!("\n{}\n", "Configuration is valid.".green()));
        } else {
            output.push_str(&format!("\n{}\n", "Configuration issues:".red().bold()));
            for issue in issues {
                output.push_str(&format!("  * {}\n", issue));
            }
        }
        output
    }

    fn call_line(record: &CallRecord) -> String {
        let status = match record.status {
            CallStatus::Succeeded => record.status.as_str().green(),
            CallStatus::Failed | CallStatus::TimedOut => record.status.as_str().red(),
            CallStatus::Skipped => record.status.as_str().yellow(),
            CallStatus::Pending | CallStatus::Running => record.status.as_str().dimmed(),
        };
        let mut line = format!(
            "  {:<24} {:<10} {}",
            record.id.as_str(),
            status,
            format!(
                "via {} · {} attempt(s) · {}ms",
                record.served_by(),
                record.attempts,
                record.latency_ms
            )
            .dimmed()
        );
        match record.status {
            CallStatus::Succeeded => {
                if let Some(payload) = &record.payload {
                    line.push_str(&format!("\n    {}", preview(payload, 72)));
                }
            }
            CallStatus::Skipped => {}
            _ => {
                if let Some(error) = &record.error {
                    line.push_str(&format!("\n    {}", error.to_string().red()));
                }
            }
        }
        line.push('\n');
        line
    }

    fn records<'a>(
        report: &'a ExecutionReport,
        ids: &'a [CallId],
    ) -> impl Iterator<Item = &'a CallRecord> {
        ids.iter().filter_map(|id| report.call(id.as_str()))
    }

    fn plan_status(status: PlanStatus) -> colored::ColoredString {
        match status {
            PlanStatus::Completed => status.as_str().green().bold(),
            PlanStatus::PartiallyCompleted => status.as_str().yellow().bold(),
            PlanStatus::Failed => status.as_str().red().bold(),
            PlanStatus::Pending | PlanStatus::Running => status.as_str().normal(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use toolweave_domain::{ExecutionState, ToolCall, ToolError, UnsatisfiedRecord};

    fn plain() {
        colored::control::set_override(false);
    }

    fn report() -> ExecutionReport {
        let plan = Plan::new("p-1", "search, store and notify")
            .with_call(ToolCall::new("web_search", "web_search"))
            .with_call(ToolCall::new("archive_store", "archive_store").depends_on("web_search"))
            .with_call(ToolCall::new("chat_notify", "chat_notify").depends_on("archive_store"));
        let mut state = ExecutionState::new(&plan);

        let search = state.record_mut("web_search").unwrap();
        search.status = CallStatus::Succeeded;
        search.attempts = 1;
        search.payload = Some(json!({"hits": 2}));

        let store = state.record_mut("archive_store").unwrap();
        store.status = CallStatus::Succeeded;
        store.attempts = 2;
        store.retries = 1;
        store.payload = Some(json!("stored"));

        let notify = state.record_mut("chat_notify").unwrap();
        notify.status = CallStatus::Failed;
        notify.attempts = 3;
        notify.retries = 2;
        notify.error = Some(ToolError::remote("channel rejected the message"));
        notify.unsatisfied = Some(UnsatisfiedRecord {
            capabilities: vec!["notify".into()],
            considered: vec!["chat_notify".into()],
            explanation: "no other tool offers notify".into(),
        });

        state.settle();
        ExecutionReport::from_state(&state, 12, false)
    }

    #[test]
    fn test_report_lists_calls_needing_attention() {
        plain();
        let text = ConsoleFormatter::format_report(&report());

        assert!(text.contains("partially-completed"));
        assert!(text.contains("archive_store retried 1x"));
        assert!(text.contains("Unsatisfied"));
        assert!(text.contains("missing: [notify]"));
        assert!(text.contains("considered: chat_notify"));
        assert!(text.contains("channel rejected the message"));
        assert!(!text.contains("Skipped"));
    }

    #[test]
    fn test_plan_lists_dependencies() {
        plain();
        let plan = Plan::new("p-2", "search then store")
            .with_call(ToolCall::new("web_search", "web_search"))
            .with_call(ToolCall::new("archive_store", "archive_store").depends_on("web_search"));

        let text = ConsoleFormatter::format_plan(&plan);
        assert!(text.contains("1. web_search"));
        assert!(text.contains("2. archive_store"));
        assert!(text.contains("after: web_search"));
    }

    #[test]
    fn test_config_reports_issues() {
        plain();
        let sources = vec![ConfigSourceLine {
            label: "Project".into(),
            location: "./toolweave.toml".into(),
            found: true,
        }];

        let valid = ConsoleFormatter::format_config(&sources, &[]);
        assert!(valid.contains("Configuration is valid."));

        let invalid = ConsoleFormatter::format_config(&sources, &["zero timeout".to_string()]);
        assert!(invalid.contains("* zero timeout"));
    }
}
