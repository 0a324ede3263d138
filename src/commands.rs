use anyhow::{Context, Result};
use console::style;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

use crate::config::Config;
use crate::mcp::McpServer;
use crate::runner::{Category, RunReport, TaskRunner};
use crate::tools::ToolRegistry;

/// Registry for `serve`/`tools`: only the basic tools, or everything.
#[inline]
pub fn build_registry(config: &Config, basic_only: bool) -> Result<ToolRegistry> {
    let registry = if basic_only {
        ToolRegistry::basic()
    } else {
        ToolRegistry::with_default_tools(config)
    };
    registry.context("Failed to build tool registry")
}

/// An MCP server named after `config.server` with every registry tool
/// registered.
#[inline]
pub async fn build_server(config: &Config, registry: &ToolRegistry) -> Result<Arc<McpServer>> {
    let mut server = McpServer::new(&config.server.name, &config.server.version)
        .context("Failed to create MCP server")?;
    if let Some(instructions) = &config.server.instructions {
        server = server.with_instructions(instructions);
    }

    registry
        .register_with_server(&server)
        .await
        .context("Failed to register tools")?;

    Ok(Arc::new(server))
}

/// Run the MCP server on stdio until the client disconnects or Ctrl+C.
///
/// stdout carries JSON-RPC, so everything human-readable goes to stderr.
#[inline]
pub async fn serve_mcp(basic_only: bool) -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;
    let registry = build_registry(&config, basic_only)?;
    let server = build_server(&config, &registry).await?;

    info!(
        "MCP server {} v{} ready with tools: {}",
        config.server.name,
        config.server.version,
        registry.names().join(", ")
    );
    eprintln!(
        "{} {} tools on stdio transport",
        style("Serving").bold().green(),
        registry.len()
    );

    tokio::select! {
        result = Arc::clone(&server).serve_stdio() => {
            match result {
                Ok(()) => info!("MCP server stopped normally"),
                Err(e) => {
                    error!("MCP server error: {}", e);
                    return Err(e);
                }
            }
        }
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nReceived interrupt signal, shutting down...");
        }
    }

    Ok(())
}

/// Print the effective configuration as TOML.
#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;

    eprintln!("{}", style("Current Configuration").bold().cyan());
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).cyan()
    );
    if !config.config_file_path().exists() {
        eprintln!("{}", style("(file not found, showing defaults)").yellow());
    }
    eprintln!();
    print!("{}", config.to_toml()?);

    Ok(())
}

/// Write the effective configuration back to the config file, creating it
/// with defaults when it does not exist yet.
#[inline]
pub fn write_config() -> Result<PathBuf> {
    let config = Config::load_default().context("Failed to load configuration")?;
    config.save()?;

    let path = config.config_file_path();
    eprintln!(
        "{} {}",
        style("Configuration written to").green(),
        style(path.display()).cyan()
    );
    Ok(path)
}

/// Print every registered tool with its parameters.
#[inline]
pub fn list_tools() -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;
    let registry = build_registry(&config, false)?;

    println!("Registered tools ({} total):", registry.len());
    for descriptor in registry.descriptors() {
        println!();
        println!("{}: {}", style(descriptor.name()).bold(), descriptor.description());
        for param in descriptor.parameters() {
            let mut line = format!(
                "  - {} ({}{})",
                param.name(),
                param.param_type().as_str(),
                if param.is_required() { ", required" } else { "" }
            );
            if let Some(default) = param.default() {
                write!(line, " default={}", default)?;
            }
            if let Some(allowed) = param.allowed() {
                let values: Vec<String> = allowed.iter().map(ToString::to_string).collect();
                write!(line, " one of [{}]", values.join(", "))?;
            }
            println!("{}: {}", line, param.description());
        }
    }

    Ok(())
}

/// Run one category or the full plan. Returns whether every executed
/// category passed or was skipped.
#[inline]
pub async fn run_tests(
    project_root: &Path,
    include_slow: bool,
    output: Option<&Path>,
    category: Option<Category>,
) -> Result<bool> {
    let runner = TaskRunner::new(project_root)?;

    let report = match category {
        Some(category) => {
            info!("Running category: {}", category.result_key());
            let result = runner.run_category(category).await;
            RunReport {
                results: vec![(category, result)],
            }
        }
        None => runner.run_all(include_slow).await,
    };

    runner.print_summary(&report);

    if let Some(output) = output {
        runner
            .save_results_json(&report, output)
            .await
            .with_context(|| format!("Failed to save results to {}", output.display()))?;
    }

    Ok(report.all_passed())
}
