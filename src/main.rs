use clap::{Parser, Subcommand};
use mcp_toolkit::Result;
use mcp_toolkit::commands::{list_tools, run_tests, serve_mcp, show_config, write_config};
use mcp_toolkit::runner::Category;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mcp-toolkit")]
#[command(about = "MCP tool server with basic, file, web API and JSON processing tools")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server on stdio
    Serve {
        /// Only register echo, calculator and text_analyzer
        #[arg(long)]
        basic_only: bool,
    },
    /// Write the configuration file, or show it
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// List registered tools and their parameters
    Tools,
    /// Run tests, lints and the server startup check
    RunTests {
        /// Root directory of the project
        #[arg(long, default_value = ".")]
        project_root: PathBuf,
        /// Include slow categories (performance and integration)
        #[arg(long)]
        include_slow: bool,
        /// File to write JSON results to
        #[arg(long)]
        output: Option<PathBuf>,
        /// Run a single category
        #[arg(long, value_enum)]
        category: Option<Category>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout is reserved for JSON-RPC while serving
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { basic_only } => {
            serve_mcp(basic_only).await?;
        }
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                write_config()?;
            }
        }
        Commands::Tools => {
            list_tools()?;
        }
        Commands::RunTests {
            project_root,
            include_slow,
            output,
            category,
        } => {
            let passed =
                run_tests(&project_root, include_slow, output.as_deref(), category).await?;
            if !passed {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn serve_command() {
        let cli = Cli::try_parse_from(["mcp-toolkit", "serve"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            assert!(matches!(
                parsed.command,
                Commands::Serve { basic_only: false }
            ));
        }
    }

    #[test]
    fn serve_basic_only() {
        let cli = Cli::try_parse_from(["mcp-toolkit", "serve", "--basic-only"]);
        if let Ok(Cli {
            command: Commands::Serve { basic_only },
        }) = cli
        {
            assert!(basic_only);
        } else {
            panic!("expected serve command");
        }
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["mcp-toolkit", "config", "--show"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { show } = parsed.command {
                assert!(show);
            }
        }
    }

    #[test]
    fn tools_command() {
        let cli = Cli::try_parse_from(["mcp-toolkit", "tools"]);
        assert!(matches!(
            cli.map(|c| c.command),
            Ok(Commands::Tools)
        ));
    }

    #[test]
    fn run_tests_defaults() {
        let cli = Cli::try_parse_from(["mcp-toolkit", "run-tests"]);
        if let Ok(Cli {
            command:
                Commands::RunTests {
                    project_root,
                    include_slow,
                    output,
                    category,
                },
        }) = cli
        {
            assert_eq!(project_root, PathBuf::from("."));
            assert!(!include_slow);
            assert_eq!(output, None);
            assert_eq!(category, None);
        } else {
            panic!("expected run-tests command");
        }
    }

    #[test]
    fn run_tests_with_all_flags() {
        let cli = Cli::try_parse_from([
            "mcp-toolkit",
            "run-tests",
            "--project-root",
            "/tmp/project",
            "--include-slow",
            "--output",
            "results.json",
            "--category",
            "lint",
        ]);
        if let Ok(Cli {
            command:
                Commands::RunTests {
                    project_root,
                    include_slow,
                    output,
                    category,
                },
        }) = cli
        {
            assert_eq!(project_root, PathBuf::from("/tmp/project"));
            assert!(include_slow);
            assert_eq!(output, Some(PathBuf::from("results.json")));
            assert_eq!(category, Some(Category::Lint));
        } else {
            panic!("expected run-tests command");
        }
    }

    #[test]
    fn unknown_category_is_rejected() {
        let cli = Cli::try_parse_from(["mcp-toolkit", "run-tests", "--category", "pytest"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidValue);
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["mcp-toolkit", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["mcp-toolkit", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
