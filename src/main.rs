use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use compose_ls::{analyze, parse, serialize, Backend, Error, Settings};
use serde_json::json;
use tower_lsp::{LspService, Server};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "compose-ls", version, about = "Docker Compose language server and checker")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the language server on stdio (the default)
    Serve,
    /// Check Compose files and print their diagnostics as JSON
    Check(Check),
    /// Print a Compose file in canonical block style
    Format(Format),
}

#[derive(Args)]
struct Check {
    /// Compose files to check
    #[arg(required = true)]
    files: Vec<PathBuf>,
    /// Only report structural problems
    #[arg(long)]
    no_semantic: bool,
    /// Only report errors
    #[arg(long)]
    no_warnings: bool,
}

#[derive(Args)]
struct Format {
    /// Compose file to format
    file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error + Sync + Send>> {
    // Initialize the tracing subscriber for logging; stdout belongs to the LSP transport
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_ansi(atty::is(atty::Stream::Stderr))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            serve().await;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check(args) => Ok(check(&args)?),
        Commands::Format(Format { file }) => {
            let text = read_file(&file)?;
            print!("{}", serialize(&parse(&text).root));
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn serve() {
    info!("Starting Compose Language Server on stdio");
    let (stdin, stdout) = (tokio::io::stdin(), tokio::io::stdout());

    let (service, socket) = LspService::new(Backend::new);
    Server::new(stdin, stdout, socket).serve(service).await;
}

fn check(args: &Check) -> Result<ExitCode, Error> {
    let settings = Settings {
        semantic_validation: !args.no_semantic,
        report_warnings: !args.no_warnings,
        ..Settings::default()
    };

    let mut all_valid = true;
    for file in &args.files {
        let text = read_file(file)?;
        let analysis = analyze(&text, &settings);
        all_valid &= analysis.is_valid;

        let report = json!({
            "file": file.display().to_string(),
            "valid": analysis.is_valid,
            "diagnostics": analysis.diagnostics,
        });
        println!("{}", serde_json::to_string(&report)?);
    }

    Ok(if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn read_file(path: &Path) -> Result<String, Error> {
    fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })
}
