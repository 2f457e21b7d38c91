use crate::demo::{run_demo, run_score, DemoArgs, ScoreArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use leadflow::error::AppError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "leadflow",
    about = "Score, rank, and serve sales pipeline leads from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Score a single lead described in a JSON file
    Score(ScoreArgs),
    /// Seed a demo pipeline and print the ranked board
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// JSON seed file for the in-memory stores (overrides APP_SEED_FILE)
    #[arg(long)]
    pub(crate) seed_file: Option<PathBuf>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Score(args) => run_score(args),
        Command::Demo(args) => run_demo(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve_without_subcommand() {
        let cli = Cli::try_parse_from(["leadflow"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn score_accepts_dates_for_as_of() {
        let cli = Cli::try_parse_from([
            "leadflow",
            "score",
            "--input",
            "lead.json",
            "--as-of",
            "2025-06-15",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::Score(args)) => {
                assert_eq!(args.input, PathBuf::from("lead.json"));
                assert!(args.as_of.is_some());
            }
            other => panic!("expected score command, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unparseable_as_of() {
        assert!(Cli::try_parse_from(["leadflow", "demo", "--as-of", "soon"]).is_err());
    }
}
