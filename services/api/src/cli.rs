use crate::console::{run_assess, run_catalog_check, AssessArgs, CatalogCheckArgs};
use crate::server;
use case_intake::error::AppError;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "Case Intake",
    about = "Score legal intake conversations and route them to attorney tiers",
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
    /// Score a conversation turn by turn and print each assessment
    Assess(AssessArgs),
    /// Inspect pattern catalogs
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
}

#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// Validate a catalog file (or the built-in catalog) and print a summary
    Check(CatalogCheckArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Assess(args) => run_assess(args),
        Command::Catalog {
            command: CatalogCommand::Check(args),
        } => run_catalog_check(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_serve() {
        let cli = Cli::try_parse_from(["case-intake-api"]).expect("parses");
        assert!(cli.command.is_none());
    }

    #[test]
    fn parses_assess_messages() {
        let cli = Cli::try_parse_from([
            "case-intake-api",
            "assess",
            "--session",
            "demo-1",
            "hello",
            "I was rear-ended by a drunk driver",
        ])
        .expect("parses");
        match cli.command {
            Some(Command::Assess(args)) => {
                assert_eq!(args.session, "demo-1");
                assert_eq!(args.messages.len(), 2);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parses_catalog_check_path() {
        let cli = Cli::try_parse_from([
            "case-intake-api",
            "catalog",
            "check",
            "--path",
            "catalog.json",
        ])
        .expect("parses");
        assert!(matches!(
            cli.command,
            Some(Command::Catalog {
                command: CatalogCommand::Check(CatalogCheckArgs { path: Some(_) })
            })
        ));
    }
}
