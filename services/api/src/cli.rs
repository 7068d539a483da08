use crate::predict::{run_model_inspect, run_predict, ModelInspectArgs, PredictArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use heartcheck::error::AppError;
use heartcheck::prediction::RuleProfile;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "heartcheck",
    about = "Score cardiac risk over HTTP or from the command line",
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
    /// Score a single JSON patient record and print the response payload
    Predict(PredictArgs),
    /// Work with trained model files
    Model {
        #[command(subcommand)]
        command: ModelCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ModelCommand {
    /// Load a model file and print its metadata
    Inspect(ModelInspectArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Override the configured model file
    #[arg(long, conflicts_with = "no_model")]
    pub(crate) model: Option<PathBuf>,
    /// Serve heuristic predictions only
    #[arg(long)]
    pub(crate) no_model: bool,
    /// Rule profile used for heuristic scoring (full or lite)
    #[arg(long)]
    pub(crate) profile: Option<RuleProfile>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Predict(args) => run_predict(args),
        Command::Model {
            command: ModelCommand::Inspect(args),
        } => run_model_inspect(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn serve_accepts_profile_and_model_overrides() {
        let cli = Cli::try_parse_from([
            "heartcheck",
            "serve",
            "--port",
            "9100",
            "--profile",
            "lite",
            "--model",
            "models/heart.json",
        ])
        .expect("arguments parse");

        let Some(Command::Serve(args)) = cli.command else {
            panic!("expected serve command");
        };
        assert_eq!(args.port, Some(9100));
        assert_eq!(args.profile, Some(RuleProfile::Lite));
        assert_eq!(args.model, Some(PathBuf::from("models/heart.json")));
    }

    #[test]
    fn rejects_unknown_profiles() {
        let result = Cli::try_parse_from(["heartcheck", "predict", "--profile", "strict"]);
        assert!(result.is_err());
    }

    #[test]
    fn defaults_to_serve() {
        let cli = Cli::try_parse_from(["heartcheck"]).expect("arguments parse");
        assert!(cli.command.is_none());
    }
}
