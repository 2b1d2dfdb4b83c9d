pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "deskvoice",
    about = "Deskvoice operator CLI",
    long_about = "Operate the service desk voicebot: schema migrations, demo data, text queries, and realtime voice sessions.",
    after_help = "Examples:\n  deskvoice migrate\n  deskvoice ask \"status of ITSD-20240101-0001\"\n  deskvoice voice"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Insert the demo knowledge articles and tickets when they are missing")]
    Seed,
    #[command(about = "Answer one utterance through the text assistant and print the result envelope")]
    Ask {
        #[arg(required = true, num_args = 1.., help = "Utterance text; multiple words are joined")]
        utterance: Vec<String>,
    },
    #[command(about = "Run the realtime voice bridge until the remote side closes the session")]
    Voice,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Ask { utterance } => commands::ask::run(&utterance.join(" ")),
        Command::Voice => commands::voice::run(),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn ask_joins_words() {
        let cli = Cli::try_parse_from(["deskvoice", "ask", "check", "ticket", "42"]).expect("parse");
        let Command::Ask { utterance } = cli.command else {
            panic!("expected ask command");
        };
        assert_eq!(utterance.join(" "), "check ticket 42");
    }

    #[test]
    fn ask_requires_an_utterance() {
        assert!(Cli::try_parse_from(["deskvoice", "ask"]).is_err());
    }
}
