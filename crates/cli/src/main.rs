mod commands;

use crate::commands::{handle_init, handle_list, handle_run, InitArgs};

use clap::{Parser, Subcommand};
use common::error::VmatError;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "vmat", about = "Create catalog views from SQL stored in a table")]
pub struct Cli {
    #[arg(
        long = "config-path",
        short = 'c',
        help = "directory holding view-materializer.yml",
        global = true
    )]
    pub config_path: Option<PathBuf>,
    #[arg(
        long,
        help = "connection profile to use instead of the one in the config",
        global = true
    )]
    pub profile: Option<String>,
    #[command(subcommand)]
    pub command: Cmd,
}

#[derive(Subcommand)]
pub enum Cmd {
    /// Write a starter config and connection profile
    Init(InitArgs),
    /// Create every view defined in the source table
    Run,
    /// Print the view definitions without executing them
    List,
}

fn run_cmd(func: Result<(), VmatError>) {
    if let Err(e) = func {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn main() {
    logging::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Cmd::Init(args) => run_cmd(handle_init(&args)),
        Cmd::Run => run_cmd(handle_run(cli.config_path, cli.profile.as_deref())),
        Cmd::List => run_cmd(handle_list(cli.config_path, cli.profile.as_deref())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["vmat", "run", "-c", "/etc/vmat", "--profile", "prod"])
            .unwrap();
        assert!(matches!(cli.command, Cmd::Run));
        assert_eq!(cli.config_path, Some(PathBuf::from("/etc/vmat")));
        assert_eq!(cli.profile.as_deref(), Some("prod"));
    }

    #[test]
    fn subcommand_is_required() {
        assert!(Cli::try_parse_from(["vmat"]).is_err());
    }

    #[test]
    fn init_takes_a_path() {
        let cli = Cli::try_parse_from(["vmat", "init", "--path", "jobs/views"]).unwrap();
        match cli.command {
            Cmd::Init(args) => assert_eq!(args.path, PathBuf::from("jobs/views")),
            _ => panic!("expected init"),
        }
    }
}
