#![forbid(unsafe_code)]

use cartracker_os::config::CarTrackerConfig;
use cartracker_tools::ledger_cli::{
    default_ledger_path, execute_invoke, execute_keys, resolve_creator, Cli, Command,
};
use clap::Parser;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match CarTrackerConfig::load() {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("STARTUP_ERROR {err}");
            std::process::exit(1);
        }
    };

    match run(cli, config) {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(2);
        }
    }
}

fn run(cli: Cli, config: CarTrackerConfig) -> Result<String, String> {
    let ledger_path = cli.ledger.unwrap_or_else(default_ledger_path);
    match cli.command {
        Command::Invoke {
            role,
            msp,
            issuer,
            function,
            args,
        } => {
            let creator = resolve_creator(role.as_deref(), msp.as_deref(), issuer.as_deref())?;
            execute_invoke(&ledger_path, config, creator, &function, args)
        }
        Command::Keys => execute_keys(&ledger_path),
    }
}
