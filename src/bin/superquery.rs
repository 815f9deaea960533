use std::path::PathBuf;
use std::process::ExitCode;
use superquery::config::{self, Config};
use superquery::core::db::{ConnectionManager, Param};
use superquery::core::Result;
use superquery::repl;
use tracing::{info, warn};

const USAGE: &str = "\
Usage: superquery [--config <file>] [<database> [<sql> [<param>...]]]

  <database>  database name, file path or :memory:
  <sql>       run a single SELECT/INSERT/UPDATE/DELETE and exit
  <param>     positional values for the ? placeholders in <sql>

Without <sql> an interactive shell is started.";

/// Parsed command-line arguments.
#[derive(Debug, Default, PartialEq)]
struct CliArgs {
    config: Option<PathBuf>,
    database: Option<String>,
    sql: Option<String>,
    params: Vec<String>,
}

/// Parses arguments (without the program name). `Ok(None)` means help was requested.
fn parse_args(args: &[String]) -> std::result::Result<Option<CliArgs>, String> {
    let mut cli = CliArgs::default();
    let mut positional = Vec::new();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "-c" | "--config" => {
                let path = iter
                    .next()
                    .ok_or_else(|| format!("{} requires a file argument", arg))?;
                cli.config = Some(PathBuf::from(path));
            }
            _ => positional.push(arg.clone()),
        }
    }

    let mut positional = positional.into_iter();
    cli.database = positional.next();
    cli.sql = positional.next();
    cli.params = positional.collect();
    Ok(Some(cli))
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = match parse_args(&args) {
        Ok(Some(cli)) => cli,
        Ok(None) => {
            println!("{}", USAGE);
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            return ExitCode::FAILURE;
        }
    };

    let config = match config::load_or_default(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    // Initialize the logging system using tracing subscriber
    let level = config.logging.level().unwrap_or(tracing::Level::WARN);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting superquery...");

    match run(cli, config) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: CliArgs, config: Config) -> Result<ExitCode> {
    let manager = ConnectionManager::new();
    let options = match &cli.database {
        Some(database) => Some(config.options_for(database)),
        None => config.connect_options(),
    };

    let Some(sql) = cli.sql else {
        if let Some(options) = options {
            if let Err(e) = manager.connect_with(options) {
                warn!("startup connection failed: {}", e);
                eprintln!("Failed to connect to database: {}", e);
                println!("Starting interactive mode without a connection.");
            }
        }
        repl::run_repl(manager, config)?;
        return Ok(ExitCode::SUCCESS);
    };

    match options {
        Some(options) => manager.connect_with(options)?,
        None => {
            eprintln!("No database given.\n\n{}", USAGE);
            return Ok(ExitCode::FAILURE);
        }
    }

    let params: Vec<Param> = cli.params.iter().map(|p| Param::parse_literal(p)).collect();
    let envelope = manager.execute(&sql, &params)?;
    config
        .printer()
        .print_envelope(&envelope, config.output.format)?;
    manager.close()?;

    Ok(if envelope.is_error() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
