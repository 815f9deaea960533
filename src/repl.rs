use crate::config::Config;
use crate::core::db::{ConnectionManager, Param};
use crate::core::{CommandResult, Result};
use crate::table_printer::{OutputFormat, TablePrinter};
use std::io::{self, BufRead, Write};
use tracing::debug;

/// Represents a parsed shell command.
#[derive(Debug, PartialEq)]
pub enum Command {
    Open(String),
    Close,
    Info,
    /// Raw parameter literals for the next SQL statement
    Bind(String),
    Format(String),
    Help,
    Quit,
    Sql(String),
    Unknown(String),
}

/// Parses a user input string into a corresponding `Command`.
///
/// If the input starts with a colon (`:`), it is interpreted as a command.
/// Otherwise, it is treated as a SQL statement.
pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    let Some(trimmed) = input.strip_prefix(':') else {
        return Command::Sql(input.to_string());
    };
    let (name, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (trimmed, ""),
    };
    match name {
        "open" if !rest.is_empty() => Command::Open(rest.to_string()),
        "close" => Command::Close,
        "info" => Command::Info,
        "bind" => Command::Bind(rest.to_string()),
        "format" if !rest.is_empty() => Command::Format(rest.to_string()),
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        _ => Command::Unknown(input.to_string()),
    }
}

const HELP: &str = "\
Available commands:
  :open <db>          Open a database (name, path or :memory:)
  :close              Close the open database
  :info               Show database and driver information
  :bind <v1> <v2> ... Set positional parameters for the next statement
  :format <fmt>       Output format: table, csv, json, markdown
  :help               Show this help
  :quit               Exit

Or enter SELECT, INSERT, UPDATE or DELETE statements directly.";

/// Interactive shell state around the connection holder.
pub struct Repl {
    manager: ConnectionManager,
    config: Config,
    printer: TablePrinter,
    format: OutputFormat,
    pending_params: Vec<Param>,
}

impl Repl {
    pub fn new(manager: ConnectionManager, config: Config) -> Self {
        Repl {
            printer: config.printer(),
            format: config.output.format,
            manager,
            config,
            pending_params: Vec::new(),
        }
    }

    /// Executes one command and returns the text to show, if any.
    ///
    /// `Quit` is handled by the input loop and yields nothing here.
    pub fn handle(&mut self, command: Command) -> CommandResult {
        match command {
            Command::Help => Ok(Some(HELP.to_string())),
            Command::Open(database) => {
                self.manager.connect_with(self.config.options_for(&database))?;
                Ok(Some(format!("Connected to {}", database)))
            }
            Command::Close => {
                self.manager.close()?;
                self.pending_params.clear();
                Ok(Some("Connection closed".to_string()))
            }
            Command::Info => Ok(Some(self.manager.database_info()?.to_string())),
            Command::Bind(literals) => {
                self.pending_params = Param::parse_list(&literals)?;
                let shown: Vec<String> = self.pending_params.iter().map(Param::to_string).collect();
                Ok(Some(format!(
                    "Bound {} parameter(s): {}",
                    self.pending_params.len(),
                    shown.join(", ")
                )))
            }
            Command::Format(name) => {
                self.format = name.parse()?;
                Ok(Some(format!("Output format: {}", self.format)))
            }
            Command::Sql(sql) => {
                if sql.is_empty() {
                    return Ok(None);
                }
                let params = std::mem::take(&mut self.pending_params);
                debug!(params = params.len(), "running statement from shell");
                let envelope = self.manager.execute(&sql, &params)?;
                Ok(Some(self.printer.render_envelope_as(&envelope, self.format)?))
            }
            Command::Quit => Ok(None),
            Command::Unknown(input) => Ok(Some(format!(
                "Unknown command: {}. Type :help for commands.",
                input
            ))),
        }
    }

    /// Reads commands line by line until `:quit` or end of input.
    ///
    /// Command errors are reported on `output` and do not stop the loop.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> Result<()> {
        writeln!(output, "Welcome to the superquery shell! Type :help for commands, :quit to exit.")?;

        let mut lines = input.lines();
        loop {
            write!(output, "> ")?;
            output.flush()?;
            let Some(line) = lines.next() else {
                break;
            };
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let command = parse_command(&line);
            if command == Command::Quit {
                break;
            }
            match self.handle(command) {
                Ok(Some(text)) => {
                    write!(output, "{}", text)?;
                    if !text.ends_with('\n') {
                        writeln!(output)?;
                    }
                }
                Ok(None) => {}
                Err(e) => writeln!(output, "Error: {}", e)?,
            }
        }
        Ok(())
    }
}

/// Runs the shell on standard input and output.
pub fn run_repl(manager: ConnectionManager, config: Config) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    Repl::new(manager, config).run(stdin.lock(), stdout.lock())
}
