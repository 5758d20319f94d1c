use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use rox::ast_printer::AstPrinter;
use rox::parser::Parser;
use rox::scanner::Scanner;
use rox::session::{Session, EXIT_COMPILE_ERROR};

/// Conventional exit status for an unreadable input file.
const EXIT_IO_ERROR: i32 = 74;

#[derive(ClapParser, Debug)]
#[command(version, about = "Rox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Option<Commands>,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize {
        filename: PathBuf,

        /// Print the tokens as a JSON array instead of one per line
        #[arg(long)]
        json: bool,
    },

    /// Parses a file and prints the syntax tree of each statement
    Parse { filename: PathBuf },

    /// Runs a file as a Rox program
    Run { filename: PathBuf },

    /// Starts an interactive prompt (the default without a subcommand)
    Repl,
}

/// Maps the file and checks it is UTF‑8.
fn read_source(filename: &Path) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename).with_context(|| format!("Failed to open file {:?}", filename))?;

    let len = file
        .metadata()
        .with_context(|| format!("Failed to stat file {:?}", filename))?
        .len();

    // Zero-length files cannot be mapped.
    if len == 0 {
        return Ok(String::new());
    }

    // SAFETY: the map is private to this process and copied out before the
    // file handle is dropped; concurrent truncation is not guarded against.
    let map = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to map file {:?}", filename))?;

    let source = std::str::from_utf8(&map)
        .with_context(|| format!("File {:?} is not valid UTF-8", filename))?
        .to_owned();

    info!("Read {} bytes from {:?}", source.len(), filename);

    Ok(source)
}

/// Like [`read_source`], but exits with the I/O status on failure.
fn read_source_or_exit(filename: &Path) -> String {
    match read_source(filename) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(EXIT_IO_ERROR);
        }
    }
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // Records are written as `[module:line] - message`.
    Builder::new()
        .format(|buf, record| {
            let module = record.module_path().unwrap_or("<unnamed>");
            let module = module.strip_prefix("rox::").unwrap_or(module);
            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .parse_default_env() // RUST_LOG overrides the default level
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

fn tokenize(filename: &Path, json: bool) -> Result<()> {
    let source = read_source_or_exit(filename);
    let (tokens, errors) = Scanner::new(&source).scan_tokens();

    for e in &errors {
        eprintln!("{}", e);
    }

    if json {
        let rendered = serde_json::to_string_pretty(&tokens).context("Failed to encode tokens")?;
        println!("{}", rendered);
    } else {
        for token in &tokens {
            println!("{}", token);
        }
    }

    if !errors.is_empty() {
        debug!("Tokenization failed, exiting with code {}", EXIT_COMPILE_ERROR);
        std::process::exit(EXIT_COMPILE_ERROR);
    }

    Ok(())
}

fn parse(filename: &Path) -> Result<()> {
    let source = read_source_or_exit(filename);
    let (tokens, mut errors) = Scanner::new(&source).scan_tokens();

    match Parser::new(&tokens).parse() {
        Ok(statements) if errors.is_empty() => {
            for stmt in &statements {
                println!("{}", AstPrinter::print_stmt(stmt));
            }
        }
        Ok(_) => {}
        Err(parse_errors) => errors.extend(parse_errors),
    }

    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{}", e);
        }
        std::process::exit(EXIT_COMPILE_ERROR);
    }

    Ok(())
}

fn run_file(filename: &Path) -> Result<()> {
    let source = read_source_or_exit(filename);
    let mut session = Session::new();

    if let Err(e) = session.run(&source) {
        for diagnostic in e.diagnostics() {
            eprintln!("{}", diagnostic);
        }
        debug!("Run failed, exiting with code {}", e.exit_code());
        std::process::exit(e.exit_code());
    }

    info!("Program executed successfully");
    Ok(())
}

fn repl() -> Result<()> {
    let mut session = Session::new();
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!("> ");
        io::stdout().flush().context("Failed to flush prompt")?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let line = line.context("Failed to read from stdin")?;

        // Each line stands alone; an error never poisons the next one.
        if let Err(e) = session.run(&line) {
            for diagnostic in e.diagnostics() {
                eprintln!("{}", diagnostic);
            }
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Some(Commands::Tokenize { filename, json }) => tokenize(&filename, json),
        Some(Commands::Parse { filename }) => parse(&filename),
        Some(Commands::Run { filename }) => run_file(&filename),
        Some(Commands::Repl) | None => repl(),
    }
}
