//! One interpreter session: the unit a driver talks to.
//!
//! A file run is a single call to [`Session::run`]; a REPL calls it once per
//! line.  Globals persist between calls, error state does not.  Expression
//! statements are never echoed: the REPL prints only what `print` prints.

use log::{debug, info};
use thiserror::Error;

use crate::error::LoxError;
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::Scanner;

/// Exit status for compile‑time (lexical, syntax, static) errors.
pub const EXIT_COMPILE_ERROR: i32 = 65;

/// Exit status for an uncaught runtime error.
pub const EXIT_RUNTIME_ERROR: i32 = 70;

/// Why a unit of source did not run to completion.
#[derive(Debug, Error)]
pub enum RunError {
    /// Nothing was executed.  Holds every diagnostic, in source order per
    /// phase (scanner and parser first, then resolver).
    #[error("{} compile error(s)", .0.len())]
    Compile(Vec<LoxError>),

    /// Execution started and stopped at this error.
    #[error(transparent)]
    Runtime(LoxError),
}

impl RunError {
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Compile(_) => EXIT_COMPILE_ERROR,
            RunError::Runtime(_) => EXIT_RUNTIME_ERROR,
        }
    }

    /// The diagnostics to show the user.
    pub fn diagnostics(&self) -> Vec<&LoxError> {
        match self {
            RunError::Compile(errors) => errors.iter().collect(),
            RunError::Runtime(error) => vec![error],
        }
    }
}

pub struct Session {
    interpreter: Interpreter,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// A session printing to stdout.
    pub fn new() -> Self {
        Self::with_interpreter(Interpreter::new())
    }

    pub fn with_interpreter(interpreter: Interpreter) -> Self {
        Self { interpreter }
    }

    /// Scan, parse, resolve and execute one unit of source.
    pub fn run(&mut self, source: &str) -> Result<(), RunError> {
        info!("Running {} byte(s) of source", source.len());

        // Lexical errors do not stop parsing; report everything in one go.
        let (tokens, mut errors) = Scanner::new(source).scan_tokens();

        let statements = match Parser::new(&tokens).parse() {
            Ok(statements) => statements,
            Err(parse_errors) => {
                errors.extend(parse_errors);
                Vec::new()
            }
        };

        if !errors.is_empty() {
            debug!("Skipping execution after {} syntax error(s)", errors.len());
            return Err(RunError::Compile(errors));
        }

        Resolver::new(&mut self.interpreter)
            .resolve(&statements)
            .map_err(RunError::Compile)?;

        self.interpreter
            .interpret(&statements)
            .map_err(RunError::Runtime)
    }
}
