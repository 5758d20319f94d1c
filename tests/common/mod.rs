#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::interpreter::Interpreter;
use rox::session::{RunError, Session};

/// A `Write` sink whose contents stay readable after the interpreter has
/// taken ownership of it.
#[derive(Clone, Default)]
pub struct Capture(Rc<RefCell<Vec<u8>>>);

impl Capture {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_owned).collect()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A session whose `print` output is captured.
pub fn session() -> (Session, Capture) {
    let capture = Capture::default();
    let session = Session::with_interpreter(Interpreter::with_output(capture.clone()));
    (session, capture)
}

/// Run `source` in a fresh session, returning printed lines and the outcome.
pub fn run(source: &str) -> (Vec<String>, Result<(), RunError>) {
    let (mut session, capture) = session();
    let outcome = session.run(source);
    (capture.lines(), outcome)
}

/// Run `source`, asserting success, and return the printed lines.
pub fn run_ok(source: &str) -> Vec<String> {
    let (lines, outcome) = run(source);
    if let Err(e) = outcome {
        let rendered: Vec<String> = e.diagnostics().iter().map(|d| d.to_string()).collect();
        panic!("program failed: {:?}", rendered);
    }
    lines
}

/// Rendered diagnostics of a failed run.
pub fn diagnostics(outcome: &Result<(), RunError>) -> Vec<String> {
    match outcome {
        Ok(()) => Vec::new(),
        Err(e) => e.diagnostics().iter().map(|d| d.to_string()).collect(),
    }
}
