//! Everything a call expression can invoke: host functions, user closures
//! and classes (which construct instances).

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use log::debug;

use crate::ast::FunctionDecl;
use crate::class::{Instance, LoxClass};
use crate::environment::Environment;
use crate::error::{LoxError, RuntimeErrorKind};
use crate::interpreter::{InterpretError, Interpreter};
use crate::token::Token;
use crate::value::Value;

/// Signature of a host‑provided function.  Errors are plain messages; the
/// interpreter attributes them to the call site.
pub type NativeFn = fn(&[Value]) -> Result<Value, String>;

#[derive(Clone)]
pub enum Callable {
    Native(Rc<NativeFunction>),
    Function(Rc<LoxFunction>),
    Class(Rc<LoxClass>),
}

impl Callable {
    pub fn arity(&self) -> usize {
        match self {
            Callable::Native(native) => native.arity,
            Callable::Function(function) => function.arity(),
            // No user-declared constructors.
            Callable::Class(_) => 0,
        }
    }

    /// Invoke with arguments whose count the caller has already checked
    /// against [`Callable::arity`].
    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> Result<Value, InterpretError> {
        match self {
            Callable::Native(native) => {
                debug!("Calling native function '{}'", native.name);

                (native.func)(&arguments).map_err(|message| {
                    LoxError::runtime(paren, RuntimeErrorKind::Native(message)).into()
                })
            }

            Callable::Function(function) => function.call(interpreter, arguments),

            Callable::Class(class) => {
                debug!("Instantiating class '{}'", class.name());

                let instance = Instance::new(Rc::clone(class));
                Ok(Value::Instance(Rc::new(RefCell::new(instance))))
            }
        }
    }

    /// Identity comparison.
    pub fn same(&self, other: &Callable) -> bool {
        match (self, other) {
            (Callable::Native(a), Callable::Native(b)) => Rc::ptr_eq(a, b),
            (Callable::Function(a), Callable::Function(b)) => Rc::ptr_eq(a, b),
            (Callable::Class(a), Callable::Class(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Native(native) => write!(f, "<native fn {}>", native.name),
            Callable::Function(function) => write!(f, "<fn {}>", function.name()),
            Callable::Class(class) => write!(f, "{}", class.name()),
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callable({})", self)
    }
}

pub struct NativeFunction {
    pub name: &'static str,
    pub arity: usize,
    pub func: NativeFn,
}

/// A user function: its declaration plus the environment it closed over.
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: Rc<RefCell<Environment>>) -> Self {
        Self {
            declaration,
            closure,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    /// A copy of this method whose closure gains one extra scope binding
    /// `this` to `instance`.  The unbound method is left untouched.
    pub fn bind(&self, instance: Rc<RefCell<Instance>>) -> LoxFunction {
        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));
        environment.define("this", Value::Instance(instance));

        LoxFunction {
            declaration: Rc::clone(&self.declaration),
            closure: Rc::new(RefCell::new(environment)),
        }
    }

    /// Run the body in a fresh scope enclosed by the *closure*, not the
    /// caller's scope.  A `return` signal ends the call with its value.
    fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
    ) -> Result<Value, InterpretError> {
        debug!("Calling user-defined function '{}'", self.name());

        let mut environment = Environment::with_enclosing(Rc::clone(&self.closure));

        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            environment.define(&param.lexeme, argument);
        }

        let environment = Rc::new(RefCell::new(environment));

        match interpreter.execute_block(&self.declaration.body, environment) {
            Ok(()) => Ok(Value::Nil),
            Err(InterpretError::Return { value, .. }) => {
                debug!("Function '{}' returned: {}", self.name(), value);
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }
}
