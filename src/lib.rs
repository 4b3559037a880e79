#[macro_use] extern crate log;

pub mod error;
pub mod parser;
pub mod linker;
pub mod compiler;
pub mod tape;
pub mod interpreter;
pub mod config;
pub mod report;

pub use error::{ErrorCategory, ErrorKind, FfsError, SourceLocation};
pub use parser::{Instruction, Op};
pub use compiler::{compile, compile_file, read_source, Program};
pub use interpreter::{execute, Interpreter, InterpreterBuilder};
pub use config::Config;
