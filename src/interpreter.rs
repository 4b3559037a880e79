use std::cmp;
use std::io::{self, Read, Write};
use itertools::Itertools;
use crate::compiler::Program;
use crate::config::{Config, DEFAULT_CELLS, DEFAULT_DEBUG_WIDTH, INSTRUCTION_LIMIT, MAX_TAPE_CELLS};
use crate::error::{ErrorKind, FfsError};
use crate::parser::{Instruction, Op};
use crate::tape::Tape;

/// Byte stored in a cell when `,` hits the end of the input.
pub const EOF_SENTINEL: u8 = 255;

/// Builder for the [`Interpreter`](crate::interpreter::Interpreter) struct.
pub struct InterpreterBuilder<R, W, E>
    where R: Read,
          W: Write,
          E: Write
{
    tape_size: usize,
    max_tape_size: usize,
    instruction_limit: u64,
    elastic: bool,
    strict: bool,
    debug_width: usize,
    trace: bool,
    input: Option<R>,
    output: Option<W>,
    error_output: Option<E>
}

impl<R, W, E> Default for InterpreterBuilder<R, W, E>
    where R: Read,
          W: Write,
          E: Write
{
    fn default() -> Self {
        InterpreterBuilder::new()
    }
}

impl<R, W, E> InterpreterBuilder<R, W, E>
    where R: Read,
          W: Write,
          E: Write
{

    /// Creates a new [`InterpreterBuilder`](crate::interpreter::InterpreterBuilder) with the default settings.
    pub fn new() -> InterpreterBuilder<R, W, E> {
        InterpreterBuilder {
            tape_size: DEFAULT_CELLS,
            max_tape_size: MAX_TAPE_CELLS,
            instruction_limit: INSTRUCTION_LIMIT,
            elastic: false,
            strict: false,
            debug_width: DEFAULT_DEBUG_WIDTH,
            trace: false,
            input: None,
            output: None,
            error_output: None
        }
    }

    /// Sets the initial tape size. Zero selects the default size.
    pub fn tape_size(&mut self, tape_size: usize) -> &mut Self {
        self.tape_size = if tape_size == 0 { DEFAULT_CELLS } else { tape_size };
        self
    }

    /// Sets the size the tape may grow to in elastic mode.
    pub fn max_tape_size(&mut self, max_tape_size: usize) -> &mut Self {
        self.max_tape_size = max_tape_size;
        self
    }

    /// Sets how many instructions may be executed before the run is aborted.
    pub fn instruction_limit(&mut self, limit: u64) -> &mut Self {
        self.instruction_limit = limit;
        self
    }

    /// Lets the tape grow when the pointer moves past its end.
    pub fn elastic(&mut self, elastic: bool) -> &mut Self {
        self.elastic = elastic;
        self
    }

    /// Turns pointer moves past either end of the tape into errors instead of no-ops.
    pub fn strict(&mut self, strict: bool) -> &mut Self {
        self.strict = strict;
        self
    }

    /// Sets the window width used by `!` instructions that do not carry one.
    pub fn debug_width(&mut self, debug_width: usize) -> &mut Self {
        self.debug_width = debug_width;
        self
    }

    /// Prints a line to the error stream before each executed instruction.
    pub fn trace(&mut self, trace: bool) -> &mut Self {
        self.trace = trace;
        self
    }

    /// Sets the stream that will be used as input for the `,` instruction.
    pub fn input(&mut self, input: R) -> &mut Self {
        self.input = Some(input);
        self
    }

    /// Sets the stream that will be used as output for the `.` instruction.
    pub fn output(&mut self, output: W) -> &mut Self {
        self.output = Some(output);
        self
    }

    /// Sets the stream receiving `!` dumps and trace lines.
    pub fn error_output(&mut self, error_output: E) -> &mut Self {
        self.error_output = Some(error_output);
        self
    }

    /// Copies the virtual machine settings of a [`Config`](crate::config::Config).
    pub fn config(&mut self, config: &Config) -> &mut Self {
        self.tape_size(config.cells)
            .elastic(config.elastic)
            .strict(config.strict)
            .debug_width(config.debug_width)
            .trace(config.trace)
    }

    /// Builds the actual [`Interpreter`](crate::interpreter::Interpreter).
    pub fn build(&mut self) -> Interpreter<R, W, E> {
        Interpreter {
            tape: Tape::new(self.tape_size, self.max_tape_size),
            tape_size: self.tape_size,
            tape_position: 0,
            executed: 0,
            instruction_limit: self.instruction_limit,
            elastic: self.elastic,
            strict: self.strict,
            debug_width: self.debug_width,
            trace: self.trace,
            input: self.input.take(),
            output: self.output.take(),
            error_output: self.error_output.take()
        }
    }

}

pub struct Interpreter<R, W, E>
    where R: Read,
          W: Write,
          E: Write
{
    tape: Tape,
    tape_size: usize,
    tape_position: usize,
    executed: u64,
    instruction_limit: u64,
    elastic: bool,
    strict: bool,
    debug_width: usize,
    trace: bool,
    input: Option<R>,
    output: Option<W>,
    error_output: Option<E>
}

impl<R, W, E> Default for Interpreter<R, W, E>
    where R: Read,
          W: Write,
          E: Write
{
    fn default() -> Self {
        Interpreter::new()
    }
}

impl<R, W, E> Interpreter<R, W, E>
    where R: Read,
          W: Write,
          E: Write
{

    /// Builds an [`Interpreter`](crate::interpreter::Interpreter) with the default settings.
    pub fn new() -> Interpreter<R, W, E> {
        InterpreterBuilder::new().build()
    }

    /// Creates an [`InterpreterBuilder`](crate::interpreter::InterpreterBuilder) to configure
    /// a new [`Interpreter`](crate::interpreter::Interpreter).
    pub fn builder() -> InterpreterBuilder<R, W, E> {
        InterpreterBuilder::new()
    }

    /// Returns the cells of the tape, including those added by elastic growth.
    pub fn tape(&self) -> &[u8] {
        self.tape.cells()
    }

    /// Returns the position of the data pointer on the tape.
    pub fn tape_position(&self) -> usize {
        self.tape_position
    }

    /// Returns the number of instructions executed by the last run.
    pub fn executed(&self) -> u64 {
        self.executed
    }

    pub fn input(&self) -> Option<&R> {
        self.input.as_ref()
    }

    pub fn output(&self) -> Option<&W> {
        self.output.as_ref()
    }

    pub fn error_output(&self) -> Option<&E> {
        self.error_output.as_ref()
    }

    /// Executes the given program in this [`Interpreter`](crate::interpreter::Interpreter).
    ///
    /// Every run starts on a fresh zeroed tape of the configured size, with the pointer on cell 0.
    /// The tape of the last run stays readable through [`tape`](crate::interpreter::Interpreter::tape).
    pub fn run(&mut self, program: &Program) -> Result<(), FfsError> {
        let code = program.instructions();
        let mut pc = 0;
        self.tape.reset(self.tape_size);
        self.tape_position = 0;
        self.executed = 0;

        while pc < code.len() {
            let inst = &code[pc];

            self.executed += 1;
            if self.executed > self.instruction_limit {
                return Err(
                    FfsError::runtime(
                        ErrorKind::InstructionLimitExceeded,
                        format!("Program exceeded {} executed instructions", self.instruction_limit)
                    )
                    .with_note(format!("Stopped at instruction {} ({})", pc, inst))
                    .with_suggestion("Check for a loop whose counter never reaches zero")
                );
            }

            if self.trace {
                let line = format!(
                    "pc={} op={} arg={} ptr={} cell={}\n",
                    pc, inst.op, inst.arg, self.tape_position, self.tape[self.tape_position]
                );
                self.write_diagnostic(&line)?;
            }

            match inst.op {

                Op::Right => self.move_right(inst.arg)?,

                Op::Left => self.move_left(inst.arg)?,

                Op::Add => {
                    let value = &mut self.tape[self.tape_position];
                    *value = value.wrapping_add(inst.arg as u8);
                },

                Op::Sub => {
                    let value = &mut self.tape[self.tape_position];
                    *value = value.wrapping_sub(inst.arg as u8);
                },

                Op::Output => {
                    for _ in 0..inst.arg {
                        let byte = self.tape[self.tape_position];
                        if let Some(ref mut output) = self.output {
                            output.write_all(&[byte])
                                .map_err(|e| FfsError::stream("write to the output stream", e))?;
                        }
                    }
                },

                Op::Input => {
                    for _ in 0..inst.arg {
                        let byte = self.read_byte()?.unwrap_or(EOF_SENTINEL);
                        self.tape[self.tape_position] = byte;
                    }
                },

                Op::JumpIfZero => {
                    if self.tape[self.tape_position] == 0 {
                        pc = jump_target(code, pc)?;
                    }
                },

                Op::JumpIfNonZero => {
                    if self.tape[self.tape_position] != 0 {
                        pc = jump_target(code, pc)?;
                    }
                },

                Op::ZeroIfEof => {
                    if self.tape[self.tape_position] == EOF_SENTINEL {
                        self.tape[self.tape_position] = 0;
                    }
                },

                Op::Debug => {
                    let width = if inst.arg == 0 { self.debug_width } else { inst.arg };
                    let end = cmp::min(self.tape.len(), self.tape_position.saturating_add(width));
                    let line = format!(
                        "! ptr={} cells=[{}]\n",
                        self.tape_position,
                        self.tape.cells()[self.tape_position..end].iter().join(" ")
                    );
                    self.write_diagnostic(&line)?;
                },

                Op::Clear => {
                    self.tape[self.tape_position] = 0;
                }

            }

            pc += 1;
        }

        if let Some(ref mut output) = self.output {
            output.flush().map_err(|e| FfsError::stream("flush the output stream", e))?;
        }

        debug!("Executed {} instructions.", self.executed);
        Ok(())
    }

    fn move_right(&mut self, amount: usize) -> Result<(), FfsError> {
        for _ in 0..amount {
            if self.tape_position + 1 < self.tape.len() {
                self.tape_position += 1;
                continue;
            }

            if self.elastic {
                match self.tape.grow() {
                    Ok(_) => {
                        self.tape_position += 1;
                        continue;
                    },
                    Err(e) => {
                        if self.strict {
                            return Err(
                                FfsError::runtime(
                                    ErrorKind::PointerOverflow,
                                    format!("Pointer moved past the last cell ({})", self.tape_position)
                                )
                                .with_note(e.message)
                                .with_suggestion("Use --cells to start with a larger tape")
                            );
                        }
                    }
                }
            } else if self.strict {
                return Err(
                    FfsError::runtime(
                        ErrorKind::PointerOverflow,
                        format!("Pointer moved past the last cell ({})", self.tape_position)
                    )
                    .with_note(format!("The tape has {} cells", self.tape.len()))
                    .with_suggestion("Use --cells to enlarge the tape or --elastic to let it grow")
                );
            }

            // Clamped: the remaining moves would hit the same wall
            break;
        }
        Ok(())
    }

    fn move_left(&mut self, amount: usize) -> Result<(), FfsError> {
        for _ in 0..amount {
            if self.tape_position > 0 {
                self.tape_position -= 1;
                continue;
            }

            if self.strict {
                return Err(
                    FfsError::runtime(ErrorKind::PointerUnderflow, "Pointer moved before the first cell")
                        .with_suggestion("Check the '<' moves preceding this point")
                );
            }

            break;
        }
        Ok(())
    }

    /// Reads one byte, or `None` at the end of the input.
    fn read_byte(&mut self) -> Result<Option<u8>, FfsError> {
        let input = match self.input {
            Some(ref mut input) => input,
            None => return Ok(None)
        };

        let mut buf = [0u8; 1];
        loop {
            match input.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(FfsError::stream("read from the input stream", e))
            }
        }
    }

    fn write_diagnostic(&mut self, line: &str) -> Result<(), FfsError> {
        if let Some(ref mut error_output) = self.error_output {
            error_output.write_all(line.as_bytes())
                .map_err(|e| FfsError::stream("write to the error stream", e))?;
        }
        Ok(())
    }

}

/// Target of the jump at `pc`, checked against the program bounds.
fn jump_target(code: &[Instruction], pc: usize) -> Result<usize, FfsError> {
    let target = code[pc].arg;
    if target >= code.len() {
        return Err(
            FfsError::runtime(
                ErrorKind::InvalidJumpTarget,
                format!("Jump at instruction {} targets {}, outside of the program", pc, target)
            )
            .with_note(format!("The program has {} instructions", code.len()))
        );
    }
    Ok(target)
}

/// Runs `program` with the virtual machine settings of `config` and returns the exit status.
pub fn execute<R, W, E>(program: &Program, config: &Config, input: R, output: W, error_output: E) -> Result<i32, FfsError>
    where R: Read,
          W: Write,
          E: Write
{
    let mut interpreter =
        Interpreter::builder()
        .config(config)
        .input(input)
        .output(output)
        .error_output(error_output)
        .build();

    debug!("Running program of {} instructions.", program.len());
    interpreter.run(program)?;
    Ok(0)
}
