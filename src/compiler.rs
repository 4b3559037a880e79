use std::fs::File;
use std::io::Read;
use std::path::Path;
use crate::error::FfsError;
use crate::linker::link_jumps;
use crate::parser::{desugar, strip_comments, Instruction};

/// A compiled program: a flat list of instructions with every jump resolved.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Program {
    pub(crate) instructions: Vec<Instruction>
}

impl Program {

    pub fn instructions(&self) -> &[Instruction] {
        &*self.instructions
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn into_instructions(self) -> Vec<Instruction> {
        self.instructions
    }

}

/// Compiles source text into a [`Program`](crate::compiler::Program).
///
/// `debug_width` is recorded in every `!` instruction, `filename` is only used to tag diagnostics.
pub fn compile(source: &str, debug_width: usize, filename: Option<&str>) -> Result<Program, FfsError> {
    let locate = |e: FfsError| e.locate(source, filename);

    debug!("Stripping comments.");
    let stripped = strip_comments(source);

    debug!("Desugaring {} bytes of source.", stripped.text().len());
    let mut instructions = desugar(&stripped, debug_width).map_err(locate)?;

    debug!("Linking jumps.");
    link_jumps(&mut instructions).map_err(locate)?;

    info!("Compiled {} instructions.", instructions.len());
    Ok(Program { instructions })
}

/// Reads a whole source stream. Invalid UTF-8 is replaced rather than rejected,
/// since everything outside the operator set is ignored anyway.
pub fn read_source(mut r: impl Read) -> Result<String, FfsError> {
    let mut buf = Vec::new();
    r.read_to_end(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Reads and compiles the file at `path`.
pub fn compile_file(path: &Path, debug_width: usize) -> Result<Program, FfsError> {
    let name = path.display().to_string();
    debug!("Opening {}.", name);

    let source = File::open(path)
        .map_err(FfsError::from)
        .and_then(|file| read_source(file))
        .map_err(|e| e.with_note(format!("File: {}", name)))?;

    compile(&source, debug_width, Some(&name))
}
