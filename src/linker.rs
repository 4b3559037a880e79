use crate::error::{ErrorKind, FfsError, SourceLocation};
use crate::parser::{Instruction, Op};

fn describe(bracket: char, label: &Option<String>) -> String {
    match label {
        Some(ref l) => format!("'{}@{}'", bracket, l),
        None => format!("'{}'", bracket)
    }
}

/// Resolves every `[` / `]` pair so that each one's `arg` is the index of the other.
///
/// Labeled brackets only match brackets with the same label; unlabeled brackets only match unlabeled ones.
pub fn link_jumps(code: &mut [Instruction]) -> Result<(), FfsError> {
    let mut stack: Vec<usize> = Vec::new();

    for i in 0..code.len() {
        match code[i].op {

            Op::JumpIfZero => {
                stack.push(i);
            },

            Op::JumpIfNonZero => {
                let open = match stack.pop() {
                    Some(open) => open,
                    None => {
                        return Err(
                            FfsError::syntax(
                                ErrorKind::UnmatchedBracket,
                                format!("Found {} without matching '['", describe(']', &code[i].label))
                            )
                            .with_location(SourceLocation::at(code[i].offset))
                            .with_suggestion("Add a '[' before this ']' or remove the extra ']'")
                        );
                    }
                };

                if code[open].label != code[i].label {
                    return Err(
                        FfsError::syntax(
                            ErrorKind::MismatchedLabels,
                            format!(
                                "Mismatched labels between {} and {}",
                                describe('[', &code[open].label),
                                describe(']', &code[i].label)
                            )
                        )
                        .with_location(SourceLocation::at(code[i].offset))
                        .with_note(format!("The loop being closed was opened at position {}", code[open].offset))
                        .with_suggestion("Make sure labeled brackets match: [@name ... ]@name")
                    );
                }

                code[open].arg = i;
                code[i].arg = open;
            },

            _ => {}

        }
    }

    if let Some(&open) = stack.last() {
        let mut err = FfsError::syntax(
                ErrorKind::UnmatchedBracket,
                format!("Found {} without matching ']'", describe('[', &code[open].label))
            )
            .with_location(SourceLocation::at(code[open].offset))
            .with_suggestion("Add a ']' to close this '[' or remove the extra '['");
        if stack.len() > 1 {
            err = err.with_note(format!("{} loops are left open", stack.len()));
        }
        return Err(err);
    }

    Ok(())
}
