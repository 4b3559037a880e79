use std::fmt;
use crate::config::MAX_REPEAT;
use crate::error::{ErrorKind, FfsError, SourceLocation};

/// Primitive operations understood by the virtual machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Right,
    Left,
    Add,
    Sub,
    Output,
    Input,
    JumpIfZero,
    JumpIfNonZero,
    ZeroIfEof,
    Debug,
    Clear
}

impl Op {

    /// Maps a single-character operator to its operation.
    pub fn from_symbol(c: u8) -> Option<Op> {
        use Op::*;
        match c {
            b'>' => Some(Right),
            b'<' => Some(Left),
            b'+' => Some(Add),
            b'-' => Some(Sub),
            b'.' => Some(Output),
            b',' => Some(Input),
            b'[' => Some(JumpIfZero),
            b']' => Some(JumpIfNonZero),
            b'?' => Some(ZeroIfEof),
            b'!' => Some(Debug),
            _    => None
        }
    }

    pub fn name(self) -> &'static str {
        use Op::*;
        match self {
            Right         => "inc-ptr",
            Left          => "dec-ptr",
            Add           => "inc",
            Sub           => "dec",
            Output        => "out",
            Input         => "in",
            JumpIfZero    => "jz",
            JumpIfNonZero => "jnz",
            ZeroIfEof     => "zero-if-eof",
            Debug         => "dbg",
            Clear         => "clear"
        }
    }

    pub fn is_jump(self) -> bool {
        self == Op::JumpIfZero || self == Op::JumpIfNonZero
    }

}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single instruction of a compiled program.
///
/// `arg` is a repeat count for most operations, the width of the window for [`Op::Debug`](crate::parser::Op::Debug)
/// and the index of the matching bracket for the two jumps.
/// `offset` is the byte offset of the token in the original source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub op: Op,
    pub arg: usize,
    pub label: Option<String>,
    pub offset: usize
}

impl Instruction {

    pub fn new(op: Op, arg: usize, offset: usize) -> Instruction {
        Instruction {
            op,
            arg,
            label: None,
            offset
        }
    }

    pub fn labeled(op: Op, label: String, offset: usize) -> Instruction {
        Instruction {
            op,
            arg: 1,
            label: Some(label),
            offset
        }
    }

}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {}", self.op, self.arg)?;
        if let Some(ref label) = self.label {
            write!(f, " @{}", label)?;
        }
        Ok(())
    }
}

/// Source text with comments removed.
///
/// Keeps, for every byte of the stripped text, the offset it had in the original source,
/// so that diagnostics can point into the file the user actually wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrippedSource {
    text: String,
    origins: Vec<usize>
}

impl StrippedSource {

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Offset in the original source of the byte at `offset` in the stripped text.
    /// Offsets past the end map to the end of the original source.
    pub fn origin(&self, offset: usize) -> usize {
        match self.origins.get(offset) {
            Some(&o) => o,
            None => self.origins.last().map(|&o| o + 1).unwrap_or(0)
        }
    }

    fn push(&mut self, c: char, origin: usize) {
        self.text.push(c);
        for _ in 0..c.len_utf8() {
            self.origins.push(origin);
        }
    }

}

/// Removes `#` line comments and `/* */` block comments.
///
/// The newline closing a line comment is kept. An unterminated block comment runs to the end of the input.
pub fn strip_comments(source: &str) -> StrippedSource {
    let mut out = StrippedSource {
        text: String::with_capacity(source.len()),
        origins: Vec::with_capacity(source.len())
    };

    let chars: Vec<(usize, char)> = source.char_indices().collect();
    let starts_pair = |i: usize, a: char, b: char| {
        chars[i].1 == a && chars.get(i + 1).map(|&(_, c)| c == b).unwrap_or(false)
    };

    let mut in_block = false;
    let mut i = 0;
    while i < chars.len() {
        let (offset, c) = chars[i];

        if in_block {
            if starts_pair(i, '*', '/') {
                in_block = false;
                i += 1;
            }
        } else if c == '#' {
            while i < chars.len() && chars[i].1 != '\n' {
                i += 1;
            }
            if let Some(&(nl, _)) = chars.get(i) {
                out.push('\n', nl);
            }
        } else if starts_pair(i, '/', '*') {
            in_block = true;
            i += 1;
        } else {
            out.push(c, offset);
        }

        i += 1;
    }

    out
}

fn is_ident(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'-'
}

fn is_number_char(c: u8) -> bool {
    c.is_ascii_hexdigit() || c == b'x' || c == b'X' || c == b'b' || c == b'B'
}

fn scan_while(src: &[u8], start: usize, pred: impl Fn(u8) -> bool) -> usize {
    src[start.min(src.len())..].iter()
        .position(|&c| !pred(c))
        .map(|n| start + n)
        .unwrap_or_else(|| src.len().max(start))
}

/// Parses an optional `x<digits>` repeat suffix starting at `start`.
/// Returns the repeat count and the offset right after the suffix.
fn parse_repeat(src: &[u8], start: usize, stripped: &StrippedSource) -> Result<(usize, usize), FfsError> {
    if src.get(start) != Some(&b'x') {
        return Ok((1, start));
    }

    let end = scan_while(src, start + 1, |c| c.is_ascii_digit());
    if end == start + 1 {
        return Ok((1, start));
    }

    let count = src[start + 1..end].iter().try_fold(0usize, |acc, &d| {
        acc.checked_mul(10)?.checked_add(usize::from(d - b'0'))
    });

    match count {
        Some(n) if n <= MAX_REPEAT => Ok((n, end)),
        _ => Err(
            FfsError::syntax(
                ErrorKind::InvalidNumber,
                format!(
                    "Repeat count {} exceeds the limit of {}",
                    String::from_utf8_lossy(&src[start + 1..end]),
                    MAX_REPEAT
                )
            )
            .with_location(SourceLocation::at(stripped.origin(start + 1)))
            .with_suggestion("Split the repetition into several smaller ones, or use a loop")
        )
    }
}

/// Parses the body of an `=` literal: decimal, `0x` hexadecimal or `b` binary, in the range 0-255.
pub fn parse_number(literal: &str) -> Result<u8, FfsError> {
    let (digits, radix) = if literal.starts_with("0x") || literal.starts_with("0X") {
        if literal.len() == 2 {
            return Err(
                FfsError::syntax(ErrorKind::EmptyNumber, "Hexadecimal number missing digits after '0x'")
                    .with_suggestion("Add hex digits after '0x', e.g., '0xFF' or '0x42'")
            );
        }
        (&literal[2..], 16)
    } else if literal.starts_with('b') || literal.starts_with('B') {
        if literal.len() == 1 {
            return Err(
                FfsError::syntax(ErrorKind::EmptyNumber, "Binary number missing digits after 'b'")
                    .with_suggestion("Add binary digits after 'b', e.g., 'b1010' or 'B101'")
            );
        }
        (&literal[1..], 2)
    } else {
        (literal, 10)
    };

    if !digits.chars().all(|c| c.is_digit(radix)) {
        return Err(
            FfsError::syntax(ErrorKind::InvalidNumber, format!("Invalid number format: {}", literal))
                .with_suggestion("Use decimal (123), hex (0xFF), or binary (b1010) format")
        );
    }

    let out_of_range = || {
        FfsError::syntax(ErrorKind::OutOfRange, format!("Number {} exceeds byte range (0-255)", literal))
            .with_suggestion("Use a number between 0 and 255, or consider using multiple cells")
    };
    let value = u64::from_str_radix(digits, radix).map_err(|_| out_of_range())?;
    if value > 255 {
        return Err(out_of_range());
    }
    Ok(value as u8)
}

/// Turns comment-free source into a flat list of instructions.
///
/// Jump instructions are left unresolved: see [`link_jumps`](crate::linker::link_jumps).
pub fn desugar(stripped: &StrippedSource, debug_width: usize) -> Result<Vec<Instruction>, FfsError> {
    let src = stripped.text().as_bytes();
    let mut code = Vec::new();
    let mut i = 0;

    while i < src.len() {
        let c = src[i];
        let origin = stripped.origin(i);

        if let Some(op) = Op::from_symbol(c) {

            // Labeled brackets never take a repeat suffix
            if op.is_jump() && src.get(i + 1) == Some(&b'@') {
                let end = scan_while(src, i + 2, is_ident);
                if end == i + 2 {
                    trace!("Skipping bracket with empty label at offset {}.", origin);
                    i += 1;
                    continue;
                }
                let label = String::from_utf8_lossy(&src[i + 2..end]).into_owned();
                code.push(Instruction::labeled(op, label, origin));
                i = end;
                continue;
            }

            let arg = if op == Op::Debug { debug_width } else { 1 };
            let (repeat, next) = parse_repeat(src, i + 1, stripped)?;
            code.extend(itertools::repeat_n(Instruction::new(op, arg, origin), repeat));
            i = next;
            continue;
        }

        match c {

            // `=n` is a clear followed by an add
            b'=' => {
                let end = scan_while(src, i + 1, is_number_char);
                if end > i + 1 {
                    let literal = String::from_utf8_lossy(&src[i + 1..end]);
                    let value = parse_number(&literal)
                        .map_err(|e| e.with_location(SourceLocation::at(stripped.origin(i + 1))))?;
                    code.push(Instruction::new(Op::Clear, 0, origin));
                    code.push(Instruction::new(Op::Add, usize::from(value), origin));
                }
                i = end;
            },

            // Label definitions are only for humans
            b':' => {
                i = scan_while(src, i + 1, is_ident);
            },

            _ => {
                i += 1;
            }

        }
    }

    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops(src: &str) -> Vec<(Op, usize)> {
        desugar(&strip_comments(src), 8).unwrap()
            .into_iter()
            .map(|i| (i.op, i.arg))
            .collect()
    }

    fn desugar_err(src: &str) -> FfsError {
        match desugar(&strip_comments(src), 8) {
            Err(e) => e,
            Ok(code) => panic!("Expected an error. Got: {:?}", code)
        }
    }

    #[test]
    fn test_empty_program() {
        assert_eq!(ops(""), vec![]);
    }

    #[test]
    fn test_simple_desugar() {
        use Op::*;
        assert_eq!(ops("+-><.,?"), vec![
            (Add, 1),
            (Sub, 1),
            (Right, 1),
            (Left, 1),
            (Output, 1),
            (Input, 1),
            (ZeroIfEof, 1)
        ]);
    }

    #[test]
    fn test_debug_carries_width() {
        assert_eq!(desugar(&strip_comments("!"), 3).unwrap()[0].arg, 3);
    }

    #[test]
    fn test_repeat_suffix() {
        assert_eq!(ops("+x5"), ops("+++++"));
        assert_eq!(ops(">x2<"), vec![(Op::Right, 1), (Op::Right, 1), (Op::Left, 1)]);
        assert_eq!(ops("+x0"), vec![]);
        assert_eq!(ops("+x"), vec![(Op::Add, 1)]);
    }

    #[test]
    fn test_repeat_overflow() {
        let e = desugar_err("+x999999999999999999999999999");
        assert_eq!(e.kind, ErrorKind::InvalidNumber);
        assert_eq!(e.location.unwrap().offset, 2);
    }

    #[test]
    fn test_repeat_limit() {
        assert_eq!(ops("+x1000000").len(), MAX_REPEAT);

        let e = desugar_err("++ +x1000000000000");
        assert_eq!(e.kind, ErrorKind::InvalidNumber);
        assert_eq!(e.location.unwrap().offset, 5);
        assert_eq!(desugar_err("+x1000001").kind, ErrorKind::InvalidNumber);
    }

    #[test]
    fn test_assignment() {
        assert_eq!(ops("=200"), vec![(Op::Clear, 0), (Op::Add, 200)]);
        assert_eq!(ops("=0xff"), vec![(Op::Clear, 0), (Op::Add, 255)]);
        assert_eq!(ops("=B101"), vec![(Op::Clear, 0), (Op::Add, 5)]);
        assert_eq!(ops("= 5"), vec![]);
    }

    #[test]
    fn test_assignment_errors() {
        assert_eq!(desugar_err("=256").kind, ErrorKind::OutOfRange);
        assert_eq!(desugar_err("=0x").kind, ErrorKind::EmptyNumber);
        assert_eq!(desugar_err("=b").kind, ErrorKind::EmptyNumber);
        assert_eq!(desugar_err("=b102").kind, ErrorKind::InvalidNumber);
        assert_eq!(desugar_err("=12ab").kind, ErrorKind::InvalidNumber);
        assert_eq!(desugar_err("=99999999999999999999999").kind, ErrorKind::OutOfRange);
    }

    #[test]
    fn test_assignment_error_location() {
        let e = desugar_err("++\n  =300");
        assert_eq!(e.location.unwrap().offset, 6);
    }

    #[test]
    fn test_labeled_brackets() {
        let code = desugar(&strip_comments("[@outer_1 ]@outer_1"), 8).unwrap();
        assert_eq!(code.len(), 2);
        assert_eq!(code[0].op, Op::JumpIfZero);
        assert_eq!(code[0].label.as_ref().map(String::as_str), Some("outer_1"));
        assert_eq!(code[1].op, Op::JumpIfNonZero);
        assert_eq!(code[1].label.as_ref().map(String::as_str), Some("outer_1"));
    }

    #[test]
    fn test_labeled_bracket_takes_no_repeat() {
        let code = desugar(&strip_comments("[@a-bx3"), 8).unwrap();
        assert_eq!(code.len(), 1);
        assert_eq!(code[0].label.as_ref().map(String::as_str), Some("a-bx3"));
    }

    #[test]
    fn test_bare_at_is_skipped() {
        assert_eq!(ops("[@ ]@"), vec![]);
        assert_eq!(ops("[@+"), vec![(Op::Add, 1)]);
    }

    #[test]
    fn test_label_definition_is_ignored() {
        assert_eq!(ops(":loop_start+"), vec![(Op::Add, 1)]);
    }

    #[test]
    fn test_unknown_characters_are_ignored() {
        assert_eq!(ops("hello + world"), vec![(Op::Add, 1)]);
    }

    #[test]
    fn test_strip_line_comments() {
        let s = strip_comments("+ # add one, then .\n-");
        assert_eq!(s.text(), "+ \n-");
        assert_eq!(s.origin(3), 20);
        assert_eq!(strip_comments("+#trailing").text(), "+");
    }

    #[test]
    fn test_strip_block_comments() {
        assert_eq!(strip_comments("+/* - . */+").text(), "++");
        assert_eq!(strip_comments("+/* never closed ...").text(), "+");
        assert_eq!(strip_comments("/*/+").text(), "");
    }

    #[test]
    fn test_strip_keeps_other_text() {
        let src = "a/b*c é";
        assert_eq!(strip_comments(src).text(), src);
    }

    #[test]
    fn test_offsets_point_into_original_source() {
        let code = desugar(&strip_comments("/* xx */ +"), 8).unwrap();
        assert_eq!(code[0].offset, 9);
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("0").unwrap(), 0);
        assert_eq!(parse_number("255").unwrap(), 255);
        assert_eq!(parse_number("0X1f").unwrap(), 31);
        assert_eq!(parse_number("b11111111").unwrap(), 255);
        assert_eq!(parse_number("0x100").unwrap_err().kind, ErrorKind::OutOfRange);
    }
}
