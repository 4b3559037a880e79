use std::io::{self, Cursor, Write};
use tempfile::NamedTempFile;
use ffs::{compile, compile_file, execute, Config, ErrorCategory, ErrorKind, FfsError, Interpreter, Op};

fn run_with(prog: &str, input: &[u8], config: &Config) -> Result<Vec<u8>, FfsError> {
    let program = compile(prog, config.debug_width, None)?;
    let mut output = Vec::new();
    let status = execute(&program, config, Cursor::new(input), &mut output, io::sink())?;
    assert_eq!(status, 0);
    Ok(output)
}

fn run(prog: &str, input: &[u8]) -> Result<Vec<u8>, FfsError> {
    run_with(prog, input, &Config::default())
}

#[test]
fn test_repeat_then_output() {
    assert_eq!(run("+x65.", b"").unwrap(), b"A");
}

#[test]
fn test_echo() {
    assert_eq!(run(",.", &[0x41]).unwrap(), b"A");
}

#[test]
fn test_echo_at_eof() {
    assert_eq!(run(",.", b"").unwrap(), vec![255]);
}

#[test]
fn test_repeat_matches_unrolled() {
    let rolled = compile("+x5", 8, None).unwrap();
    let unrolled = compile("+++++", 8, None).unwrap();
    let ops = |p: &ffs::Program| p.instructions().iter().map(|i| (i.op, i.arg)).collect::<Vec<_>>();
    assert_eq!(ops(&rolled), ops(&unrolled));
    assert_eq!(ops(&rolled), vec![(Op::Add, 1); 5]);
}

#[test]
fn test_assignment_overrides_previous_value() {
    for prefix in &["", "+", "-", "=0xff", "+x199", "+x201"] {
        let out = run(&format!("{} =200 .", prefix), b"").unwrap();
        assert_eq!(out, vec![200]);
    }
}

#[test]
fn test_modulo_arithmetic() {
    assert_eq!(run("-.", b"").unwrap(), vec![255]);
    assert_eq!(run("=255 + .", b"").unwrap(), vec![0]);
}

#[test]
fn test_labeled_pairs_link() {
    let program = compile("+x2 [@outer > +x3 [@inner - ]@inner < - ]@outer", 8, None).unwrap();
    for (i, ins) in program.instructions().iter().enumerate() {
        if ins.op == Op::JumpIfZero || ins.op == Op::JumpIfNonZero {
            assert_eq!(program.instructions()[ins.arg].arg, i);
        }
    }
}

#[test]
fn test_bracket_errors() {
    let kind = |src: &str| compile(src, 8, None).unwrap_err().kind;
    assert_eq!(kind("+]"), ErrorKind::UnmatchedBracket);
    assert_eq!(kind("[+"), ErrorKind::UnmatchedBracket);
    assert_eq!(kind("[@a - ]@b"), ErrorKind::MismatchedLabels);
    assert!(compile("[@a - ]@a", 8, None).is_ok());
}

#[test]
fn test_clamped_pointer() {
    let config = Config { cells: 3, ..Config::default() };
    let mut interpreter =
        Interpreter::builder()
        .config(&config)
        .input(io::empty())
        .output(io::sink())
        .error_output(io::sink())
        .build();
    interpreter.run(&compile(">x100 +", 8, None).unwrap()).unwrap();
    assert_eq!(interpreter.tape_position(), 2);
    assert_eq!(interpreter.tape(), &[0, 0, 1]);
}

#[test]
fn test_strict_overflow_stops_output() {
    let config = Config { cells: 3, strict: true, ..Config::default() };
    let program = compile("=65 . >x3 .", 8, None).unwrap();
    let mut output = Vec::new();
    let e = execute(&program, &config, io::empty(), &mut output, io::sink()).unwrap_err();
    assert_eq!(e.category, ErrorCategory::Runtime);
    assert_eq!(e.kind, ErrorKind::PointerOverflow);
    assert_eq!(output, b"A");
}

#[test]
fn test_elastic_keeps_data() {
    let config = Config { cells: 4, elastic: true, ..Config::default() };
    let mut interpreter =
        Interpreter::builder()
        .config(&config)
        .input(io::empty())
        .output(io::sink())
        .error_output(io::sink())
        .build();
    interpreter.run(&compile("=1 > =2 > =3 > =4 >x20 =5", 8, None).unwrap()).unwrap();
    assert!(interpreter.tape().len() >= 24);
    assert_eq!(&interpreter.tape()[..4], &[1, 2, 3, 4]);
    assert_eq!(interpreter.tape()[interpreter.tape_position()], 5);
}

#[test]
fn test_debug_output_goes_to_error_stream() {
    let config = Config { debug_width: 3, ..Config::default() };
    let program = compile("=9 !", config.debug_width, None).unwrap();
    let mut output = Vec::new();
    let mut errors = Vec::new();
    execute(&program, &config, io::empty(), &mut output, &mut errors).unwrap();
    assert!(output.is_empty());
    assert_eq!(String::from_utf8(errors).unwrap(), "! ptr=0 cells=[9 0 0]\n");
}

#[test]
fn test_compile_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "# prints B").unwrap();
    writeln!(file, "=0x42 .").unwrap();
    let program = compile_file(file.path(), 8).unwrap();
    assert_eq!(program.len(), 3);
}

#[test]
fn test_compile_file_reports_path() {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "+\n  ]").unwrap();
    let e = compile_file(file.path(), 8).unwrap_err();
    let loc = e.location.unwrap();
    assert_eq!(loc.filename, Some(file.path().display().to_string()));
    assert_eq!((loc.line, loc.column), (2, 3));
}

#[test]
fn test_compile_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let e = compile_file(&dir.path().join("missing.ffs"), 8).unwrap_err();
    assert_eq!(e.category, ErrorCategory::Io);
    assert_eq!(e.kind, ErrorKind::FileNotFound);
    assert!(e.note.unwrap().contains("missing.ffs"));
}
