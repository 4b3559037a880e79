use std::fs;
use std::io::{self, Cursor};
use std::path::Path;
use ffs::{compile, Config, FfsError, Interpreter};

fn run(program: &[u8], input: &[u8], expected: &[u8]) -> Result<(), FfsError> {

    // Compile the source
    let source = String::from_utf8_lossy(program);
    let program = compile(&source, 8, None)?;

    // Prepare an interpreter to run the instructions
    let mut interpreter =
        Interpreter::builder()
        .config(&Config::default())
        .input(Cursor::new(input))
        .output(Cursor::new(Vec::new()))
        .error_output(io::sink())
        .build();

    // Aaaaand, run!
    interpreter.run(&program)?;

    // Check that the output of the interpreter matches the expected one
    let actual = interpreter.output().unwrap().get_ref();
    if actual.as_slice() != expected {
        return Err(FfsError::internal(format!(
            "Mismatching output: expected {:?}, got {:?}",
            String::from_utf8_lossy(expected),
            String::from_utf8_lossy(actual)
        )));
    }

    Ok(())

}

// A test for each program

macro_rules! test_program {
    ($name:ident) => {
        paste::item! {
            #[test]
            fn [<test_ $name>]() {
                let program = include_bytes!(concat!("./programs/", stringify!($name), ".ffs"));
                let input = include_bytes!(concat!("./programs/", stringify!($name), ".ffs.in"));
                let output = include_bytes!(concat!("./programs/", stringify!($name), ".ffs.out"));
                run(program, input, output).unwrap();
            }
        }
    };
}

test_program!(hello_world);
test_program!(echo);
test_program!(constants);
test_program!(grid);
test_program!(eof_sentinel);

// Every program dropped in the directory must come with its fixtures and pass

#[test]
fn test_all_programs() {
    let pattern = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/programs/*.ffs");
    let mut count = 0;
    for entry in glob::glob(&pattern.to_string_lossy()).unwrap() {
        let path = entry.unwrap();
        let program = fs::read(&path).unwrap();
        let input = fs::read(path.with_extension("ffs.in")).unwrap();
        let output = fs::read(path.with_extension("ffs.out")).unwrap();
        if let Err(e) = run(&program, &input, &output) {
            panic!("{}: {}", path.display(), e);
        }
        count += 1;
    }
    assert!(count >= 5);
}
