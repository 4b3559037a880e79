use std::io::{self, Write};
use termcolor::{Buffer, Color, ColorSpec, WriteColor};
use crate::error::FfsError;

fn painted(w: &mut impl WriteColor, text: &str, color: Color) -> io::Result<()> {
    w.set_color(ColorSpec::new().set_fg(Some(color)))?;
    write!(w, "{}", text)?;
    w.reset()
}

/// Writes the diagnostic block for `error` to `w`.
///
/// Colours are only emitted when `w` supports them, e.g. a
/// [`StandardStream`](termcolor::StandardStream) built with `ColorChoice::Auto` on a terminal.
pub fn report(error: &FfsError, w: &mut impl WriteColor) -> io::Result<()> {
    painted(w, "error", Color::Red)?;
    writeln!(w, "[{}:{}]: {}", error.category.name(), error.kind.name(), error.message)?;

    if let Some(ref loc) = error.location {
        write!(w, "  ")?;
        painted(w, "-->", Color::Cyan)?;
        writeln!(w, " {}", loc)?;
    }
    if let Some(ref note) = error.note {
        write!(w, "  ")?;
        painted(w, "note:", Color::Blue)?;
        writeln!(w, " {}", note)?;
    }
    if let Some(ref suggestion) = error.suggestion {
        write!(w, "  ")?;
        painted(w, "help:", Color::Green)?;
        writeln!(w, " {}", suggestion)?;
    }

    writeln!(w)?;
    w.flush()
}

/// Renders the diagnostic block for `error` as plain text.
pub fn render(error: &FfsError) -> String {
    let mut buf = Buffer::no_color();
    // Writing into memory cannot fail
    let _ = report(error, &mut buf);
    String::from_utf8_lossy(buf.as_slice()).into_owned()
}
