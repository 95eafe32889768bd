//! Auto-indenting text writer
//!
//! The caller writes fragments of text. The emitter indents by two spaces
//! per nesting level, where a fragment ending in `{` or `[` opens a level and
//! a fragment starting with `}` or `]` closes one.

use std::io::{self, Write};

const INDENT: &str = "  ";

/// Double-quoted string literal with `"` and `\` escaped
pub fn quote(text: &str) -> String {
    let mut quoted = String::with_capacity(text.len() + 2);
    quoted.push('"');
    for c in text.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Bracket-tracking writer over any [`Write`] sink
#[derive(Debug)]
pub struct TextEmitter<W: Write> {
    out: W,
    depth: usize,
    at_line_start: bool,
}

impl<W: Write> TextEmitter<W> {
    /// Wrap a sink
    pub fn new(out: W) -> Self {
        Self {
            out,
            depth: 0,
            at_line_start: true,
        }
    }

    /// Current nesting depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Write a fragment, indenting it if it starts a physical line
    pub fn write(&mut self, fragment: &str) -> io::Result<()> {
        self.emit(fragment, false)
    }

    /// Write a fragment followed by a line break
    pub fn line(&mut self, text: &str) -> io::Result<()> {
        self.emit(text, true)
    }

    fn emit(&mut self, text: &str, newline: bool) -> io::Result<()> {
        let trimmed = text.trim();

        if trimmed.starts_with('}') || trimmed.starts_with(']') {
            debug_assert!(self.depth > 0, "unbalanced closing bracket: {trimmed:?}");
            self.depth = self.depth.saturating_sub(1);
        }

        if self.at_line_start && !text.is_empty() {
            for _ in 0..self.depth {
                self.out.write_all(INDENT.as_bytes())?;
            }
        }
        self.out.write_all(text.as_bytes())?;
        if newline {
            self.out.write_all(b"\n")?;
        }
        self.at_line_start = newline || text.ends_with('\n');

        if trimmed.ends_with('{') || trimmed.ends_with('[') {
            self.depth += 1;
        }
        Ok(())
    }

    /// Flush the sink and return the final depth, zero for balanced output
    pub fn finish(&mut self) -> io::Result<usize> {
        self.out.flush()?;
        Ok(self.depth)
    }

    /// Unwrap the sink
    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(fragments: &[&str]) -> String {
        let mut emitter = TextEmitter::new(Vec::new());
        for fragment in fragments {
            emitter.write(fragment).unwrap();
        }
        assert_eq!(emitter.finish().unwrap(), 0);
        String::from_utf8(emitter.into_inner()).unwrap()
    }

    #[test]
    fn test_nested_indentation() {
        let text = render(&[
            "Transform {\n",
            "children [\n",
            "Shape {\n",
            "}\n",
            "]\n",
            "}\n",
        ]);
        assert_eq!(text, "Transform {\n  children [\n    Shape {\n    }\n  ]\n}\n");
    }

    #[test]
    fn test_fragments_continue_a_line() {
        let text = render(&["group [\n", "1 2 3 -1 ", "4 5 6 -1 ", "\n", "]\n"]);
        assert_eq!(text, "group [\n  1 2 3 -1 4 5 6 -1 \n]\n");
    }

    #[test]
    fn test_inline_definition_opens_one_level() {
        let mut emitter = TextEmitter::new(Vec::new());
        emitter.write("coord ").unwrap();
        emitter.write("DEF COORDS_CUBE ").unwrap();
        emitter.line("Coordinate {").unwrap();
        assert_eq!(emitter.depth(), 1);
        emitter.line("point [").unwrap();
        emitter.line("]").unwrap();
        emitter.line("}").unwrap();
        assert_eq!(emitter.finish().unwrap(), 0);

        let text = String::from_utf8(emitter.into_inner()).unwrap();
        assert_eq!(text, "coord DEF COORDS_CUBE Coordinate {\n  point [\n  ]\n}\n");
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("motor"), "\"motor\"");
        assert_eq!(quote(r#"a "b" \c"#), r#""a \"b\" \\c""#);
    }

    #[test]
    fn test_unclosed_depth_is_reported() {
        let mut emitter = TextEmitter::new(Vec::new());
        emitter.line("WorldInfo {").unwrap();
        assert_eq!(emitter.finish().unwrap(), 1);
    }
}
