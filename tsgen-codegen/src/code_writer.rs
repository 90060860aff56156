//! Indentation-tracking writer for generated TypeScript.
//!
//! Indentation is held in an `Rc<Cell<usize>>` so an [`IndentGuard`] can be
//! alive while the writer is borrowed mutably for output.

use std::cell::Cell;
use std::rc::Rc;

/// Indentation unit of generated files.
pub const INDENT: &str = "\t";

/// String builder with automatic indentation.
#[derive(Debug)]
pub struct CodeWriter {
    output: String,
    indent_level: Rc<Cell<usize>>,
    indent_string: String,
    at_line_start: bool,
}

impl Default for CodeWriter {
    fn default() -> Self {
        Self::new(INDENT)
    }
}

impl CodeWriter {
    /// Creates a writer using `indent_string` for one indentation level.
    #[must_use]
    pub fn new(indent_string: impl Into<String>) -> Self {
        Self {
            output: String::new(),
            indent_level: Rc::new(Cell::new(0)),
            indent_string: indent_string.into(),
            at_line_start: true,
        }
    }

    /// Writes text without a newline, indenting at line start.
    pub fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.at_line_start && !text.trim().is_empty() {
            for _ in 0..self.indent_level.get() {
                self.output.push_str(&self.indent_string);
            }
            self.at_line_start = false;
        }
        self.output.push_str(text);
    }

    /// Writes text followed by a newline.
    pub fn writeln(&mut self, text: &str) {
        self.write(text);
        self.output.push('\n');
        self.at_line_start = true;
    }

    /// Writes an empty line.
    pub fn blank_line(&mut self) {
        self.output.push('\n');
        self.at_line_start = true;
    }

    /// Increases indentation while the returned guard is alive.
    #[must_use]
    pub fn indent(&mut self) -> IndentGuard {
        self.indent_level.set(self.indent_level.get() + 1);
        IndentGuard {
            indent_level: Rc::clone(&self.indent_level),
        }
    }

    /// Writes the `opening` line, the indented body and the `closing` line.
    ///
    /// # Errors
    /// Returns the first error produced by `body`.
    pub fn block_with<F, E>(&mut self, opening: &str, closing: &str, body: F) -> Result<(), E>
    where
        F: FnOnce(&mut Self) -> Result<(), E>,
    {
        self.writeln(opening);
        {
            let _indent = self.indent();
            body(self)?;
        }
        self.writeln(closing);
        Ok(())
    }

    /// Writes a brace-delimited block closed by `}`.
    ///
    /// # Errors
    /// Returns the first error produced by `body`.
    pub fn block<F, E>(&mut self, header: &str, body: F) -> Result<(), E>
    where
        F: FnOnce(&mut Self) -> Result<(), E>,
    {
        self.block_with(&format!("{header} {{"), "}", body)
    }

    /// Returns the current indentation level.
    #[must_use]
    pub fn indent_level(&self) -> usize {
        self.indent_level.get()
    }

    /// Returns true if nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    /// Consumes the writer and returns the output.
    #[must_use]
    pub fn into_string(self) -> String {
        self.output
    }

    #[doc(hidden)]
    pub fn write_fmt(&mut self, args: std::fmt::Arguments<'_>) {
        let formatted = args.to_string();
        self.write(&formatted);
    }

    #[doc(hidden)]
    pub fn writeln_fmt(&mut self, args: std::fmt::Arguments<'_>) {
        let formatted = args.to_string();
        self.writeln(&formatted);
    }
}

/// Guard that restores the indentation level when dropped.
#[derive(Debug)]
pub struct IndentGuard {
    indent_level: Rc<Cell<usize>>,
}

impl Drop for IndentGuard {
    fn drop(&mut self) {
        let current = self.indent_level.get();
        self.indent_level.set(current.saturating_sub(1));
    }
}

/// Writes formatted text to a [`CodeWriter`].
#[macro_export]
macro_rules! cw_write {
    ($writer:expr, $($arg:tt)*) => {
        $writer.write_fmt(format_args!($($arg)*))
    };
}

/// Writes formatted text and a newline to a [`CodeWriter`].
#[macro_export]
macro_rules! cw_writeln {
    ($writer:expr, $($arg:tt)*) => {
        $writer.writeln_fmt(format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indentation() {
        let mut w = CodeWriter::new("  ");
        w.writeln("level 0");
        {
            let _indent = w.indent();
            w.writeln("level 1");
            {
                let _indent = w.indent();
                w.writeln("level 2");
            }
            w.writeln("level 1 again");
        }
        w.writeln("level 0 again");

        assert_eq!(
            w.into_string(),
            "level 0\n  level 1\n    level 2\n  level 1 again\nlevel 0 again\n"
        );
    }

    #[test]
    fn test_block_uses_tabs() {
        let mut w = CodeWriter::default();
        w.block("export class Foo", |w| {
            w.writeln("x?: number;");
            Ok::<(), ()>(())
        })
        .expect("block failed");
        assert_eq!(w.into_string(), "export class Foo {\n\tx?: number;\n}\n");
    }

    #[test]
    fn test_block_with_closing() {
        let mut w = CodeWriter::default();
        w.block_with("const a = {", "};", |w| {
            w.writeln("b: 1");
            Ok::<(), ()>(())
        })
        .expect("block failed");
        assert_eq!(w.into_string(), "const a = {\n\tb: 1\n};\n");
    }

    #[test]
    fn test_blank_lines_are_not_indented() {
        let mut w = CodeWriter::default();
        let _indent = w.indent();
        w.writeln("a");
        w.blank_line();
        w.writeln("b");
        assert_eq!(w.into_string(), "\ta\n\n\tb\n");
    }

    #[test]
    fn test_macros() {
        let mut w = CodeWriter::default();
        let name = "age";
        cw_write!(w, "{name}?: ");
        cw_writeln!(w, "{};", "number");
        assert_eq!(w.into_string(), "age?: number;\n");
    }
}
