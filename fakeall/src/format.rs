// vim: tw=80
//! Writing assertion failure messages.

use std::fmt::Write;

use crate::call::CompletedCall;

/// Builds indented, multi-line diagnostic text.  Every level indents by two
/// spaces; blank lines are never indented.
#[derive(Debug, Default)]
pub(crate) struct DiagnosticWriter {
    out: String,
    level: usize,
}

impl DiagnosticWriter {
    pub fn new() -> Self {
        DiagnosticWriter::default()
    }

    pub fn blank(&mut self) -> &mut Self {
        self.out.push('\n');
        self
    }

    pub fn line(&mut self, text: impl AsRef<str>) -> &mut Self {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.level {
                self.out.push_str("  ");
            }
            self.out.push_str(text);
        }
        self.out.push('\n');
        self
    }

    /// Write whatever `f` writes one level deeper.
    pub fn indented<F>(&mut self, f: F) -> &mut Self
        where F: FnOnce(&mut Self)
    {
        self.level += 1;
        f(self);
        self.level -= 1;
        self
    }

    /// Numbered, 1-based listing of `calls`, one per line.
    pub fn calls(&mut self, calls: &[CompletedCall]) -> &mut Self {
        for (i, call) in calls.iter().enumerate() {
            let mut line = String::new();
            // Writing to a String can't fail
            let _ = write!(line, "{}: {}", i + 1, call);
            self.line(line);
        }
        self
    }

    pub fn finish(self) -> String {
        self.out
    }
}

#[cfg(test)]
mod t {
    use std::sync::Arc;

    use super::*;
    use crate::{
        call::{Call, FakeId},
        history::next_sequence_number,
        method::Method,
        value::arg_value
    };

    #[test]
    fn blank_lines_are_not_indented() {
        let mut w = DiagnosticWriter::new();
        w.indented(|w| {
            w.line("a").line("").indented(|w| {
                w.line("b");
            });
        });
        assert_eq!("  a\n\n    b\n", w.finish());
    }

    #[test]
    fn numbered_calls() {
        let m = Arc::new(Method::new("IFoo", "Bar").with_param::<i32>("x"));
        let calls = (1..=2).map(|x| {
            let call = Call::new(FakeId::next(), m.clone(), vec![arg_value(x)])
                .unwrap();
            CompletedCall::new(call, None, next_sequence_number(), false)
        }).collect::<Vec<_>>();
        let mut w = DiagnosticWriter::new();
        w.calls(&calls);
        assert_eq!("1: IFoo.Bar(x: 1)\n2: IFoo.Bar(x: 2)\n", w.finish());
    }
}
