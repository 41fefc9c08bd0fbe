//! Text-only script reformatting used when no pretty-printing engine is ready.
//!
//! Does not parse the language. Breaks lines after `;`, `{` and `}`, then
//! re-indents by brace depth (two spaces per level). String literals and
//! comments are left intact; `;` inside `(...)` does not break, so `for`
//! headers stay on one line. Running it on its own output changes nothing.

const INDENT: &str = "  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Code,
    Str(char),
    LineComment,
    BlockComment,
}

struct Line {
    text: String,
    depth: usize,
}

struct Splitter {
    lines: Vec<Line>,
    current: String,
    line_depth: Option<usize>,
    depth: usize,
    paren: usize,
    /// Paren depth saved at each open brace.
    paren_stack: Vec<usize>,
}

impl Splitter {
    fn new() -> Self {
        Self {
            lines: Vec::new(),
            current: String::new(),
            line_depth: None,
            depth: 0,
            paren: 0,
            paren_stack: Vec::new(),
        }
    }

    fn push(&mut self, c: char) {
        if self.current.is_empty() {
            if c == ' ' || c == '\t' {
                return;
            }
            self.line_depth = Some(self.depth);
        }
        self.current.push(c);
    }

    fn end_line(&mut self) {
        let text = self.current.trim().to_string();
        let depth = self.line_depth.take().unwrap_or(self.depth);
        self.lines.push(Line { text, depth });
        self.current.clear();
    }

    fn open_brace(&mut self) {
        self.push('{');
        self.depth += 1;
        self.paren_stack.push(self.paren);
        self.paren = 0;
    }

    fn close_brace(&mut self) {
        if !self.current.trim().is_empty() {
            self.end_line();
        }
        self.depth = self.depth.saturating_sub(1);
        self.paren = self.paren_stack.pop().unwrap_or(0);
        self.push('}');
    }
}

/// Skips spaces/tabs (and one line ending) from `i`; returns the new index.
fn skip_to_break(chars: &[char], mut i: usize) -> usize {
    while i < chars.len() && matches!(chars[i], ' ' | '\t' | '\r') {
        i += 1;
    }
    if i < chars.len() && chars[i] == '\n' {
        i += 1;
    }
    i
}

fn next_significant(chars: &[char], mut i: usize) -> Option<char> {
    while i < chars.len() && matches!(chars[i], ' ' | '\t' | '\r') {
        i += 1;
    }
    chars.get(i).copied()
}

/// Reformats `code` line by line. Total; never fails.
pub fn heuristic_format(code: &str) -> String {
    let chars: Vec<char> = code.chars().collect();
    let mut s = Splitter::new();
    let mut mode = Mode::Code;
    let mut escaped = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();
        i += 1;

        if c == '\r' {
            continue;
        }

        match mode {
            Mode::Str(q) => {
                if c == '\n' {
                    s.end_line();
                    // A backslash before the newline continues the literal.
                    if q != '`' && !escaped {
                        mode = Mode::Code;
                    }
                    escaped = false;
                    continue;
                }
                s.push(c);
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == q {
                    mode = Mode::Code;
                }
            }
            Mode::LineComment => {
                if c == '\n' {
                    s.end_line();
                    mode = Mode::Code;
                } else {
                    s.push(c);
                }
            }
            Mode::BlockComment => {
                if c == '\n' {
                    s.end_line();
                    continue;
                }
                s.push(c);
                if c == '*' && next == Some('/') {
                    s.push('/');
                    i += 1;
                    mode = Mode::Code;
                }
            }
            Mode::Code => match c {
                '\n' => s.end_line(),
                '"' | '\'' | '`' => {
                    s.push(c);
                    mode = Mode::Str(c);
                }
                '/' if next == Some('/') => {
                    s.push(c);
                    mode = Mode::LineComment;
                }
                '/' if next == Some('*') => {
                    s.push(c);
                    s.push('*');
                    i += 1;
                    mode = Mode::BlockComment;
                }
                '(' => {
                    s.paren += 1;
                    s.push(c);
                }
                ')' => {
                    s.paren = s.paren.saturating_sub(1);
                    s.push(c);
                }
                '{' => {
                    s.open_brace();
                    i = skip_to_break(&chars, i);
                    s.end_line();
                }
                '}' => {
                    s.close_brace();
                    if !matches!(next_significant(&chars, i), Some(';' | ',' | ')')) {
                        i = skip_to_break(&chars, i);
                        s.end_line();
                    }
                }
                ';' => {
                    s.push(c);
                    if s.paren == 0 {
                        i = skip_to_break(&chars, i);
                        s.end_line();
                    }
                }
                _ => s.push(c),
            },
        }
    }
    if !s.current.trim().is_empty() {
        s.end_line();
    }

    render(&s.lines)
}

/// Indents lines and collapses blank runs; no leading or trailing blanks.
fn render(lines: &[Line]) -> String {
    let mut out = String::new();
    let mut pending_blank = false;
    for line in lines {
        if line.text.is_empty() {
            pending_blank = !out.is_empty();
            continue;
        }
        if pending_blank {
            out.push('\n');
            pending_blank = false;
        }
        out.push_str(&INDENT.repeat(line.depth));
        out.push_str(&line.text);
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reflows_collapsed_function() {
        let out = heuristic_format("function f(a){if(a){return 1;}else{return 2;}}");
        assert_eq!(
            out,
            "function f(a){\n  if(a){\n    return 1;\n  }\n  else{\n    return 2;\n  }\n}\n"
        );
    }

    #[test]
    fn strings_and_comments_untouched() {
        let out = heuristic_format("var s = \"a;b{c}\"; x(); // done; really\ny();");
        assert_eq!(out, "var s = \"a;b{c}\";\nx();\n// done; really\ny();\n");
    }

    #[test]
    fn line_continuation_stays_inside_string() {
        let input = "var s = \"a;\\\nb{c};\"; x();";
        let out = heuristic_format(input);
        assert_eq!(out, "var s = \"a;\\\nb{c};\";\nx();\n");
        assert_eq!(heuristic_format(&out), out);

        let single = heuristic_format("f('x\\\n;y'); g();");
        assert_eq!(single, "f('x\\\n;y');\ng();\n");
    }

    #[test]
    fn for_header_stays_on_one_line() {
        let out = heuristic_format("for (var i = 0; i < 3; i++) { f(i); }");
        assert_eq!(out, "for (var i = 0; i < 3; i++) {\n  f(i);\n}\n");
    }

    #[test]
    fn callbacks_split_inside_parens() {
        let out = heuristic_format("foo(function(){x();y();});");
        assert_eq!(out, "foo(function(){\n  x();\n  y();\n});\n");
    }

    #[test]
    fn object_literal_closes_on_own_line() {
        let out = heuristic_format("var o = {a: 1, b: 2};");
        assert_eq!(out, "var o = {\n  a: 1, b: 2\n};\n");
    }

    #[test]
    fn collapses_blank_runs() {
        let out = heuristic_format("a();\n\n\n\nb();\n\n");
        assert_eq!(out, "a();\n\nb();\n");
    }

    #[test]
    fn reindents_existing_lines() {
        let out = heuristic_format("if (x) {\n        go();\n    }\n");
        assert_eq!(out, "if (x) {\n  go();\n}\n");
    }

    #[test]
    fn idempotent_on_own_output() {
        let inputs = [
            "function f(a){if(a){return 1;}else{return 2;}}",
            "foo(function(){x();y();}); var o = {a: 1}; /* c; { */ z();",
            "for (var i = 0; i < 3; i++) { f(i); }\n\n\n// tail",
            "class A { m() { return `t;${1}`; } }",
        ];
        for input in inputs {
            let once = heuristic_format(input);
            assert_eq!(heuristic_format(&once), once, "input: {}", input);
        }
    }

    #[test]
    fn empty_and_blank_input() {
        assert_eq!(heuristic_format(""), "");
        assert_eq!(heuristic_format("  \n\t\n"), "");
    }

    #[test]
    fn unbalanced_braces_do_not_panic() {
        let out = heuristic_format("}}} a(); {{");
        assert!(out.contains("a();"));
    }
}
