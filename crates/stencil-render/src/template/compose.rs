//! Reduces a preload to its top-level definitions.
//!
//! A preload contributes `{% macro %}` and `{% set %}` statements to the
//! shared namespace of a render unit; its other top-level content never
//! runs. [`definitions_only`] keeps those statements verbatim and replaces
//! everything else with just the newlines it contained, so line numbers in
//! later errors still point into the file on disk.

/// Tags that open a block closed by a matching `end<keyword>` tag.
const BLOCK_TAGS: &[&str] = &[
    "if",
    "for",
    "with",
    "filter",
    "block",
    "call",
    "autoescape",
    "macro",
];

/// Returns the top-level definitions of `source`, everything else blanked
/// down to its line breaks.
pub(crate) fn definitions_only(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut open = 0usize;
    let mut keeping = false;

    for token in Tokenizer::new(source) {
        let (raw, tag) = match token {
            Token::Text(raw) | Token::Output(raw) => (raw, None),
            Token::Tag { raw, keyword, rest } => (raw, Some((keyword, rest))),
            Token::Unterminated(raw) => {
                out.push_str(raw);
                continue;
            }
        };

        let defines = open == 0 && matches!(tag, Some(("macro" | "set", _)));
        if keeping || defines {
            out.push_str(raw);
        } else {
            out.extend(raw.chars().filter(|c| *c == '\n'));
        }

        if let Some((keyword, rest)) = tag {
            if opens_block(keyword, rest) {
                open += 1;
                keeping |= defines;
            } else if keyword.starts_with("end") && open > 0 {
                open -= 1;
                if open == 0 {
                    keeping = false;
                }
            }
        }
    }
    out
}

fn opens_block(keyword: &str, rest: &str) -> bool {
    match keyword {
        "set" => is_block_set(rest),
        other => BLOCK_TAGS.contains(&other),
    }
}

/// `{% set x = 1 %}` assigns inline; `{% set x %}...{% endset %}` and
/// `{% set x | upper %}...{% endset %}` capture a block.
fn is_block_set(rest: &str) -> bool {
    rest.chars()
        .find(|c| matches!(c, '=' | '|'))
        .map_or(true, |c| c == '|')
}

/// Token types produced by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    /// Template data between tags.
    Text(&'a str),
    /// `{{ ... }}` or `{# ... #}`.
    Output(&'a str),
    /// `{% keyword rest %}`. A `raw` block spans through its `endraw`.
    Tag {
        raw: &'a str,
        keyword: &'a str,
        rest: &'a str,
    },
    /// An opening delimiter with no close; runs to the end of input.
    Unterminated(&'a str),
}

/// Splits template source on the default MiniJinja delimiters.
struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn take(&mut self, len: usize) -> &'a str {
        let taken = &self.input[self.pos..self.pos + len];
        self.pos += len;
        taken
    }

    fn take_rest(&mut self) -> &'a str {
        let rest = &self.input[self.pos..];
        self.pos = self.input.len();
        rest
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Token<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.input.len() {
            return None;
        }

        let remaining = &self.input[self.pos..];
        let Some(start) = find_opening(remaining) else {
            return Some(Token::Text(self.take_rest()));
        };
        if start > 0 {
            return Some(Token::Text(self.take(start)));
        }

        let token = match &remaining[..2] {
            "{#" => match remaining[2..].find("#}") {
                Some(end) => Token::Output(self.take(end + 4)),
                None => Token::Unterminated(self.take_rest()),
            },
            "{{" => match find_close(&remaining[2..], "}}") {
                Some(end) => Token::Output(self.take(end + 4)),
                None => Token::Unterminated(self.take_rest()),
            },
            _ => match find_close(&remaining[2..], "%}") {
                Some(end) => {
                    let (keyword, rest) = split_keyword(&remaining[2..2 + end]);
                    let len = if keyword == "raw" {
                        match find_endraw(remaining, end + 4) {
                            Some(len) => len,
                            None => return Some(Token::Unterminated(self.take_rest())),
                        }
                    } else {
                        end + 4
                    };
                    Token::Tag {
                        raw: self.take(len),
                        keyword,
                        rest,
                    }
                }
                None => Token::Unterminated(self.take_rest()),
            },
        };
        Some(token)
    }
}

/// Byte offset of the next `{{`, `{%` or `{#`.
fn find_opening(s: &str) -> Option<usize> {
    s.as_bytes()
        .windows(2)
        .position(|w| w[0] == b'{' && matches!(w[1], b'{' | b'%' | b'#'))
}

/// Byte offset of `close` in `s`, skipping over string literals.
fn find_close(s: &str, close: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut quote = None;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(_) if b == b'\\' => i += 1,
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None if b == b'"' || b == b'\'' => quote = Some(b),
            None if bytes[i..].starts_with(close.as_bytes()) => return Some(i),
            None => {}
        }
        i += 1;
    }
    None
}

/// Splits tag contents into its keyword and the remainder, ignoring
/// whitespace-control markers.
fn split_keyword(inner: &str) -> (&str, &str) {
    let inner = inner.trim_start_matches(['-', '+']).trim_start();
    let end = inner
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(inner.len());
    inner.split_at(end)
}

/// Length of `s` up to and including the `{% endraw %}` tag that follows
/// byte offset `from`.
fn find_endraw(s: &str, from: usize) -> Option<usize> {
    let mut search = from;
    while let Some(offset) = s[search..].find("{%") {
        let open = search + offset;
        let end = find_close(&s[open + 2..], "%}")?;
        let (keyword, _) = split_keyword(&s[open + 2..open + 2 + end]);
        if keyword == "endraw" {
            return Some(open + end + 4);
        }
        search = open + 2;
    }
    None
}
