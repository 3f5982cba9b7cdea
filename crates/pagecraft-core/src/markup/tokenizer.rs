//! A forgiving HTML tokenizer for captured section markup.
//!
//! It only needs to understand the landing-page subset: tags, attributes,
//! comments, doctype, text, and raw-text elements (`script`, `style`).
//! Malformed input never fails; unrecognised `<` becomes text.

/// One attribute of a start tag. `value` is `None` for boolean attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    Text(&'a str),
    Comment(&'a str),
    Doctype(&'a str),
    StartTag {
        name: String,
        attrs: Vec<Attribute>,
        self_closing: bool,
    },
    EndTag {
        name: String,
    },
}

/// Elements that never have children.
pub const VOID_ELEMENTS: [&str; 14] = [
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

const RAW_TEXT_ELEMENTS: [&str; 2] = ["script", "style"];

pub fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

fn is_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'-' || c == b':' || c == b'_' || c == b'.'
}

fn find_ci(haystack: &str, from: usize, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let pat = needle.as_bytes();
    if pat.is_empty() || hay.len() < pat.len() {
        return None;
    }
    (from..=hay.len() - pat.len()).find(|&i| hay[i..i + pat.len()].eq_ignore_ascii_case(pat))
}

struct Cursor<'a> {
    src: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn take_name(&mut self) -> &'a str {
        let start = self.pos;
        while self.peek().is_some_and(is_name_char) {
            self.pos += 1;
        }
        &self.src[start..self.pos]
    }

    /// Parse attributes up to and including the closing `>`.
    fn take_attributes(&mut self) -> (Vec<Attribute>, bool) {
        let mut attrs = Vec::new();
        loop {
            self.skip_ws();
            match self.peek() {
                None => return (attrs, false),
                Some(b'>') => {
                    self.pos += 1;
                    return (attrs, false);
                }
                Some(b'/') => {
                    self.pos += 1;
                    if self.peek() == Some(b'>') {
                        self.pos += 1;
                        return (attrs, true);
                    }
                }
                Some(_) => {
                    let start = self.pos;
                    while self
                        .peek()
                        .is_some_and(|c| !c.is_ascii_whitespace() && !matches!(c, b'=' | b'>' | b'/'))
                    {
                        self.pos += 1;
                    }
                    if self.pos == start {
                        // Stray byte such as a lone quote; skip it.
                        self.pos += 1;
                        continue;
                    }
                    let name = self.src[start..self.pos].to_ascii_lowercase();
                    self.skip_ws();
                    let value = if self.peek() == Some(b'=') {
                        self.pos += 1;
                        self.skip_ws();
                        Some(self.take_value())
                    } else {
                        None
                    };
                    attrs.push(Attribute { name, value });
                }
            }
        }
    }

    fn take_value(&mut self) -> String {
        match self.peek() {
            Some(q @ (b'"' | b'\'')) => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().is_some_and(|c| c != q) {
                    self.pos += 1;
                }
                let value = self.src[start..self.pos].to_string();
                if self.peek().is_some() {
                    self.pos += 1;
                }
                value
            }
            _ => {
                let start = self.pos;
                while self
                    .peek()
                    .is_some_and(|c| !c.is_ascii_whitespace() && c != b'>')
                {
                    self.pos += 1;
                }
                self.src[start..self.pos].to_string()
            }
        }
    }
}

/// Tokenize `input`. Byte offsets always land on char boundaries because
/// every delimiter inspected is ASCII.
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut cur = Cursor {
        src: input,
        bytes: input.as_bytes(),
        pos: 0,
    };
    let mut text_start = 0;

    while cur.pos < cur.bytes.len() {
        if cur.bytes[cur.pos] != b'<' {
            cur.pos += 1;
            continue;
        }

        let lt = cur.pos;
        let rest = &input[lt..];
        let next = cur.bytes.get(lt + 1).copied();

        let is_markup = rest.starts_with("<!")
            || (next == Some(b'/') && cur.bytes.get(lt + 2).is_some_and(|c| c.is_ascii_alphabetic()))
            || next.is_some_and(|c| c.is_ascii_alphabetic());
        if !is_markup {
            cur.pos += 1;
            continue;
        }

        if text_start < lt {
            tokens.push(Token::Text(&input[text_start..lt]));
        }

        if rest.starts_with("<!--") {
            let body_start = lt + 4;
            let end = input[body_start..].find("-->").map(|i| body_start + i);
            match end {
                Some(e) => {
                    tokens.push(Token::Comment(&input[body_start..e]));
                    cur.pos = e + 3;
                }
                None => {
                    tokens.push(Token::Comment(&input[body_start..]));
                    cur.pos = input.len();
                }
            }
        } else if rest.starts_with("<!") {
            let end = input[lt..].find('>').map(|i| lt + i).unwrap_or(input.len());
            tokens.push(Token::Doctype(&input[lt + 2..end]));
            cur.pos = (end + 1).min(input.len());
        } else if next == Some(b'/') {
            cur.pos = lt + 2;
            let name = cur.take_name().to_ascii_lowercase();
            let end = input[cur.pos..]
                .find('>')
                .map(|i| cur.pos + i + 1)
                .unwrap_or(input.len());
            cur.pos = end;
            tokens.push(Token::EndTag { name });
        } else {
            cur.pos = lt + 1;
            let name = cur.take_name().to_ascii_lowercase();
            let (attrs, self_closing) = cur.take_attributes();
            let raw_text = !self_closing && RAW_TEXT_ELEMENTS.contains(&name.as_str());
            tokens.push(Token::StartTag {
                name: name.clone(),
                attrs,
                self_closing,
            });
            if raw_text {
                let closing = format!("</{name}");
                let body_end = find_ci(input, cur.pos, &closing).unwrap_or(input.len());
                if body_end > cur.pos {
                    tokens.push(Token::Text(&input[cur.pos..body_end]));
                }
                cur.pos = body_end;
            }
        }
        text_start = cur.pos;
    }

    if text_start < input.len() {
        tokens.push(Token::Text(&input[text_start..]));
    }
    tokens
}
