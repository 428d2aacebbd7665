#[cfg(test)]
mod test;

mod context;

#[derive(Debug)]
pub struct LexOutput<S> {
    pub src: S,
    pub lines: Vec<AssembledLine>,
    pub literals: Vec<(Span, Literal)>,
}

impl<S> LexOutput<S>
where
    S: AsRef<str>,
{
    pub fn lex_all(src: S) -> Self {
        let mut lexer = Lexer::new(src.as_ref());
        let lines: Vec<_> = std::iter::from_fn(|| {
            let line = lexer.line()?;
            let (start, end) = lexer.line_span();
            Some(AssembledLine { start, line, end })
        })
        .collect();
        let literals = lexer.parts();

        Self {
            src,
            lines,
            literals,
        }
    }

    pub fn line_src(&self, line: usize) -> &str {
        self.lines[line].line_src(self.src.as_ref())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AssembledLine {
    pub start: u32,
    pub end: u32,
    pub line: LexLine,
}

impl AssembledLine {
    pub fn line_src<'a>(&self, src: &'a str) -> &'a str {
        &src[self.start as usize..self.end as usize]
    }
}

/// One lexed source line. Literal spans are relative to the line start.
#[derive(Debug, Clone, Copy)]
pub struct LexLine {
    pub kind: LineKind,
    pub literals: (u32, u32),
    pub comment: Option<Span>,
}

impl LexLine {
    pub fn slice_lit<'a, T>(&self, literals: &'a [T]) -> &'a [T] {
        &literals[self.literals.0 as usize..self.literals.1 as usize]
    }
}

#[derive(Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    // NOTE: 'from' must come before 'to' for proper ordering
    pub from: u32,
    pub to: u32,
}

impl std::fmt::Debug for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.from, self.to)
    }
}

impl Span {
    pub fn slice(self, src: &str) -> &str {
        &src[self.from as usize..self.to as usize]
    }
    pub fn point(pos: u32) -> Self {
        Self {
            from: pos,
            to: pos + 1,
        }
    }
    pub fn new(from: u32, to: u32) -> Self {
        Self { from, to }
    }

    pub fn len(&self) -> u32 {
        self.to - self.from
    }
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineKind {
    #[default]
    Empty,
    Label,
    Instruction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Literal {
    Whitespace,
    Digit(DigitBase),
    Ident,
    Colon,
    Amp,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitBase {
    Binary,
    Octal,
    Decimal,
    Hex,
}

impl DigitBase {
    pub fn radix(self) -> u32 {
        match self {
            DigitBase::Binary => 2,
            DigitBase::Octal => 8,
            DigitBase::Decimal => 10,
            DigitBase::Hex => 16,
        }
    }
}

pub use private::Lexer;

mod private {
    use std::str::Chars;

    use super::context::{Context, Spanned};
    use super::{LexLine, Literal};

    #[derive(Debug)]
    pub struct Lexer<'a> {
        rest: &'a str,
        offset: u32,
        line_start: u32,
        line_end: u32,
        context: Context,
        chars: Chars<'a>,
        pos: u32,
    }

    const EOF_CHAR: char = '\0';

    impl<'a> Lexer<'a> {
        pub(crate) fn new(src: &'a str) -> Self {
            Self {
                rest: src,
                offset: 0,
                line_start: 0,
                line_end: 0,
                context: Context::default(),
                chars: "".chars(),
                pos: 0,
            }
        }
        pub(crate) fn parts(self) -> Vec<(super::Span, Literal)> {
            self.context.parts()
        }
        /// Splits like `str::lines`, but tracks byte offsets so a CRLF
        /// terminator does not shift the spans of later lines.
        pub(crate) fn get_line(&mut self) -> Option<&'a str> {
            if self.rest.is_empty() {
                return None;
            }
            self.line_start = self.offset;
            let (raw, step) = match self.rest.find('\n') {
                Some(i) => (&self.rest[..i], i + 1),
                None => (self.rest, self.rest.len()),
            };
            self.rest = &self.rest[step..];
            self.offset += step as u32;
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            self.line_end = self.line_start + line.len() as u32;
            Some(line)
        }
        /// Byte range of the current line's content, terminator excluded.
        pub(crate) fn line_span(&self) -> (u32, u32) {
            (self.line_start, self.line_end)
        }
        pub(crate) fn reset(&mut self, line: &'a str) {
            self.pos = 0;
            self.chars = line.chars();
            self.context.reset();
        }
        pub(crate) fn first(&self) -> char {
            self.chars.clone().next().unwrap_or(EOF_CHAR)
        }
        pub(crate) fn bump(&mut self) -> Option<char> {
            self.pos += 1;
            self.chars.next()
        }
        pub(crate) fn push_lit(&mut self, span: impl Spanned, lit: Literal) {
            self.context.push_lit(span, lit);
        }
        pub(crate) fn line_info(&mut self) -> LexLine {
            self.context.line()
        }
        pub(crate) fn is_eof(&self) -> bool {
            self.chars.as_str().is_empty()
        }
        pub(crate) fn eat_while(&mut self, mut predicate: impl FnMut(char) -> bool) {
            while predicate(self.first()) && !self.is_eof() {
                self.bump();
            }
        }
        pub(crate) fn pos(&self) -> u32 {
            self.pos
        }
    }
}

impl<'a> Lexer<'a> {
    pub fn line(&mut self) -> Option<LexLine> {
        let line = self.get_line()?;
        self.reset(line);
        let comment = loop {
            match self.advance(line) {
                Some(None) => (),
                Some(Some(comment)) => break Some(comment),
                None => break None,
            }
        };
        Some(LexLine {
            comment,
            ..self.line_info()
        })
    }

    fn advance(&mut self, line: &'a str) -> Option<Option<Span>> {
        let pos = self.pos();
        let ch = self.bump()?;
        match ch {
            _ if ch.is_whitespace() => self.push_lit(pos, Literal::Whitespace),
            _ if is_id_start(ch) => {
                self.ident();
                let span = (pos, self.pos());
                self.push_lit(span, Literal::Ident);
            }
            '0'..='9' => {
                let base = self.number(ch);
                let span = (pos, self.pos());
                self.push_lit(span, Literal::Digit(base));
            }
            '-' if self.first().is_ascii_digit() => {
                // Negative literal: the sign is part of the token.
                let digit = self.bump()?;
                let base = self.number(digit);
                let span = (pos, self.pos());
                self.push_lit(span, Literal::Digit(base));
            }
            '&' => self.push_lit(pos, Literal::Amp),
            ':' => self.push_lit(pos, Literal::Colon),
            '#' => return Some(Some(Span::new(pos, line.len() as u32))),
            _ => self.push_lit(pos, Literal::Other),
        }
        Some(None)
    }

    fn ident(&mut self) {
        self.eat_while(is_id_continue);
    }

    fn number(&mut self, first_digit: char) -> DigitBase {
        let mut base = DigitBase::Decimal;
        if first_digit == '0' {
            // Attempt to parse encoding base.
            match self.first() {
                'b' => {
                    base = DigitBase::Binary;
                    self.bump();
                    if !self.eat_decimal_digits() {
                        return DigitBase::Decimal;
                    }
                }
                'o' => {
                    base = DigitBase::Octal;
                    self.bump();
                    if !self.eat_decimal_digits() {
                        return DigitBase::Decimal;
                    }
                }
                'x' => {
                    base = DigitBase::Hex;
                    self.bump();
                    if !self.eat_hexadecimal_digits() {
                        return DigitBase::Decimal;
                    }
                }
                // Not a base prefix; consume additional digits.
                '0'..='9' | '_' => {
                    self.eat_decimal_digits();
                }
                // Just a 0.
                _ => return DigitBase::Decimal,
            }
        } else {
            // No base prefix, parse number in the usual way.
            self.eat_decimal_digits();
        };
        base
    }

    fn eat_decimal_digits(&mut self) -> bool {
        let mut has_digits = false;
        loop {
            match self.first() {
                '_' => {
                    self.bump();
                }
                '0'..='9' => {
                    has_digits = true;
                    self.bump();
                }
                _ => break,
            }
        }
        has_digits
    }

    fn eat_hexadecimal_digits(&mut self) -> bool {
        let mut has_digits = false;
        loop {
            match self.first() {
                '_' => {
                    self.bump();
                }
                '0'..='9' | 'a'..='f' | 'A'..='F' => {
                    has_digits = true;
                    self.bump();
                }
                _ => break,
            }
        }
        has_digits
    }
}

fn is_id_start(first: char) -> bool {
    matches!(first, 'a'..='z' | 'A'..='Z' | '_')
}
fn is_id_continue(ch: char) -> bool {
    matches!(ch, 'a'..='z' | 'A'..='Z' | '_' | '0'..='9')
}
