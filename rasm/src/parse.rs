use string_interner::{DefaultBackend, StringInterner};

use crate::lex::{DigitBase, LexOutput, Literal, Span};
use crate::{Arg, Line, Rasm};

#[cfg(test)]
mod test;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected {found:?} at {row}:{span:?}")]
    Unexpected {
        row: usize,
        span: Span,
        found: Literal,
    },
    #[error("unknown input at {row}:{span:?}")]
    Unknown { row: usize, span: Span },
    #[error("integer out of range at {row}:{span:?}")]
    BadInteger { row: usize, span: Span },
    #[error("dangling & at {row}:{span:?}")]
    DanglingDeref { row: usize, span: Span },
    #[error("label after a mnemonic at {row}:{span:?}")]
    LabelAfterInstruction { row: usize, span: Span },
}

#[derive(Debug)]
pub struct Parser<'a> {
    lex: LexOutput<&'a str>,
    si: StringInterner<DefaultBackend>,
    lines: Vec<Line>,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            lex: LexOutput::lex_all(src),
            si: StringInterner::new(),
            lines: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn parse(mut self) -> (Rasm, Vec<ParseError>) {
        for row in 0..self.lex.lines.len() {
            self.parse_line(row);
        }
        (
            Rasm {
                si: self.si,
                lines: self.lines,
            },
            self.errors,
        )
    }

    fn parse_line(&mut self, row: usize) {
        let line = self.lex.lines[row];
        let src = line.line_src(self.lex.src);
        let lits: Vec<(Span, Literal)> = line.line.slice_lit(&self.lex.literals).to_vec();

        let mut mnemonic = None;
        let mut args = Vec::new();
        let mut labeled = false;
        // Words are whitespace-delimited; a literal touching the previous
        // word (gap == false) is not a new operand.
        let mut gap = true;
        let mut i = 0;
        while i < lits.len() {
            let (span, lit) = lits[i];
            if lit == Literal::Whitespace {
                gap = true;
                i += 1;
                continue;
            }
            if !gap {
                self.errors.push(ParseError::Unexpected { row, span, found: lit });
                i += 1;
                continue;
            }
            gap = false;
            match lit {
                Literal::Ident => {
                    // `name:` declares a label; the colon must be attached.
                    if let Some(&(colon, Literal::Colon)) = lits.get(i + 1) {
                        if colon.from == span.to {
                            if mnemonic.is_some() {
                                self.errors
                                    .push(ParseError::LabelAfterInstruction { row, span });
                            } else {
                                let name = self.si.get_or_intern(span.slice(src));
                                self.lines.push(Line::Label { name });
                                labeled = true;
                            }
                            i += 2;
                            continue;
                        }
                    }
                    let sym = self.si.get_or_intern(span.slice(src));
                    match mnemonic {
                        None => mnemonic = Some(sym),
                        Some(_) => args.push(Arg::Ident(sym)),
                    }
                }
                Literal::Amp => match lits.get(i + 1) {
                    Some(&(ident, Literal::Ident)) if ident.from == span.to => {
                        if mnemonic.is_none() {
                            self.errors.push(ParseError::Unexpected {
                                row,
                                span,
                                found: lit,
                            });
                        } else {
                            let sym = self.si.get_or_intern(ident.slice(src));
                            args.push(Arg::Deref(sym));
                        }
                        i += 2;
                        continue;
                    }
                    _ => self.errors.push(ParseError::DanglingDeref { row, span }),
                },
                Literal::Digit(base) => {
                    if mnemonic.is_none() {
                        self.errors.push(ParseError::Unexpected { row, span, found: lit });
                    } else {
                        match parse_int(span.slice(src), base) {
                            Some(value) => args.push(Arg::Int(value)),
                            None => self.errors.push(ParseError::BadInteger { row, span }),
                        }
                    }
                }
                Literal::Colon => {
                    self.errors.push(ParseError::Unexpected { row, span, found: lit })
                }
                Literal::Other => self.errors.push(ParseError::Unknown { row, span }),
                Literal::Whitespace => {}
            }
            i += 1;
        }

        if let Some(mnemonic) = mnemonic {
            self.lines.push(Line::Instruction { mnemonic, args });
        } else if !labeled {
            self.lines.push(Line::Empty);
        }
    }
}

fn parse_int(text: &str, base: DigitBase) -> Option<i64> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let digits = match base {
        DigitBase::Decimal => rest,
        DigitBase::Binary => rest.strip_prefix("0b")?,
        DigitBase::Octal => rest.strip_prefix("0o")?,
        DigitBase::Hex => rest.strip_prefix("0x")?,
    };
    let digits: String = digits.chars().filter(|&c| c != '_').collect();
    let magnitude = i128::from_str_radix(&digits, base.radix()).ok()?;
    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value).ok()
}
