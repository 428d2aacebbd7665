use super::{LexLine, LineKind, Literal, Span};

#[derive(Debug, Default)]
pub struct Context {
    literals: Vec<(Span, Literal)>,
    kind: LineKind,
    lit_start: u32,
}

impl Context {
    pub fn line(&mut self) -> LexLine {
        let line = LexLine {
            kind: self.kind,
            literals: (self.lit_start, self.literals.len() as u32),
            comment: None,
        };
        self.kind = LineKind::Empty;
        self.lit_start = self.literals.len() as u32;
        line
    }

    pub fn push_lit(&mut self, span: impl Spanned, lit: Literal) {
        use LineKind::*;
        use Literal::*;
        let span = span.spanned();
        match (lit, self.kind) {
            (Ident, Empty) => self.kind = Instruction,
            (Colon, Instruction) => self.kind = Label,
            (Ident, Label) => self.kind = Instruction,
            _ => (),
        }
        if let Whitespace = lit {
            self.combined(span, lit);
            return;
        }
        self.literals.push((span, lit));
    }

    fn combined(&mut self, span: Span, lit: Literal) {
        if let Some((orig, orig_lit)) = self.literals.last_mut() {
            if *orig_lit == lit && orig.to == span.from {
                orig.to = span.to;
                return;
            }
        }
        self.literals.push((span, lit));
    }

    pub fn parts(self) -> Vec<(Span, Literal)> {
        self.literals
    }

    pub fn reset(&mut self) {
        self.kind = LineKind::Empty;
        self.lit_start = self.literals.len() as u32;
    }
}

pub trait Spanned {
    fn spanned(self) -> Span;
}
impl Spanned for Span {
    fn spanned(self) -> Span {
        self
    }
}
impl Spanned for u32 {
    fn spanned(self) -> Span {
        Span::point(self)
    }
}
impl Spanned for (u32, u32) {
    fn spanned(self) -> Span {
        Span::new(self.0, self.1)
    }
}
