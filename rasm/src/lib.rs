use string_interner::{DefaultBackend, DefaultSymbol, StringInterner};

pub mod lex;
pub mod parse;

pub use self::lex::DigitBase;

/// Index of an instruction within a decoded program.
pub type Address = usize;

/// A parsed program: interned names plus one entry per meaningful source
/// element, in source order.
#[derive(Debug, Default)]
pub struct Rasm {
    pub si: StringInterner<DefaultBackend>,
    pub lines: Vec<Line>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum Line {
    /// A line with no tokens (blank or comment-only).
    Empty,
    /// `name:` — marks the instruction that follows it.
    Label { name: DefaultSymbol },
    /// A mnemonic plus its operand tokens.
    Instruction {
        mnemonic: DefaultSymbol,
        args: Vec<Arg>,
    },
}

/// An operand token. What an `Ident` refers to (register or label) is not
/// known until decode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg {
    Ident(DefaultSymbol),
    /// `&name` — stack-indirect through the named register.
    Deref(DefaultSymbol),
    Int(i64),
}
