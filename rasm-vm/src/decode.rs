use rasm::{Arg, Line, Rasm};
use string_interner::{DefaultBackend, DefaultSymbol, StringInterner};

use crate::{ArithOp, Bank, BitOp, Code, Cond, LabelMap, Loc, Op, Operand};
use crate::{ARG_REGISTERS, GP_REGISTERS};

#[cfg(test)]
mod test;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("unknown instruction {mnemonic:?} with {argc} operands")]
    UnknownInstruction { mnemonic: String, argc: usize },
    #[error("unknown operand {token:?}")]
    UnknownOperand { token: String },
    #[error("{mnemonic} needs a writable destination")]
    ExpectedLocation { mnemonic: String },
    #[error("duplicate label {name:?}")]
    DuplicateLabel { name: String },
    #[error("no main label")]
    MissingEntry,
}

/// Lowers parsed lines into executable ops. Labels are collected in a
/// first pass so forward references resolve.
pub fn decode(asm: Rasm) -> (Code, Vec<DecodeError>) {
    let Rasm { si, lines } = asm;
    let decoder = Decoder {
        si,
        ops: Vec::new(),
        labels: LabelMap::new(),
        errors: Vec::new(),
    };
    decoder.decode(lines)
}

#[derive(Debug)]
struct Decoder {
    si: StringInterner<DefaultBackend>,
    ops: Vec<Op>,
    labels: LabelMap,
    errors: Vec<DecodeError>,
}

impl Decoder {
    fn decode(mut self, lines: Vec<Line>) -> (Code, Vec<DecodeError>) {
        // A label maps to the index of the instruction that follows it.
        let mut index = 0;
        for line in &lines {
            match line {
                Line::Label { name } => {
                    if self.labels.insert(*name, index).is_some() {
                        let name = self.name(*name).to_owned();
                        self.errors.push(DecodeError::DuplicateLabel { name });
                    }
                }
                Line::Instruction { .. } => index += 1,
                Line::Empty => {}
            }
        }

        for line in &lines {
            if let Line::Instruction { mnemonic, args } = line {
                if let Some(op) = self.build(*mnemonic, args) {
                    self.ops.push(op);
                }
            }
        }

        let entry = self
            .si
            .get("main")
            .and_then(|sym| self.labels.get(&sym).copied());
        let entry = match entry {
            Some(entry) => entry,
            None => {
                self.errors.push(DecodeError::MissingEntry);
                0
            }
        };

        let code = Code {
            si: self.si,
            ops: self.ops,
            labels: self.labels,
            entry,
        };
        (code, self.errors)
    }

    fn build(&mut self, mnemonic: DefaultSymbol, args: &[Arg]) -> Option<Op> {
        let name = self.name(mnemonic).to_owned();
        let name = name.as_str();
        Some(match *args {
            [dst, a, b] => {
                if let Some(arith) = ArithOp::from_name(name) {
                    Op::Arith3(arith, self.loc(dst, name)?, self.operand(a)?, self.operand(b)?)
                } else {
                    return self.unknown(name, 3);
                }
            }
            [dst, src] => {
                if let Some(arith) = ArithOp::from_name(name) {
                    Op::Arith2(arith, self.loc(dst, name)?, self.operand(src)?)
                } else if let Some(bit) = BitOp::from_name(name) {
                    Op::Bit(bit, self.loc(dst, name)?, self.operand(src)?)
                } else {
                    match name {
                        "mov" => Op::Mov(self.loc(dst, name)?, self.operand(src)?),
                        "cmp" => Op::Cmp(self.operand(dst)?, self.operand(src)?),
                        _ => return self.unknown(name, 2),
                    }
                }
            }
            [arg] => {
                if let Some(cond) = Cond::from_name(name) {
                    Op::Jump(cond, self.operand(arg)?)
                } else {
                    match name {
                        "inc" => Op::Inc(self.loc(arg, name)?),
                        "dec" => Op::Dec(self.loc(arg, name)?),
                        "call" => Op::Call(self.operand(arg)?),
                        "push" => Op::Push(self.operand(arg)?),
                        "pop" => Op::Pop(self.loc(arg, name)?),
                        _ => return self.unknown(name, 1),
                    }
                }
            }
            [] => match name {
                "ret" => Op::Ret,
                _ => return self.unknown(name, 0),
            },
            _ => return self.unknown(name, args.len()),
        })
    }

    fn operand(&mut self, arg: Arg) -> Option<Operand> {
        match arg {
            Arg::Int(value) => Some(Operand::Imm(value)),
            Arg::Deref(sym) => match register(self.name(sym)) {
                Some((bank, idx)) => Some(Operand::Loc(Loc::Deref(bank, idx))),
                None => {
                    let token = format!("&{}", self.name(sym));
                    self.errors.push(DecodeError::UnknownOperand { token });
                    None
                }
            },
            Arg::Ident(sym) => {
                if let Some((bank, idx)) = register(self.name(sym)) {
                    return Some(Operand::Loc(Loc::Reg(bank, idx)));
                }
                if let Some(&address) = self.labels.get(&sym) {
                    return Some(Operand::Label(address));
                }
                let token = self.name(sym).to_owned();
                self.errors.push(DecodeError::UnknownOperand { token });
                None
            }
        }
    }

    /// Destination operands must name a register or a stack cell.
    fn loc(&mut self, arg: Arg, mnemonic: &str) -> Option<Loc> {
        match self.operand(arg)? {
            Operand::Loc(loc) => Some(loc),
            Operand::Label(_) | Operand::Imm(_) => {
                self.errors.push(DecodeError::ExpectedLocation {
                    mnemonic: mnemonic.to_owned(),
                });
                None
            }
        }
    }

    fn unknown(&mut self, name: &str, argc: usize) -> Option<Op> {
        self.errors.push(DecodeError::UnknownInstruction {
            mnemonic: name.to_owned(),
            argc,
        });
        None
    }

    fn name(&self, sym: DefaultSymbol) -> &str {
        self.si.resolve(sym).unwrap_or("")
    }
}

/// `r0..rN` and `a0..aN`. A name that is not a register may still be a
/// label, so this is a lookup, not an error path.
fn register(name: &str) -> Option<(Bank, u8)> {
    let (bank, count) = match name.as_bytes().first()? {
        b'r' => (Bank::Gpr, GP_REGISTERS),
        b'a' => (Bank::Arg, ARG_REGISTERS),
        _ => return None,
    };
    let idx: u8 = name[1..].parse().ok()?;
    ((idx as usize) < count).then_some((bank, idx))
}
