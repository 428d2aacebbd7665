use ahash::AHashMap;
use rasm::parse::ParseError;
use rasm::Address;
use string_interner::{DefaultBackend, DefaultSymbol, StringInterner};
use tracing::{debug, trace};

use self::decode::{decode, DecodeError};

pub mod decode;


pub const GP_REGISTERS: usize = 4;
pub const ARG_REGISTERS: usize = 4;
pub const STACK_SIZE: usize = 1024;
pub const MAX_CALL_DEPTH: usize = 256;

type LabelMap = AHashMap<DefaultSymbol, Address>;

/// Decoded program: executable ops plus the label table that produced them.
#[derive(Debug, Default)]
pub struct Code {
    pub si: StringInterner<DefaultBackend>,
    pub ops: Vec<Op>,
    pub labels: LabelMap,
    pub entry: Address,
}

/// Register bank an operand names. `r*` and `a*` are distinguished only
/// by name; both hold signed 64-bit integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bank {
    Gpr,
    Arg,
}

/// A writable location: a register, or a stack cell indexed by the
/// current value of a register (`&r1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loc {
    Reg(Bank, u8),
    Deref(Bank, u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Loc(Loc),
    Label(Address),
    Imm(i64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl ArithOp {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "add" => Self::Add,
            "sub" => Self::Sub,
            "mul" => Self::Mul,
            "div" => Self::Div,
            "mod" => Self::Mod,
            _ => return None,
        })
    }

    fn apply(self, a: i64, b: i64) -> Result<i64, RunErrorKind> {
        Ok(match self {
            Self::Add => a.wrapping_add(b),
            Self::Sub => a.wrapping_sub(b),
            Self::Mul => a.wrapping_mul(b),
            Self::Div if b == 0 => return Err(RunErrorKind::DivisionByZero),
            Self::Div => a.wrapping_div(b),
            Self::Mod if b == 0 => return Err(RunErrorKind::ModuloByZero),
            Self::Mod => a.wrapping_rem(b),
        })
    }

    fn name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
            Self::Mod => "mod",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitOp {
    Shl,
    Shr,
    Xor,
    And,
    Or,
}

impl BitOp {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "shl" => Self::Shl,
            "shr" => Self::Shr,
            "xor" => Self::Xor,
            "and" => Self::And,
            "or" => Self::Or,
            _ => return None,
        })
    }

    fn apply(self, a: i64, b: i64) -> i64 {
        match self {
            Self::Shl => a.wrapping_shl(b as u32),
            Self::Shr => a.wrapping_shr(b as u32),
            Self::Xor => a ^ b,
            Self::And => a & b,
            Self::Or => a | b,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Shl => "shl",
            Self::Shr => "shr",
            Self::Xor => "xor",
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

/// Jump condition, evaluated against the flags left by the last `cmp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    Always,
    Lt,
    Eq,
    Ne,
    Gt,
    Le,
    Ge,
}

impl Cond {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "jmp" => Self::Always,
            "jl" => Self::Lt,
            "je" => Self::Eq,
            "jne" => Self::Ne,
            "jg" => Self::Gt,
            "jle" => Self::Le,
            "jge" => Self::Ge,
            _ => return None,
        })
    }

    fn taken(self, zero: bool, sign: bool) -> bool {
        match self {
            Self::Always => true,
            Self::Lt => sign && !zero,
            Self::Eq => zero,
            Self::Ne => !zero,
            Self::Gt => !sign && !zero,
            Self::Le => zero || sign,
            Self::Ge => zero || !sign,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Always => "jmp",
            Self::Lt => "jl",
            Self::Eq => "je",
            Self::Ne => "jne",
            Self::Gt => "jg",
            Self::Le => "jle",
            Self::Ge => "jge",
        }
    }
}

/// One decoded instruction. Arity is part of the variant: `add r0 r1 r2`
/// and `add r0 r1` decode to different ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `dst := a OP b`
    Arith3(ArithOp, Loc, Operand, Operand),
    /// `dst := dst OP src`
    Arith2(ArithOp, Loc, Operand),
    /// `dst := dst OP src`
    Bit(BitOp, Loc, Operand),
    Mov(Loc, Operand),
    Cmp(Operand, Operand),
    Inc(Loc),
    Dec(Loc),
    Jump(Cond, Operand),
    Call(Operand),
    Push(Operand),
    Pop(Loc),
    Ret,
}

impl Op {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Op::Arith3(op, ..) | Op::Arith2(op, ..) => op.name(),
            Op::Bit(op, ..) => op.name(),
            Op::Mov(..) => "mov",
            Op::Cmp(..) => "cmp",
            Op::Inc(..) => "inc",
            Op::Dec(..) => "dec",
            Op::Jump(cond, _) => cond.name(),
            Op::Call(_) => "call",
            Op::Push(_) => "push",
            Op::Pop(_) => "pop",
            Op::Ret => "ret",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RunErrorKind {
    #[error("division by zero")]
    DivisionByZero,
    #[error("modulo by zero")]
    ModuloByZero,
    #[error("stack overflow")]
    StackOverflow,
    #[error("stack underflow")]
    StackUnderflow,
    #[error("stack index {index} out of bounds (sp = {sp})")]
    BadStackIndex { index: i64, sp: usize },
    #[error("jump to negative address {target}")]
    BadJumpTarget { target: i64 },
    #[error("call depth limit exceeded")]
    CallDepthExceeded,
    #[error("out of fuel")]
    OutOfFuel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{mnemonic} at {pc}: {kind}")]
pub struct RunError {
    pub pc: Address,
    pub mnemonic: &'static str,
    pub kind: RunErrorKind,
}

#[derive(Debug)]
pub enum Error {
    Parse(Vec<ParseError>),
    Decode(Vec<DecodeError>),
    Run(RunError),
}

impl From<RunError> for Error {
    fn from(err: RunError) -> Self {
        Self::Run(err)
    }
}

/// What the executed instruction asks of the driving loop.
enum Flow {
    Continue,
    Jump(Address),
    Halt,
}

/// One run's worth of machine state. Built fresh per program; nothing
/// is shared between runs.
#[derive(Debug)]
pub struct Machine {
    pub reg: [i64; GP_REGISTERS],
    pub arg: [i64; ARG_REGISTERS],
    pub stack: [i64; STACK_SIZE],
    pub sp: usize,
    call_stack: Vec<Address>,
    zero: bool,
    sign: bool,
    pc: Address,
    fuel: Option<u64>,
    pub code: Code,
}

impl Machine {
    pub fn load(src: &str) -> Result<Self, Error> {
        let (asm, errors) = rasm::parse::Parser::new(src).parse();
        if !errors.is_empty() {
            return Err(Error::Parse(errors));
        }
        let (code, errors) = decode(asm);
        if !errors.is_empty() {
            return Err(Error::Decode(errors));
        }
        debug!(ops = code.ops.len(), entry = code.entry, "program loaded");
        Ok(Self {
            reg: [0; GP_REGISTERS],
            arg: [0; ARG_REGISTERS],
            stack: [0; STACK_SIZE],
            sp: 0,
            call_stack: Vec::new(),
            zero: false,
            sign: false,
            pc: code.entry,
            fuel: None,
            code,
        })
    }

    /// Caps the number of executed instructions. Unlimited by default.
    pub fn set_fuel(&mut self, fuel: u64) {
        self.fuel = Some(fuel);
    }

    /// Runs from the entry point until the program counter walks past
    /// the last instruction or a `ret` returns past the outermost call.
    /// The result is the final value of `r0`.
    pub fn run(&mut self) -> Result<i64, RunError> {
        while self.pc < self.code.ops.len() {
            let pc = self.pc;
            let op = self.code.ops[pc];
            trace!(pc, op = op.mnemonic(), "step");
            let fail = |kind| RunError {
                pc,
                mnemonic: op.mnemonic(),
                kind,
            };
            if let Some(fuel) = &mut self.fuel {
                *fuel = fuel.checked_sub(1).ok_or_else(|| fail(RunErrorKind::OutOfFuel))?;
            }
            match self.step(op).map_err(fail)? {
                Flow::Continue => self.pc += 1,
                Flow::Jump(target) => self.pc = target,
                Flow::Halt => break,
            }
        }
        debug!(r0 = self.reg[0], "run finished");
        Ok(self.reg[0])
    }

    fn step(&mut self, op: Op) -> Result<Flow, RunErrorKind> {
        match op {
            Op::Arith3(arith, dst, a, b) => {
                let value = arith.apply(self.read(a)?, self.read(b)?)?;
                self.write(dst, value)?;
            }
            Op::Arith2(arith, dst, src) => {
                let value = arith.apply(self.read_loc(dst)?, self.read(src)?)?;
                self.write(dst, value)?;
            }
            Op::Bit(bit, dst, src) => {
                let value = bit.apply(self.read_loc(dst)?, self.read(src)?);
                self.write(dst, value)?;
            }
            Op::Mov(dst, src) => {
                let value = self.read(src)?;
                self.write(dst, value)?;
            }
            Op::Cmp(a, b) => {
                let (a, b) = (self.read(a)?, self.read(b)?);
                self.zero = a == b;
                self.sign = a < b;
            }
            Op::Inc(loc) => {
                let value = self.read_loc(loc)?.wrapping_add(1);
                self.write(loc, value)?;
            }
            Op::Dec(loc) => {
                let value = self.read_loc(loc)?.wrapping_sub(1);
                self.write(loc, value)?;
            }
            Op::Jump(cond, target) => {
                if cond.taken(self.zero, self.sign) {
                    return Ok(Flow::Jump(self.target(target)?));
                }
            }
            Op::Call(target) => {
                if self.call_stack.len() == MAX_CALL_DEPTH {
                    return Err(RunErrorKind::CallDepthExceeded);
                }
                let target = self.target(target)?;
                self.call_stack.push(self.pc);
                return Ok(Flow::Jump(target));
            }
            Op::Push(src) => {
                if self.sp == STACK_SIZE {
                    return Err(RunErrorKind::StackOverflow);
                }
                self.stack[self.sp] = self.read(src)?;
                self.sp += 1;
            }
            Op::Pop(dst) => {
                if self.sp == 0 {
                    return Err(RunErrorKind::StackUnderflow);
                }
                self.sp -= 1;
                let value = self.stack[self.sp];
                self.write(dst, value)?;
            }
            Op::Ret => {
                // Returning past the outermost call ends the run.
                return Ok(match self.call_stack.pop() {
                    Some(saved) => Flow::Jump(saved + 1),
                    None => Flow::Halt,
                });
            }
        }
        Ok(Flow::Continue)
    }

    fn read(&self, operand: Operand) -> Result<i64, RunErrorKind> {
        match operand {
            Operand::Loc(loc) => self.read_loc(loc),
            Operand::Label(address) => Ok(address as i64),
            Operand::Imm(value) => Ok(value),
        }
    }

    fn read_loc(&self, loc: Loc) -> Result<i64, RunErrorKind> {
        match loc {
            Loc::Reg(bank, idx) => Ok(self.bank(bank)[idx as usize]),
            Loc::Deref(bank, idx) => {
                let cell = self.cell(bank, idx)?;
                Ok(self.stack[cell])
            }
        }
    }

    fn write(&mut self, loc: Loc, value: i64) -> Result<(), RunErrorKind> {
        match loc {
            Loc::Reg(Bank::Gpr, idx) => self.reg[idx as usize] = value,
            Loc::Reg(Bank::Arg, idx) => self.arg[idx as usize] = value,
            Loc::Deref(bank, idx) => {
                let cell = self.cell(bank, idx)?;
                self.stack[cell] = value;
            }
        }
        Ok(())
    }

    fn bank(&self, bank: Bank) -> &[i64] {
        match bank {
            Bank::Gpr => &self.reg,
            Bank::Arg => &self.arg,
        }
    }

    /// Resolves `&reg` to a stack slot. The index must fall inside the
    /// live part of the stack, `[0, sp)`.
    fn cell(&self, bank: Bank, idx: u8) -> Result<usize, RunErrorKind> {
        let index = self.bank(bank)[idx as usize];
        match usize::try_from(index) {
            Ok(cell) if cell < self.sp => Ok(cell),
            _ => Err(RunErrorKind::BadStackIndex {
                index,
                sp: self.sp,
            }),
        }
    }

    fn target(&self, operand: Operand) -> Result<Address, RunErrorKind> {
        let target = self.read(operand)?;
        usize::try_from(target).map_err(|_| RunErrorKind::BadJumpTarget { target })
    }
}

/// Loads `src`, seeds the argument registers from `args` (extras are
/// ignored), and runs to completion.
pub fn eval(src: &str, args: &[i64]) -> Result<i64, Error> {
    let mut machine = Machine::load(src)?;
    for (reg, &value) in machine.arg.iter_mut().zip(args) {
        *reg = value;
    }
    Ok(machine.run()?)
}
