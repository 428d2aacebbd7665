use expect_test::{expect, Expect};
use string_interner::{DefaultBackend, StringInterner};

use super::Parser;
use crate::{Arg, Line};

fn check(src: &str, expect: Expect) {
    use std::fmt::Write;
    let (rasm, errors) = Parser::new(src).parse();
    let mut out = String::new();
    for line in &rasm.lines {
        writeln!(out, "{}", render(line, &rasm.si)).unwrap();
    }
    for err in &errors {
        writeln!(out, "error: {err}").unwrap();
    }
    expect.assert_eq(&out);
}

fn render(line: &Line, si: &StringInterner<DefaultBackend>) -> String {
    let name = |sym| si.resolve(sym).unwrap();
    match line {
        Line::Empty => "Empty".into(),
        Line::Label { name: sym } => format!("Label({})", name(*sym)),
        Line::Instruction { mnemonic, args } => {
            let args: Vec<String> = args
                .iter()
                .map(|arg| match *arg {
                    Arg::Ident(sym) => name(sym).into(),
                    Arg::Deref(sym) => format!("&{}", name(sym)),
                    Arg::Int(value) => value.to_string(),
                })
                .collect();
            format!("Instruction({}, [{}])", name(*mnemonic), args.join(", "))
        }
    }
}

#[test]
fn empty() {
    check("", expect![[""]]);
}

#[test]
fn blank_and_comment_lines() {
    check(
        "\n# intro\n",
        expect![[r#"
            Empty
            Empty
        "#]],
    );
}

#[test]
fn basic_program() {
    check(
        "main:\n    mov r0 1\n    ret\n",
        expect![[r#"
            Label(main)
            Instruction(mov, [r0, 1])
            Instruction(ret, [])
        "#]],
    );
}

#[test]
fn label_shares_a_line() {
    check(
        "loop: jmp loop",
        expect![[r#"
            Label(loop)
            Instruction(jmp, [loop])
        "#]],
    );
}

#[test]
fn operand_kinds() {
    check(
        "add r0 &r1\nmov r2 -7\nmov r3 0x1f\n",
        expect![[r#"
            Instruction(add, [r0, &r1])
            Instruction(mov, [r2, -7])
            Instruction(mov, [r3, 31])
        "#]],
    );
}

#[test]
fn crlf_line_endings() {
    check(
        "main:\r\n    mov r0 1\r\n    ret\r\n",
        expect![[r#"
            Label(main)
            Instruction(mov, [r0, 1])
            Instruction(ret, [])
        "#]],
    );
}

#[test]
fn digit_separators() {
    check(
        "push 1_000_000",
        expect![[r#"
            Instruction(push, [1000000])
        "#]],
    );
}

#[test]
fn digit_before_mnemonic() {
    check(
        "12 mov",
        expect![[r#"
            Instruction(mov, [])
            error: unexpected Digit(Decimal) at 0:(0, 2)
        "#]],
    );
}

#[test]
fn integer_overflow() {
    check(
        "mov r0 99999999999999999999",
        expect![[r#"
            Instruction(mov, [r0])
            error: integer out of range at 0:(7, 27)
        "#]],
    );
}

#[test]
fn dangling_deref() {
    check(
        "push &",
        expect![[r#"
            Instruction(push, [])
            error: dangling & at 0:(5, 6)
        "#]],
    );
}

#[test]
fn detached_deref() {
    check(
        "push & r1",
        expect![[r#"
            Instruction(push, [r1])
            error: dangling & at 0:(5, 6)
        "#]],
    );
}

#[test]
fn label_after_mnemonic() {
    check(
        "mov r0 end:",
        expect![[r#"
            Instruction(mov, [r0])
            error: label after a mnemonic at 0:(7, 10)
        "#]],
    );
}

#[test]
fn adjacent_words() {
    check(
        "start:mov r0 1",
        expect![[r#"
            Label(start)
            Instruction(r0, [1])
            error: unexpected Ident at 0:(6, 9)
        "#]],
    );
}

#[test]
fn unknown_character() {
    check(
        "inc @ r0",
        expect![[r#"
            Instruction(inc, [r0])
            error: unknown input at 0:(4, 5)
        "#]],
    );
}

#[test]
fn lone_colon() {
    check(
        ": jmp main",
        expect![[r#"
            Instruction(jmp, [main])
            error: unexpected Colon at 0:(0, 1)
        "#]],
    );
}
