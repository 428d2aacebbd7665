use expect_test::{expect, Expect};

fn check(src: &str, expect: Expect) {
    use std::fmt::Write;
    let (asm, errors) = rasm::parse::Parser::new(src).parse();
    assert!(errors.is_empty(), "{errors:?}");
    let (code, errors) = super::decode(asm);
    let mut out = format!("entry: {}\n", code.entry);
    for (i, op) in code.ops.iter().enumerate() {
        writeln!(out, "{i}: {op:?}").unwrap();
    }
    for err in &errors {
        writeln!(out, "error: {err}").unwrap();
    }
    expect.assert_eq(&out);
}

#[test]
fn minimal() {
    check(
        "main:\n    mov r0 1\n    ret\n",
        expect![[r#"
            entry: 0
            0: Mov(Reg(Gpr, 0), Imm(1))
            1: Ret
        "#]],
    );
}

#[test]
fn arity_split_and_forward_label() {
    check(
        "main:\n    cmp r1 a0\n    je end\n    add r0 r1 2\n    add r0 1\nend:\n    ret\n",
        expect![[r#"
            entry: 0
            0: Cmp(Loc(Reg(Gpr, 1)), Loc(Reg(Arg, 0)))
            1: Jump(Eq, Label(4))
            2: Arith3(Add, Reg(Gpr, 0), Loc(Reg(Gpr, 1)), Imm(2))
            3: Arith2(Add, Reg(Gpr, 0), Imm(1))
            4: Ret
        "#]],
    );
}

#[test]
fn stack_and_bit_ops() {
    check(
        "main:\n    push 7\n    xor r0 r0\n    add r0 &r1\n    pop r2\n    ret\n",
        expect![[r#"
            entry: 0
            0: Push(Imm(7))
            1: Bit(Xor, Reg(Gpr, 0), Loc(Reg(Gpr, 0)))
            2: Arith2(Add, Reg(Gpr, 0), Loc(Deref(Gpr, 1)))
            3: Pop(Reg(Gpr, 2))
            4: Ret
        "#]],
    );
}

#[test]
fn call_target() {
    check(
        "main:\n    call helper\n    ret\nhelper:\n    ret\n",
        expect![[r#"
            entry: 0
            0: Call(Label(2))
            1: Ret
            2: Ret
        "#]],
    );
}

#[test]
fn entry_is_not_the_first_label() {
    check(
        "helper:\n    ret\nmain:\n    call helper\n    ret\n",
        expect![[r#"
            entry: 1
            0: Ret
            1: Call(Label(0))
            2: Ret
        "#]],
    );
}

#[test]
fn missing_entry() {
    check(
        "ret\n",
        expect![[r#"
            entry: 0
            0: Ret
            error: no main label
        "#]],
    );
}

#[test]
fn unknown_instruction() {
    check(
        "main:\n    foo r0\n    ret\n",
        expect![[r#"
            entry: 0
            0: Ret
            error: unknown instruction "foo" with 1 operands
        "#]],
    );
}

#[test]
fn unknown_operand() {
    check(
        "main:\n    mov r0 r9\n    ret\n",
        expect![[r#"
            entry: 0
            0: Ret
            error: unknown operand "r9"
        "#]],
    );
}

#[test]
fn deref_of_non_register() {
    check(
        "main:\n    add r0 &total\n    ret\n",
        expect![[r#"
            entry: 0
            0: Ret
            error: unknown operand "&total"
        "#]],
    );
}

#[test]
fn immediate_destination() {
    check(
        "main:\n    mov 1 r0\n    ret\n",
        expect![[r#"
            entry: 0
            0: Ret
            error: mov needs a writable destination
        "#]],
    );
}

#[test]
fn duplicate_label() {
    check(
        "main:\nmain:\n    ret\n",
        expect![[r#"
            entry: 0
            0: Ret
            error: duplicate label "main"
        "#]],
    );
}
