use expect_test::{expect, Expect};

fn check(src: &str, expect: Expect) {
    use std::fmt::Write;
    let out = super::LexOutput::lex_all(src);
    let mut s = String::new();
    for (i, line) in out.lines.iter().enumerate() {
        writeln!(s, "{i}: {:?} comment={:?}", line.line.kind, line.line.comment).unwrap();
        for (span, lit) in line.line.slice_lit(&out.literals) {
            writeln!(s, "    {span:?} {lit:?} {:?}", span.slice(line.line_src(src))).unwrap();
        }
    }
    expect.assert_eq(&s);
}

#[test]
fn empty() {
    check("", expect![[""]]);
}

#[test]
fn blank_lines() {
    check(
        "\n# whole line\n   \n",
        expect![[r#"
            0: Empty comment=None
            1: Empty comment=Some((0, 12))
            2: Empty comment=None
                (0, 3) Whitespace "   "
        "#]],
    );
}

#[test]
fn instruction() {
    check(
        "mov r0 12",
        expect![[r#"
            0: Instruction comment=None
                (0, 3) Ident "mov"
                (3, 4) Whitespace " "
                (4, 6) Ident "r0"
                (6, 7) Whitespace " "
                (7, 9) Digit(Decimal) "12"
        "#]],
    );
}

#[test]
fn label_then_deref_and_comment() {
    check(
        "main:\n  add r0 &r1 # note\n",
        expect![[r#"
            0: Label comment=None
                (0, 4) Ident "main"
                (4, 5) Colon ":"
            1: Instruction comment=Some((13, 19))
                (0, 2) Whitespace "  "
                (2, 5) Ident "add"
                (5, 6) Whitespace " "
                (6, 8) Ident "r0"
                (8, 9) Whitespace " "
                (9, 10) Amp "&"
                (10, 12) Ident "r1"
                (12, 13) Whitespace " "
        "#]],
    );
}

#[test]
fn numbers() {
    check(
        "mov r0 -42\nmov r1 0x1f\nmov r2 1_000\n",
        expect![[r#"
            0: Instruction comment=None
                (0, 3) Ident "mov"
                (3, 4) Whitespace " "
                (4, 6) Ident "r0"
                (6, 7) Whitespace " "
                (7, 10) Digit(Decimal) "-42"
            1: Instruction comment=None
                (0, 3) Ident "mov"
                (3, 4) Whitespace " "
                (4, 6) Ident "r1"
                (6, 7) Whitespace " "
                (7, 11) Digit(Hex) "0x1f"
            2: Instruction comment=None
                (0, 3) Ident "mov"
                (3, 4) Whitespace " "
                (4, 6) Ident "r2"
                (6, 7) Whitespace " "
                (7, 12) Digit(Decimal) "1_000"
        "#]],
    );
}

#[test]
fn unknown_char() {
    check(
        "inc @r0",
        expect![[r#"
            0: Instruction comment=None
                (0, 3) Ident "inc"
                (3, 4) Whitespace " "
                (4, 5) Other "@"
                (5, 7) Ident "r0"
        "#]],
    );
}

#[test]
fn crlf_line_endings() {
    check(
        "mov r0 1\r\nret\r\n",
        expect![[r#"
            0: Instruction comment=None
                (0, 3) Ident "mov"
                (3, 4) Whitespace " "
                (4, 6) Ident "r0"
                (6, 7) Whitespace " "
                (7, 8) Digit(Decimal) "1"
            1: Instruction comment=None
                (0, 3) Ident "ret"
        "#]],
    );
}

#[test]
fn lone_minus_is_not_a_number() {
    check(
        "sub r0 - 1",
        expect![[r#"
            0: Instruction comment=None
                (0, 3) Ident "sub"
                (3, 4) Whitespace " "
                (4, 6) Ident "r0"
                (6, 7) Whitespace " "
                (7, 8) Other "-"
                (8, 9) Whitespace " "
                (9, 10) Digit(Decimal) "1"
        "#]],
    );
}
