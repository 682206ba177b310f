use crate::compiler::parsers::tokenizer::tokenize;
use crate::compiler::parsers::tokens::TokenKind;

fn kinds(source: &str) -> Vec<TokenKind> {
    tokenize(source)
        .expect("tokenizing should succeed")
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn keywords_and_symbols() {
    assert_eq!(
        kinds("if then else end while for to by do print read count"),
        vec![
            TokenKind::If,
            TokenKind::Then,
            TokenKind::Else,
            TokenKind::End,
            TokenKind::While,
            TokenKind::For,
            TokenKind::To,
            TokenKind::By,
            TokenKind::Do,
            TokenKind::Print,
            TokenKind::Read,
            TokenKind::Symbol("count".to_string()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn operators() {
    assert_eq!(
        kinds(":= + - * / % == != < <= > >= & | ! ( )"),
        vec![
            TokenKind::Assign,
            TokenKind::Add,
            TokenKind::Subtract,
            TokenKind::Multiply,
            TokenKind::Divide,
            TokenKind::Modulus,
            TokenKind::Equality,
            TokenKind::NotEqual,
            TokenKind::LessThan,
            TokenKind::LessThanOrEqual,
            TokenKind::GreaterThan,
            TokenKind::GreaterThanOrEqual,
            TokenKind::And,
            TokenKind::Or,
            TokenKind::Not,
            TokenKind::OpenParenthesis,
            TokenKind::CloseParenthesis,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn semicolons_and_newlines_both_separate_statements() {
    assert_eq!(
        kinds("x := 1; print x\nprint x"),
        vec![
            TokenKind::Symbol("x".to_string()),
            TokenKind::Assign,
            TokenKind::IntLiteral(1),
            TokenKind::Newline,
            TokenKind::Print,
            TokenKind::Symbol("x".to_string()),
            TokenKind::Newline,
            TokenKind::Print,
            TokenKind::Symbol("x".to_string()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn comments_run_to_end_of_line() {
    assert_eq!(
        kinds("x := 1 # the rest :=  is ignored\nprint x"),
        vec![
            TokenKind::Symbol("x".to_string()),
            TokenKind::Assign,
            TokenKind::IntLiteral(1),
            TokenKind::Newline,
            TokenKind::Print,
            TokenKind::Symbol("x".to_string()),
            TokenKind::Eof,
        ]
    );
}

#[test]
fn token_positions_are_tracked() {
    let tokens = tokenize("x := 5\nprint x").expect("tokenizing should succeed");

    // 'print' starts line 2 (0-based line 1), column 0
    let print_token = tokens
        .iter()
        .find(|t| t.kind == TokenKind::Print)
        .expect("print token");
    assert_eq!(print_token.location.start_pos.line_number, 1);
    assert_eq!(print_token.location.start_pos.char_column, 0);

    // the trailing 'x' sits at column 6
    let last_symbol = tokens
        .iter()
        .rev()
        .find(|t| matches!(t.kind, TokenKind::Symbol(_)))
        .expect("symbol token");
    assert_eq!(last_symbol.location.start_pos.line_number, 1);
    assert_eq!(last_symbol.location.start_pos.char_column, 6);
}

#[test]
fn lone_colon_is_a_syntax_error() {
    let result = tokenize("x : 5");
    assert!(result.is_err());
}

#[test]
fn oversized_integer_literal_is_a_syntax_error() {
    let result = tokenize("x := 99999999999");
    assert!(result.is_err());
}

#[test]
fn negative_literals_lex_as_unary_minus() {
    assert_eq!(
        kinds("-7"),
        vec![
            TokenKind::Subtract,
            TokenKind::IntLiteral(7),
            TokenKind::Eof,
        ]
    );
}
