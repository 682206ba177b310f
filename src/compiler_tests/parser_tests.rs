use crate::compiler::compiler_errors::{Diagnostics, ErrorType};
use crate::compiler::parsers::ast_nodes::{
    AstNode, BinaryOperator, ExpressionKind, LogicalOperator, NodeKind,
};
use crate::compiler::parsers::build_ast::new_ast;
use crate::compiler::parsers::tokenizer::tokenize;

fn parse(source: &str) -> (Vec<AstNode>, Diagnostics) {
    let tokens = tokenize(source).expect("tokenizing should succeed");
    let mut diagnostics = Diagnostics::new();
    let ast = new_ast(&tokens, &mut diagnostics);
    (ast, diagnostics)
}

fn parse_clean(source: &str) -> Vec<AstNode> {
    let (ast, diagnostics) = parse(source);
    assert!(
        !diagnostics.has_errors(),
        "unexpected errors: {:?}",
        diagnostics.errors
    );
    ast
}

#[test]
fn assignment_and_print() {
    let ast = parse_clean("x := 5\nprint x");
    assert_eq!(ast.len(), 2);

    match &ast[0].kind {
        NodeKind::Assignment(name, value) => {
            assert_eq!(name, "x");
            assert!(matches!(value.kind, ExpressionKind::IntLiteral(5)));
        }
        other => panic!("expected assignment, got {other:?}"),
    }

    assert!(matches!(&ast[1].kind, NodeKind::Print(_)));
}

#[test]
fn multiplication_binds_tighter_than_addition() {
    let ast = parse_clean("x := 3 + 4 * 2");

    let NodeKind::Assignment(_, value) = &ast[0].kind else {
        panic!("expected assignment");
    };

    let ExpressionKind::Binary(BinaryOperator::Add, lhs, rhs) = &value.kind else {
        panic!("expected top-level addition, got {:?}", value.kind);
    };
    assert!(matches!(lhs.kind, ExpressionKind::IntLiteral(3)));
    assert!(matches!(
        rhs.kind,
        ExpressionKind::Binary(BinaryOperator::Multiply, _, _)
    ));
}

#[test]
fn parentheses_override_precedence() {
    let ast = parse_clean("x := (3 + 4) * 2");

    let NodeKind::Assignment(_, value) = &ast[0].kind else {
        panic!("expected assignment");
    };
    assert!(matches!(
        value.kind,
        ExpressionKind::Binary(BinaryOperator::Multiply, _, _)
    ));
}

#[test]
fn logical_operators_have_lowest_precedence() {
    let ast = parse_clean("x := 1 < 2 & 3 < 4 | 0");

    let NodeKind::Assignment(_, value) = &ast[0].kind else {
        panic!("expected assignment");
    };

    // Or is the loosest binding: (1 < 2 & 3 < 4) | 0
    let ExpressionKind::Logical(LogicalOperator::Or, lhs, _) = &value.kind else {
        panic!("expected top-level or, got {:?}", value.kind);
    };
    assert!(matches!(
        lhs.kind,
        ExpressionKind::Logical(LogicalOperator::And, _, _)
    ));
}

#[test]
fn if_with_else() {
    let ast = parse_clean("if x > 0 then print 1 else print 2 end");

    let NodeKind::If(_, then_body, else_body) = &ast[0].kind else {
        panic!("expected if statement");
    };
    assert_eq!(then_body.len(), 1);
    assert_eq!(else_body.as_ref().expect("else body").len(), 1);
}

#[test]
fn if_without_else() {
    let ast = parse_clean("if x then print 1 end");

    let NodeKind::If(_, then_body, else_body) = &ast[0].kind else {
        panic!("expected if statement");
    };
    assert_eq!(then_body.len(), 1);
    assert!(else_body.is_none());
}

#[test]
fn while_loop() {
    let ast = parse_clean("while n > 0 do n := n - 1 end");
    assert!(matches!(&ast[0].kind, NodeKind::While(_, body) if body.len() == 1));
}

#[test]
fn for_loop_with_default_step() {
    let ast = parse_clean("for i := 1 to 3 do print i end");

    let NodeKind::For {
        variable,
        step,
        body,
        ..
    } = &ast[0].kind
    else {
        panic!("expected for loop");
    };
    assert_eq!(variable, "i");
    assert!(step.is_none());
    assert_eq!(body.len(), 1);
}

#[test]
fn for_loop_with_by_step() {
    let ast = parse_clean("for i := 0 to 10 by 2 do print i end");

    let NodeKind::For { step, .. } = &ast[0].kind else {
        panic!("expected for loop");
    };
    assert!(step.is_some());
}

#[test]
fn read_is_an_expression() {
    let ast = parse_clean("x := read + 1");

    let NodeKind::Assignment(_, value) = &ast[0].kind else {
        panic!("expected assignment");
    };
    let ExpressionKind::Binary(BinaryOperator::Add, lhs, _) = &value.kind else {
        panic!("expected addition");
    };
    assert!(matches!(lhs.kind, ExpressionKind::Read));
}

#[test]
fn parser_recovers_and_reports_multiple_syntax_errors() {
    // Both the first and third lines are malformed;
    // the clean middle line still parses after recovery
    let (ast, diagnostics) = parse("x := *\ny := 2\nprint )");

    assert_eq!(diagnostics.errors.len(), 2);
    for error in &diagnostics.errors {
        assert_eq!(error.error_type, ErrorType::Syntax);
    }
    assert_eq!(ast.len(), 1);
}

#[test]
fn missing_end_is_a_syntax_error() {
    let (_, diagnostics) = parse("if x then print 1");
    assert!(diagnostics.has_errors());
}

#[test]
fn dangling_end_is_a_syntax_error() {
    let (_, diagnostics) = parse("print 1\nend");
    assert!(diagnostics.has_errors());
}

#[test]
fn parsing_is_deterministic() {
    let source = "x := *\nwhile y do do\nprint 1";

    let (_, first) = parse(source);
    let (_, second) = parse(source);

    let first_rendered: Vec<String> = first.errors.iter().map(|e| e.to_string()).collect();
    let second_rendered: Vec<String> = second.errors.iter().map(|e| e.to_string()).collect();
    assert_eq!(first_rendered, second_rendered);
    assert!(!first_rendered.is_empty());
}
