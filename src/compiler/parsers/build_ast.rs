use crate::ast_log;
use crate::compiler::compiler_errors::{CompileError, Diagnostics};
use crate::compiler::parsers::ast_nodes::{
    AstNode, BinaryOperator, Expression, ExpressionKind, LogicalOperator, NodeKind, UnaryOperator,
};
use crate::compiler::parsers::tokens::{TextLocation, Token, TokenKind};
use crate::return_syntax_error;

/// Walks through the token stream and builds the AST.
///
/// Syntax errors are recorded into the diagnostics list rather than aborting,
/// skipping ahead to the next statement boundary so several errors
/// can be reported in a single run.
pub fn new_ast(tokens: &[Token], diagnostics: &mut Diagnostics) -> Vec<AstNode> {
    let mut context = TokenContext::new(tokens);
    let ast = parse_block(&mut context, diagnostics);

    // Anything left over is an unmatched block terminator
    while context.current_kind() != &TokenKind::Eof {
        let leftover = context.current();
        diagnostics.record(CompileError::new_syntax_error(
            format!("Unexpected '{}'", leftover.kind.to_display_string()),
            leftover.location,
        ));
        context.advance();
        parse_block(&mut context, diagnostics);
    }

    ast_log!("{:#?}", ast);

    ast
}

pub struct TokenContext<'a> {
    tokens: &'a [Token],
    index: usize,
}

impl<'a> TokenContext<'a> {
    // The token stream is guaranteed to end with an Eof token
    pub fn new(tokens: &'a [Token]) -> Self {
        debug_assert!(matches!(
            tokens.last(),
            Some(Token {
                kind: TokenKind::Eof,
                ..
            })
        ));

        Self { tokens, index: 0 }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn current_kind(&self) -> &TokenKind {
        &self.current().kind
    }

    fn current_location(&self) -> TextLocation {
        self.current().location
    }

    fn advance(&mut self) {
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
    }

    fn skip_newlines(&mut self) {
        while self.current_kind() == &TokenKind::Newline {
            self.advance();
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.current_kind() == kind {
            self.advance();
            return true;
        }
        false
    }

    fn expect(&mut self, kind: TokenKind, context_msg: &str) -> Result<(), CompileError> {
        if self.current_kind() == &kind {
            self.advance();
            return Ok(());
        }

        return_syntax_error!(
            self.current_location(),
            "Expected '{}' {}, found '{}'",
            kind.to_display_string(),
            context_msg,
            self.current_kind().to_display_string()
        )
    }
}

/// Parses statements until a block terminator ('end', 'else' or the end
/// of the file). The terminator itself is left for the caller to consume.
fn parse_block(context: &mut TokenContext, diagnostics: &mut Diagnostics) -> Vec<AstNode> {
    let mut statements = Vec::new();

    loop {
        context.skip_newlines();

        match context.current_kind() {
            TokenKind::Eof | TokenKind::End | TokenKind::Else => break,
            _ => {}
        }

        match parse_statement(context, diagnostics) {
            Ok(statement) => statements.push(statement),
            Err(e) => {
                diagnostics.record(e);
                recover_to_statement_boundary(context);
            }
        }
    }

    statements
}

/// Skips ahead to the next statement separator after a syntax error,
/// so parsing can continue and report further errors.
fn recover_to_statement_boundary(context: &mut TokenContext) {
    loop {
        match context.current_kind() {
            TokenKind::Eof | TokenKind::End | TokenKind::Else => break,
            TokenKind::Newline => {
                context.advance();
                break;
            }
            _ => context.advance(),
        }
    }
}

fn parse_statement(
    context: &mut TokenContext,
    diagnostics: &mut Diagnostics,
) -> Result<AstNode, CompileError> {
    let location = context.current_location();

    match context.current_kind().to_owned() {
        TokenKind::Symbol(name) => {
            context.advance();
            context.expect(TokenKind::Assign, "after variable name")?;
            let value = parse_expression(context)?;

            Ok(AstNode {
                kind: NodeKind::Assignment(name, value),
                location,
            })
        }

        TokenKind::Print => {
            context.advance();
            let value = parse_expression(context)?;

            Ok(AstNode {
                kind: NodeKind::Print(value),
                location,
            })
        }

        TokenKind::If => {
            context.advance();
            let condition = parse_expression(context)?;
            context.expect(TokenKind::Then, "after the if condition")?;

            let then_body = parse_block(context, diagnostics);

            let else_body = if context.eat(&TokenKind::Else) {
                Some(parse_block(context, diagnostics))
            } else {
                None
            };

            context.expect(TokenKind::End, "to close the if statement")?;

            Ok(AstNode {
                kind: NodeKind::If(condition, then_body, else_body),
                location,
            })
        }

        TokenKind::While => {
            context.advance();
            let condition = parse_expression(context)?;
            context.expect(TokenKind::Do, "after the while condition")?;

            let body = parse_block(context, diagnostics);
            context.expect(TokenKind::End, "to close the while loop")?;

            Ok(AstNode {
                kind: NodeKind::While(condition, body),
                location,
            })
        }

        TokenKind::For => {
            context.advance();

            let variable = match context.current_kind().to_owned() {
                TokenKind::Symbol(name) => {
                    context.advance();
                    name
                }
                other => {
                    return_syntax_error!(
                        context.current_location(),
                        "Expected a loop variable name after 'for', found '{}'",
                        other.to_display_string()
                    )
                }
            };

            context.expect(TokenKind::Assign, "after the loop variable")?;
            let start = parse_expression(context)?;
            context.expect(TokenKind::To, "after the loop start value")?;
            let end = parse_expression(context)?;

            let step = if context.eat(&TokenKind::By) {
                Some(parse_expression(context)?)
            } else {
                None
            };

            context.expect(TokenKind::Do, "before the loop body")?;
            let body = parse_block(context, diagnostics);
            context.expect(TokenKind::End, "to close the for loop")?;

            Ok(AstNode {
                kind: NodeKind::For {
                    variable,
                    start,
                    end,
                    step,
                    body,
                },
                location,
            })
        }

        other => {
            return_syntax_error!(
                location,
                "Expected a statement, found '{}'",
                other.to_display_string()
            )
        }
    }
}

// ----------------------------
//     EXPRESSION PARSING
// ----------------------------
// One function per precedence tier, lowest binding first:
// | < & < comparisons < + - < * / % < unary < primary

pub fn parse_expression(context: &mut TokenContext) -> Result<Expression, CompileError> {
    parse_or(context)
}

fn parse_or(context: &mut TokenContext) -> Result<Expression, CompileError> {
    let mut lhs = parse_and(context)?;

    while context.current_kind() == &TokenKind::Or {
        let location = context.current_location();
        context.advance();
        let rhs = parse_and(context)?;
        lhs = Expression::new(
            ExpressionKind::Logical(LogicalOperator::Or, Box::new(lhs), Box::new(rhs)),
            location,
        );
    }

    Ok(lhs)
}

fn parse_and(context: &mut TokenContext) -> Result<Expression, CompileError> {
    let mut lhs = parse_comparison(context)?;

    while context.current_kind() == &TokenKind::And {
        let location = context.current_location();
        context.advance();
        let rhs = parse_comparison(context)?;
        lhs = Expression::new(
            ExpressionKind::Logical(LogicalOperator::And, Box::new(lhs), Box::new(rhs)),
            location,
        );
    }

    Ok(lhs)
}

fn parse_comparison(context: &mut TokenContext) -> Result<Expression, CompileError> {
    let mut lhs = parse_additive(context)?;

    loop {
        let op = match context.current_kind() {
            TokenKind::Equality => BinaryOperator::Equality,
            TokenKind::NotEqual => BinaryOperator::NotEqual,
            TokenKind::LessThan => BinaryOperator::LessThan,
            TokenKind::LessThanOrEqual => BinaryOperator::LessThanOrEqual,
            TokenKind::GreaterThan => BinaryOperator::GreaterThan,
            TokenKind::GreaterThanOrEqual => BinaryOperator::GreaterThanOrEqual,
            _ => break,
        };

        let location = context.current_location();
        context.advance();
        let rhs = parse_additive(context)?;
        lhs = Expression::new(
            ExpressionKind::Binary(op, Box::new(lhs), Box::new(rhs)),
            location,
        );
    }

    Ok(lhs)
}

fn parse_additive(context: &mut TokenContext) -> Result<Expression, CompileError> {
    let mut lhs = parse_multiplicative(context)?;

    loop {
        let op = match context.current_kind() {
            TokenKind::Add => BinaryOperator::Add,
            TokenKind::Subtract => BinaryOperator::Subtract,
            _ => break,
        };

        let location = context.current_location();
        context.advance();
        let rhs = parse_multiplicative(context)?;
        lhs = Expression::new(
            ExpressionKind::Binary(op, Box::new(lhs), Box::new(rhs)),
            location,
        );
    }

    Ok(lhs)
}

fn parse_multiplicative(context: &mut TokenContext) -> Result<Expression, CompileError> {
    let mut lhs = parse_unary(context)?;

    loop {
        let op = match context.current_kind() {
            TokenKind::Multiply => BinaryOperator::Multiply,
            TokenKind::Divide => BinaryOperator::Divide,
            TokenKind::Modulus => BinaryOperator::Modulus,
            _ => break,
        };

        let location = context.current_location();
        context.advance();
        let rhs = parse_unary(context)?;
        lhs = Expression::new(
            ExpressionKind::Binary(op, Box::new(lhs), Box::new(rhs)),
            location,
        );
    }

    Ok(lhs)
}

fn parse_unary(context: &mut TokenContext) -> Result<Expression, CompileError> {
    let op = match context.current_kind() {
        TokenKind::Add => UnaryOperator::Plus,
        TokenKind::Subtract => UnaryOperator::Negate,
        TokenKind::Not => UnaryOperator::Not,
        _ => return parse_primary(context),
    };

    let location = context.current_location();
    context.advance();
    let operand = parse_unary(context)?;

    Ok(Expression::new(
        ExpressionKind::Unary(op, Box::new(operand)),
        location,
    ))
}

fn parse_primary(context: &mut TokenContext) -> Result<Expression, CompileError> {
    let location = context.current_location();

    match context.current_kind().to_owned() {
        TokenKind::IntLiteral(value) => {
            context.advance();
            Ok(Expression::new(ExpressionKind::IntLiteral(value), location))
        }

        TokenKind::Symbol(name) => {
            context.advance();
            Ok(Expression::new(ExpressionKind::Variable(name), location))
        }

        TokenKind::Read => {
            context.advance();
            Ok(Expression::new(ExpressionKind::Read, location))
        }

        // Parentheses are transparent: the inner expression is the value
        TokenKind::OpenParenthesis => {
            context.advance();
            let inner = parse_expression(context)?;
            context.expect(TokenKind::CloseParenthesis, "to close the parentheses")?;
            Ok(inner)
        }

        other => {
            return_syntax_error!(
                location,
                "Expected an expression, found '{}'",
                other.to_display_string()
            )
        }
    }
}
