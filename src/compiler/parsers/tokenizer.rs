use crate::compiler::compiler_errors::CompileError;
use crate::compiler::parsers::tokens::{Token, TokenKind, TokenStream};
use crate::{return_syntax_error, settings, token_log};

#[macro_export]
macro_rules! return_token {
    ($kind:expr, $stream:expr $(,)?) => {
        return Ok(Token::new($kind, $stream.new_location()))
    };
}

pub fn tokenize(source_code: &str) -> Result<Vec<Token>, CompileError> {
    let initial_capacity = source_code.len() / settings::SRC_TO_TOKEN_RATIO;
    let mut tokens: Vec<Token> = Vec::with_capacity(initial_capacity);
    let mut stream = TokenStream::new(source_code);

    loop {
        let token = next_token(&mut stream)?;

        token_log!(&token);

        let at_eof = token.kind == TokenKind::Eof;
        tokens.push(token);

        if at_eof {
            break;
        }
    }

    Ok(tokens)
}

fn next_token(stream: &mut TokenStream) -> Result<Token, CompileError> {
    // Skip blank space and comments.
    // Newlines are not skipped here as they separate statements.
    loop {
        match stream.peek() {
            Some(' ') | Some('\t') | Some('\r') => {
                stream.next();
            }

            // '#' comments run to the end of the line
            Some('#') => {
                while let Some(&ch) = stream.peek() {
                    if ch == '\n' {
                        break;
                    }
                    stream.next();
                }
            }

            _ => break,
        }
    }

    stream.update_start_position();

    let current_char = match stream.next() {
        Some(ch) => ch,
        None => return_token!(TokenKind::Eof, stream),
    };

    match current_char {
        '\n' | ';' => return_token!(TokenKind::Newline, stream),

        '(' => return_token!(TokenKind::OpenParenthesis, stream),
        ')' => return_token!(TokenKind::CloseParenthesis, stream),

        '+' => return_token!(TokenKind::Add, stream),
        '-' => return_token!(TokenKind::Subtract, stream),
        '*' => return_token!(TokenKind::Multiply, stream),
        '/' => return_token!(TokenKind::Divide, stream),
        '%' => return_token!(TokenKind::Modulus, stream),

        '&' => return_token!(TokenKind::And, stream),
        '|' => return_token!(TokenKind::Or, stream),

        '!' => {
            if stream.peek() == Some(&'=') {
                stream.next();
                return_token!(TokenKind::NotEqual, stream);
            }
            return_token!(TokenKind::Not, stream)
        }

        '=' => {
            if stream.peek() == Some(&'=') {
                stream.next();
                return_token!(TokenKind::Equality, stream);
            }
            return_syntax_error!(
                stream.new_location(),
                "Unexpected '='. Use ':=' for assignment or '==' for comparison"
            )
        }

        '<' => {
            if stream.peek() == Some(&'=') {
                stream.next();
                return_token!(TokenKind::LessThanOrEqual, stream);
            }
            return_token!(TokenKind::LessThan, stream)
        }

        '>' => {
            if stream.peek() == Some(&'=') {
                stream.next();
                return_token!(TokenKind::GreaterThanOrEqual, stream);
            }
            return_token!(TokenKind::GreaterThan, stream)
        }

        ':' => {
            if stream.peek() == Some(&'=') {
                stream.next();
                return_token!(TokenKind::Assign, stream);
            }
            return_syntax_error!(stream.new_location(), "Expected '=' after ':'")
        }

        '0'..='9' => {
            let mut token_value = String::from(current_char);

            while let Some(&ch) = stream.peek() {
                if !ch.is_ascii_digit() {
                    break;
                }
                token_value.push(ch);
                stream.next();
            }

            match token_value.parse::<i32>() {
                Ok(value) => return_token!(TokenKind::IntLiteral(value), stream),
                Err(_) => return_syntax_error!(
                    stream.new_location(),
                    "Integer literal '{}' does not fit in 32 bits",
                    token_value
                ),
            }
        }

        ch if ch.is_ascii_alphabetic() || ch == '_' => {
            let mut token_value = String::from(ch);

            while let Some(&next) = stream.peek() {
                if !next.is_ascii_alphanumeric() && next != '_' {
                    break;
                }
                token_value.push(next);
                stream.next();
            }

            let kind = match token_value.as_str() {
                "if" => TokenKind::If,
                "then" => TokenKind::Then,
                "else" => TokenKind::Else,
                "end" => TokenKind::End,
                "while" => TokenKind::While,
                "for" => TokenKind::For,
                "to" => TokenKind::To,
                "by" => TokenKind::By,
                "do" => TokenKind::Do,
                "print" => TokenKind::Print,
                "read" => TokenKind::Read,
                _ => TokenKind::Symbol(token_value),
            };

            return_token!(kind, stream)
        }

        ch => {
            return_syntax_error!(stream.new_location(), "Unexpected character '{}'", ch)
        }
    }
}
