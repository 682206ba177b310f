use std::iter::Peekable;
use std::str::Chars;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct CharPosition {
    pub line_number: i32,
    pub char_column: i32,
}

/// Span of one token in the source file.
/// Tokens can't span multiple lines in this language,
/// so the start and end position always share a line number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct TextLocation {
    pub start_pos: CharPosition,
    pub end_pos: CharPosition,
}

impl TextLocation {
    pub fn new(start: CharPosition, end: CharPosition) -> Self {
        Self {
            start_pos: start,
            end_pos: end,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub location: TextLocation,
}

impl Token {
    pub fn new(kind: TokenKind, location: TextLocation) -> Self {
        Self { kind, location }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Keywords
    If,
    Then,
    Else,
    End,
    While,
    For,
    To,
    By,
    Do,
    Print,
    Read,

    Symbol(String),
    IntLiteral(i32),

    // Operators
    Assign, // :=
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulus,
    Equality,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And, // &
    Or,  // |
    Not, // !

    OpenParenthesis,
    CloseParenthesis,

    // Statement separators (newline or ';')
    Newline,
    Eof,
}

impl TokenKind {
    pub fn to_display_string(&self) -> String {
        let text = match self {
            TokenKind::Symbol(name) => return name.to_owned(),
            TokenKind::IntLiteral(value) => return value.to_string(),

            TokenKind::Assign => ":=",
            TokenKind::Add => "+",
            TokenKind::Subtract => "-",
            TokenKind::Multiply => "*",
            TokenKind::Divide => "/",
            TokenKind::Modulus => "%",
            TokenKind::Equality => "==",
            TokenKind::NotEqual => "!=",
            TokenKind::LessThan => "<",
            TokenKind::LessThanOrEqual => "<=",
            TokenKind::GreaterThan => ">",
            TokenKind::GreaterThanOrEqual => ">=",
            TokenKind::And => "&",
            TokenKind::Or => "|",
            TokenKind::Not => "!",
            TokenKind::OpenParenthesis => "(",
            TokenKind::CloseParenthesis => ")",
            TokenKind::Newline => "newline",
            TokenKind::Eof => "end of file",

            TokenKind::If => "if",
            TokenKind::Then => "then",
            TokenKind::Else => "else",
            TokenKind::End => "end",
            TokenKind::While => "while",
            TokenKind::For => "for",
            TokenKind::To => "to",
            TokenKind::By => "by",
            TokenKind::Do => "do",
            TokenKind::Print => "print",
            TokenKind::Read => "read",
        };

        text.to_string()
    }
}

/// Character stream over the source code that keeps track of where each token starts and ends.
pub struct TokenStream<'a> {
    chars: Peekable<Chars<'a>>,
    position: CharPosition,
    token_start: CharPosition,
}

impl<'a> TokenStream<'a> {
    pub fn new(source_code: &'a str) -> Self {
        Self {
            chars: source_code.chars().peekable(),
            position: CharPosition::default(),
            token_start: CharPosition::default(),
        }
    }

    pub fn next(&mut self) -> Option<char> {
        let ch = self.chars.next()?;

        if ch == '\n' {
            self.position.line_number += 1;
            self.position.char_column = 0;
        } else {
            self.position.char_column += 1;
        }

        Some(ch)
    }

    pub fn peek(&mut self) -> Option<&char> {
        self.chars.peek()
    }

    /// Marks the position of the character about to be consumed as the start of the next token.
    pub fn update_start_position(&mut self) {
        self.token_start = self.position;
    }

    pub fn new_location(&self) -> TextLocation {
        TextLocation::new(self.token_start, self.position)
    }
}
