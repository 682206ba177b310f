use crate::compiler::parsers::tokens::TextLocation;
use colour::{e_dark_magenta, e_magenta_ln, e_red_ln, e_yellow_ln, red_ln};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub msg: String,
    pub location: TextLocation,
    pub error_type: ErrorType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorType {
    Syntax,
    Rule,
    File,
    Config,
    Compiler,
}

impl CompileError {
    pub fn new(msg: impl Into<String>, location: TextLocation, error_type: ErrorType) -> Self {
        CompileError {
            msg: msg.into(),
            location,
            error_type,
        }
    }

    pub fn new_syntax_error(msg: impl Into<String>, location: TextLocation) -> Self {
        Self::new(msg, location, ErrorType::Syntax)
    }

    pub fn new_rule_error(msg: impl Into<String>, location: TextLocation) -> Self {
        Self::new(msg, location, ErrorType::Rule)
    }

    /// Internal compiler bug, not the user's fault
    pub fn compiler_error(msg: impl Into<String>) -> Self {
        Self::new(msg, TextLocation::default(), ErrorType::Compiler)
    }

    pub fn file_error(msg: impl Into<String>) -> Self {
        Self::new(msg, TextLocation::default(), ErrorType::File)
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(msg, TextLocation::default(), ErrorType::Config)
    }
}

// Lines are reported 1-based, columns 0-based (the column of the offending token's start)
impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}:{} {}",
            self.location.start_pos.line_number + 1,
            self.location.start_pos.char_column,
            self.msg
        )
    }
}

pub fn error_type_to_str(e_type: &ErrorType) -> &'static str {
    match e_type {
        ErrorType::Syntax => "Syntax Error",
        ErrorType::Rule => "Language Rule Violation",
        ErrorType::File => "File Error",
        ErrorType::Config => "Malformed Config",
        ErrorType::Compiler => "Compiler Bug",
    }
}

/// Collects every error raised during one compilation.
///
/// Recording never fails and never aborts the current pass,
/// so several errors can surface in a single run.
/// Any compilation that ends with `has_errors()` produces no artifact.
#[derive(Debug, Default)]
pub struct Diagnostics {
    pub errors: Vec<CompileError>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics { errors: Vec::new() }
    }

    pub fn record(&mut self, error: CompileError) {
        self.errors.push(error);
    }

    pub fn record_rule_error(&mut self, msg: impl Into<String>, location: TextLocation) {
        self.errors.push(CompileError::new_rule_error(msg, location));
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn into_errors(self) -> Vec<CompileError> {
        self.errors
    }
}

pub fn print_errors(errors: &[CompileError], source_code: &str) {
    for error in errors {
        print_formatted_error(error, source_code);
    }
}

pub fn print_formatted_error(e: &CompileError, source_code: &str) {
    let line_number = e.location.start_pos.line_number.max(0) as usize;

    match e.error_type {
        ErrorType::Syntax => {
            eprint!("\n(╯°□°)╯ ");
            e_red_ln!("{}", error_type_to_str(&e.error_type));
        }

        ErrorType::Rule => {
            eprint!("\nヽ(˶°o°)ﾉ ");
            e_red_ln!("{}", error_type_to_str(&e.error_type));
        }

        ErrorType::File => {
            e_yellow_ln!("🏚 Can't find/read file or directory");
            e_red_ln!("  {}", e.msg);
            return;
        }

        ErrorType::Config => {
            e_yellow_ln!("Malformed sprout.toml");
            e_red_ln!("  {}", e.msg);
            return;
        }

        ErrorType::Compiler => {
            eprint!("\nヽ༼☉ ‿ ⚆༽ﾉ ");
            e_yellow_ln!("COMPILER BUG - compiler developer skill issue (not your fault)");
            e_red_ln!("  {}", e.msg);
            return;
        }
    }

    e_dark_magenta!("Line ");
    e_magenta_ln!("{}", line_number + 1);
    e_red_ln!("  {}", e.msg);

    // Show the offending line with the error span underlined
    let line = source_code.lines().nth(line_number).unwrap_or_default();
    println!("\n{line}");

    print!(
        "{}",
        " ".repeat(e.location.start_pos.char_column.max(0) as usize)
    );

    let length_of_underline =
        (e.location.end_pos.char_column - e.location.start_pos.char_column).max(1) as usize;
    red_ln!("{}", "^".repeat(length_of_underline));
}

/// Returns a new CompileError for malformed code.
///
/// Usage: `return_syntax_error!(location, "Expected '{}' here", token)`;
#[macro_export]
macro_rules! return_syntax_error {
    ($location:expr, $($arg:tt)*) => {
        return Err($crate::compiler::compiler_errors::CompileError::new_syntax_error(
            format!($($arg)*),
            $location,
        ))
    };
}

/// Returns a new CompileError for language rule violations (e.g. undefined variables).
///
/// Usage: `return_rule_error!(location, "Undefined variable: {}", name)`;
#[macro_export]
macro_rules! return_rule_error {
    ($location:expr, $($arg:tt)*) => {
        return Err($crate::compiler::compiler_errors::CompileError::new_rule_error(
            format!($($arg)*),
            $location,
        ))
    };
}

/// Returns a new CompileError for internal compiler bugs.
///
/// These indicate a bug in sprout itself, not in the user's code.
#[macro_export]
macro_rules! return_compiler_error {
    ($($arg:tt)*) => {
        return Err($crate::compiler::compiler_errors::CompileError::compiler_error(
            format!($($arg)*),
        ))
    };
}

/// Returns a new CompileError for file system problems.
#[macro_export]
macro_rules! return_file_error {
    ($($arg:tt)*) => {
        return Err($crate::compiler::compiler_errors::CompileError::file_error(
            format!($($arg)*),
        ))
    };
}
