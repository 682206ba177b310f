pub mod cli;
mod file_output;
pub mod settings;

pub mod compiler {
    pub mod compiler_dev_logging;
    pub mod compiler_errors;

    pub mod parsers {
        pub mod ast_nodes;
        pub mod build_ast;
        pub mod tokenizer;
        pub mod tokens;
    }

    pub mod codegen {
        pub mod build_wasm;
        pub mod expressions;
        pub mod module_builder;
        pub mod resumable;
        pub mod structured;
        pub mod variables;
    }
}

#[cfg(test)]
mod compiler_tests {
    mod codegen_tests;
    mod output_tests;
    mod parser_tests;
    mod resumable_tests;
    mod tokenizer_tests;
}

use crate::compiler::codegen::build_wasm::new_wasm_module;
use crate::compiler::compiler_errors::{CompileError, Diagnostics};
use crate::compiler::parsers::ast_nodes::AstNode;
use crate::compiler::parsers::build_ast::new_ast;
use crate::compiler::parsers::tokenizer::tokenize;
use crate::compiler::parsers::tokens::Token;

/// How blocking reads are lowered.
///
/// Structured emits one function with native control flow and a
/// synchronous `read` import: only usable where the host can block on
/// input inside the call. Resumable re-expresses the program as an
/// externally driven state machine that returns to the host at every
/// read and resumes where it left off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    #[default]
    Structured,
    Resumable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Resumable,
    Structured,
    WatOnly,
    DisableTimers,
}

/// A validated wasm module plus its textual form
#[derive(Debug, Clone)]
pub struct CompiledProgram {
    pub wasm: Vec<u8>,
    pub wat: String,
}

pub struct Compiler {
    strategy: Strategy,
}

impl Compiler {
    pub fn new(strategy: Strategy) -> Self {
        Self { strategy }
    }

    /// -----------------------------
    ///          TOKENIZER
    /// -----------------------------
    pub fn source_to_tokens(&self, source_code: &str) -> Result<Vec<Token>, CompileError> {
        tokenize(source_code)
    }

    /// -----------------------------
    ///         AST CREATION
    /// -----------------------------
    /// Syntax errors are collected into the diagnostics list with
    /// per-statement recovery rather than aborting at the first one.
    pub fn tokens_to_ast(&self, tokens: &[Token], diagnostics: &mut Diagnostics) -> Vec<AstNode> {
        new_ast(tokens, diagnostics)
    }

    /// -----------------------
    ///        BACKEND
    ///    (Wasm Generation)
    /// -----------------------
    /// Runs the variable pre-pass, then lowers under the chosen strategy.
    pub fn ast_to_wasm(
        &self,
        ast: &[AstNode],
        diagnostics: Diagnostics,
    ) -> Result<CompiledProgram, Vec<CompileError>> {
        new_wasm_module(ast, self.strategy, diagnostics)
    }

    /// Full pipeline for one source file.
    /// Produces either an artifact or every error found, never both.
    pub fn compile(&self, source_code: &str) -> Result<CompiledProgram, Vec<CompileError>> {
        let mut diagnostics = Diagnostics::new();

        let tokens = match self.source_to_tokens(source_code) {
            Ok(tokens) => tokens,
            Err(e) => {
                diagnostics.record(e);
                return Err(diagnostics.into_errors());
            }
        };

        let ast = self.tokens_to_ast(&tokens, &mut diagnostics);

        // The tree may be structurally invalid after syntax errors,
        // so code generation is skipped entirely
        if diagnostics.has_errors() {
            return Err(diagnostics.into_errors());
        }

        self.ast_to_wasm(&ast, diagnostics)
    }
}

/// Compile one source string under the given strategy
pub fn compile(source_code: &str, strategy: Strategy) -> Result<CompiledProgram, Vec<CompileError>> {
    Compiler::new(strategy).compile(source_code)
}
