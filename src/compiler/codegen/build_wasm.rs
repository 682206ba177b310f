use crate::codegen_log;
use crate::compiler::codegen::module_builder::WasmModuleBuilder;
use crate::compiler::codegen::resumable::ResumableCodegen;
use crate::compiler::codegen::structured::StructuredCodegen;
use crate::compiler::compiler_errors::{CompileError, Diagnostics};
use crate::compiler::parsers::ast_nodes::AstNode;
use crate::{CompiledProgram, Strategy};
use wasmparser::Validator;

/// Lowers the AST into a validated wasm module under the chosen strategy.
///
/// Semantic errors recorded during lowering (undefined variables) don't
/// abort it, so several can surface in one run, but any recorded error
/// suppresses the artifact.
pub fn new_wasm_module(
    statements: &[AstNode],
    strategy: Strategy,
    mut diagnostics: Diagnostics,
) -> Result<CompiledProgram, Vec<CompileError>> {
    let mut builder = WasmModuleBuilder::new();

    let lowered = match strategy {
        Strategy::Structured => {
            StructuredCodegen::new(&mut diagnostics).build(statements, &mut builder)
        }
        Strategy::Resumable => {
            ResumableCodegen::new(&mut diagnostics).build(statements, &mut builder)
        }
    };

    if let Err(e) = lowered {
        diagnostics.record(e);
    }

    if diagnostics.has_errors() {
        return Err(diagnostics.into_errors());
    }

    let wasm = builder.finish();

    // The module is checked before it ever leaves the compiler.
    // A failure here means sprout emitted bad code, not that the user did
    if let Err(e) = Validator::new().validate_all(&wasm) {
        return Err(vec![CompileError::compiler_error(format!(
            "Generated an invalid wasm module: {e}"
        ))]);
    }

    let wat = match wasmprinter::print_bytes(&wasm) {
        Ok(wat) => wat,
        Err(e) => {
            return Err(vec![CompileError::compiler_error(format!(
                "Could not render the module as text: {e}"
            ))]);
        }
    };

    codegen_log!("{wat}");

    Ok(CompiledProgram { wasm, wat })
}
