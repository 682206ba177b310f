//! The structured lowering strategy.
//!
//! Emits one exported `main` whose control flow mirrors the source
//! structurally: native `if`/`loop` constructs, call-frame (local)
//! storage for every variable and temporary. `read` is a plain call to
//! the host's blocking read import, which is only sound because the
//! whole generated program runs inside one host invocation.

use crate::compiler::codegen::expressions::{ExpressionLowerer, InstructionSeq};
use crate::compiler::codegen::module_builder::WasmModuleBuilder;
use crate::compiler::codegen::variables::register_variables;
use crate::compiler::compiler_errors::{CompileError, Diagnostics};
use crate::compiler::parsers::ast_nodes::{
    AstNode, Expression, LogicalOperator, NodeKind,
};
use crate::{return_compiler_error, settings};
use rustc_hash::FxHashMap;
use wasm_encoder::{BlockType, Function, Instruction, ValType};

// Imports occupy the front of the function index space
const PRINT_FUNC_INDEX: u32 = 0;
const READ_FUNC_INDEX: u32 = 1;

pub struct StructuredCodegen<'a> {
    diagnostics: &'a mut Diagnostics,
    variable_indices: FxHashMap<String, u32>,
    local_count: u32,
}

impl<'a> StructuredCodegen<'a> {
    pub fn new(diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            diagnostics,
            variable_indices: FxHashMap::default(),
            local_count: 0,
        }
    }

    /// Lowers the whole program into the module builder:
    /// imports, one `main` function, and its export.
    pub fn build(
        mut self,
        statements: &[AstNode],
        builder: &mut WasmModuleBuilder,
    ) -> Result<(), CompileError> {
        let print_type = builder.add_function_type(vec![ValType::I32], vec![]);
        builder.add_import_function(
            settings::HOST_MODULE,
            settings::PRINT_IMPORT_NAME,
            print_type,
        );

        let read_type = builder.add_function_type(vec![], vec![ValType::I32]);
        builder.add_import_function(
            settings::HOST_MODULE,
            settings::READ_IMPORT_NAME,
            read_type,
        );

        register_variables(statements, &mut |name| self.declare_variable(name));

        let body = self.lower_statements(statements)?;

        let main_type = builder.add_function_type(vec![], vec![]);
        let mut main = Function::new([(self.local_count, ValType::I32)]);
        for instruction in &body {
            main.instruction(instruction);
        }
        main.instruction(&Instruction::End);

        let main_index = builder.add_function(main_type, &main);
        builder.add_function_export(settings::MAIN_EXPORT_NAME, main_index);

        Ok(())
    }

    fn declare_variable(&mut self, name: &str) {
        // First registration wins
        if !self.variable_indices.contains_key(name) {
            self.variable_indices
                .insert(name.to_owned(), self.local_count);
            self.local_count += 1;
        }
    }

    fn create_temporary(&mut self) -> u32 {
        let index = self.local_count;
        self.local_count += 1;
        index
    }

    fn variable_index(&self, name: &str) -> Result<u32, CompileError> {
        match self.variable_indices.get(name) {
            Some(index) => Ok(*index),
            // The pre-pass registers every assignment target and loop variable,
            // so a missing slot here is a sprout bug
            None => return_compiler_error!("No local slot was registered for '{}'", name),
        }
    }

    fn lower_statements(&mut self, statements: &[AstNode]) -> Result<InstructionSeq, CompileError> {
        let mut code = Vec::new();
        for statement in statements {
            code.extend(self.lower_statement(statement)?);
        }
        Ok(code)
    }

    fn lower_statement(&mut self, statement: &AstNode) -> Result<InstructionSeq, CompileError> {
        match &statement.kind {
            NodeKind::Assignment(name, value) => {
                let index = self.variable_index(name)?;
                let mut code = self.lower_expression(value);
                code.push(Instruction::LocalSet(index));
                Ok(code)
            }

            NodeKind::Print(value) => {
                let mut code = self.lower_expression(value);
                code.push(Instruction::Call(PRINT_FUNC_INDEX));
                Ok(code)
            }

            NodeKind::If(condition, then_body, else_body) => {
                let mut code = self.lower_expression(condition);
                code.push(Instruction::If(BlockType::Empty));
                code.extend(self.lower_statements(then_body)?);

                if let Some(else_body) = else_body {
                    code.push(Instruction::Else);
                    code.extend(self.lower_statements(else_body)?);
                }

                code.push(Instruction::End);
                Ok(code)
            }

            NodeKind::While(condition, body) => {
                let condition = self.lower_expression(condition);
                let body = self.lower_statements(body)?;
                Ok(self.lower_loop(condition, body))
            }

            NodeKind::For {
                variable,
                start,
                end,
                step,
                body,
            } => {
                let loop_var = self.variable_index(variable)?;

                // The loop bound and step are evaluated once, before the loop
                let mut code = self.lower_expression(start);
                code.push(Instruction::LocalSet(loop_var));

                let end_temp = self.create_temporary();
                code.extend(self.lower_expression(end));
                code.push(Instruction::LocalSet(end_temp));

                let step_temp = self.create_temporary();
                match step {
                    Some(step) => code.extend(self.lower_expression(step)),
                    None => code.push(Instruction::I32Const(1)),
                }
                code.push(Instruction::LocalSet(step_temp));

                // Inclusive ascending test. A negative step makes the loop
                // terminate immediately rather than run backwards.
                let condition = vec![
                    Instruction::LocalGet(loop_var),
                    Instruction::LocalGet(end_temp),
                    Instruction::I32LeS,
                ];

                let mut loop_body = self.lower_statements(body)?;
                loop_body.extend([
                    Instruction::LocalGet(loop_var),
                    Instruction::LocalGet(step_temp),
                    Instruction::I32Add,
                    Instruction::LocalSet(loop_var),
                ]);

                code.extend(self.lower_loop(condition, loop_body));
                Ok(code)
            }
        }
    }

    /// loop { block { br_if exit when the condition fails; body; br loop-head } }
    fn lower_loop(&mut self, condition: InstructionSeq, body: InstructionSeq) -> InstructionSeq {
        let mut code = vec![
            Instruction::Loop(BlockType::Empty),
            Instruction::Block(BlockType::Empty),
        ];
        code.extend(condition);
        code.push(Instruction::I32Eqz);
        code.push(Instruction::BrIf(0)); // exit the inner block
        code.extend(body);
        code.push(Instruction::Br(1)); // back to the loop head
        code.push(Instruction::End);
        code.push(Instruction::End);
        code
    }
}

impl ExpressionLowerer for StructuredCodegen<'_> {
    fn diagnostics(&mut self) -> &mut Diagnostics {
        self.diagnostics
    }

    fn variable_get(&self, name: &str) -> Option<Instruction<'static>> {
        self.variable_indices
            .get(name)
            .map(|index| Instruction::LocalGet(*index))
    }

    fn lower_read(&mut self) -> InstructionSeq {
        vec![Instruction::Call(READ_FUNC_INDEX)]
    }

    fn lower_logical(
        &mut self,
        op: LogicalOperator,
        lhs: &Expression,
        rhs: &Expression,
    ) -> InstructionSeq {
        let mut code = self.lower_expression(lhs);
        let rhs_code = self.lower_expression(rhs);

        // Store the left operand in a temporary so it's only evaluated once
        let temp = self.create_temporary();
        code.push(Instruction::LocalSet(temp));
        code.push(Instruction::LocalGet(temp));
        code.push(Instruction::If(BlockType::Result(ValType::I32)));

        match op {
            LogicalOperator::And => {
                code.extend(rhs_code);
                code.push(Instruction::Else);
                code.push(Instruction::LocalGet(temp));
            }
            LogicalOperator::Or => {
                code.push(Instruction::LocalGet(temp));
                code.push(Instruction::Else);
                code.extend(rhs_code);
            }
        }

        code.push(Instruction::End);
        code
    }
}
