//! The resumable lowering strategy.
//!
//! The host can't block on input mid-call without freezing its own event
//! loop, so a blocking read has to hand control back instead. The whole
//! program body is compiled into a flat dispatch loop over numbered
//! segments: `main(label)` runs the segment the label names and returns
//! the label to resume with (or the finished sentinel). All storage is
//! module-lifetime globals, because call-frame locals don't survive the
//! return-and-reinvoke cycle. The host deposits each read result through
//! the exported setter before reinvoking.
//!
//! A segment is a maximal run of non-suspending instructions. Every
//! control-flow join and every read forces a segment split. Branches
//! between segments never jump directly into a sibling: they store the
//! target's label and re-enter dispatch through the outer loop.

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

// The resumption label arrives as main's only parameter
const LABEL_PARAM_INDEX: u32 = 0;
const PRINT_FUNC_INDEX: u32 = 0;

/// One lowered instruction inside a segment. Jumps to the dispatch loop
/// stay symbolic until assembly, because their branch depth depends on
/// how many blocks end up wrapping the segment.
#[derive(Debug, Clone)]
pub(crate) enum SegmentInst {
    Wasm(Instruction<'static>),
    /// `br` to the outer loop, re-entering dispatch
    JumpToDispatch,
    /// `br_if` to the outer loop; the guard value is already on the stack
    JumpToDispatchIf,
}

#[derive(Debug, Default)]
pub(crate) struct Segment {
    pub instructions: Vec<SegmentInst>,
}

pub struct ResumableCodegen<'a> {
    diagnostics: &'a mut Diagnostics,
    current_segment: Vec<SegmentInst>,
    sealed_segments: Vec<Segment>,
    variable_globals: FxHashMap<String, u32>,
    global_count: u32,
    read_value_global: u32,
}

impl<'a> ResumableCodegen<'a> {
    pub fn new(diagnostics: &'a mut Diagnostics) -> Self {
        Self {
            diagnostics,
            current_segment: Vec::new(),
            sealed_segments: Vec::new(),
            variable_globals: FxHashMap::default(),
            global_count: 0,
            read_value_global: 0,
        }
    }

    /// Lowers the whole program into the module builder: the print import,
    /// persistent globals, the dispatch-loop `main` and the read-value setter.
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

        register_variables(statements, &mut |name| self.declare_variable(name));
        self.read_value_global = self.new_global();

        self.lower_statements(statements)?;
        self.seal_current_segment();

        let body = assemble_dispatch(self.sealed_segments);

        // Every variable and temporary is a mutable module-lifetime global,
        // initialized once and never individually torn down
        for _ in 0..self.global_count {
            builder.add_global_i32(0, true);
        }

        let setter_type = builder.add_function_type(vec![ValType::I32], vec![]);
        let mut setter = Function::new([]);
        setter.instruction(&Instruction::LocalGet(0));
        setter.instruction(&Instruction::GlobalSet(self.read_value_global));
        setter.instruction(&Instruction::End);
        let setter_index = builder.add_function(setter_type, &setter);
        builder.add_function_export(settings::SET_READ_VALUE_EXPORT_NAME, setter_index);

        let main_type = builder.add_function_type(vec![ValType::I32], vec![ValType::I32]);
        let mut main = Function::new([]);
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
        if !self.variable_globals.contains_key(name) {
            let global = self.new_global();
            self.variable_globals.insert(name.to_owned(), global);
        }
    }

    fn new_global(&mut self) -> u32 {
        let index = self.global_count;
        self.global_count += 1;
        index
    }

    fn variable_global(&self, name: &str) -> Result<u32, CompileError> {
        match self.variable_globals.get(name) {
            Some(index) => Ok(*index),
            // The pre-pass registers every assignment target and loop variable,
            // so a missing slot here is a sprout bug
            None => return_compiler_error!("No global slot was registered for '{}'", name),
        }
    }

    fn emit(&mut self, instruction: Instruction<'static>) {
        self.current_segment.push(SegmentInst::Wasm(instruction));
    }

    fn extend_current(&mut self, code: InstructionSeq) {
        self.current_segment
            .extend(code.into_iter().map(SegmentInst::Wasm));
    }

    /// The label that dispatches into the segment currently being built.
    ///
    /// Branching to label k exits k enclosing blocks and falls into the
    /// instructions of the k-th sealed segment, so the open segment's
    /// label is simply the number of segments sealed so far. This is
    /// also the pre-allocation rule for forward targets: the label of a
    /// not-yet-sealed segment is the sealed count at the moment of need.
    fn current_segment_label(&self) -> u32 {
        self.sealed_segments.len() as u32
    }

    fn seal_current_segment(&mut self) {
        self.sealed_segments.push(Segment {
            instructions: std::mem::take(&mut self.current_segment),
        });
    }

    fn seal_and_index(&mut self) -> usize {
        self.seal_current_segment();
        self.sealed_segments.len() - 1
    }

    /// Appends `label := target; re-enter dispatch` to the open segment
    fn emit_branch_in_current(&mut self, target_label: u32) {
        self.emit(Instruction::I32Const(target_label as i32));
        self.emit(Instruction::LocalSet(LABEL_PARAM_INDEX));
        self.current_segment.push(SegmentInst::JumpToDispatch);
    }

    /// Appends a dispatch branch to an already sealed segment.
    ///
    /// With a guard, the target label is still stored unconditionally;
    /// only the jump itself is conditional. A later branch overwrites
    /// the label before it's ever dispatched on, so this is harmless.
    fn append_branch(
        &mut self,
        segment_index: usize,
        target_label: u32,
        guard: Option<InstructionSeq>,
    ) {
        let segment = &mut self.sealed_segments[segment_index];
        segment
            .instructions
            .push(SegmentInst::Wasm(Instruction::I32Const(target_label as i32)));
        segment
            .instructions
            .push(SegmentInst::Wasm(Instruction::LocalSet(LABEL_PARAM_INDEX)));

        match guard {
            Some(guard) => {
                segment
                    .instructions
                    .extend(guard.into_iter().map(SegmentInst::Wasm));
                segment.instructions.push(SegmentInst::JumpToDispatchIf);
            }
            None => segment.instructions.push(SegmentInst::JumpToDispatch),
        }
    }

    fn lower_statements(&mut self, statements: &[AstNode]) -> Result<(), CompileError> {
        for statement in statements {
            self.lower_statement(statement)?;
        }
        Ok(())
    }

    fn lower_statement(&mut self, statement: &AstNode) -> Result<(), CompileError> {
        match &statement.kind {
            NodeKind::Assignment(name, value) => {
                let global = self.variable_global(name)?;
                let code = self.lower_expression(value);
                self.extend_current(code);
                self.emit(Instruction::GlobalSet(global));
                Ok(())
            }

            NodeKind::Print(value) => {
                let code = self.lower_expression(value);
                self.extend_current(code);
                self.emit(Instruction::Call(PRINT_FUNC_INDEX));
                Ok(())
            }

            NodeKind::If(condition, then_body, else_body) => {
                // The guard is emitted into the condition's segment only
                // after every target label is known
                let mut guard = self.lower_expression(condition);
                guard.push(Instruction::I32Eqz);
                let cond_segment = self.seal_and_index();

                self.lower_statements(then_body)?;
                let then_segment = self.seal_and_index();

                let else_target = self.current_segment_label();

                if let Some(else_body) = else_body {
                    self.lower_statements(else_body)?;
                    self.seal_current_segment();
                    let after_if = self.current_segment_label();

                    // The then-branch skips over the else-branch
                    self.append_branch(then_segment, after_if, None);
                }

                self.append_branch(cond_segment, else_target, Some(guard));
                Ok(())
            }

            NodeKind::While(condition, body) => self.lower_loop(
                |codegen| codegen.lower_expression(condition),
                |codegen| codegen.lower_statements(body),
            ),

            NodeKind::For {
                variable,
                start,
                end,
                step,
                body,
            } => {
                let loop_var = self.variable_global(variable)?;

                let start_code = self.lower_expression(start);
                self.extend_current(start_code);
                self.emit(Instruction::GlobalSet(loop_var));

                let end_temp = self.new_global();
                let end_code = self.lower_expression(end);
                self.extend_current(end_code);
                self.emit(Instruction::GlobalSet(end_temp));

                let step_temp = self.new_global();
                match step {
                    Some(step) => {
                        let step_code = self.lower_expression(step);
                        self.extend_current(step_code);
                    }
                    None => self.emit(Instruction::I32Const(1)),
                }
                self.emit(Instruction::GlobalSet(step_temp));

                let condition = vec![
                    Instruction::GlobalGet(loop_var),
                    Instruction::GlobalGet(end_temp),
                    Instruction::I32LeS,
                ];

                self.lower_loop(
                    |_| condition,
                    |codegen| {
                        codegen.lower_statements(body)?;
                        codegen.extend_current(vec![
                            Instruction::GlobalGet(loop_var),
                            Instruction::GlobalGet(step_temp),
                            Instruction::I32Add,
                        ]);
                        codegen.emit(Instruction::GlobalSet(loop_var));
                        Ok(())
                    },
                )
            }
        }
    }

    /// Shared shape of while and for loops:
    /// a condition segment re-entered by the back edge, a body, and an
    /// exit branch appended to the condition segment once the
    /// loop-exit label exists.
    fn lower_loop<C, B>(&mut self, generate_cond: C, generate_body: B) -> Result<(), CompileError>
    where
        C: FnOnce(&mut Self) -> InstructionSeq,
        B: FnOnce(&mut Self) -> Result<(), CompileError>,
    {
        self.seal_current_segment();
        let loop_head = self.current_segment_label();

        let mut guard = generate_cond(self);
        guard.push(Instruction::I32Eqz);
        let cond_segment = self.seal_and_index();

        generate_body(self)?;
        self.emit_branch_in_current(loop_head);
        self.seal_current_segment();

        let exit_label = self.current_segment_label();
        self.append_branch(cond_segment, exit_label, Some(guard));

        Ok(())
    }
}

impl ExpressionLowerer for ResumableCodegen<'_> {
    fn diagnostics(&mut self) -> &mut Diagnostics {
        self.diagnostics
    }

    fn variable_get(&self, name: &str) -> Option<Instruction<'static>> {
        self.variable_globals
            .get(name)
            .map(|index| Instruction::GlobalGet(*index))
    }

    /// The suspension point. Seals the current segment with
    /// `return <next label>`, handing control back to the host. The next
    /// segment starts by capturing the deposited value into a fresh
    /// persistent temporary, which becomes the expression's value.
    fn lower_read(&mut self) -> InstructionSeq {
        let temp = self.new_global();
        let next_label = self.current_segment_label() + 1;

        self.emit(Instruction::I32Const(next_label as i32));
        self.emit(Instruction::Return);
        self.seal_current_segment();

        self.emit(Instruction::GlobalGet(self.read_value_global));
        self.emit(Instruction::GlobalSet(temp));

        vec![Instruction::GlobalGet(temp)]
    }

    fn lower_logical(
        &mut self,
        op: LogicalOperator,
        lhs: &Expression,
        rhs: &Expression,
    ) -> InstructionSeq {
        let lhs_code = self.lower_expression(lhs);
        let result = self.new_global();
        self.extend_current(lhs_code);
        self.emit(Instruction::GlobalSet(result));
        let lhs_segment = self.seal_and_index();

        let rhs_code = self.lower_expression(rhs);
        self.extend_current(rhs_code);
        self.emit(Instruction::GlobalSet(result));
        self.seal_current_segment();

        // Skip the right operand when the left already decides the result:
        // a falsy left for 'and', a truthy left for 'or'
        let end_label = self.current_segment_label();
        let mut guard = vec![Instruction::GlobalGet(result)];
        if op == LogicalOperator::And {
            guard.push(Instruction::I32Eqz);
        }
        self.append_branch(lhs_segment, end_label, Some(guard));

        vec![Instruction::GlobalGet(result)]
    }
}

/// Folds the sealed segments, in reverse creation order, into the nested
/// block tree of the dispatch loop. Pure function from segments to
/// instructions.
///
/// The innermost block holds a `br_table` keyed on the label parameter.
/// Each wrapping block ends with one segment's instructions, so label k
/// exits k blocks and falls into exactly segment k. Falling off the end
/// of the last segment returns the finished sentinel.
pub(crate) fn assemble_dispatch(segments: Vec<Segment>) -> InstructionSeq {
    let segment_count = segments.len();

    // Label k branches out k blocks; anything past the last segment
    // (including the finished sentinel itself) falls back to the start
    let targets: Vec<u32> = (0..=segment_count as u32).collect();
    let mut body: InstructionSeq = vec![
        Instruction::Block(BlockType::Empty),
        Instruction::LocalGet(LABEL_PARAM_INDEX),
        Instruction::BrTable(targets.into(), 0),
        Instruction::End,
    ];

    for (index, segment) in segments.into_iter().enumerate() {
        // Distance from this segment's instructions out to the dispatch loop
        let jump_depth = (segment_count - index) as u32;

        let mut wrapped = Vec::with_capacity(body.len() + segment.instructions.len() + 2);
        wrapped.push(Instruction::Block(BlockType::Empty));
        wrapped.append(&mut body);

        for instruction in segment.instructions {
            wrapped.push(match instruction {
                SegmentInst::Wasm(instruction) => instruction,
                SegmentInst::JumpToDispatch => Instruction::Br(jump_depth),
                SegmentInst::JumpToDispatchIf => Instruction::BrIf(jump_depth),
            });
        }

        wrapped.push(Instruction::End);
        body = wrapped;
    }

    let mut dispatch = vec![Instruction::Loop(BlockType::Empty)];
    dispatch.append(&mut body);
    dispatch.push(Instruction::I32Const(settings::FINISHED_LABEL));
    dispatch.push(Instruction::Return);
    dispatch.push(Instruction::End);

    dispatch
}
