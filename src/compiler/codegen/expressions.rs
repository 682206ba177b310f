use crate::compiler::compiler_errors::Diagnostics;
use crate::compiler::parsers::ast_nodes::{
    BinaryOperator, Expression, ExpressionKind, LogicalOperator, UnaryOperator,
};
use wasm_encoder::Instruction;

pub type InstructionSeq = Vec<Instruction<'static>>;

/// Fixed table mapping source operators to their i32 wasm instruction.
/// Division and comparisons are signed.
pub fn binary_op_instruction(op: BinaryOperator) -> Instruction<'static> {
    match op {
        BinaryOperator::Add => Instruction::I32Add,
        BinaryOperator::Subtract => Instruction::I32Sub,
        BinaryOperator::Multiply => Instruction::I32Mul,
        BinaryOperator::Divide => Instruction::I32DivS,
        BinaryOperator::Modulus => Instruction::I32RemS,
        BinaryOperator::Equality => Instruction::I32Eq,
        BinaryOperator::NotEqual => Instruction::I32Ne,
        BinaryOperator::LessThan => Instruction::I32LtS,
        BinaryOperator::LessThanOrEqual => Instruction::I32LeS,
        BinaryOperator::GreaterThan => Instruction::I32GtS,
        BinaryOperator::GreaterThanOrEqual => Instruction::I32GeS,
    }
}

/// Expression lowering shared by both strategies.
///
/// Everything a strategy has to provide is where the two differ:
/// how a variable slot is read, and the two lowerings that
/// depend on the storage/control model (blocking reads and
/// short-circuit logicals).
///
/// `lower_expression` returns the instruction sequence that leaves the
/// expression's value on the stack. Operands lower left before right.
pub trait ExpressionLowerer {
    fn diagnostics(&mut self) -> &mut Diagnostics;

    /// The instruction that reads the named variable's slot,
    /// or None when no slot was registered for the name.
    fn variable_get(&self, name: &str) -> Option<Instruction<'static>>;

    fn lower_read(&mut self) -> InstructionSeq;

    fn lower_logical(
        &mut self,
        op: LogicalOperator,
        lhs: &Expression,
        rhs: &Expression,
    ) -> InstructionSeq;

    fn lower_expression(&mut self, expression: &Expression) -> InstructionSeq {
        match &expression.kind {
            ExpressionKind::IntLiteral(value) => vec![Instruction::I32Const(*value)],

            ExpressionKind::Variable(name) => match self.variable_get(name) {
                Some(get) => vec![get],
                None => {
                    // Recorded rather than returned so lowering can continue
                    // and surface every undefined variable in one run.
                    // No valid value is produced; the artifact is suppressed later.
                    self.diagnostics()
                        .record_rule_error(format!("Undefined variable: {name}"), expression.location);
                    Vec::new()
                }
            },

            ExpressionKind::Read => self.lower_read(),

            ExpressionKind::Binary(op, lhs, rhs) => {
                let mut code = self.lower_expression(lhs);
                code.extend(self.lower_expression(rhs));
                code.push(binary_op_instruction(*op));
                code
            }

            ExpressionKind::Unary(op, operand) => match op {
                UnaryOperator::Plus => self.lower_expression(operand),

                UnaryOperator::Negate => {
                    // 0 - x
                    let mut code = vec![Instruction::I32Const(0)];
                    code.extend(self.lower_expression(operand));
                    code.push(Instruction::I32Sub);
                    code
                }

                UnaryOperator::Not => {
                    // Logical negation over the 0/1 integer domain
                    let mut code = self.lower_expression(operand);
                    code.push(Instruction::I32Eqz);
                    code
                }
            },

            ExpressionKind::Logical(op, lhs, rhs) => self.lower_logical(*op, lhs, rhs),
        }
    }
}
