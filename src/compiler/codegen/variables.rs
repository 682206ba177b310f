use crate::compiler::parsers::ast_nodes::{AstNode, NodeKind};

/// Registers a storage slot for every assignment target and loop variable
/// before any lowering starts.
///
/// This pass must run to completion first: expression lowering resolves
/// names against the slots registered here and has no fallback.
/// The language has a single flat scope, so forward references
/// are legal purely because registration is a separate pass.
///
/// Slots are registered in first-occurrence order.
/// Registering the same name twice is a no-op (the strategies skip known names).
pub fn register_variables(statements: &[AstNode], declare: &mut impl FnMut(&str)) {
    for statement in statements {
        match &statement.kind {
            NodeKind::Assignment(name, _) => declare(name),

            NodeKind::If(_, then_body, else_body) => {
                register_variables(then_body, declare);
                if let Some(else_body) = else_body {
                    register_variables(else_body, declare);
                }
            }

            NodeKind::While(_, body) => register_variables(body, declare),

            NodeKind::For { variable, body, .. } => {
                declare(variable);
                register_variables(body, declare);
            }

            NodeKind::Print(_) => {}
        }
    }
}
