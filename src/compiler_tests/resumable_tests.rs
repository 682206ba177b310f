use crate::compiler::codegen::resumable::{Segment, SegmentInst, assemble_dispatch};
use crate::{CompiledProgram, Strategy, compile};
use wasm_encoder::Instruction;

fn compile_resumable(source: &str) -> CompiledProgram {
    compile(source, Strategy::Resumable).expect("compilation should succeed")
}

fn segment(instructions: Vec<SegmentInst>) -> Segment {
    Segment { instructions }
}

#[test]
fn dispatch_assembly_wraps_one_block_per_segment() {
    let assembled = assemble_dispatch(vec![segment(vec![SegmentInst::JumpToDispatch])]);

    // loop { block { block { local.get 0; br_table } } br -> loop } -1 return
    assert!(matches!(assembled[0], Instruction::Loop(_)));
    assert!(matches!(assembled[1], Instruction::Block(_)));
    assert!(matches!(assembled[2], Instruction::Block(_)));
    assert!(matches!(assembled[3], Instruction::LocalGet(0)));
    assert!(
        matches!(&assembled[4], Instruction::BrTable(targets, 0) if targets.as_ref() == [0, 1].as_slice())
    );
    assert!(matches!(assembled[5], Instruction::End));

    // The jump re-enters the dispatch loop: out of one wrapper block
    // plus the segment's own block
    assert!(matches!(assembled[6], Instruction::Br(1)));
    assert!(matches!(assembled[7], Instruction::End));

    // Falling off the last segment returns the finished sentinel
    assert!(matches!(assembled[8], Instruction::I32Const(-1)));
    assert!(matches!(assembled[9], Instruction::Return));
    assert!(matches!(assembled[10], Instruction::End));
    assert_eq!(assembled.len(), 11);
}

#[test]
fn dispatch_depth_grows_with_earlier_segments() {
    // Segments are folded in reverse creation order, so the first
    // segment sits innermost and jumps out through the most blocks
    let assembled = assemble_dispatch(vec![
        segment(vec![SegmentInst::JumpToDispatch]),
        segment(vec![SegmentInst::JumpToDispatchIf]),
    ]);

    let depths: Vec<String> = assembled
        .iter()
        .filter(|inst| matches!(inst, Instruction::Br(_) | Instruction::BrIf(_)))
        .map(|inst| format!("{inst:?}"))
        .collect();

    assert_eq!(depths, vec!["Br(2)", "BrIf(1)"]);

    assert!(
        matches!(&assembled[5], Instruction::BrTable(targets, 0) if targets.as_ref() == [0, 1, 2].as_slice())
    );
}

#[test]
fn resumable_module_has_the_suspension_interface() {
    let program = compile_resumable("x := read\nprint x");

    assert!(program.wat.contains("(export \"main\""));
    assert!(program.wat.contains("(export \"set_read_value\""));
    assert!(program.wat.contains("br_table"));

    // Reads suspend instead of calling into the host
    assert!(program.wat.contains("\"stdlib\" \"print\""));
    assert!(!program.wat.contains("\"stdlib\" \"read\""));
}

#[test]
fn all_storage_is_persistent_globals() {
    // x, the read-value slot and the read temporary
    let program = compile_resumable("x := read\nprint x");

    let globals = program.wat.matches("(global ").count();
    assert_eq!(globals, 3);

    // Nothing but the label parameter lives in the call frame
    assert!(!program.wat.contains("local.set 1"));
}

#[test]
fn each_read_splits_a_segment() {
    let one_read = compile_resumable("x := read\nprint x");
    let two_reads = compile_resumable("x := read\ny := read\nprint x + y");

    let blocks_in = |wat: &str| wat.matches("block").count();
    assert!(blocks_in(&two_reads.wat) > blocks_in(&one_read.wat));
}

#[test]
fn read_free_programs_still_compile_to_the_dispatch_shape() {
    let program = compile_resumable("for i := 1 to 3 do print i end");

    assert!(program.wat.contains("br_table"));
    assert!(program.wat.contains("(export \"set_read_value\""));
}

#[test]
fn undefined_variables_are_reported_under_the_resumable_strategy_too() {
    let errors = compile("print x", Strategy::Resumable).expect_err("should fail");

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].to_string(), "line 1:6 Undefined variable: x");
}

#[test]
fn reads_in_loop_conditions_are_legal_suspension_points() {
    let program = compile_resumable("while read > 0 do print 1 end");
    assert!(!program.wasm.is_empty());
}

#[test]
fn reads_inside_logicals_and_conditions_compile() {
    let source = r"
x := 1
if read & x then
    print x
end
";
    let program = compile_resumable(source);
    assert!(!program.wasm.is_empty());
}
