mod common;

use common::run_program;
use gatecpu::assembler::Program;
use gatecpu::machine::{Condition, Mode, Opcode, Reg};

#[test]
fn stored_words_can_be_loaded_back() {
    let mut p = Program::new();
    p.instr(Opcode::Load, Mode::Immediate, Reg::R1, 7u64)
        .instr(Opcode::Store, Mode::Immediate, Reg::R1, 8u64)
        .instr(Opcode::Load, Mode::Immediate, Reg::R0, 0u64)
        .instr(Opcode::Load, Mode::Indexed, Reg::R2, 8u64)
        .halt("done");
    let run = run_program(&p, 300);
    assert_eq!(run.memory(8), 7);
    assert_eq!(run.register("r2"), 7);
    assert_eq!(run.ticks, 5);
}

#[test]
fn branch_follows_the_negative_flag() {
    let mut p = Program::new();
    p.instr(Opcode::Load, Mode::Immediate, Reg::R0, 5u64)
        .instr(Opcode::Cmp, Mode::Immediate, Reg::R0, 9u64)
        .branch(Condition::Lt, "taken")
        .instr(Opcode::Load, Mode::Immediate, Reg::R1, 1u64)
        .halt("fallthrough")
        .label("taken")
        .instr(Opcode::Load, Mode::Immediate, Reg::R1, 2u64)
        .halt("done");
    let run = run_program(&p, 300);
    assert_eq!(run.register("r1"), 2);

    let mut p = Program::new();
    p.instr(Opcode::Load, Mode::Immediate, Reg::R0, 5u64)
        .instr(Opcode::Cmp, Mode::Immediate, Reg::R0, 3u64)
        .branch(Condition::Lt, "taken")
        .instr(Opcode::Load, Mode::Immediate, Reg::R1, 1u64)
        .halt("fallthrough")
        .label("taken")
        .instr(Opcode::Load, Mode::Immediate, Reg::R1, 2u64)
        .halt("done");
    let run = run_program(&p, 300);
    assert_eq!(run.register("r1"), 1);
}

#[test]
fn loop_runs_its_body_counter_many_times() {
    let mut p = Program::new();
    p.instr(Opcode::Load, Mode::Immediate, Reg::R0, 3u64)
        .label("body")
        .instr(Opcode::Add, Mode::Immediate, Reg::R1, 2u64)
        .instr(Opcode::Loop, Mode::Immediate, Reg::R0, "body")
        .halt("done");
    let run = run_program(&p, 300);
    assert_eq!(run.register("r1"), 6);
    assert_eq!(run.register("r0"), 0);
}

#[test]
fn rotation_moves_the_high_bit_around() {
    let mut p = Program::new();
    p.instr(Opcode::Load, Mode::Immediate, Reg::R0, 0u64)
        .instr(Opcode::Rol, Mode::Indexed, Reg::R1, "pattern")
        .instr(Opcode::Rol, Mode::Immediate, Reg::R2, 3u64)
        .halt("done")
        .label("pattern")
        .data(0x8001);
    let run = run_program(&p, 300);
    assert_eq!(run.register("r1"), 0x0003);
    assert_eq!(run.register("r2"), 6);
}

#[test]
fn flags_can_be_captured_as_a_word() {
    let mut p = Program::new();
    p.instr(Opcode::Load, Mode::Immediate, Reg::R0, 4u64)
        .instr(Opcode::Cmp, Mode::Immediate, Reg::R0, 4u64)
        .instr(Opcode::Stf, Mode::Immediate, Reg::R2, 0u64)
        .instr(Opcode::Sub, Mode::Immediate, Reg::R0, 1u64)
        .instr(Opcode::Stf, Mode::Immediate, Reg::R3, 0u64)
        .halt("done");
    let run = run_program(&p, 300);
    // after the compare: zero set, negative clear, carry untouched
    assert_eq!(run.register("r2"), 0b001);
    // the subtraction had no borrow, so it sets the carry
    assert_eq!(run.register("r3"), 0b101);
    assert_eq!(run.register("r0"), 3);
}

#[test]
fn modulo_by_repeated_subtraction() {
    let mut p = Program::new();
    p.instr(Opcode::Load, Mode::Immediate, Reg::R1, 23u64)
        .label("next")
        .instr(Opcode::Cmp, Mode::Immediate, Reg::R1, 10u64)
        .branch(Condition::Lt, "done")
        .instr(Opcode::Sub, Mode::Immediate, Reg::R1, 10u64)
        .jump("next")
        .label("done")
        .instr(Opcode::Store, Mode::Immediate, Reg::R1, 7u64)
        .halt("spin");
    let run = run_program(&p, 300);
    assert_eq!(run.register("r1"), 3);
    assert_eq!(run.memory(7), 3);
}

#[test]
fn indexed_stores_fill_a_region() {
    let mut p = Program::new();
    p.instr(Opcode::Load, Mode::Immediate, Reg::R1, 9u64)
        .instr(Opcode::Load, Mode::Immediate, Reg::R0, 3u64)
        .label("fill")
        .instr(Opcode::Store, Mode::Indexed, Reg::R1, 4u64)
        .instr(Opcode::Loop, Mode::Immediate, Reg::R0, "fill")
        .halt("done");
    let run = run_program(&p, 300);
    for index in 5..8 {
        assert_eq!(run.memory(index), 9, "memory[{}]", index);
    }
    assert_eq!(run.memory(8), 0);
    assert_eq!(run.register("r0"), 0);
}
