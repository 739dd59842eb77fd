use crate::circuit::factory::ConcreteFactory;
use crate::circuit::state::State;
use crate::machine::{decode, Cpu, MachineError};
use log::{info, trace};
use std::fmt::Write;

//
// Public Interface
//

/// Runs the machine concretely until the program counter repeats, which
/// is the only notion of halting the gate model admits. Returns the
/// number of executed ticks. Each fetched word is decoded on the native
/// side first, so a corrupt image fails fast instead of silently
/// executing as a no-op.
pub fn run_to_fixpoint(
    cpu: &Cpu,
    f: &mut ConcreteFactory,
    state: &mut State<bool>,
    max_ticks: u64,
) -> Result<u64, MachineError> {
    let mut last_pc = None;
    for tick in 0..max_ticks {
        let pc = f.extract(state.word_register("pc"));
        if last_pc == Some(pc) {
            info!("Halted at pc={} after {} ticks", pc, tick);
            return Ok(tick);
        }
        let memory = state.word_array_register("memory");
        if pc as usize >= memory.len() {
            return Err(MachineError::PcOutOfRange(pc));
        }
        let word = f.extract(&memory[pc as usize]);
        let instr = decode(word, pc)?;
        trace!("{:3}: {:#06x}  {}", pc, word, instr);
        last_pc = Some(pc);
        cpu.tick(f, state);
    }
    Err(MachineError::Diverged(max_ticks))
}

/// Renders the final machine state for the `--dump` flag.
pub fn dump_state(f: &ConcreteFactory, state: &State<bool>) -> String {
    let mut out = String::new();
    writeln!(out, "pc    = {:#06x}", f.extract(state.word_register("pc"))).unwrap();
    for k in 0..crate::machine::DATA_REGISTERS {
        let name = crate::machine::register_name(k);
        writeln!(out, "{}    = {:#06x}", name, f.extract(state.word_register(&name))).unwrap();
    }
    writeln!(
        out,
        "flags = zero:{} neg:{} carry:{}",
        *state.bit_register("flag_zero") as u8,
        *state.bit_register("flag_neg") as u8,
        *state.bit_register("flag_carry") as u8
    )
    .unwrap();
    for (index, cell) in state.word_array_register("memory").iter().enumerate() {
        let value = f.extract(cell);
        writeln!(out, "{:3}: {:#06x} {:5}", index, value, value).unwrap();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::{encode, Mode, Opcode, Reg};

    #[test]
    fn self_jump_halts() {
        let cpu = Cpu::new(4);
        let image = [
            encode(Opcode::Load, Mode::Immediate, Reg::R1.code(), 9),
            encode(Opcode::Jump, Mode::Immediate, 0, 1),
        ];
        let mut f = ConcreteFactory::new();
        let mut state = cpu.state_factory(&image).create_state(&mut f);
        let ticks = run_to_fixpoint(&cpu, &mut f, &mut state, 300).unwrap();
        // the load, then one jump that lands on itself
        assert_eq!(ticks, 2);
        assert_eq!(f.extract(state.word_register("r1")), 9);
    }

    #[test]
    fn ping_pong_never_stabilizes() {
        let cpu = Cpu::new(2);
        let image = [
            encode(Opcode::Jump, Mode::Immediate, 0, 1),
            encode(Opcode::Jump, Mode::Immediate, 0, 0),
        ];
        let mut f = ConcreteFactory::new();
        let mut state = cpu.state_factory(&image).create_state(&mut f);
        let result = run_to_fixpoint(&cpu, &mut f, &mut state, 50);
        assert!(matches!(result, Err(MachineError::Diverged(50))));
    }

    #[test]
    fn corrupt_image_is_fatal() {
        let cpu = Cpu::new(2);
        let mut f = ConcreteFactory::new();
        let mut state = cpu.state_factory(&[0xf000]).create_state(&mut f);
        let result = run_to_fixpoint(&cpu, &mut f, &mut state, 10);
        assert!(matches!(
            result,
            Err(MachineError::IllegalOpcode { address: 0, .. })
        ));
    }

    #[test]
    fn dump_covers_every_cell() {
        let cpu = Cpu::new(3);
        let mut f = ConcreteFactory::new();
        let state = cpu.state_factory(&[1, 2, 3]).create_state(&mut f);
        let dump = dump_state(&f, &state);
        assert!(dump.contains("pc    = 0x0000"));
        assert!(dump.contains("  2: 0x0003     3"));
    }
}
