use crate::circuit::factory::{BitFactory, CircuitFactory};
use crate::circuit::state::{State, StateFactory};
use crate::circuit::word::Word;
use crate::circuit::Graph;
use log::info;
use std::fmt;
use std::ops::Range;
use strum::{Display, FromRepr};
use thiserror::Error;

//
// Public Interface
//

pub const WORD_WIDTH: usize = 16;
pub const VALUE_BITS: usize = 9;
pub const DATA_REGISTERS: usize = 4;

pub const VALUE_FIELD: Range<usize> = 0..9;
pub const TARGET_FIELD: Range<usize> = 9..11;
pub const MODE_BIT: usize = 11;
pub const OPCODE_FIELD: Range<usize> = 12..16;

#[derive(Clone, Copy, Debug, Display, Eq, FromRepr, PartialEq)]
#[strum(serialize_all = "lowercase")]
#[repr(u64)]
pub enum Opcode {
    Load = 0,
    Store = 1,
    Add = 2,
    Sub = 3,
    Cmp = 4,
    Bra = 5,
    Jump = 6,
    Loop = 7,
    Rol = 8,
    Stf = 9,
}

#[derive(Clone, Copy, Debug, Display, Eq, FromRepr, PartialEq)]
#[strum(serialize_all = "lowercase")]
#[repr(u64)]
pub enum Condition {
    Eq = 0,
    Ne = 1,
    Lt = 2,
    Ge = 3,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mode {
    Immediate,
    Indexed,
}

#[derive(Clone, Copy, Debug, Display, Eq, FromRepr, PartialEq)]
#[strum(serialize_all = "lowercase")]
#[repr(u64)]
pub enum Reg {
    R0 = 0,
    R1 = 1,
    R2 = 2,
    R3 = 3,
}

#[derive(Error, Debug)]
pub enum MachineError {
    #[error("illegal opcode {opcode:#x} at address {address}")]
    IllegalOpcode { opcode: u64, address: u64 },
    #[error("program counter {0:#x} outside memory")]
    PcOutOfRange(u64),
    #[error("program counter failed to stabilize within {0} ticks")]
    Diverged(u64),
}

impl Opcode {
    pub fn code(self) -> u64 {
        self as u64
    }
}

impl Condition {
    pub fn code(self) -> u64 {
        self as u64
    }
}

impl Reg {
    pub fn code(self) -> u64 {
        self as u64
    }
}

impl Mode {
    pub fn code(self) -> u64 {
        match self {
            Mode::Immediate => 0,
            Mode::Indexed => 1,
        }
    }
}

/// Packs one instruction into a memory word. The target field carries
/// a register index, or a condition code for BRA.
pub fn encode(opcode: Opcode, mode: Mode, target: u64, value: u64) -> u64 {
    assert!(target >> 2 == 0, "target field is two bits");
    assert!(value >> VALUE_BITS == 0, "value {} does not fit", value);
    opcode.code() << OPCODE_FIELD.start | mode.code() << MODE_BIT | target << TARGET_FIELD.start
        | value
}

/// Concrete-side instruction view, used by the driver and for
/// disassembly in traces. The in-circuit decoder slices the same
/// fields with gates and cannot fail; a code outside the opcode set is
/// a corrupt image and fatal here.
#[derive(Clone, Copy, Debug)]
pub struct Instr {
    pub opcode: Opcode,
    pub mode: Mode,
    pub target: u64,
    pub value: u64,
}

pub fn decode(word: u64, address: u64) -> Result<Instr, MachineError> {
    let code = word >> OPCODE_FIELD.start & 0xf;
    let opcode =
        Opcode::from_repr(code).ok_or(MachineError::IllegalOpcode { opcode: code, address })?;
    let mode = if word >> MODE_BIT & 1 == 1 {
        Mode::Indexed
    } else {
        Mode::Immediate
    };
    Ok(Instr {
        opcode,
        mode,
        target: word >> TARGET_FIELD.start & 0x3,
        value: word & ((1 << VALUE_BITS) - 1),
    })
}

impl fmt::Display for Instr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.opcode {
            Opcode::Bra => {
                let cond = Condition::from_repr(self.target).expect("two-bit field");
                write!(f, "bra {}, {}", cond, self.value)
            }
            Opcode::Jump => write!(f, "jump {}", self.value),
            _ => match self.mode {
                Mode::Immediate => write!(f, "{} r{}, #{}", self.opcode, self.target, self.value),
                Mode::Indexed => write!(f, "{} r{}, [{}+r0]", self.opcode, self.target, self.value),
            },
        }
    }
}

/// The fetch-decode-execute engine. Written entirely against the
/// `BitFactory` gate surface: both branch outcomes of every decision
/// are computed and a mux picks one, so the concrete and the symbolic
/// mode share a single code path by construction.
#[derive(Debug)]
pub struct Cpu {
    memory_size: usize,
}

impl Cpu {
    pub fn new(memory_size: usize) -> Self {
        assert!(
            memory_size >= 1 && memory_size <= 1 << VALUE_BITS,
            "memory size has to be in range: 1 - {}",
            1 << VALUE_BITS
        );
        Self { memory_size }
    }

    pub fn memory_size(&self) -> usize {
        self.memory_size
    }

    /// The machine's initial-value mapping for a given memory image:
    /// program counter and data registers at zero, flags clear, the
    /// image padded with zero words up to the memory size.
    pub fn state_factory(&self, image: &[u64]) -> StateFactory {
        assert!(
            image.len() <= self.memory_size,
            "image of {} words exceeds memory size {}",
            image.len(),
            self.memory_size
        );
        let mut memory = image.to_vec();
        memory.resize(self.memory_size, 0);
        let mut factory = StateFactory::new(WORD_WIDTH);
        factory.word_register("pc", Some(0));
        for k in 0..DATA_REGISTERS {
            factory.word_register(&register_name(k), Some(0));
        }
        factory
            .bit_register("flag_zero", Some(false))
            .bit_register("flag_neg", Some(false))
            .bit_register("flag_carry", Some(false))
            .word_array("memory", &memory);
        factory
    }

    /// One fetch-decode-execute cycle.
    pub fn tick<F: BitFactory>(&self, f: &mut F, state: &mut State<F::Bit>) {
        let pc = state.word_register("pc").clone();
        let memory = state.word_array_register("memory").to_vec();
        let registers: Vec<Word<F::Bit>> = (0..DATA_REGISTERS)
            .map(|k| state.word_register(&register_name(k)).clone())
            .collect();
        let flag_zero = state.bit_register("flag_zero").clone();
        let flag_neg = state.bit_register("flag_neg").clone();
        let flag_carry = state.bit_register("flag_carry").clone();

        // fetch
        let instr = read_memory(f, &memory, &pc);

        // decode
        let opcode = instr.slice(OPCODE_FIELD);
        let mode = instr.bit(MODE_BIT).clone();
        let target = instr.slice(TARGET_FIELD);
        let value = instr.slice(VALUE_FIELD).zero_extend(f, WORD_WIDTH);

        let is_load = opcode.equals_constant(f, Opcode::Load.code());
        let is_store = opcode.equals_constant(f, Opcode::Store.code());
        let is_add = opcode.equals_constant(f, Opcode::Add.code());
        let is_sub = opcode.equals_constant(f, Opcode::Sub.code());
        let is_cmp = opcode.equals_constant(f, Opcode::Cmp.code());
        let is_bra = opcode.equals_constant(f, Opcode::Bra.code());
        let is_jump = opcode.equals_constant(f, Opcode::Jump.code());
        let is_loop = opcode.equals_constant(f, Opcode::Loop.code());
        let is_rol = opcode.equals_constant(f, Opcode::Rol.code());
        let is_stf = opcode.equals_constant(f, Opcode::Stf.code());

        // operand resolution: indexed addresses are r0-relative and
        // wrap at the word width; a store in immediate mode addresses
        // the value field directly
        let (indexed, _) = value.add(f, &registers[0]);
        let address = Word::select(f, &mode, &indexed, &value);
        let loaded = read_memory(f, &memory, &address);
        let operand = Word::select(f, &mode, &loaded, &value);

        // target register, selected by the two-bit field
        let mut target_value = Word::from_constant(f, WORD_WIDTH, 0);
        for (k, register) in registers.iter().enumerate() {
            let hit = target.equals_constant(f, k as u64);
            target_value = Word::select(f, &hit, register, &target_value);
        }

        // every opcode's result is computed unconditionally; selection
        // is the only control flow the gate model has
        let (sum, add_carry) = target_value.add(f, &operand);
        let (diff, sub_carry) = target_value.sub(f, &operand);
        let diff_zero = diff.is_zero(f);
        let diff_neg = diff.msb().clone();
        let rotated = operand.rotate_left();
        let one = Word::from_constant(f, WORD_WIDTH, 1);
        let (decremented, _) = target_value.sub(f, &one);
        let dec_zero = decremented.is_zero(f);
        let loop_taken = f.not(&dec_zero);
        let flags_value = {
            let mut bits = vec![flag_zero.clone(), flag_neg.clone(), flag_carry.clone()];
            while bits.len() < WORD_WIDTH {
                bits.push(f.constant(false));
            }
            Word::from_bits(bits)
        };

        let mut result = target_value.clone();
        result = Word::select(f, &is_load, &operand, &result);
        result = Word::select(f, &is_add, &sum, &result);
        result = Word::select(f, &is_sub, &diff, &result);
        result = Word::select(f, &is_rol, &rotated, &result);
        result = Word::select(f, &is_loop, &decremented, &result);
        result = Word::select(f, &is_stf, &flags_value, &result);

        let mut write_enable = f.or(&is_load, &is_add);
        for bit in [&is_sub, &is_rol, &is_loop, &is_stf].iter() {
            write_enable = f.or(&write_enable, *bit);
        }

        // register writeback
        for (k, register) in registers.iter().enumerate() {
            let hit = target.equals_constant(f, k as u64);
            let enable = f.and(&write_enable, &hit);
            let updated = Word::select(f, &enable, &result, register);
            state.set_word_register(&register_name(k), updated);
        }

        // flags: CMP owns zero and negative, ADD/SUB own carry
        let new_zero = f.mux(&is_cmp, &diff_zero, &flag_zero);
        let new_neg = f.mux(&is_cmp, &diff_neg, &flag_neg);
        let carry_after_add = f.mux(&is_add, &add_carry, &flag_carry);
        let new_carry = f.mux(&is_sub, &sub_carry, &carry_after_add);
        state.set_bit_register("flag_zero", new_zero);
        state.set_bit_register("flag_neg", new_neg);
        state.set_bit_register("flag_carry", new_carry);

        // memory writeback
        let mut updated_memory = Vec::with_capacity(memory.len());
        for (index, cell) in memory.iter().enumerate() {
            let hit = address.equals_constant(f, index as u64);
            let enable = f.and(&is_store, &hit);
            updated_memory.push(Word::select(f, &enable, &target_value, cell));
        }
        state.set_word_array_register("memory", updated_memory);

        // program counter: both outcomes of every branch are computed,
        // then muxed; halting is a self-jump, never a control primitive
        let (next, _) = pc.add(f, &one);
        let condition = branch_condition(f, &target, &flag_zero, &flag_neg);
        let bra_taken = f.and(&is_bra, &condition);
        let next = Word::select(f, &bra_taken, &value, &next);
        let next = Word::select(f, &is_jump, &value, &next);
        let loop_back = f.and(&is_loop, &loop_taken);
        let next = Word::select(f, &loop_back, &value, &next);
        state.set_word_register("pc", next);
    }
}

pub fn register_name(k: usize) -> String {
    format!("r{}", k)
}

/// Runs `ticks` symbolic cycles through a fresh circuit factory and
/// closes the graph over the final state.
pub fn unroll(cpu: &Cpu, image: &[u64], ticks: u64) -> Graph {
    let mut factory = CircuitFactory::new();
    let mut state = cpu.state_factory(image).create_state(&mut factory);
    for tick in 0..ticks {
        time_debug!(format!("Unrolling tick {}", tick), {
            cpu.tick(&mut factory, &mut state)
        });
    }
    state.export(&mut factory);
    info!(
        "Unrolled {} ticks: {} AND gates, {} XOR gates",
        ticks,
        factory.and_count(),
        factory.xor_count()
    );
    factory.finish()
}

//
// Private Implementation
//

// Equality-gated mux cascade over all cells; an address matching no
// cell reads as zero.
fn read_memory<F: BitFactory>(
    f: &mut F,
    memory: &[Word<F::Bit>],
    address: &Word<F::Bit>,
) -> Word<F::Bit> {
    let mut value = Word::from_constant(f, WORD_WIDTH, 0);
    for (index, cell) in memory.iter().enumerate() {
        let hit = address.equals_constant(f, index as u64);
        value = Word::select(f, &hit, cell, &value);
    }
    value
}

fn branch_condition<F: BitFactory>(
    f: &mut F,
    field: &Word<F::Bit>,
    flag_zero: &F::Bit,
    flag_neg: &F::Bit,
) -> F::Bit {
    let not_zero = f.not(flag_zero);
    let not_neg = f.not(flag_neg);
    let mut condition = f.constant(false);
    for (code, flag) in [
        (Condition::Eq, flag_zero),
        (Condition::Ne, &not_zero),
        (Condition::Lt, flag_neg),
        (Condition::Ge, &not_neg),
    ]
    .iter()
    {
        let hit = field.equals_constant(f, code.code());
        condition = f.mux(&hit, *flag, &condition);
    }
    condition
}
