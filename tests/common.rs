#![allow(dead_code)]

use gatecpu::assembler::Program;
use gatecpu::circuit::factory::ConcreteFactory;
use gatecpu::circuit::state::State;
use gatecpu::emulate::run_to_fixpoint;
use gatecpu::machine::Cpu;

pub const MEMORY_SIZE: usize = 16;

pub struct Run {
    pub factory: ConcreteFactory,
    pub state: State<bool>,
    pub ticks: u64,
}

impl Run {
    pub fn register(&self, name: &str) -> u64 {
        self.factory.extract(self.state.word_register(name))
    }

    pub fn memory(&self, index: usize) -> u64 {
        self.factory
            .extract(&self.state.word_array_register("memory")[index])
    }
}

pub fn run_program(program: &Program, max_ticks: u64) -> Run {
    let image = program.assemble().expect("program assembles");
    let cpu = Cpu::new(MEMORY_SIZE);
    let mut factory = ConcreteFactory::new();
    let mut state = cpu.state_factory(&image).create_state(&mut factory);
    let ticks =
        run_to_fixpoint(&cpu, &mut factory, &mut state, max_ticks).expect("program halts");
    Run {
        factory,
        state,
        ticks,
    }
}
