use crate::circuit::word::Word;
use crate::circuit::{Graph, NodeId};

//
// Public Interface
//

/// Gate-level construction strategy, selected once per run. The same
/// CPU code runs against either implementation: `ConcreteFactory`
/// executes every gate immediately, `CircuitFactory` records it as a
/// graph node. AND and XOR are the only primitive gates; everything
/// else derives from them, and the AND tally is the cost metric the
/// target evaluation environments care about.
pub trait BitFactory {
    type Bit: Clone;

    fn constant(&mut self, value: bool) -> Self::Bit;

    /// Realizes a named state bit: a constant for the concrete factory,
    /// a fresh INPUT node for the circuit factory.
    fn seed(&mut self, name: &str, init: Option<bool>) -> Self::Bit;

    fn and(&mut self, a: &Self::Bit, b: &Self::Bit) -> Self::Bit;

    fn xor(&mut self, a: &Self::Bit, b: &Self::Bit) -> Self::Bit;

    fn not(&mut self, a: &Self::Bit) -> Self::Bit {
        let t = self.constant(true);
        self.xor(a, &t)
    }

    fn or(&mut self, a: &Self::Bit, b: &Self::Bit) -> Self::Bit {
        let both = self.and(a, b);
        let either = self.xor(a, b);
        self.xor(&both, &either)
    }

    /// Selects `a` when `ctrl` is true, `b` otherwise, with a single
    /// AND gate per selected bit.
    fn mux(&mut self, ctrl: &Self::Bit, a: &Self::Bit, b: &Self::Bit) -> Self::Bit {
        let diff = self.xor(a, b);
        let gated = self.and(ctrl, &diff);
        self.xor(b, &gated)
    }

    fn and_count(&self) -> u64;

    fn xor_count(&self) -> u64;
}

/// Executes gates on plain booleans while tallying them.
#[derive(Debug, Default)]
pub struct ConcreteFactory {
    and_count: u64,
    xor_count: u64,
}

impl ConcreteFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn extract_bit(&self, bit: &bool) -> u64 {
        *bit as u64
    }

    pub fn extract(&self, word: &Word<bool>) -> u64 {
        word.bits()
            .iter()
            .enumerate()
            .fold(0, |acc, (i, bit)| acc | (*bit as u64) << i)
    }
}

impl BitFactory for ConcreteFactory {
    type Bit = bool;

    fn constant(&mut self, value: bool) -> bool {
        value
    }

    fn seed(&mut self, name: &str, init: Option<bool>) -> bool {
        init.unwrap_or_else(|| panic!("concrete state '{}' requires an initial value", name))
    }

    fn and(&mut self, a: &bool, b: &bool) -> bool {
        self.and_count += 1;
        *a && *b
    }

    fn xor(&mut self, a: &bool, b: &bool) -> bool {
        self.xor_count += 1;
        *a ^ *b
    }

    fn and_count(&self) -> u64 {
        self.and_count
    }

    fn xor_count(&self) -> u64 {
        self.xor_count
    }
}

/// Appends gates to an owned `Graph` and hands out node indices as
/// bits. One factory accumulates one graph across all ticks fed
/// through it and must not be shared between logical runs.
#[derive(Debug, Default)]
pub struct CircuitFactory {
    graph: Graph,
    and_count: u64,
    xor_count: u64,
}

impl CircuitFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&mut self, name: &str) -> NodeId {
        self.graph.input(name)
    }

    pub fn export(&mut self, name: &str, bit: NodeId) {
        self.graph.output(name, bit);
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn finish(self) -> Graph {
        self.graph
    }
}

impl BitFactory for CircuitFactory {
    type Bit = NodeId;

    fn constant(&mut self, value: bool) -> NodeId {
        self.graph.constant(value)
    }

    fn seed(&mut self, name: &str, _init: Option<bool>) -> NodeId {
        self.graph.input(name)
    }

    fn and(&mut self, a: &NodeId, b: &NodeId) -> NodeId {
        self.and_count += 1;
        self.graph.and(*a, *b)
    }

    fn xor(&mut self, a: &NodeId, b: &NodeId) -> NodeId {
        self.xor_count += 1;
        self.graph.xor(*a, *b)
    }

    fn and_count(&self) -> u64 {
        self.and_count
    }

    fn xor_count(&self) -> u64 {
        self.xor_count
    }
}
