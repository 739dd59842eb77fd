use crate::circuit::factory::{BitFactory, CircuitFactory};
use crate::circuit::word::Word;
use crate::circuit::NodeId;
use log::trace;
use std::collections::HashMap;

//
// Public Interface
//

/// Named machine state: scalar word registers, single-bit flag
/// registers and word arrays. Built once per run and mutated in place;
/// names and widths never change afterwards.
#[derive(Clone, Debug)]
pub struct State<B> {
    bits: HashMap<String, B>,
    words: HashMap<String, Word<B>>,
    arrays: HashMap<String, Vec<Word<B>>>,
}

impl<B: Clone> State<B> {
    pub fn bit_register(&self, name: &str) -> &B {
        self.bits
            .get(name)
            .unwrap_or_else(|| panic!("unknown bit register '{}'", name))
    }

    pub fn set_bit_register(&mut self, name: &str, bit: B) {
        let slot = self
            .bits
            .get_mut(name)
            .unwrap_or_else(|| panic!("unknown bit register '{}'", name));
        *slot = bit;
    }

    pub fn word_register(&self, name: &str) -> &Word<B> {
        self.words
            .get(name)
            .unwrap_or_else(|| panic!("unknown word register '{}'", name))
    }

    pub fn set_word_register(&mut self, name: &str, word: Word<B>) {
        let slot = self
            .words
            .get_mut(name)
            .unwrap_or_else(|| panic!("unknown word register '{}'", name));
        assert_eq!(slot.width(), word.width(), "register width is fixed");
        *slot = word;
    }

    pub fn word_array_register(&self, name: &str) -> &[Word<B>] {
        self.arrays
            .get(name)
            .unwrap_or_else(|| panic!("unknown word array '{}'", name))
    }

    pub fn set_word_array_register(&mut self, name: &str, words: Vec<Word<B>>) {
        let slot = self
            .arrays
            .get_mut(name)
            .unwrap_or_else(|| panic!("unknown word array '{}'", name));
        assert_eq!(slot.len(), words.len(), "array length is fixed");
        *slot = words;
    }
}

impl State<NodeId> {
    /// Marks every state bit as a named circuit OUTPUT, closing the
    /// graph over one run's final state. Names follow the same scheme
    /// the inputs were seeded with, so an evaluated circuit can be
    /// compared slot for slot against a concrete run.
    pub fn export(&self, f: &mut CircuitFactory) {
        let mut bit_names: Vec<_> = self.bits.keys().cloned().collect();
        bit_names.sort();
        for name in bit_names {
            f.export(&name, self.bits[&name]);
        }
        let mut word_names: Vec<_> = self.words.keys().cloned().collect();
        word_names.sort();
        for name in word_names {
            for (i, bit) in self.words[&name].bits().iter().enumerate() {
                f.export(&bit_name(&name, i), *bit);
            }
        }
        let mut array_names: Vec<_> = self.arrays.keys().cloned().collect();
        array_names.sort();
        for name in array_names {
            for (index, word) in self.arrays[&name].iter().enumerate() {
                for (i, bit) in word.bits().iter().enumerate() {
                    f.export(&bit_name(&cell_name(&name, index), i), *bit);
                }
            }
        }
    }
}

/// Collects the initial-value mapping and realizes it through whichever
/// factory the run uses.
#[derive(Debug)]
pub struct StateFactory {
    width: usize,
    bits: Vec<(String, Option<bool>)>,
    words: Vec<(String, Option<u64>)>,
    arrays: Vec<(String, Vec<u64>)>,
}

impl StateFactory {
    pub fn new(width: usize) -> Self {
        Self {
            width,
            bits: Vec::new(),
            words: Vec::new(),
            arrays: Vec::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn bit_register(&mut self, name: &str, init: Option<bool>) -> &mut Self {
        self.bits.push((name.to_string(), init));
        self
    }

    pub fn word_register(&mut self, name: &str, init: Option<u64>) -> &mut Self {
        self.words.push((name.to_string(), init));
        self
    }

    pub fn word_array(&mut self, name: &str, values: &[u64]) -> &mut Self {
        self.arrays.push((name.to_string(), values.to_vec()));
        self
    }

    pub fn create_state<F: BitFactory>(&self, f: &mut F) -> State<F::Bit> {
        let mut bits = HashMap::new();
        for (name, init) in &self.bits {
            trace!("Seeding bit register '{}'", name);
            bits.insert(name.clone(), f.seed(name, *init));
        }
        let mut words = HashMap::new();
        for (name, init) in &self.words {
            trace!("Seeding word register '{}'", name);
            words.insert(name.clone(), self.seed_word(f, name, *init));
        }
        let mut arrays = HashMap::new();
        for (name, values) in &self.arrays {
            trace!("Seeding word array '{}' ({} cells)", name, values.len());
            let cells = values
                .iter()
                .enumerate()
                .map(|(index, value)| self.seed_word(f, &cell_name(name, index), Some(*value)))
                .collect();
            arrays.insert(name.clone(), cells);
        }
        State {
            bits,
            words,
            arrays,
        }
    }

    /// The initial values under the same names `create_state` seeds
    /// symbolic inputs with, for binding a generated circuit's inputs.
    pub fn input_bindings(&self) -> HashMap<String, bool> {
        let mut bindings = HashMap::new();
        for (name, init) in &self.bits {
            if let Some(value) = init {
                bindings.insert(name.clone(), *value);
            }
        }
        for (name, init) in &self.words {
            if let Some(value) = init {
                for i in 0..self.width {
                    bindings.insert(bit_name(name, i), value >> i & 1 == 1);
                }
            }
        }
        for (name, values) in &self.arrays {
            for (index, value) in values.iter().enumerate() {
                for i in 0..self.width {
                    bindings.insert(bit_name(&cell_name(name, index), i), value >> i & 1 == 1);
                }
            }
        }
        bindings
    }
}

//
// Private Implementation
//

fn cell_name(name: &str, index: usize) -> String {
    format!("{}[{}]", name, index)
}

fn bit_name(name: &str, bit: usize) -> String {
    format!("{}.{}", name, bit)
}

impl StateFactory {
    fn seed_word<F: BitFactory>(&self, f: &mut F, name: &str, init: Option<u64>) -> Word<F::Bit> {
        if let Some(value) = init {
            assert!(
                self.width == 64 || value >> self.width == 0,
                "initial value {} for '{}' outside [0, 2^{})",
                value,
                name,
                self.width
            );
        }
        let bits = (0..self.width)
            .map(|i| f.seed(&bit_name(name, i), init.map(|v| v >> i & 1 == 1)))
            .collect();
        Word::from_bits(bits)
    }
}
