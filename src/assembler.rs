use crate::machine::{encode, Condition, Mode, Opcode, Reg, VALUE_BITS, WORD_WIDTH};
use std::collections::HashMap;
use thiserror::Error;

//
// Public Interface
//

/// A value field before resolution: either a literal or a label that
/// the assembler turns into an address.
#[derive(Clone, Debug)]
pub enum Value {
    Number(u64),
    Label(String),
}

#[derive(Clone, Debug)]
pub enum Line {
    Label(String),
    Instr {
        opcode: Opcode,
        mode: Mode,
        target: Reg,
        value: Value,
    },
    Branch {
        cond: Condition,
        value: Value,
    },
    Data(u64),
}

#[derive(Error, Debug)]
pub enum AssemblerError {
    #[error("label '{0}' is defined twice")]
    DuplicateLabel(String),
    #[error("label '{0}' is never defined")]
    UndefinedLabel(String),
    #[error("value {value} does not fit into {bits} bits")]
    ValueOutOfRange { value: u64, bits: usize },
}

/// A program under construction. Lines are collected with the builder
/// methods and turned into a memory image by `assemble`, which resolves
/// labels in a second pass so forward references just work.
#[derive(Debug, Default)]
pub struct Program {
    lines: Vec<Line>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn label(&mut self, name: &str) -> &mut Self {
        self.lines.push(Line::Label(name.to_string()));
        self
    }

    pub fn instr(
        &mut self,
        opcode: Opcode,
        mode: Mode,
        target: Reg,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.lines.push(Line::Instr {
            opcode,
            mode,
            target,
            value: value.into(),
        });
        self
    }

    pub fn branch(&mut self, cond: Condition, value: impl Into<Value>) -> &mut Self {
        self.lines.push(Line::Branch {
            cond,
            value: value.into(),
        });
        self
    }

    pub fn jump(&mut self, value: impl Into<Value>) -> &mut Self {
        self.instr(Opcode::Jump, Mode::Immediate, Reg::R0, value)
    }

    /// A self-jump; the machine's halting idiom.
    pub fn halt(&mut self, name: &str) -> &mut Self {
        self.label(name).jump(name)
    }

    pub fn data(&mut self, word: u64) -> &mut Self {
        self.lines.push(Line::Data(word));
        self
    }

    pub fn assemble(&self) -> Result<Vec<u64>, AssemblerError> {
        let mut labels = HashMap::new();
        let mut address = 0u64;
        for line in &self.lines {
            if let Line::Label(name) = line {
                if labels.insert(name.clone(), address).is_some() {
                    return Err(AssemblerError::DuplicateLabel(name.clone()));
                }
            } else {
                address += 1;
            }
        }
        let mut image = Vec::new();
        for line in &self.lines {
            match line {
                Line::Label(_) => (),
                Line::Instr {
                    opcode,
                    mode,
                    target,
                    value,
                } => {
                    let value = resolve(&labels, value, VALUE_BITS)?;
                    image.push(encode(*opcode, *mode, target.code(), value));
                }
                Line::Branch { cond, value } => {
                    let value = resolve(&labels, value, VALUE_BITS)?;
                    image.push(encode(Opcode::Bra, Mode::Immediate, cond.code(), value));
                }
                Line::Data(word) => {
                    check_range(*word, WORD_WIDTH)?;
                    image.push(*word);
                }
            }
        }
        Ok(image)
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Number(value)
    }
}

impl From<&str> for Value {
    fn from(label: &str) -> Self {
        Value::Label(label.to_string())
    }
}

//
// Private Implementation
//

fn resolve(
    labels: &HashMap<String, u64>,
    value: &Value,
    bits: usize,
) -> Result<u64, AssemblerError> {
    let value = match value {
        Value::Number(n) => *n,
        Value::Label(name) => *labels
            .get(name)
            .ok_or_else(|| AssemblerError::UndefinedLabel(name.clone()))?,
    };
    check_range(value, bits)?;
    Ok(value)
}

fn check_range(value: u64, bits: usize) -> Result<(), AssemblerError> {
    if value >> bits != 0 {
        return Err(AssemblerError::ValueOutOfRange { value, bits });
    }
    Ok(())
}
