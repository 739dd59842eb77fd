use crate::circuit::{Graph, Node};
use anyhow::Result;
use std::collections::HashMap;
use std::io::Write;

//
// Public Interface
//

/// Emits the graph as a compilable C function computing one run's
/// boolean function: one `input[]` slot per INPUT node, one `output[]`
/// slot per OUTPUT node, one local per surviving gate. Emission follows
/// arena order, so the same graph always produces the same text.
pub fn write_c_function<W>(graph: &Graph, name: &str, mut out: W) -> Result<()>
where
    W: Write,
{
    graph.check();
    let input_slots: HashMap<usize, usize> = graph
        .inputs()
        .iter()
        .enumerate()
        .map(|(slot, id)| (*id, slot))
        .collect();

    writeln!(out, "/* generated by gatecpu; do not edit */")?;
    writeln!(out, "#include <stdbool.h>")?;
    writeln!(out)?;
    writeln!(out, "/* inputs: */")?;
    for (slot, id) in graph.inputs().iter().enumerate() {
        if let Node::Input { name } = graph.node(*id) {
            writeln!(out, "/*   input[{}] = {} */", slot, name)?;
        }
    }
    writeln!(out, "/* outputs: */")?;
    for (slot, id) in graph.outputs().iter().enumerate() {
        if let Node::Output { name, .. } = graph.node(*id) {
            writeln!(out, "/*   output[{}] = {} */", slot, name)?;
        }
    }
    writeln!(out)?;
    writeln!(
        out,
        "void {}(const bool input[{}], bool output[{}]) {{",
        name,
        graph.inputs().len(),
        graph.outputs().len()
    )?;
    let mut output_slot = 0;
    for (id, node) in graph.nodes().iter().enumerate() {
        match node {
            Node::Input { .. } => {
                writeln!(out, "    const bool n{} = input[{}];", id, input_slots[&id])?;
            }
            Node::Const { value } => {
                writeln!(out, "    const bool n{} = {};", id, value)?;
            }
            Node::And { left, right } => {
                writeln!(out, "    const bool n{} = n{} & n{};", id, left, right)?;
            }
            Node::Xor { left, right } => {
                writeln!(out, "    const bool n{} = n{} ^ n{};", id, left, right)?;
            }
            Node::Output { value, .. } => {
                writeln!(out, "    output[{}] = n{};", output_slot, value)?;
                output_slot += 1;
            }
        }
    }
    writeln!(out, "}}")?;
    Ok(())
}
