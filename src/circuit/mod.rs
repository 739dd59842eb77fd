use anyhow::{bail, Result};
use log::trace;
use std::collections::{HashMap, HashSet};

//
// Public Interface
//

pub mod codegen;
pub mod factory;
pub mod optimize;
pub mod state;
pub mod word;

pub type NodeId = usize;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Node {
    Input { name: String },
    Const { value: bool },
    And { left: NodeId, right: NodeId },
    Xor { left: NodeId, right: NodeId },
    Output { name: String, value: NodeId },
}

/// Circuit graph for one unrolled run. Nodes live in an arena and refer
/// to their operands by index; operand indices are always smaller than
/// the node's own index, which makes the graph acyclic by construction.
#[derive(Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    inputs: Vec<NodeId>,
    outputs: Vec<NodeId>,
    input_names: HashSet<String>,
    structural: HashMap<StructuralKey, NodeId>,
    const_nodes: [Option<NodeId>; 2],
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn and_node_count(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, Node::And { .. }))
            .count()
    }

    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    pub fn input(&mut self, name: &str) -> NodeId {
        assert!(
            self.input_names.insert(name.to_string()),
            "duplicate input '{}'",
            name
        );
        let id = self.push(Node::Input {
            name: name.to_string(),
        });
        self.inputs.push(id);
        id
    }

    pub fn constant(&mut self, value: bool) -> NodeId {
        if let Some(id) = self.const_nodes[value as usize] {
            return id;
        }
        let id = self.push(Node::Const { value });
        self.const_nodes[value as usize] = Some(id);
        id
    }

    pub fn get_constant(&self, id: NodeId) -> Option<bool> {
        match self.nodes[id] {
            Node::Const { value } => Some(value),
            _ => None,
        }
    }

    /// Conjunction with constant folding, self-identity and structural
    /// sharing. Reusing a bit always yields the same node index.
    pub fn and(&mut self, left: NodeId, right: NodeId) -> NodeId {
        match (self.get_constant(left), self.get_constant(right)) {
            (Some(a), Some(b)) => return self.constant(a && b),
            (Some(false), _) | (_, Some(false)) => return self.constant(false),
            (Some(true), _) => return right,
            (_, Some(true)) => return left,
            _ => (),
        }
        if left == right {
            return left;
        }
        let key = StructuralKey::and(left, right);
        if let Some(&id) = self.structural.get(&key) {
            trace!("Sharing AND({},{}) -> n{}", left, right, id);
            return id;
        }
        let id = self.push(Node::And { left, right });
        self.structural.insert(key, id);
        id
    }

    /// Exclusive-or with the same folding rules; `XOR(x,x)` cancels to
    /// false, `XOR(x,true)` stays as the representation of NOT.
    pub fn xor(&mut self, left: NodeId, right: NodeId) -> NodeId {
        match (self.get_constant(left), self.get_constant(right)) {
            (Some(a), Some(b)) => return self.constant(a ^ b),
            (Some(false), _) => return right,
            (_, Some(false)) => return left,
            _ => (),
        }
        if left == right {
            return self.constant(false);
        }
        let key = StructuralKey::xor(left, right);
        if let Some(&id) = self.structural.get(&key) {
            trace!("Sharing XOR({},{}) -> n{}", left, right, id);
            return id;
        }
        let id = self.push(Node::Xor { left, right });
        self.structural.insert(key, id);
        id
    }

    pub fn output(&mut self, name: &str, value: NodeId) -> NodeId {
        let id = self.push(Node::Output {
            name: name.to_string(),
            value,
        });
        self.outputs.push(id);
        id
    }

    /// Asserts the operand-before-use arena invariant. A violation means
    /// the builder produced a cycle, which must never happen for an
    /// unrolled tick.
    pub fn check(&self) {
        for (id, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Input { .. } | Node::Const { .. } => (),
                Node::And { left, right } | Node::Xor { left, right } => {
                    assert!(left < id && right < id, "cycle through node n{}", id);
                }
                Node::Output { value, .. } => {
                    assert!(value < id, "cycle through node n{}", id);
                }
            }
        }
    }

    /// Evaluates the graph under the given input assignment, returning
    /// one boolean per OUTPUT node keyed by its name.
    pub fn evaluate(&self, bindings: &HashMap<String, bool>) -> Result<HashMap<String, bool>> {
        self.check();
        let mut values = vec![false; self.nodes.len()];
        let mut result = HashMap::new();
        for (id, node) in self.nodes.iter().enumerate() {
            values[id] = match node {
                Node::Input { name } => match bindings.get(name) {
                    Some(value) => *value,
                    None => bail!("no binding for input '{}'", name),
                },
                Node::Const { value } => *value,
                Node::And { left, right } => values[*left] && values[*right],
                Node::Xor { left, right } => values[*left] ^ values[*right],
                Node::Output { name, value } => {
                    result.insert(name.clone(), values[*value]);
                    values[*value]
                }
            };
        }
        Ok(result)
    }
}

//
// Private Implementation
//

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
enum StructuralKey {
    And(NodeId, NodeId),
    Xor(NodeId, NodeId),
}

impl StructuralKey {
    fn and(left: NodeId, right: NodeId) -> Self {
        StructuralKey::And(left.min(right), left.max(right))
    }

    fn xor(left: NodeId, right: NodeId) -> Self {
        StructuralKey::Xor(left.min(right), left.max(right))
    }
}

impl Graph {
    fn push(&mut self, node: Node) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(node);
        id
    }
}
