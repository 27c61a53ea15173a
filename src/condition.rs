//! Boolean conditions over the emptiness of an object's 3x3x3 neighbourhood.
//!
//! Conditions are authored as strings such as `"(!left0 & right1) | (forward2 ^ back0)"`. Each
//! identifier names a direction and a ring level: `0` is the ring below the object, `1` is the ring
//! beside it and `2` the ring above it. An identifier is true when that neighbour is empty.
//! Operators are `!`, `&`, `|` and `^`; binary operators share one precedence level and associate
//! left to right, so use brackets to group.
//!
//! A parsed [`Condition`] is an arena of nodes. Leaves do not hold values themselves: they index
//! into a [`ConditionSlots`] pool which is rewritten from a neighbourhood snapshot before each
//! evaluation. A pool must not be shared between rooms generated in parallel.

use crate::{
    direction::{Direction8, Orientation, ALL_DIRECTIONS},
    neighbours::Neighbourhood,
};

use thiserror::Error;

pub const LEVEL_COUNT: usize = 3;
pub const SLOT_COUNT: usize = LEVEL_COUNT * 8;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConditionError {
    #[error("unknown direction `{token}` at offset {offset}")]
    UnknownDirection { token: String, offset: usize },
    #[error("unexpected `{found}` at offset {offset}")]
    UnexpectedToken { found: char, offset: usize },
    #[error("unbalanced brackets")]
    UnbalancedBrackets,
    #[error("missing operand at offset {offset}")]
    MissingOperand { offset: usize },
}

/// A named directional value in the object's local frame.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Slot {
    pub direction: Direction8,
    pub level: u8,
}

impl Slot {
    pub fn index(self) -> usize {
        self.level as usize * 8 + self.direction.index()
    }

    /// Parses identifiers like `left0` or `nw2`.
    pub fn from_token(token: &str) -> Option<Self> {
        let split = token.find(|c: char| c.is_ascii_digit())?;
        let (name, level) = token.split_at(split);
        let level: u8 = level.parse().ok()?;
        if level as usize >= LEVEL_COUNT {
            return None;
        }

        Direction8::from_name(name).map(|direction| Slot { direction, level })
    }
}

/// Shared leaf values, indexed by [`Slot::index`].
#[derive(Clone, Debug, Default)]
pub struct ConditionSlots {
    values: [bool; SLOT_COUNT],
}

impl ConditionSlots {
    pub fn get(&self, slot: Slot) -> bool {
        self.values[slot.index()]
    }

    pub fn set(&mut self, slot: Slot, value: bool) {
        self.values[slot.index()] = value;
    }

    /// Writes the world-space `snapshot` into the slots as seen by an object with `orientation`.
    pub fn load(&mut self, snapshot: &Neighbourhood, orientation: Orientation) {
        for level in 0..LEVEL_COUNT {
            for local in ALL_DIRECTIONS.iter() {
                let world = orientation.rotate_direction(*local);
                self.values[level * 8 + local.index()] = snapshot.is_empty(level, world);
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct NodeId(u32);

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Node {
    Const(bool),
    Value(Slot),
    Not(NodeId),
    And(NodeId, NodeId),
    Or(NodeId, NodeId),
    Xor(NodeId, NodeId),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum BinaryOp {
    And,
    Or,
    Xor,
}

/// Work left on the parse stack while waiting for an operand.
enum Frame {
    Not,
    Binary(BinaryOp, NodeId),
    Group,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
    nodes: Vec<Node>,
    root: NodeId,
    source: String,
}

impl Default for Condition {
    fn default() -> Self {
        Condition::always()
    }
}

impl Condition {
    pub fn always() -> Self {
        Condition {
            nodes: vec![Node::Const(true)],
            root: NodeId(0),
            source: String::new(),
        }
    }

    pub fn parse(source: &str) -> Result<Self, ConditionError> {
        let mut nodes = Vec::new();
        let mut stack: Vec<Frame> = Vec::new();
        let mut operand: Option<NodeId> = None;
        let mut any_token = false;

        let bytes = source.as_bytes();
        let mut i = 0;
        while i < bytes.len() {
            let c = bytes[i] as char;
            if c.is_ascii_whitespace() {
                i += 1;
                continue;
            }
            any_token = true;

            if c.is_ascii_alphanumeric() {
                let start = i;
                while i < bytes.len() && (bytes[i] as char).is_ascii_alphanumeric() {
                    i += 1;
                }
                let token = &source[start..i];
                if operand.is_some() {
                    return Err(ConditionError::UnexpectedToken {
                        found: c,
                        offset: start,
                    });
                }
                let slot = Slot::from_token(token).ok_or_else(|| {
                    ConditionError::UnknownDirection {
                        token: token.to_owned(),
                        offset: start,
                    }
                })?;
                let leaf = push_node(&mut nodes, Node::Value(slot));
                operand = Some(reduce(&mut nodes, &mut stack, leaf));
                continue;
            }

            match c {
                '!' | '(' => {
                    if operand.is_some() {
                        return Err(ConditionError::UnexpectedToken { found: c, offset: i });
                    }
                    stack.push(if c == '!' { Frame::Not } else { Frame::Group });
                }
                '&' | '|' | '^' => {
                    let lhs = operand
                        .take()
                        .ok_or(ConditionError::MissingOperand { offset: i })?;
                    let op = match c {
                        '&' => BinaryOp::And,
                        '|' => BinaryOp::Or,
                        _ => BinaryOp::Xor,
                    };
                    stack.push(Frame::Binary(op, lhs));
                }
                ')' => {
                    let inner = operand
                        .take()
                        .ok_or(ConditionError::MissingOperand { offset: i })?;
                    match stack.pop() {
                        Some(Frame::Group) => {}
                        _ => return Err(ConditionError::UnbalancedBrackets),
                    }
                    operand = Some(reduce(&mut nodes, &mut stack, inner));
                }
                _ => return Err(ConditionError::UnexpectedToken { found: c, offset: i }),
            }
            i += 1;
        }

        if !any_token {
            return Ok(Condition::always());
        }

        let root = operand.ok_or(ConditionError::MissingOperand {
            offset: source.len(),
        })?;
        if !stack.is_empty() {
            return Err(ConditionError::UnbalancedBrackets);
        }

        Ok(Condition {
            nodes,
            root,
            source: source.to_owned(),
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// True for conditions that can never reject a placement.
    pub fn is_trivial(&self) -> bool {
        self.nodes[self.root.0 as usize] == Node::Const(true)
    }

    pub fn evaluate(&self, slots: &ConditionSlots) -> bool {
        self.evaluate_node(self.root, slots)
    }

    fn evaluate_node(&self, id: NodeId, slots: &ConditionSlots) -> bool {
        match self.nodes[id.0 as usize] {
            Node::Const(v) => v,
            Node::Value(slot) => slots.get(slot),
            Node::Not(a) => !self.evaluate_node(a, slots),
            Node::And(a, b) => self.evaluate_node(a, slots) && self.evaluate_node(b, slots),
            Node::Or(a, b) => self.evaluate_node(a, slots) || self.evaluate_node(b, slots),
            Node::Xor(a, b) => self.evaluate_node(a, slots) ^ self.evaluate_node(b, slots),
        }
    }
}

fn push_node(nodes: &mut Vec<Node>, node: Node) -> NodeId {
    nodes.push(node);

    NodeId(nodes.len() as u32 - 1)
}

/// Folds a finished operand into every pending `!` and binary operator above the nearest group.
fn reduce(nodes: &mut Vec<Node>, stack: &mut Vec<Frame>, mut operand: NodeId) -> NodeId {
    loop {
        match stack.last() {
            Some(Frame::Not) => {
                stack.pop();
                operand = push_node(nodes, Node::Not(operand));
            }
            Some(Frame::Binary(op, lhs)) => {
                let node = match op {
                    BinaryOp::And => Node::And(*lhs, operand),
                    BinaryOp::Or => Node::Or(*lhs, operand),
                    BinaryOp::Xor => Node::Xor(*lhs, operand),
                };
                stack.pop();
                operand = push_node(nodes, node);
            }
            Some(Frame::Group) | None => return operand,
        }
    }
}

// ████████╗███████╗███████╗████████╗███████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝
//    ██║   █████╗  ███████╗   ██║   ███████╗
//    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║
//    ██║   ███████╗███████║   ██║   ███████║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝
