use super::NodeId;
use crate::evaluator::{Operator, VarArgOp, Value};
use crate::runtime::LoopRuntimeCheck;
use crate::symbols::{Function, ScalarRef, StringRef, VarArgFunction, VectorRef};
use smallvec::SmallVec;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// What a node produces when evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Scalar,
    String,
    Vector,
}

impl ValueKind {
    /// Letter used in return-type signatures.
    pub fn signature(self) -> char {
        match self {
            ValueKind::Scalar => 'T',
            ValueKind::String => 'S',
            ValueKind::Vector => 'V',
        }
    }
}

/// Operand slot of a binary node.
pub enum Operand {
    Var(ScalarRef),
    Const(f64),
    Node(NodeId),
}

/// Operand slot of a flattened chain.
#[derive(Clone)]
pub enum Leaf {
    Var(ScalarRef),
    Const(f64),
}

impl Leaf {
    #[inline]
    pub fn value(&self) -> f64 {
        match self {
            Leaf::Var(v) => v.get(),
            Leaf::Const(c) => *c,
        }
    }
}

/// Grouping of a flattened chain. Leaves `a b c d` and operators
/// `o0 o1 o2` appear in textual order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainShape {
    /// `(a o0 b) o1 c`
    Left3,
    /// `a o0 (b o1 c)`
    Right3,
    /// `(a o0 b) o1 (c o2 d)`
    Pair4,
    /// `((a o0 b) o1 c) o2 d`
    LeftLeft4,
    /// `(a o0 (b o1 c)) o2 d`
    RightLeft4,
    /// `a o0 ((b o1 c) o2 d)`
    LeftRight4,
    /// `a o0 (b o1 (c o2 d))`
    RightRight4,
}

impl ChainShape {
    pub fn leaf_count(self) -> usize {
        match self {
            ChainShape::Left3 | ChainShape::Right3 => 3,
            _ => 4,
        }
    }

    /// Canonical key such as `(t*t)/t`.
    pub fn key(self, ops: &[Operator]) -> String {
        let o = |i: usize| ops.get(i).map(|op| op.symbol()).unwrap_or("?");
        match self {
            ChainShape::Left3 => format!("(t{}t){}t", o(0), o(1)),
            ChainShape::Right3 => format!("t{}(t{}t)", o(0), o(1)),
            ChainShape::Pair4 => format!("(t{}t){}(t{}t)", o(0), o(1), o(2)),
            ChainShape::LeftLeft4 => format!("((t{}t){}t){}t", o(0), o(1), o(2)),
            ChainShape::RightLeft4 => format!("(t{}(t{}t)){}t", o(0), o(1), o(2)),
            ChainShape::LeftRight4 => format!("t{}((t{}t){}t)", o(0), o(1), o(2)),
            ChainShape::RightRight4 => format!("t{}(t{}(t{}t))", o(0), o(1), o(2)),
        }
    }
}

/// How a chain is evaluated once its leaves are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChainKernel {
    Special(u8),
    Generic,
}

/// A flattened operator chain over up to four variable/constant leaves.
pub struct Chain {
    pub shape: ChainShape,
    pub leaves: SmallVec<[Leaf; 4]>,
    pub ops: SmallVec<[Operator; 3]>,
    pub kernel: ChainKernel,
}

/// One end of an inclusive range.
pub enum Bound {
    Open,
    Const(usize),
    Node(NodeId),
}

pub struct RangeSpec {
    pub start: Bound,
    pub end: Bound,
}

impl RangeSpec {
    pub fn full() -> Self {
        Self {
            start: Bound::Open,
            end: Bound::Open,
        }
    }

    pub fn is_constant(&self) -> bool {
        !matches!(self.start, Bound::Node(_)) && !matches!(self.end, Bound::Node(_))
    }
}

pub enum StringSource {
    Var(StringRef),
    Literal(String),
    Node(NodeId),
}

pub enum StringOperand {
    Var(StringRef),
    Literal(String),
    Node(NodeId),
}

pub enum VectorOperand {
    Vector(NodeId),
    Scalar(NodeId),
}

pub enum VectorInit {
    Zero,
    List(Vec<NodeId>),
    Broadcast(NodeId),
    Copy(NodeId),
}

/// Storage an assignment or swap writes into.
pub enum AssignTarget {
    Variable(ScalarRef),
    Element { vector: VectorRef, index: NodeId },
    ElementConst { vector: VectorRef, index: usize },
    Vector { vector: VectorRef, start: usize, len: usize },
    String(StringRef),
    StringRange { target: StringRef, range: RangeSpec },
}

impl AssignTarget {
    pub fn kind(&self) -> ValueKind {
        match self {
            AssignTarget::Vector { .. } => ValueKind::Vector,
            AssignTarget::String(_) | AssignTarget::StringRange { .. } => ValueKind::String,
            _ => ValueKind::Scalar,
        }
    }
}

/// Results recorded by `return` statements during one evaluation.
#[derive(Default)]
pub struct ReturnSink {
    values: RefCell<Vec<Value>>,
    invoked: Cell<bool>,
}

impl ReturnSink {
    pub fn reset(&self) {
        self.values.borrow_mut().clear();
        self.invoked.set(false);
    }

    pub fn record(&self, values: Vec<Value>) {
        *self.values.borrow_mut() = values;
        self.invoked.set(true);
    }

    pub fn invoked(&self) -> bool {
        self.invoked.get()
    }

    pub fn values(&self) -> Vec<Value> {
        self.values.borrow().clone()
    }
}

pub type LoopCheck = Option<Rc<dyn LoopRuntimeCheck>>;

/// An evaluation node. Children are owned through [`NodeId`]s.
pub enum Node {
    Literal(f64),
    StringLiteral(String),
    Null,
    Variable(ScalarRef),
    VectorElement {
        vector: VectorRef,
        index: NodeId,
    },
    VectorElementConst {
        vector: VectorRef,
        index: usize,
    },
    /// A whole vector or a constant-bounds view into one.
    Vector {
        vector: VectorRef,
        start: usize,
        len: usize,
    },
    StringVar(StringRef),
    StringRange {
        source: StringSource,
        range: RangeSpec,
    },
    StringConcat {
        left: NodeId,
        right: NodeId,
    },
    StringSize(NodeId),
    StringCompare {
        op: Operator,
        left: StringOperand,
        right: StringOperand,
    },
    Unary {
        op: Operator,
        operand: NodeId,
    },
    UnaryVar {
        op: Operator,
        var: ScalarRef,
    },
    UnaryVector {
        op: Operator,
        operand: NodeId,
        temp: VectorRef,
    },
    Binary {
        op: Operator,
        left: Operand,
        right: Operand,
    },
    Chain(Chain),
    IntPow {
        base: Operand,
        exponent: u32,
        reciprocal: bool,
    },
    VectorBinary {
        op: Operator,
        left: VectorOperand,
        right: VectorOperand,
        temp: VectorRef,
    },
    VectorAggregate {
        op: VarArgOp,
        operand: NodeId,
    },
    /// Three-argument base function.
    BaseFunction {
        op: Operator,
        args: SmallVec<[NodeId; 3]>,
    },
    Special {
        index: u8,
        args: SmallVec<[NodeId; 4]>,
    },
    VarArg {
        op: VarArgOp,
        args: Vec<NodeId>,
    },
    Function {
        function: Rc<dyn Function>,
        args: Vec<NodeId>,
    },
    VarArgFunction {
        function: Rc<dyn VarArgFunction>,
        args: Vec<NodeId>,
    },
    Conditional {
        condition: NodeId,
        consequent: NodeId,
        alternative: Option<NodeId>,
    },
    While {
        condition: NodeId,
        body: NodeId,
        check: LoopCheck,
    },
    Repeat {
        body: NodeId,
        condition: NodeId,
        check: LoopCheck,
    },
    For {
        init: Option<NodeId>,
        condition: Option<NodeId>,
        increment: Option<NodeId>,
        body: NodeId,
        check: LoopCheck,
    },
    Switch {
        cases: Vec<(NodeId, NodeId)>,
        default: NodeId,
    },
    MultiSwitch {
        cases: Vec<(NodeId, NodeId)>,
    },
    Break(Option<NodeId>),
    Continue,
    Return {
        args: Vec<NodeId>,
        sink: Rc<ReturnSink>,
    },
    ReturnEnvelope {
        body: NodeId,
        sink: Rc<ReturnSink>,
    },
    Assign {
        op: Operator,
        target: AssignTarget,
        value: NodeId,
    },
    Swap {
        left: AssignTarget,
        right: AssignTarget,
    },
    VectorDefinition {
        storage: VectorRef,
        init: VectorInit,
    },
    Sequence(Vec<NodeId>),
    /// `x == null` / `x != null` on a non-literal operand.
    NullEquality {
        operand: NodeId,
        equal: bool,
    },
}

fn push_operand<'a>(out: &mut SmallVec<[&'a NodeId; 4]>, operand: &'a Operand) {
    if let Operand::Node(id) = operand {
        out.push(id);
    }
}

fn push_range<'a>(out: &mut SmallVec<[&'a NodeId; 4]>, range: &'a RangeSpec) {
    for bound in [&range.start, &range.end] {
        if let Bound::Node(id) = bound {
            out.push(id);
        }
    }
}

fn push_target<'a>(out: &mut SmallVec<[&'a NodeId; 4]>, target: &'a AssignTarget) {
    match target {
        AssignTarget::Element { index, .. } => out.push(index),
        AssignTarget::StringRange { range, .. } => push_range(out, range),
        _ => {}
    }
}

fn drain_operand(out: &mut Vec<NodeId>, operand: Operand) {
    if let Operand::Node(id) = operand {
        out.push(id);
    }
}

fn drain_range(out: &mut Vec<NodeId>, range: RangeSpec) {
    for bound in [range.start, range.end] {
        if let Bound::Node(id) = bound {
            out.push(id);
        }
    }
}

fn drain_target(out: &mut Vec<NodeId>, target: AssignTarget) {
    match target {
        AssignTarget::Element { index, .. } => out.push(index),
        AssignTarget::StringRange { range, .. } => drain_range(out, range),
        _ => {}
    }
}

impl Node {
    /// Borrow every child id.
    pub fn children(&self) -> SmallVec<[&NodeId; 4]> {
        let mut out = SmallVec::new();
        match self {
            Node::Literal(_)
            | Node::StringLiteral(_)
            | Node::Null
            | Node::Variable(_)
            | Node::VectorElementConst { .. }
            | Node::Vector { .. }
            | Node::StringVar(_)
            | Node::UnaryVar { .. }
            | Node::Chain(_)
            | Node::Continue => {}
            Node::VectorElement { index, .. } => out.push(index),
            Node::StringRange { source, range } => {
                if let StringSource::Node(id) = source {
                    out.push(id);
                }
                push_range(&mut out, range);
            }
            Node::StringConcat { left, right } => {
                out.push(left);
                out.push(right);
            }
            Node::StringSize(id)
            | Node::Unary { operand: id, .. }
            | Node::UnaryVector { operand: id, .. }
            | Node::VectorAggregate { operand: id, .. }
            | Node::NullEquality { operand: id, .. }
            | Node::ReturnEnvelope { body: id, .. } => out.push(id),
            Node::StringCompare { left, right, .. } => {
                for operand in [left, right] {
                    if let StringOperand::Node(id) = operand {
                        out.push(id);
                    }
                }
            }
            Node::Binary { left, right, .. } => {
                push_operand(&mut out, left);
                push_operand(&mut out, right);
            }
            Node::IntPow { base, .. } => push_operand(&mut out, base),
            Node::VectorBinary { left, right, .. } => {
                for operand in [left, right] {
                    match operand {
                        VectorOperand::Vector(id) | VectorOperand::Scalar(id) => out.push(id),
                    }
                }
            }
            Node::BaseFunction { args, .. } => out.extend(args.iter()),
            Node::Special { args, .. } => out.extend(args.iter()),
            Node::VarArg { args, .. }
            | Node::Function { args, .. }
            | Node::VarArgFunction { args, .. }
            | Node::Return { args, .. }
            | Node::Sequence(args) => out.extend(args.iter()),
            Node::Conditional {
                condition,
                consequent,
                alternative,
            } => {
                out.push(condition);
                out.push(consequent);
                out.extend(alternative.iter());
            }
            Node::While {
                condition, body, ..
            }
            | Node::Repeat {
                body, condition, ..
            } => {
                out.push(condition);
                out.push(body);
            }
            Node::For {
                init,
                condition,
                increment,
                body,
                ..
            } => {
                out.extend(init.iter());
                out.extend(condition.iter());
                out.extend(increment.iter());
                out.push(body);
            }
            Node::Switch { cases, default } => {
                for (condition, consequent) in cases {
                    out.push(condition);
                    out.push(consequent);
                }
                out.push(default);
            }
            Node::MultiSwitch { cases } => {
                for (condition, consequent) in cases {
                    out.push(condition);
                    out.push(consequent);
                }
            }
            Node::Break(value) => out.extend(value.iter()),
            Node::Assign { target, value, .. } => {
                push_target(&mut out, target);
                out.push(value);
            }
            Node::Swap { left, right } => {
                push_target(&mut out, left);
                push_target(&mut out, right);
            }
            Node::VectorDefinition { init, .. } => match init {
                VectorInit::Zero => {}
                VectorInit::List(items) => out.extend(items.iter()),
                VectorInit::Broadcast(id) | VectorInit::Copy(id) => out.push(id),
            },
        }
        out
    }

    /// Consume the node, handing ownership of its children to the caller.
    pub fn into_children(self) -> Vec<NodeId> {
        let mut out = Vec::new();
        match self {
            Node::Literal(_)
            | Node::StringLiteral(_)
            | Node::Null
            | Node::Variable(_)
            | Node::VectorElementConst { .. }
            | Node::Vector { .. }
            | Node::StringVar(_)
            | Node::UnaryVar { .. }
            | Node::Chain(_)
            | Node::Continue => {}
            Node::VectorElement { index, .. } => out.push(index),
            Node::StringRange { source, range } => {
                if let StringSource::Node(id) = source {
                    out.push(id);
                }
                drain_range(&mut out, range);
            }
            Node::StringConcat { left, right } => {
                out.push(left);
                out.push(right);
            }
            Node::StringSize(id)
            | Node::Unary { operand: id, .. }
            | Node::UnaryVector { operand: id, .. }
            | Node::VectorAggregate { operand: id, .. }
            | Node::NullEquality { operand: id, .. }
            | Node::ReturnEnvelope { body: id, .. } => out.push(id),
            Node::StringCompare { left, right, .. } => {
                for operand in [left, right] {
                    if let StringOperand::Node(id) = operand {
                        out.push(id);
                    }
                }
            }
            Node::Binary { left, right, .. } => {
                drain_operand(&mut out, left);
                drain_operand(&mut out, right);
            }
            Node::IntPow { base, .. } => drain_operand(&mut out, base),
            Node::VectorBinary { left, right, .. } => {
                for operand in [left, right] {
                    match operand {
                        VectorOperand::Vector(id) | VectorOperand::Scalar(id) => out.push(id),
                    }
                }
            }
            Node::BaseFunction { args, .. } => out.extend(args),
            Node::Special { args, .. } => out.extend(args),
            Node::VarArg { args, .. }
            | Node::Function { args, .. }
            | Node::VarArgFunction { args, .. }
            | Node::Return { args, .. }
            | Node::Sequence(args) => out.extend(args),
            Node::Conditional {
                condition,
                consequent,
                alternative,
            } => {
                out.push(condition);
                out.push(consequent);
                out.extend(alternative);
            }
            Node::While {
                condition, body, ..
            }
            | Node::Repeat {
                body, condition, ..
            } => {
                out.push(condition);
                out.push(body);
            }
            Node::For {
                init,
                condition,
                increment,
                body,
                ..
            } => {
                out.extend(init);
                out.extend(condition);
                out.extend(increment);
                out.push(body);
            }
            Node::Switch { cases, default } => {
                for (condition, consequent) in cases {
                    out.push(condition);
                    out.push(consequent);
                }
                out.push(default);
            }
            Node::MultiSwitch { cases } => {
                for (condition, consequent) in cases {
                    out.push(condition);
                    out.push(consequent);
                }
            }
            Node::Break(value) => out.extend(value),
            Node::Assign { target, value, .. } => {
                drain_target(&mut out, target);
                out.push(value);
            }
            Node::Swap { left, right } => {
                drain_target(&mut out, left);
                drain_target(&mut out, right);
            }
            Node::VectorDefinition { init, .. } => match init {
                VectorInit::Zero => {}
                VectorInit::List(items) => out.extend(items),
                VectorInit::Broadcast(id) | VectorInit::Copy(id) => out.push(id),
            },
        }
        out
    }

    pub fn literal(&self) -> Option<f64> {
        match self {
            Node::Literal(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn is_break_or_continue(&self) -> bool {
        matches!(self, Node::Break(_) | Node::Continue)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Node::Literal(_) => "Literal",
            Node::StringLiteral(_) => "StringLiteral",
            Node::Null => "Null",
            Node::Variable(_) => "Variable",
            Node::VectorElement { .. } => "VectorElement",
            Node::VectorElementConst { .. } => "VectorElementConst",
            Node::Vector { .. } => "Vector",
            Node::StringVar(_) => "StringVar",
            Node::StringRange { .. } => "StringRange",
            Node::StringConcat { .. } => "StringConcat",
            Node::StringSize(_) => "StringSize",
            Node::StringCompare { .. } => "StringCompare",
            Node::Unary { .. } => "Unary",
            Node::UnaryVar { .. } => "UnaryVar",
            Node::UnaryVector { .. } => "UnaryVector",
            Node::Binary { .. } => "Binary",
            Node::Chain(_) => "Chain",
            Node::IntPow { .. } => "IntPow",
            Node::VectorBinary { .. } => "VectorBinary",
            Node::VectorAggregate { .. } => "VectorAggregate",
            Node::BaseFunction { .. } => "BaseFunction",
            Node::Special { .. } => "Special",
            Node::VarArg { .. } => "VarArg",
            Node::Function { .. } => "Function",
            Node::VarArgFunction { .. } => "VarArgFunction",
            Node::Conditional { .. } => "Conditional",
            Node::While { .. } => "While",
            Node::Repeat { .. } => "Repeat",
            Node::For { .. } => "For",
            Node::Switch { .. } => "Switch",
            Node::MultiSwitch { .. } => "MultiSwitch",
            Node::Break(_) => "Break",
            Node::Continue => "Continue",
            Node::Return { .. } => "Return",
            Node::ReturnEnvelope { .. } => "ReturnEnvelope",
            Node::Assign { .. } => "Assign",
            Node::Swap { .. } => "Swap",
            Node::VectorDefinition { .. } => "VectorDefinition",
            Node::Sequence(_) => "Sequence",
            Node::NullEquality { .. } => "NullEquality",
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Literal(v) => write!(f, "Literal({v})"),
            Node::StringLiteral(s) => write!(f, "StringLiteral({s:?})"),
            Node::Binary { op, .. } => write!(f, "Binary({op})"),
            Node::Unary { op, .. } | Node::UnaryVar { op, .. } => {
                write!(f, "{}({op})", self.name())
            }
            Node::Chain(chain) => write!(
                f,
                "Chain({}, {:?})",
                chain.shape.key(&chain.ops),
                chain.kernel
            ),
            other => f.write_str(other.name()),
        }
    }
}
