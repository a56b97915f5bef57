//! Unit tests for the evaluator over hand-built trees.

use super::*;
use crate::runtime::IterationLimit;
use crate::symbols::{ScalarRef, new_scalar, new_string, new_vector};
use crate::tree::{
    AssignTarget, Bound, Node, NodeArena, NodeId, Operand, RangeSpec, ReturnSink, StringSource,
    VectorOperand,
};
use std::rc::Rc;

struct Builder {
    arena: NodeArena,
}

impl Builder {
    fn new() -> Self {
        Self {
            arena: NodeArena::new(),
        }
    }

    fn lit(&mut self, v: f64) -> NodeId {
        self.arena.allocate(Node::Literal(v))
    }

    fn var(&mut self, v: &ScalarRef) -> NodeId {
        self.arena.allocate(Node::Variable(v.clone()))
    }

    fn bin(&mut self, op: Operator, left: NodeId, right: NodeId) -> NodeId {
        self.arena.allocate(Node::Binary {
            op,
            left: Operand::Node(left),
            right: Operand::Node(right),
        })
    }

    fn assign(&mut self, op: Operator, target: &ScalarRef, value: NodeId) -> NodeId {
        self.arena.allocate(Node::Assign {
            op,
            target: AssignTarget::Variable(target.clone()),
            value,
        })
    }

    fn eval(&self, root: &NodeId) -> Result<Value, ExecutionError> {
        Evaluator::new(&self.arena).evaluate(root)
    }
}

#[test]
fn test_while_with_break_value() {
    let mut b = Builder::new();
    let i = new_scalar(0.0);

    // while (1) { i += 1; if (i >= 5) break[i * 10]; }
    let cond = b.lit(1.0);
    let one = b.lit(1.0);
    let inc = b.assign(Operator::AddAssign, &i, one);
    let iv = b.var(&i);
    let five = b.lit(5.0);
    let test = b.bin(Operator::Gte, iv, five);
    let iv = b.var(&i);
    let ten = b.lit(10.0);
    let scaled = b.bin(Operator::Mul, iv, ten);
    let brk = b.arena.allocate(Node::Break(Some(scaled)));
    let guard = b.arena.allocate(Node::Conditional {
        condition: test,
        consequent: brk,
        alternative: None,
    });
    let body = b.arena.allocate(Node::Sequence(vec![inc, guard]));
    let root = b.arena.allocate(Node::While {
        condition: cond,
        body,
        check: None,
    });

    assert_eq!(b.eval(&root).unwrap(), Value::Scalar(50.0));
    assert_eq!(i.get(), 5.0);
}

#[test]
fn test_for_continue_still_increments() {
    let mut b = Builder::new();
    let i = new_scalar(0.0);
    let total = new_scalar(0.0);

    // for (i := 0; i < 4; i += 1) { continue; total += 1 }
    let zero = b.lit(0.0);
    let init = b.assign(Operator::Assign, &i, zero);
    let iv = b.var(&i);
    let four = b.lit(4.0);
    let cond = b.bin(Operator::Lt, iv, four);
    let one = b.lit(1.0);
    let step = b.assign(Operator::AddAssign, &i, one);
    let cont = b.arena.allocate(Node::Continue);
    let one = b.lit(1.0);
    let bump = b.assign(Operator::AddAssign, &total, one);
    let body = b.arena.allocate(Node::Sequence(vec![cont, bump]));
    let root = b.arena.allocate(Node::For {
        init: Some(init),
        condition: Some(cond),
        increment: Some(step),
        body,
        check: None,
    });

    b.eval(&root).unwrap();
    assert_eq!(i.get(), 4.0);
    assert_eq!(total.get(), 0.0);
}

#[test]
fn test_loop_runtime_check_violation() {
    let mut b = Builder::new();
    let cond = b.lit(1.0);
    let body = b.lit(0.0);
    let root = b.arena.allocate(Node::While {
        condition: cond,
        body,
        check: Some(Rc::new(IterationLimit::new(100))),
    });

    let err = b.eval(&root).unwrap_err();
    assert!(matches!(
        err,
        ExecutionError::LoopLimit {
            iterations: 101,
            max: 100,
            ..
        }
    ));
}

#[test]
fn test_vector_binary_broadcasts_scalar() {
    let mut b = Builder::new();
    let v = new_vector(3);
    for (i, cell) in v.iter().enumerate() {
        cell.set(i as f64 + 1.0);
    }
    let vec_node = b.arena.allocate(Node::Vector {
        vector: v.clone(),
        start: 0,
        len: 3,
    });
    let two = b.lit(2.0);
    let root = b.arena.allocate(Node::VectorBinary {
        op: Operator::Mul,
        left: VectorOperand::Vector(vec_node),
        right: VectorOperand::Scalar(two),
        temp: new_vector(3),
    });

    assert_eq!(b.eval(&root).unwrap(), Value::Vector(vec![2.0, 4.0, 6.0]));
    let sum = b.arena.allocate(Node::VectorAggregate {
        op: VarArgOp::Sum,
        operand: root,
    });
    assert_eq!(b.eval(&sum).unwrap(), Value::Scalar(12.0));
}

#[test]
fn test_out_of_bounds_element_access() {
    let mut b = Builder::new();
    let v = new_vector(2);
    let index = b.lit(7.0);
    let read = b.arena.allocate(Node::VectorElement {
        vector: v.clone(),
        index,
    });
    assert!(b.eval(&read).unwrap().to_scalar().is_nan());

    let index = b.lit(-1.0);
    let value = b.lit(3.0);
    let write = b.arena.allocate(Node::Assign {
        op: Operator::Assign,
        target: AssignTarget::Element {
            vector: v.clone(),
            index,
        },
        value,
    });
    assert!(b.eval(&write).unwrap().to_scalar().is_nan());
    assert!(v.iter().all(|cell| cell.get() == 0.0));
}

#[test]
fn test_string_range_runtime_bounds() {
    let mut b = Builder::new();
    let s = new_string("calyx");
    let end = b.lit(2.0);
    let root = b.arena.allocate(Node::StringRange {
        source: StringSource::Var(s.clone()),
        range: RangeSpec {
            start: Bound::Const(1),
            end: Bound::Node(end),
        },
    });
    assert_eq!(b.eval(&root).unwrap(), Value::String("al".into()));

    let end = b.lit(9.0);
    let invalid = b.arena.allocate(Node::StringRange {
        source: StringSource::Var(s),
        range: RangeSpec {
            start: Bound::Open,
            end: Bound::Node(end),
        },
    });
    assert_eq!(b.eval(&invalid).unwrap(), Value::String(String::new()));
}

#[test]
fn test_string_range_assignment() {
    let mut b = Builder::new();
    let s = new_string("xxxxx");
    let value = b.arena.allocate(Node::StringLiteral("abcdef".into()));
    let root = b.arena.allocate(Node::Assign {
        op: Operator::Assign,
        target: AssignTarget::StringRange {
            target: s.clone(),
            range: RangeSpec {
                start: Bound::Const(1),
                end: Bound::Const(3),
            },
        },
        value,
    });
    assert_eq!(b.eval(&root).unwrap(), Value::String("abc".into()));
    assert_eq!(*s.borrow(), "xabcx");
}

#[test]
fn test_return_envelope_records_results() {
    let mut b = Builder::new();
    let sink = Rc::new(ReturnSink::default());
    let one = b.lit(1.0);
    let text = b.arena.allocate(Node::StringLiteral("done".into()));
    let ret = b.arena.allocate(Node::Return {
        args: vec![one, text],
        sink: sink.clone(),
    });
    let unreachable = b.lit(9.0);
    let body = b.arena.allocate(Node::Sequence(vec![ret, unreachable]));
    let root = b.arena.allocate(Node::ReturnEnvelope {
        body,
        sink: sink.clone(),
    });

    assert!(b.eval(&root).unwrap().to_scalar().is_nan());
    assert!(sink.invoked());
    assert_eq!(
        sink.values(),
        vec![Value::Scalar(1.0), Value::String("done".into())]
    );
}

#[test]
fn test_swap_variables() {
    let mut b = Builder::new();
    let x = new_scalar(1.0);
    let y = new_scalar(2.0);
    let root = b.arena.allocate(Node::Swap {
        left: AssignTarget::Variable(x.clone()),
        right: AssignTarget::Variable(y.clone()),
    });
    b.eval(&root).unwrap();
    assert_eq!((x.get(), y.get()), (2.0, 1.0));
}
