//! Core evaluation logic.

use super::operators::{binary, int_pow, is_true, string_binary, ternary, truth, unary};
use super::{ExecutionError, Operator, Value, special};
use crate::runtime::{LoopRuntimeCheck, LoopTypes, ViolationContext};
use crate::symbols::VectorRef;
use crate::tree::{
    AssignTarget, Bound, Chain, ChainKernel, ChainShape, Leaf, LoopCheck, Node, NodeArena, NodeId,
    Operand, RangeSpec, ReturnSink, StringOperand, StringSource, ValueKind, VectorInit,
    VectorOperand,
};
use smallvec::SmallVec;
use std::cell::Cell;
use std::rc::Rc;

/// Non-local exits unwinding through the evaluator.
#[derive(Debug)]
enum Interrupt {
    Break(f64),
    Continue,
    Return,
    Violation(ExecutionError),
}

type Flow<T> = Result<T, Interrupt>;

/// A window onto vector storage.
#[derive(Clone)]
pub struct VectorView {
    data: VectorRef,
    start: usize,
    len: usize,
}

impl VectorView {
    fn whole(data: &VectorRef) -> Self {
        Self {
            data: data.clone(),
            start: 0,
            len: data.len(),
        }
    }

    fn single(value: f64) -> Self {
        let data: VectorRef = Rc::from(vec![Cell::new(value)]);
        Self::whole(&data)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn get(&self, i: usize) -> f64 {
        if i < self.len {
            self.data[self.start + i].get()
        } else {
            f64::NAN
        }
    }

    pub fn first(&self) -> f64 {
        self.get(0)
    }

    pub fn to_vec(&self) -> Vec<f64> {
        (0..self.len).map(|i| self.get(i)).collect()
    }
}

enum Side {
    Vector(VectorView),
    Scalar(f64),
}

impl Side {
    #[inline]
    fn get(&self, i: usize) -> f64 {
        match self {
            Side::Vector(view) => view.get(i),
            Side::Scalar(x) => *x,
        }
    }
}

/// Convert a runtime index into a bounds-checked position.
fn index_of(x: f64, len: usize) -> Option<usize> {
    if x.is_finite() && x >= 0.0 {
        let i = x as usize;
        (i < len).then_some(i)
    } else {
        None
    }
}

fn compound(op: Operator, current: f64, value: f64) -> f64 {
    match op.compound_base() {
        Some(base) => binary(base, current, value),
        None => value,
    }
}

/// Characters `start..=end` of `s`.
fn char_range(s: &str, start: usize, end: usize) -> String {
    s.chars().skip(start).take(end + 1 - start).collect()
}

struct LoopGuard<'c> {
    check: Option<&'c dyn LoopRuntimeCheck>,
    loop_type: LoopTypes,
    iterations: u64,
}

impl<'c> LoopGuard<'c> {
    fn new(check: &'c LoopCheck, loop_type: LoopTypes) -> Self {
        let check = check
            .as_deref()
            .filter(|check| check.loop_types().contains(loop_type));
        Self {
            check,
            loop_type,
            iterations: 0,
        }
    }

    /// Count one iteration. `false` ends the loop.
    fn tick(&mut self) -> Flow<bool> {
        let Some(check) = self.check else {
            return Ok(true);
        };
        self.iterations += 1;
        let max = check.max_iterations();
        if self.iterations <= max {
            return Ok(true);
        }
        let context = ViolationContext {
            loop_type: self.loop_type,
            iterations: self.iterations,
            max,
        };
        tracing::debug!(loop_type = %self.loop_type, max, "Loop runtime check triggered");
        check
            .handle_violation(&context)
            .map_err(Interrupt::Violation)?;
        Ok(false)
    }
}

/// What a loop body asked for.
enum Step {
    Next(f64),
    Exit(f64),
}

/// Tree-walking evaluator over a compiled [`NodeArena`].
pub struct Evaluator<'a> {
    arena: &'a NodeArena,
}

impl<'a> Evaluator<'a> {
    pub fn new(arena: &'a NodeArena) -> Self {
        Self { arena }
    }

    /// Evaluate `root` in the context its kind implies.
    pub fn evaluate(&self, root: &NodeId) -> Result<Value, ExecutionError> {
        match self.value(root) {
            Ok(value) => Ok(value),
            Err(Interrupt::Violation(err)) => Err(err),
            Err(Interrupt::Break(value)) => Ok(Value::Scalar(value)),
            Err(Interrupt::Continue | Interrupt::Return) => Ok(Value::Scalar(f64::NAN)),
        }
    }

    /// Evaluate `root` in scalar context.
    pub fn evaluate_scalar(&self, root: &NodeId) -> Result<f64, ExecutionError> {
        match self.scalar(root) {
            Ok(value) | Err(Interrupt::Break(value)) => Ok(value),
            Err(Interrupt::Violation(err)) => Err(err),
            Err(Interrupt::Continue | Interrupt::Return) => Ok(f64::NAN),
        }
    }

    fn value(&self, id: &NodeId) -> Flow<Value> {
        Ok(match self.arena.kind(id) {
            ValueKind::Scalar => Value::Scalar(self.scalar(id)?),
            ValueKind::String => Value::String(self.string(id)?),
            ValueKind::Vector => Value::Vector(self.vector(id)?.to_vec()),
        })
    }

    #[inline]
    fn operand(&self, operand: &Operand) -> Flow<f64> {
        match operand {
            Operand::Var(v) => Ok(v.get()),
            Operand::Const(c) => Ok(*c),
            Operand::Node(id) => self.scalar(id),
        }
    }

    fn args(&self, ids: &[NodeId]) -> Flow<SmallVec<[f64; 8]>> {
        ids.iter().map(|id| self.scalar(id)).collect()
    }

    fn scalar(&self, id: &NodeId) -> Flow<f64> {
        match self.arena.get(id) {
            Node::Literal(v) => Ok(*v),
            Node::Null => Ok(f64::NAN),
            Node::Variable(v) => Ok(v.get()),
            Node::VectorElement { vector, index } => {
                let i = self.scalar(index)?;
                Ok(index_of(i, vector.len()).map_or(f64::NAN, |i| vector[i].get()))
            }
            Node::VectorElementConst { vector, index } => {
                Ok(vector.get(*index).map_or(f64::NAN, Cell::get))
            }
            Node::StringLiteral(_)
            | Node::StringVar(_)
            | Node::StringRange { .. }
            | Node::StringConcat { .. } => {
                self.string(id)?;
                Ok(f64::NAN)
            }
            Node::StringSize(operand) => Ok(self.string(operand)?.chars().count() as f64),
            Node::StringCompare { op, left, right } => {
                let a = self.string_operand(left)?;
                let b = self.string_operand(right)?;
                Ok(string_binary(*op, &a, &b))
            }
            Node::Unary { op, operand } => Ok(unary(*op, self.scalar(operand)?)),
            Node::UnaryVar { op, var } => Ok(unary(*op, var.get())),
            Node::Vector { .. }
            | Node::UnaryVector { .. }
            | Node::VectorBinary { .. }
            | Node::VectorDefinition { .. } => Ok(self.vector(id)?.first()),
            Node::Binary { op, left, right } => {
                let a = self.operand(left)?;
                match op {
                    Operator::And if !is_true(a) => Ok(0.0),
                    Operator::Or if is_true(a) => Ok(1.0),
                    _ => Ok(binary(*op, a, self.operand(right)?)),
                }
            }
            Node::Chain(chain) => Ok(self.chain(chain)),
            Node::IntPow {
                base,
                exponent,
                reciprocal,
            } => {
                let p = int_pow(self.operand(base)?, *exponent);
                Ok(if *reciprocal { 1.0 / p } else { p })
            }
            Node::VectorAggregate { op, operand } => Ok(op.apply(&self.vector(operand)?.to_vec())),
            Node::BaseFunction { op, args } => {
                let v = self.args(args)?;
                Ok(ternary(*op, v[0], v[1], v[2]))
            }
            Node::Special { index, args } => Ok(special::evaluate(*index, &self.args(args)?)),
            Node::VarArg { op, args } => {
                if let [only] = args.as_slice() {
                    if self.arena.kind(only) == ValueKind::Vector {
                        return Ok(op.apply(&self.vector(only)?.to_vec()));
                    }
                }
                Ok(op.apply(&self.args(args)?))
            }
            Node::Function { function, args } => Ok(function.call(&self.args(args)?)),
            Node::VarArgFunction { function, args } => Ok(function.call(&self.args(args)?)),
            Node::Conditional {
                condition,
                consequent,
                alternative,
            } => {
                if is_true(self.scalar(condition)?) {
                    self.scalar(consequent)
                } else {
                    alternative
                        .as_ref()
                        .map_or(Ok(f64::NAN), |alt| self.scalar(alt))
                }
            }
            Node::While {
                condition,
                body,
                check,
            } => self.while_loop(condition, body, check),
            Node::Repeat {
                body,
                condition,
                check,
            } => self.repeat_loop(body, condition, check),
            Node::For {
                init,
                condition,
                increment,
                body,
                check,
            } => self.for_loop(init.as_ref(), condition.as_ref(), increment.as_ref(), body, check),
            Node::Switch { cases, default } => {
                for (condition, consequent) in cases {
                    if is_true(self.scalar(condition)?) {
                        return self.scalar(consequent);
                    }
                }
                self.scalar(default)
            }
            Node::MultiSwitch { cases } => {
                let mut result = f64::NAN;
                for (condition, consequent) in cases {
                    if is_true(self.scalar(condition)?) {
                        result = self.scalar(consequent)?;
                    }
                }
                Ok(result)
            }
            Node::Break(value) => {
                let value = match value {
                    Some(id) => self.scalar(id)?,
                    None => f64::NAN,
                };
                Err(Interrupt::Break(value))
            }
            Node::Continue => Err(Interrupt::Continue),
            Node::Return { args, sink } => self.run_return(args, sink),
            Node::ReturnEnvelope { body, sink } => {
                sink.reset();
                Self::catch_return(self.scalar(body), f64::NAN)
            }
            Node::Assign { op, target, value } => self.assign_scalar(*op, target, value),
            Node::Swap { left, right } => self.swap(left, right),
            Node::Sequence(items) => {
                let Some((last, leading)) = items.split_last() else {
                    return Ok(f64::NAN);
                };
                self.run_all(leading)?;
                self.scalar(last)
            }
            Node::NullEquality { operand, equal } => {
                let v = self.scalar(operand)?;
                Ok(truth(v.is_nan() == *equal))
            }
        }
    }

    fn run_all(&self, ids: &[NodeId]) -> Flow<()> {
        for id in ids {
            self.scalar(id)?;
        }
        Ok(())
    }

    fn catch_return<T>(result: Flow<T>, fallback: T) -> Flow<T> {
        match result {
            Err(Interrupt::Return) => Ok(fallback),
            other => other,
        }
    }

    fn run_return(&self, args: &[NodeId], sink: &ReturnSink) -> Flow<f64> {
        let values = args
            .iter()
            .map(|arg| self.value(arg))
            .collect::<Flow<Vec<_>>>()?;
        sink.record(values);
        Err(Interrupt::Return)
    }

    fn chain(&self, chain: &Chain) -> f64 {
        let v: SmallVec<[f64; 4]> = chain.leaves.iter().map(Leaf::value).collect();
        if let ChainKernel::Special(index) = chain.kernel {
            return special::evaluate(index, &v);
        }
        let o = &chain.ops;
        let b = binary;
        match chain.shape {
            ChainShape::Left3 => b(o[1], b(o[0], v[0], v[1]), v[2]),
            ChainShape::Right3 => b(o[0], v[0], b(o[1], v[1], v[2])),
            ChainShape::Pair4 => b(o[1], b(o[0], v[0], v[1]), b(o[2], v[2], v[3])),
            ChainShape::LeftLeft4 => b(o[2], b(o[1], b(o[0], v[0], v[1]), v[2]), v[3]),
            ChainShape::RightLeft4 => b(o[2], b(o[0], v[0], b(o[1], v[1], v[2])), v[3]),
            ChainShape::LeftRight4 => b(o[0], v[0], b(o[2], b(o[1], v[1], v[2]), v[3])),
            ChainShape::RightRight4 => b(o[0], v[0], b(o[1], v[1], b(o[2], v[2], v[3]))),
        }
    }

    /// Run one loop body, translating break/continue.
    fn body(&self, body: &NodeId) -> Flow<Step> {
        match self.scalar(body) {
            Ok(value) => Ok(Step::Next(value)),
            Err(Interrupt::Continue) => Ok(Step::Next(f64::NAN)),
            Err(Interrupt::Break(value)) => Ok(Step::Exit(value)),
            Err(other) => Err(other),
        }
    }

    fn while_loop(&self, condition: &NodeId, body: &NodeId, check: &LoopCheck) -> Flow<f64> {
        let mut guard = LoopGuard::new(check, LoopTypes::WHILE);
        let mut result = f64::NAN;
        while is_true(self.scalar(condition)?) {
            if !guard.tick()? {
                break;
            }
            match self.body(body)? {
                Step::Next(value) => result = value,
                Step::Exit(value) => return Ok(value),
            }
        }
        Ok(result)
    }

    fn repeat_loop(&self, body: &NodeId, condition: &NodeId, check: &LoopCheck) -> Flow<f64> {
        let mut guard = LoopGuard::new(check, LoopTypes::REPEAT);
        let mut result;
        loop {
            if !guard.tick()? {
                return Ok(f64::NAN);
            }
            match self.body(body)? {
                Step::Next(value) => result = value,
                Step::Exit(value) => return Ok(value),
            }
            if is_true(self.scalar(condition)?) {
                return Ok(result);
            }
        }
    }

    fn for_loop(
        &self,
        init: Option<&NodeId>,
        condition: Option<&NodeId>,
        increment: Option<&NodeId>,
        body: &NodeId,
        check: &LoopCheck,
    ) -> Flow<f64> {
        let mut guard = LoopGuard::new(check, LoopTypes::FOR);
        if let Some(init) = init {
            self.scalar(init)?;
        }
        let mut result = f64::NAN;
        loop {
            if let Some(condition) = condition {
                if !is_true(self.scalar(condition)?) {
                    break;
                }
            }
            if !guard.tick()? {
                break;
            }
            match self.body(body)? {
                Step::Next(value) => result = value,
                Step::Exit(value) => return Ok(value),
            }
            if let Some(increment) = increment {
                self.scalar(increment)?;
            }
        }
        Ok(result)
    }

    fn cell<'t>(&self, target: &'t AssignTarget) -> Flow<Option<&'t Cell<f64>>> {
        Ok(match target {
            AssignTarget::Variable(v) => Some(&**v),
            AssignTarget::Element { vector, index } => {
                let i = self.scalar(index)?;
                index_of(i, vector.len()).map(|i| &vector[i])
            }
            AssignTarget::ElementConst { vector, index } => vector.get(*index),
            _ => None,
        })
    }

    fn assign_scalar(&self, op: Operator, target: &AssignTarget, value: &NodeId) -> Flow<f64> {
        match target {
            AssignTarget::Vector { .. } => Ok(self.assign_vector(op, target, value)?.first()),
            AssignTarget::String(_) | AssignTarget::StringRange { .. } => {
                self.assign_string(op, target, value)?;
                Ok(f64::NAN)
            }
            _ => {
                let cell = self.cell(target)?;
                let x = self.scalar(value)?;
                Ok(match cell {
                    Some(cell) => {
                        let updated = compound(op, cell.get(), x);
                        cell.set(updated);
                        updated
                    }
                    None => f64::NAN,
                })
            }
        }
    }

    fn assign_vector(&self, op: Operator, target: &AssignTarget, value: &NodeId) -> Flow<VectorView> {
        let AssignTarget::Vector { vector, start, len } = target else {
            return Ok(VectorView::single(self.assign_scalar(op, target, value)?));
        };
        let source = if self.arena.kind(value) == ValueKind::Vector {
            Side::Vector(self.vector(value)?)
        } else {
            Side::Scalar(self.scalar(value)?)
        };
        let count = match &source {
            Side::Vector(view) => view.len().min(*len),
            Side::Scalar(_) => *len,
        };
        for i in 0..count {
            let cell = &vector[start + i];
            cell.set(compound(op, cell.get(), source.get(i)));
        }
        Ok(VectorView {
            data: vector.clone(),
            start: *start,
            len: *len,
        })
    }

    fn assign_string(&self, op: Operator, target: &AssignTarget, value: &NodeId) -> Flow<String> {
        let x = self.string(value)?;
        match target {
            AssignTarget::String(s) => {
                let mut s = s.borrow_mut();
                if op == Operator::AddAssign {
                    s.push_str(&x);
                } else {
                    *s = x;
                }
                Ok(s.clone())
            }
            AssignTarget::StringRange { target, range } => {
                let current = target.borrow().clone();
                let len = current.chars().count();
                let Some((start, end)) = self.resolve_range(range, len)? else {
                    return Ok(String::new());
                };
                let width = end + 1 - start;
                let mut chars: Vec<char> = current.chars().collect();
                for (slot, c) in chars[start..=end].iter_mut().zip(x.chars().take(width)) {
                    *slot = c;
                }
                let updated: String = chars.into_iter().collect();
                let written = char_range(&updated, start, end);
                *target.borrow_mut() = updated;
                Ok(written)
            }
            _ => Ok(String::new()),
        }
    }

    fn swap(&self, left: &AssignTarget, right: &AssignTarget) -> Flow<f64> {
        match (left, right) {
            (
                AssignTarget::Vector {
                    vector: a,
                    start: sa,
                    len: la,
                },
                AssignTarget::Vector {
                    vector: b,
                    start: sb,
                    len: lb,
                },
            ) => {
                for i in 0..(*la).min(*lb) {
                    a[sa + i].swap(&b[sb + i]);
                }
                Ok(f64::NAN)
            }
            (AssignTarget::String(a), AssignTarget::String(b)) => {
                if !Rc::ptr_eq(a, b) {
                    a.swap(b);
                }
                Ok(f64::NAN)
            }
            _ => {
                let a = self.cell(left)?;
                let b = self.cell(right)?;
                Ok(match (a, b) {
                    (Some(a), Some(b)) => {
                        a.swap(b);
                        a.get()
                    }
                    _ => f64::NAN,
                })
            }
        }
    }

    fn bound(&self, bound: &Bound, open: usize) -> Flow<Option<usize>> {
        Ok(match bound {
            Bound::Open => Some(open),
            Bound::Const(c) => Some(*c),
            Bound::Node(id) => {
                let x = self.scalar(id)?;
                (x.is_finite() && x >= 0.0).then_some(x as usize)
            }
        })
    }

    /// Resolve an inclusive range against a length. `None` when invalid.
    fn resolve_range(&self, range: &RangeSpec, len: usize) -> Flow<Option<(usize, usize)>> {
        if len == 0 {
            return Ok(None);
        }
        let start = self.bound(&range.start, 0)?;
        let end = self.bound(&range.end, len - 1)?;
        Ok(match (start, end) {
            (Some(start), Some(end)) if start <= end && end < len => Some((start, end)),
            _ => None,
        })
    }

    fn string_operand(&self, operand: &StringOperand) -> Flow<String> {
        match operand {
            StringOperand::Var(s) => Ok(s.borrow().clone()),
            StringOperand::Literal(s) => Ok(s.clone()),
            StringOperand::Node(id) => self.string(id),
        }
    }

    fn string(&self, id: &NodeId) -> Flow<String> {
        match self.arena.get(id) {
            Node::StringLiteral(s) => Ok(s.clone()),
            Node::StringVar(s) => Ok(s.borrow().clone()),
            Node::StringRange { source, range } => {
                let source = match source {
                    StringSource::Var(s) => s.borrow().clone(),
                    StringSource::Literal(s) => s.clone(),
                    StringSource::Node(id) => self.string(id)?,
                };
                let len = source.chars().count();
                Ok(match self.resolve_range(range, len)? {
                    Some((start, end)) => char_range(&source, start, end),
                    None => String::new(),
                })
            }
            Node::StringConcat { left, right } => {
                let mut s = self.string(left)?;
                s.push_str(&self.string(right)?);
                Ok(s)
            }
            Node::Conditional {
                condition,
                consequent,
                alternative,
            } => {
                if is_true(self.scalar(condition)?) {
                    self.string(consequent)
                } else {
                    alternative
                        .as_ref()
                        .map_or(Ok(String::new()), |alt| self.string(alt))
                }
            }
            Node::Assign { op, target, value } => self.assign_string(*op, target, value),
            Node::Sequence(items) => {
                let Some((last, leading)) = items.split_last() else {
                    return Ok(String::new());
                };
                self.run_all(leading)?;
                self.string(last)
            }
            Node::ReturnEnvelope { body, sink } => {
                sink.reset();
                Self::catch_return(self.string(body), String::new())
            }
            _ => {
                self.scalar(id)?;
                Ok(String::new())
            }
        }
    }

    fn vector_operand(&self, operand: &VectorOperand) -> Flow<Side> {
        Ok(match operand {
            VectorOperand::Vector(id) => Side::Vector(self.vector(id)?),
            VectorOperand::Scalar(id) => Side::Scalar(self.scalar(id)?),
        })
    }

    fn vector(&self, id: &NodeId) -> Flow<VectorView> {
        match self.arena.get(id) {
            Node::Vector { vector, start, len } => Ok(VectorView {
                data: vector.clone(),
                start: *start,
                len: *len,
            }),
            Node::UnaryVector { op, operand, temp } => {
                let source = self.vector(operand)?;
                for (i, cell) in temp.iter().enumerate() {
                    cell.set(unary(*op, source.get(i)));
                }
                Ok(VectorView::whole(temp))
            }
            Node::VectorBinary {
                op,
                left,
                right,
                temp,
            } => {
                let a = self.vector_operand(left)?;
                let b = self.vector_operand(right)?;
                for (i, cell) in temp.iter().enumerate() {
                    cell.set(binary(*op, a.get(i), b.get(i)));
                }
                Ok(VectorView::whole(temp))
            }
            Node::VectorDefinition { storage, init } => {
                self.initialize(storage, init)?;
                Ok(VectorView::whole(storage))
            }
            Node::Assign { op, target, value } => self.assign_vector(*op, target, value),
            Node::Conditional {
                condition,
                consequent,
                alternative,
            } => {
                if is_true(self.scalar(condition)?) {
                    self.vector(consequent)
                } else {
                    match alternative {
                        Some(alt) => self.vector(alt),
                        None => Ok(VectorView::single(f64::NAN)),
                    }
                }
            }
            Node::Sequence(items) => {
                let Some((last, leading)) = items.split_last() else {
                    return Ok(VectorView::single(f64::NAN));
                };
                self.run_all(leading)?;
                self.vector(last)
            }
            Node::ReturnEnvelope { body, sink } => {
                sink.reset();
                match self.vector(body) {
                    Err(Interrupt::Return) => Ok(VectorView::single(f64::NAN)),
                    other => other,
                }
            }
            _ => Ok(VectorView::single(self.scalar(id)?)),
        }
    }

    fn initialize(&self, storage: &VectorRef, init: &VectorInit) -> Flow<()> {
        match init {
            VectorInit::Zero => storage.iter().for_each(|cell| cell.set(0.0)),
            VectorInit::Broadcast(value) => {
                let x = self.scalar(value)?;
                storage.iter().for_each(|cell| cell.set(x));
            }
            VectorInit::List(items) => {
                for (i, cell) in storage.iter().enumerate() {
                    let x = match items.get(i) {
                        Some(item) => self.scalar(item)?,
                        None => 0.0,
                    };
                    cell.set(x);
                }
            }
            VectorInit::Copy(source) => {
                let view = self.vector(source)?;
                for (i, cell) in storage.iter().enumerate() {
                    cell.set(if i < view.len() { view.get(i) } else { 0.0 });
                }
            }
        }
        Ok(())
    }
}
