//! Control flow and call nodes.

use super::{BREAK_AS_VALUE, ExpressionGenerator, GenError, GenResult};
use crate::evaluator::{Operator, VarArgOp, is_true, special, ternary};
use crate::symbols::{Function, VarArgFunction};
use crate::tree::{LoopCheck, Node, NodeId, ReturnSink, ValueKind};
use smallvec::SmallVec;
use std::rc::Rc;
use tracing::debug;

impl ExpressionGenerator<'_> {
    /// `if`, ternary and the function form `if(c, x, y)`.
    ///
    /// A literal condition selects its branch at compile time.
    pub fn conditional(
        &mut self,
        condition: NodeId,
        consequent: NodeId,
        alternative: Option<NodeId>,
    ) -> GenResult {
        let err = if self.is_break_or_continue(&condition) {
            Some(GenError::InvalidOperand {
                op: "if".to_string(),
                reason: BREAK_AS_VALUE,
            })
        } else if self.kind(&condition) == ValueKind::String {
            Some(GenError::TypeMismatch {
                op: "if".to_string(),
                reason: "condition must be numeric",
            })
        } else {
            alternative.as_ref().and_then(|alt| {
                let (a, b) = (self.kind(&consequent), self.kind(alt));
                // Control-flow branches (break, continue, null) mix freely.
                let free = |id: &NodeId| {
                    let node = self.arena.get(id);
                    node.is_break_or_continue() || node.is_null()
                };
                (a != b && !free(&consequent) && !free(alt)).then(|| {
                    GenError::TypeMismatch {
                        op: "if".to_string(),
                        reason: "branches must be of the same kind",
                    }
                })
            })
        };
        if let Some(err) = err {
            let mut ids = vec![condition, consequent];
            ids.extend(alternative);
            return self.fail(ids, err);
        }

        if let Some(value) = self.arena.literal(&condition) {
            self.arena.free_tree(condition);
            debug!(value, "Selected conditional branch at compile time");
            return if is_true(value) {
                self.free_all(alternative);
                Ok(consequent)
            } else {
                self.arena.free_tree(consequent);
                match alternative {
                    Some(alt) => Ok(alt),
                    None => self.null(),
                }
            };
        }
        self.alloc(Node::Conditional {
            condition,
            consequent,
            alternative,
        })
    }

    pub fn while_loop(&mut self, condition: NodeId, body: NodeId, check: LoopCheck) -> GenResult {
        if self.arena.literal(&condition).is_some_and(|v| !is_true(v)) {
            self.free_all([condition, body]);
            return self.null();
        }
        self.alloc(Node::While {
            condition,
            body,
            check,
        })
    }

    pub fn repeat_loop(&mut self, body: NodeId, condition: NodeId, check: LoopCheck) -> GenResult {
        self.alloc(Node::Repeat {
            body,
            condition,
            check,
        })
    }

    pub fn for_loop(
        &mut self,
        init: Option<NodeId>,
        condition: Option<NodeId>,
        increment: Option<NodeId>,
        body: NodeId,
        check: LoopCheck,
    ) -> GenResult {
        if condition
            .as_ref()
            .and_then(|c| self.arena.literal(c))
            .is_some_and(|v| !is_true(v))
        {
            self.free_all(condition);
            self.free_all(increment);
            self.free(body);
            return match init {
                Some(init) => Ok(init),
                None => self.null(),
            };
        }
        self.alloc(Node::For {
            init,
            condition,
            increment,
            body,
            check,
        })
    }

    /// `switch { case c: x; ... default: y; }`.
    ///
    /// Cases with a literal false condition are dropped; a leading literal
    /// true case replaces the whole switch.
    pub fn switch(&mut self, cases: Vec<(NodeId, NodeId)>, default: NodeId) -> GenResult {
        let mut kept = Vec::with_capacity(cases.len());
        let mut cases = cases.into_iter();
        while let Some((condition, consequent)) = cases.next() {
            match self.arena.literal(&condition) {
                Some(v) if !is_true(v) => self.free_all([condition, consequent]),
                Some(_) if kept.is_empty() => {
                    self.free(condition);
                    for (c, x) in cases.by_ref() {
                        self.free_all([c, x]);
                    }
                    self.free(default);
                    return Ok(consequent);
                }
                _ => kept.push((condition, consequent)),
            }
        }
        if kept.is_empty() {
            return Ok(default);
        }
        self.alloc(Node::Switch {
            cases: kept,
            default,
        })
    }

    /// `[*] { case c: x; ... }`: every true case runs.
    pub fn multi_switch(&mut self, cases: Vec<(NodeId, NodeId)>) -> GenResult {
        let mut kept = Vec::with_capacity(cases.len());
        for (condition, consequent) in cases {
            match self.arena.literal(&condition) {
                Some(v) if !is_true(v) => self.free_all([condition, consequent]),
                _ => kept.push((condition, consequent)),
            }
        }
        if kept.is_empty() {
            return self.null();
        }
        self.alloc(Node::MultiSwitch { cases: kept })
    }

    pub fn break_node(&mut self, value: Option<NodeId>) -> GenResult {
        if let Some(v) = &value {
            if self.is_break_or_continue(v) {
                return self.fail(
                    value,
                    GenError::InvalidOperand {
                        op: "break".to_string(),
                        reason: BREAK_AS_VALUE,
                    },
                );
            }
        }
        self.alloc(Node::Break(value))
    }

    pub fn continue_node(&mut self) -> GenResult {
        self.alloc(Node::Continue)
    }

    pub fn return_node(&mut self, args: Vec<NodeId>, sink: Rc<ReturnSink>) -> GenResult {
        let args = self.check_values("return", args)?;
        self.alloc(Node::Return { args, sink })
    }

    pub fn return_envelope(&mut self, body: NodeId, sink: Rc<ReturnSink>) -> GenResult {
        self.alloc(Node::ReturnEnvelope { body, sink })
    }

    /// Three-argument base function (`clamp`, `iclamp`, `inrange`).
    pub fn base_function3(&mut self, op: Operator, args: Vec<NodeId>) -> GenResult {
        let args = self.check_values(op.symbol(), args)?;
        let args = self.check_numeric(op.symbol(), args)?;
        let args = match self.try_fold(args, |v| ternary(op, v[0], v[1], v[2])) {
            Ok(folded) => return folded,
            Err(args) => args,
        };
        self.alloc(Node::BaseFunction {
            op,
            args: SmallVec::from_vec(args),
        })
    }

    /// `$fNN(...)`.
    pub fn special(&mut self, index: u8, args: Vec<NodeId>) -> GenResult {
        let args = self.check_values("$f", args)?;
        let args = self.check_numeric("$f", args)?;
        let args = match self.try_fold(args, |v| special::evaluate(index, v)) {
            Ok(folded) => return folded,
            Err(args) => args,
        };
        self.alloc(Node::Special {
            index,
            args: SmallVec::from_vec(args),
        })
    }

    /// Built-in variadic function. A single vector argument is aggregated.
    pub fn vararg(&mut self, op: VarArgOp, args: Vec<NodeId>) -> GenResult {
        let args = self.check_values(op.name(), args)?;
        let mut args = self.check_numeric(op.name(), args)?;
        if args.len() == 1 && self.kind(&args[0]) == ValueKind::Vector {
            if let Some(operand) = args.pop() {
                return self.vector_aggregate(op, operand);
            }
        }
        let args = match self.try_fold(args, |v| op.apply(v)) {
            Ok(folded) => return folded,
            Err(args) => args,
        };
        self.alloc(Node::VarArg { op, args })
    }

    /// Host function call; side-effect free functions fold over literals.
    pub fn function(&mut self, function: Rc<dyn Function>, args: Vec<NodeId>) -> GenResult {
        let args = self.check_values("function", args)?;
        let args = self.check_numeric("function", args)?;
        let args = if function.has_side_effects() {
            args
        } else {
            match self.try_fold(args, |v| function.call(v)) {
                Ok(folded) => return folded,
                Err(args) => args,
            }
        };
        self.alloc(Node::Function { function, args })
    }

    pub fn vararg_function(
        &mut self,
        function: Rc<dyn VarArgFunction>,
        args: Vec<NodeId>,
    ) -> GenResult {
        let args = self.check_values("function", args)?;
        let args = self.check_numeric("function", args)?;
        let args = if function.has_side_effects() {
            args
        } else {
            match self.try_fold(args, |v| function.call(v)) {
                Ok(folded) => return folded,
                Err(args) => args,
            }
        };
        self.alloc(Node::VarArgFunction { function, args })
    }
}
