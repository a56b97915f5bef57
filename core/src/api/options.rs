//! Compiler settings.
//!
//! Every pass and feature the parser and generator consult lives here.
//! The defaults enable everything, with a sub-expression recursion bound of
//! 400 and a synthesized-tree depth bound of 10 000.

use crate::evaluator::Operator;
use bitflags::bitflags;
use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

bitflags! {
    /// Control structures that may appear in an expression.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ControlStructures: u32 {
        const IF     = 1 << 0;
        const SWITCH = 1 << 1;
        const FOR    = 1 << 2;
        const WHILE  = 1 << 3;
        const REPEAT = 1 << 4;
        const RETURN = 1 << 5;
    }
}

bitflags! {
    /// Logical operators.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct LogicOperators: u32 {
        const AND  = 1 << 0;
        const NAND = 1 << 1;
        const OR   = 1 << 2;
        const NOR  = 1 << 3;
        const XOR  = 1 << 4;
        const XNOR = 1 << 5;
        const NOT  = 1 << 6;
    }
}

bitflags! {
    /// Arithmetic operators.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct ArithmeticOperators: u32 {
        const ADD = 1 << 0;
        const SUB = 1 << 1;
        const MUL = 1 << 2;
        const DIV = 1 << 3;
        const MOD = 1 << 4;
        const POW = 1 << 5;
    }
}

bitflags! {
    /// Assignment operators.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct AssignmentOperators: u32 {
        const ASSIGN     = 1 << 0;
        const ADD_ASSIGN = 1 << 1;
        const SUB_ASSIGN = 1 << 2;
        const MUL_ASSIGN = 1 << 3;
        const DIV_ASSIGN = 1 << 4;
        const MOD_ASSIGN = 1 << 5;
    }
}

bitflags! {
    /// Comparison operators.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct InequalityOperators: u32 {
        const LT  = 1 << 0;
        const LTE = 1 << 1;
        const EQ  = 1 << 2;
        const NE  = 1 << 3;
        const GTE = 1 << 4;
        const GT  = 1 << 5;
    }
}

/// Configuration for a [`Parser`](crate::parser::Parser).
///
/// # Example
///
/// ```
/// use calyx_core::api::{AssignmentOperators, Settings};
///
/// let settings = Settings::default()
///     .disable_assignment_operators(AssignmentOperators::all())
///     .with_max_stack_depth(64);
/// assert!(!settings.assignment_operators.contains(AssignmentOperators::ASSIGN));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Replace `true`/`false` and user-supplied symbols before parsing.
    pub replacer: bool,
    /// Re-join split operators (`: =` to `:=`) and collapse sign pairs.
    pub joiner: bool,
    /// Validate numeric literals before parsing.
    pub numeric_check: bool,
    /// Validate bracket balance before parsing.
    pub bracket_check: bool,
    /// Reject invalid adjacent token pairs before parsing.
    pub sequence_check: bool,
    /// Insert implied multiplication (`2x` to `2*x`).
    pub commutative_check: bool,
    /// Apply algebraic rewrites and constant collapsing in operator chains.
    pub strength_reduction: bool,
    /// Allow `var` declarations.
    pub vardef: bool,
    /// Record referenced variables in the dependent entity collector.
    pub collect_variables: bool,
    /// Record referenced functions in the dependent entity collector.
    pub collect_functions: bool,
    /// Record assignment targets in the dependent entity collector.
    pub collect_assignments: bool,
    /// Maximum sub-expression recursion depth.
    pub max_stack_depth: usize,
    /// Maximum synthesized tree depth.
    pub max_node_depth: usize,

    pub control_structures: ControlStructures,
    pub logic_operators: LogicOperators,
    pub arithmetic_operators: ArithmeticOperators,
    pub assignment_operators: AssignmentOperators,
    pub inequality_operators: InequalityOperators,

    /// Base functions that may not be called.
    pub disabled_functions: HashSet<String>,
    /// Extra symbol replacements applied by the replacer pass.
    pub replacements: HashMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            replacer: true,
            joiner: true,
            numeric_check: true,
            bracket_check: true,
            sequence_check: true,
            commutative_check: true,
            strength_reduction: true,
            vardef: true,
            collect_variables: false,
            collect_functions: false,
            collect_assignments: false,
            max_stack_depth: 400,
            max_node_depth: 10_000,
            control_structures: ControlStructures::all(),
            logic_operators: LogicOperators::all(),
            arithmetic_operators: ArithmeticOperators::all(),
            assignment_operators: AssignmentOperators::all(),
            inequality_operators: InequalityOperators::all(),
            disabled_functions: HashSet::new(),
            replacements: HashMap::new(),
        }
    }
}

impl Settings {
    /// Settings with every token pass and optimisation turned off.
    pub fn minimal() -> Self {
        Self {
            replacer: false,
            joiner: false,
            numeric_check: false,
            bracket_check: false,
            sequence_check: false,
            commutative_check: false,
            strength_reduction: false,
            ..Self::default()
        }
    }

    pub fn with_max_stack_depth(mut self, depth: usize) -> Self {
        self.max_stack_depth = depth;
        self
    }

    pub fn with_max_node_depth(mut self, depth: usize) -> Self {
        self.max_node_depth = depth;
        self
    }

    pub fn with_strength_reduction(mut self, enabled: bool) -> Self {
        self.strength_reduction = enabled;
        self
    }

    pub fn with_commutative_check(mut self, enabled: bool) -> Self {
        self.commutative_check = enabled;
        self
    }

    pub fn with_vardef(mut self, enabled: bool) -> Self {
        self.vardef = enabled;
        self
    }

    /// Turn on all three dependent entity collections.
    pub fn collect_all(mut self) -> Self {
        self.collect_variables = true;
        self.collect_functions = true;
        self.collect_assignments = true;
        self
    }

    pub fn with_replacement(mut self, symbol: impl Into<String>, text: impl Into<String>) -> Self {
        self.replacements.insert(symbol.into(), text.into());
        self
    }

    pub fn enable_control_structures(mut self, set: ControlStructures) -> Self {
        self.control_structures.insert(set);
        self
    }

    pub fn disable_control_structures(mut self, set: ControlStructures) -> Self {
        self.control_structures.remove(set);
        self
    }

    pub fn enable_logic_operators(mut self, set: LogicOperators) -> Self {
        self.logic_operators.insert(set);
        self
    }

    pub fn disable_logic_operators(mut self, set: LogicOperators) -> Self {
        self.logic_operators.remove(set);
        self
    }

    pub fn enable_arithmetic_operators(mut self, set: ArithmeticOperators) -> Self {
        self.arithmetic_operators.insert(set);
        self
    }

    pub fn disable_arithmetic_operators(mut self, set: ArithmeticOperators) -> Self {
        self.arithmetic_operators.remove(set);
        self
    }

    pub fn enable_assignment_operators(mut self, set: AssignmentOperators) -> Self {
        self.assignment_operators.insert(set);
        self
    }

    pub fn disable_assignment_operators(mut self, set: AssignmentOperators) -> Self {
        self.assignment_operators.remove(set);
        self
    }

    pub fn enable_inequality_operators(mut self, set: InequalityOperators) -> Self {
        self.inequality_operators.insert(set);
        self
    }

    pub fn disable_inequality_operators(mut self, set: InequalityOperators) -> Self {
        self.inequality_operators.remove(set);
        self
    }

    pub fn enable_base_function(mut self, name: &str) -> Self {
        self.disabled_functions.remove(name);
        self
    }

    pub fn disable_base_function(mut self, name: &str) -> Self {
        self.disabled_functions.insert(name.to_string());
        self
    }

    pub fn base_function_enabled(&self, name: &str) -> bool {
        !self.disabled_functions.contains(name)
    }

    pub fn control_enabled(&self, structure: ControlStructures) -> bool {
        self.control_structures.contains(structure)
    }

    /// Whether `op` may be synthesized. Operators outside the five
    /// configurable families are always enabled.
    pub fn operator_enabled(&self, op: Operator) -> bool {
        use Operator::*;
        match op {
            Add => self.arithmetic_operators.contains(ArithmeticOperators::ADD),
            Sub => self.arithmetic_operators.contains(ArithmeticOperators::SUB),
            Mul => self.arithmetic_operators.contains(ArithmeticOperators::MUL),
            Div => self.arithmetic_operators.contains(ArithmeticOperators::DIV),
            Mod => self.arithmetic_operators.contains(ArithmeticOperators::MOD),
            Pow => self.arithmetic_operators.contains(ArithmeticOperators::POW),

            Lt => self.inequality_operators.contains(InequalityOperators::LT),
            Lte => self.inequality_operators.contains(InequalityOperators::LTE),
            Eq => self.inequality_operators.contains(InequalityOperators::EQ),
            Ne => self.inequality_operators.contains(InequalityOperators::NE),
            Gte => self.inequality_operators.contains(InequalityOperators::GTE),
            Gt => self.inequality_operators.contains(InequalityOperators::GT),

            And => self.logic_operators.contains(LogicOperators::AND),
            Nand => self.logic_operators.contains(LogicOperators::NAND),
            Or => self.logic_operators.contains(LogicOperators::OR),
            Nor => self.logic_operators.contains(LogicOperators::NOR),
            Xor => self.logic_operators.contains(LogicOperators::XOR),
            Xnor => self.logic_operators.contains(LogicOperators::XNOR),
            Not => self.logic_operators.contains(LogicOperators::NOT),

            Assign => self.assignment_operators.contains(AssignmentOperators::ASSIGN),
            AddAssign => self.assignment_operators.contains(AssignmentOperators::ADD_ASSIGN),
            SubAssign => self.assignment_operators.contains(AssignmentOperators::SUB_ASSIGN),
            MulAssign => self.assignment_operators.contains(AssignmentOperators::MUL_ASSIGN),
            DivAssign => self.assignment_operators.contains(AssignmentOperators::DIV_ASSIGN),
            ModAssign => self.assignment_operators.contains(AssignmentOperators::MOD_ASSIGN),

            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_enable_everything() {
        let settings = Settings::default();
        assert_eq!(settings.max_stack_depth, 400);
        assert_eq!(settings.max_node_depth, 10_000);
        assert!(settings.operator_enabled(Operator::Assign));
        assert!(settings.operator_enabled(Operator::Xnor));
        assert!(settings.control_enabled(ControlStructures::REPEAT));
        assert!(settings.base_function_enabled("sin"));
    }

    #[test]
    fn test_disable_and_reenable() {
        let settings = Settings::default()
            .disable_assignment_operators(AssignmentOperators::ASSIGN | AssignmentOperators::ADD_ASSIGN)
            .disable_base_function("sin");
        assert!(!settings.operator_enabled(Operator::Assign));
        assert!(!settings.operator_enabled(Operator::AddAssign));
        assert!(settings.operator_enabled(Operator::SubAssign));
        assert!(!settings.base_function_enabled("sin"));

        let settings = settings
            .enable_assignment_operators(AssignmentOperators::ASSIGN)
            .enable_base_function("sin");
        assert!(settings.operator_enabled(Operator::Assign));
        assert!(settings.base_function_enabled("sin"));
    }

    #[test]
    fn test_minimal_turns_off_passes_only() {
        let settings = Settings::minimal();
        assert!(!settings.joiner);
        assert!(!settings.strength_reduction);
        assert!(settings.vardef);
        assert_eq!(settings.max_stack_depth, 400);
    }
}
