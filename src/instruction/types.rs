/*!
 * Instruction Types
 * Value objects for one executable step of a process program
 */

use serde::{Deserialize, Serialize};
use smartstring::alias::String as SmartString;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Variable name (short names stay inline)
pub type VarName = SmartString;

/// Arithmetic operand
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Literal(u16),
    Var(VarName),
}

impl Operand {
    pub fn var(name: &str) -> Self {
        Self::Var(name.into())
    }

    /// Build from the flag form: `name` is used when `is_var`, otherwise `value`
    pub fn from_parts(name: &str, is_var: bool, value: u16) -> Self {
        if is_var {
            Self::var(name)
        } else {
            Self::Literal(value)
        }
    }
}

impl From<u16> for Operand {
    fn from(value: u16) -> Self {
        Self::Literal(value)
    }
}

impl From<&str> for Operand {
    fn from(name: &str) -> Self {
        Self::var(name)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => write!(f, "{}", value),
            Self::Var(name) => f.write_str(name),
        }
    }
}

/// Print template: a literal, or a literal prefix followed by one variable's value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Template {
    Literal(String),
    Concat { prefix: String, var: VarName },
}

impl Template {
    /// Parse `"prefix" + var`, `"text"`, or bare text
    ///
    /// Whitespace inside the quotes is kept. A malformed concatenation is
    /// treated as literal text rather than rejected.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        if let Some(rest) = trimmed.strip_prefix('"') {
            if let Some(end) = rest.find('"') {
                let prefix = &rest[..end];
                let tail = rest[end + 1..].trim();

                if tail.is_empty() {
                    return Self::Literal(prefix.to_string());
                }
                if let Some(var) = tail.strip_prefix('+').map(str::trim) {
                    if is_identifier(var) {
                        return Self::Concat {
                            prefix: prefix.to_string(),
                            var: var.into(),
                        };
                    }
                }
            }
        }

        Self::Literal(trimmed.to_string())
    }
}

impl FromStr for Template {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(text) => write!(f, "\"{}\"", text),
            Self::Concat { prefix, var } => write!(f, "\"{}\" + {}", prefix, var),
        }
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Instruction discriminant, used for statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructionKind {
    Print,
    Sleep,
    Declare,
    Add,
    Subtract,
    Repeat,
}

/// One step of a process program
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Append a rendered message to the process log
    Print(Template),
    /// Block the executing core for `ticks` sleep units
    Sleep(u32),
    /// Set a variable unconditionally
    Declare { var: VarName, value: u16 },
    /// `target = lhs + rhs`, saturating at 65535
    Add {
        target: VarName,
        lhs: Operand,
        rhs: Operand,
    },
    /// `target = lhs - rhs`, floored at 0
    Subtract {
        target: VarName,
        lhs: Operand,
        rhs: Operand,
    },
    /// Run `body` in order, `count` times, within a single step
    Repeat { body: Vec<Instruction>, count: u32 },
}

impl Instruction {
    pub fn print(template: &str) -> Self {
        Self::Print(Template::parse(template))
    }

    pub fn print_var(prefix: &str, var: &str) -> Self {
        Self::Print(Template::Concat {
            prefix: prefix.to_string(),
            var: var.into(),
        })
    }

    pub fn sleep(ticks: u32) -> Self {
        Self::Sleep(ticks)
    }

    pub fn declare(var: &str, value: u16) -> Self {
        Self::Declare {
            var: var.into(),
            value,
        }
    }

    pub fn add(target: &str, lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Self {
        Self::Add {
            target: target.into(),
            lhs: lhs.into(),
            rhs: rhs.into(),
        }
    }

    pub fn subtract(target: &str, lhs: impl Into<Operand>, rhs: impl Into<Operand>) -> Self {
        Self::Subtract {
            target: target.into(),
            lhs: lhs.into(),
            rhs: rhs.into(),
        }
    }

    /// `ADD` in flag form: each operand is a variable when its flag is set,
    /// otherwise the paired literal
    pub fn add_from_parts(
        target: &str,
        op1: &str,
        op2: &str,
        op1_is_var: bool,
        op2_is_var: bool,
        val1: u16,
        val2: u16,
    ) -> Self {
        Self::add(
            target,
            Operand::from_parts(op1, op1_is_var, val1),
            Operand::from_parts(op2, op2_is_var, val2),
        )
    }

    /// `SUBTRACT` in flag form, see [`Instruction::add_from_parts`]
    pub fn subtract_from_parts(
        target: &str,
        op1: &str,
        op2: &str,
        op1_is_var: bool,
        op2_is_var: bool,
        val1: u16,
        val2: u16,
    ) -> Self {
        Self::subtract(
            target,
            Operand::from_parts(op1, op1_is_var, val1),
            Operand::from_parts(op2, op2_is_var, val2),
        )
    }

    pub fn repeat(body: Vec<Instruction>, count: u32) -> Self {
        Self::Repeat { body, count }
    }

    pub const fn kind(&self) -> InstructionKind {
        match self {
            Self::Print(_) => InstructionKind::Print,
            Self::Sleep(_) => InstructionKind::Sleep,
            Self::Declare { .. } => InstructionKind::Declare,
            Self::Add { .. } => InstructionKind::Add,
            Self::Subtract { .. } => InstructionKind::Subtract,
            Self::Repeat { .. } => InstructionKind::Repeat,
        }
    }

    /// Number of primitive operations one execution performs (`Repeat` expanded)
    pub fn executed_units(&self) -> u64 {
        match self {
            Self::Repeat { body, count } => body
                .iter()
                .map(Instruction::executed_units)
                .sum::<u64>()
                .saturating_mul(u64::from(*count)),
            _ => 1,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Print(template) => write!(f, "PRINT({})", template),
            Self::Sleep(ticks) => write!(f, "SLEEP({})", ticks),
            Self::Declare { var, value } => write!(f, "DECLARE({}, {})", var, value),
            Self::Add { target, lhs, rhs } => write!(f, "ADD({}, {}, {})", target, lhs, rhs),
            Self::Subtract { target, lhs, rhs } => {
                write!(f, "SUBTRACT({}, {}, {})", target, lhs, rhs)
            }
            Self::Repeat { body, count } => {
                f.write_str("FOR([")?;
                for (i, instr) in body.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", instr)?;
                }
                write!(f, "], {})", count)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_template_parsing() {
        assert_eq!(
            Template::parse("Hello world from p01!"),
            Template::Literal("Hello world from p01!".into())
        );
        assert_eq!(
            Template::parse("\"Loop message 0\""),
            Template::Literal("Loop message 0".into())
        );
        assert_eq!(
            Template::parse("\"Value from: \" + x"),
            Template::Concat {
                prefix: "Value from: ".into(),
                var: "x".into()
            }
        );
    }

    #[test]
    fn test_malformed_concat_is_literal() {
        assert_eq!(
            Template::parse("\"a\" + 9lives"),
            Template::Literal("\"a\" + 9lives".into())
        );
        assert_eq!(Template::parse("1 + 1"), Template::Literal("1 + 1".into()));
    }

    #[test]
    fn test_operand_from_parts() {
        assert_eq!(Operand::from_parts("x", true, 9), Operand::var("x"));
        assert_eq!(Operand::from_parts("x", false, 9), Operand::Literal(9));
    }

    #[test]
    fn test_executed_units() {
        let body = vec![Instruction::print("a"), Instruction::declare("d0", 1)];
        let nested = Instruction::repeat(vec![Instruction::repeat(body.clone(), 2)], 3);

        assert_eq!(Instruction::print("x").executed_units(), 1);
        assert_eq!(Instruction::repeat(body, 4).executed_units(), 8);
        assert_eq!(nested.executed_units(), 12);
        assert_eq!(Instruction::repeat(vec![], 5).executed_units(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Instruction::add("y", "x", 5u16).to_string(),
            "ADD(y, x, 5)"
        );
        assert_eq!(
            Instruction::repeat(vec![Instruction::sleep(1)], 2).to_string(),
            "FOR([SLEEP(1)], 2)"
        );
    }
}
