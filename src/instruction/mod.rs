/*!
 * Instruction Module
 * The closed instruction set executed by simulated processes
 */

pub mod interpreter;
pub mod types;

pub use interpreter::SLEEP_UNIT;
pub use types::{Instruction, InstructionKind, Operand, Template, VarName};
