/*!
 * Instruction Interpreter
 * Applies instructions to the owning process's variables and log
 */

use super::types::{Instruction, Operand, Template};
use crate::core::types::CoreId;
use crate::process::Process;
use std::thread;
use std::time::Duration;

/// Wall-clock length of one `Sleep` tick
pub const SLEEP_UNIT: Duration = Duration::from_millis(1);

impl Operand {
    /// Current value; unknown variables read as 0
    #[inline]
    pub fn resolve(&self, process: &Process) -> u16 {
        match self {
            Operand::Literal(value) => *value,
            Operand::Var(name) => process.read_var(name),
        }
    }
}

impl Template {
    pub fn render(&self, process: &Process) -> String {
        match self {
            Template::Literal(text) => text.clone(),
            Template::Concat { prefix, var } => format!("{}{}", prefix, process.read_var(var)),
        }
    }
}

impl Instruction {
    /// Execute against `process` on behalf of `core`
    ///
    /// Touches only the process's variable store and log. `Sleep` blocks the
    /// calling thread; nothing here can fail.
    pub fn apply(&self, process: &mut Process, core: CoreId) {
        let pause = self.execute(process, core);
        if !pause.is_zero() {
            thread::sleep(pause);
        }
    }

    /// Like [`apply`](Self::apply) but returns the sleep owed instead of
    /// blocking, so the caller can serve it after releasing the process
    ///
    /// A `Repeat` owes the sum of its bodies' sleeps.
    pub fn execute(&self, process: &mut Process, core: CoreId) -> Duration {
        match self {
            Instruction::Print(template) => {
                let message = template.render(process);
                process.log(core, message);
                Duration::ZERO
            }
            Instruction::Sleep(ticks) => SLEEP_UNIT * *ticks,
            Instruction::Declare { var, value } => {
                process.write_var(var, *value);
                Duration::ZERO
            }
            Instruction::Add { target, lhs, rhs } => {
                let value = lhs.resolve(process).saturating_add(rhs.resolve(process));
                process.write_var(target, value);
                Duration::ZERO
            }
            Instruction::Subtract { target, lhs, rhs } => {
                let value = lhs.resolve(process).saturating_sub(rhs.resolve(process));
                process.write_var(target, value);
                Duration::ZERO
            }
            Instruction::Repeat { body, count } => {
                let mut owed = Duration::ZERO;
                for _ in 0..*count {
                    for instruction in body {
                        owed += instruction.execute(process, core);
                    }
                }
                owed
            }
        }
    }
}
