/*!
 * Process Generator
 * Builds processes with randomized programs for synthetic load
 */

use super::pcb::Process;
use crate::config::InstructionBounds;
use crate::instruction::{Instruction, Operand};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const PRINT_VARS: [&str; 5] = ["x", "y", "result", "temp", "value"];
const ARITH_VARS: [&str; 6] = ["a", "b", "c", "temp", "sum", "diff"];
const DECLARE_VARS: [&str; 6] = ["a1", "b1", "c1", "temp1", "varX", "tempVar"];

/// Relative weights: print, add, subtract, declare, sleep, repeat
const WEIGHTS: [u32; 6] = [4, 2, 2, 2, 1, 1];
const TOTAL_WEIGHT: u32 = 12;

/// Generates randomized processes
///
/// Seeded generators are deterministic: the same seed and the same sequence
/// of calls produce the same programs.
pub struct ProcessGenerator {
    rng: Mutex<StdRng>,
    bounds: InstructionBounds,
}

impl ProcessGenerator {
    pub fn new(bounds: InstructionBounds) -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
            bounds,
        }
    }

    pub fn with_seed(bounds: InstructionBounds, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            bounds,
        }
    }

    pub fn bounds(&self) -> InstructionBounds {
        self.bounds
    }

    /// Generate with the default bounds
    pub fn generate(&self, name: &str) -> Process {
        self.generate_with(name, self.bounds)
    }

    /// Generate a process whose program length is uniform over `bounds`
    pub fn generate_with(&self, name: &str, bounds: InstructionBounds) -> Process {
        let mut rng = self.rng.lock();
        let count = rng.gen_range(bounds.min()..=bounds.max());
        let program = (0..count)
            .map(|_| random_instruction(&mut *rng, name))
            .collect();
        Process::with_program(name, program)
    }
}

fn pick<'a, R: Rng>(rng: &mut R, names: &[&'a str]) -> &'a str {
    names[rng.gen_range(0..names.len())]
}

fn random_instruction<R: Rng>(rng: &mut R, name: &str) -> Instruction {
    let mut roll = rng.gen_range(0..TOTAL_WEIGHT);
    let mut choice = 0;
    for (i, weight) in WEIGHTS.iter().enumerate() {
        if roll < *weight {
            choice = i;
            break;
        }
        roll -= weight;
    }

    match choice {
        0 => {
            if rng.gen_bool(0.5) {
                Instruction::print(&format!("Hello world from {}!", name))
            } else {
                Instruction::print_var("Value from: ", pick(rng, &PRINT_VARS))
            }
        }
        1 | 2 => {
            let target = pick(rng, &ARITH_VARS);
            let lhs = random_operand(rng);
            let rhs = random_operand(rng);
            if choice == 1 {
                Instruction::add(target, lhs, rhs)
            } else {
                Instruction::subtract(target, lhs, rhs)
            }
        }
        3 => Instruction::declare(pick(rng, &DECLARE_VARS), rng.gen_range(0..=1000)),
        4 => Instruction::sleep(rng.gen_range(10..=100)),
        _ => random_repeat(rng),
    }
}

fn random_operand<R: Rng>(rng: &mut R) -> Operand {
    if rng.gen_bool(0.5) {
        Operand::var(pick(rng, &ARITH_VARS))
    } else {
        Operand::Literal(rng.gen_range(1..=500))
    }
}

/// One level of nesting; bodies never contain another repeat
fn random_repeat<R: Rng>(rng: &mut R) -> Instruction {
    let count = rng.gen_range(2..=5);
    let len = rng.gen_range(1..=3);
    let body = (0..len)
        .map(|j| match rng.gen_range(0..4) {
            0 => Instruction::print(&format!("\"Loop message {}\"", j)),
            1 => Instruction::add(
                &format!("loop{}", j),
                Operand::var(&format!("a{}", j)),
                Operand::Literal(rng.gen_range(1..=50)),
            ),
            2 => Instruction::declare(&format!("d{}", j), rng.gen_range(0..100)),
            _ => Instruction::sleep(1),
        })
        .collect();
    Instruction::repeat(body, count)
}
