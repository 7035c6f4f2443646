//! Program Synthesizer
//!
//! Builds one program by repeatedly sampling among the operations that are
//! applicable at the current simulated stack depths. Nothing is executed
//! here except generators, whose drawn values are recorded in the step so
//! the executor can replay them.
//!
//! All randomness comes from the RNG passed in. The same seed over the same
//! catalog always yields the same program.

use rand::Rng;
use std::collections::HashMap;

use crate::catalog::{OperationCatalog, OperationId};
use crate::config::SearchConfig;
use crate::error::OperationError;
use crate::operation::Operation;
use crate::program::{Program, Step};
use crate::tag::TypeTag;

/// Result of synthesizing one program.
#[derive(Debug, Clone)]
pub enum Synthesis {
    Program(Program),
    /// Nothing was applicable from the start
    Skipped(String),
    /// A generator failed while drawing; `program` holds the steps before it
    Crashed {
        program: Program,
        error: OperationError,
    },
}

pub struct ProgramSynthesizer<'a> {
    catalog: &'a OperationCatalog,
    max_steps: usize,
    generator_bias: f64,
}

impl<'a> ProgramSynthesizer<'a> {
    pub fn new(catalog: &'a OperationCatalog, config: &SearchConfig) -> Self {
        Self {
            catalog,
            max_steps: config.max_steps,
            generator_bias: config.generator_bias.clamp(0.0, 1.0),
        }
    }

    /// Lazily produce steps. The stream ends at `max_steps`, when nothing is
    /// applicable, or right after a generator error.
    pub fn steps<'r, R: Rng>(&'r self, rng: &'r mut R) -> StepStream<'r, R> {
        StepStream {
            synthesizer: self,
            rng,
            depths: HashMap::new(),
            emitted: 0,
            done: false,
        }
    }

    pub fn synthesize<R: Rng>(&self, rng: &mut R) -> Synthesis {
        let mut steps = Vec::new();
        for step in self.steps(rng) {
            match step {
                Ok(step) => steps.push(step),
                Err(error) => {
                    return Synthesis::Crashed {
                        program: Program::new(steps),
                        error,
                    }
                }
            }
        }

        if steps.is_empty() {
            return Synthesis::Skipped("no applicable operation".to_string());
        }
        Synthesis::Program(Program::new(steps))
    }

    fn choose<R: Rng>(&self, rng: &mut R, depths: &HashMap<TypeTag, usize>) -> Option<OperationId> {
        let applicable = self
            .catalog
            .applicable(|tag| depths.get(tag).copied().unwrap_or(0));

        let (generators, consumers): (Vec<OperationId>, Vec<OperationId>) = applicable
            .into_iter()
            .partition(|&id| self.catalog.get(id).is_some_and(Operation::is_generator));

        let pool = match (generators.is_empty(), consumers.is_empty()) {
            (true, true) => return None,
            (false, true) => generators,
            (true, false) => consumers,
            (false, false) => {
                if rng.gen_bool(self.generator_bias) {
                    generators
                } else {
                    consumers
                }
            }
        };

        Some(pool[rng.gen_range(0..pool.len())])
    }
}

pub struct StepStream<'r, R> {
    synthesizer: &'r ProgramSynthesizer<'r>,
    rng: &'r mut R,
    depths: HashMap<TypeTag, usize>,
    emitted: usize,
    done: bool,
}

impl<'r, R: Rng> StepStream<'r, R> {
    fn apply_depths(&mut self, operation: &Operation) {
        if matches!(operation, Operation::Check(_)) {
            return;
        }
        for tag in operation.inputs() {
            if let Some(depth) = self.depths.get_mut(tag) {
                *depth = depth.saturating_sub(1);
            }
        }
        for tag in operation.outputs() {
            *self.depths.entry(tag.clone()).or_insert(0) += 1;
        }
    }
}

impl<'r, R: Rng> Iterator for StepStream<'r, R> {
    type Item = Result<Step, OperationError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.emitted >= self.synthesizer.max_steps {
            return None;
        }

        let Some(id) = self.synthesizer.choose(&mut *self.rng, &self.depths) else {
            self.done = true;
            return None;
        };
        let catalog = self.synthesizer.catalog;
        let operation = catalog.get(id)?;

        let step = match operation {
            Operation::Generator(generator) => match generator.draw(&mut *self.rng) {
                Ok(value) => Step::generated(id, generator.name().to_string(), value),
                Err(error) => {
                    self.done = true;
                    return Some(Err(error));
                }
            },
            _ => Step::invoke(id, operation.name()),
        };

        self.apply_depths(operation);
        self.emitted += 1;
        Some(Ok(step))
    }
}
