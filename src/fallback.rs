// academy-export/src/fallback.rs

//! Ordered fallback chains: try one strategy, else the next, else a default.
//!
//! Font loading, text drawing and banner drawing all degrade through a fixed
//! list of strategies. Each strategy receives the same mutable context in
//! turn, so the order is visible in one place and testable on its own.

use tracing::{debug, warn};

use crate::error::{ExportError, Result};

type Step<'a, C, T> = Box<dyn FnOnce(&mut C) -> Result<T> + 'a>;

#[derive(Debug)]
pub struct Failure {
    pub strategy: String,
    pub error: ExportError,
}

#[derive(Debug)]
pub struct Resolved<T> {
    pub value: T,
    pub strategy: String,
    pub failures: Vec<Failure>,
}

impl<T> Resolved<T> {
    /// True when a strategy other than the first one produced the value.
    pub fn degraded(&self) -> bool {
        !self.failures.is_empty()
    }
}

pub struct Chain<'a, C, T> {
    what: &'static str,
    steps: Vec<(String, Step<'a, C, T>)>,
}

impl<'a, C, T> Chain<'a, C, T> {
    pub fn new(what: &'static str) -> Self {
        Self {
            what,
            steps: Vec::new(),
        }
    }

    pub fn attempt(
        mut self,
        strategy: impl Into<String>,
        step: impl FnOnce(&mut C) -> Result<T> + 'a,
    ) -> Self {
        self.steps.push((strategy.into(), Box::new(step)));
        self
    }

    /// Runs the strategies in order and stops at the first success. All
    /// failures are returned when none succeeds.
    pub fn run(self, ctx: &mut C) -> std::result::Result<Resolved<T>, Vec<Failure>> {
        let what = self.what;
        let mut failures = Vec::new();

        for (strategy, step) in self.steps {
            match step(ctx) {
                Ok(value) => {
                    if !failures.is_empty() {
                        debug!(
                            what,
                            strategy = %strategy,
                            skipped = failures.len(),
                            "Fallback strategy used"
                        );
                    }
                    return Ok(Resolved {
                        value,
                        strategy,
                        failures,
                    });
                }
                Err(error) => {
                    warn!(
                        what,
                        strategy = %strategy,
                        error = %error,
                        recoverable = error.is_recoverable(),
                        "Strategy failed"
                    );
                    failures.push(Failure { strategy, error });
                }
            }
        }

        Err(failures)
    }

    /// Like [`Chain::run`], but ends in a default that cannot fail.
    pub fn or_default(
        self,
        ctx: &mut C,
        strategy: &str,
        default: impl FnOnce(&mut C) -> T,
    ) -> Resolved<T> {
        match self.run(ctx) {
            Ok(resolved) => resolved,
            Err(failures) => Resolved {
                value: default(ctx),
                strategy: strategy.to_string(),
                failures,
            },
        }
    }
}
