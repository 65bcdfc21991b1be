//! Controller pipeline state machine.
//!
//! ```text
//! Created -> BeforeHook -> Gated -> ActionDispatch -> AfterHook -> Done
//!     \___________\__________\___________\____________\
//!                                                      +-> NotFound -> Done
//!                                                      +-> Error    -> Done
//! ```

use tracing::{debug, warn};

use super::Controller;
use crate::error::DispatchError;
use crate::result::ActionResult;
use crate::Result;

/// A stage of the controller pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineStage {
    /// Controller returned by its factory.
    #[default]
    Created,
    /// Before hook running.
    BeforeHook,
    /// Continuation flag being checked.
    Gated,
    /// Action handler running.
    ActionDispatch,
    /// After hook running.
    AfterHook,
    /// Not-found side exit.
    NotFound,
    /// Error side exit.
    Error,
    /// Result produced.
    Done,
}

impl PipelineStage {
    /// Check if transition to target stage is valid.
    ///
    /// The main line advances one stage at a time. Either side exit is
    /// reachable from any main-line stage, and both side exits end in `Done`.
    pub fn can_transition_to(&self, target: PipelineStage) -> bool {
        use PipelineStage::*;
        match (*self, target) {
            (Created, BeforeHook)
            | (BeforeHook, Gated)
            | (Gated, ActionDispatch)
            | (ActionDispatch, AfterHook)
            | (AfterHook, Done)
            | (NotFound, Done)
            | (Error, Done) => true,
            (from, NotFound | Error) => from.is_main_line(),
            _ => false,
        }
    }

    /// Attempt to transition to a new stage.
    pub fn transition_to(&mut self, target: PipelineStage) -> Result<()> {
        if self.can_transition_to(target) {
            *self = target;
            Ok(())
        } else {
            Err(DispatchError::InvalidStageTransition {
                from: *self,
                to: target,
            })
        }
    }

    /// Check if this is the terminal stage.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineStage::Done)
    }

    fn is_main_line(&self) -> bool {
        !matches!(
            self,
            PipelineStage::NotFound | PipelineStage::Error | PipelineStage::Done
        )
    }
}

/// Which path produced the pipeline's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineExit {
    /// The action ran and the after hook succeeded.
    Completed,
    /// No action, no result, or the before hook vetoed.
    NotFound,
    /// An action or hook faulted.
    Error,
}

/// The single result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub result: ActionResult,
    pub exit: PipelineExit,
    /// Stages visited, starting at `Created`.
    pub trail: Vec<PipelineStage>,
}

enum Detour {
    NotFound(String),
    Fault(DispatchError),
}

impl From<DispatchError> for Detour {
    fn from(err: DispatchError) -> Self {
        Detour::Fault(err)
    }
}

struct Run {
    stage: PipelineStage,
    trail: Vec<PipelineStage>,
}

impl Run {
    fn new() -> Self {
        Self {
            stage: PipelineStage::Created,
            trail: vec![PipelineStage::Created],
        }
    }

    fn advance(&mut self, next: PipelineStage) -> Result<()> {
        self.stage.transition_to(next)?;
        self.trail.push(next);
        Ok(())
    }

    /// Enter a side exit and finish. Side exits are valid from every
    /// main-line stage, so a failure here means the run already finished.
    fn exit_through(&mut self, side: PipelineStage) {
        for stage in [side, PipelineStage::Done] {
            if let Err(e) = self.advance(stage) {
                warn!("Pipeline bookkeeping error: {}", e);
            }
        }
    }
}

impl Controller {
    /// Run the pipeline for `action` with the given parameters.
    ///
    /// Always yields exactly one result: the action's, the not-found
    /// path's, or the error path's.
    pub fn execute(&mut self, action: &str, params: &[String]) -> PipelineOutcome {
        let mut run = Run::new();

        match self.drive(&mut run, action, params) {
            Ok(result) => PipelineOutcome {
                result,
                exit: PipelineExit::Completed,
                trail: run.trail,
            },
            Err(Detour::NotFound(reason)) => {
                debug!(action, reason = %reason, "Pipeline took not-found path");
                run.exit_through(PipelineStage::NotFound);
                PipelineOutcome {
                    result: self.not_found_result(),
                    exit: PipelineExit::NotFound,
                    trail: run.trail,
                }
            }
            Err(Detour::Fault(err)) => {
                warn!(action, "Pipeline took error path: {}", err);
                run.exit_through(PipelineStage::Error);
                PipelineOutcome {
                    result: self.error_result(&err),
                    exit: PipelineExit::Error,
                    trail: run.trail,
                }
            }
        }
    }

    fn drive(
        &mut self,
        run: &mut Run,
        action: &str,
        params: &[String],
    ) -> std::result::Result<ActionResult, Detour> {
        run.advance(PipelineStage::BeforeHook)?;
        self.continue_pipeline = false;
        match self.before_hook() {
            Some(hook) => hook(self)?,
            None => self.continue_pipeline = true,
        }

        run.advance(PipelineStage::Gated)?;
        if !self.continue_pipeline {
            return Err(Detour::NotFound("before hook did not continue".into()));
        }

        run.advance(PipelineStage::ActionDispatch)?;
        let method = self.request().method().clone();
        let handler = self.action(&method, action).ok_or_else(|| {
            Detour::NotFound(
                DispatchError::ActionNotFound {
                    method: method.to_string(),
                    action: action.to_string(),
                }
                .to_string(),
            )
        })?;
        let result = handler(self, params)?
            .ok_or_else(|| Detour::NotFound(format!("action '{}' returned no result", action)))?;

        run.advance(PipelineStage::AfterHook)?;
        if let Some(hook) = self.after_hook() {
            hook(self)?;
        }

        run.advance(PipelineStage::Done)?;
        Ok(result)
    }
}
