//! Controllers and the per-request pipeline that runs them.

mod controller;
mod pipeline;

pub use controller::{
    ActionHandler, ActionMethod, Controller, ErrorHook, LifecycleHook, NotFoundHook,
};
pub use pipeline::{PipelineExit, PipelineOutcome, PipelineStage};
