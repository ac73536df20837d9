//! Deployment execution: process runner, tool discovery, the
//! deploy/teardown/refresh dispatcher, and logging setup.

pub mod dispatch;
mod error;
pub mod fake;
pub mod log_retention;
pub mod logging;
pub mod options;
pub mod process;
pub mod steps;
pub mod tools;

pub use dispatch::{CheckReport, DeployReport, Dispatcher, Operation, Project, StepRecord};
pub use error::{DispatchError, RunnerError};
pub use options::DeployOptions;
pub use process::{Invocation, ProcessOutput, ProcessRunner, SystemRunner};
pub use steps::{Stage, Step};
pub use tools::{PathLocator, ToolLocator};
