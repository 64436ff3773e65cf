mod args;
mod drain;
mod runner;

pub use args::{LaunchConfig, RUN_FLAG, build_arguments};
pub use drain::OutputDrainer;
pub use runner::{
    ProcessState, Program, QuestRunner, RunnerEvent, TERMINATE_GRACE_PERIOD,
};
