pub(crate) mod bootstrap;
pub(crate) mod cli;
pub(crate) mod commands;
pub(crate) mod loop_runner;
pub(crate) mod prompt;
pub(crate) mod render;
pub(crate) mod sensor;
pub(crate) mod session;
