pub mod action;
pub mod animation;
pub mod config;
pub mod cursor;
pub mod desktop_shell;
pub mod errors;
pub mod grabs;
pub mod ids;
pub mod input;
pub mod layer;
pub mod notifications;
pub mod output;
pub mod placement;
pub mod script;
pub mod seat;
pub mod shell_surface;
pub mod state;
pub mod surface;
pub mod view;
pub mod workspace;

#[cfg(test)]
mod tests;

pub use errors::{Result, ShellError};
pub use state::{Shell, ShellEvent};
