//! The operator-facing side of the controller: command parsing and the command loop.

#![warn(unreachable_pub, missing_debug_implementations)]

pub mod command;
pub mod session;

pub use command::{Command, ParseError};
pub use session::{Session, SessionOpts, Step};
