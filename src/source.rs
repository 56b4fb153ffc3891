//! The external text producer and the channel that turns its output into lines.

pub mod channel;
pub mod pty;
