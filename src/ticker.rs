pub mod buffer;
pub mod compositor;
pub mod filter;
pub mod poller;
pub mod telemetry;
