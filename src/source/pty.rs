//! Spawning the external process that feeds the ticker.
//!
//! The process is attached to a pseudo-terminal so line-buffered tools behave as if
//! they were writing to a console. Only the output side is used.

use std::io::{self, Read};

use portable_pty::{ChildKiller as _, CommandBuilder, MasterPty, PtySize};

/// Program and arguments for the text source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceCommand {
    /// Executable to run.
    pub program: String,
    /// Arguments passed verbatim.
    pub args: Vec<String>,
}

impl SourceCommand {
    /// Run `line` through `/bin/sh -c`.
    pub fn shell(line: impl Into<String>) -> Self {
        Self {
            program: "/bin/sh".to_string(),
            args: vec!["-c".to_string(), line.into()],
        }
    }

    /// Run `argv[0]` with the remaining items as arguments. `None` for an empty argv.
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl std::fmt::Display for SourceCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.program)?;
        for a in &self.args {
            write!(f, " {a}")?;
        }
        Ok(())
    }
}

/// Handle to a running source process.
pub trait SourceProcess: Send {
    /// OS process id, when known.
    fn pid(&self) -> Option<u32>;

    /// Kill the process. Must be idempotent.
    fn terminate(&mut self);
}

/// A freshly spawned source: its output stream plus its process handle.
pub struct SpawnedSource {
    /// Blocking reader over the process output.
    pub reader: Box<dyn Read + Send>,
    /// Process handle used for teardown.
    pub process: Box<dyn SourceProcess>,
}

impl std::fmt::Debug for SpawnedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpawnedSource")
            .field("pid", &self.process.pid())
            .finish()
    }
}

/// Starts source processes.
pub trait PtySpawner: Send {
    /// Spawn `command` and return a readable handle to its output.
    fn spawn(&self, command: &SourceCommand) -> io::Result<SpawnedSource>;
}

/// [`PtySpawner`] backed by the platform's native PTY implementation.
#[derive(Clone, Copy, Debug)]
pub struct NativePtySpawner {
    /// PTY width in columns.
    pub cols: u16,
    /// PTY height in rows.
    pub rows: u16,
}

impl Default for NativePtySpawner {
    fn default() -> Self {
        // Wide enough that line-oriented tools don't wrap their own output.
        Self { cols: 1024, rows: 24 }
    }
}

impl PtySpawner for NativePtySpawner {
    fn spawn(&self, command: &SourceCommand) -> io::Result<SpawnedSource> {
        let mut cmd = CommandBuilder::new(&command.program);
        for arg in &command.args {
            cmd.arg(arg);
        }
        cmd.env("TERM", "dumb");
        if let Ok(cwd) = std::env::current_dir() {
            cmd.cwd(cwd);
        }

        let pair = portable_pty::native_pty_system()
            .openpty(PtySize {
                rows: self.rows,
                cols: self.cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| io::Error::other(e.to_string()))?;

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| io::Error::other(e.to_string()))?;
        // Only the child keeps the slave side open, so its exit shows up as EOF.
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| io::Error::other(e.to_string()))?;

        Ok(SpawnedSource {
            reader,
            process: Box::new(NativePtyProcess {
                child,
                _master: pair.master,
                killed: false,
            }),
        })
    }
}

struct NativePtyProcess {
    child: Box<dyn portable_pty::Child + Send + Sync>,
    _master: Box<dyn MasterPty + Send>,
    killed: bool,
}

impl SourceProcess for NativePtyProcess {
    fn pid(&self) -> Option<u32> {
        self.child.process_id()
    }

    fn terminate(&mut self) {
        if self.killed {
            return;
        }
        self.killed = true;
        if let Ok(Some(_)) = self.child.try_wait() {
            return;
        }
        if let Err(e) = self.child.kill() {
            tracing::debug!(pid = ?self.child.process_id(), error = %e, "kill of source process failed");
        }
        // Reap so the child does not linger as a zombie.
        let _ = self.child.try_wait();
    }
}

impl Drop for NativePtyProcess {
    fn drop(&mut self) {
        self.terminate();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/pty.rs"]
mod tests;
