use crate::Result;
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

/// Signals the process reacts to, plus a catch-all for anything that ends a
/// signal stream unexpectedly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessSignal {
    Hangup,
    Interrupt,
    Terminate,
    Quit,
    Unknown,
}

impl ProcessSignal {
    /// Exit code this signal shuts the process down with, or `None` to keep
    /// running. Interrupt, terminate and quit are clean exits; anything
    /// unrecognized exits with failure.
    pub fn exit_code(self) -> Option<i32> {
        match self {
            Self::Hangup => None,
            Self::Interrupt | Self::Terminate | Self::Quit => Some(0),
            Self::Unknown => Some(1),
        }
    }
}

/// Blocks until a shutdown-triggering signal arrives and returns the exit
/// code to terminate with. Hangups are logged and ignored.
pub async fn wait_for_shutdown() -> Result<i32> {
    let mut hangup = signal(SignalKind::hangup())?;
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut quit = signal(SignalKind::quit())?;

    loop {
        let received = tokio::select! {
            s = hangup.recv() => s.map(|_| ProcessSignal::Hangup),
            s = interrupt.recv() => s.map(|_| ProcessSignal::Interrupt),
            s = terminate.recv() => s.map(|_| ProcessSignal::Terminate),
            s = quit.recv() => s.map(|_| ProcessSignal::Quit),
        };

        // A closed signal stream means we can no longer honor the contract.
        let received = received.unwrap_or(ProcessSignal::Unknown);

        match received.exit_code() {
            Some(code) => {
                info!(signal = ?received, code, "received shutdown signal");
                return Ok(code);
            }
            None => info!(signal = ?received, "ignoring signal"),
        }
    }
}
