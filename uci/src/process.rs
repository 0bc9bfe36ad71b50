use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, trace};
use thiserror::Error;

use super::commands::{UciInput, UciOutput};
use super::decoder::Decoder;
use super::encoder::Encoder;

const QUIT_GRACE: Duration = Duration::from_millis(100);

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start engine {path:?}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("engine stdin closed: {0}")]
    Write(#[from] io::Error),

    #[error("engine did not answer in time")]
    Timeout,

    #[error("engine process exited")]
    Exited,
}

/// A running UCI engine.
///
/// Engine stdout is drained by a dedicated thread into a channel so every
/// read can be bounded by a deadline. The process receives `quit` and is
/// killed if needed when this value is dropped.
pub struct EngineProcess {
    child: Child,
    stdin: BufWriter<ChildStdin>,
    lines: Receiver<String>,
    encoder: Encoder,
    decoder: Decoder,
}

impl EngineProcess {
    pub fn spawn(path: &Path, args: &[String]) -> Result<Self, EngineError> {
        let spawn_error = |source| EngineError::Spawn {
            path: path.to_path_buf(),
            source,
        };

        let mut child = Command::new(path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(spawn_error)?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(spawn_error(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "engine pipes unavailable",
                )));
            }
        };

        let (line_tx, lines) = channel();
        thread::spawn(move || {
            let reader = BufReader::new(stdout);
            for line in reader.lines() {
                let Ok(line) = line else { break };
                if line_tx.send(line).is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            child,
            stdin: BufWriter::new(stdin),
            lines,
            encoder: Encoder {},
            decoder: Decoder::new(),
        })
    }

    pub fn send(&mut self, command: &UciInput) -> Result<(), EngineError> {
        let line = self.encoder.encode(command);
        debug!("Engine <- {}", line);

        self.stdin.write_all(line.as_bytes())?;
        self.stdin.write_all(b"\n")?;
        self.stdin.flush()?;
        Ok(())
    }

    /// Next decoded line, or `Timeout` once `deadline` has passed.
    pub fn recv(&mut self, deadline: Instant) -> Result<UciOutput, EngineError> {
        match self.lines.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
            Ok(line) => {
                trace!("Engine -> {}", line);
                Ok(self.decoder.decode(&line))
            }
            Err(RecvTimeoutError::Timeout) => Err(EngineError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(EngineError::Exited),
        }
    }

    /// Read until `accept` matches a line, discarding everything before it.
    pub fn wait_for<F>(&mut self, deadline: Instant, accept: F) -> Result<UciOutput, EngineError>
    where
        F: Fn(&UciOutput) -> bool,
    {
        loop {
            let output = self.recv(deadline)?;
            if accept(&output) {
                return Ok(output);
            }
        }
    }

    /// `uci` / `uciok` handshake. Returns the engine's reported name.
    pub fn handshake(&mut self, timeout: Duration) -> Result<Option<String>, EngineError> {
        let deadline = Instant::now() + timeout;
        self.send(&UciInput::Uci)?;

        let mut name = None;
        loop {
            match self.recv(deadline)? {
                UciOutput::IdName(id) => name = Some(id),
                UciOutput::UciOk => return Ok(name),
                _ => {}
            }
        }
    }

    /// `isready` / `readyok` round trip.
    pub fn sync(&mut self, timeout: Duration) -> Result<(), EngineError> {
        let deadline = Instant::now() + timeout;
        self.send(&UciInput::IsReady)?;
        self.wait_for(deadline, |output| matches!(output, UciOutput::ReadyOk))?;
        Ok(())
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        // Send quit command to gracefully shutdown the engine
        if self.send(&UciInput::Quit).is_err() {
            // If we can't send quit, force kill the process
            let _ = self.child.kill();
            let _ = self.child.wait();
            return;
        }

        // Give the engine a moment to quit gracefully
        thread::sleep(QUIT_GRACE);

        match self.child.try_wait() {
            Ok(Some(_)) => {}
            Ok(None) | Err(_) => {
                let _ = self.child.kill();
                let _ = self.child.wait();
            }
        }
    }
}
