//! Purpose: Own one engine process and the pipe that feeds it commands.
//! Exports: `SessionOptions`, `Session`, `SessionExit`, `PROGRAM_ENV`.
//! Role: The only writer to the engine; everything else builds text.
//! Invariants: Commands are written line-at-a-time and flushed before
//! returning; the serializer's data-block lines pass through verbatim.
//! Invariants: Engine stdout/stderr are drained by reader threads into
//! bounded buffers so a chatty engine can never block the pipe.

use std::collections::VecDeque;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tracing::{debug, info};

use crate::core::command::define_block;
use crate::core::datablock::DataInput;
use crate::core::error::{Error, ErrorKind};

/// Environment override for the engine binary, checked after the CLI flag.
pub const PROGRAM_ENV: &str = "PLOTPIPE_PROGRAM";

const CAPTURE_LIMIT: usize = 10_000;

#[derive(Clone, Debug)]
pub struct SessionOptions {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl SessionOptions {
    pub fn new() -> Self {
        Self {
            program: default_program(),
            args: Vec::new(),
        }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::new()
    }
}

fn default_program() -> PathBuf {
    std::env::var_os(PROGRAM_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("gnuplot"))
}

/// Final state of a closed session: exit status plus the drained capture.
#[derive(Debug)]
pub struct SessionExit {
    pub status: ExitStatus,
    pub output: Vec<String>,
    pub errors: Vec<String>,
}

type Capture = Arc<Mutex<VecDeque<String>>>;

#[derive(Debug)]
pub struct Session {
    name: String,
    child: Child,
    stdin: Option<BufWriter<ChildStdin>>,
    output: Capture,
    errors: Capture,
    readers: Vec<JoinHandle<()>>,
}

impl Session {
    pub fn spawn(name: impl Into<String>, options: &SessionOptions) -> Result<Self, Error> {
        let name = name.into();
        let mut child = Command::new(&options.program)
            .args(&options.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|err| {
                Error::new(ErrorKind::Spawn)
                    .with_message(format!(
                        "failed to launch {}",
                        options.program.display()
                    ))
                    .with_session(&name)
                    .with_hint(
                        "Install the plotting engine, or point --program or PLOTPIPE_PROGRAM at it.",
                    )
                    .with_source(err)
            })?;

        let stdin = child.stdin.take().map(BufWriter::new);
        let output = Arc::new(Mutex::new(VecDeque::new()));
        let errors = Arc::new(Mutex::new(VecDeque::new()));
        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(capture(stdout, Arc::clone(&output)));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(capture(stderr, Arc::clone(&errors)));
        }

        info!(session = %name, program = %options.program.display(), "session started");
        Ok(Self {
            name,
            child,
            stdin,
            output,
            errors,
            readers,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Write one command line to the engine and flush.
    pub fn send(&mut self, command: &str) -> Result<(), Error> {
        debug!(session = %self.name, %command, "send");
        let name = self.name.clone();
        let stdin = self.writer()?;
        writeln!(stdin, "{command}").map_err(|err| write_error(&name, err))?;
        stdin.flush().map_err(|err| write_error(&name, err))
    }

    /// Write many lines, flushing once at the end.
    pub fn send_lines<I, S>(&mut self, lines: I) -> Result<(), Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = self.name.clone();
        let stdin = self.writer()?;
        for line in lines {
            let line = line.as_ref();
            debug!(session = %name, command = %line, "send");
            writeln!(stdin, "{line}").map_err(|err| write_error(&name, err))?;
        }
        stdin.flush().map_err(|err| write_error(&name, err))
    }

    /// Serialize the input and send it as a named here-document block.
    pub fn datablock(&mut self, name: &str, input: &DataInput) -> Result<(), Error> {
        let lines = input.render().map_err(|err| err.with_session(&self.name))?;
        let framed = define_block(name, &lines)?;
        self.send_lines(framed)
    }

    /// Drain captured engine stdout lines.
    pub fn take_output(&mut self) -> Vec<String> {
        drain(&self.output)
    }

    /// Drain captured engine stderr lines.
    pub fn take_errors(&mut self) -> Vec<String> {
        drain(&self.errors)
    }

    /// Ask the engine to quit, close the pipe, and reap the process.
    pub fn close(mut self) -> Result<SessionExit, Error> {
        let _ = self.send("quit");
        self.stdin = None;
        let status = self.child.wait().map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to reap engine process")
                .with_session(&self.name)
                .with_source(err)
        })?;
        for reader in self.readers.drain(..) {
            let _ = reader.join();
        }
        info!(session = %self.name, code = ?status.code(), "session closed");
        Ok(SessionExit {
            status,
            output: drain(&self.output),
            errors: drain(&self.errors),
        })
    }

    fn writer(&mut self) -> Result<&mut BufWriter<ChildStdin>, Error> {
        let name = &self.name;
        self.stdin.as_mut().ok_or_else(|| {
            Error::new(ErrorKind::Closed)
                .with_message("session pipe is already closed")
                .with_session(name)
        })
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stdin = None;
        let _ = self.child.wait();
        for reader in self.readers.drain(..) {
            let _ = reader.join();
        }
    }
}

fn write_error(session: &str, err: io::Error) -> Error {
    let kind = if err.kind() == io::ErrorKind::BrokenPipe {
        ErrorKind::Closed
    } else {
        ErrorKind::Io
    };
    Error::new(kind)
        .with_message("failed to write to engine")
        .with_session(session)
        .with_source(err)
}

fn capture(reader: impl Read + Send + 'static, sink: Capture) -> JoinHandle<()> {
    thread::spawn(move || {
        let reader = BufReader::new(reader);
        for line in reader.lines() {
            let Ok(line) = line else { break };
            if let Ok(mut sink) = sink.lock() {
                if sink.len() == CAPTURE_LIMIT {
                    sink.pop_front();
                }
                sink.push_back(line);
            }
        }
    })
}

fn drain(capture: &Capture) -> Vec<String> {
    capture
        .lock()
        .map(|mut lines| lines.drain(..).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::{Session, SessionOptions};
    use crate::core::error::ErrorKind;

    #[test]
    fn spawn_failure_is_a_spawn_error() {
        let options = SessionOptions::new().with_program("plotpipe-no-such-engine");
        let err = Session::spawn("main", &options).expect_err("missing binary");
        assert_eq!(err.kind(), ErrorKind::Spawn);
        assert_eq!(err.session(), Some("main"));
    }

    #[cfg(unix)]
    mod with_cat {
        use super::super::{Session, SessionOptions};
        use crate::core::datablock::{DataInput, column};

        fn cat_session(name: &str) -> Session {
            let options = SessionOptions::new().with_program("cat");
            Session::spawn(name, &options).expect("spawn cat")
        }

        #[test]
        fn sent_commands_reach_the_process_verbatim() {
            let mut session = cat_session("echo");
            session.send("set title \"demo\"").expect("send");
            session.send("plot $data").expect("send");
            let exit = session.close().expect("close");
            assert!(exit.status.success());
            assert_eq!(
                exit.output,
                vec!["set title \"demo\"", "plot $data", "quit"]
            );
            assert!(exit.errors.is_empty());
        }

        #[test]
        fn datablock_lines_are_framed_and_written_verbatim() {
            let mut session = cat_session("blocks");
            let input = DataInput::Columns(vec![column(1..=3), column(4..=6)]);
            session.datablock("data", &input).expect("datablock");
            let exit = session.close().expect("close");
            assert_eq!(
                exit.output,
                vec!["$data << EOD", " 1 4", " 2 5", " 3 6", "EOD", "quit"]
            );
        }
    }
}
