use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use mossbrain_client::{connect, BrainClient, ClientError, Interrupter};
use mossbrain_transport::DuplexStream;
use tracing::{debug, warn};

use crate::cmd::RelayArgs;
use crate::exit::{client_error, CliError, CliResult, FAILURE, INTERNAL, SUCCESS, USAGE};
use crate::output::format_values;
use crate::settings::Settings;

/// How often the relay checks for Ctrl-C while stdin is idle.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub fn run(_args: RelayArgs, settings: &Settings) -> CliResult<i32> {
    let config = settings.client_config()?;
    let mut client = connect(&config).map_err(|err| client_error("connect failed", err))?;

    let flags = Arc::new(RelayFlags::new());
    let interrupter = client
        .interrupter()
        .map_err(|err| client_error("signal handler setup failed", err))?;
    install_ctrlc_handler(flags.clone(), interrupter)?;

    let lines = spawn_stdin_reader();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    pump(&mut client, &lines, &mut out, &flags)?;

    client.close();
    Ok(SUCCESS)
}

/// Shared between the relay loop and the Ctrl-C handler.
#[derive(Debug)]
struct RelayFlags {
    running: AtomicBool,
    in_call: AtomicBool,
}

impl RelayFlags {
    fn new() -> Self {
        Self {
            running: AtomicBool::new(true),
            in_call: AtomicBool::new(false),
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Anything that can answer a command line.
trait CommandSink {
    fn send_line(&mut self, command: &str, args: &[i64]) -> Result<Vec<u8>, ClientError>;
}

impl<S: DuplexStream> CommandSink for BrainClient<S> {
    fn send_line(&mut self, command: &str, args: &[i64]) -> Result<Vec<u8>, ClientError> {
        self.call(command, args)
    }
}

fn spawn_stdin_reader() -> Receiver<io::Result<String>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let failed = line.is_err();
            if tx.send(line).is_err() || failed {
                break;
            }
        }
    });
    rx
}

fn install_ctrlc_handler<S>(flags: Arc<RelayFlags>, interrupter: Interrupter<S>) -> CliResult<()>
where
    S: DuplexStream + 'static,
{
    ctrlc::set_handler(move || on_interrupt(&flags, &interrupter))
        .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

/// Stop the loop. A call blocked on the device is aborted by shutting the
/// stream down; an idle relay is left to exit and reset normally.
fn on_interrupt<S: DuplexStream>(flags: &RelayFlags, interrupter: &Interrupter<S>) {
    flags.running.store(false, Ordering::SeqCst);
    if flags.in_call.load(Ordering::SeqCst) {
        if let Err(err) = interrupter.interrupt() {
            warn!(error = %err, "interrupt failed");
        }
    }
}

/// Feed lines to the sink until input ends or the relay is interrupted.
fn pump<S: CommandSink, W: Write>(
    sink: &mut S,
    lines: &Receiver<io::Result<String>>,
    out: &mut W,
    flags: &RelayFlags,
) -> CliResult<()> {
    while flags.is_running() {
        match lines.recv_timeout(POLL_INTERVAL) {
            Ok(Ok(line)) => match handle_in_call(flags, || handle_line(sink, &line, out)) {
                Ok(()) => {}
                Err(err) if err.is_usage() => eprintln!("error: {err}"),
                Err(err) => return Err(err),
            },
            Ok(Err(err)) => {
                return Err(CliError::new(
                    FAILURE,
                    format!("stdin read failed: {err}"),
                ));
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    if !flags.is_running() {
        debug!("interrupted");
    }
    Ok(())
}

fn handle_in_call<T>(flags: &RelayFlags, f: impl FnOnce() -> T) -> T {
    flags.in_call.store(true, Ordering::SeqCst);
    let result = f();
    flags.in_call.store(false, Ordering::SeqCst);
    result
}

fn handle_line<S: CommandSink, W: Write>(sink: &mut S, line: &str, out: &mut W) -> CliResult<()> {
    let Some((command, args)) = parse_line(line)? else {
        return Ok(());
    };
    let reply = sink
        .send_line(command, &args)
        .map_err(|err| client_error(command, err))?;
    writeln!(out, "{}", format_values(&reply))
        .and_then(|()| out.flush())
        .map_err(|err| CliError::new(FAILURE, format!("stdout write failed: {err}")))
}

/// Split `<command> <arg>...`; `None` for a blank line.
fn parse_line(line: &str) -> CliResult<Option<(&str, Vec<i64>)>> {
    let mut tokens = line.split_whitespace();
    let Some(command) = tokens.next() else {
        return Ok(None);
    };
    let args = tokens
        .map(|token| {
            token.parse::<i64>().map_err(|_| {
                CliError::new(USAGE, format!("{command}: invalid argument {token:?}"))
            })
        })
        .collect::<CliResult<Vec<_>>>()?;
    Ok(Some((command, args)))
}

#[cfg(test)]
mod tests {
    use mossbrain_frame::{opcode_of, FrameError};

    use super::*;
    use crate::exit::TRANSPORT_ERROR;

    /// Validates like the real client, answers from a script.
    struct MockSink {
        calls: Vec<(String, Vec<i64>)>,
        replies: Vec<Result<Vec<u8>, ClientError>>,
    }

    impl MockSink {
        fn new(replies: Vec<Result<Vec<u8>, ClientError>>) -> Self {
            Self {
                calls: Vec::new(),
                replies,
            }
        }
    }

    impl CommandSink for MockSink {
        fn send_line(&mut self, command: &str, args: &[i64]) -> Result<Vec<u8>, ClientError> {
            opcode_of(command)?;
            self.calls.push((command.to_string(), args.to_vec()));
            if self.replies.is_empty() {
                return Ok(Vec::new());
            }
            self.replies.remove(0)
        }
    }

    fn feed(lines: &[&str]) -> Receiver<io::Result<String>> {
        let (tx, rx) = mpsc::channel();
        for line in lines {
            tx.send(Ok(line.to_string())).expect("receiver should be alive");
        }
        rx
    }

    #[test]
    fn parse_line_splits_command_and_args() {
        let (command, args) = parse_line("  setLEDState 0 255 0\n")
            .expect("line should parse")
            .expect("line is not blank");
        assert_eq!(command, "setLEDState");
        assert_eq!(args, vec![0, 255, 0]);

        assert!(parse_line("   ").expect("blank line").is_none());
        assert!(parse_line("getMode x")
            .expect_err("bad integer")
            .is_usage());
    }

    #[test]
    fn replies_are_written_one_per_line() {
        let mut sink = MockSink::new(vec![Ok(vec![6, 42]), Ok(Vec::new())]);
        let lines = feed(&["getFaceValue 6", "", "setFaceValue 0 200"]);
        let mut out = Vec::new();

        pump(&mut sink, &lines, &mut out, &RelayFlags::new()).expect("relay should finish");

        assert_eq!(String::from_utf8_lossy(&out), "6 42\n\n");
        assert_eq!(sink.calls.len(), 2);
        assert_eq!(sink.calls[1], ("setFaceValue".to_string(), vec![0, 200]));
    }

    #[test]
    fn usage_errors_do_not_end_the_session() {
        let mut sink = MockSink::new(vec![
            Err(FrameError::ArgumentOutOfRange {
                index: Some(1),
                value: 256,
            }
            .into()),
            Ok(vec![1]),
        ]);
        let lines = feed(&["fly 1", "getMode z", "setLEDState 0 256 0", "getMode"]);
        let mut out = Vec::new();

        pump(&mut sink, &lines, &mut out, &RelayFlags::new()).expect("relay should finish");

        assert_eq!(String::from_utf8_lossy(&out), "1\n");
        assert_eq!(sink.calls.len(), 2);
    }

    #[test]
    fn transport_errors_end_the_session() {
        let mut sink = MockSink::new(vec![Err(FrameError::ConnectionClosed.into())]);
        let lines = feed(&["getMode", "getMode"]);
        let mut out = Vec::new();

        let err = pump(&mut sink, &lines, &mut out, &RelayFlags::new())
            .expect_err("closed stream should be fatal");

        assert_eq!(err.code, TRANSPORT_ERROR);
        assert_eq!(sink.calls.len(), 1);
        assert!(out.is_empty());
    }

    #[test]
    fn stops_when_interrupted() {
        let mut sink = MockSink::new(Vec::new());
        let lines = feed(&["getMode"]);
        let mut out = Vec::new();

        let flags = RelayFlags::new();
        flags.running.store(false, Ordering::SeqCst);
        pump(&mut sink, &lines, &mut out, &flags).expect("relay should stop");

        assert!(sink.calls.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn interrupt_aborts_blocked_call() {
        use std::io::Read;
        use std::os::unix::net::UnixStream;

        let (local, mut device) = UnixStream::pair().expect("socket pair should open");
        device
            .write_all(&[b'<', 0x0E, 0, 0, b'>', b'<', 0x05, 0, 0, b'>'])
            .expect("reset replies should queue");
        let mut client = BrainClient::from_stream(local).expect("init should succeed");
        let interrupter = client.interrupter().expect("interrupter should build");
        let flags = Arc::new(RelayFlags::new());

        let relay_flags = flags.clone();
        let relay = thread::spawn(move || {
            let lines = feed(&["getMode"]);
            let mut out = Vec::new();
            pump(&mut client, &lines, &mut out, &relay_flags)
        });

        // Three reset frames plus the getMode request.
        let mut sent = [0u8; 8 + 13 + 14 + 5];
        device.read_exact(&mut sent).expect("request should arrive");
        assert_eq!(sent[sent.len() - 5..], [b'<', 0x02, 0, 0, b'>']);
        while !flags.in_call.load(Ordering::SeqCst) {
            thread::sleep(Duration::from_millis(5));
        }

        on_interrupt(&flags, &interrupter);

        let err = relay
            .join()
            .expect("relay thread should not panic")
            .expect_err("blocked call should fail");
        assert_eq!(err.code, TRANSPORT_ERROR);
        assert!(!flags.is_running());
    }

    #[cfg(unix)]
    #[test]
    fn idle_interrupt_leaves_stream_open() {
        use std::io::Read;
        use std::os::unix::net::UnixStream;

        let (local, mut device) = UnixStream::pair().expect("socket pair should open");
        let conn = mossbrain_client::Connection::new(local.try_clone().expect("socket should clone"))
            .expect("connection should build");
        let interrupter = conn.interrupter().expect("interrupter should build");
        let flags = RelayFlags::new();

        on_interrupt(&flags, &interrupter);

        assert!(!flags.is_running());
        (&local).write_all(b"ok").expect("stream should stay writable");
        let mut got = [0u8; 2];
        device.read_exact(&mut got).expect("bytes should arrive");
        assert_eq!(&got, b"ok");
        drop(conn);
    }
}
