use mossbrain_frame::{decode_body, expects_response, name_of, opcode_of, Command};
use mossbrain_transport::DuplexStream;
use tracing::{debug, warn};

use crate::connection::{Connection, Interrupter};
use crate::error::{ClientError, Result};
use crate::types::{Color, Face, FaceState, NFACES};

/// `setManyFaceValues` mask selecting every face.
pub const ALL_FACES_MASK: u8 = 0xFF;

/// Face value written to every face on reset.
pub const RESET_FACE_VALUE: u8 = 127;

/// A live session with one brain block.
///
/// Created by [`BrainClient::init`], which resets the device before handing
/// the session out. Dropping the client (or calling [`BrainClient::close`])
/// resets the device again and closes the stream; both steps are best effort
/// and run exactly once.
pub struct BrainClient<S: DuplexStream> {
    conn: Connection<S>,
    torn_down: bool,
}

impl<S: DuplexStream> BrainClient<S> {
    /// Start a session on an open connection.
    ///
    /// If the initial reset fails the session is torn down before the error
    /// is returned.
    pub fn init(conn: Connection<S>) -> Result<Self> {
        let mut client = Self {
            conn,
            torn_down: false,
        };
        client.reset()?;
        Ok(client)
    }

    /// Start a session on a connected stream.
    pub fn from_stream(stream: S) -> Result<Self> {
        Self::init(Connection::new(stream)?)
    }

    /// Send `command` with `args` and return the reply values.
    ///
    /// Write-only commands return an empty reply without reading. The reply
    /// opcode is logged but not matched against the request.
    pub fn call(&mut self, command: &str, args: &[i64]) -> Result<Vec<u8>> {
        debug!(command, ?args, "call");
        let opcode = opcode_of(command)?;
        self.conn.write_frame(opcode, args)?;

        if !expects_response(command) {
            return Ok(Vec::new());
        }

        let header = self.conn.read_header()?;
        let body = self.conn.read_exactly(usize::from(header.body_len))?;
        let data = decode_body(header.opcode, &body);
        let reply = name_of(header.opcode)?;
        debug!(command = reply, ?data, "reply");
        Ok(data)
    }

    /// [`BrainClient::call`] for a typed command.
    pub fn send(&mut self, command: Command, args: &[i64]) -> Result<Vec<u8>> {
        self.call(command.name(), args)
    }

    /// LED off, every face output, every face value mid-scale.
    ///
    /// Stops at the first failing step.
    pub fn reset(&mut self) -> Result<()> {
        debug!("resetting");
        self.set_led(Color::BLACK)?;
        self.set_all_face_states([FaceState::Output; NFACES])?;
        self.set_many_face_values(ALL_FACES_MASK, &[RESET_FACE_VALUE; NFACES])?;
        Ok(())
    }

    pub fn set_led(&mut self, color: Color) -> Result<()> {
        self.send(Command::SetLedState, &color.args())?;
        Ok(())
    }

    pub fn led(&mut self) -> Result<Color> {
        let data = self.send(Command::GetLedState, &[])?;
        Color::from_values(&data).ok_or_else(|| unexpected(Command::GetLedState, data))
    }

    pub fn set_face_state(&mut self, face: Face, state: FaceState) -> Result<()> {
        self.send(
            Command::SetFaceState,
            &[i64::from(face.index()), i64::from(state.wire())],
        )?;
        Ok(())
    }

    pub fn set_all_face_states(&mut self, states: [FaceState; NFACES]) -> Result<()> {
        let args = states.map(|state| i64::from(state.wire()));
        self.send(Command::SetAllFaceStates, &args)?;
        Ok(())
    }

    pub fn face_states(&mut self) -> Result<Vec<FaceState>> {
        let data = self.send(Command::GetAllFaceStates, &[])?;
        data.iter()
            .map(|&value| FaceState::from_wire(value))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| unexpected(Command::GetAllFaceStates, data))
    }

    /// Current value of one face. The device replies with `(face, value)`.
    pub fn face_value(&mut self, face: Face) -> Result<u8> {
        let data = self.send(Command::GetFaceValue, &[i64::from(face.index())])?;
        match data.as_slice() {
            [_, value] => Ok(*value),
            _ => Err(unexpected(Command::GetFaceValue, data)),
        }
    }

    pub fn face_values(&mut self) -> Result<Vec<u8>> {
        self.send(Command::GetAllFaceValues, &[])
    }

    /// Write-only; the device does not reply.
    pub fn set_face_value(&mut self, face: Face, value: u8) -> Result<()> {
        self.send(
            Command::SetFaceValue,
            &[i64::from(face.index()), i64::from(value)],
        )?;
        Ok(())
    }

    /// Write-only. `mask` selects faces by bit, see [`Face::mask`].
    pub fn set_many_face_values(&mut self, mask: u8, values: &[u8]) -> Result<()> {
        let args: Vec<i64> = std::iter::once(mask)
            .chain(values.iter().copied())
            .map(i64::from)
            .collect();
        self.send(Command::SetManyFaceValues, &args)?;
        Ok(())
    }

    pub fn configuration(&mut self) -> Result<Vec<u8>> {
        self.send(Command::GetConfiguration, &[])
    }

    pub fn mode(&mut self) -> Result<Vec<u8>> {
        self.send(Command::GetMode, &[])
    }

    /// A handle that aborts a blocked call from another thread, see
    /// [`Interrupter`]. Teardown still runs once the call has returned.
    pub fn interrupter(&self) -> Result<Interrupter<S>> {
        self.conn.interrupter()
    }

    /// Reset the device and close the stream now.
    pub fn close(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        if !self.conn.is_closed() {
            if let Err(err) = self.reset() {
                warn!(error = %err, "reset during teardown failed");
            }
        }
        if let Err(err) = self.conn.close() {
            warn!(error = %err, "close during teardown failed");
        }
    }
}

impl<S: DuplexStream> Drop for BrainClient<S> {
    fn drop(&mut self) {
        debug!("stopping");
        self.teardown();
    }
}

fn unexpected(command: Command, data: Vec<u8>) -> ClientError {
    ClientError::UnexpectedResponse {
        command: command.name(),
        data,
    }
}
