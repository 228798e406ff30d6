use std::io::{self, Read, Write};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{debug, info, warn};
use serialport::SerialPort;

use crate::config::LinkConfig;
use crate::diff::SendKind;
use crate::protocol::{legacy, mwf1, WireFormat};

/// In-band acknowledgement token the firmware prints once a frame has been
/// painted. Anything else in the reply stream is noise.
const ACK_TOKEN: &[u8] = b"OK";
const ACK_READ_CHUNK: usize = 64;
const ACK_SCAN_WINDOW: usize = 256;
const ACK_POLL_SLEEP: Duration = Duration::from_millis(1);

/// The Pico resets when the port opens; give it time to boot, then throw the
/// boot chatter away.
const SETTLE_DELAY: Duration = Duration::from_millis(500);
const READ_TIMEOUT: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connected,
    AwaitingAck,
    Resyncing,
}

/// Outcome of one write+acknowledge cycle. Nothing here unwinds past the
/// scheduler; failures become state transitions plus a status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Frame written and acknowledged.
    Acked,
    /// Frame written but no "OK" within the timeout; input was resynced and
    /// the frame is treated as best-effort delivered.
    AckTimeout,
    /// Write failed; the link is down until an explicit reconnect.
    TransportFatal,
    /// Nothing was written (link down, or frame size does not match the
    /// configured resolution).
    Rejected,
}

/// One-call surface for transient error reporting, rendered by the excluded
/// UI layer however it likes.
pub trait StatusSink {
    fn transient_error(&mut self, message: &str);
}

/// Default sink: route through the logger.
pub struct LogStatusSink;

impl StatusSink for LogStatusSink {
    fn transient_error(&mut self, message: &str) {
        warn!("{}", message);
    }
}

/// Byte-stream transport owned exclusively by the link driver. Serial ports
/// implement this; tests substitute a scripted mock.
pub trait Transport {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;
    fn flush(&mut self) -> io::Result<()>;
    /// Read whatever is available, returning 0 when nothing arrived within
    /// the transport's short poll timeout.
    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    /// Drop any unread input.
    fn discard_input(&mut self) -> io::Result<()>;
}

impl Transport for Box<dyn SerialPort> {
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        Write::write_all(self, buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(self)
    }

    fn read_chunk(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match Read::read(self, buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.clear(serialport::ClearBuffer::Input)
            .map_err(io::Error::from)
    }
}

/// Owns the transport and the session state machine:
/// `Disconnected -> Connected -> AwaitingAck -> {Connected | Resyncing}`.
pub struct LinkDriver<T: Transport> {
    transport: Option<T>,
    state: LinkState,
    format: WireFormat,
    frame_bytes: usize,
    ack_timeout: Duration,
    sink: Box<dyn StatusSink>,
}

impl<T: Transport> LinkDriver<T> {
    pub fn new(
        transport: T,
        format: WireFormat,
        frame_bytes: usize,
        ack_timeout: Duration,
        sink: Box<dyn StatusSink>,
    ) -> Self {
        LinkDriver {
            transport: Some(transport),
            state: LinkState::Connected,
            format,
            frame_bytes,
            ack_timeout,
            sink,
        }
    }

    /// A driver with no device attached. Every send is rejected until the
    /// owner reconnects.
    pub fn offline(
        format: WireFormat,
        frame_bytes: usize,
        ack_timeout: Duration,
        sink: Box<dyn StatusSink>,
    ) -> Self {
        LinkDriver {
            transport: None,
            state: LinkState::Disconnected,
            format,
            frame_bytes,
            ack_timeout,
            sink,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    /// Write one bitmap and wait for the device's acknowledgement.
    pub fn send(&mut self, bitmap: &[u8], kind: SendKind) -> SendOutcome {
        if self.state != LinkState::Connected {
            return SendOutcome::Rejected;
        }
        if bitmap.len() != self.frame_bytes {
            self.sink.transient_error("frame size mismatch");
            return SendOutcome::Rejected;
        }

        let packet = match self.format {
            WireFormat::Mwf1 => {
                let flags = match kind {
                    SendKind::ForceFull => mwf1::FLAG_FORCE_FULL,
                    SendKind::Incremental => 0,
                };
                mwf1::build_packet(flags, bitmap)
            }
            WireFormat::Legacy => legacy::build_packet(bitmap),
        };

        let transport = self
            .transport
            .as_mut()
            .expect("connected link always holds a transport");

        // Anything already buffered predates this exchange and must not be
        // mistaken for its acknowledgement.
        let _ = transport.discard_input();

        let mut write_result = transport.write_all(&packet);
        if write_result.is_ok() {
            write_result = transport.flush();
        }
        if let Err(e) = write_result {
            debug!("serial write failed: {}", e);
            self.sink.transient_error("serial write failed");
            self.transport = None;
            self.state = LinkState::Disconnected;
            return SendOutcome::TransportFatal;
        }

        self.state = LinkState::AwaitingAck;
        if wait_for_ack(transport, self.ack_timeout) {
            self.state = LinkState::Connected;
            return SendOutcome::Acked;
        }

        // Resync: a late "OK" for this lost frame must not satisfy the next
        // one. The retry, if the scene still warrants it, is the scheduler's
        // call on a later tick.
        self.state = LinkState::Resyncing;
        self.sink.transient_error("ACK timeout");
        let _ = transport.discard_input();
        self.state = LinkState::Connected;
        SendOutcome::AckTimeout
    }
}

/// Poll the transport for the ack token, tolerating interleaved noise and a
/// token split across reads. Bounded by `timeout`; each idle iteration sleeps
/// briefly so the caller's loop is never frozen for long.
fn wait_for_ack<T: Transport>(transport: &mut T, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    let mut window: Vec<u8> = Vec::new();
    let mut buf = [0u8; ACK_READ_CHUNK];

    loop {
        match transport.read_chunk(&mut buf) {
            Ok(0) => {
                if Instant::now() >= deadline {
                    return false;
                }
                thread::sleep(ACK_POLL_SLEEP);
            }
            Ok(n) => {
                window.extend_from_slice(&buf[..n]);
                if window
                    .windows(ACK_TOKEN.len())
                    .any(|w| w == ACK_TOKEN)
                {
                    return true;
                }
                if window.len() > ACK_SCAN_WINDOW {
                    let cut = window.len() - ACK_SCAN_WINDOW;
                    window.drain(..cut);
                }
                if Instant::now() >= deadline {
                    return false;
                }
            }
            // A read failure here is indistinguishable from silence; the
            // resync path handles it.
            Err(e) => {
                debug!("serial read failed while awaiting ack: {}", e);
                return false;
            }
        }
    }
}

pub type SerialLink = LinkDriver<Box<dyn SerialPort>>;

/// Open the configured serial port 8N1 and wrap it in a connected driver.
pub fn open_serial(
    config: &LinkConfig,
    frame_bytes: usize,
    sink: Box<dyn StatusSink>,
) -> Result<SerialLink> {
    let format = WireFormat::from_name(&config.protocol)
        .with_context(|| format!("unknown wire protocol {:?}", config.protocol))?;

    let mut port = serialport::new(&config.port, config.baud_rate)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .flow_control(serialport::FlowControl::None)
        .timeout(READ_TIMEOUT)
        .open()
        .with_context(|| format!("failed to open serial port {}", config.port))?;

    if let Err(e) = port.write_data_terminal_ready(true) {
        warn!("failed to set DTR on {}: {}", config.port, e);
    }

    thread::sleep(SETTLE_DELAY);
    port.clear(serialport::ClearBuffer::Input).ok();

    info!(
        "opened {} ({} baud, {} protocol, {} byte frames)",
        config.port, config.baud_rate, config.protocol, frame_bytes
    );

    Ok(LinkDriver::new(
        port,
        format,
        frame_bytes,
        config.ack_timeout(),
        sink,
    ))
}
