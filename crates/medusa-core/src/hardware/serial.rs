use std::io::Write;
use std::path::Path;

use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::debug;

use crate::consts::{ALL_CHANNELS, SERIAL_WRITE_TIMEOUT};
use crate::error::{MedusaError, Result};

use super::{LightController, LightMode};

/// Encode one controller frame: `<channel><H|I|L>\r\n`.
pub fn encode_switch(channel: u8, on: bool, mode: LightMode) -> String {
    let op = match (on, mode) {
        (true, LightMode::Session) => 'H',
        (true, LightMode::Always) => 'I',
        (false, _) => 'L',
    };
    format!("{channel}{op}\r\n")
}

/// LED controller speaking the MEDUSA ASCII protocol over a byte stream.
pub struct SerialLightController<W: Write> {
    port: W,
    mode: LightMode,
}

impl SerialLightController<Box<dyn SerialPort>> {
    /// Open the controller's serial port in raw mode at `baud_rate`, 8N1,
    /// without flow control.
    pub fn open(path: &Path, baud_rate: u32, mode: LightMode) -> Result<Self> {
        let port = serialport::new(path.to_string_lossy(), baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(SERIAL_WRITE_TIMEOUT)
            .open()
            .map_err(|e| {
                MedusaError::HardwareUnavailable(format!("{}: {e}", path.display()))
            })?;
        debug!(port = %path.display(), baud_rate, "Opened LED controller port");
        Ok(Self::new(port, mode))
    }
}

impl<W: Write> SerialLightController<W> {
    pub fn new(port: W, mode: LightMode) -> Self {
        Self { port, mode }
    }

    pub fn mode(&self) -> LightMode {
        self.mode
    }

    pub fn into_inner(self) -> W {
        self.port
    }

    fn send(&mut self, frame: &str) -> Result<()> {
        debug!(frame = frame.trim_end(), "LED command");
        self.port
            .write_all(frame.as_bytes())
            .and_then(|_| self.port.flush())
            .map_err(|e| {
                MedusaError::HardwareUnavailable(format!("LED controller write failed: {e}"))
            })
    }
}

impl<W: Write> LightController for SerialLightController<W> {
    fn set_band(&mut self, channel: u8, on: bool) -> Result<()> {
        let frame = encode_switch(channel, on, self.mode);
        self.send(&frame)
    }

    fn all_off(&mut self) -> Result<()> {
        let frame = encode_switch(ALL_CHANNELS, false, self.mode);
        self.send(&frame)
    }
}
