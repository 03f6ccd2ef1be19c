//! Terminal keyboard, raising an interrupt for every key press

use std::collections::VecDeque;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use pulse8_emulator::runtime::{
    InterruptDevice, InterruptLine, InterruptRequest, Priority, StopHandle,
};
use tracing::{debug, warn};

/// How often the input thread checks whether the machine stopped
const POLL_INTERVAL: Duration = Duration::from_millis(50);

type Buffer = Arc<Mutex<VecDeque<char>>>;

/// The keyboard device.
///
/// Keys are captured on a background thread while the terminal is in raw
/// mode. Ctrl-C stops the clock.
pub struct Keyboard {
    buffer: Buffer,
    stop: StopHandle,
    raw_mode: bool,
}

impl Keyboard {
    pub const IRQ: u8 = 1;
    pub const PRIORITY: Priority = 1;

    pub fn new(stop: StopHandle) -> Self {
        Self {
            buffer: Arc::default(),
            stop,
            raw_mode: false,
        }
    }
}

fn key_to_char(key: KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(c) => Some(c),
        KeyCode::Enter => Some('\n'),
        KeyCode::Tab => Some('\t'),
        _ => None,
    }
}

fn is_interrupt(key: KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

fn capture(buffer: &Buffer, stop: &StopHandle, line: &InterruptLine) -> io::Result<()> {
    while stop.is_running() {
        if !event::poll(POLL_INTERVAL)? {
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if is_interrupt(key) {
            debug!("Ctrl-C pressed, stopping the clock");
            stop.stop();
            break;
        }

        if let Some(c) = key_to_char(key) {
            debug!(key = ?c, "Key pressed");
            buffer
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push_back(c);
            line.raise(InterruptRequest::new(
                Keyboard::IRQ,
                "Keyboard",
                Keyboard::PRIORITY,
            ));
        }
    }

    Ok(())
}

impl InterruptDevice for Keyboard {
    fn irq(&self) -> u8 {
        Self::IRQ
    }

    fn name(&self) -> &str {
        "Keyboard"
    }

    fn priority(&self) -> Priority {
        Self::PRIORITY
    }

    fn listen(&mut self, line: InterruptLine) {
        if let Err(error) = terminal::enable_raw_mode() {
            warn!(%error, "Could not capture the keyboard");
            return;
        }
        self.raw_mode = true;

        let buffer = Arc::clone(&self.buffer);
        let stop = self.stop.clone();
        thread::spawn(move || {
            if let Err(error) = capture(&buffer, &stop, &line) {
                warn!(%error, "Keyboard input failed");
            }
        });
    }

    fn execute(&mut self) {
        let key = self
            .buffer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();

        if let Some(key) = key {
            let mut stdout = RawStdout;
            let mut bytes = [0; 4];
            if let Err(error) = stdout
                .write_all(key.encode_utf8(&mut bytes).as_bytes())
                .and_then(|()| stdout.flush())
            {
                warn!(%error, "Could not echo key");
            }
        }
    }
}

impl Drop for Keyboard {
    fn drop(&mut self) {
        if self.raw_mode {
            if let Err(error) = terminal::disable_raw_mode() {
                warn!(%error, "Could not restore the terminal");
            }
        }
    }
}

/// Standard output, moving back to the first column on every line feed while
/// the terminal is in raw mode
#[derive(Debug, Default, Clone, Copy)]
pub struct RawStdout;

impl Write for RawStdout {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut lock = io::stdout().lock();
        if !terminal::is_raw_mode_enabled().unwrap_or(false) {
            return lock.write(buf);
        }

        for chunk in buf.split_inclusive(|&b| b == b'\n') {
            match chunk.strip_suffix(b"\n") {
                Some(line) => {
                    lock.write_all(line)?;
                    lock.write_all(b"\r\n")?;
                }
                None => lock.write_all(chunk)?,
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}
