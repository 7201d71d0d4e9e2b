//! Non-blocking logging for the foreground loop.
//!
//! # Architecture
//!
//! ```text
//! control loop           LogRing              idle drain
//! ────────────           ───────              ──────────
//!
//! fg_info!() ─────────▶ [L0][L1][L2] ──────▶ serial console
//! formats on stack       fixed slots          blocking ok
//! never blocks           drops when full
//! ```
//!
//! # Rules
//!
//! - The sample interrupt never logs, not even through this ring
//! - Producers never wait: a full ring drops the message and counts it
//! - The drain is the only place that touches the serial port

use core::cell::UnsafeCell;
use core::fmt::Write;
use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

/// Maximum message length.
pub const MAX_MSG_LEN: usize = 80;

/// Default ring size (number of entries).
pub const LOG_RING_SIZE: usize = 32;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    /// Convert to string for output.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

/// A single log entry.
#[derive(Clone, Copy)]
pub struct LogEntry {
    /// Timestamp in microseconds since boot.
    pub timestamp_us: u64,
    pub level: LogLevel,
    /// Message length.
    pub len: u8,
    /// Message bytes (not null-terminated).
    pub msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    const EMPTY: Self = Self {
        timestamp_us: 0,
        level: LogLevel::Info,
        len: 0,
        msg: [0; MAX_MSG_LEN],
    };

    /// Message text (invalid UTF-8 is replaced by a marker).
    pub fn text(&self) -> &str {
        core::str::from_utf8(&self.msg[..self.len as usize]).unwrap_or("<invalid utf8>")
    }
}

/// Single-producer, single-consumer log ring.
///
/// Producer: the foreground control loop. Consumer: the drain, called
/// from the same loop when idle (or from a lower-priority task).
pub struct LogRing<const N: usize = LOG_RING_SIZE> {
    entries: UnsafeCell<[LogEntry; N]>,
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
    /// Most verbose level kept; anything above is discarded on push.
    max_level: AtomicU8,
}

// SAFETY: one producer and one consumer; a slot is written only while it is
// outside [read, write) and read only while inside it, and the index stores
// are Release/Acquire paired.
unsafe impl<const N: usize> Sync for LogRing<N> {}
unsafe impl<const N: usize> Send for LogRing<N> {}

impl<const N: usize> LogRing<N> {
    const MASK: usize = N - 1;

    /// Create a new empty ring keeping levels up to `Info`.
    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "Log ring size must be power of 2");

        Self {
            entries: UnsafeCell::new([LogEntry::EMPTY; N]),
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
            max_level: AtomicU8::new(LogLevel::Info as u8),
        }
    }

    /// Change the most verbose level kept.
    pub fn set_max_level(&self, level: LogLevel) {
        self.max_level.store(level as u8, Ordering::Relaxed);
    }

    /// True if `level` would be kept.
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level as u8 <= self.max_level.load(Ordering::Relaxed)
    }

    /// Queue a message. Never blocks.
    ///
    /// Returns `false` if the message was filtered out or dropped.
    pub fn push(&self, timestamp_us: u64, level: LogLevel, msg: &[u8]) -> bool {
        if !self.enabled(level) {
            return false;
        }

        let write = self.write_idx.load(Ordering::Relaxed);
        let read = self.read_idx.load(Ordering::Acquire);

        if write.wrapping_sub(read) >= N as u32 {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        let idx = (write as usize) & Self::MASK;
        let len = msg.len().min(MAX_MSG_LEN);

        // SAFETY: slot `idx` is outside [read, write), the consumer won't touch it.
        unsafe {
            let entry = &mut (*self.entries.get())[idx];
            entry.timestamp_us = timestamp_us;
            entry.level = level;
            entry.len = len as u8;
            entry.msg[..len].copy_from_slice(&msg[..len]);
        }

        self.write_idx.store(write.wrapping_add(1), Ordering::Release);
        true
    }

    /// Take the oldest entry, if any.
    pub fn drain(&self) -> Option<LogEntry> {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);

        if read == write {
            return None;
        }

        let idx = (read as usize) & Self::MASK;

        // SAFETY: slot `idx` is inside [read, write), the producer won't touch it.
        let entry = unsafe { (*self.entries.get())[idx] };

        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(entry)
    }

    /// Drain everything into `out` as text lines.
    ///
    /// Reports and resets the dropped counter after the entries.
    /// Returns the number of entries written.
    pub fn drain_to(&self, out: &mut dyn Write) -> usize {
        let mut count = 0;
        while let Some(entry) = self.drain() {
            let _ = write_entry(out, &entry);
            count += 1;
        }

        let dropped = self.dropped.swap(0, Ordering::Relaxed);
        if dropped > 0 {
            let _ = writeln!(out, "[WARN] dropped {} log messages", dropped);
        }
        count
    }

    /// Get count of dropped messages.
    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Get number of entries waiting to be drained.
    #[inline]
    pub fn pending(&self) -> u32 {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }
}

impl<const N: usize> Default for LogRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Render one entry: `[timestamp_us] LEVEL: message`.
pub fn write_entry(out: &mut dyn Write, entry: &LogEntry) -> core::fmt::Result {
    writeln!(
        out,
        "[{:10}] {}: {}",
        entry.timestamp_us,
        entry.level.as_str(),
        entry.text()
    )
}

/// Truncating formatter over a byte slice.
pub struct SliceWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> SliceWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes written so far.
    pub fn len(&self) -> usize {
        self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.pos == 0
    }
}

impl Write for SliceWriter<'_> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        let to_write = bytes.len().min(self.buf.len() - self.pos);
        self.buf[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
        self.pos += to_write;
        Ok(())
    }
}

/// Format `args` into `buf`, truncating. Returns the length written.
#[inline]
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    let mut writer = SliceWriter::new(buf);
    let _ = writer.write_fmt(args);
    writer.len()
}

/// Foreground log macro.
///
/// Formats on the stack and pushes into a [`LogRing`]. Skips formatting
/// entirely when the level is filtered out.
///
/// # Example
///
/// ```ignore
/// fg_log!(LogLevel::Info, LOG, now_us, "carrier {} Hz", freq);
/// ```
#[macro_export]
macro_rules! fg_log {
    ($level:expr, $ring:expr, $timestamp:expr, $($arg:tt)*) => {{
        let level = $level;
        if $ring.enabled(level) {
            let mut buf = [0u8; $crate::logging::MAX_MSG_LEN];
            let len = $crate::logging::format_to_buffer(&mut buf, format_args!($($arg)*));
            $ring.push($timestamp, level, &buf[..len]);
        }
    }};
}

/// Foreground error log.
#[macro_export]
macro_rules! fg_error {
    ($ring:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::fg_log!($crate::logging::LogLevel::Error, $ring, $timestamp, $($arg)*)
    };
}

/// Foreground warning log.
#[macro_export]
macro_rules! fg_warn {
    ($ring:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::fg_log!($crate::logging::LogLevel::Warn, $ring, $timestamp, $($arg)*)
    };
}

/// Foreground info log.
#[macro_export]
macro_rules! fg_info {
    ($ring:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::fg_log!($crate::logging::LogLevel::Info, $ring, $timestamp, $($arg)*)
    };
}

/// Foreground debug log.
#[macro_export]
macro_rules! fg_debug {
    ($ring:expr, $timestamp:expr, $($arg:tt)*) => {
        $crate::fg_log!($crate::logging::LogLevel::Debug, $ring, $timestamp, $($arg)*)
    };
}
