//! Out-of-band login notifications.
//!
//! Operators like to know when someone logs in. The notifier writes one
//! line per event to whatever writer it was given: stdout, a log file, a
//! pipe into a chat bridge.

use std::fmt;
use std::io::{self, Write};

pub struct Notifier {
    out: Box<dyn Write + Send>,
}

impl Notifier {
    pub fn new(out: impl Write + Send + 'static) -> Self {
        Self { out: Box::new(out) }
    }

    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// A notifier that discards everything.
    pub fn sink() -> Self {
        Self::new(io::sink())
    }

    /// Writes `message` as one line and flushes.
    pub fn send(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.out, "{message}")?;
        self.out.flush()
    }
}

impl fmt::Debug for Notifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notifier").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_send_writes_one_line_per_message() {
        let buffer = Shared::default();
        let mut notifier = Notifier::new(buffer.clone());

        notifier.send("New player logged in: Kilgore").unwrap();
        notifier.send("New player logged in: Trout").unwrap();

        let written = String::from_utf8(buffer.0.lock().unwrap().clone()).unwrap();
        assert_eq!(
            written,
            "New player logged in: Kilgore\nNew player logged in: Trout\n"
        );
    }

    #[test]
    fn test_sink_accepts_anything() {
        assert!(Notifier::sink().send("ignored").is_ok());
    }
}
