use crossterm::{
    cursor::MoveToColumn,
    queue,
    terminal::{Clear, ClearType},
};
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing_subscriber::fmt::MakeWriter;

/// A transient line kept below all other terminal output.
///
/// The text is written without a trailing newline, so the cursor always sits
/// on it. Anything printed while it is visible goes through `suspend`, which
/// clears the line, prints, and draws it again underneath. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct StatusLine {
    current: Arc<Mutex<Option<String>>>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<String>> {
        self.current
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_visible(&self) -> bool {
        self.lock().is_some()
    }

    /// Draw `text` as the status, replacing any previous one.
    pub fn show<W: Write>(&self, out: &mut W, text: &str) -> io::Result<()> {
        let mut current = self.lock();
        if current.is_some() {
            clear_line(out)?;
        }
        write!(out, "{}", text)?;
        out.flush()?;
        *current = Some(text.to_string());
        Ok(())
    }

    pub fn hide<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let mut current = self.lock();
        if current.take().is_some() {
            clear_line(out)?;
            out.flush()?;
        }
        Ok(())
    }

    /// Run `print` with the status line out of the way.
    pub fn suspend<W, T>(
        &self,
        out: &mut W,
        print: impl FnOnce(&mut W) -> io::Result<T>,
    ) -> io::Result<T>
    where
        W: Write,
    {
        let current = self.lock();
        if current.is_some() {
            clear_line(out)?;
        }
        let value = print(out)?;
        if let Some(text) = current.as_deref() {
            write!(out, "{}", text)?;
        }
        out.flush()?;
        Ok(value)
    }

    /// Wrap a log writer so log lines are printed above the status.
    pub fn writer<M>(&self, inner: M) -> StatusWriter<M> {
        StatusWriter {
            status: self.clone(),
            inner,
        }
    }
}

fn clear_line<W: Write>(out: &mut W) -> io::Result<()> {
    queue!(out, MoveToColumn(0), Clear(ClearType::CurrentLine))
}

/// `MakeWriter` that routes every write through `StatusLine::suspend`.
#[derive(Debug, Clone)]
pub struct StatusWriter<M> {
    status: StatusLine,
    inner: M,
}

impl<'a, M: MakeWriter<'a>> MakeWriter<'a> for StatusWriter<M> {
    type Writer = SuspendingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SuspendingWriter {
            status: self.status.clone(),
            inner: self.inner.make_writer(),
        }
    }
}

pub struct SuspendingWriter<W> {
    status: StatusLine,
    inner: W,
}

impl<W: Write> Write for SuspendingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.status.suspend(&mut self.inner, |out| out.write_all(buf))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
