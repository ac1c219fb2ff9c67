use std::io::{self, Write};

use chrono::NaiveDateTime;

use super::presentation::{Screen, Tone};

/// Output side of the kiosk. Only the UI driver calls it.
pub trait Renderer {
    fn render(&mut self, screen: &Screen, clock: NaiveDateTime) -> io::Result<()>;
}

/// Plain terminal output, redrawn only when the screen content changes.
pub struct ConsoleRenderer<W: Write> {
    out: W,
    last: Option<Screen>,
}

impl<W: Write> ConsoleRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out, last: None }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for ConsoleRenderer<W> {
    fn render(&mut self, screen: &Screen, clock: NaiveDateTime) -> io::Result<()> {
        if self.last.as_ref() == Some(screen) {
            return Ok(());
        }

        let marker = match screen.tone {
            Tone::Waiting => "[ .. ]",
            Tone::Scanning => "[ >> ]",
            Tone::Success => "[ OK ]",
            Tone::Error => "[ !! ]",
        };

        writeln!(self.out, "----------------------------------------")?;
        writeln!(self.out, "{}", clock.format("%H:%M:%S - %A, %B %d, %Y"))?;
        writeln!(self.out, "{marker} {}", screen.headline)?;
        for line in screen.user_line.lines() {
            writeln!(self.out, "       {line}")?;
        }
        writeln!(self.out, "       {}", screen.detail)?;
        self.out.flush()?;

        self.last = Some(screen.clone());
        Ok(())
    }
}
