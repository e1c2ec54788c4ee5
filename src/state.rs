use std::io::{self, BufRead, Write};

use termion::color;

use crate::{
    input::{InputMessage, LineSource},
    parse::parse_line,
    process::status::ExitOutcome,
};

/// Any word equal to this ends the shell, wherever it appears on the line.
pub const EXIT_KEYWORD: &str = "exit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep reading. Carries the status of the line's pipeline if one ran.
    Continue(Option<ExitOutcome>),
    Exit,
}

pub struct State {
    pub show_prompt: bool,
}

impl State {
    pub fn new(show_prompt: bool) -> Self {
        Self { show_prompt }
    }

    /// Writes the prompt: the working directory in green, then `$ `.
    pub fn render<W: Write>(&self, stdout: &mut W) -> io::Result<()> {
        if !self.show_prompt {
            return Ok(());
        }

        if let Ok(dir) = std::env::current_dir() {
            write!(
                stdout,
                "{}{}{}",
                color::Fg(color::Green),
                dir.display(),
                color::Fg(color::Reset)
            )?;
        }

        write!(stdout, "$ ")?;

        stdout.flush()
    }

    /// Parses and runs one line. Launch failures and orchestration errors are
    /// reported on `stdout`; neither stops the shell.
    pub fn execute<W: Write>(&mut self, line: &str, stdout: &mut W) -> io::Result<Flow> {
        let plan = parse_line(line);

        if plan.mentions(EXIT_KEYWORD) {
            debug!("exit keyword found, stopping");
            return Ok(Flow::Exit);
        }

        if plan.is_empty() {
            return Ok(Flow::Continue(None));
        }

        trace!(?plan, "execution plan");

        stdout.flush()?;

        match plan.execute() {
            Ok(outcome) => {
                for (program, errno) in outcome.launch_failures() {
                    writeln!(stdout, "minsh: {program}: {}", errno.desc())?;
                }
                Ok(Flow::Continue(outcome.status()))
            }
            Err(err) => {
                error!(%err, "failed to run pipeline");
                writeln!(stdout, "minsh: {err}")?;
                Ok(Flow::Continue(None))
            }
        }
    }

    /// Reads and runs lines until input runs out or the exit keyword shows up.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        input: &mut LineSource<R>,
        stdout: &mut W,
    ) -> io::Result<()> {
        loop {
            self.render(stdout)?;

            let line = match input.next_line()? {
                InputMessage::Line(line) => line,
                InputMessage::Eof => {
                    if self.show_prompt {
                        writeln!(stdout)?;
                    }
                    break;
                }
            };

            match self.execute(&line, stdout)? {
                Flow::Continue(status) => trace!(?status, "line finished"),
                Flow::Exit => break,
            }
        }

        Ok(())
    }
}
