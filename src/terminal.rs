// Terminal edge: raw-mode screen drawing and key decoding with crossterm,
// the datapoint prompts with dialoguer and a spinner with indicatif while a
// datapoint is being submitted.

use std::io::{self, Stdout, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event as TermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use crossterm::terminal::{self, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue};
use dialoguer::Input as Prompt;
use indicatif::{ProgressBar, ProgressStyle};

use crate::app::{AppState, Input};
use crate::error::BeeminderError;
use crate::render::{self, Tone};
use crate::ui::Console;

#[cfg(test)]
#[path = "terminal_test.rs"]
mod tests;

/// Owns the terminal for the lifetime of the session. Raw mode and the
/// alternate screen are restored on drop, including on early returns.
pub struct Terminal {
    out: Stdout,
    /// Prompts run in cooked mode on the main screen.
    suspended: bool,
    spinner: Option<ProgressBar>,
}

impl Terminal {
    pub fn enter() -> Result<Self> {
        terminal::enable_raw_mode().context("Failed to enable raw mode")?;
        let mut out = io::stdout();
        execute!(out, EnterAlternateScreen, cursor::Hide)
            .context("Failed to enter the alternate screen")?;
        Ok(Terminal {
            out,
            suspended: false,
            spinner: None,
        })
    }

    /// Hand the screen to dialoguer.
    fn suspend(&mut self) -> Result<()> {
        if self.suspended {
            return Ok(());
        }
        execute!(self.out, LeaveAlternateScreen, cursor::Show)?;
        terminal::disable_raw_mode()?;
        self.suspended = true;
        Ok(())
    }

    fn resume(&mut self) -> Result<()> {
        clear_spinner(&mut self.spinner);
        if !self.suspended {
            return Ok(());
        }
        terminal::enable_raw_mode()?;
        execute!(self.out, EnterAlternateScreen, cursor::Hide)?;
        self.suspended = false;
        Ok(())
    }

    fn status_row(&mut self, text: &str) -> Result<()> {
        let (width, height) = terminal::size()?;
        queue!(
            self.out,
            cursor::MoveTo(0, height.saturating_sub(2)),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(Color::Yellow),
            Print(render::fit(text, width as usize)),
            ResetColor
        )?;
        self.out.flush()?;
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        clear_spinner(&mut self.spinner);
        if !self.suspended {
            let _ = execute!(self.out, LeaveAlternateScreen);
        }
        let _ = execute!(self.out, cursor::Show);
        let _ = terminal::disable_raw_mode();
    }
}

fn clear_spinner(slot: &mut Option<ProgressBar>) {
    if let Some(spinner) = slot.take() {
        spinner.finish_and_clear();
    }
}

/// Show `next`, wiping whatever spinner line is already on screen.
fn replace_spinner(slot: &mut Option<ProgressBar>, next: ProgressBar) {
    clear_spinner(slot);
    *slot = Some(next);
}

/// Put the terminal back before a panic message is printed over it.
pub fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = execute!(io::stdout(), LeaveAlternateScreen, cursor::Show);
        let _ = terminal::disable_raw_mode();
        default_hook(info);
    }));
}

/// Decode a key press. Releases/repeats and unmapped keys yield `None`.
pub fn map_key(key: KeyEvent) -> Option<Input> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        // Raw mode swallows SIGINT.
        return (key.code == KeyCode::Char('c')).then_some(Input::Quit);
    }
    match key.code {
        KeyCode::Up => Some(Input::Up),
        KeyCode::Down => Some(Input::Down),
        KeyCode::Char('i') => Some(Input::Detail),
        KeyCode::Char('b') => Some(Input::Back),
        KeyCode::Char('r') => Some(Input::Refresh),
        KeyCode::Char('c') => Some(Input::Create),
        KeyCode::Char('w') => Some(Input::Web),
        KeyCode::Char('q') => Some(Input::Quit),
        _ => None,
    }
}

impl Console for Terminal {
    fn draw(&mut self, state: &AppState) -> Result<()> {
        self.resume()?;
        let (width, height) = terminal::size()?;
        let now = chrono::Utc::now().timestamp();
        let lines = render::compose(state, now, width, height);

        queue!(self.out, terminal::Clear(ClearType::All))?;
        for (row, line) in lines.iter().enumerate() {
            queue!(self.out, cursor::MoveTo(0, row as u16))?;
            match line.tone {
                Tone::Plain => {}
                Tone::Title | Tone::Header => queue!(self.out, SetAttribute(Attribute::Bold))?,
                Tone::Selected => queue!(self.out, SetAttribute(Attribute::Reverse))?,
                Tone::Info => queue!(self.out, SetForegroundColor(Color::Green))?,
                Tone::Error => queue!(self.out, SetForegroundColor(Color::Red))?,
                Tone::Footer => queue!(self.out, SetAttribute(Attribute::Dim))?,
            }
            queue!(
                self.out,
                Print(&line.text),
                SetAttribute(Attribute::Reset),
                ResetColor
            )?;
        }
        self.out.flush()?;
        Ok(())
    }

    fn next_input(&mut self) -> Result<Input> {
        loop {
            match event::read().context("Failed to read terminal input")? {
                TermEvent::Key(key) => {
                    if let Some(input) = map_key(key) {
                        return Ok(input);
                    }
                }
                TermEvent::Resize(_, _) => return Ok(Input::Resize),
                _ => {}
            }
        }
    }

    fn busy(&mut self, message: &str) -> Result<()> {
        if !self.suspended {
            return self.status_row(message);
        }
        clear_spinner(&mut self.spinner);
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(message.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        replace_spinner(&mut self.spinner, spinner);
        Ok(())
    }

    fn prompt_value(&mut self, slug: &str) -> Result<Option<String>> {
        self.suspend()?;
        let value: String = Prompt::new()
            .with_prompt(format!("Value for {slug} (blank to cancel)"))
            .allow_empty(true)
            .interact_text()?;
        let value = value.trim().to_string();
        Ok(Some(value).filter(|v| !v.is_empty()))
    }

    fn reject_value(&mut self, input: &str, reason: &BeeminderError) -> Result<()> {
        log::debug!("rejected datapoint value '{input}'");
        println!("{reason}. Enter a number such as 1 or 2.5.");
        Ok(())
    }

    fn prompt_comment(&mut self) -> Result<Option<String>> {
        self.suspend()?;
        let comment: String = Prompt::new()
            .with_prompt("Comment (optional)")
            .allow_empty(true)
            .interact_text()?;
        let comment = comment.trim().to_string();
        Ok(Some(comment).filter(|c| !c.is_empty()))
    }

    fn open_url(&mut self, url: &str) -> io::Result<()> {
        open::that(url)
    }
}
