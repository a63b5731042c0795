//! Entering and leaving the alternate screen.

use std::{error::Error, io, sync::Arc};

use ratatui::crossterm::{
    cursor::SetCursorStyle,
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::Mutex;

pub type SharedTerminal = Arc<Mutex<Terminal<CrosstermBackend<io::Stdout>>>>;

/// Undo everything `setup_terminal` changed, writing straight to stdout.
fn leave_terminal_modes(out: &mut impl io::Write) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(
        out,
        SetCursorStyle::DefaultUserShape,
        LeaveAlternateScreen,
        DisableBracketedPaste
    )
}

/// A panic inside the loop would otherwise leave the shell in raw mode on
/// the alternate screen with the message hidden.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = leave_terminal_modes(&mut io::stdout());
        original_hook(panic_info);
    }));
}

pub fn setup_terminal() -> Result<SharedTerminal, Box<dyn Error>> {
    enable_raw_mode()?;
    install_panic_hook();

    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableBracketedPaste,
        SetCursorStyle::SteadyBar
    )?;

    let terminal = Terminal::new(CrosstermBackend::new(stdout)).inspect_err(|_| {
        let _ = disable_raw_mode();
    })?;

    Ok(Arc::new(Mutex::new(terminal)))
}

pub async fn restore_terminal(terminal: &SharedTerminal) -> Result<(), Box<dyn Error>> {
    let mut guard = terminal.lock().await;
    leave_terminal_modes(guard.backend_mut())?;
    guard.show_cursor()?;
    Ok(())
}
