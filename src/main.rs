use std::io::{self, Read};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::info;
use tactical_morse::config::{self, Action};
use tactical_morse::logging::{clear_log_files, init_logging, log_dir};
use tactical_morse::{App, Event, EventHandler, Tui, clipboard};
use tactical_morse::{Settings, TerminalGuard, ToneGenerator, init_panic_hook, init_tui, morse};

/// Upper bound on how long the loop sleeps without redrawing.
const TICK_RATE: Duration = Duration::from_millis(100);

fn main() -> Result<()>
{
    let matches = config::command().get_matches();

    match config::action(&matches)
    {
        Action::ClearLog =>
        {
            let dir = log_dir()?;
            clear_log_files(&dir)?;
            println!("Log files removed from {}", dir.display());
            Ok(())
        }
        Action::Encode(words) =>
        {
            println!("{}", morse::encode(&input_or_stdin(&words)?));
            Ok(())
        }
        Action::Decode(words) =>
        {
            println!("{}", morse::decode(&input_or_stdin(&words)?));
            Ok(())
        }
        Action::Interactive =>
        {
            let settings = Settings::from_matches(&matches)?;
            init_logging(&log_dir()?)?;
            run_interactive(&settings)
        }
    }
}

/// Joins the command line words, or reads stdin when there are none.
///
/// # Errors
///
/// Returns an error if stdin can't be read.
fn input_or_stdin(words: &[String]) -> Result<String>
{
    if !words.is_empty()
    {
        return Ok(words.join(" "));
    }

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read stdin")?;

    Ok(input.trim_end_matches(['\r', '\n']).to_owned())
}

/// Sets up the terminal and runs the UI until the user quits.
///
/// # Errors
///
/// Returns an error if the terminal can't be set up or drawn to.
fn run_interactive(settings: &Settings) -> Result<()>
{
    init_panic_hook();

    let tone = if settings.audio_enabled
    {
        ToneGenerator::new(settings.tone)
    }
    else
    {
        info!("Audio disabled from the command line");
        ToneGenerator::disabled(settings.tone)
    };

    let mut app = App::new(settings, tone);

    // Use RAII to ensure terminal cleanup happens
    let terminal_guard = TerminalGuard::new().context("Failed to set up terminal")?;
    app.enable_keyboard_keying(terminal_guard.key_release_events());

    let mut terminal = init_tui().context("Failed to create terminal")?;
    let event_handler = EventHandler::new(TICK_RATE);

    info!("Session started");
    run_app(&mut terminal, app, &event_handler)
}

/// Run the main loop
///
/// Due timers run before every draw, and the wait for the next event is cut
/// short when a timer is about to fire.
///
/// # Arguments
///
/// * `terminal` - The terminal to draw to
/// * `app` - The app to run
/// * `event_handler` - The event handler to handle events
///
/// # Errors
///
/// Returns an error if the terminal fails to draw to the screen.
fn run_app(terminal: &mut Tui, mut app: App, event_handler: &EventHandler) -> Result<()>
{
    loop
    {
        app.run_due(Instant::now());
        terminal.draw(|frame| app.render(frame))?;

        let timeout = app
            .next_deadline()
            .map_or(TICK_RATE, |deadline| {
                deadline
                    .saturating_duration_since(Instant::now())
                    .min(TICK_RATE)
            });

        match event_handler.next_timeout(timeout)?
        {
            Some(Event::Key(key, at)) => copy(app.on_key(key, at)),
            Some(Event::Mouse(mouse, at)) =>
            {
                if let Some(control) = app.on_mouse(mouse, at)
                {
                    copy(app.activate(control));
                }
            }
            Some(Event::FocusLost(at)) => app.pointer_left(at),
            Some(Event::Tick | Event::Resize(..)) | None =>
            {}
        }

        if app.should_quit
        {
            break;
        }
    }

    info!("Session ended");
    Ok(())
}

/// Puts a copied output on the clipboard.
fn copy(text: Option<String>)
{
    if let Some(text) = text
    {
        clipboard::copy(&text);
    }
}
