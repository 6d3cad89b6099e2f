use std::io::{self, Write};

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use bemedia::{MediaSession, PlaybackState};

fn print_session(session: &MediaSession) {
    println!("\n🎵 SESSION [{}] 🎵", session.handle());
    println!("   App:    {}", session.source_app());
    println!("   Track:  {}", session.title());
    println!("   Artist: {}", session.artist());
    println!(
        "   Time:   {}s / {}s",
        session.position_seconds(),
        session.duration_seconds()
    );

    // Check for album art
    if session.has_thumbnail() {
        println!("   Art:    [Image data found: {} bytes]", session.thumbnail().len());
    } else {
        println!("   Art:    [No image data]");
    }

    println!(
        "   State:  {}",
        if session.is_playing() { "▶ Playing" } else { "⏸ Paused" }
    );
}

fn list_sessions() {
    match bemedia::list_sessions() {
        Some(sessions) if sessions.is_empty() => println!("[INFO] No active media sessions."),
        Some(sessions) => {
            for session in &sessions {
                print_session(session);
            }
        }
        None => println!("[INFO] Session information is not available."),
    }
}

/// Find the session currently holding `handle`, if any.
fn session_by_handle(handle: u32) -> Option<MediaSession> {
    bemedia::list_sessions()?
        .into_iter()
        .find(|session| session.handle() == handle)
}

fn run_command(verb: &str, handle: u32) {
    let Some(session) = session_by_handle(handle) else {
        println!("[CMD] No session with handle {}", handle);
        return;
    };

    let ok = match verb {
        "p" | "play" => session.play(),
        "a" | "pause" => session.pause(),
        "t" | "toggle" => {
            let outcome = session.toggle_play();
            match outcome.resulting_state {
                PlaybackState::Playing => println!("[CMD] Now playing"),
                PlaybackState::Paused => println!("[CMD] Now paused"),
                PlaybackState::Unknown => println!("[CMD] Resulting state unknown, re-list to check"),
            }
            outcome.succeeded
        }
        "s" | "stop" => session.stop(),
        "n" | "next" => session.next(),
        "b" | "back" => session.previous(),
        _ => unreachable!(),
    };

    println!("[CMD] {} -> {}", verb, if ok { "ok" } else { "FAILED" });
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("========================================");
    println!("    BeMedia Session Bridge Test CLI     ");
    println!("========================================");
    println!("Commands:");
    println!("  [l] list             Show all active sessions");
    println!("  [p] play   <handle>  Start/resume playback");
    println!("  [a] pause  <handle>  Pause playback");
    println!("  [t] toggle <handle>  Toggle play/pause");
    println!("  [s] stop   <handle>  Stop playback");
    println!("  [n] next   <handle>  Skip to next track");
    println!("  [b] back   <handle>  Skip to previous track");
    println!("  [q] quit             Exit");
    println!("----------------------------------------");

    // One-time bridge initialization
    if bemedia::init() {
        println!("[*] Bridge initialized.");
        list_sessions();
    } else {
        println!("[*] Bridge did NOT initialize (unsupported platform?)");
        println!("[*] All commands will report failure.");
    }

    // Input loop
    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut input = String::new();
        if io::stdin().read_line(&mut input)? == 0 {
            break; // EOF
        }

        let mut parts = input.trim().split_whitespace();
        let verb = parts.next().unwrap_or("");
        let handle = parts.next().and_then(|raw| raw.parse::<u32>().ok());

        match (verb, handle) {
            ("", _) => {} // Ignore empty enter
            ("l", _) | ("list", _) => list_sessions(),
            ("q", _) | ("quit", _) => {
                println!("[CMD] Quitting");
                break;
            }
            ("p" | "play" | "a" | "pause" | "t" | "toggle" | "s" | "stop" | "n" | "next" | "b"
            | "back", Some(handle)) => run_command(verb, handle),
            ("p" | "play" | "a" | "pause" | "t" | "toggle" | "s" | "stop" | "n" | "next" | "b"
            | "back", None) => {
                println!("Usage: {} <handle>  (get handles from 'l')", verb);
            }
            _ => println!("Unknown command. Use l, p, a, t, s, n, b, or q."),
        }
    }

    Ok(())
}
