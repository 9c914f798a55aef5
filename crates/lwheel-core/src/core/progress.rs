use std::env;
use std::io::{self, IsTerminal, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const TICK: Duration = Duration::from_millis(80);
const START_DELAY: Duration = Duration::from_millis(120);

pub(crate) fn progress_enabled() -> bool {
    match env::var("LWHEEL_PROGRESS") {
        Ok(value) => value != "0",
        Err(_) => io::stderr().is_terminal(),
    }
}

struct ActiveTask {
    token: u64,
    label: String,
    started_at: Instant,
}

/// The pipeline phases run strictly one after another, so a single slot is
/// enough; a new spinner simply replaces the previous one.
static ACTIVE: Mutex<Option<ActiveTask>> = Mutex::new(None);
static NEXT_TOKEN: AtomicU64 = AtomicU64::new(1);
static RENDERER: OnceLock<()> = OnceLock::new();
static STDERR_LOCK: Mutex<()> = Mutex::new(());

fn erase_line() {
    let _guard = STDERR_LOCK.lock().ok();
    let _ = io::stderr().write_all(b"\r\x1b[2K");
    let _ = io::stderr().flush();
}

fn spawn_renderer() {
    RENDERER.get_or_init(|| {
        thread::spawn(|| {
            let mut frame = 0usize;
            let mut drawn = false;
            loop {
                let snapshot = ACTIVE
                    .lock()
                    .expect("progress state")
                    .as_ref()
                    .map(|task| (task.label.clone(), task.started_at));
                match snapshot {
                    Some((label, started_at))
                        if progress_enabled() && started_at.elapsed() >= START_DELAY =>
                    {
                        let glyph = FRAMES[frame % FRAMES.len()];
                        frame = frame.wrapping_add(1);
                        let _guard = STDERR_LOCK.lock().ok();
                        let _ = write!(io::stderr(), "\r\x1b[2Klwheel ▸ {label} {glyph}");
                        let _ = io::stderr().flush();
                        drawn = true;
                    }
                    _ => {
                        if drawn {
                            erase_line();
                            drawn = false;
                        }
                    }
                }
                thread::sleep(TICK);
            }
        });
    });
}

/// Spinner shown on stderr while a pipeline phase runs. The line starts after
/// a short delay so fast phases never flicker.
pub struct ProgressReporter {
    token: Option<u64>,
}

impl ProgressReporter {
    pub fn spinner(label: impl Into<String>) -> Self {
        if !progress_enabled() {
            return Self { token: None };
        }
        spawn_renderer();
        let token = NEXT_TOKEN.fetch_add(1, Ordering::Relaxed);
        *ACTIVE.lock().expect("progress state") = Some(ActiveTask {
            token,
            label: label.into(),
            started_at: Instant::now(),
        });
        Self { token: Some(token) }
    }

    pub fn finish(mut self, message: impl Into<String>) {
        self.stop();
        eprintln!("lwheel ▸ {}", message.into());
    }

    fn stop(&mut self) {
        let Some(token) = self.token.take() else {
            return;
        };
        let mut active = ACTIVE.lock().expect("progress state");
        if active.as_ref().is_some_and(|task| task.token == token) {
            *active = None;
        }
        drop(active);
        erase_line();
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        self.stop();
    }
}
