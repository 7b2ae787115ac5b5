//! Default I/O capabilities used by the machine.
//!
//! The machine never touches stdin/stdout directly; it calls one of the boxed
//! hooks below, which tests and front ends can replace.

use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;

use crate::trace::TraceRecord;

/// Interactive fallback for `,` once the input buffer is exhausted.
/// `None` means "no character available" and stores 0.
pub type InputProvider = Box<dyn FnMut() -> Option<char> + Send>;

/// Receives each character produced by `.` outside debug mode.
pub type OutputSink = Box<dyn FnMut(char) + Send>;

/// Receives each trace record in debug mode.
pub type TraceSink = Box<dyn FnMut(&TraceRecord) + Send>;

/// Prompt on stderr and read one line from stdin, keeping its first character.
pub fn prompt_stdin_char() -> Option<char> {
    let mut stderr = io::stderr();
    let _ = write!(stderr, "Input: ");
    let _ = stderr.flush();

    let mut stdin = io::stdin().lock();
    read_first_char(&mut stdin)
}

/// Read one line and return its first character.
/// EOF, an empty line and an interrupted or failed read all yield `None`.
pub fn read_first_char<R: BufRead>(reader: &mut R) -> Option<char> {
    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) => None,
        Ok(_) => line.trim_end_matches(['\r', '\n']).chars().next(),
        Err(_) => None,
    }
}

type LineReader = Arc<dyn Fn() -> Option<char> + Send + Sync>;

enum PromptEvent {
    Line(Option<char>),
    Interrupted,
}

/// Stdin prompt whose wait can be cut short by ctrl+c.
///
/// The line is read on a helper thread while the caller waits on a channel
/// that the [`InterruptHandle`] also feeds. An interrupted prompt yields
/// `None`, so `,` stores 0 and the program keeps running.
pub struct InterruptiblePrompt {
    reader: LineReader,
    pending: Arc<AtomicBool>,
    tx: mpsc::Sender<PromptEvent>,
    rx: mpsc::Receiver<PromptEvent>,
    // Reader thread left behind by an interrupted prompt, still waiting for its line.
    in_flight: bool,
}

/// Signals a pending [`InterruptiblePrompt`].
#[derive(Clone)]
pub struct InterruptHandle {
    pending: Arc<AtomicBool>,
    tx: mpsc::Sender<PromptEvent>,
}

impl InterruptHandle {
    /// Cut the waiting prompt short. Returns `false` when no prompt is waiting.
    pub fn interrupt(&self) -> bool {
        self.pending.load(Ordering::SeqCst) && self.tx.send(PromptEvent::Interrupted).is_ok()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }
}

impl InterruptiblePrompt {
    /// Prompt backed by stdin, using [`read_first_char`].
    pub fn stdin() -> (Self, InterruptHandle) {
        Self::with_reader(|| {
            let mut stdin = io::stdin().lock();
            read_first_char(&mut stdin)
        })
    }

    pub fn with_reader<F>(reader: F) -> (Self, InterruptHandle)
    where
        F: Fn() -> Option<char> + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let pending = Arc::new(AtomicBool::new(false));
        let handle = InterruptHandle {
            pending: pending.clone(),
            tx: tx.clone(),
        };
        let prompt = Self {
            reader: Arc::new(reader),
            pending,
            tx,
            rx,
            in_flight: false,
        };
        (prompt, handle)
    }

    /// Prompt `Input: ` on stderr and wait for a line or an interrupt.
    pub fn read_char(&mut self) -> Option<char> {
        // A line that arrived after an earlier interrupt answers this prompt;
        // stale interrupts are dropped.
        while let Ok(event) = self.rx.try_recv() {
            if let PromptEvent::Line(c) = event {
                self.in_flight = false;
                return c;
            }
        }

        self.pending.store(true, Ordering::SeqCst);
        let mut stderr = io::stderr();
        let _ = write!(stderr, "Input: ");
        let _ = stderr.flush();

        if !self.in_flight {
            let reader = self.reader.clone();
            let tx = self.tx.clone();
            thread::spawn(move || {
                let _ = tx.send(PromptEvent::Line(reader()));
            });
            self.in_flight = true;
        }

        let event = self.rx.recv();
        self.pending.store(false, Ordering::SeqCst);
        match event {
            Ok(PromptEvent::Line(c)) => {
                self.in_flight = false;
                c
            }
            Ok(PromptEvent::Interrupted) | Err(_) => None,
        }
    }
}

/// Install the process-wide SIGINT handler.
///
/// While a prompt is pending the signal only interrupts that prompt;
/// otherwise `on_idle` runs.
pub fn install_interrupt_handler<F>(handle: InterruptHandle, on_idle: F) -> Result<(), ctrlc::Error>
where
    F: Fn() + Send + 'static,
{
    ctrlc::set_handler(move || {
        if !handle.interrupt() {
            on_idle();
        }
    })
}

/// Write one character to stdout unbuffered.
pub fn print_stdout_char(c: char) {
    let mut stdout = io::stdout();
    let _ = write!(stdout, "{c}");
    let _ = stdout.flush();
}

pub fn print_trace(record: &TraceRecord) {
    println!("{record}");
}
