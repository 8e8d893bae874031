use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// What the UI loop reacts to
#[derive(Clone, Debug)]
pub enum QuizEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    /// The input side has gone away; nothing more will arrive
    Closed,
}

/// Anything that can hand the UI loop its next input
pub trait QuizEventSource: Send + 'static {
    fn next_event(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError>;
}

/// Key presses and resizes read from the terminal on a background thread
pub struct TerminalEvents {
    rx: Receiver<QuizEvent>,
}

impl TerminalEvents {
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                // some terminals also report releases; one answer per press
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => QuizEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => QuizEvent::Resize,
                Ok(_) => continue,
                Err(err) => {
                    tracing::warn!(%err, "terminal input closed");
                    break;
                }
            };
            if tx.send(evt).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl QuizEventSource for TerminalEvents {
    fn next_event(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Events pushed through a channel, for driving the app without a terminal
pub struct ScriptedEvents {
    rx: Receiver<QuizEvent>,
}

impl ScriptedEvents {
    pub fn new(rx: Receiver<QuizEvent>) -> Self {
        Self { rx }
    }
}

impl QuizEventSource for ScriptedEvents {
    fn next_event(&self, timeout: Duration) -> Result<QuizEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Pulls from an event source, turning quiet periods into ticks
pub struct EventLoop<E: QuizEventSource> {
    source: E,
    tick_rate: Duration,
}

impl<E: QuizEventSource> EventLoop<E> {
    pub fn new(source: E, tick_rate: Duration) -> Self {
        Self { source, tick_rate }
    }

    /// Waits at most one tick for input. Once the source hangs up every
    /// step returns `Closed` straight away.
    pub fn step(&self) -> QuizEvent {
        match self.source.next_event(self.tick_rate) {
            Ok(evt) => evt,
            Err(RecvTimeoutError::Timeout) => QuizEvent::Tick,
            Err(RecvTimeoutError::Disconnected) => QuizEvent::Closed,
        }
    }
}

/// Wall-clock source for grading. Read once per transition.
pub trait Clock {
    fn now(&self) -> SystemTime;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug)]
pub struct ManualClock {
    origin: SystemTime,
    offset_ms: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(origin: SystemTime) -> Self {
        Self {
            origin,
            offset_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset_ms
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        self.origin + Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }
}
