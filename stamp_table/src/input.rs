//! Touch input: from a script file or typed live on stdin.
//!
//! The public interface is [`InputEvent`] delivered over a `mpsc` channel.
//! The frame loop does not need to know where events came from.
//!
//! ## Script format
//!
//! One command per line; `#` starts a comment.
//!
//! ```text
//! frame 1:100,200 2:164,200 3:164,328   # touch id:x,y …
//! frame                                 # no touches
//! add 3000                              # open an add window (ms optional)
//! remove                                # open a remove window
//! wait 500                              # let 500 ms of frames run
//! quit
//! ```

use std::collections::HashSet;
use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use constellation::TouchPoint;
use tracing::warn;

// ════════════════════════════════════════════════════════════════════════════
// InputEvent
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    /// The complete set of touches now on the surface.  Stays in effect
    /// until the next frame replaces it.
    Frame(Vec<TouchPoint>),
    /// Open an add window; `None` uses the configured length.
    BeginAdd(Option<u64>),
    /// Open a remove window; `None` uses the configured length.
    BeginRemove(Option<u64>),
    /// Process no further input for this many milliseconds.
    Wait(u64),
    Quit,
}

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

/// A script line that could not be understood.  Lines are 1-based.
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("line {line}: unknown command '{word}'")]
    UnknownCommand { line: usize, word: String },
    #[error("line {line}: '{token}' is not a touch (expected id:x,y)")]
    BadTouch { line: usize, token: String },
    #[error("line {line}: touch id {id} appears twice in one frame")]
    DuplicateTouch { line: usize, id: u64 },
    #[error("line {line}: '{token}' is not a duration in milliseconds")]
    BadDuration { line: usize, token: String },
    #[error("line {line}: '{command}' needs a duration")]
    MissingDuration { line: usize, command: String },
}

// ════════════════════════════════════════════════════════════════════════════
// Parsing
// ════════════════════════════════════════════════════════════════════════════

/// Parse one script line.  Blank and comment-only lines give `Ok(None)`.
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<InputEvent>, ScriptError> {
    let code = line.split('#').next().unwrap_or_default();
    let mut words = code.split_whitespace();
    let Some(command) = words.next() else {
        return Ok(None);
    };

    let event = match command.to_ascii_lowercase().as_str() {
        "frame" => InputEvent::Frame(parse_touches(line_no, words)?),
        "add" => InputEvent::BeginAdd(words.next().map(|t| parse_ms(line_no, t)).transpose()?),
        "remove" => {
            InputEvent::BeginRemove(words.next().map(|t| parse_ms(line_no, t)).transpose()?)
        }
        "wait" => match words.next() {
            Some(t) => InputEvent::Wait(parse_ms(line_no, t)?),
            None => {
                return Err(ScriptError::MissingDuration { line: line_no, command: "wait".into() })
            }
        },
        "quit" => InputEvent::Quit,
        _ => {
            return Err(ScriptError::UnknownCommand { line: line_no, word: command.to_string() })
        }
    };
    Ok(Some(event))
}

/// Parse a whole script, stopping at the first bad line.
pub fn parse_script(text: &str) -> Result<Vec<InputEvent>, ScriptError> {
    let mut events = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if let Some(event) = parse_line(i + 1, line)? {
            events.push(event);
        }
    }
    Ok(events)
}

fn parse_touches<'a>(
    line: usize,
    tokens: impl Iterator<Item = &'a str>,
) -> Result<Vec<TouchPoint>, ScriptError> {
    let mut seen = HashSet::new();
    let mut touches = Vec::new();
    for token in tokens {
        let touch = parse_touch(token).ok_or_else(|| ScriptError::BadTouch {
            line,
            token: token.to_string(),
        })?;
        if !seen.insert(touch.id) {
            return Err(ScriptError::DuplicateTouch { line, id: touch.id });
        }
        touches.push(touch);
    }
    Ok(touches)
}

fn parse_touch(token: &str) -> Option<TouchPoint> {
    let (id, xy) = token.split_once(':')?;
    let (x, y) = xy.split_once(',')?;
    let (x, y) = (x.parse::<f64>().ok()?, y.parse::<f64>().ok()?);
    if !x.is_finite() || !y.is_finite() {
        return None;
    }
    Some(TouchPoint::new(id.parse().ok()?, x, y))
}

fn parse_ms(line: usize, token: &str) -> Result<u64, ScriptError> {
    token.parse().map_err(|_| ScriptError::BadDuration { line, token: token.to_string() })
}

// ════════════════════════════════════════════════════════════════════════════
// TouchSource
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`InputEvent`]s over a channel.
pub trait TouchSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<InputEvent>);
}

/// Spawn a touch source on its own thread and return the receiving end.
pub fn spawn_touch_source<T: TouchSource>(source: T) -> Receiver<InputEvent> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

/// Replays a pre-parsed script, then quits.
#[derive(Clone, Debug, Default)]
pub struct ScriptedTouchSource {
    events: Vec<InputEvent>,
}

impl ScriptedTouchSource {
    pub fn new(events: Vec<InputEvent>) -> Self {
        ScriptedTouchSource { events }
    }

    pub fn parse(text: &str) -> Result<Self, ScriptError> {
        parse_script(text).map(Self::new)
    }

    pub fn events(&self) -> &[InputEvent] { &self.events }
}

impl TouchSource for ScriptedTouchSource {
    fn run(self: Box<Self>, tx: Sender<InputEvent>) {
        for event in self.events {
            if tx.send(event).is_err() { return; }
        }
        let _ = tx.send(InputEvent::Quit);
    }
}

/// Reads script lines as they arrive, e.g. typed on stdin.  Bad lines are
/// reported and skipped; end of input quits.
pub struct LineTouchSource<R> {
    reader: R,
}

impl<R: BufRead + Send + 'static> LineTouchSource<R> {
    pub fn new(reader: R) -> Self {
        LineTouchSource { reader }
    }
}

impl<R: BufRead + Send + 'static> TouchSource for LineTouchSource<R> {
    fn run(self: Box<Self>, tx: Sender<InputEvent>) {
        for (i, line) in self.reader.lines().enumerate() {
            let line = match line {
                Ok(l) => l,
                Err(e) => { warn!(error = %e, "input read failed"); break; }
            };
            match parse_line(i + 1, &line) {
                Ok(Some(event)) => {
                    let quit = event == InputEvent::Quit;
                    if tx.send(event).is_err() || quit { return; }
                }
                Ok(None) => {}
                Err(e) => warn!("{e}"),
            }
        }
        let _ = tx.send(InputEvent::Quit);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn frame_with_touches() {
        let e = parse_line(1, "frame 1:100,200 2:150.5,-3").unwrap();
        assert_eq!(
            e,
            Some(InputEvent::Frame(vec![
                TouchPoint::new(1, 100.0, 200.0),
                TouchPoint::new(2, 150.5, -3.0),
            ]))
        );
    }

    #[test]
    fn empty_frame_and_comments() {
        assert_eq!(parse_line(1, "frame   # lift everything"), Ok(Some(InputEvent::Frame(vec![]))));
        assert_eq!(parse_line(2, "   # just a note"), Ok(None));
        assert_eq!(parse_line(3, ""), Ok(None));
    }

    #[test]
    fn capture_commands() {
        assert_eq!(parse_line(1, "add"), Ok(Some(InputEvent::BeginAdd(None))));
        assert_eq!(parse_line(1, "ADD 2500"), Ok(Some(InputEvent::BeginAdd(Some(2500)))));
        assert_eq!(parse_line(1, "remove 100"), Ok(Some(InputEvent::BeginRemove(Some(100)))));
        assert_eq!(parse_line(1, "wait 16"), Ok(Some(InputEvent::Wait(16))));
        assert_eq!(parse_line(1, "quit"), Ok(Some(InputEvent::Quit)));
    }

    #[test]
    fn errors_carry_line_numbers() {
        let err = parse_script("frame 1:0,0\n\nfrob\n").unwrap_err();
        assert_eq!(err, ScriptError::UnknownCommand { line: 3, word: "frob".into() });
        assert!(err.to_string().starts_with("line 3"));
    }

    #[test]
    fn malformed_touches_rejected() {
        assert!(matches!(parse_line(4, "frame 1:0"), Err(ScriptError::BadTouch { line: 4, .. })));
        assert!(matches!(parse_line(4, "frame x:1,2"), Err(ScriptError::BadTouch { .. })));
        assert!(matches!(parse_line(4, "frame 1:nan,2"), Err(ScriptError::BadTouch { .. })));
        assert_eq!(
            parse_line(5, "frame 1:0,0 1:5,5"),
            Err(ScriptError::DuplicateTouch { line: 5, id: 1 })
        );
    }

    #[test]
    fn durations_validated() {
        assert!(matches!(parse_line(2, "wait"), Err(ScriptError::MissingDuration { line: 2, .. })));
        assert!(matches!(parse_line(2, "add soon"), Err(ScriptError::BadDuration { .. })));
        assert!(matches!(parse_line(2, "wait -5"), Err(ScriptError::BadDuration { .. })));
    }

    #[test]
    fn scripted_source_replays_then_quits() {
        let src = ScriptedTouchSource::parse("add\nframe 1:0,0\n").unwrap();
        let rx = spawn_touch_source(src);
        let got: Vec<InputEvent> = rx.iter().collect();
        assert_eq!(
            got,
            vec![
                InputEvent::BeginAdd(None),
                InputEvent::Frame(vec![TouchPoint::new(1, 0.0, 0.0)]),
                InputEvent::Quit,
            ]
        );
    }

    #[test]
    fn line_source_skips_bad_lines() {
        let text = "frame 1:0,0\nnonsense\nwait 10\n";
        let rx = spawn_touch_source(LineTouchSource::new(Cursor::new(text.to_string())));
        let got: Vec<InputEvent> = rx.iter().collect();
        assert_eq!(got.len(), 3);
        assert_eq!(got[1], InputEvent::Wait(10));
        assert_eq!(got[2], InputEvent::Quit);
    }
}
