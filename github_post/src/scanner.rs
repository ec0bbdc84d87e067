//! # Failure Scanner
//!
//! Walks the combined console output of a stress run and yields one
//! [`FailureRecord`] per failed test, in the order the failures appear.
//!
//! The scanner understands `go test -v` output as produced under `stress`:
//!
//! - `=== RUN   TestName` starts a test. `=== CONT` / `=== NAME` switch the current test.
//! - `--- FAIL: TestName (1.23s)` (indented for subtests) opens a failure block.
//!   Lines after it form the failure message until the next header or summary line.
//! - `--- PASS:` / `--- SKIP:` finish a test without a record.
//! - A crash line (`F170517 ...` fatal log, `panic: `, `fatal error: `) while a test
//!   is running opens a failure block for that test.
//! - Package summary lines (`FAIL`, `ok  pkg`, `exit status 1`, stress progress
//!   lines) close the open block.
//!
//! When a failure block carries no text of its own, the message falls back to the
//! most recent lines the test printed before it failed (newer Go versions stream test
//! logs before the `--- FAIL` line). A parent test whose empty block is immediately
//! followed by one of its subtests' failures is not reported separately.
//!
//! The scanner is a pull-based iterator: it reads the input lazily and holds at
//! most one open block. Bytes that are not valid UTF-8 are replaced rather than
//! rejected; only I/O errors end the scan with an error.

use regex::Regex;
use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::sync::OnceLock;

/// Lines kept per running test for the fallback message.
pub const RECENT_OUTPUT_LINES: usize = 100;

/// Upper bound on the bytes captured for a single message. Anything past this
/// would be cut when the report body is rendered anyway.
pub const MAX_CAPTURE_BYTES: usize = 1 << 16;

/// One failed test found in the log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRecord {
    pub package_name: String,
    pub test_name: String,
    pub message: String,
}

#[derive(Debug, PartialEq, Eq)]
enum Line {
    Run(String),
    Cont(String),
    Pause,
    Fail(String),
    Finished(String),
    Crash,
    Summary,
    Output,
}

fn run_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^=== (RUN|CONT|NAME|PAUSE)\s+(\S+)").expect("run header regex must compile")
    })
}

fn result_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*--- (FAIL|PASS|SKIP): (\S+)(?:\s+\(.*\))?\s*$")
            .expect("result header regex must compile")
    })
}

fn crash_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:F\d{6} |panic: |fatal error: )").expect("crash regex must compile")
    })
}

fn summary_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?:PASS|FAIL)\s*$|^ok\s+\S+\s+(?:[\d.]+s|\(cached\)|\[no test files\])|^FAIL\t\S+|^(?:ERROR: )?exit status \d+\s*$|^\d+ runs (?:so far|completed)",
        )
        .expect("summary regex must compile")
    })
}

fn classify(line: &str) -> Line {
    if let Some(caps) = run_re().captures(line) {
        let name = caps[2].to_string();
        return match &caps[1] {
            "RUN" => Line::Run(name),
            "CONT" | "NAME" => Line::Cont(name),
            _ => Line::Pause,
        };
    }
    if let Some(caps) = result_re().captures(line) {
        let name = caps[2].to_string();
        return match &caps[1] {
            "FAIL" => Line::Fail(name),
            _ => Line::Finished(name),
        };
    }
    if crash_re().is_match(line) {
        return Line::Crash;
    }
    if summary_re().is_match(line) {
        return Line::Summary;
    }
    Line::Output
}

#[derive(Debug)]
struct RunningTest {
    name: String,
    recent: VecDeque<String>,
}

#[derive(Debug)]
struct Block {
    test_name: String,
    lines: Vec<String>,
    bytes: usize,
    fallback: Vec<String>,
}

impl Block {
    fn new(test_name: String, fallback: Vec<String>) -> Self {
        Self {
            test_name,
            lines: Vec::new(),
            bytes: 0,
            fallback,
        }
    }

    fn push(&mut self, line: String) {
        if self.bytes >= MAX_CAPTURE_BYTES {
            return;
        }
        self.bytes += line.len() + 1;
        self.lines.push(line);
    }

    fn has_own_text(&self) -> bool {
        self.lines.iter().any(|l| !l.trim().is_empty())
    }

    fn into_message(self) -> String {
        let lines = if self.has_own_text() {
            self.lines
        } else {
            self.fallback
        };
        let mut message = lines.join("\n");
        message.truncate(message.trim_end().len());
        message
    }
}

/// Line-at-a-time scanning state, independent of where lines come from.
#[derive(Debug, Default)]
struct ScanState {
    running: Vec<RunningTest>,
    current: Option<usize>,
    open: Option<Block>,
}

impl ScanState {
    /// Feed one line; returns a finished block if this line closed one.
    fn feed(&mut self, line: String) -> Option<Block> {
        match classify(&line) {
            Line::Run(name) => {
                let closed = self.open.take();
                self.running.push(RunningTest {
                    name,
                    recent: VecDeque::with_capacity(RECENT_OUTPUT_LINES),
                });
                self.current = Some(self.running.len() - 1);
                closed
            }
            Line::Cont(name) => {
                let closed = self.open.take();
                if let Some(idx) = self.position(&name) {
                    self.current = Some(idx);
                }
                closed
            }
            Line::Pause => self.open.take(),
            Line::Fail(name) => {
                let closed = self.open.take().filter(|block| {
                    block.has_own_text() || !is_subtest_of(&name, &block.test_name)
                });
                let fallback = self
                    .finish(&name)
                    .map(|test| test.recent.into_iter().collect())
                    .unwrap_or_default();
                self.open = Some(Block::new(name, fallback));
                closed
            }
            Line::Finished(name) => {
                let closed = self.open.take();
                self.finish(&name);
                closed
            }
            Line::Crash => {
                if let Some(block) = self.open.as_mut() {
                    block.push(line);
                    return None;
                }
                let idx = self.current?;
                let test = self.running.remove(idx);
                self.current = self.running.len().checked_sub(1);
                let mut block = Block::new(test.name, Vec::new());
                block.push(line);
                self.open = Some(block);
                None
            }
            Line::Summary => self.open.take(),
            Line::Output => {
                if let Some(block) = self.open.as_mut() {
                    block.push(line);
                } else if let Some(idx) = self.current
                    && let Some(test) = self.running.get_mut(idx)
                {
                    if test.recent.len() >= RECENT_OUTPUT_LINES {
                        test.recent.pop_front();
                    }
                    test.recent.push_back(line);
                }
                None
            }
        }
    }

    /// End of input: whatever block is still open is returned as captured so far.
    fn finish_input(&mut self) -> Option<Block> {
        self.running.clear();
        self.current = None;
        self.open.take()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.running.iter().rposition(|t| t.name == name)
    }

    fn finish(&mut self, name: &str) -> Option<RunningTest> {
        let idx = self.position(name)?;
        let test = self.running.remove(idx);
        self.current = match self.current {
            Some(cur) if cur == idx => self.running.len().checked_sub(1),
            Some(cur) if cur > idx => Some(cur - 1),
            other => other,
        };
        Some(test)
    }
}

fn is_subtest_of(child: &str, parent: &str) -> bool {
    child
        .strip_prefix(parent)
        .is_some_and(|rest| rest.starts_with('/'))
}

/// Lazy iterator over the failures in a stress log.
///
/// Yields `Err` at most once, for an I/O error on the underlying reader, and then
/// stops.
#[derive(Debug)]
pub struct FailureScanner<R> {
    reader: R,
    package_name: String,
    state: ScanState,
    buf: Vec<u8>,
    done: bool,
}

impl<R: BufRead> FailureScanner<R> {
    pub fn new(reader: R, package_name: impl Into<String>) -> Self {
        Self {
            reader,
            package_name: package_name.into(),
            state: ScanState::default(),
            buf: Vec::new(),
            done: false,
        }
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
        }
        if self.buf.last() == Some(&b'\r') {
            self.buf.pop();
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }

    fn record(&self, block: Block) -> FailureRecord {
        FailureRecord {
            package_name: self.package_name.clone(),
            test_name: block.test_name.clone(),
            message: block.into_message(),
        }
    }
}

impl<R: BufRead> Iterator for FailureScanner<R> {
    type Item = io::Result<FailureRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            match self.read_line() {
                Ok(Some(line)) => {
                    if let Some(block) = self.state.feed(line) {
                        return Some(Ok(self.record(block)));
                    }
                }
                Ok(None) => {
                    self.done = true;
                    return self.state.finish_input().map(|b| Ok(self.record(b)));
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

/// Scan `reader` for failures of tests in `package_name`.
pub fn scan<R: BufRead>(reader: R, package_name: impl Into<String>) -> FailureScanner<R> {
    FailureScanner::new(reader, package_name)
}
