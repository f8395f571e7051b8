//! Replay source for per-frame eye ratios
//!
//! One JSON object per line, as written by the vision pipeline:
//!
//! ```text
//! {"left": 31.2, "right": 29.8, "t": 0.033}
//! {"face": false, "t": 0.066}
//! ```
//!
//! `t` (seconds since the first frame) drives virtual time when present,
//! otherwise frames are stamped on arrival. The first frame fixes the mode:
//! a later line that mixes the two is rejected. Blank lines and lines
//! starting with `#` are skipped.

use dms::EyeRatios;
use serde::Deserialize;
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};

/// Errors reading frames
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed frame on line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

/// One frame as seen by the decision loop
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    /// `None` when no face was detected
    pub ratios: Option<EyeRatios>,
    pub timestamp: Instant,
}

#[derive(Debug, Deserialize)]
struct FrameRecord {
    #[serde(default = "face_present")]
    face: bool,
    left: Option<f64>,
    right: Option<f64>,
    t: Option<f64>,
}

fn face_present() -> bool {
    true
}

/// How frames are stamped, fixed by the first frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clock {
    Virtual,
    Wall,
}

/// Reads frames from any line-oriented async reader
pub struct JsonLinesSource<R> {
    lines: Lines<BufReader<R>>,
    start: Instant,
    line_no: usize,
    clock: Option<Clock>,
}

impl JsonLinesSource<tokio::fs::File> {
    pub async fn open(path: &Path) -> Result<Self, SourceError> {
        let file = tokio::fs::File::open(path).await?;
        Ok(Self::new(file))
    }
}

impl JsonLinesSource<tokio::io::Stdin> {
    pub fn stdin() -> Self {
        Self::new(tokio::io::stdin())
    }
}

impl<R: AsyncRead + Unpin> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
            start: Instant::now(),
            line_no: 0,
            clock: None,
        }
    }

    /// Next frame, or `None` at end of input
    pub async fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        while let Some(line) = self.lines.next_line().await? {
            self.line_no += 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            return self.parse(line).map(Some);
        }
        Ok(None)
    }

    fn parse(&mut self, line: &str) -> Result<Frame, SourceError> {
        let record: FrameRecord = serde_json::from_str(line).map_err(|e| SourceError::Parse {
            line: self.line_no,
            reason: e.to_string(),
        })?;

        let clock = if record.t.is_some() { Clock::Virtual } else { Clock::Wall };
        match self.clock {
            Some(expected) if expected != clock => {
                return Err(SourceError::Parse {
                    line: self.line_no,
                    reason: match expected {
                        Clock::Virtual => "missing t after timestamped frames".to_string(),
                        Clock::Wall => "unexpected t after untimed frames".to_string(),
                    },
                });
            }
            _ => {}
        }

        let timestamp = match record.t {
            Some(secs) => {
                let offset = Duration::try_from_secs_f64(secs).map_err(|e| SourceError::Parse {
                    line: self.line_no,
                    reason: format!("invalid t {}: {}", secs, e),
                })?;
                self.start.checked_add(offset).ok_or_else(|| SourceError::Parse {
                    line: self.line_no,
                    reason: format!("t {} out of range", secs),
                })?
            }
            None => Instant::now(),
        };
        self.clock = Some(clock);

        let ratios = match (record.face, record.left, record.right) {
            (true, Some(left), Some(right)) => Some(EyeRatios::new(left, right)),
            _ => None,
        };

        Ok(Frame { ratios, timestamp })
    }
}
