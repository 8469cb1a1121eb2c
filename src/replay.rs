//! Recorded pose streams.
//!
//! One JSON object per line:
//!
//! ```text
//! {"timestamp_ms": 0, "landmarks": {"RIGHT_HIP": {"x": 0.5, "y": 0.4, "visibility": 0.9}, ...}}
//! {"timestamp_ms": 33, "landmarks": [{"x": 0.51, "y": 0.2}, ...]}
//! {"timestamp_ms": 66, "landmarks": null}
//! ```
//!
//! `landmarks` is either keyed by body-part name, the estimator's 33-entry
//! positional array, or null when no person was detected.

use std::collections::HashMap;
use std::io::BufRead;
use std::time::Duration;

use serde::Deserialize;
use tracing::warn;

use crate::pose::{BodyPart, Frame, Landmark, PoseResult};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RecordedLandmarks {
    Named(HashMap<BodyPart, Landmark>),
    Indexed(Vec<Landmark>),
}

#[derive(Debug, Deserialize)]
struct RecordedFrame {
    timestamp_ms: u64,
    #[serde(default)]
    landmarks: Option<RecordedLandmarks>,
}

pub fn parse_line(line: &str) -> Result<PoseResult, serde_json::Error> {
    let recorded: RecordedFrame = serde_json::from_str(line)?;
    let timestamp = Duration::from_millis(recorded.timestamp_ms);
    Ok(match recorded.landmarks {
        None => PoseResult::NoDetection { timestamp },
        Some(RecordedLandmarks::Named(landmarks)) => {
            PoseResult::Detected(Frame { landmarks, timestamp })
        }
        Some(RecordedLandmarks::Indexed(landmarks)) => {
            if landmarks.len() != BodyPart::COUNT {
                warn!(
                    got = landmarks.len(),
                    expected = BodyPart::COUNT,
                    timestamp_ms = recorded.timestamp_ms,
                    "unexpected landmark count"
                );
            }
            PoseResult::Detected(Frame::from_indexed(&landmarks, timestamp))
        }
    })
}

/// Parses every non-empty line; malformed lines are logged and skipped.
pub fn read_recording<R: BufRead>(reader: R) -> impl Iterator<Item = std::io::Result<PoseResult>> {
    reader
        .lines()
        .enumerate()
        .filter_map(|(index, line)| match line {
            Err(e) => Some(Err(e)),
            Ok(line) if line.trim().is_empty() => None,
            Ok(line) => match parse_line(&line) {
                Ok(result) => Some(Ok(result)),
                Err(e) => {
                    warn!(line = index + 1, error = %e, "skipping malformed frame");
                    None
                }
            },
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_named() {
        let line = r#"{"timestamp_ms": 40, "landmarks": {"RIGHT_KNEE": {"x": 0.5, "y": 0.6, "visibility": 0.8}}}"#;
        let result = parse_line(line).unwrap();
        let frame = result.frame().unwrap();
        assert_eq!(frame.timestamp, Duration::from_millis(40));
        let knee = frame.get(BodyPart::RightKnee).unwrap();
        assert_eq!(knee.y, 0.6);
        assert_eq!(knee.visibility, Some(0.8));
        assert_eq!(knee.z, None);
    }

    #[test]
    fn test_parse_indexed() {
        let points: Vec<String> = (0..BodyPart::COUNT)
            .map(|i| format!(r#"{{"x": {}, "y": 0.5, "z": -0.1}}"#, i as f32 / 100.0))
            .collect();
        let line = format!(r#"{{"timestamp_ms": 0, "landmarks": [{}]}}"#, points.join(","));
        let result = parse_line(&line).unwrap();
        let frame = result.frame().unwrap();
        assert_eq!(frame.landmarks.len(), BodyPart::COUNT);
        assert!((frame.get(BodyPart::LeftElbow).unwrap().x - 0.13).abs() < 1e-6);
    }

    #[test]
    fn test_parse_no_detection() {
        for line in [r#"{"timestamp_ms": 99, "landmarks": null}"#, r#"{"timestamp_ms": 99}"#] {
            let result = parse_line(line).unwrap();
            assert!(result.frame().is_none());
            assert_eq!(result.timestamp(), Duration::from_millis(99));
        }
    }

    #[test]
    fn test_unknown_part_name_fails() {
        let line = r#"{"timestamp_ms": 0, "landmarks": {"LEFT_ELBOWW": {"x": 0.5, "y": 0.5}}}"#;
        assert!(parse_line(line).is_err());
    }

    #[test]
    fn test_read_recording_skips_bad_lines() {
        let input = "{\"timestamp_ms\": 0}\n\nnot json\n{\"timestamp_ms\": 200, \"landmarks\": null}\n";
        let results: Vec<_> = read_recording(Cursor::new(input))
            .collect::<std::io::Result<_>>()
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1].timestamp(), Duration::from_millis(200));
    }
}
