//! Line classification and field extraction
//!
//! Classification is a pure step on its own: [`detect_format`] looks only at
//! the line's shape, never at field validity. Extraction then pulls the
//! normalized [`StatusRecord`] out of the detected format.

use chrono::DateTime;

use super::duration::parse_duration;
use super::LineError;
use crate::devices::CatDevice;
use crate::models::{LineFormat, StatusRecord};

/// Separator between the duration text and the state label in piped lines.
/// Some producers emit it with a trailing space; matching the unspaced form
/// and trimming both halves covers both variants.
const STATE_SEPARATOR: &str = ", Cat state:";

/// Classify a line's wire format without extracting fields
///
/// Returns `None` for lines matching neither format. Blank lines are the
/// caller's concern.
pub fn detect_format(line: &str) -> Option<LineFormat> {
    let line = line.trim();

    if line.starts_with("Port ") && line.contains(" | ") {
        return Some(LineFormat::Piped);
    }

    // Csv lines lead with an ISO-8601 timestamp before the first comma
    let first = line.split(',').next().unwrap_or("");
    if DateTime::parse_from_rfc3339(first.trim()).is_ok() {
        return Some(LineFormat::Csv);
    }

    None
}

/// Parse one raw log line into a normalized record
///
/// Returns `Ok(None)` for blank or whitespace-only lines; these are neither
/// records nor errors.
///
/// # Errors
///
/// Returns a [`LineError`] for unknown ports, malformed durations, missing
/// piped fields, or lines in neither format. Never panics.
pub fn parse_line(line: &str) -> Result<Option<StatusRecord>, LineError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    match detect_format(line) {
        Some(LineFormat::Piped) => parse_piped(line).map(Some),
        Some(LineFormat::Csv) => parse_csv(line).map(Some),
        None => Err(LineError::UnknownFormat),
    }
}

/// Extract a record from a piped line:
/// `Port <port> | ID <id> | Message: <duration>, Cat state: <label>`
fn parse_piped(line: &str) -> Result<StatusRecord, LineError> {
    let mut port: Option<&str> = None;
    let mut id: Option<&str> = None;
    let mut message: Option<&str> = None;

    for part in line.split(" | ") {
        if let Some(rest) = part.strip_prefix("Port ") {
            port = Some(rest.trim());
        } else if let Some(rest) = part.strip_prefix("ID ") {
            id = Some(rest.trim());
        } else if let Some(rest) = part.strip_prefix("Message: ") {
            message = Some(rest.trim());
        }
    }

    let port = port.ok_or(LineError::MissingField { field: "Port" })?;
    let message = message.ok_or(LineError::MissingField { field: "Message" })?;

    let device = resolve_port(port)?;

    // Without the separator the whole message is duration text; a free-text
    // payload then fails the numeric parse below, which is the intended
    // failure mode for malformed messages.
    let (duration_text, state) = match message.split_once(STATE_SEPARATOR) {
        Some((duration, state)) => (duration.trim(), state.trim()),
        None => (message, ""),
    };

    let duration_secs = parse_duration(duration_text)?;

    Ok(StatusRecord {
        device,
        stamp: id.unwrap_or_default().to_string(),
        duration_secs,
        state: state.to_string(),
        format: LineFormat::Piped,
    })
}

/// Extract a record from a legacy csv line:
/// `<ISO timestamp>, <host>:<port>, <freeform state text>`
///
/// Csv records carry no duration field; they parse with zero seconds and
/// contribute only to the raw grouped view.
fn parse_csv(line: &str) -> Result<StatusRecord, LineError> {
    let mut fields = line.splitn(3, ',');
    let stamp = fields.next().unwrap_or("").trim();
    let source = fields.next().ok_or(LineError::MissingField { field: "source" })?.trim();
    let state = fields.next().unwrap_or("").trim();

    let port = source
        .rsplit_once(':')
        .map(|(_, port)| port.trim())
        .ok_or(LineError::MissingField { field: "port" })?;

    let device = resolve_port(port)?;

    Ok(StatusRecord {
        device,
        stamp: stamp.to_string(),
        duration_secs: 0,
        state: state.to_string(),
        format: LineFormat::Csv,
    })
}

/// Map a raw port string to a known device, keeping the raw value on failure
fn resolve_port(port: &str) -> Result<CatDevice, LineError> {
    port.parse::<u16>()
        .ok()
        .and_then(CatDevice::from_port)
        .ok_or_else(|| LineError::UnknownPort {
            port: port.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_piped() {
        let line = "Port 3334 | ID 1729875494654 | Message: 00:03:01, Cat state: Wander Time";
        assert_eq!(detect_format(line), Some(LineFormat::Piped));
    }

    #[test]
    fn test_detect_csv() {
        let line = "2024-10-25T17:38:14.654Z, 192.168.1.102:3333, Nap Time";
        assert_eq!(detect_format(line), Some(LineFormat::Csv));
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect_format("hello world"), None);
        assert_eq!(detect_format("not a date, 10.0.0.1:3333, text"), None);
    }

    #[test]
    fn test_parse_piped_fields() {
        let line = "Port 3334 | ID 1729875494654 | Message: 00:03:01, Cat state: Wander Time";
        let record = parse_line(line).unwrap().unwrap();

        assert_eq!(record.device, CatDevice::Two);
        assert_eq!(record.stamp, "1729875494654");
        assert_eq!(record.duration_secs, 181);
        assert_eq!(record.state, "Wander Time");
        assert_eq!(record.format, LineFormat::Piped);
    }

    #[test]
    fn test_both_separator_variants() {
        let unspaced = "Port 3333 | ID 1 | Message: 0:30, Cat state:Moonwalk Time";
        let spaced = "Port 3333 | ID 1 | Message: 0:30, Cat state: Moonwalk Time";

        for line in [unspaced, spaced] {
            let record = parse_line(line).unwrap().unwrap();
            assert_eq!(record.state, "Moonwalk Time");
            assert_eq!(record.duration_secs, 30);
        }
    }

    #[test]
    fn test_empty_state_label_is_kept() {
        let line = "Port 3333 | ID 1 | Message: 15, Cat state:   ";
        let record = parse_line(line).unwrap().unwrap();
        assert_eq!(record.state, "");
        assert_eq!(record.duration_secs, 15);
    }

    #[test]
    fn test_blank_lines_are_skipped_silently() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   \t ").unwrap(), None);
    }

    #[test]
    fn test_unknown_port_carries_raw_value() {
        let line = "Port 9999 | ID 1 | Message: 00:03:01, Cat state: Wander Time";
        assert_eq!(
            parse_line(line),
            Err(LineError::UnknownPort {
                port: "9999".to_string()
            })
        );
    }

    #[test]
    fn test_bogus_message_is_a_duration_failure() {
        let line = "Port 3334 | ID 1 | Message: bogus";
        assert!(matches!(
            parse_line(line),
            Err(LineError::BadDuration { .. })
        ));
    }

    #[test]
    fn test_piped_without_message_field() {
        let line = "Port 3334 | ID 1";
        assert_eq!(
            parse_line(line),
            Err(LineError::MissingField { field: "Message" })
        );
    }

    #[test]
    fn test_parse_csv_fields() {
        let line = "2024-10-25T17:38:14.654Z, 192.168.1.102:3333, Nap Time";
        let record = parse_line(line).unwrap().unwrap();

        assert_eq!(record.device, CatDevice::One);
        assert_eq!(record.stamp, "2024-10-25T17:38:14.654Z");
        assert_eq!(record.duration_secs, 0);
        assert_eq!(record.state, "Nap Time");
        assert_eq!(record.format, LineFormat::Csv);
    }

    #[test]
    fn test_csv_unknown_port() {
        let line = "2024-10-25T17:38:14.654Z, 192.168.1.102:8080, Nap Time";
        assert_eq!(
            parse_line(line),
            Err(LineError::UnknownPort {
                port: "8080".to_string()
            })
        );
    }

    #[test]
    fn test_unrecognized_format() {
        assert_eq!(parse_line("garbage line"), Err(LineError::UnknownFormat));
    }
}
