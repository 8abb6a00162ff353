// ── Rules file ──
//
// One rule per line, four colon-separated fields:
//
//     srcClient:srcPort:dstClient:dstPort
//
// `\:` is a literal colon inside a field; any other backslash is kept as
// is. Blank lines and lines starting with `#` are skipped. A bad line is
// reported with its line number and skipped; the rest of the file still
// loads.

use std::path::Path;

use thiserror::Error;
use tracing::{debug, warn};

use amidipersist_core::ConnectionRule;

use crate::ConfigError;

const FIELD_COUNT: usize = 4;

// ── Diagnostics ─────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiagnosticKind {
    /// The line was rejected.
    #[error("expected {FIELD_COUNT} colon-separated fields, found {found}; line skipped")]
    TooFewFields { found: usize },

    /// Three fields: accepted with an empty destination port.
    #[error("destination port missing; using an empty port name")]
    MissingDestPort,

    #[error("found {found} fields; everything after the fourth is ignored")]
    ExtraFields { found: usize },
}

/// A problem found on one line of a rules file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}")]
pub struct RuleDiagnostic {
    /// 1-based line number.
    pub line: usize,
    pub kind: DiagnosticKind,
}

impl RuleDiagnostic {
    /// Whether the line produced no rule.
    pub fn is_rejection(&self) -> bool {
        matches!(self.kind, DiagnosticKind::TooFewFields { .. })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRules {
    pub rules: Vec<ConnectionRule>,
    pub diagnostics: Vec<RuleDiagnostic>,
}

impl ParsedRules {
    pub fn rejected(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_rejection()).count()
    }
}

// ── Parsing ─────────────────────────────────────────────────────────

/// Split one line on unescaped colons.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&':') => {
                chars.next();
                current.push(':');
            }
            ':' => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Parse the contents of a rules file.
pub fn parse_rules(text: &str) -> ParsedRules {
    let mut parsed = ParsedRules::default();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.strip_suffix('\r').unwrap_or(raw);
        // Whitespace-only lines count as blank, not as a rule with too few fields.
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let lineno = idx + 1;
        let mut fields = split_fields(line);
        let found = fields.len();

        let kind = match found {
            0..=2 => Some(DiagnosticKind::TooFewFields { found }),
            3 => {
                fields.push(String::new());
                Some(DiagnosticKind::MissingDestPort)
            }
            FIELD_COUNT => None,
            _ => {
                fields.truncate(FIELD_COUNT);
                Some(DiagnosticKind::ExtraFields { found })
            }
        };
        if let Some(kind) = kind {
            parsed.diagnostics.push(RuleDiagnostic { line: lineno, kind });
        }
        let Ok([src_client, src_port, dst_client, dst_port]) =
            <[String; FIELD_COUNT]>::try_from(fields)
        else {
            continue;
        };
        parsed.rules.push(ConnectionRule::from_fields(
            src_client, src_port, dst_client, dst_port,
        ));
    }

    parsed
}

/// Read and parse a rules file, logging every diagnostic.
pub fn load_rules(path: &Path) -> Result<ParsedRules, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let parsed = parse_rules(&text);
    for diag in &parsed.diagnostics {
        warn!(
            path = %path.display(),
            line = diag.line,
            rejected = diag.is_rejection(),
            "{}",
            diag.kind
        );
    }
    debug!(
        path = %path.display(),
        "{} connection request(s) loaded",
        parsed.rules.len()
    );
    Ok(parsed)
}

// ── Formatting ──────────────────────────────────────────────────────

/// Escape the colons in `field` so it survives [`split_fields`].
///
/// A field ending in a backslash cannot be represented: the backslash
/// would escape the following separator.
pub fn escape_field(field: &str) -> String {
    field.replace(':', "\\:")
}

/// Render `rule` as one rules-file line.
pub fn format_rule_line(rule: &ConnectionRule) -> String {
    [
        rule.source.client.as_str(),
        rule.source.port.as_str(),
        rule.dest.client.as_str(),
        rule.dest.port.as_str(),
    ]
    .map(escape_field)
    .join(":")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use amidipersist_core::DeviceName;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn escaped_colon_stays_in_field() {
        assert_eq!(split_fields(r"A:B:C\:D:E"), vec!["A", "B", "C:D", "E"]);
    }

    #[test]
    fn other_backslashes_are_literal() {
        assert_eq!(split_fields(r"A\n:B"), vec![r"A\n", "B"]);
    }

    #[test]
    fn parses_plain_rules() {
        let parsed = parse_rules(
            "KeyStep:KeyStep MIDI 1:FLUID Synth:Synth input port\n\
             Arturia BeatStep:Arturia BeatStep MIDI 1:synth:in\n",
        );

        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.rules.len(), 2);
        assert_eq!(
            parsed.rules[0].source,
            DeviceName::new("KeyStep", "KeyStep MIDI 1")
        );
        assert_eq!(
            parsed.rules[0].dest,
            DeviceName::new("FLUID Synth", "Synth input port")
        );
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let parsed = parse_rules("# studio\n\n   \t\na:b:c:d\n#x:y:z:w\n");
        assert_eq!(parsed.rules.len(), 1);
        assert!(parsed.diagnostics.is_empty());
    }

    #[test]
    fn whitespace_only_lines_are_blank() {
        let parsed = parse_rules(" \n\t\t\n  \r\n");
        assert!(parsed.rules.is_empty());
        assert!(parsed.diagnostics.is_empty());
        assert_eq!(parsed.rejected(), 0);
    }

    #[test]
    fn two_fields_are_rejected_with_line_number() {
        let parsed = parse_rules("a:b:c:d\nonly:two\ne:f:g:h\n");

        assert_eq!(parsed.rules.len(), 2);
        assert_eq!(
            parsed.diagnostics,
            vec![RuleDiagnostic {
                line: 2,
                kind: DiagnosticKind::TooFewFields { found: 2 },
            }]
        );
        assert_eq!(parsed.rejected(), 1);
    }

    #[test]
    fn three_fields_get_an_empty_dest_port() {
        let parsed = parse_rules("a:b:c\n");

        assert_eq!(parsed.rules.len(), 1);
        assert_eq!(parsed.rules[0].dest, DeviceName::new("c", ""));
        assert_eq!(parsed.diagnostics[0].kind, DiagnosticKind::MissingDestPort);
        assert_eq!(parsed.rejected(), 0);
    }

    #[test]
    fn extra_fields_are_ignored() {
        let parsed = parse_rules("a:b:c:d:e:f\n");

        assert_eq!(parsed.rules.len(), 1);
        assert_eq!(parsed.rules[0].dest, DeviceName::new("c", "d"));
        assert_eq!(
            parsed.diagnostics[0].kind,
            DiagnosticKind::ExtraFields { found: 6 }
        );
    }

    #[test]
    fn crlf_line_endings_are_stripped() {
        let parsed = parse_rules("a:b:c:d\r\ne:f:g:h\r");
        assert_eq!(parsed.rules[0].dest.port, "d");
        assert_eq!(parsed.rules[1].dest.port, "h");
    }

    #[test]
    fn diagnostic_display() {
        let diag = RuleDiagnostic {
            line: 7,
            kind: DiagnosticKind::TooFewFields { found: 1 },
        };
        assert_eq!(
            diag.to_string(),
            "line 7: expected 4 colon-separated fields, found 1; line skipped"
        );
    }

    #[test]
    fn formatted_line_parses_back() {
        let rule = ConnectionRule::from_fields("Midi: Through", "Port-0", "a\\b", "c:d:e");
        let line = format_rule_line(&rule);

        assert_eq!(line, r"Midi\: Through:Port-0:a\b:c\:d\:e");
        assert_eq!(parse_rules(&line).rules, vec![rule]);
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# persist these").unwrap();
        writeln!(file, "KeyStep:out:synth:in").unwrap();
        writeln!(file, "broken").unwrap();

        let parsed = load_rules(file.path()).unwrap();
        assert_eq!(parsed.rules.len(), 1);
        assert_eq!(parsed.diagnostics[0].line, 3);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_rules(&dir.path().join("nope.connections")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
