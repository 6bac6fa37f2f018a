//! Fixed-width text line codec (panic-free).
//!
//! Line layout:
//!
//! ```text
//! [2024-05-01 12:00:00] [bytes:   512] [time:  0.0012][queries:  7] [method:POST] [uri:/x] [ip:10.0.0.1] [user-agent:curl/8.0]
//! ```
//!
//! Parsing rules:
//! - Walk the bracket structure with a cursor; never index by byte offset
//!   without a preceding `find`.
//! - `uri` ends at the first `] [ip:`, `ip` at the first `] [user-agent:`,
//!   and `user-agent` at the last `]` of the line.
//! - Anything that does not fit yields `None`.

use chrono::NaiveDateTime;

use super::LogRecord;

/// Timestamp layout used in the first bracket of every line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const QUERIES_TAG: &str = "[queries:";

/// Encode a record as one log line, including the trailing `\n`.
///
/// CR/LF inside string fields are replaced by spaces so the record cannot
/// spill onto a second line.
pub fn encode(record: &LogRecord) -> String {
    format!(
        "[{}] [bytes:{:6}] [time:{:8.4}][queries:{:3}] [method:{:<4}] [uri:{}] [ip:{}] [user-agent:{}]\n",
        record.timestamp.format(TIMESTAMP_FORMAT),
        record.bytes,
        record.elapsed_seconds,
        record.query_count,
        single_line(&record.method),
        single_line(&record.uri),
        single_line(&record.ip),
        single_line(&record.user_agent),
    )
}

/// Decode one log line. Returns `None` for malformed or partial lines.
pub fn decode(line: &str) -> Option<LogRecord> {
    let line = line.trim_end_matches(['\n', '\r']);
    let mut cur = Cursor::new(line);

    cur.eat("[")?;
    let timestamp_raw = cur.until("] [bytes:")?;

    cur.skip_ws();
    let bytes = cur.digits()?.parse().ok()?;
    cur.eat("] [time:")?;

    cur.skip_ws();
    let time = cur.take_while(|c| c.is_ascii_digit() || c == '.');
    let elapsed_seconds: f64 = time.parse().ok()?;
    cur.eat("][queries:")?;

    cur.skip_ws();
    let query_count = cur.digits()?.parse().ok()?;
    cur.eat("] [method:")?;

    cur.skip_ws();
    let method = cur.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
    if method.is_empty() {
        return None;
    }
    cur.skip_ws();
    cur.eat("] [uri:")?;

    let uri = cur.until("] [ip:")?;
    let ip = cur.until("] [user-agent:")?;
    let user_agent = cur.until_last(']')?;

    let timestamp = NaiveDateTime::parse_from_str(timestamp_raw, TIMESTAMP_FORMAT).ok()?;

    Some(LogRecord {
        timestamp,
        timestamp_raw: timestamp_raw.to_string(),
        bytes,
        elapsed_seconds,
        query_count,
        method: method.trim().to_string(),
        uri: uri.trim().to_string(),
        ip: ip.trim().to_string(),
        user_agent: user_agent.trim().to_string(),
    })
}

/// Rewrite the `[queries:N]` field of `line` to `count`, leaving every other
/// byte untouched. Lines without a well-formed field are returned unchanged.
pub fn set_query_count(line: &str, count: u64) -> String {
    for (start, _) in line.match_indices(QUERIES_TAG) {
        let after_tag = start + QUERIES_TAG.len();
        let Some(rest) = line.get(after_tag..) else {
            continue;
        };
        let mut cur = Cursor::new(rest);
        cur.skip_ws();
        if cur.digits().is_none() || cur.eat("]").is_none() {
            continue;
        }
        let end = line.len() - cur.rest.len();
        return format!(
            "{}[queries:{:3}]{}",
            &line[..start],
            count,
            &line[end..]
        );
    }
    line.to_string()
}

fn single_line(s: &str) -> String {
    s.replace(['\r', '\n'], " ")
}

/// Forward-only view over the unparsed remainder of a line.
struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(s: &'a str) -> Self {
        Self { rest: s }
    }

    /// Consume an exact literal.
    fn eat(&mut self, lit: &str) -> Option<()> {
        self.rest = self.rest.strip_prefix(lit)?;
        Some(())
    }

    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let end = self
            .rest
            .char_indices()
            .find(|&(_, c)| !pred(c))
            .map_or(self.rest.len(), |(i, _)| i);
        let (head, tail) = self.rest.split_at(end);
        self.rest = tail;
        head
    }

    /// One or more ASCII digits.
    fn digits(&mut self) -> Option<&'a str> {
        let d = self.take_while(|c| c.is_ascii_digit());
        (!d.is_empty()).then_some(d)
    }

    /// Text up to the first `delim`; the cursor moves past the delimiter.
    fn until(&mut self, delim: &str) -> Option<&'a str> {
        let (head, tail) = self.rest.split_once(delim)?;
        self.rest = tail;
        Some(head)
    }

    /// Text up to the last `delim`; the cursor moves past it.
    fn until_last(&mut self, delim: char) -> Option<&'a str> {
        let (head, tail) = self.rest.rsplit_once(delim)?;
        self.rest = tail;
        Some(head)
    }
}
