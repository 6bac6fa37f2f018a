//! Log line codec tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use chrono::NaiveDate;

use reqlog_core::record::{decode, encode, set_query_count, LogRecord};

mod vector_loader;

fn record() -> LogRecord {
    let ts = NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(9, 5, 7)
        .unwrap();
    LogRecord::new(ts, 512, 0.0321, "POST", "/wp-login.php?x=[1]", "192.0.2.7", "Mozilla/5.0 [compatible]")
}

#[test]
fn line_vectors() {
    for v in vector_loader::load("lines.json") {
        let got = decode(&v.line);

        let Some(ex) = v.expect else {
            assert!(got.is_none(), "vector={} should be skipped", v.description);
            continue;
        };

        let r = got.unwrap_or_else(|| panic!("vector={} should decode", v.description));
        assert_eq!(r.timestamp_raw, ex.timestamp_raw, "vector={}", v.description);
        assert_eq!(r.bytes, ex.bytes, "vector={}", v.description);
        assert_eq!(r.elapsed_seconds, ex.elapsed_seconds, "vector={}", v.description);
        assert_eq!(r.query_count, ex.query_count, "vector={}", v.description);
        assert_eq!(r.method, ex.method, "vector={}", v.description);
        assert_eq!(r.uri, ex.uri, "vector={}", v.description);
        assert_eq!(r.ip, ex.ip, "vector={}", v.description);
        assert_eq!(r.user_agent, ex.user_agent, "vector={}", v.description);
    }
}

#[test]
fn encode_uses_fixed_width_columns() {
    let line = encode(&record());
    assert_eq!(
        line,
        "[2024-05-01 09:05:07] [bytes:   512] [time:  0.0321][queries:  0] [method:POST] \
         [uri:/wp-login.php?x=[1]] [ip:192.0.2.7] [user-agent:Mozilla/5.0 [compatible]]\n"
    );

    let mut get = record();
    get.method = "GET".into();
    assert!(encode(&get).contains("[method:GET ]"));
}

#[test]
fn decode_reverses_encode() {
    let r = record();
    let back = decode(&encode(&r)).expect("round trip");
    assert_eq!(back, r);
    assert_eq!(back.timestamp_raw, "2024-05-01 09:05:07");
}

#[test]
fn newlines_in_fields_stay_on_one_line() {
    let mut r = record();
    r.user_agent = "evil\nagent\r".into();
    let line = encode(&r);
    assert_eq!(line.matches('\n').count(), 1);
    assert_eq!(decode(&line).unwrap().user_agent, "evil agent");
}

#[test]
fn set_query_count_touches_only_queries_field() {
    let line = encode(&record());
    let patched = set_query_count(&line, 37);

    assert_eq!(patched, line.replace("[queries:  0]", "[queries: 37]"));
    let r = decode(&patched).unwrap();
    assert_eq!(r.query_count, 37);
    assert_eq!(r.elapsed_seconds, 0.0321);
    assert_eq!(r.bytes, 512);
}

#[test]
fn set_query_count_ignores_lookalike_in_uri() {
    let mut r = record();
    r.uri = "/search?q=[queries:  9]".into();
    let patched = set_query_count(&encode(&r), 5);
    let back = decode(&patched).unwrap();
    assert_eq!(back.query_count, 5);
    assert_eq!(back.uri, "/search?q=[queries:  9]");
}

#[test]
fn parse_all_skips_malformed_lines_and_keeps_going() {
    let dir = tempfile::tempdir().unwrap();
    let store = reqlog_core::store::LogStore::new(dir.path().join("request-logs.log"));

    let good = encode(&record());
    let no_uri = good.replace("[uri:/wp-login.php?x=[1]] ", "");
    store.append(&good).unwrap();
    store.append(&no_uri).unwrap();
    store.append(&good).unwrap();

    let parsed: Vec<_> = reqlog_core::record::parse_all(&store).unwrap().collect();
    assert_eq!(parsed.len(), 2);
    assert!(parsed.iter().all(|r| *r == record()));

    // Restartable: a second pass re-reads from scratch.
    assert_eq!(reqlog_core::record::parse_all(&store).unwrap().count(), 2);
}

#[test]
fn parse_all_skips_non_utf8_lines() {
    use std::io::Write;

    let dir = tempfile::tempdir().unwrap();
    let store = reqlog_core::store::LogStore::new(dir.path().join("request-logs.log"));

    let mut a = record();
    a.uri = "/a".into();
    let mut b = record();
    b.uri = "/b".into();

    store.append(&encode(&a)).unwrap();
    {
        let mut f = std::fs::OpenOptions::new().append(true).open(store.path()).unwrap();
        f.write_all(b"\xff\xfe garbage\n").unwrap();
    }
    let hb = store.append(&encode(&b)).unwrap();
    assert!(store.patch(hb, |l| set_query_count(l, 4)).unwrap());

    let uris: Vec<_> = reqlog_core::record::parse_all(&store)
        .unwrap()
        .map(|r| (r.uri, r.query_count))
        .collect();
    assert_eq!(uris, vec![("/a".to_string(), 0), ("/b".to_string(), 4)]);
}
