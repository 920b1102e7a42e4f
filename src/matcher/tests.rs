//! End-to-end tests for the automaton lifecycle: build, finalize, stream,
//! remove, rebuild.

use proptest::prelude::*;

use crate::{Added, ScanError, ScanOutcome, ScanSession, Scanner};

/// Scan `text` in one call, flattening every report into (end offset, rep)
/// pairs in callback order.
fn one_shot(scanner: &Scanner<u16>, text: &[u8]) -> Vec<(u64, u16)> {
    let mut session = ScanSession::new();
    collect(scanner, &mut session, text)
}

fn collect(scanner: &Scanner<u16>, session: &mut ScanSession, chunk: &[u8]) -> Vec<(u64, u16)> {
    let mut out = Vec::new();
    scanner
        .scan(session, chunk, |m| {
            out.extend(m.patterns.iter().map(|p| (m.position, *p.rep())));
            false
        })
        .unwrap();
    out
}

/// Reference implementation: every occurrence of every pattern, reported by
/// end offset, as sorted (position, rep) pairs.
fn naive(patterns: &[(Vec<u8>, u16)], text: &[u8]) -> Vec<(u64, u16)> {
    let mut out = Vec::new();
    for (bytes, rep) in patterns {
        for end in bytes.len()..=text.len() {
            if &text[end - bytes.len()..end] == bytes.as_slice() {
                out.push((end as u64, *rep));
            }
        }
    }
    out.sort_unstable();
    out
}

fn sorted(mut reports: Vec<(u64, u16)>) -> Vec<(u64, u16)> {
    reports.sort_unstable();
    reports
}

#[test]
fn test_concatenation_reports_every_pattern_once() {
    let patterns: [(&[u8], u16); 3] = [(b"dns", 53), (b"http", 80), (b"tls", 443)];
    let mut s = Scanner::new();
    for (bytes, rep) in patterns {
        s.add_pattern(bytes, rep).unwrap();
    }
    s.finalize();

    let text = b"dnshttptls";
    let got = one_shot(&s, text);
    assert_eq!(got, vec![(3, 53), (7, 80), (10, 443)]);
}

#[test]
fn test_overlapping_suffix_patterns_ushers() {
    let mut s = Scanner::new();
    s.add_pattern(b"he", 1).unwrap();
    s.add_pattern(b"she", 2).unwrap();
    s.add_pattern(b"hers", 3).unwrap();
    s.finalize();

    let mut session = ScanSession::new();
    let mut per_position: Vec<(u64, Vec<&[u8]>)> = Vec::new();
    s.scan(&mut session, b"ushers", |m| {
        per_position.push((m.position, m.patterns.iter().map(|p| p.bytes()).collect()));
        false
    })
    .unwrap();

    assert_eq!(per_position.len(), 2);

    let (pos, ref at4) = per_position[0];
    assert_eq!(pos, 4);
    assert!(at4.contains(&b"she".as_slice()));
    assert!(at4.contains(&b"he".as_slice()));
    assert_eq!(at4.len(), 2, "both suffix patterns, no deduplication");

    assert_eq!(per_position[1], (6, vec![b"hers".as_slice()]));
}

#[test]
fn test_streaming_equivalence_every_split() {
    let mut s = Scanner::new();
    s.add_pattern(b"he", 1).unwrap();
    s.add_pattern(b"she", 2).unwrap();
    s.add_pattern(b"hers", 3).unwrap();
    s.finalize();

    let text = b"usherssheshe";
    let expected = one_shot(&s, text);

    for split in 0..=text.len() {
        let mut session = ScanSession::new();
        let mut got = collect(&s, &mut session, &text[..split]);
        got.extend(collect(&s, &mut session, &text[split..]));
        assert_eq!(got, expected, "split at {split}");
    }

    // byte-at-a-time delivery
    let mut session = ScanSession::new();
    let mut got = Vec::new();
    for i in 0..text.len() {
        got.extend(collect(&s, &mut session, &text[i..i + 1]));
    }
    assert_eq!(got, expected);
}

#[test]
fn test_reset_reproduces_fresh_scan() {
    let mut s = Scanner::new();
    s.add_pattern(b"smtp", 25).unwrap();
    s.add_pattern(b"imap", 143).unwrap();
    s.finalize();

    let text = b"smtp imap smtp";
    let first = one_shot(&s, text);

    let mut session = ScanSession::new();
    collect(&s, &mut session, b"some unrelated stream smt");
    session.reset();
    assert_eq!(collect(&s, &mut session, text), first);
}

#[test]
fn test_duplicate_insert_keeps_first_registration() {
    let mut s = Scanner::new();
    assert!(s.add_pattern(b"radius", 1812).unwrap().is_new());
    assert_eq!(
        s.add_pattern(b"radius", 9999).unwrap(),
        Added::Duplicate(1812)
    );
    assert_eq!(s.pattern_count(), 1);

    s.finalize();
    assert_eq!(one_shot(&s, b"radius"), vec![(6, 1812)]);
}

#[test]
fn test_deletion_round_trip() {
    let mut s = Scanner::new();
    s.add_pattern(b"ssl", 10).unwrap();
    s.add_pattern(b"ssh", 11).unwrap();
    s.finalize();

    assert_eq!(one_shot(&s, b"xssly"), vec![(4, 10)]);

    s.reopen();
    assert_eq!(s.remove_pattern(b"ssl").unwrap(), 10);
    s.finalize();

    assert!(one_shot(&s, b"xssly").is_empty());
    assert_eq!(one_shot(&s, b"xsshy"), vec![(4, 11)]);

    // the surviving branch is untouched by a later insert as well
    s.reopen();
    s.add_pattern(b"ssl", 12).unwrap();
    s.finalize();
    assert_eq!(one_shot(&s, b"xssly"), vec![(4, 12)]);
    assert_eq!(one_shot(&s, b"xsshy"), vec![(4, 11)]);
}

#[test]
fn test_scan_open_automaton_is_an_error() {
    let mut s: Scanner<u16> = Scanner::new();
    s.add_pattern(b"ftp", 21).unwrap();

    let mut session = ScanSession::new();
    let mut called = false;
    assert_eq!(
        s.scan(&mut session, b"ftp", |_| {
            called = true;
            false
        }),
        Err(ScanError::Open)
    );
    assert!(!called);

    // still an error after a reopen mid-lifecycle
    s.finalize();
    s.reopen();
    assert_eq!(
        s.scan(&mut session, b"ftp", |_| false),
        Err(ScanError::Open)
    );
}

#[test]
fn test_early_stop_outcome() {
    let mut s = Scanner::new();
    s.add_pattern(b"a", 1).unwrap();
    s.finalize();

    let mut session = ScanSession::new();
    let outcome = s.scan(&mut session, b"aaa", |_| true).unwrap();
    assert_eq!(outcome, ScanOutcome::Stopped);
}

#[test]
fn test_matches_against_naive_reference() {
    let patterns: Vec<(Vec<u8>, u16)> = vec![
        (b"ab".to_vec(), 1),
        (b"babc".to_vec(), 2),
        (b"c".to_vec(), 3),
        (b"abca".to_vec(), 4),
    ];
    let mut s = Scanner::new();
    for (bytes, rep) in &patterns {
        s.add_pattern(bytes, *rep).unwrap();
    }
    s.finalize();

    let text = b"ababcabcac";
    assert_eq!(sorted(one_shot(&s, text)), naive(&patterns, text));
}

proptest! {
    /// Chunked delivery at any split point reports exactly what a single
    /// call over the whole text reports, and both agree with a naive
    /// per-pattern occurrence scan.
    #[test]
    fn prop_streaming_matches_one_shot(
        raw_patterns in prop::collection::vec(prop::collection::vec(0u8..4, 1..5), 1..8),
        text in prop::collection::vec(0u8..4, 0..64),
        split in 0usize..=64,
    ) {
        let mut s = Scanner::new();
        let mut registered: Vec<(Vec<u8>, u16)> = Vec::new();
        for (i, bytes) in raw_patterns.iter().enumerate() {
            if s.add_pattern(bytes, i as u16).unwrap().is_new() {
                registered.push((bytes.clone(), i as u16));
            }
        }
        s.finalize();

        let expected = one_shot(&s, &text);
        prop_assert_eq!(sorted(expected.clone()), naive(&registered, &text));

        let split = split.min(text.len());
        let mut session = ScanSession::new();
        let mut chunked = collect(&s, &mut session, &text[..split]);
        chunked.extend(collect(&s, &mut session, &text[split..]));
        prop_assert_eq!(chunked, expected);
    }
}
