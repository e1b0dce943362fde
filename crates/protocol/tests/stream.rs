//! End-to-end behaviour of the chunk → line → sample → window pipeline.

use cfm_protocol::{LineAssembler, Session, DEFAULT_MAX_LINE_LEN};
use cfm_stats::StatsWindow;

const TRANSCRIPT: &[u8] =
    b"FR:10.5\r\nFR:11\nbogus line\nFR:abc\n\nFR:\xc2\xb5\nFR:12.25\nFR:NaN\nFR:9\nFR:13";

/// Lines from 0 to 11 bytes, one with multi-byte characters, and an
/// unterminated 9-byte tail.
const OVERLONG: &[u8] = b"FR:1\nFR:123456\nFR:\xc2\xb5\xc2\xb5x\nabcdefghijk\n\nFR:22\nFR:333333";

fn assemble(chunks: &[&[u8]]) -> Vec<Result<String, cfm_protocol::DecodeError>> {
    assemble_with(DEFAULT_MAX_LINE_LEN, chunks)
}

fn assemble_with(limit: usize, chunks: &[&[u8]]) -> Vec<Result<String, cfm_protocol::DecodeError>> {
    let mut asm = LineAssembler::new(limit);
    chunks.iter().flat_map(|c| asm.feed(c)).collect()
}

#[test]
fn every_two_way_split_yields_same_lines() {
    let whole = assemble(&[TRANSCRIPT]);
    for cut in 0..=TRANSCRIPT.len() {
        let (a, b) = TRANSCRIPT.split_at(cut);
        assert_eq!(assemble(&[a, b]), whole, "split at {cut}");
    }
}

#[test]
fn every_three_way_split_yields_same_lines() {
    let whole = assemble(&[TRANSCRIPT]);
    for i in 0..=TRANSCRIPT.len() {
        for j in i..=TRANSCRIPT.len() {
            let chunks = [&TRANSCRIPT[..i], &TRANSCRIPT[i..j], &TRANSCRIPT[j..]];
            assert_eq!(assemble(&chunks), whole, "split at {i}/{j}");
        }
    }
}

#[test]
fn three_way_splits_with_small_limits_yield_same_lines() {
    for limit in 1..=10 {
        let whole = assemble_with(limit, &[OVERLONG]);
        assert!(
            whole.iter().any(|l| l.is_err()),
            "limit {limit} should reject something"
        );
        for i in 0..=OVERLONG.len() {
            for j in i..=OVERLONG.len() {
                let chunks = [&OVERLONG[..i], &OVERLONG[i..j], &OVERLONG[j..]];
                assert_eq!(assemble_with(limit, &chunks), whole, "limit {limit}, split at {i}/{j}");
            }
        }
    }
}

#[test]
fn byte_at_a_time_matches_whole() {
    let whole = assemble(&[TRANSCRIPT]);
    let singles: Vec<&[u8]> = TRANSCRIPT.chunks(1).collect();
    assert_eq!(assemble(&singles), whole);
}

#[test]
fn unterminated_tail_is_never_emitted() {
    let lines = assemble(&[TRANSCRIPT]);
    assert!(lines.iter().all(|l| l.as_deref() != Ok("FR:13")));
}

#[test]
fn transcript_produces_expected_window() {
    let mut window = StatsWindow::default();
    let mut session = Session::new("transcript", DEFAULT_MAX_LINE_LEN);

    let mut samples = Vec::new();
    for chunk in TRANSCRIPT.chunks(5) {
        samples.extend(session.feed(chunk, &mut window).unwrap());
    }
    let values: Vec<f64> = samples.iter().map(|s| s.value()).collect();
    assert_eq!(values, vec![10.5, 11.0, 12.25, 9.0]);

    assert_eq!(window.history(), vec![10.5, 11.0, 12.25, 9.0]);
    assert_eq!(window.current(), 9.0);
    assert_eq!(window.maximum(), 12.25);
    assert_eq!(window.minimum(), 9.0);
    assert_eq!(window.average(), 10.6875);

    // Partial "FR:13" dies with the session; history is kept.
    assert_eq!(session.end(), 5);
    assert_eq!(window.len(), 4);
}

#[test]
fn window_survives_reconnect() {
    let mut window = StatsWindow::new(50).unwrap();

    let mut first = Session::new("first", DEFAULT_MAX_LINE_LEN);
    first.feed(b"FR:1\nFR:2\nFR:3", &mut window).unwrap();
    first.end();

    let mut second = Session::new("second", DEFAULT_MAX_LINE_LEN);
    // The "FR:3" fragment must not merge with the new session's first bytes.
    second.feed(b"0\nFR:4\n", &mut window).unwrap();

    assert_eq!(window.history(), vec![1.0, 2.0, 4.0]);
}

#[test]
fn sixty_samples_over_the_wire() {
    let text: String = (1..=60).map(|i| format!("FR:{i}\n")).collect();
    let mut window = StatsWindow::new(50).unwrap();
    let mut session = Session::new("bulk", DEFAULT_MAX_LINE_LEN);
    for chunk in text.as_bytes().chunks(7) {
        session.feed(chunk, &mut window).unwrap();
    }
    assert_eq!(window.len(), 50);
    assert_eq!(window.history().first(), Some(&11.0));
    assert_eq!(window.maximum(), 60.0);
    assert_eq!(window.average(), 35.5);
}
