//! Snapshot aggregation over fragment sequences, sync and async.

use futures::{stream, StreamExt};
use mideast_kaleidoscope::stream::{aggregate, DETAIL_FAILURE_NOTICE};
use mideast_kaleidoscope::{Snapshot, SnapshotStream, Snapshots, StreamStatus};

fn ok(s: &str) -> Result<String, String> {
    Ok(s.to_string())
}

#[test]
fn each_snapshot_carries_the_full_text() {
    let mut seen = Vec::new();
    let out = aggregate(vec![ok("A"), ok("B"), ok("C")], |t| seen.push(t.to_string()));

    assert_eq!(seen, vec!["A", "AB", "ABC"]);
    assert_eq!(out.text, "ABC");
    assert!(out.failure.is_none());
}

#[test]
fn failure_keeps_partial_text() {
    let frags = vec![ok("第一段。"), ok("第二段"), Err("connection reset".to_string()), ok("never")];
    let mut seen = Vec::new();
    let out = aggregate(frags, |t| seen.push(t.to_string()));

    assert_eq!(seen, vec!["第一段。", "第一段。第二段"]);
    assert_eq!(out.text, "第一段。第二段");
    assert_eq!(out.failure.as_deref(), Some("connection reset"));
}

#[test]
fn iterator_adapter_ends_with_one_terminal_snapshot() {
    let snaps: Vec<Snapshot> = Snapshots::new(vec![ok("x"), Err("boom".to_string())].into_iter()).collect();

    assert_eq!(snaps.len(), 2);
    assert_eq!(snaps[0], Snapshot::streaming("x"));
    assert_eq!(snaps[1].status, StreamStatus::Failed("boom".into()));
    assert_eq!(snaps[1].display_text(), format!("x{DETAIL_FAILURE_NOTICE}"));
    assert_eq!(snaps.iter().filter(|s| s.is_terminal()).count(), 1);
}

#[test]
fn empty_sequence_completes_empty() {
    let snaps: Vec<Snapshot> = Snapshots::new(Vec::<Result<String, String>>::new().into_iter()).collect();
    assert_eq!(snaps, vec![Snapshot::completed("")]);
}

#[tokio::test]
async fn stream_adapter_matches_iterator_adapter() {
    let frags = vec![ok("阿曼"), ok(""), ok("新闻"), ok("。")];
    let expected: Vec<Snapshot> = Snapshots::new(frags.clone().into_iter()).collect();

    let got: Vec<Snapshot> = SnapshotStream::new(stream::iter(frags)).collect().await;
    assert_eq!(got, expected);
    assert_eq!(got.last(), Some(&Snapshot::completed("阿曼新闻。")));
}
