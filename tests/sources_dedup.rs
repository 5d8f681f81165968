//! Citation dedup: one entry per uri, first one wins, order kept.

use mideast_kaleidoscope::sources::{DEFAULT_SOURCE_TITLE, DEFAULT_SOURCE_URI};
use mideast_kaleidoscope::{dedup_sources, Source};

fn citations() -> Vec<Source> {
    vec![
        Source::new("Al Jazeera", "https://www.aljazeera.com/news/1"),
        Source::new("Times of Oman", "https://timesofoman.com/a"),
        Source::new("Al Jazeera (live)", "https://www.aljazeera.com/news/1"),
        Source::from_citation(None, None),
        Source::new("Reuters", "https://www.reuters.com/world/"),
        Source::from_citation(Some("  "), Some("")),
    ]
}

#[test]
fn first_occurrence_wins_and_order_is_kept() {
    let out = dedup_sources(citations());
    let uris: Vec<&str> = out.iter().map(|s| s.uri.as_str()).collect();
    assert_eq!(
        uris,
        vec![
            "https://www.aljazeera.com/news/1",
            "https://timesofoman.com/a",
            DEFAULT_SOURCE_URI,
            "https://www.reuters.com/world/",
        ]
    );
    assert_eq!(out[0].title, "Al Jazeera");
    assert_eq!(out[2].title, DEFAULT_SOURCE_TITLE);
}

#[test]
fn dedup_is_idempotent_and_never_grows() {
    let input = citations();
    let once = dedup_sources(input.clone());
    let twice = dedup_sources(once.clone());
    assert!(once.len() <= input.len());
    assert_eq!(once, twice);

    assert!(dedup_sources(Vec::new()).is_empty());
}
