//! Regional cache: wholesale replacement and single-article body patches.

use chrono::Utc;
use mideast_kaleidoscope::parse::parse_batch;
use mideast_kaleidoscope::{dedup_sources, CacheEntry, RegionalCache, Source, Topic};

fn entry(topic: Topic) -> CacheEntry {
    let text = "\
START_ARTICLE
CATEGORY: 政治
TITLE: 第一条
SUMMARY: 摘要一
END_ARTICLE
START_ARTICLE
CATEGORY: 经济
TITLE: 第二条
SUMMARY: 摘要二
END_ARTICLE";
    let parsed = parse_batch(topic, text);
    CacheEntry {
        articles: parsed.articles,
        sources: dedup_sources(vec![Source::new("WAM", "https://wam.ae/x")]),
        categories: parsed.categories,
        timestamp: Utc::now(),
    }
}

#[test]
fn patch_without_entry_is_noop() {
    let mut cache = RegionalCache::new();
    assert!(!cache.patch_article_content(Topic::Gulf, "news-海湾地区-0", "正文"));
    assert!(cache.is_empty());
    assert!(!cache.contains(Topic::Gulf));
}

#[test]
fn patch_touches_only_the_target_article() {
    let mut cache = RegionalCache::new();
    let before = entry(Topic::Gulf);
    cache.put(Topic::Gulf, before.clone());

    assert!(cache.patch_article_content(Topic::Gulf, "news-海湾地区-1", "完整正文"));

    let after = cache.get(Topic::Gulf).expect("entry");
    assert_eq!(after.articles[1].content.as_deref(), Some("完整正文"));
    assert_eq!(after.articles[1].title, before.articles[1].title);
    assert_eq!(after.articles[0], before.articles[0]);
    assert_eq!(after.sources, before.sources);
    assert_eq!(after.categories, before.categories);
    assert_eq!(after.timestamp, before.timestamp);
}

#[test]
fn unknown_id_or_other_topic_is_noop() {
    let mut cache = RegionalCache::new();
    let e = entry(Topic::Gulf);
    cache.put(Topic::Gulf, e.clone());

    assert!(!cache.patch_article_content(Topic::Gulf, "news-海湾地区-9", "x"));
    assert!(!cache.patch_article_content(Topic::Iran, "news-海湾地区-0", "x"));
    assert_eq!(cache.get(Topic::Gulf), Some(&e));
}

#[test]
fn put_replaces_wholesale_and_find_article_searches_all_topics() {
    let mut cache = RegionalCache::new();
    cache.put(Topic::Gulf, entry(Topic::Gulf));
    cache.patch_article_content(Topic::Gulf, "news-海湾地区-0", "旧正文");

    let previous = cache.put(Topic::Gulf, entry(Topic::Gulf)).expect("previous entry");
    assert!(previous.articles[0].has_content());
    assert!(cache.get(Topic::Gulf).unwrap().articles[0].content.is_none());

    cache.put(Topic::China, entry(Topic::China));
    assert_eq!(cache.len(), 2);
    let (topic, article) = cache.find_article("news-中国-1").expect("found");
    assert_eq!(topic, Topic::China);
    assert_eq!(article.title, "第二条");
}
