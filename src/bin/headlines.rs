//! Terminal client: load one region, print the cards, then stream one article body.
//!
//! Usage: `headlines [topic-label] [article-number]` (defaults: 阿曼, 1).

use futures::StreamExt;
use mideast_kaleidoscope::{config, desk_from_config, view, Topic};
use std::io::Write;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().with_target(false).init();

    let mut args = std::env::args().skip(1);
    let topic = args
        .next()
        .map(|l| Topic::from_label_or_default(&l))
        .unwrap_or_default();
    let pick: usize = args.next().and_then(|n| n.parse().ok()).unwrap_or(1);

    let cfg = config::load_default()?;
    let desk = desk_from_config(&cfg)?;
    let feed = desk.select_topic(topic).await;

    match feed.status {
        view::FeedStatus::Failed => {
            println!("{}", feed.error.unwrap_or_default());
            return Ok(());
        }
        view::FeedStatus::Empty => {
            println!("未找到相关新闻");
            return Ok(());
        }
        _ => {}
    }

    println!(
        "== {} · {} 条 · 更新于 {}",
        feed.topic,
        feed.articles.len(),
        feed.last_updated_label.as_deref().unwrap_or("--:--")
    );
    for (i, a) in feed.articles.iter().enumerate() {
        println!(
            "\n[{}] [{}] {}\n    {} · {}\n    {}",
            i + 1,
            a.category,
            a.title,
            a.source.as_deref().unwrap_or(""),
            a.time.as_deref().unwrap_or(""),
            a.summary.replace('\n', "\n    ")
        );
    }
    if !feed.categories.is_empty() {
        let dist: Vec<String> = feed
            .categories
            .iter()
            .map(|c| format!("{} {}", c.name, c.count))
            .collect();
        println!("\n话题分布: {}", dist.join(" / "));
    }
    for s in &feed.sources {
        println!("  ↗ {} ({})", s.title, s.hostname.as_deref().unwrap_or(&s.uri));
    }

    let Some(article) = feed.articles.get(pick.saturating_sub(1)) else {
        return Ok(());
    };
    println!("\n== {}\n{}\n", article.title, article.summary);

    // Snapshots carry the whole body; print only what is new since the last one.
    let handle = desk.read_more(&article.id)?;
    let mut shown = 0usize;
    let mut updates = Box::pin(handle.into_stream());
    let mut stdout = std::io::stdout();
    while let Some(snap) = updates.next().await {
        if let Some(delta) = snap.text.get(shown..) {
            print!("{delta}");
            shown = snap.text.len();
        }
        if snap.is_failed() {
            print!("{}", mideast_kaleidoscope::stream::DETAIL_FAILURE_NOTICE);
        }
        stdout.flush()?;
    }
    println!("\n\n{}", view::GENERATED_NOTE);
    Ok(())
}
