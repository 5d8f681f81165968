// src/prompt.rs
//! Prompt construction for the batch headline query and the per-article
//! detail query. Pure string building; the caller supplies "today".

use chrono::{Datelike, Duration, NaiveDate};

use crate::topic::Topic;

/// Minimum number of stories requested per batch unless configured otherwise.
pub const DEFAULT_MIN_ARTICLES: u32 = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPrompt {
    pub search_context: &'static str,
    pub text: String,
}

/// US long date form, e.g. "October 19, 2026".
pub fn long_date(d: NaiveDate) -> String {
    d.format("%B %-d, %Y").to_string()
}

pub fn batch_prompt(topic: Topic, today: NaiveDate) -> BatchPrompt {
    batch_prompt_with_min(topic, today, DEFAULT_MIN_ARTICLES)
}

pub fn batch_prompt_with_min(topic: Topic, today: NaiveDate, min_articles: u32) -> BatchPrompt {
    let search_context = topic.search_context();
    let yesterday = today - Duration::days(1);
    let today_str = long_date(today);
    let yesterday_str = long_date(yesterday);
    let year = today.year();

    let text = format!(
        r#"TASK: Search for and list the top news stories related to: {search_context}.

CRITICAL TIME FILTER:
- You must ONLY include news published on: {today_str} OR {yesterday_str}.
- CHECK THE YEAR: It MUST be {year}.
- IF a story is from {prev_year} or earlier, DO NOT INCLUDE IT.
- Verify the "published time" in the search results carefully.

Please format your response strictly as follows for each news story:

START_ARTICLE
CATEGORY: [One word category in Chinese e.g. 政治, 经济, 军事, 外交]
TITLE: [The Headline in Chinese]
SOURCE: [Name of the media source e.g. Al Jazeera, Tehran Times, SPA]
TIME: [Time ago or specific date e.g. "2小时前", "今天上午", "Yesterday"]
SUMMARY: [A concise summary in Chinese, approx 50-80 words]
END_ARTICLE

Provide at least {min_articles} distinct, RECENT news stories."#,
        prev_year = year - 1,
    );

    BatchPrompt {
        search_context,
        text,
    }
}

pub fn detail_prompt(title: &str, today: NaiveDate) -> String {
    let date_str = long_date(today);
    format!(
        r#"You are a professional journalist for "Middle East Kaleidoscope" (中东万花筒).
Write a detailed news report in Simplified Chinese (简体中文) about: "{title}".

CRITICAL INSTRUCTIONS:
1. **VERIFY DATE**: Ensure this news actually happened within the last 48 hours (Current Date: {date_str}).
2. **START IMMEDIATELY**: Do NOT output the Title, Source, or Time at the top. Start the first paragraph of the body text immediately.
3. **SINGLE SOURCE**: Base this on reputable media outlets relevant to the Middle East.

Structure:
- Body Paragraphs (300-500 words)

Keep it professional and objective."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn long_date_has_no_zero_padding() {
        assert_eq!(long_date(day(2026, 3, 5)), "March 5, 2026");
    }

    #[test]
    fn yesterday_crosses_year_boundary() {
        let p = batch_prompt(Topic::Iran, day(2027, 1, 1));
        assert!(p.text.contains("January 1, 2027 OR December 31, 2026"));
        assert!(p.text.contains("It MUST be 2027"));
        assert!(p.text.contains("from 2026 or earlier"));
    }
}
