//! Web of Science advanced-search query builder.
//!
//! Topics become `TS=("...")` field searches joined with `OR`, and the whole
//! disjunction is narrowed by a publication-year filter derived from the
//! lookback window:
//!
//! ```text
//! (TS=("machine learning") OR TS=("deep learning")) AND PY=2026
//! ```

use chrono::{Datelike, Duration, NaiveDate};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("no search topics configured")]
    NoTopics,
    #[error("topic #{0} is blank")]
    BlankTopic(usize),
    #[error("topic {0:?} contains a double quote, which would break the TS=(\"...\") phrase")]
    QuoteInTopic(String),
    #[error("lookback window must be at least one day")]
    ZeroLookback,
}

/// Build the boolean query for `topics` over the last `days_lookback` days,
/// counted back from `today`.
pub fn build_query(
    topics: &[String],
    days_lookback: u32,
    today: NaiveDate,
) -> Result<String, QueryError> {
    validate_topics(topics)?;
    if days_lookback == 0 {
        return Err(QueryError::ZeroLookback);
    }

    let clauses: Vec<String> = topics
        .iter()
        .map(|t| format!("TS=(\"{}\")", t.trim()))
        .collect();

    Ok(format!(
        "({}) AND {}",
        clauses.join(" OR "),
        year_filter(days_lookback, today)
    ))
}

/// Reject topic lists that cannot be embedded verbatim in a quoted phrase.
pub fn validate_topics(topics: &[String]) -> Result<(), QueryError> {
    if topics.is_empty() {
        return Err(QueryError::NoTopics);
    }
    for (i, topic) in topics.iter().enumerate() {
        if topic.trim().is_empty() {
            return Err(QueryError::BlankTopic(i));
        }
        if topic.contains('"') {
            return Err(QueryError::QuoteInTopic(topic.clone()));
        }
    }
    Ok(())
}

/// `PY=<year>` when the window sits in one calendar year, `PY=<from>-<to>` otherwise.
pub fn year_filter(days_lookback: u32, today: NaiveDate) -> String {
    let from = today
        .checked_sub_signed(Duration::days(i64::from(days_lookback)))
        .unwrap_or(NaiveDate::MIN);
    if from.year() == today.year() {
        format!("PY={}", today.year())
    } else {
        format!("PY={}-{}", from.year(), today.year())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn topics(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_topic() {
        let q = build_query(&topics(&["machine learning"]), 1, day(2026, 10, 19)).unwrap();
        assert_eq!(q, "(TS=(\"machine learning\")) AND PY=2026");
    }

    #[test]
    fn test_topics_are_disjoined_and_year_filtered() {
        let t = topics(&["machine learning", "deep learning", "graph neural networks"]);
        let q = build_query(&t, 7, day(2026, 10, 19)).unwrap();
        for topic in &t {
            assert!(q.contains(&format!("TS=(\"{topic}\")")), "missing {topic} in {q}");
        }
        assert_eq!(q.matches(" OR ").count(), 2);
        assert!(q.ends_with(" AND PY=2026"));
        assert!(q.starts_with('('));
    }

    #[test]
    fn test_topic_whitespace_is_trimmed() {
        let q = build_query(&topics(&["  sociology "]), 1, day(2026, 3, 1)).unwrap();
        assert!(q.contains("TS=(\"sociology\")"));
    }

    #[test]
    fn test_window_crossing_new_year_spans_two_years() {
        assert_eq!(year_filter(5, day(2026, 1, 2)), "PY=2025-2026");
        assert_eq!(year_filter(1, day(2026, 1, 2)), "PY=2026");
    }

    #[test]
    fn test_rejects_quotes() {
        let err = build_query(&topics(&["ok", "bad \"topic"]), 1, day(2026, 1, 1)).unwrap_err();
        assert_eq!(err, QueryError::QuoteInTopic("bad \"topic".to_string()));
    }

    #[test]
    fn test_rejects_empty_and_blank() {
        assert_eq!(build_query(&[], 1, day(2026, 1, 1)), Err(QueryError::NoTopics));
        assert_eq!(
            build_query(&topics(&["a", "   "]), 1, day(2026, 1, 1)),
            Err(QueryError::BlankTopic(1))
        );
    }

    #[test]
    fn test_rejects_zero_lookback() {
        assert_eq!(
            build_query(&topics(&["a"]), 0, day(2026, 1, 1)),
            Err(QueryError::ZeroLookback)
        );
    }
}
