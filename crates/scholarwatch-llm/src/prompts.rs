//! Prompt text for article assessment and review synthesis.

use scholarwatch_common::models::{Article, ArticleSummary, MAX_KEY_POINTS, RELEVANCE_MAX, RELEVANCE_MIN};

/// System prompt for one article. The thesis subject is included verbatim.
pub fn summary_system_prompt(thesis_subject: &str, language: &str) -> String {
    format!(
        "You are an academic research assistant. Assess the article provided by the user \
against the thesis subject below and return:\n\
1. Key points (at most {MAX_KEY_POINTS}, at least one)\n\
2. A relevance score from {RELEVANCE_MIN} to {RELEVANCE_MAX}, where {RELEVANCE_MAX} means the article is central to the thesis\n\
3. The methodology used, if any\n\
4. The theoretical framework, if any\n\n\
Write every text field in {language}. Answer only with JSON matching the requested schema.\n\n\
Thesis subject:\n{thesis}",
        thesis = thesis_subject.trim(),
    )
}

/// User message describing one article.
pub fn format_article(article: &Article) -> String {
    format!(
        "Title: {}\nAuthors: {}\nSource: {}\nPublication Date: {}\nDOI: {}\nAbstract: {}\n",
        article.title,
        article.authors.join(", "),
        article.source,
        article.publication_date,
        article.doi.as_deref().unwrap_or("N/A"),
        article.abstract_text,
    )
}

pub fn review_system_prompt(language: &str) -> String {
    format!(
        "You are an academic writer. From the article summaries provided by the user, write a \
short literature review in {language} that relates the articles to each other. Cite every \
article inline in APA style (Author, Year) and link each citation to its DOI as \
https://doi.org/<doi>. Use Markdown for emphasis, lists and links; do not use HTML. \
Answer only with JSON matching the requested schema."
    )
}

/// Review input: one block per summary, carrying everything a citation needs.
pub fn format_summaries_for_review(summaries: &[ArticleSummary]) -> String {
    summaries
        .iter()
        .enumerate()
        .map(|(i, s)| {
            let mut block = format!(
                "Article {}\nTitle: {}\nAuthors: {}\nYear: {}\nDOI: {}\nRelevance: {}/{}\nKey points:\n",
                i + 1,
                s.title,
                s.authors.join(", "),
                if s.publication_date.is_empty() { "n.d." } else { s.publication_date.as_str() },
                s.doi.as_deref().unwrap_or("N/A"),
                s.relevance_score,
                RELEVANCE_MAX,
            );
            for point in &s.key_points {
                block.push_str("- ");
                block.push_str(point);
                block.push('\n');
            }
            if let Some(m) = &s.methodology {
                block.push_str(&format!("Methodology: {m}\n"));
            }
            if let Some(f) = &s.theoretical_framework {
                block.push_str(&format!("Theoretical framework: {f}\n"));
            }
            block
        })
        .collect::<Vec<_>>()
        .join("\n")
}
