//! Search, then resolve each hit's abstract into a full `Article`.

use scholarwatch_common::models::Article;
use tracing::{info, instrument};

use crate::abstracts::AbstractResolver;
use crate::models::{SearchHit, SearchRequest};
use crate::sources::LiteratureSearch;

/// Run one search and build articles in result order.
///
/// Search failures propagate; abstract lookups never fail.
#[instrument(skip(search, resolver), fields(source = search.name()))]
pub async fn fetch_articles(
    search: &dyn LiteratureSearch,
    resolver: &AbstractResolver,
    request: &SearchRequest,
) -> anyhow::Result<Vec<Article>> {
    let hits = search.search(request).await?;

    let mut articles = Vec::with_capacity(hits.len());
    let mut with_abstract = 0usize;
    for hit in hits {
        let outcome = resolver.resolve(hit.doi.as_deref()).await;
        if outcome.is_found() {
            with_abstract += 1;
        }
        articles.push(into_article(hit, outcome.into_text()));
    }

    info!(n = articles.len(), with_abstract, "Articles assembled");
    Ok(articles)
}

fn into_article(hit: SearchHit, abstract_text: String) -> Article {
    Article {
        title: hit.title,
        authors: hit.authors,
        abstract_text,
        doi: hit.doi,
        publication_date: hit.publication_date,
        source: hit.source,
    }
}
