//! Abstract chain against a local stand-in for Crossref and PubMed Central.

use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::get,
    Json, Router,
};
use scholarwatch_common::models::ABSTRACT_NOT_FOUND;
use scholarwatch_common::sandbox::SandboxClient;
use scholarwatch_ingestion::sources::crossref::CrossRefClient;
use scholarwatch_ingestion::sources::pmc::PmcClient;
use scholarwatch_ingestion::sources::AbstractSource;
use scholarwatch_ingestion::{AbstractOutcome, AbstractResolver};
use serde_json::json;
use std::collections::HashMap;

// DOIs known to the fake services:
//   10.1000/crossref   Crossref has a JATS abstract
//   10.1000/pmc        Crossref 404, PMC has the article
//   10.1000/noabs      Crossref record without abstract, PMC does not know it
//   10.1000/broken     Crossref 500, PMC page lacks an abstract block
//   10.1000/odd#part?v=2  Crossref abstract, reachable only if the DOI is encoded

async fn crossref_work(Path(doi): Path<String>) -> impl IntoResponse {
    match doi.as_str() {
        "10.1000/crossref" => (
            StatusCode::OK,
            Json(json!({ "message": {
                "DOI": doi,
                "abstract": "<jats:sec><jats:title>Abstract</jats:title><jats:p>Graph models <jats:italic>generalise</jats:italic>.</jats:p></jats:sec>"
            }})),
        )
            .into_response(),
        "10.1000/odd#part?v=2" => Json(json!({ "message": {
            "DOI": doi,
            "abstract": "<jats:p>Reserved characters survive.</jats:p>"
        }}))
        .into_response(),
        "10.1000/noabs" => Json(json!({ "message": { "DOI": doi } })).into_response(),
        "10.1000/broken" => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn idconv(Query(params): Query<HashMap<String, String>>) -> Json<serde_json::Value> {
    let ids = params.get("ids").cloned().unwrap_or_default();
    let record = match ids.as_str() {
        "10.1000/pmc" => json!({ "doi": ids, "pmcid": "PMC111" }),
        "10.1000/broken" => json!({ "doi": ids, "pmcid": "PMC222" }),
        _ => json!({ "doi": ids, "errmsg": "invalid article id" }),
    };
    Json(json!({ "status": "ok", "records": [record] }))
}

async fn article_page(Path(pmcid): Path<String>) -> impl IntoResponse {
    match pmcid.as_str() {
        "PMC111" => Html(
            r#"<html><body><section class="abstract"><h2>Abstract</h2><p>Scraped from PMC.</p></section></body></html>"#,
        )
        .into_response(),
        "PMC222" => Html("<html><body><p>No abstract here.</p></body></html>").into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn spawn_fake_services() -> String {
    let app = Router::new()
        .route("/works/{*doi}", get(crossref_work))
        .route("/pmc/utils/idconv/v1.0/", get(idconv))
        .route("/pmc/articles/{pmcid}/", get(article_page));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn resolver(base: &str) -> AbstractResolver {
    let client = SandboxClient::new().unwrap();
    let crossref: Arc<dyn AbstractSource> =
        Arc::new(CrossRefClient::new(client.clone()).with_base_url(base));
    let pmc: Arc<dyn AbstractSource> =
        Arc::new(PmcClient::new(client).with_base_url(&format!("{base}/pmc")));
    AbstractResolver::new(vec![crossref, pmc])
}

#[tokio::test]
async fn crossref_abstract_is_cleaned() {
    let base = spawn_fake_services().await;
    let outcome = resolver(&base).resolve(Some("10.1000/crossref")).await;
    assert_eq!(
        outcome,
        AbstractOutcome::Found("Abstract Graph models generalise.".to_string())
    );
}

#[tokio::test]
async fn falls_back_to_pmc_when_crossref_misses() {
    let base = spawn_fake_services().await;
    let outcome = resolver(&base).resolve(Some("10.1000/pmc")).await;
    assert_eq!(outcome, AbstractOutcome::Found("Abstract Scraped from PMC.".to_string()));
}

#[tokio::test]
async fn crossref_receives_the_whole_doi() {
    let base = spawn_fake_services().await;
    let outcome = resolver(&base).resolve(Some("10.1000/odd#part?v=2")).await;
    assert_eq!(outcome, AbstractOutcome::Found("Reserved characters survive.".to_string()));
}

#[tokio::test]
async fn sentinel_when_every_stage_is_empty() {
    let base = spawn_fake_services().await;
    let resolver = resolver(&base);

    for doi in ["10.1000/noabs", "10.1000/broken", "10.1000/unknown"] {
        let outcome = resolver.resolve(Some(doi)).await;
        assert_eq!(outcome, AbstractOutcome::NotFound, "doi {doi}");
        assert_eq!(outcome.into_text(), ABSTRACT_NOT_FOUND);
    }
}

#[tokio::test]
async fn unreachable_services_do_not_fail_resolution() {
    // Nothing listens on port 9 of the loopback interface.
    let outcome = resolver("http://127.0.0.1:9").resolve(Some("10.1000/crossref")).await;
    assert_eq!(outcome, AbstractOutcome::NotFound);
}
