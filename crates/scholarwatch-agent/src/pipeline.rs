//! One digest run: search → abstracts → summaries → review → render → mail.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use scholarwatch_common::models::{DailyDigest, REVIEW_UNAVAILABLE};
use scholarwatch_common::sandbox::SandboxClient;
use scholarwatch_common::WatchError;
use scholarwatch_digest::{DigestMailer, DigestRenderer, SmtpMailer};
use scholarwatch_ingestion::sources::wos::WosClient;
use scholarwatch_ingestion::sources::LiteratureSearch;
use scholarwatch_ingestion::{build_query, fetch_articles, AbstractResolver, SearchRequest};
use scholarwatch_llm::backend::{LlmBackend, OllamaBackend, OpenAiBackend};
use scholarwatch_llm::prompts::format_summaries_for_review;
use scholarwatch_llm::{LlmSummarizer, Summarizer};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::{Config, Provider};

/// Per-run settings taken from the configuration.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub topics: Vec<String>,
    pub days_lookback: u32,
    pub max_results: usize,
    pub thesis_path: PathBuf,
    pub temp_dir: PathBuf,
    pub recipient: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub fetched: usize,
    pub summarized: usize,
    pub failed: usize,
    pub saved_to: Option<PathBuf>,
    pub emailed: bool,
}

pub struct DigestPipeline {
    search: Arc<dyn LiteratureSearch>,
    resolver: AbstractResolver,
    summarizer: Arc<dyn Summarizer>,
    renderer: DigestRenderer,
    /// `None` in dry-run mode.
    mailer: Option<Arc<dyn DigestMailer>>,
    settings: RunSettings,
}

impl DigestPipeline {
    pub fn new(
        search: Arc<dyn LiteratureSearch>,
        resolver: AbstractResolver,
        summarizer: Arc<dyn Summarizer>,
        renderer: DigestRenderer,
        mailer: Option<Arc<dyn DigestMailer>>,
        settings: RunSettings,
    ) -> Self {
        Self { search, resolver, summarizer, renderer, mailer, settings }
    }

    /// Wire the production components. Expects a validated config.
    pub fn from_config(config: &Config, dry_run: bool) -> Result<Self, WatchError> {
        let mut client = SandboxClient::new()?;

        let wos_key = config.api.wos_key.clone()
            .ok_or_else(|| WatchError::Config("api.wos_key is not set".to_string()))?;
        let search = Arc::new(WosClient::new(client.clone(), wos_key));

        let backend: Arc<dyn LlmBackend> = match config.llm.provider()? {
            Provider::OpenAi => {
                let key = config.api.openai_key.clone()
                    .ok_or_else(|| WatchError::Config("api.openai_key is not set".to_string()))?;
                Arc::new(OpenAiBackend::new(client.clone(), key, config.llm.openai_model.clone()))
            }
            Provider::Ollama => {
                // A remote Ollama host named in the config is trusted explicitly.
                if let Some(host) = url::Url::parse(&config.llm.ollama_url)
                    .ok()
                    .and_then(|u| u.host_str().map(String::from))
                {
                    client.allow_domain(&host);
                }
                Arc::new(OllamaBackend::new(
                    client.clone(),
                    config.llm.ollama_url.clone(),
                    config.llm.ollama_model.clone(),
                ))
            }
        };
        info!(model = backend.model_id(), local = backend.is_local(), "LLM backend selected");
        let summarizer = Arc::new(LlmSummarizer::new(backend, config.llm.language.clone()));

        let mailer: Option<Arc<dyn DigestMailer>> = if dry_run {
            info!("Dry run: digests will be rendered and saved but not emailed");
            None
        } else {
            let password = config.email.sender_password.as_ref().ok_or_else(|| {
                WatchError::Config("email.sender_password is not set (or SCHOLARWATCH_SMTP_PASSWORD)".to_string())
            })?;
            Some(Arc::new(SmtpMailer::new(
                &config.email.smtp_server,
                config.email.smtp_port,
                &config.email.sender_email,
                password,
            )?))
        };

        let settings = RunSettings {
            topics: config.search.topics.clone(),
            days_lookback: config.search.days_lookback,
            max_results: config.search.max_results,
            thesis_path: config.system.thesis_path.clone(),
            temp_dir: config.system.temp_dir.clone(),
            recipient: config.email.recipient_email.clone(),
        };

        Ok(Self::new(
            search,
            AbstractResolver::default_chain(client),
            summarizer,
            DigestRenderer::new()?,
            mailer,
            settings,
        ))
    }

    /// Execute one run for `today`. Errors are fatal to this run only.
    pub async fn run(&self, today: NaiveDate) -> Result<RunReport, WatchError> {
        let span = info_span!("digest_run", run_id = %Uuid::new_v4(), date = %today);
        async {
            info!("Starting daily digest run");
            let result = self.run_inner(today).await;
            match &result {
                Ok(report) => info!(
                    fetched = report.fetched,
                    summarized = report.summarized,
                    failed = report.failed,
                    emailed = report.emailed,
                    "Digest run finished"
                ),
                Err(e) => error!(error = %e, "Digest run failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_inner(&self, today: NaiveDate) -> Result<RunReport, WatchError> {
        let s = &self.settings;
        let query = build_query(&s.topics, s.days_lookback, today)
            .map_err(|e| WatchError::Query(e.to_string()))?;
        let request = SearchRequest { query, max_results: s.max_results };

        let articles = fetch_articles(self.search.as_ref(), &self.resolver, &request)
            .await
            .map_err(WatchError::Search)?;
        info!(n = articles.len(), "Fetched articles");

        let thesis = read_thesis(&s.thesis_path)?;

        let mut summaries = Vec::with_capacity(articles.len());
        let mut failed = 0usize;
        for article in &articles {
            match self.summarizer.summarize(article, &thesis).await {
                Ok(summary) => summaries.push(summary),
                Err(e) => {
                    failed += 1;
                    warn!(title = %article.title, error = %e, "Skipping article: summarization failed");
                }
            }
        }

        let date = today.format("%Y-%m-%d").to_string();
        let digest = DailyDigest::new(date.clone(), summaries, articles.len())?;
        if digest.is_empty() {
            return Err(WatchError::EmptyDigest);
        }

        let review_input = format_summaries_for_review(&digest.summaries);
        let review = match self.summarizer.generate_review(&review_input).await {
            Ok(review) => review,
            Err(e) => {
                warn!(error = %e, "Literature review unavailable");
                REVIEW_UNAVAILABLE.to_string()
            }
        };

        let html = self.renderer.render(&digest, &review)?;
        let saved_to = save_copy(&s.temp_dir, &date, &html);

        let emailed = match &self.mailer {
            Some(mailer) => {
                mailer.send(&s.recipient, &date, &html).await?;
                true
            }
            None => {
                info!("Dry run: digest not emailed");
                false
            }
        };

        Ok(RunReport {
            fetched: articles.len(),
            summarized: digest.summaries.len(),
            failed,
            saved_to,
            emailed,
        })
    }
}

fn read_thesis(path: &Path) -> Result<String, WatchError> {
    std::fs::read_to_string(path).map_err(|e| {
        WatchError::Config(format!("cannot read thesis subject {}: {e}", path.display()))
    })
}

/// Keep a copy of the rendered digest on disk. Failure only warns.
fn save_copy(dir: &Path, date: &str, html: &str) -> Option<PathBuf> {
    let path = dir.join(format!("digest-{date}.html"));
    let written = std::fs::create_dir_all(dir).and_then(|_| std::fs::write(&path, html));
    match written {
        Ok(()) => {
            info!(path = %path.display(), "Digest saved");
            Some(path)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Could not save digest copy");
            None
        }
    }
}
