//! TMDb catalog provider
//!
//! API Flow:
//! 1. Discover: /discover/movie sorted by popularity → movie ids, one page at a time
//! 2. Details: /movie/{id}?append_to_response=keywords,credits → candidate text fields
//!
//! Both responses are cached in Redis; detail lookups run in parallel.

use reqwest::Client as HttpClient;
use std::{collections::HashSet, sync::Arc};
use tokio::sync::Semaphore;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{CandidateItem, TmdbDiscoverPage, TmdbMovieDetails},
    services::providers::CatalogProvider,
};

const DISCOVER_CACHE_TTL: u64 = 3600; // 1 hour
const DETAILS_CACHE_TTL: u64 = 604800; // 1 week
const MIN_VOTE_COUNT: &str = "500";
const DETAIL_CONCURRENCY: usize = 8;

#[derive(Clone)]
pub struct TmdbCatalog {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
}

impl TmdbCatalog {
    pub fn new(cache: Cache, api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
        }
    }

    async fn discover_page(&self, page: u32) -> AppResult<TmdbDiscoverPage> {
        cached!(
            self.cache,
            CacheKey::DiscoverPage(page),
            DISCOVER_CACHE_TTL,
            async move {
                let url = format!("{}/discover/movie", self.api_url);
                let page_param = page.to_string();

                let response = self
                    .http_client
                    .get(&url)
                    .query(&[
                        ("api_key", self.api_key.as_str()),
                        ("language", "en-US"),
                        ("sort_by", "popularity.desc"),
                        ("vote_count.gte", MIN_VOTE_COUNT),
                        ("page", page_param.as_str()),
                    ])
                    .send()
                    .await
                    .map_err(|e| AppError::unavailable("catalog", e.to_string()))?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(AppError::unavailable(
                        "catalog",
                        format!("TMDb discover returned status {}: {}", status, body),
                    ));
                }

                let page: TmdbDiscoverPage = response.json().await.map_err(|e| {
                    AppError::unavailable("catalog", format!("invalid discover page: {}", e))
                })?;

                tracing::debug!(
                    page = page.page,
                    total_pages = page.total_pages,
                    results = page.results.len(),
                    provider = "tmdb",
                    "Discover page fetched"
                );

                Ok(page)
            }
        )
    }

    async fn movie_details(&self, movie_id: u64) -> AppResult<TmdbMovieDetails> {
        cached!(
            self.cache,
            CacheKey::MovieDetails(movie_id),
            DETAILS_CACHE_TTL,
            async move {
                let url = format!("{}/movie/{}", self.api_url, movie_id);

                let response = self
                    .http_client
                    .get(&url)
                    .query(&[
                        ("api_key", self.api_key.as_str()),
                        ("append_to_response", "keywords,credits"),
                    ])
                    .send()
                    .await?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(AppError::ExternalApi(format!(
                        "TMDb returned status {} for movie {}: {}",
                        status, movie_id, body
                    )));
                }

                let details: TmdbMovieDetails = response.json().await?;
                Ok(details)
            }
        )
    }

    /// Fetches details for all ids in parallel, keeping discovery order.
    ///
    /// Failed lookups are logged and counted, not returned.
    async fn fetch_details_batch(&self, ids: Vec<u64>) -> (Vec<CandidateItem>, usize) {
        let semaphore = Arc::new(Semaphore::new(DETAIL_CONCURRENCY));
        let mut tasks = Vec::with_capacity(ids.len());

        for movie_id in ids {
            let catalog = self.clone();
            let semaphore = semaphore.clone();
            let task = tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| AppError::Internal(e.to_string()))?;
                catalog.movie_details(movie_id).await
            });
            tasks.push((movie_id, task));
        }

        let mut movies = Vec::with_capacity(tasks.len());
        let mut error_count = 0;

        for (movie_id, task) in tasks {
            match task.await {
                Ok(Ok(details)) => movies.push(CandidateItem::from(details)),
                Ok(Err(e)) => {
                    tracing::warn!(movie_id, error = %e, "Movie details fetch failed");
                    error_count += 1;
                }
                Err(e) => {
                    tracing::error!(movie_id, error = %e, "Task join error");
                    error_count += 1;
                }
            }
        }

        if error_count > 0 {
            tracing::warn!(
                success_count = movies.len(),
                error_count,
                "Partial movie details fetch failure"
            );
        }

        (movies, error_count)
    }
}

#[async_trait::async_trait]
impl CatalogProvider for TmdbCatalog {
    async fn fetch_candidates(&self, count: usize) -> AppResult<Vec<CandidateItem>> {
        if count == 0 {
            return Ok(vec![]);
        }

        // Pages are walked until `count` lookups succeed. An id listed on
        // two pages is looked up once.
        let mut seen = HashSet::new();
        let mut movies = Vec::with_capacity(count);
        let mut failed = 0usize;
        let mut page = 1;

        loop {
            let discovered = match self.discover_page(page).await {
                Ok(discovered) => discovered,
                Err(e) if page == 1 => return Err(e),
                Err(e) => {
                    tracing::warn!(error = %e, page, collected = movies.len(), "Discover paging stopped early");
                    break;
                }
            };

            let remaining = count - movies.len();
            let ids: Vec<u64> = discovered
                .results
                .iter()
                .map(|r| r.id)
                .filter(|id| seen.insert(*id))
                .take(remaining)
                .collect();

            let (fetched, page_failed) = self.fetch_details_batch(ids).await;
            movies.extend(fetched);
            failed += page_failed;

            if movies.len() >= count
                || page >= discovered.total_pages
                || discovered.results.is_empty()
            {
                break;
            }
            page += 1;
        }

        if movies.is_empty() && failed > 0 {
            return Err(AppError::unavailable(
                "catalog",
                "failed to fetch details for any movie",
            ));
        }

        tracing::info!(
            requested = count,
            fetched = movies.len(),
            failed,
            pages = page,
            provider = "tmdb",
            "Candidates fetched"
        );

        Ok(movies)
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
