//! Reference source adapter demonstrating the ABI (spec §4.1's
//! "source-specific API clients beyond reference adapters" Non-goal): a
//! same-host BFS page crawl, ported from the teacher's
//! `rootsignal-domains/src/scraping/adapters/http.rs` `HttpIngestor`, but
//! reshaped into a lazy `generate_entities` sequence instead of an eager
//! `discover() -> Vec<RawPage>` call.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use airweave_common::{AirweaveError, RetryPolicy};
use airweave_entity::{Entity, Provenance};

use crate::adapter::{EntityStream, SourceAdapter};
use crate::produced::ProducedEntity;

pub struct HttpPageAdapterConfig {
    pub start_url: String,
    pub max_depth: usize,
    pub limit: usize,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

pub struct HttpPageAdapter {
    client: reqwest::Client,
    config: HttpPageAdapterConfig,
    retry: RetryPolicy,
    provenance: Provenance,
    user_agent: String,
}

impl HttpPageAdapter {
    pub fn new(client: reqwest::Client, config: HttpPageAdapterConfig, provenance: Provenance) -> Self {
        Self { client, config, retry: RetryPolicy::default(), provenance, user_agent: "AirweaveBot/1.0".to_string() }
    }

    fn should_crawl(&self, url: &Url, base_url: &Url) -> bool {
        if url.host_str() != base_url.host_str() {
            return false;
        }
        let path = url.path();
        if !self.config.include_patterns.is_empty()
            && !self.config.include_patterns.iter().any(|p| path.contains(p.as_str()))
        {
            return false;
        }
        if self.config.exclude_patterns.iter().any(|p| path.contains(p.as_str())) {
            return false;
        }
        true
    }

    fn extract_links(base_url: &Url, html: &str) -> Vec<String> {
        let href = regex::Regex::new(r#"href\s*=\s*["']([^"']+)["']"#).unwrap();
        href.captures_iter(html)
            .filter_map(|cap| cap.get(1))
            .map(|m| m.as_str())
            .filter(|href| !(href.starts_with('#') || href.starts_with("javascript:") || href.starts_with("mailto:") || href.starts_with("tel:")))
            .filter_map(|href| base_url.join(href).ok())
            .map(|u| u.to_string())
            .collect()
    }

    fn extract_title(html: &str) -> Option<String> {
        let pattern = regex::Regex::new(r"(?s)<title[^>]*>(.*?)</title>").ok()?;
        pattern.captures(html).and_then(|c| c.get(1)).map(|m| m.as_str().trim().to_string())
    }

    async fn fetch_page(&self, url: &str) -> Result<(String, Option<String>), AirweaveError> {
        self.retry
            .retry(AirweaveError::is_transient, || async {
                let response = self
                    .client
                    .get(url)
                    .header("User-Agent", &self.user_agent)
                    .send()
                    .await
                    .map_err(|e| AirweaveError::TransientUpstream(e.to_string()))?;
                if !response.status().is_success() {
                    if response.status().is_server_error() {
                        return Err(AirweaveError::TransientUpstream(format!("HTTP {}", response.status())));
                    }
                    return Err(AirweaveError::PerItemBadData {
                        entity_id: url.to_string(),
                        message: format!("HTTP {}", response.status()),
                    });
                }
                let html = response.text().await.map_err(|e| AirweaveError::TransientUpstream(e.to_string()))?;
                let title = Self::extract_title(&html);
                Ok((html, title))
            })
            .await
    }
}

#[async_trait]
impl SourceAdapter for HttpPageAdapter {
    fn name(&self) -> &str {
        "http_page"
    }

    fn generate_entities(self: Arc<Self>) -> EntityStream {
        let adapter = self;
        Box::pin(async_stream::stream! {
            let base_url = match Url::parse(&adapter.config.start_url) {
                Ok(u) => u,
                Err(_) => {
                    yield Err(AirweaveError::Config(format!("invalid start_url {}", adapter.config.start_url)));
                    return;
                }
            };

            let mut visited: HashSet<String> = HashSet::new();
            let mut queue: VecDeque<(String, usize)> = VecDeque::new();
            queue.push_back((adapter.config.start_url.clone(), 0));
            let mut emitted = 0usize;

            while let Some((url, depth)) = queue.pop_front() {
                if emitted >= adapter.config.limit || depth > adapter.config.max_depth || visited.contains(&url) {
                    continue;
                }
                visited.insert(url.clone());

                match adapter.fetch_page(&url).await {
                    Ok((html, title)) => {
                        if let Ok(page_url) = Url::parse(&url) {
                            for link in HttpPageAdapter::extract_links(&page_url, &html) {
                                if let Ok(link_url) = Url::parse(&link) {
                                    if adapter.should_crawl(&link_url, &base_url) && !visited.contains(&link) {
                                        queue.push_back((link, depth + 1));
                                    }
                                }
                            }
                        }

                        let mut entity = Entity::new(url.clone(), "WebPage", adapter.provenance.clone());
                        entity.payload.insert("url".to_string(), serde_json::json!(url));
                        entity.payload.insert("html".to_string(), serde_json::json!(html));
                        if let Some(title) = title {
                            entity.payload.insert("title".to_string(), serde_json::json!(title));
                        }
                        entity.embeddable_fields = vec!["title".to_string(), "html".to_string()];
                        emitted += 1;
                        yield Ok(ProducedEntity::Entity(entity));
                    }
                    Err(AirweaveError::PerItemBadData { entity_id, message }) => {
                        tracing::warn!(url = %entity_id, error = %message, "dropping page after per-item failure");
                    }
                    Err(err) => {
                        yield Err(err);
                        return;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use uuid::Uuid;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provenance() -> Provenance {
        Provenance { source_name: "http_page".into(), sync_id: Uuid::nil(), sync_job_id: Uuid::nil(), source_connection_id: Uuid::nil() }
    }

    #[tokio::test]
    async fn crawls_same_host_links_and_emits_one_entity_per_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                r#"<html><head><title>Home</title></head><body><a href="{}/about">About</a></body></html>"#,
                server.uri()
            )))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><head><title>About</title></head><body>no links</body></html>"))
            .mount(&server)
            .await;

        let config = HttpPageAdapterConfig {
            start_url: server.uri(),
            max_depth: 2,
            limit: 10,
            include_patterns: vec![],
            exclude_patterns: vec![],
        };
        let adapter = Arc::new(HttpPageAdapter::new(reqwest::Client::new(), config, provenance()));
        let mut stream = adapter.generate_entities();

        let mut titles = Vec::new();
        while let Some(item) = stream.next().await {
            let entity = match item.unwrap() {
                ProducedEntity::Entity(e) => e,
                ProducedEntity::Lazy(_) => panic!("expected plain entities"),
            };
            titles.push(entity.payload.get("title").and_then(|v| v.as_str()).unwrap().to_string());
        }
        titles.sort();
        assert_eq!(titles, vec!["About".to_string(), "Home".to_string()]);
    }

    #[tokio::test]
    async fn respects_the_page_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><head><title>P</title></head></html>"))
            .mount(&server)
            .await;

        let config = HttpPageAdapterConfig {
            start_url: server.uri(),
            max_depth: 5,
            limit: 1,
            include_patterns: vec![],
            exclude_patterns: vec![],
        };
        let adapter = Arc::new(HttpPageAdapter::new(reqwest::Client::new(), config, provenance()));
        let mut stream = adapter.generate_entities();

        let mut count = 0;
        while let Some(item) = stream.next().await {
            item.unwrap();
            count += 1;
        }
        assert_eq!(count, 1);
    }
}
