use crate::config;
use crate::error::AnalyzerError;
use crate::models::{ContractInfo, OptionChain};
use crate::processor;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use rand::{seq::SliceRandom, thread_rng};
use reqwest::{header, Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::Retry;
use tracing::{debug, warn};

// -----------------------------------------------
// CLIENT WRAPPER WITH SESSION STATE
// -----------------------------------------------
pub struct NSEClient {
    client: Client,
    warmed_up: Arc<RwLock<bool>>,
}

impl NSEClient {
    pub fn new() -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            warmed_up: Arc::new(RwLock::new(false)),
        })
    }

    /// Warmup NSE session (only once per client)
    async fn warmup_if_needed(&self) -> Result<()> {
        if *self.warmed_up.read().await {
            return Ok(());
        }

        let mut warmed = self.warmed_up.write().await;
        if !*warmed {
            let _ = self
                .client
                .get(config::NSE_BASE_URL)
                .header("Accept", config::HEADER_ACCEPT_HTML)
                .send()
                .await
                .context("Failed to warm up NSE session")?;

            tokio::time::sleep(Duration::from_millis(config::WARMUP_DELAY_MS)).await;
            *warmed = true;
        }

        Ok(())
    }

    /// GET with exponential backoff on 429 and 5xx
    async fn fetch_json(&self, url: &str) -> Result<String> {
        self.warmup_if_needed().await?;

        let backoff = ExponentialBackoff::from_millis(config::RETRY_BASE_DELAY_MS)
            .factor(config::RETRY_FACTOR)
            .max_delay(Duration::from_secs(config::RETRY_MAX_DELAY_SECS))
            .take(config::RETRY_MAX_ATTEMPTS);

        Retry::spawn(backoff, || async {
            let res = self
                .client
                .get(url)
                .header("Referer", config::HEADER_REFERER)
                .header("X-Requested-With", config::HEADER_X_REQUESTED_WITH)
                .send()
                .await
                .context("Request send failed")?;

            let status = res.status();
            debug!(url, status = status.as_u16(), "NSE response");

            if status.is_success() {
                let text = res.text().await.context("Failed to read body")?;

                let trimmed = text.trim();
                if !trimmed.starts_with('{') && !trimmed.starts_with('[') {
                    let preview: String = text.chars().take(200).collect();
                    return Err(AnalyzerError::NonJsonResponse(preview).into());
                }

                Ok(text)
            } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                warn!(url, status = status.as_u16(), "Retryable NSE error");
                anyhow::bail!("Retryable error: {}", status)
            } else {
                let body = res.text().await.unwrap_or_default();
                let preview: String = body.chars().take(200).collect();
                anyhow::bail!("Client error {}: {}", status, preview)
            }
        })
        .await
    }

    // -----------------------------------------------
    // STEP 1: FETCH CONTRACT INFO (expiry list)
    // -----------------------------------------------
    pub async fn fetch_contract_info(&self, symbol: &str) -> Result<ContractInfo> {
        let url = config::nse_contract_info_url(symbol);

        let text = self.fetch_json(&url).await?;
        let info: ContractInfo =
            serde_json::from_str(&text).context("Failed to parse contract info")?;

        Ok(info)
    }

    // -----------------------------------------------
    // STEP 2: FETCH OPTION CHAIN
    // -----------------------------------------------
    pub async fn fetch_option_chain(&self, symbol: &str, expiry: &str) -> Result<OptionChain> {
        let url = config::nse_option_chain_url(symbol, expiry);

        let text = self.fetch_json(&url).await?;
        let chain: OptionChain =
            serde_json::from_str(&text).context("Failed to parse option chain")?;

        Ok(chain)
    }

    /// Chain of the nearest live expiry, with that expiry
    pub async fn fetch_nearest_chain(
        &self,
        symbol: &str,
        today: NaiveDate,
    ) -> Result<(String, OptionChain)> {
        let contract_info = self
            .fetch_contract_info(symbol)
            .await
            .with_context(|| format!("Failed to fetch contract info for {}", symbol))?;

        let expiry = processor::select_expiry(&contract_info.expiry_dates, today)?;
        let chain = self
            .fetch_option_chain(symbol, &expiry)
            .await
            .with_context(|| format!("Failed to fetch option chain for {} {}", symbol, expiry))?;

        Ok((expiry, chain))
    }
}

// -----------------------------------------------
// HTTP CLIENT BUILDER
// -----------------------------------------------
fn build_client() -> Result<Client> {
    let mut headers = header::HeaderMap::new();

    // Rotating Accept-Language headers
    let lang = config::ACCEPT_LANGUAGES
        .choose(&mut thread_rng())
        .copied()
        .unwrap_or("en-US,en;q=0.9");
    headers.insert(header::ACCEPT_LANGUAGE, header::HeaderValue::from_str(lang)?);
    headers.insert(header::ACCEPT, header::HeaderValue::from_static("*/*"));

    Client::builder()
        .default_headers(headers)
        .cookie_store(true) // crucial for NSE
        .user_agent(config::USER_AGENT)
        .timeout(config::HTTP_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}
