//! Remote EOL data source (endoflife.date API)

use super::client::HttpClient;
use crate::domain::{Eol, VersionRecord};
use crate::error::ResolutionError;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::warn;

#[cfg(test)]
use mockall::automock;

/// Default base URL for the endoflife.date API
pub const DEFAULT_BASE_URL: &str = "https://endoflife.date/api";

/// Read access to a product/cycle EOL dataset
#[cfg_attr(test, automock)]
#[async_trait]
pub trait EolDataSource: Send + Sync {
    /// Whether the dataset knows `product`
    async fn product_exists(&self, product: &str) -> Result<bool, ResolutionError>;

    /// A single cycle, `None` when the dataset has no such cycle
    async fn fetch_cycle(
        &self,
        product: &str,
        cycle: &str,
    ) -> Result<Option<VersionRecord>, ResolutionError>;

    /// Every cycle of `product`, newest first as published
    async fn fetch_all_cycles(&self, product: &str) -> Result<Vec<VersionRecord>, ResolutionError>;
}

/// `cycle` and `latest` are published as strings or bare numbers
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Label {
    Text(String),
    Number(serde_json::Number),
}

impl Label {
    fn into_string(self) -> String {
        match self {
            Label::Text(text) => text,
            Label::Number(number) => number.to_string(),
        }
    }
}

/// `eol` and `lts` are published as a boolean or an ISO date
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DateOrBool {
    Bool(bool),
    Date(String),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CyclePayload {
    cycle: Option<Label>,
    eol: Option<DateOrBool>,
    latest: Option<Label>,
    release_date: Option<String>,
    lts: Option<DateOrBool>,
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

impl CyclePayload {
    /// Converts to a record; the single-cycle endpoint omits `cycle`, so the
    /// requested label is passed as a fallback
    fn into_record(self, fallback_label: Option<&str>) -> Result<VersionRecord, String> {
        let label = self
            .cycle
            .map(Label::into_string)
            .or_else(|| fallback_label.map(str::to_string))
            .ok_or_else(|| "cycle entry without a label".to_string())?;

        let eol = match self.eol {
            Some(DateOrBool::Bool(true)) => Eol::Reached,
            Some(DateOrBool::Bool(false)) => Eol::NotPlanned,
            Some(DateOrBool::Date(date)) => parse_date(&date)
                .map(Eol::Date)
                .ok_or_else(|| format!("cycle {}: invalid eol date '{}'", label, date))?,
            None => return Err(format!("cycle {}: missing eol", label)),
        };

        let is_lts = match self.lts {
            Some(DateOrBool::Bool(flag)) => flag,
            Some(DateOrBool::Date(_)) => true,
            None => false,
        };

        Ok(VersionRecord {
            label,
            eol,
            latest: self.latest.map(Label::into_string),
            release_date: self.release_date.as_deref().and_then(parse_date),
            is_lts,
        })
    }
}

/// endoflife.date API client
pub struct EndOfLifeClient {
    client: HttpClient,
    base_url: String,
}

impl EndOfLifeClient {
    pub fn new(client: HttpClient) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    /// Create with custom base URL (for testing)
    pub fn with_base_url(client: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn product_url(&self, product: &str) -> String {
        format!("{}/{}.json", self.base_url, product)
    }

    fn cycle_url(&self, product: &str, cycle: &str) -> String {
        format!("{}/{}/{}.json", self.base_url, product, cycle)
    }
}

#[async_trait]
impl EolDataSource for EndOfLifeClient {
    async fn product_exists(&self, product: &str) -> Result<bool, ResolutionError> {
        self.client.exists(&self.product_url(product), product).await
    }

    async fn fetch_cycle(
        &self,
        product: &str,
        cycle: &str,
    ) -> Result<Option<VersionRecord>, ResolutionError> {
        let payload: Option<CyclePayload> = self
            .client
            .get_json(&self.cycle_url(product, cycle), product)
            .await?;

        payload
            .map(|payload| payload.into_record(Some(cycle)))
            .transpose()
            .map_err(|message| ResolutionError::invalid_response(product, message))
    }

    async fn fetch_all_cycles(&self, product: &str) -> Result<Vec<VersionRecord>, ResolutionError> {
        let payload: Option<Vec<CyclePayload>> = self
            .client
            .get_json(&self.product_url(product), product)
            .await?;

        let records = payload
            .unwrap_or_default()
            .into_iter()
            .filter_map(|entry| match entry.into_record(None) {
                Ok(record) => Some(record),
                Err(message) => {
                    warn!("Skipping malformed {} cycle: {}", product, message);
                    None
                }
            })
            .collect();

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn client_for(server: &Server) -> EndOfLifeClient {
        let http = HttpClient::new().unwrap().with_max_retries(0);
        EndOfLifeClient::with_base_url(http, server.url())
    }

    #[tokio::test]
    async fn fetch_all_cycles_parses_mixed_field_types() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/react.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"cycle": "18", "releaseDate": "2022-03-29", "eol": false, "latest": "18.3.1", "lts": false},
                    {"cycle": "17", "releaseDate": "2020-10-20", "eol": true, "latest": "17.0.2"},
                    {"cycle": 16.0, "eol": "2022-06-14", "latest": "16.14.0", "lts": "2020-01-01"}
                ]"#,
            )
            .create_async()
            .await;

        let records = client_for(&server).fetch_all_cycles("react").await.unwrap();
        mock.assert_async().await;

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].label, "18");
        assert_eq!(records[0].eol, Eol::NotPlanned);
        assert_eq!(records[0].release_date, Some(date("2022-03-29")));
        assert_eq!(records[1].eol, Eol::Reached);
        assert_eq!(records[2].label, "16.0");
        assert_eq!(records[2].eol, Eol::Date(date("2022-06-14")));
        assert!(records[2].is_lts);
    }

    #[tokio::test]
    async fn fetch_all_cycles_skips_malformed_entries() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/django.json")
            .with_status(200)
            .with_body(r#"[{"cycle": "4.2", "eol": "2026-04-01"}, {"cycle": "4.1", "eol": "soon"}]"#)
            .create_async()
            .await;

        let records = client_for(&server).fetch_all_cycles("django").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].label, "4.2");
    }

    #[tokio::test]
    async fn fetch_all_cycles_returns_empty_for_unknown_product() {
        let mut server = Server::new_async().await;
        let _mock = server.mock("GET", "/nope.json").with_status(404).create_async().await;

        let records = client_for(&server).fetch_all_cycles("nope").await.unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn fetch_cycle_uses_requested_label() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/python/3.11.json")
            .with_status(200)
            .with_body(r#"{"releaseDate": "2022-10-24", "eol": "2027-10-24", "latest": "3.11.9"}"#)
            .create_async()
            .await;

        let record = client_for(&server)
            .fetch_cycle("python", "3.11")
            .await
            .unwrap()
            .unwrap();
        mock.assert_async().await;

        assert_eq!(record.label, "3.11");
        assert_eq!(record.eol_date(), Some(date("2027-10-24")));
        assert_eq!(record.latest.as_deref(), Some("3.11.9"));
    }

    #[tokio::test]
    async fn fetch_cycle_returns_none_on_404() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/python/1.0.json")
            .with_status(404)
            .create_async()
            .await;

        let record = client_for(&server).fetch_cycle("python", "1.0").await.unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn fetch_cycle_rejects_malformed_payload() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/python/3.11.json")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create_async()
            .await;

        let result = client_for(&server).fetch_cycle("python", "3.11").await;
        assert!(matches!(result, Err(ResolutionError::InvalidResponse { .. })));
    }

    #[tokio::test]
    async fn product_exists_uses_head() {
        let mut server = Server::new_async().await;
        let mock = server.mock("HEAD", "/nodejs.json").with_status(200).create_async().await;

        assert!(client_for(&server).product_exists("nodejs").await.unwrap());
        mock.assert_async().await;
    }
}
