use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tokio::time::sleep;

use crate::services::instruments::identifiers::IdentifierResolver;

#[derive(Deserialize, Debug)]
struct OpenFigiResponseItem {
    #[serde(alias = "shareClassFIGI")]
    share_class_figi: String,
}

#[derive(Deserialize, Debug)]
struct OpenFigiResponse {
    data: Vec<OpenFigiResponseItem>,
}

pub struct OpenFigiResolver {
    client: Client,
}

impl OpenFigiResolver {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

impl Default for OpenFigiResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentifierResolver for OpenFigiResolver {
    async fn lookup(&self, ticker: &str) -> anyhow::Result<Option<String>> {
        let mapping_response = self
            .client
            .post("https://api.openfigi.com/v3/mapping/")
            .json(&serde_json::json!([{
                        "idType":"TICKER",
                        "idValue": ticker,
                        "exchCode": "US",
                        "includeUnlistedEquities": true

            }]))
            .send()
            .await?
            .text()
            .await?;

        // OpenFIGI API is rate limited to 5 requests / minute for unregistered users
        sleep(Duration::from_millis(12000)).await;

        if mapping_response == r#"[{"warning":"No identifier found."}]"# {
            return Ok(None);
        }
        if mapping_response == r#"[{"error":"Invalid idValue format"}]"# {
            return Ok(None);
        }

        let parsed = serde_json::from_str::<Vec<OpenFigiResponse>>(&mapping_response)?;

        Ok(parsed
            .first()
            .and_then(|response| response.data.first())
            .map(|item| item.share_class_figi.to_string()))
    }
}
