use scholaris_core::AppError;
use serde_json::Value;
use tracing::{instrument, warn};

use crate::metrics;

use super::client::{TallyClient, TallyError};
use super::model::{AutoLedgerDto, TallyHealth, TallyQuery, TallyRecords};
use super::normalize::{Collection, normalize};

fn gateway_error(endpoint: &'static str, err: TallyError) -> AppError {
    warn!(endpoint, error = %err, "Tally request failed");
    metrics::track_tally_request(endpoint, false);
    AppError::bad_gateway(err)
}

pub struct TallyService;

impl TallyService {
    /// Reports reachability instead of failing, so dashboards can show it.
    pub async fn health(client: &TallyClient) -> TallyHealth {
        match client.get("health", &TallyQuery::default()).await {
            Ok(gateway) => {
                metrics::track_tally_request("health", true);
                TallyHealth {
                    connected: true,
                    gateway_url: client.base_url().to_string(),
                    gateway: (!gateway.is_null()).then_some(gateway),
                    error: None,
                }
            }
            Err(err) => {
                metrics::track_tally_request("health", false);
                TallyHealth {
                    connected: false,
                    gateway_url: client.base_url().to_string(),
                    gateway: None,
                    error: Some(err.to_string()),
                }
            }
        }
    }

    #[instrument(skip(client))]
    pub async fn fetch(
        client: &TallyClient,
        collection: Collection,
        query: &TallyQuery,
    ) -> Result<TallyRecords, AppError> {
        let endpoint = collection.as_str();
        let raw = client
            .get(endpoint, query)
            .await
            .map_err(|e| gateway_error(endpoint, e))?;

        metrics::track_tally_request(endpoint, true);
        Ok(normalize(raw, collection).into())
    }

    #[instrument(skip(client, dto), fields(ledger.name = %dto.name))]
    pub async fn auto_ledger(client: &TallyClient, dto: &AutoLedgerDto) -> Result<Value, AppError> {
        let response = client
            .post("auto-ledger", dto)
            .await
            .map_err(|e| gateway_error("auto-ledger", e))?;
        metrics::track_tally_request("auto-ledger", true);
        Ok(response)
    }
}
