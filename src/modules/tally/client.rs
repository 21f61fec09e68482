use reqwest::Method;
use scholaris_config::TallyConfig;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, instrument};

#[derive(Debug, thiserror::Error)]
pub enum TallyError {
    #[error("Tally gateway unreachable: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Tally gateway returned HTTP {status}: {message}")]
    Gateway { status: u16, message: String },

    #[error("Tally gateway sent an unreadable response: {0}")]
    Decode(String),
}

/// Thin JSON client for the Tally gateway.
#[derive(Clone, Debug)]
pub struct TallyClient {
    http: reqwest::Client,
    base_url: String,
}

impl TallyClient {
    pub fn new(config: &TallyConfig) -> Result<Self, TallyError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[instrument(skip(self, query, body), fields(tally.base_url = %self.base_url))]
    async fn send<Q, B>(
        &self,
        method: Method,
        path: &str,
        query: &Q,
        body: Option<&B>,
    ) -> Result<Value, TallyError>
    where
        Q: Serialize + ?Sized,
        B: Serialize + ?Sized,
    {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut request = self.http.request(method, &url).query(query);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(status = status.as_u16(), bytes = text.len(), "Tally gateway responded");

        if !status.is_success() {
            return Err(TallyError::Gateway {
                status: status.as_u16(),
                message: text.chars().take(200).collect(),
            });
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| TallyError::Decode(e.to_string()))
    }

    pub async fn get<Q>(&self, path: &str, query: &Q) -> Result<Value, TallyError>
    where
        Q: Serialize + ?Sized,
    {
        self.send::<Q, ()>(Method::GET, path, query, None).await
    }

    pub async fn post<B>(&self, path: &str, body: &B) -> Result<Value, TallyError>
    where
        B: Serialize + ?Sized,
    {
        self.send(Method::POST, path, &[] as &[(&str, &str)], Some(body))
            .await
    }
}
