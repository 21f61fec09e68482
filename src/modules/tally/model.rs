use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Forwarded to the gateway as query parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TallyQuery {
    /// Tally company name; the gateway's default company when omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TallyRecords {
    pub count: usize,
    #[schema(value_type = Vec<Object>)]
    pub records: Vec<Value>,
}

impl From<Vec<Value>> for TallyRecords {
    fn from(records: Vec<Value>) -> Self {
        Self {
            count: records.len(),
            records,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TallyHealth {
    pub connected: bool,
    pub gateway_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub gateway: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Ledger the gateway creates in Tally, typically one per student or vendor.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AutoLedgerDto {
    #[validate(length(min = 1, max = 255, message = "Ledger name is required"))]
    pub name: String,
    /// Tally group, e.g. `Sundry Debtors`
    #[validate(length(min = 1, max = 255, message = "Parent group is required"))]
    pub parent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opening_balance: Option<f64>,
}
