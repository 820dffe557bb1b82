use serde::{Deserialize, Serialize};

use crate::models::money::Money;

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentRequest {
    pub course_id: i64,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct IntentResponse {
    pub client_secret: String,
    pub course_id: i64,
    pub price: Money,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct WebhookAck {
    pub received: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub status: Option<String>,
}

impl WebhookAck {
    pub fn received() -> Self {
        Self {
            received: true,
            status: None,
        }
    }

    pub fn with_status(status: &str) -> Self {
        Self {
            received: true,
            status: Some(status.to_string()),
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PaypalSetup {
    pub client_token: String,
}

#[derive(Deserialize, Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PaypalOrderRequest {
    pub course_id: i64,
    pub currency: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PaypalOrderResponse {
    pub id: String,
    pub status: String,
}
