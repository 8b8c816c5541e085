use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::upload::InquiryFile;

/// Envelope every Finnotech endpoint wraps its payload in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub track_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    pub result: T,
}

// Requests

#[derive(Debug, Clone, Default)]
pub struct IbanInquiryRequest {
    pub iban: String,
    pub track_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GroupIbanInquiryRequest {
    pub file: InquiryFile,
    pub track_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GroupIbanInquiryRetryRequest {
    pub inquiry_track_id: String,
    pub track_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GroupIbanInquiryResultRequest {
    pub inquiry_track_id: String,
    pub track_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CardBalanceRequest {
    pub card: String,
    pub track_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CardStatementRequest {
    pub card: String,
    /// Solar date as `YYYYMMDD`
    pub from_date: String,
    pub to_date: String,
    pub track_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct DepositToIbanRequest {
    pub deposit: String,
    pub bank_code: String,
    pub track_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct CifInquiryRequest {
    pub nid: String,
    pub track_id: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ShahabInquiryRequest {
    pub nid: String,
    /// Solar date as `YYYYMMDD`
    pub birth_date: String,
    pub identity_no: Option<String>,
    pub track_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct CardBody<'a> {
    pub(super) card: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CardStatementBody<'a> {
    pub(super) card: &'a str,
    pub(super) from_date: &'a str,
    pub(super) to_date: &'a str,
}

// Results
//
// Fields the SDK does not model are kept in `extra` so the body reaches the
// caller intact.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositOwner {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IbanInquiryResult {
    #[serde(rename = "IBAN", default)]
    pub iban: Option<String>,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub deposit: Option<String>,
    #[serde(default)]
    pub card: Option<String>,
    #[serde(default)]
    pub deposit_status: Option<String>,
    #[serde(default)]
    pub deposit_description: Option<String>,
    #[serde(default)]
    pub deposit_comment: Option<String>,
    #[serde(default)]
    pub deposit_owners: Vec<DepositOwner>,
    #[serde(default)]
    pub alert_code: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupIbanInquiryReceipt {
    #[serde(default)]
    pub inquiry_track_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupIbanInquiryReport {
    #[serde(default)]
    pub inquiry_track_id: Option<String>,
    #[serde(default)]
    pub inquiry_status: Option<String>,
    #[serde(default)]
    pub items: Vec<IbanInquiryResult>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardBalance {
    #[serde(default)]
    pub card: Option<String>,
    #[serde(default)]
    pub balance: Option<Decimal>,
    #[serde(default)]
    pub available_balance: Option<Decimal>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardTransaction {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub balance: Option<Decimal>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardStatement {
    #[serde(default)]
    pub card: Option<String>,
    #[serde(default)]
    pub transactions: Vec<CardTransaction>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositToIbanResult {
    #[serde(default)]
    pub iban: Option<String>,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub deposit: Option<String>,
    #[serde(default)]
    pub deposit_status: Option<String>,
    #[serde(default)]
    pub deposit_description: Option<String>,
    #[serde(default)]
    pub deposit_owners: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CifInquiryResult {
    #[serde(default)]
    pub customer_type: Option<String>,
    #[serde(default)]
    pub customer_status: Option<String>,
    #[serde(default)]
    pub cif: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShahabInquiryResult {
    #[serde(default)]
    pub shahab_code: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
