mod auth;
mod client;
mod scope;
pub mod types;
mod upload;

pub use auth::{ClientIdentity, TokenService, TokenSet, TokenStore};
pub use client::OakClient;
pub use scope::{GrantType, Scope};
pub use upload::InquiryFile;

use crate::error::Result;
use async_trait::async_trait;
use types::{
    ApiResponse, CardBalance, CardBalanceRequest, CardStatement, CardStatementRequest,
    CifInquiryRequest, CifInquiryResult, DepositToIbanRequest, DepositToIbanResult,
    GroupIbanInquiryReceipt, GroupIbanInquiryReport, GroupIbanInquiryRequest,
    GroupIbanInquiryResultRequest, GroupIbanInquiryRetryRequest, IbanInquiryRequest,
    IbanInquiryResult, ShahabInquiryRequest, ShahabInquiryResult,
};
use uuid::Uuid;

#[async_trait]
pub trait OakOperations {
    async fn iban_inquiry(
        &self,
        request: IbanInquiryRequest,
    ) -> Result<ApiResponse<IbanInquiryResult>>;

    async fn submit_group_iban_inquiry(
        &self,
        request: GroupIbanInquiryRequest,
    ) -> Result<ApiResponse<GroupIbanInquiryReceipt>>;

    async fn retry_group_iban_inquiry(
        &self,
        request: GroupIbanInquiryRetryRequest,
    ) -> Result<ApiResponse<GroupIbanInquiryReceipt>>;

    async fn group_iban_inquiry_result(
        &self,
        request: GroupIbanInquiryResultRequest,
    ) -> Result<ApiResponse<GroupIbanInquiryReport>>;

    async fn card_balance(&self, request: CardBalanceRequest) -> Result<ApiResponse<CardBalance>>;

    async fn card_statement(
        &self,
        request: CardStatementRequest,
    ) -> Result<ApiResponse<CardStatement>>;

    async fn deposit_to_iban(
        &self,
        request: DepositToIbanRequest,
    ) -> Result<ApiResponse<DepositToIbanResult>>;

    async fn cif_inquiry(&self, request: CifInquiryRequest) -> Result<ApiResponse<CifInquiryResult>>;

    async fn shahab_inquiry(
        &self,
        request: ShahabInquiryRequest,
    ) -> Result<ApiResponse<ShahabInquiryResult>>;
}

/// Use the caller's track id verbatim, otherwise mint a new one
pub(crate) fn resolve_track_id(supplied: Option<&str>) -> String {
    match supplied {
        Some(track_id) => track_id.to_string(),
        None => Uuid::new_v4().to_string(),
    }
}
