use serde::{Deserialize, Serialize};
use std::fmt;

/// OAuth2 grant a scope must be obtained with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GrantType {
    ClientCredentials,
    AuthorizationCode,
    Sms,
}

/// Remote permission required by each banking operation.
///
/// The set is closed: an operation can only be issued with one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    IbanInquiry,
    GroupIbanInquiry,
    GroupIbanInquiryResult,
    CardBalance,
    CardStatement,
    DepositToIban,
    CifInquiry,
    ShahabInquiry,
}

impl Scope {
    pub const ALL: [Scope; 8] = [
        Scope::IbanInquiry,
        Scope::GroupIbanInquiry,
        Scope::GroupIbanInquiryResult,
        Scope::CardBalance,
        Scope::CardStatement,
        Scope::DepositToIban,
        Scope::CifInquiry,
        Scope::ShahabInquiry,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Scope::IbanInquiry => "oak:iban-inquiry:get",
            Scope::GroupIbanInquiry => "oak:group-iban-inquiry:post",
            Scope::GroupIbanInquiryResult => "oak:group-iban-inquiry:get",
            // The remote service registers card balance under a GET scope
            // even though the call itself is a POST.
            Scope::CardBalance => "oak:card-balance:get",
            Scope::CardStatement => "oak:card-statement:post",
            Scope::DepositToIban => "oak:deposit-to-iban:get",
            Scope::CifInquiry => "oak:cif-inquiry:get",
            Scope::ShahabInquiry => "oak:shahab-inquiry:get",
        }
    }

    pub fn grant_type(self) -> GrantType {
        match self {
            Scope::IbanInquiry
            | Scope::GroupIbanInquiry
            | Scope::GroupIbanInquiryResult
            | Scope::CardBalance
            | Scope::CardStatement
            | Scope::DepositToIban
            | Scope::CifInquiry
            | Scope::ShahabInquiry => GrantType::ClientCredentials,
        }
    }

    /// Wire names of every scope, in declaration order
    pub fn all_names() -> Vec<&'static str> {
        Self::ALL.iter().map(|s| s.name()).collect()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
