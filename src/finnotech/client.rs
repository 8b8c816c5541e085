use super::auth::{TokenService, TokenStore};
use super::scope::Scope;
use super::types::{
    ApiResponse, CardBalance, CardBalanceRequest, CardBody, CardStatement, CardStatementBody,
    CardStatementRequest, CifInquiryRequest, CifInquiryResult, DepositToIbanRequest,
    DepositToIbanResult, GroupIbanInquiryReceipt, GroupIbanInquiryReport, GroupIbanInquiryRequest,
    GroupIbanInquiryResultRequest, GroupIbanInquiryRetryRequest, IbanInquiryRequest,
    IbanInquiryResult, ShahabInquiryRequest, ShahabInquiryResult,
};
use super::{OakOperations, resolve_track_id, upload};
use crate::config::FinnotechConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, instrument};
use url::Url;

const SCOPE_HEADER: &str = "X-Scope-Name";

/// Client for the `oak` inquiry services.
///
/// Every call asks the [`TokenService`] for a bearer token, issues exactly
/// one request and hands back the decoded body. Failures are not retried.
pub struct OakClient {
    client: Client,
    tokens: Arc<TokenService>,
    api_base_url: String,
}

impl OakClient {
    pub fn new(tokens: Arc<TokenService>, api_base_url: &str) -> Self {
        Self {
            client: tokens.http_client(),
            tokens,
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &FinnotechConfig, store: Arc<dyn TokenStore>) -> Self {
        let tokens = TokenService::from_config(config).with_store(store);
        Self::new(Arc::new(tokens), &config.api_base_url())
    }

    pub fn token_service(&self) -> &TokenService {
        &self.tokens
    }

    /// `{base}/oak/v2/clients/{clientId}/{segments..}`, each piece encoded as a single segment
    fn client_url(&self, segments: &[&str]) -> Result<Url> {
        let client_id = self.tokens.client_id();

        for segment in std::iter::once(&client_id).chain(segments) {
            if matches!(*segment, "" | "." | "..") {
                return Err(Error::InvalidArgument(format!(
                    "invalid path segment {:?}",
                    segment
                )));
            }
        }

        let mut url = Url::parse(&self.api_base_url)
            .map_err(|e| Error::InvalidArgument(format!("Invalid API base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| Error::InvalidArgument("API base URL cannot hold a path".to_string()))?
            .pop_if_empty()
            .extend(["oak", "v2", "clients", client_id])
            .extend(segments);

        Ok(url)
    }

    /// Start a request carrying the bearer token, scope header and track id
    async fn authorized(
        &self,
        method: Method,
        url: Url,
        scope: Scope,
        track_id: &str,
    ) -> Result<RequestBuilder> {
        let access_token = self.tokens.get_access_token(scope.name()).await?;

        debug!(scope = %scope, track_id, "Sending request");

        Ok(self
            .client
            .request(method, url)
            .bearer_auth(access_token)
            .header(SCOPE_HEADER, scope.name())
            .query(&[("trackId", track_id)]))
    }

    async fn execute<T: DeserializeOwned>(request: RequestBuilder) -> Result<ApiResponse<T>> {
        let response = request.send().await?.error_for_status()?;
        Ok(response.json().await?)
    }
}

#[async_trait]
impl OakOperations for OakClient {
    #[instrument(name = "IBAN inquiry", skip_all)]
    async fn iban_inquiry(
        &self,
        request: IbanInquiryRequest,
    ) -> Result<ApiResponse<IbanInquiryResult>> {
        let url = self.client_url(&["ibanInquiry"])?;
        let track_id = resolve_track_id(request.track_id.as_deref());

        let builder = self
            .authorized(Method::GET, url, Scope::IbanInquiry, &track_id)
            .await?
            .query(&[("iban", &request.iban)]);

        Self::execute(builder).await
    }

    #[instrument(name = "Submitting group IBAN inquiry", skip_all)]
    async fn submit_group_iban_inquiry(
        &self,
        request: GroupIbanInquiryRequest,
    ) -> Result<ApiResponse<GroupIbanInquiryReceipt>> {
        let url = self.client_url(&["groupIbanInquiry"])?;
        let track_id = resolve_track_id(request.track_id.as_deref());
        let form = upload::submit_form(request.file)?;

        let builder = self
            .authorized(Method::POST, url, Scope::GroupIbanInquiry, &track_id)
            .await?
            .multipart(form);

        Self::execute(builder).await
    }

    #[instrument(name = "Retrying group IBAN inquiry", skip_all)]
    async fn retry_group_iban_inquiry(
        &self,
        request: GroupIbanInquiryRetryRequest,
    ) -> Result<ApiResponse<GroupIbanInquiryReceipt>> {
        let url = self.client_url(&["groupIbanInquiry"])?;
        let track_id = resolve_track_id(request.track_id.as_deref());

        let builder = self
            .authorized(Method::POST, url, Scope::GroupIbanInquiry, &track_id)
            .await?
            .multipart(upload::retry_form(&request.inquiry_track_id));

        Self::execute(builder).await
    }

    #[instrument(name = "Fetching group IBAN inquiry result", skip_all)]
    async fn group_iban_inquiry_result(
        &self,
        request: GroupIbanInquiryResultRequest,
    ) -> Result<ApiResponse<GroupIbanInquiryReport>> {
        let url = self.client_url(&["groupIbanInquiry"])?;
        let track_id = resolve_track_id(request.track_id.as_deref());

        let builder = self
            .authorized(Method::GET, url, Scope::GroupIbanInquiryResult, &track_id)
            .await?
            .query(&[("inquiryTrackId", &request.inquiry_track_id)]);

        Self::execute(builder).await
    }

    #[instrument(name = "Fetching card balance", skip_all)]
    async fn card_balance(&self, request: CardBalanceRequest) -> Result<ApiResponse<CardBalance>> {
        let url = self.client_url(&["card", "balance"])?;
        let track_id = resolve_track_id(request.track_id.as_deref());

        let builder = self
            .authorized(Method::POST, url, Scope::CardBalance, &track_id)
            .await?
            .json(&CardBody {
                card: &request.card,
            });

        Self::execute(builder).await
    }

    #[instrument(name = "Fetching card statement", skip_all)]
    async fn card_statement(
        &self,
        request: CardStatementRequest,
    ) -> Result<ApiResponse<CardStatement>> {
        let url = self.client_url(&["card", "statement"])?;
        let track_id = resolve_track_id(request.track_id.as_deref());

        let builder = self
            .authorized(Method::POST, url, Scope::CardStatement, &track_id)
            .await?
            .json(&CardStatementBody {
                card: &request.card,
                from_date: &request.from_date,
                to_date: &request.to_date,
            });

        Self::execute(builder).await
    }

    #[instrument(name = "Converting deposit to IBAN", skip_all)]
    async fn deposit_to_iban(
        &self,
        request: DepositToIbanRequest,
    ) -> Result<ApiResponse<DepositToIbanResult>> {
        let url = self.client_url(&["iban"])?;
        let track_id = resolve_track_id(request.track_id.as_deref());

        let builder = self
            .authorized(Method::GET, url, Scope::DepositToIban, &track_id)
            .await?
            .query(&[
                ("deposit", &request.deposit),
                ("bankCode", &request.bank_code),
            ]);

        Self::execute(builder).await
    }

    #[instrument(name = "CIF inquiry", skip_all)]
    async fn cif_inquiry(&self, request: CifInquiryRequest) -> Result<ApiResponse<CifInquiryResult>> {
        let url = self.client_url(&["users", request.nid.as_str(), "cifInquiry"])?;
        let track_id = resolve_track_id(request.track_id.as_deref());

        let builder = self
            .authorized(Method::GET, url, Scope::CifInquiry, &track_id)
            .await?;

        Self::execute(builder).await
    }

    #[instrument(name = "Shahab inquiry", skip_all)]
    async fn shahab_inquiry(
        &self,
        request: ShahabInquiryRequest,
    ) -> Result<ApiResponse<ShahabInquiryResult>> {
        let url = self.client_url(&["users", request.nid.as_str(), "shahabInquiry"])?;
        let track_id = resolve_track_id(request.track_id.as_deref());

        let mut params = vec![("birthDate", request.birth_date.as_str())];
        if let Some(identity_no) = &request.identity_no {
            params.push(("identityNo", identity_no.as_str()));
        }

        let builder = self
            .authorized(Method::GET, url, Scope::ShahabInquiry, &track_id)
            .await?
            .query(&params);

        Self::execute(builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finnotech::auth::test_helpers::{RecordingStore, mock_identity};
    use crate::finnotech::upload::InquiryFile;
    use serde_json::json;
    use std::collections::HashSet;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    const CSV: &str = "IR062960000000100324200001\nIR820540102680020817909002\n";
    const CSV_BASE64: &str =
        "SVIwNjI5NjAwMDAwMDAxMDAzMjQyMDAwMDEKSVI4MjA1NDAxMDI2ODAwMjA4MTc5MDkwMDIK";

    fn setup(mock_server: &MockServer) -> (OakClient, RecordingStore) {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();

        let store = RecordingStore::with_tokens("A0", "R0");
        let tokens = TokenService::new(mock_identity(), &mock_server.uri())
            .with_store(Arc::new(store.clone()));
        let client = OakClient::new(Arc::new(tokens), &mock_server.uri());
        (client, store)
    }

    fn done(result: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "trackId": "server-track",
            "status": "DONE",
            "result": result
        }))
    }

    fn track_id_of(request: &Request) -> String {
        request
            .url
            .query_pairs()
            .find(|(key, _)| key == "trackId")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default()
    }

    /// Multipart body with its random boundary replaced by a fixed marker
    fn normalized_multipart(request: &Request) -> String {
        let content_type = request
            .headers
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let boundary = content_type
            .split("boundary=")
            .nth(1)
            .unwrap()
            .to_string();
        String::from_utf8(request.body.clone())
            .unwrap()
            .replace(&boundary, "BOUNDARY")
    }

    #[tokio::test]
    async fn test_iban_inquiry_request_shape() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/oak/v2/clients/acme/ibanInquiry"))
            .and(query_param("iban", "IR062960000000100324200001"))
            .and(query_param("trackId", "caller-track"))
            .and(header("Authorization", "Bearer A0"))
            .and(header("X-Scope-Name", "oak:iban-inquiry:get"))
            .respond_with(done(json!({
                "IBAN": "IR062960000000100324200001",
                "bankName": "Bank Melli",
                "depositStatus": "02",
                "branchName": "Central"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let (client, store) = setup(&mock_server);

        let response = client
            .iban_inquiry(IbanInquiryRequest {
                iban: "IR062960000000100324200001".to_string(),
                track_id: Some("caller-track".to_string()),
            })
            .await
            .unwrap();

        assert_eq!(response.track_id.as_deref(), Some("server-track"));
        assert_eq!(response.result.bank_name.as_deref(), Some("Bank Melli"));
        assert_eq!(response.result.extra["branchName"], json!("Central"));
        assert_eq!(
            *store.fetched_scopes.lock().unwrap(),
            vec!["oak:iban-inquiry:get".to_string()]
        );
    }

    #[tokio::test]
    async fn test_missing_track_id_generated_per_call() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/oak/v2/clients/acme/ibanInquiry"))
            .respond_with(done(json!({})))
            .expect(3)
            .mount(&mock_server)
            .await;

        let (client, _store) = setup(&mock_server);

        for _ in 0..3 {
            client
                .iban_inquiry(IbanInquiryRequest {
                    iban: "IR062960000000100324200001".to_string(),
                    track_id: None,
                })
                .await
                .unwrap();
        }

        let requests = mock_server.received_requests().await.unwrap();
        let track_ids: HashSet<String> = requests.iter().map(track_id_of).collect();
        assert_eq!(track_ids.len(), 3);
        assert!(track_ids.iter().all(|id| !id.is_empty()));
    }

    #[tokio::test]
    async fn test_group_submit_accepts_raw_and_base64_files() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oak/v2/clients/acme/groupIbanInquiry"))
            .and(header("X-Scope-Name", "oak:group-iban-inquiry:post"))
            .respond_with(done(json!({"inquiryTrackId": "inq-1"})))
            .expect(2)
            .mount(&mock_server)
            .await;

        let (client, _store) = setup(&mock_server);

        for file in [
            InquiryFile::Bytes(CSV.as_bytes().to_vec()),
            InquiryFile::Base64(CSV_BASE64.to_string()),
        ] {
            let response = client
                .submit_group_iban_inquiry(GroupIbanInquiryRequest {
                    file,
                    track_id: Some("same-track".to_string()),
                })
                .await
                .unwrap();
            assert_eq!(response.result.inquiry_track_id.as_deref(), Some("inq-1"));
        }

        let requests = mock_server.received_requests().await.unwrap();
        let raw = normalized_multipart(&requests[0]);
        let decoded = normalized_multipart(&requests[1]);

        assert_eq!(raw, decoded);
        assert!(raw.contains("name=\"file\"; filename=\"ibans.csv\""));
        assert!(raw.contains(CSV));
    }

    #[tokio::test]
    async fn test_group_submit_rejects_bad_base64_before_token_fetch() {
        let mock_server = MockServer::start().await;
        let (client, store) = setup(&mock_server);

        let err = client
            .submit_group_iban_inquiry(GroupIbanInquiryRequest {
                file: InquiryFile::Base64("%%%".to_string()),
                track_id: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidArgument(_)));
        assert!(store.fetched_scopes.lock().unwrap().is_empty());
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_group_retry_sends_marker_and_inquiry_track_id() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oak/v2/clients/acme/groupIbanInquiry"))
            .and(query_param("trackId", "retry-track"))
            .respond_with(done(json!({"inquiryTrackId": "inq-1"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let (client, _store) = setup(&mock_server);

        client
            .retry_group_iban_inquiry(GroupIbanInquiryRetryRequest {
                inquiry_track_id: "inq-1".to_string(),
                track_id: Some("retry-track".to_string()),
            })
            .await
            .unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        let body = normalized_multipart(&requests[0]);
        assert!(body.contains("name=\"retry\"\r\n\r\ntrue"));
        assert!(body.contains("name=\"inquiryTrackId\"\r\n\r\ninq-1"));
    }

    #[tokio::test]
    async fn test_group_result_query() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/oak/v2/clients/acme/groupIbanInquiry"))
            .and(query_param("inquiryTrackId", "inq-1"))
            .and(header("X-Scope-Name", "oak:group-iban-inquiry:get"))
            .respond_with(done(json!({
                "inquiryStatus": "DONE",
                "items": [{"IBAN": "IR062960000000100324200001"}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let (client, _store) = setup(&mock_server);

        let response = client
            .group_iban_inquiry_result(GroupIbanInquiryResultRequest {
                inquiry_track_id: "inq-1".to_string(),
                track_id: None,
            })
            .await
            .unwrap();

        assert_eq!(response.result.inquiry_status.as_deref(), Some("DONE"));
        assert_eq!(response.result.items.len(), 1);
    }

    #[tokio::test]
    async fn test_card_balance_posts_with_get_scope() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oak/v2/clients/acme/card/balance"))
            .and(header("X-Scope-Name", "oak:card-balance:get"))
            .and(body_json(json!({"card": "6037991234567890"})))
            .respond_with(done(json!({"balance": 250000})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let (client, _store) = setup(&mock_server);

        let response = client
            .card_balance(CardBalanceRequest {
                card: "6037991234567890".to_string(),
                track_id: None,
            })
            .await
            .unwrap();

        assert_eq!(response.result.balance, Some(250000.into()));
    }

    #[tokio::test]
    async fn test_card_statement_body() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/oak/v2/clients/acme/card/statement"))
            .and(body_json(json!({
                "card": "6037991234567890",
                "fromDate": "14030101",
                "toDate": "14030131"
            })))
            .respond_with(done(json!({
                "transactions": [{"date": "14030105", "amount": -12000}]
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let (client, _store) = setup(&mock_server);

        let response = client
            .card_statement(CardStatementRequest {
                card: "6037991234567890".to_string(),
                from_date: "14030101".to_string(),
                to_date: "14030131".to_string(),
                track_id: None,
            })
            .await
            .unwrap();

        assert_eq!(response.result.transactions.len(), 1);
        assert_eq!(response.result.transactions[0].amount, Some((-12000).into()));
    }

    #[tokio::test]
    async fn test_deposit_to_iban_query() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/oak/v2/clients/acme/iban"))
            .and(query_param("deposit", "0101234567"))
            .and(query_param("bankCode", "062"))
            .and(header("X-Scope-Name", "oak:deposit-to-iban:get"))
            .respond_with(done(json!({"iban": "IR062960000000100324200001"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let (client, _store) = setup(&mock_server);

        let response = client
            .deposit_to_iban(DepositToIbanRequest {
                deposit: "0101234567".to_string(),
                bank_code: "062".to_string(),
                track_id: None,
            })
            .await
            .unwrap();

        assert_eq!(
            response.result.iban.as_deref(),
            Some("IR062960000000100324200001")
        );
    }

    #[tokio::test]
    async fn test_user_scoped_paths() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/oak/v2/clients/acme/users/0087654321/cifInquiry"))
            .and(header("X-Scope-Name", "oak:cif-inquiry:get"))
            .respond_with(done(json!({"customerType": "REAL"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/oak/v2/clients/acme/users/0087654321/shahabInquiry"))
            .and(query_param("birthDate", "13700101"))
            .and(query_param("identityNo", "123"))
            .and(header("X-Scope-Name", "oak:shahab-inquiry:get"))
            .respond_with(done(json!({"shahabCode": "1000000123456789"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let (client, _store) = setup(&mock_server);

        let cif = client
            .cif_inquiry(CifInquiryRequest {
                nid: "0087654321".to_string(),
                track_id: None,
            })
            .await
            .unwrap();
        assert_eq!(cif.result.customer_type.as_deref(), Some("REAL"));

        let shahab = client
            .shahab_inquiry(ShahabInquiryRequest {
                nid: "0087654321".to_string(),
                birth_date: "13700101".to_string(),
                identity_no: Some("123".to_string()),
                track_id: None,
            })
            .await
            .unwrap();
        assert_eq!(
            shahab.result.shahab_code.as_deref(),
            Some("1000000123456789")
        );
    }

    const OPERATIONS: [&str; 9] = [
        "iban-inquiry",
        "group-submit",
        "group-retry",
        "group-result",
        "card-balance",
        "card-statement",
        "deposit-to-iban",
        "cif-inquiry",
        "shahab-inquiry",
    ];

    /// Call every operation once, in `OPERATIONS` order
    async fn call_every_operation(
        client: &OakClient,
        track_id: impl Fn(&str) -> Option<String>,
    ) -> Vec<Result<()>> {
        vec![
            client
                .iban_inquiry(IbanInquiryRequest {
                    iban: "IR062960000000100324200001".to_string(),
                    track_id: track_id(OPERATIONS[0]),
                })
                .await
                .map(|_| ()),
            client
                .submit_group_iban_inquiry(GroupIbanInquiryRequest {
                    file: InquiryFile::Bytes(CSV.as_bytes().to_vec()),
                    track_id: track_id(OPERATIONS[1]),
                })
                .await
                .map(|_| ()),
            client
                .retry_group_iban_inquiry(GroupIbanInquiryRetryRequest {
                    inquiry_track_id: "inq-1".to_string(),
                    track_id: track_id(OPERATIONS[2]),
                })
                .await
                .map(|_| ()),
            client
                .group_iban_inquiry_result(GroupIbanInquiryResultRequest {
                    inquiry_track_id: "inq-1".to_string(),
                    track_id: track_id(OPERATIONS[3]),
                })
                .await
                .map(|_| ()),
            client
                .card_balance(CardBalanceRequest {
                    card: "6037991234567890".to_string(),
                    track_id: track_id(OPERATIONS[4]),
                })
                .await
                .map(|_| ()),
            client
                .card_statement(CardStatementRequest {
                    card: "6037991234567890".to_string(),
                    from_date: "14030101".to_string(),
                    to_date: "14030131".to_string(),
                    track_id: track_id(OPERATIONS[5]),
                })
                .await
                .map(|_| ()),
            client
                .deposit_to_iban(DepositToIbanRequest {
                    deposit: "0101234567".to_string(),
                    bank_code: "062".to_string(),
                    track_id: track_id(OPERATIONS[6]),
                })
                .await
                .map(|_| ()),
            client
                .cif_inquiry(CifInquiryRequest {
                    nid: "0087654321".to_string(),
                    track_id: track_id(OPERATIONS[7]),
                })
                .await
                .map(|_| ()),
            client
                .shahab_inquiry(ShahabInquiryRequest {
                    nid: "0087654321".to_string(),
                    birth_date: "13700101".to_string(),
                    identity_no: None,
                    track_id: track_id(OPERATIONS[8]),
                })
                .await
                .map(|_| ()),
        ]
    }

    #[tokio::test]
    async fn test_supplied_track_id_sent_verbatim_by_every_operation() {
        let mock_server = MockServer::start().await;

        for operation in OPERATIONS {
            Mock::given(query_param("trackId", format!("t-{}", operation)))
                .respond_with(done(json!({})))
                .expect(1)
                .mount(&mock_server)
                .await;
        }

        let (client, _store) = setup(&mock_server);

        let results = call_every_operation(&client, |op| Some(format!("t-{}", op))).await;
        for (operation, result) in OPERATIONS.iter().zip(results) {
            assert!(result.is_ok(), "{} failed: {:?}", operation, result);
        }

        let requests = mock_server.received_requests().await.unwrap();
        let sent: Vec<String> = requests.iter().map(track_id_of).collect();
        let expected: Vec<String> = OPERATIONS.iter().map(|op| format!("t-{}", op)).collect();
        assert_eq!(sent, expected);
    }

    #[tokio::test]
    async fn test_omitted_track_id_regenerated_by_every_operation() {
        let mock_server = MockServer::start().await;

        Mock::given(wiremock::matchers::any())
            .respond_with(done(json!({})))
            .expect(18)
            .mount(&mock_server)
            .await;

        let (client, _store) = setup(&mock_server);

        for _ in 0..2 {
            let results = call_every_operation(&client, |_| None).await;
            assert!(results.iter().all(|r| r.is_ok()));
        }

        let requests = mock_server.received_requests().await.unwrap();
        let track_ids: Vec<String> = requests.iter().map(track_id_of).collect();
        assert!(track_ids.iter().all(|id| !id.is_empty()));

        let unique: HashSet<&String> = track_ids.iter().collect();
        assert_eq!(unique.len(), track_ids.len());

        // Each operation's two calls carried different ids
        for (first, second) in track_ids[..9].iter().zip(&track_ids[9..]) {
            assert_ne!(first, second);
        }
    }

    #[tokio::test]
    async fn test_server_errors_propagate_unchanged() {
        let mock_server = MockServer::start().await;

        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(9)
            .mount(&mock_server)
            .await;

        let (client, _store) = setup(&mock_server);

        let results = call_every_operation(&client, |_| None).await;
        for (operation, result) in OPERATIONS.iter().zip(results) {
            match result {
                Err(Error::Transport(e)) => assert_eq!(
                    e.status(),
                    Some(reqwest::StatusCode::INTERNAL_SERVER_ERROR),
                    "{}",
                    operation
                ),
                other => panic!("{}: expected transport error, got {:?}", operation, other),
            }
        }
    }

    #[tokio::test]
    async fn test_nid_is_encoded_as_one_path_segment() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(
                "/oak/v2/clients/acme/users/..%2F..%2Fdev%2Fv2%2Foauth2%2Ftoken%3Fx=/cifInquiry",
            ))
            .respond_with(done(json!({})))
            .expect(1)
            .mount(&mock_server)
            .await;

        let (client, _store) = setup(&mock_server);

        client
            .cif_inquiry(CifInquiryRequest {
                nid: "../../dev/v2/oauth2/token?x=".to_string(),
                track_id: Some("t1".to_string()),
            })
            .await
            .unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        let pairs: Vec<(String, String)> = requests[0]
            .url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(pairs, vec![("trackId".to_string(), "t1".to_string())]);
    }

    #[tokio::test]
    async fn test_dot_segments_rejected_before_token_fetch() {
        let mock_server = MockServer::start().await;
        let (client, store) = setup(&mock_server);

        for nid in ["", ".", ".."] {
            let err = client
                .shahab_inquiry(ShahabInquiryRequest {
                    nid: nid.to_string(),
                    birth_date: "13700101".to_string(),
                    identity_no: None,
                    track_id: None,
                })
                .await
                .unwrap_err();
            assert!(matches!(err, Error::InvalidArgument(_)), "nid {:?}", nid);
        }

        assert!(store.fetched_scopes.lock().unwrap().is_empty());
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_store_issues_no_request() {
        let mock_server = MockServer::start().await;

        let tokens = TokenService::new(mock_identity(), &mock_server.uri());
        let client = OakClient::new(Arc::new(tokens), &mock_server.uri());

        let err = client
            .iban_inquiry(IbanInquiryRequest::default())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::MissingDelegate(_)));
        assert!(mock_server.received_requests().await.unwrap().is_empty());
    }
}
