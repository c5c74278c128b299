//! Shared fixtures for tests that run against a mock IG gateway.

#![allow(dead_code)]

use std::sync::Once;
use std::time::Duration;

use serde_json::json;
use tracing_subscriber::EnvFilter;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ig_rest_rs::{AuthMode, ClientConfig, Credentials, Environment, IgClient, RateLimitConfig, RetryPolicy};

pub const API_KEY: &str = "test-api-key";
pub const ACCOUNT_ID: &str = "ABC123";

static INIT: Once = Once::new();

/// Initialize logging for tests
pub fn init_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn credentials() -> Credentials {
    Credentials::new(API_KEY, "trader", "hunter2", Environment::Demo)
}

/// Fast, deterministic retries and no client-side rate limiting.
pub fn config(server: &MockServer) -> ClientConfig {
    ClientConfig::default()
        .with_base_url(server.uri())
        .with_retry(
            RetryPolicy::default()
                .with_jitter(false)
                .with_initial_backoff(Duration::from_millis(10)),
        )
        .with_rate_limit(RateLimitConfig::unlimited())
}

pub fn client(server: &MockServer) -> IgClient {
    init_logging();
    IgClient::new(credentials(), config(server)).unwrap()
}

pub fn oauth_client(config: ClientConfig) -> IgClient {
    init_logging();
    IgClient::new(credentials().with_auth_mode(AuthMode::OAuth), config).unwrap()
}

/// A successful v2 login handing out `cst`.
pub fn login_v2_response(cst: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("CST", cst)
        .insert_header("X-SECURITY-TOKEN", format!("xst-{}", cst).as_str())
        .set_body_json(json!({
            "accountType": "CFD",
            "currencyIsoCode": "GBP",
            "currentAccountId": ACCOUNT_ID,
            "clientId": "100234",
            "lightstreamerEndpoint": "https://demo-apd.marketdatasystems.com"
        }))
}

/// A successful v3 login handing out `access_token` valid for `expires_in` seconds.
pub fn login_v3_response(access_token: &str, expires_in: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "clientId": "100234",
        "accountId": ACCOUNT_ID,
        "timezoneOffset": 0,
        "lightstreamerEndpoint": "https://demo-apd.marketdatasystems.com",
        "oauthToken": {
            "access_token": access_token,
            "refresh_token": format!("refresh-{}", access_token),
            "scope": "profile",
            "token_type": "Bearer",
            "expires_in": expires_in
        }
    }))
}

/// Mount a v2 login expected exactly `times` times.
pub async fn mount_login(server: &MockServer, times: u64) {
    Mock::given(method("POST"))
        .and(path("/session"))
        .and(header("Version", "2"))
        .and(header("X-IG-API-KEY", API_KEY))
        .respond_with(login_v2_response("cst-1"))
        .expect(times)
        .mount(server)
        .await;
}

pub fn accounts_body() -> serde_json::Value {
    json!({
        "accounts": [{
            "accountId": ACCOUNT_ID,
            "accountName": "CFD",
            "accountAlias": null,
            "status": "ENABLED",
            "accountType": "CFD",
            "preferred": true,
            "balance": {"balance": 10000.0, "deposit": 250.0, "profitLoss": -12.5, "available": 9737.5},
            "currency": "GBP",
            "canTransferFrom": true,
            "canTransferTo": true
        }]
    })
}

pub fn market_json(status: &str) -> serde_json::Value {
    json!({
        "epic": "CS.D.EURUSD.MINI.IP",
        "instrumentName": "EUR/USD Mini",
        "instrumentType": "CURRENCIES",
        "expiry": "-",
        "marketStatus": status,
        "bid": 1.0900,
        "offer": 1.0902,
        "high": 1.0921,
        "low": 1.0876,
        "streamingPricesAvailable": true
    })
}

pub fn position_json(deal_id: &str, deal_reference: &str) -> serde_json::Value {
    json!({
        "position": {
            "contractSize": 1.0,
            "createdDateUTC": "2024-03-01T09:15:02",
            "dealId": deal_id,
            "dealReference": deal_reference,
            "size": 2.0,
            "direction": "BUY",
            "level": 1.0902,
            "limitLevel": 1.1000,
            "stopLevel": 1.0800,
            "currency": "USD",
            "controlledRisk": false
        },
        "market": market_json("TRADEABLE")
    })
}
