//! Request dispatch against a mock IG gateway: classification, bounded
//! retries, re-login on rejected sessions, provider rate limits and
//! deadlines.

mod common;

use std::time::Duration;

use serde_json::json;
use tokio::time::Instant;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;
use ig_rest_rs::client::{Category, Endpoint, Request};
use ig_rest_rs::{BucketConfig, Error, ErrorKind, IgClient, RateLimitConfig, RetryPolicy};

async fn mount_accounts_status(server: &MockServer, template: ResponseTemplate, times: u64) {
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(template)
        .expect(times)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_server_errors_are_retried_up_to_max_attempts() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    mount_accounts_status(
        &server,
        ResponseTemplate::new(503).set_body_json(json!({"errorCode": "system.unavailable"})),
        3,
    )
    .await;

    let err = client(&server).accounts().list().await.unwrap_err();
    match err {
        Error::Server { status, code } => {
            assert_eq!(status, 503);
            assert_eq!(code.as_deref(), Some("system.unavailable"));
        }
        other => panic!("expected server error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_server_error_then_success() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_accounts_status(
        &server,
        ResponseTemplate::new(200).set_body_json(accounts_body()),
        1,
    )
    .await;

    let accounts = client(&server).accounts().list().await.unwrap();
    assert_eq!(accounts[0].account_id.as_str(), ACCOUNT_ID);
}

#[tokio::test]
async fn test_no_retry_policy_sends_once() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    mount_accounts_status(&server, ResponseTemplate::new(500), 1).await;

    let client = IgClient::new(
        credentials(),
        config(&server).with_retry(RetryPolicy::no_retry()),
    )
    .unwrap();
    let err = client.accounts().list().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Server);
}

#[tokio::test]
async fn test_validation_errors_are_not_retried() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    mount_accounts_status(
        &server,
        ResponseTemplate::new(400)
            .set_body_json(json!({"errorCode": "validation.null-not-allowed.request"})),
        1,
    )
    .await;

    let err = client(&server).accounts().list().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.error_code(), Some("validation.null-not-allowed.request"));
    assert!(err.is_client_error());
}

#[tokio::test]
async fn test_persistent_unauthorized_relogs_in_once() {
    let server = MockServer::start().await;
    mount_login(&server, 2).await;
    mount_accounts_status(
        &server,
        ResponseTemplate::new(401)
            .set_body_json(json!({"errorCode": "error.security.client-token-invalid"})),
        2,
    )
    .await;

    let err = client(&server).accounts().list().await.unwrap_err();
    match err {
        Error::Authentication { reason } => {
            assert_eq!(reason, "error.security.client-token-invalid")
        }
        other => panic!("expected authentication error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_rejected_session_recovers_after_relogin() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(login_v2_response("stale"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(login_v2_response("fresh"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .and(header("CST", "stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .and(header("CST", "fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(accounts_body()))
        .expect(1)
        .mount(&server)
        .await;

    let accounts = client(&server).accounts().list().await.unwrap();
    assert_eq!(accounts.len(), 1);
}

#[tokio::test]
async fn test_security_forbidden_is_authentication() {
    let server = MockServer::start().await;
    mount_login(&server, 2).await;
    mount_accounts_status(
        &server,
        ResponseTemplate::new(403)
            .set_body_json(json!({"errorCode": "error.security.account-token-invalid"})),
        2,
    )
    .await;

    let err = client(&server).accounts().list().await.unwrap_err();
    assert!(err.is_auth_error());
}

#[tokio::test]
async fn test_provider_rate_limit_honours_retry_after() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "1"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_accounts_status(
        &server,
        ResponseTemplate::new(200).set_body_json(accounts_body()),
        1,
    )
    .await;

    let client = IgClient::new(
        credentials(),
        config(&server).with_rate_limit(RateLimitConfig::default()),
    )
    .unwrap();

    let start = Instant::now();
    client.accounts().list().await.unwrap();
    assert!(start.elapsed() >= Duration::from_secs(1));

    // The trading bucket was never touched.
    assert!(client.rate_limiter().blocked_for(Category::Trading).await.is_none());
}

#[tokio::test]
async fn test_allowance_error_code_is_rate_limit() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    mount_accounts_status(
        &server,
        ResponseTemplate::new(403)
            .set_body_json(json!({"errorCode": "error.public-api.exceeded-account-allowance"})),
        1,
    )
    .await;

    let client = IgClient::new(
        credentials(),
        config(&server)
            .with_retry(RetryPolicy::no_retry())
            .with_rate_limit(RateLimitConfig::default()),
    )
    .unwrap();

    let err = client.accounts().list().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);

    // Without a Retry-After the default backoff blocks the category.
    let blocked = client.rate_limiter().blocked_for(Category::NonTrading).await;
    assert!(blocked.is_some());
}

#[tokio::test]
async fn test_deadline_cancels_slow_request() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(accounts_body())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client = client(&server);
    let start = Instant::now();
    let err = client
        .execute_with_deadline(
            &Request::new(Endpoint::ACCOUNTS),
            Instant::now() + Duration::from_millis(300),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout));
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_http_timeout_is_transport_error() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    mount_accounts_status(
        &server,
        ResponseTemplate::new(200).set_delay(Duration::from_millis(500)),
        1,
    )
    .await;

    let client = IgClient::new(
        credentials(),
        config(&server)
            .with_timeout(Duration::from_millis(100))
            .with_retry(RetryPolicy::no_retry()),
    )
    .unwrap();
    let err = client.accounts().list().await.unwrap_err();
    assert!(matches!(err, Error::Timeout));
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn test_delete_with_body_is_sent_as_post_override() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("POST"))
        .and(path("/positions/otc"))
        .and(header("_method", "DELETE"))
        .and(header("Version", "1"))
        .and(body_partial_json(json!({"dealId": "DIAAAAPQ7NW8ZAM", "direction": "SELL"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"dealReference": "CLOSE1"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let request = Request::new(Endpoint::CLOSE_POSITION)
        .json(&json!({"dealId": "DIAAAAPQ7NW8ZAM", "direction": "SELL", "size": 1, "orderType": "MARKET"}))
        .unwrap();
    let response = client.execute(&request).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.json::<serde_json::Value>().unwrap()["dealReference"],
        "CLOSE1"
    );
}

#[tokio::test]
async fn test_delete_without_body_stays_delete() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("DELETE"))
        .and(path("/watchlists/12345"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "SUCCESS"})))
        .expect(1)
        .mount(&server)
        .await;

    let request = Request::new(Endpoint::DELETE_WATCHLIST).path_param("watchlistId", "12345");
    client(&server).execute(&request).await.unwrap();
}

#[tokio::test]
async fn test_common_headers_are_sent() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    Mock::given(method("GET"))
        .and(path("/markets/IX.D.FTSE.DAILY.IP"))
        .and(header("X-IG-API-KEY", API_KEY))
        .and(header("Version", "3"))
        .and(header("Accept", "application/json; charset=UTF-8"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let request = Request::new(Endpoint::MARKET).path_param("epic", "IX.D.FTSE.DAILY.IP");
    client(&server).execute(&request).await.unwrap();
}

fn throttled_config(server: &MockServer, bucket: BucketConfig, max_wait: Duration) -> ig_rest_rs::ClientConfig {
    config(server).with_rate_limit(
        RateLimitConfig::default()
            .with_non_trading(bucket)
            .with_max_wait(max_wait),
    )
}

async fn login_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "POST" && r.url.path() == "/session")
        .count()
}

#[tokio::test]
async fn test_local_rate_limit_surfaces_after_retries_are_used_up() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    mount_accounts_status(
        &server,
        ResponseTemplate::new(200).set_body_json(accounts_body()),
        1,
    )
    .await;

    // One token a minute, and no waiting longer than 100ms for it.
    let client = IgClient::new(
        credentials(),
        throttled_config(
            &server,
            BucketConfig::new(1, Duration::from_secs(60)),
            Duration::from_millis(100),
        ),
    )
    .unwrap();

    client.accounts().list().await.unwrap();

    let start = Instant::now();
    let err = client.accounts().list().await.unwrap_err();
    match err {
        Error::RateLimitExceeded { retry_after } => assert!(retry_after.is_some()),
        other => panic!("expected rate limit error, got {:?}", other),
    }
    // Three refusals with 10ms and 20ms backoff between them.
    assert!(start.elapsed() >= Duration::from_millis(30));
}

#[tokio::test]
async fn test_local_rate_limit_refusal_is_retried() {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    mount_accounts_status(
        &server,
        ResponseTemplate::new(200).set_body_json(accounts_body()),
        2,
    )
    .await;

    let client = IgClient::new(
        credentials(),
        throttled_config(
            &server,
            BucketConfig::new(1, Duration::from_millis(400)),
            Duration::from_millis(50),
        )
        .with_retry(
            RetryPolicy::default()
                .with_jitter(false)
                .with_max_attempts(2)
                .with_initial_backoff(Duration::from_millis(500)),
        ),
    )
    .unwrap();

    client.accounts().list().await.unwrap();

    // Refused at first, then the backoff outlasts the refill.
    let start = Instant::now();
    client.accounts().list().await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(500));
}

#[tokio::test]
async fn test_session_expiring_during_rate_limit_wait_is_renewed() {
    let server = MockServer::start().await;
    mount_login(&server, 2).await;
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .and(header("CST", "cst-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(accounts_body()))
        .expect(2)
        .mount(&server)
        .await;

    let client = IgClient::new(
        credentials(),
        throttled_config(
            &server,
            BucketConfig::new(1, Duration::from_secs(1)),
            Duration::from_secs(30),
        )
        .with_session_ttl(Duration::from_millis(500))
        .with_refresh_margin(Duration::ZERO),
    )
    .unwrap();

    client.accounts().list().await.unwrap();
    assert_eq!(login_count(&server).await, 1);

    // The second call waits about a second for a token, outliving the session.
    let start = Instant::now();
    client.accounts().list().await.unwrap();
    assert!(start.elapsed() >= Duration::from_millis(900));
    assert_eq!(login_count(&server).await, 2);
}

#[tokio::test]
async fn test_session_expiring_during_retry_backoff_is_renewed() {
    let server = MockServer::start().await;
    mount_login(&server, 2).await;
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_accounts_status(
        &server,
        ResponseTemplate::new(200).set_body_json(accounts_body()),
        1,
    )
    .await;

    let client = IgClient::new(
        credentials(),
        config(&server)
            .with_session_ttl(Duration::from_millis(300))
            .with_refresh_margin(Duration::ZERO)
            .with_retry(
                RetryPolicy::default()
                    .with_jitter(false)
                    .with_initial_backoff(Duration::from_millis(500)),
            ),
    )
    .unwrap();

    client.accounts().list().await.unwrap();
    assert_eq!(login_count(&server).await, 2);
}
