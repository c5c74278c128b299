//! Service-level tests against a mock IG gateway.
//!
//! Every test mounts a v2 login plus the endpoints it touches and checks the
//! request shape (path, `Version` header, query and body) as well as the
//! decoded response.

mod common;

use chrono::NaiveDate;
use futures_util::StreamExt;
use rust_decimal_macros::dec;
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;
use ig_rest_rs::models::{
    ActivityQuery, DealStatus, Direction, MarketStatus, OpenPositionBuilder, OperationStatus,
    Resolution, TransactionQuery, TransactionType, UpdatePositionBuilder, WorkingOrderType,
};
use ig_rest_rs::{AccountId, DealId, DealReference, Epic, Error, WatchlistId};

async fn setup() -> (MockServer, ig_rest_rs::IgClient) {
    let server = MockServer::start().await;
    mount_login(&server, 1).await;
    let client = client(&server);
    (server, client)
}

fn ok(body: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(body)
}

// =============================================================================
// Accounts
// =============================================================================

#[tokio::test]
async fn test_list_accounts() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .and(header("Version", "1"))
        .respond_with(ok(accounts_body()))
        .expect(1)
        .mount(&server)
        .await;

    let accounts = client.accounts().list().await.unwrap();
    assert_eq!(accounts.len(), 1);
    let balance = accounts[0].balance.as_ref().unwrap();
    assert_eq!(balance.available, dec!(9737.5));
    assert_eq!(balance.profit_loss, dec!(-12.5));
    assert!(accounts[0].preferred);
}

#[tokio::test]
async fn test_account_session_logs_in() {
    let (_server, client) = setup().await;
    let info = client.accounts().session().await.unwrap();
    assert_eq!(info.account_id.as_str(), ACCOUNT_ID);
}

#[tokio::test]
async fn test_switch_account_forces_new_session() {
    let server = MockServer::start().await;
    mount_login(&server, 2).await;
    Mock::given(method("PUT"))
        .and(path("/session"))
        .and(header("Version", "1"))
        .and(body_json(json!({"accountId": "XYZ999", "defaultAccount": true})))
        .respond_with(ok(json!({"trailingStopsEnabled": false, "dealingEnabled": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/accounts"))
        .respond_with(ok(accounts_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    client
        .accounts()
        .switch(&AccountId::new("XYZ999"))
        .await
        .unwrap();
    assert!(!client.session().is_logged_in().await);

    client.accounts().list().await.unwrap();
}

// =============================================================================
// Markets and prices
// =============================================================================

#[tokio::test]
async fn test_market_search() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/markets"))
        .and(query_param("searchTerm", "EUR/USD"))
        .respond_with(ok(json!({"markets": [market_json("TRADEABLE")]})))
        .expect(2)
        .mount(&server)
        .await;

    let markets = client.markets().search("EUR/USD").await.unwrap();
    assert_eq!(markets.len(), 1);
    assert_eq!(markets[0].market_status, MarketStatus::Tradeable);

    let first = client.markets().search_first("EUR/USD").await.unwrap();
    assert_eq!(first.epic.as_str(), "CS.D.EURUSD.MINI.IP");
    assert_eq!(first.dealing_price(Direction::Buy), Some(dec!(1.0902)));
}

#[tokio::test]
async fn test_market_search_without_results() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/markets"))
        .respond_with(ok(json!({"markets": []})))
        .mount(&server)
        .await;

    let err = client.markets().search_first("nothing").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_market_details() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/markets/IX.D.FTSE.DAILY.IP"))
        .and(header("Version", "3"))
        .respond_with(ok(json!({
            "instrument": {
                "epic": "IX.D.FTSE.DAILY.IP",
                "name": "FTSE 100",
                "type": "INDICES",
                "currencies": [{"code": "GBP", "isDefault": true}]
            },
            "dealingRules": {
                "minDealSize": {"unit": "POINTS", "value": 0.5},
                "minNormalStopOrLimitDistance": {"unit": "POINTS", "value": 4},
                "maxStopOrLimitDistance": {"unit": "PERCENTAGE", "value": 75}
            },
            "snapshot": {"marketStatus": "TRADEABLE", "bid": 7612.3, "offer": 7613.3}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let details = client
        .markets()
        .get(&Epic::new("IX.D.FTSE.DAILY.IP"))
        .await
        .unwrap();
    assert_eq!(details.instrument.name, "FTSE 100");
    assert_eq!(details.dealing_rules.min_deal_size.value, dec!(0.5));
    assert_eq!(details.snapshot.offer, Some(dec!(7613.3)));
}

fn price_history_body(remaining: i64) -> serde_json::Value {
    json!({
        "prices": [{
            "snapshotTime": "2024/03/01 08:00:00",
            "openPrice": {"bid": 1.0900, "ask": 1.0902},
            "closePrice": {"bid": 1.0910, "ask": 1.0912},
            "highPrice": {"bid": 1.0915, "ask": 1.0917},
            "lowPrice": {"bid": 1.0895, "ask": 1.0897},
            "lastTradedVolume": 120
        }],
        "instrumentType": "CURRENCIES",
        "allowance": {"remainingAllowance": remaining, "totalAllowance": 10000, "allowanceExpiry": 3600}
    })
}

#[tokio::test]
async fn test_price_history() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path_regex(
            r"^/prices/CS\.D\.EURUSD\.MINI\.IP/HOUR/2024-03-01%2008%3A00%3A00/2024-03-01%2016%3A00%3A00$",
        ))
        .and(header("Version", "2"))
        .respond_with(ok(price_history_body(9990)))
        .expect(1)
        .mount(&server)
        .await;

    let day = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let history = client
        .prices()
        .history(
            &Epic::new("CS.D.EURUSD.MINI.IP"),
            Resolution::Hour,
            day.and_hms_opt(8, 0, 0).unwrap(),
            day.and_hms_opt(16, 0, 0).unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(history.prices.len(), 1);
    assert_eq!(history.prices[0].close_price.mid(), Some(dec!(1.0911)));
    assert_eq!(history.allowance.remaining_allowance, 9990);
}

#[tokio::test]
async fn test_price_allowance() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/prices/DO\.D\.EURO\.19\.IP/DAY/"))
        .respond_with(ok(price_history_body(4200)))
        .expect(1)
        .mount(&server)
        .await;

    let allowance = client.prices().allowance().await.unwrap();
    assert_eq!(allowance.remaining_allowance, 4200);
    assert_eq!(allowance.total_allowance, 10000);
}

// =============================================================================
// Positions and deals
// =============================================================================

#[tokio::test]
async fn test_list_and_find_positions() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/positions"))
        .and(header("Version", "2"))
        .respond_with(ok(json!({"positions": [
            position_json("DIAAAA1", "REF1"),
            position_json("DIAAAA2", "REF2")
        ]})))
        .expect(3)
        .mount(&server)
        .await;

    let positions = client.positions().list().await.unwrap();
    assert_eq!(positions.len(), 2);
    assert_eq!(positions[0].position.size, dec!(2));

    let found = client
        .positions()
        .find_by_deal_reference(&DealReference::new("REF2"))
        .await
        .unwrap();
    assert_eq!(found.position.deal_id.as_str(), "DIAAAA2");

    let err = client
        .positions()
        .find_by_deal_reference(&DealReference::new("MISSING"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_get_position() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/positions/DIAAAA1"))
        .respond_with(ok(position_json("DIAAAA1", "REF1")))
        .expect(1)
        .mount(&server)
        .await;

    let position = client.positions().get(&DealId::new("DIAAAA1")).await.unwrap();
    assert_eq!(position.position.direction, Direction::Buy);
    assert_eq!(position.position.limit_level, Some(dec!(1.1)));
}

#[tokio::test]
async fn test_open_position_and_confirm() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/positions/otc"))
        .and(header("Version", "2"))
        .and(body_partial_json(json!({
            "epic": "CS.D.EURUSD.MINI.IP",
            "direction": "BUY",
            "orderType": "MARKET",
            "size": 1.0,
            "stopDistance": 20.0,
            "limitDistance": 40.0
        })))
        .respond_with(ok(json!({"dealReference": "OPEN1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/confirms/OPEN1"))
        .and(header("Version", "1"))
        .respond_with(ok(json!({
            "dealReference": "OPEN1",
            "dealId": "DIAAAA9",
            "dealStatus": "ACCEPTED",
            "status": "OPEN",
            "reason": "SUCCESS",
            "epic": "CS.D.EURUSD.MINI.IP",
            "direction": "BUY",
            "level": 1.0902,
            "size": 1.0,
            "affectedDeals": [{"dealId": "DIAAAA9", "status": "OPENED"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let market: ig_rest_rs::models::MarketSummary =
        serde_json::from_value(market_json("TRADEABLE")).unwrap();
    let order = OpenPositionBuilder::new(&market, Direction::Buy, dec!(1))
        .stop_distance(dec!(20))
        .limit_distance(dec!(40))
        .build()
        .unwrap();

    let reference = client.positions().open(&order).await.unwrap();
    assert_eq!(reference.as_str(), "OPEN1");

    let confirmation = client.positions().confirm(&reference).await.unwrap();
    assert!(confirmation.is_accepted());
    assert_eq!(confirmation.deal_status, DealStatus::Accepted);
    assert_eq!(confirmation.affected_deals.len(), 1);
}

#[tokio::test]
async fn test_rejected_deal_surfaces_in_confirmation() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/confirms/OPEN2"))
        .respond_with(ok(json!({
            "dealReference": "OPEN2",
            "dealStatus": "REJECTED",
            "reason": "MARKET_CLOSED_WITH_EDITS"
        })))
        .mount(&server)
        .await;

    let confirmation = client
        .positions()
        .confirm(&DealReference::new("OPEN2"))
        .await
        .unwrap();
    assert!(!confirmation.is_accepted());
    assert_eq!(confirmation.reason.as_deref(), Some("MARKET_CLOSED_WITH_EDITS"));
}

#[tokio::test]
async fn test_update_position_keeps_current_stop() {
    let (server, client) = setup().await;
    Mock::given(method("PUT"))
        .and(path("/positions/otc/DIAAAA1"))
        .and(header("Version", "2"))
        .and(body_json(json!({
            "limitLevel": 1.12,
            "stopLevel": 1.08,
            "trailingStop": false
        })))
        .respond_with(ok(json!({"dealReference": "UPD1"})))
        .expect(1)
        .mount(&server)
        .await;

    let position: ig_rest_rs::models::OpenPosition =
        serde_json::from_value(position_json("DIAAAA1", "REF1")).unwrap();
    let builder = UpdatePositionBuilder::new(&position).limit_level(dec!(1.12));
    let deal_id = builder.deal_id().clone();
    let update = builder.build().unwrap();

    let reference = client.positions().update(&deal_id, &update).await.unwrap();
    assert_eq!(reference.as_str(), "UPD1");
}

#[tokio::test]
async fn test_deal_rejected_by_gateway() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/positions/otc"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"errorCode": "validation.invalid.size"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let market: ig_rest_rs::models::MarketSummary =
        serde_json::from_value(market_json("TRADEABLE")).unwrap();
    let order = OpenPositionBuilder::new(&market, Direction::Sell, dec!(0.01))
        .stop_distance(dec!(20))
        .limit_distance(dec!(40))
        .build()
        .unwrap();

    let err = client.positions().open(&order).await.unwrap_err();
    assert_eq!(err.error_code(), Some("validation.invalid.size"));
}

#[tokio::test]
async fn test_list_working_orders() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/workingorders"))
        .and(header("Version", "2"))
        .respond_with(ok(json!({"workingOrders": [{
            "workingOrderData": {
                "dealId": "DIWO1",
                "direction": "SELL",
                "epic": "CS.D.EURUSD.MINI.IP",
                "orderSize": 1.5,
                "orderLevel": 1.1050,
                "orderType": "LIMIT",
                "timeInForce": "GOOD_TILL_CANCELLED",
                "guaranteedStop": false,
                "dma": false
            },
            "marketData": market_json("TRADEABLE")
        }]})))
        .expect(1)
        .mount(&server)
        .await;

    let orders = client.working_orders().list().await.unwrap();
    assert_eq!(orders.len(), 1);
    let data = &orders[0].working_order_data;
    assert_eq!(data.order_type, WorkingOrderType::Limit);
    assert_eq!(data.order_size, dec!(1.5));
}

// =============================================================================
// Watchlists
// =============================================================================

#[tokio::test]
async fn test_watchlist_lookup_and_markets() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/watchlists"))
        .respond_with(ok(json!({"watchlists": [
            {"id": "Popular Markets", "name": "Popular Markets", "editable": false, "deleteable": false, "defaultSystemWatchlist": true},
            {"id": "12345", "name": "FX majors", "editable": true, "deleteable": true, "defaultSystemWatchlist": false}
        ]})))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/watchlists/12345"))
        .respond_with(ok(json!({"markets": [market_json("TRADEABLE")]})))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(client.watchlists().list().await.unwrap().len(), 2);

    let fx = client.watchlists().find_by_name("FX majors").await.unwrap();
    assert_eq!(fx.id.as_str(), "12345");
    let markets = client.watchlists().get(&fx.id).await.unwrap();
    assert_eq!(markets[0].epic.as_str(), "CS.D.EURUSD.MINI.IP");

    let err = client.watchlists().find_by_name("Indices").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_watchlist_mutations() {
    let (server, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/watchlists"))
        .and(body_json(json!({"name": "FX majors", "epics": ["CS.D.EURUSD.MINI.IP"]})))
        .respond_with(ok(json!({"watchlistId": "12345", "status": "SUCCESS"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/watchlists"))
        .and(body_json(json!({"name": "Empty"})))
        .respond_with(ok(json!({"watchlistId": "67890", "status": "SUCCESS"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/watchlists/12345"))
        .and(body_json(json!({"epic": "IX.D.FTSE.DAILY.IP"})))
        .respond_with(ok(json!({"status": "SUCCESS"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/watchlists/12345/IX.D.FTSE.DAILY.IP"))
        .respond_with(ok(json!({"status": "SUCCESS"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/watchlists/12345"))
        .respond_with(ok(json!({"status": "FAILURE"})))
        .expect(1)
        .mount(&server)
        .await;

    let watchlists = client.watchlists();
    let created = watchlists
        .create("FX majors", &[Epic::new("CS.D.EURUSD.MINI.IP")])
        .await
        .unwrap();
    assert_eq!(created.watchlist_id.as_str(), "12345");
    assert!(created.status.is_success());

    let empty = watchlists.create("Empty", &[]).await.unwrap();
    assert_eq!(empty.watchlist_id.as_str(), "67890");

    let id = WatchlistId::new("12345");
    let ftse = Epic::new("IX.D.FTSE.DAILY.IP");
    assert_eq!(
        watchlists.add_market(&id, &ftse).await.unwrap(),
        OperationStatus::Success
    );
    assert_eq!(
        watchlists.remove_market(&id, &ftse).await.unwrap(),
        OperationStatus::Success
    );
    assert!(!watchlists.delete(&id).await.unwrap().is_success());
}

// =============================================================================
// History
// =============================================================================

fn activity_json(deal_id: &str, date: &str) -> serde_json::Value {
    json!({
        "date": date,
        "epic": "CS.D.EURUSD.MINI.IP",
        "period": "-",
        "dealId": deal_id,
        "channel": "PUBLIC_WEB_API",
        "type": "POSITION",
        "status": "ACCEPTED",
        "description": "Position opened"
    })
}

#[tokio::test]
async fn test_activity_stream_follows_pages() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/history/activity"))
        .and(header("Version", "3"))
        .and(query_param("from", "2024-03-01T00:00:00"))
        .and(query_param("pageSize", "2"))
        .respond_with(ok(json!({
            "activities": [
                activity_json("DIA1", "2024-03-01T09:30:00"),
                activity_json("DIA2", "2024-03-01T09:31:00")
            ],
            "metadata": {"paging": {
                "size": 2,
                "next": "/history/activity?version=3&from=2024-03-01T09:31:01&detailed=false&pageSize=2"
            }}
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/history/activity"))
        .and(query_param("from", "2024-03-01T09:31:01"))
        .respond_with(ok(json!({
            "activities": [activity_json("DIA3", "2024-03-01T10:00:00")],
            "metadata": {"paging": {"size": 1, "next": null}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let from = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let activities: Vec<_> = client
        .history()
        .activity_stream(ActivityQuery::since(from).page_size(2))
        .collect()
        .await;

    let deal_ids: Vec<_> = activities
        .into_iter()
        .map(|a| a.unwrap().deal_id.unwrap().to_string())
        .collect();
    assert_eq!(deal_ids, ["DIA1", "DIA2", "DIA3"]);
}

#[tokio::test]
async fn test_activity_single_page() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/history/activity"))
        .and(query_param("detailed", "true"))
        .respond_with(ok(json!({
            "activities": [activity_json("DIA1", "2024-03-01T09:30:00")],
            "metadata": {"paging": {"size": 1, "next": null}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let from = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let page = client
        .history()
        .activity(&ActivityQuery::since(from).detailed(true))
        .await
        .unwrap();
    assert_eq!(page.activities.len(), 1);
    assert!(page.next_link().is_none());
}

#[tokio::test]
async fn test_transactions_filtered_by_type() {
    let (server, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/history/transactions"))
        .and(header("Version", "2"))
        .and(query_param("type", "DEPOSIT"))
        .and(query_param("from", "2024-01-01T00:00:00"))
        .respond_with(ok(json!({
            "transactions": [{
                "date": "2024-01-05",
                "dateUtc": "2024-01-05T10:00:00",
                "instrumentName": "Bank Deposit",
                "period": "-",
                "profitAndLoss": "£1,000.00",
                "transactionType": "DEPO",
                "reference": "DEP1",
                "currency": "£",
                "cashTransaction": true
            }],
            "metadata": {"pageData": {"pageNumber": 1, "pageSize": 20, "totalPages": 1}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let from = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let transactions = client
        .history()
        .transactions(&TransactionQuery::since(from).transaction_type(TransactionType::Deposit))
        .await
        .unwrap();

    assert_eq!(transactions.len(), 1);
    assert!(transactions[0].cash_transaction);
    assert_eq!(transactions[0].transaction_type, "DEPO");
}
