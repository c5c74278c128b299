//! Deal placement example.
//!
//! Looks up EUR/USD, builds a market order validated against the market's
//! dealing rules, submits it and waits for the confirmation. The submission
//! itself is commented out so running this never trades by accident.
//!
//! Requires `IG_API_KEY`, `IG_IDENTIFIER` and `IG_PASSWORD`.
//!
//! Run with: cargo run --example place_order

use ig_rest_rs::models::{Direction, OpenPositionBuilder};
use ig_rest_rs::{ClientConfig, Credentials, Environment, Error, IgClient};
use rust_decimal_macros::dec;

#[tokio::main]
async fn main() -> ig_rest_rs::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let credentials = Credentials::from_env()?;
    if credentials.environment() != Environment::Demo {
        return Err(Error::Config("this example only runs against the demo environment".into()));
    }

    let client = IgClient::connect(credentials, ClientConfig::default()).await?;

    let market = client.markets().search_first("EUR/USD").await?;
    println!(
        "{} ({}): bid {:?} / offer {:?}, {:?}",
        market.instrument_name, market.epic, market.bid, market.offer, market.market_status
    );

    let details = client.markets().get(&market.epic).await?;

    let order = OpenPositionBuilder::new(&market, Direction::Buy, dec!(1))
        .stop_distance(dec!(20))
        .limit_distance(dec!(40))
        .dealing_rules(&details.dealing_rules)
        .build()?;
    println!("\nOrder passed local validation: {:?}", order);

    // Uncomment to actually place the order:
    // let reference = client.positions().open(&order).await?;
    // let confirmation = client.positions().confirm(&reference).await?;
    // println!("Deal {:?}: {:?} ({:?})", confirmation.deal_id, confirmation.deal_status, confirmation.reason);

    println!("\n(Order not actually placed - uncomment code to place)");

    for position in client.positions().list().await? {
        println!(
            "Open: {} {:?} {} @ {}",
            position.market.epic,
            position.position.direction,
            position.position.size,
            position.position.level
        );
    }

    client.logout().await?;
    println!("Done!");
    Ok(())
}
