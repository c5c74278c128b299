//! Basic authentication example.
//!
//! Logs in to the IG demo environment, prints the session and the accounts
//! of the client, then logs out.
//!
//! Requires `IG_API_KEY`, `IG_IDENTIFIER` and `IG_PASSWORD`.
//!
//! Run with: cargo run --example basic_auth

use ig_rest_rs::{ClientConfig, Credentials, IgClient};

#[tokio::main]
async fn main() -> ig_rest_rs::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let credentials = Credentials::from_env()?;
    println!("Connecting to IG ({})...", credentials.environment());

    let client = IgClient::connect(credentials, ClientConfig::default()).await?;
    println!("Successfully authenticated!");

    let session = client.accounts().session().await?;
    println!("Active account: {}", session.account_id);

    let accounts = client.accounts().list().await?;
    println!("\nFound {} account(s):", accounts.len());

    for account in &accounts {
        println!(
            "  - {} ({}){}",
            account.account_id,
            account.account_name,
            if account.preferred { " [preferred]" } else { "" }
        );
        if let Some(balance) = &account.balance {
            println!("    Balance: {}", balance.balance);
            println!("    Available: {}", balance.available);
            println!("    P&L: {}", balance.profit_loss);
        }
    }

    let allowance = client.prices().allowance().await?;
    println!(
        "\nHistorical data allowance: {}/{}",
        allowance.remaining_allowance, allowance.total_allowance
    );

    client.logout().await?;
    println!("\nDone!");
    Ok(())
}
