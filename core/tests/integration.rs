//! Integration tests for manual API testing.
//!
//! Run with: cargo test --test integration -- --nocapture --ignored
//!
//! Expects a regtest swap service at `API_URL`.

mod common;

use common::InMemoryChannel;
use lnswap_core::{ApiClient, Client, ClientConfig, Direction, Error, Network};

const API_URL: &str = "http://localhost:9001/v2";

#[tokio::test]
#[ignore]
async fn test_fetch_quotes() {
    let client = Client::new(
        ClientConfig::with_api_url(API_URL, Network::Regtest),
        InMemoryChannel::new(),
    );

    let (submarine, reverse) = client.get_quotes().await.unwrap();
    println!("submarine: {submarine:?}");
    println!("reverse: {reverse:?}");

    assert_eq!(submarine.direction, Direction::Submarine);
    assert!(submarine.min_limit <= submarine.max_limit);

    let mut form = client.trade_form().await.unwrap();
    let min_send = form.min_send();
    form.set_send_input(&min_send.to_string());
    assert!(form.validate().is_ok());
}

#[tokio::test]
#[ignore]
async fn test_create_swap_rejects_foreign_invoice() {
    let client = Client::new(
        ClientConfig::with_api_url(API_URL, Network::Regtest),
        InMemoryChannel::new(),
    );

    // decodes locally, but the service never issued it for this node
    let invoice = common::invoice([0x01; 32], 50_000);
    match client.create_submarine_swap(&invoice).await {
        Err(Error::Service(message)) => println!("service said: {message}"),
        Ok(session) => println!("created swap {}", session.record().id()),
        Err(e) => panic!("unexpected error: {e}"),
    }
}

#[tokio::test]
#[ignore]
async fn test_raw_fee_schedule() {
    let api = ApiClient::new(API_URL);
    let pair = api.get_fee_schedule(Direction::Reverse).await.unwrap();
    println!("{}", serde_json::to_string_pretty(&pair).unwrap());
}
