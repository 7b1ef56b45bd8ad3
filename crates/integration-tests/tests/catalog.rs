//! Catalog client against the listing endpoint.

use std::time::Duration;

use campus_market_core::{ContactAction, ProductFilter, ProductId};
use campus_market_integration_tests::{MockMarket, sample_products};
use campus_market_storefront::api::ApiClient;
use campus_market_storefront::catalog::{CatalogClient, CatalogError};

async fn catalog(market: &MockMarket, ttl: Duration) -> CatalogClient {
    let url = market.serve().await.unwrap();
    CatalogClient::new(ApiClient::new(reqwest::Client::new(), &url), ttl)
}

#[tokio::test]
async fn test_listings_are_cached() {
    let market = MockMarket::new(sample_products());
    let catalog = catalog(&market, Duration::from_secs(300)).await;

    assert_eq!(catalog.products().await.unwrap().len(), 4);
    assert_eq!(catalog.products().await.unwrap().len(), 4);
    assert_eq!(market.product_requests(), 1);

    catalog.invalidate().await;
    catalog.products().await.unwrap();
    assert_eq!(market.product_requests(), 2);
}

#[tokio::test]
async fn test_find_normalizes_ids() {
    let market = MockMarket::new(sample_products());
    let catalog = catalog(&market, Duration::from_secs(300)).await;

    let book = catalog.find(&ProductId::from(42_i64)).await.unwrap().unwrap();
    assert_eq!(book.title, "Calculus Textbook");

    let calculator = catalog.find(&ProductId::from("5")).await.unwrap().unwrap();
    assert_eq!(calculator.title, "Scientific Calculator");

    assert!(catalog.find(&ProductId::from("missing")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_search_filters_and_orders_sold_last() {
    let market = MockMarket::new(sample_products());
    let catalog = catalog(&market, Duration::from_secs(300)).await;

    let everything = catalog.search(&ProductFilter::default()).await.unwrap();
    let titles: Vec<&str> = everything.iter().map(|p| p.title.as_str()).collect();
    assert_eq!(
        titles,
        ["Desk Lamp", "Calculus Textbook", "Scientific Calculator", "Free Mug"]
    );

    let filter = ProductFilter {
        query: Some("CALC".to_string()),
        category: Some("textbooks".to_string()),
    };
    let hits = catalog.search(&filter).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].title, "Calculus Textbook");
}

#[tokio::test]
async fn test_failure_is_reported_and_not_cached() {
    let market = MockMarket::new(sample_products());
    let catalog = catalog(&market, Duration::from_secs(300)).await;

    market.fail_products(true);
    assert!(matches!(catalog.products().await, Err(CatalogError::Api(_))));

    market.fail_products(false);
    assert_eq!(catalog.products().await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_contact_links_from_listings() {
    let market = MockMarket::new(sample_products());
    let catalog = catalog(&market, Duration::from_secs(300)).await;

    let lamp = catalog.find(&"lamp-1".into()).await.unwrap().unwrap();
    assert_eq!(
        ContactAction::for_product(&lamp),
        ContactAction::Open("https://wa.me/919876543210".to_string())
    );

    let mug = catalog.find(&"mug-7".into()).await.unwrap().unwrap();
    assert_eq!(
        ContactAction::for_product(&mug),
        ContactAction::Unavailable("No contact details available for Meera".to_string())
    );
}
