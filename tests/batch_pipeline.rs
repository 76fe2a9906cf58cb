//! End-to-end batch pipeline checks that stay off the network: link loading,
//! id extraction and the append-only CSV contract across interrupted runs.

use shopee_scraper::application::batch::BatchDriver;
use shopee_scraper::application::links::load_links;
use shopee_scraper::domain::product_url::ProductRef;
use shopee_scraper::infrastructure::config::BatchConfig;
use shopee_scraper::infrastructure::export::BatchCsvSink;
use shopee_scraper::infrastructure::http_client::{HttpClient, HttpClientConfig};
use shopee_scraper::infrastructure::pdp_api::PdpApiClient;

fn driver() -> BatchDriver {
    let http = HttpClient::new(HttpClientConfig::default()).unwrap();
    BatchDriver::new(
        PdpApiClient::new(http),
        BatchConfig {
            max_concurrent: 4,
            max_requests_per_second: 1000,
            ..BatchConfig::default()
        },
    )
}

#[tokio::test]
async fn unparseable_links_fail_fast_into_the_error_csv() {
    let dir = tempfile::tempdir().unwrap();
    let links_path = dir.path().join("links.csv");
    std::fs::write(
        &links_path,
        "url\nhttps://shopee.tw/listing-without-ids\nnot-even-a-url\n",
    )
    .unwrap();

    let urls = load_links(&links_path).unwrap();
    assert_eq!(urls.len(), 2);
    for url in &urls {
        assert!(ProductRef::parse(url).is_err());
    }

    let sink = BatchCsvSink::new(
        dir.path().join("products.csv"),
        dir.path().join("errors.csv"),
    );
    let summary = driver().run(&urls, &sink).await.unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.failed, 2);
    assert_eq!(summary.succeeded, 0);

    let errors = std::fs::read_to_string(sink.errors_path()).unwrap();
    assert!(errors.starts_with("url,error_message"));
    assert_eq!(errors.lines().count(), 3);
    // No successful rows, so the products CSV was never touched
    assert!(!sink.products_path().exists());
}

#[tokio::test]
async fn a_second_run_appends_without_reheadering() {
    let dir = tempfile::tempdir().unwrap();
    let sink = BatchCsvSink::new(
        dir.path().join("products.csv"),
        dir.path().join("errors.csv"),
    );
    let urls = vec!["https://shopee.tw/listing-without-ids".to_string()];

    driver().run(&urls, &sink).await.unwrap();
    driver().run(&urls, &sink).await.unwrap();

    let errors = std::fs::read_to_string(sink.errors_path()).unwrap();
    assert_eq!(errors.matches("url,error_message").count(), 1);
    assert_eq!(errors.lines().count(), 3);
}

#[test]
fn text_links_round_trip_through_canonical_urls() {
    let dir = tempfile::tempdir().unwrap();
    let links_path = dir.path().join("links.txt");
    std::fs::write(
        &links_path,
        "https://shopee.tw/headset-i.327985547.9368269078\n\
         https://shopee.com.br/fone-i.11.22\n",
    )
    .unwrap();

    let urls = load_links(&links_path).unwrap();
    let first = ProductRef::parse(&urls[0]).unwrap();
    assert_eq!(first.shop_id, 327985547);
    assert_eq!(first.item_id, 9368269078);
    let second = ProductRef::parse(&urls[1]).unwrap();
    assert_eq!(second.shop_id, 11);
    assert_eq!(second.item_id, 22);
}
