//! RFC 3977 Section 6.1.2 - LISTGROUP

use crate::common::{TestClient, memory_service, seed, service_with};
use nntp_server::{GroupConfig, ServerConfig};

#[tokio::test]
async fn test_listgroup_selects_and_lists() {
    let service = memory_service(&["alt.test"]);
    for i in 1..=3 {
        seed(&service, &format!("<{i}@test>"), "alt.test", "list");
    }

    let mut client = TestClient::connect(service).await;
    let (code, message) = client.command("LISTGROUP alt.test").await;
    assert_eq!(code, 211);
    assert!(message.starts_with("3 1 3 alt.test"));
    assert_eq!(client.data().await, vec!["1", "2", "3"]);

    // The group is now selected with the pointer on the first article
    let (code, message) = client.command("STAT").await;
    assert_eq!(code, 223);
    assert!(message.starts_with("1 <1@test>"));
}

#[tokio::test]
async fn test_listgroup_current_group_with_range() {
    let service = memory_service(&["alt.test"]);
    for i in 1..=5 {
        seed(&service, &format!("<{i}@test>"), "alt.test", "list");
    }
    service.delete_article("<3@test>").unwrap();

    let mut client = TestClient::connect(service).await;
    client.command("GROUP alt.test").await;
    let (code, numbers) = client.multi("LISTGROUP alt.test 2-4", 211).await;
    assert_eq!(code, 211);
    assert_eq!(numbers, vec!["2", "4"]);

    let (_, numbers) = client.multi("LISTGROUP", 211).await;
    assert_eq!(numbers, vec!["1", "2", "4", "5"]);
}

#[tokio::test]
async fn test_listgroup_empty_group() {
    let mut client = TestClient::connect(memory_service(&["alt.test"])).await;
    let (code, message) = client.command("LISTGROUP alt.test").await;
    assert_eq!(code, 211);
    assert!(message.starts_with("0 0 0 alt.test"));
    assert!(client.data().await.is_empty());
}

#[tokio::test]
async fn test_listgroup_in_batches() {
    let service = service_with(
        ServerConfig::in_memory()
            .with_batch_size(2)
            .with_group(GroupConfig::new("alt.test")),
    );
    for i in 1..=7 {
        seed(&service, &format!("<{i}@test>"), "alt.test", "batch");
    }

    let mut client = TestClient::connect(service).await;
    let (_, numbers) = client.multi("LISTGROUP alt.test", 211).await;
    assert_eq!(numbers, vec!["1", "2", "3", "4", "5", "6", "7"]);
}

#[tokio::test]
async fn test_listgroup_errors() {
    let mut client = TestClient::connect(memory_service(&["alt.test"])).await;
    assert_eq!(client.command("LISTGROUP").await.0, 412);
    assert_eq!(client.command("LISTGROUP alt.missing").await.0, 411);
    assert_eq!(client.command("LISTGROUP alt.test x-y").await.0, 501);
}
