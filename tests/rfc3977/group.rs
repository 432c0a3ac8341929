//! RFC 3977 Section 6.1.1 - GROUP Command Tests

use crate::common::{TestClient, memory_service, seed};

#[tokio::test]
async fn test_group_response_format() {
    let service = memory_service(&["alt.binaries.test"]);
    seed(&service, "<1@test>", "alt.binaries.test", "one");
    seed(&service, "<2@test>", "alt.binaries.test", "two");
    seed(&service, "<3@test>", "alt.binaries.test", "three");

    let mut client = TestClient::connect(service).await;
    let (code, message) = client.command("GROUP alt.binaries.test").await;
    assert_eq!(code, 211);
    assert_eq!(message, "3 1 3 alt.binaries.test");
}

#[tokio::test]
async fn test_fresh_group_is_empty() {
    let mut client = TestClient::connect(memory_service(&["alt.test"])).await;
    let (code, message) = client.command("GROUP alt.test").await;
    assert_eq!(code, 211);
    assert_eq!(message, "0 0 0 alt.test");

    // Empty group: selected but no current article
    let (code, _) = client.command("STAT").await;
    assert_eq!(code, 420);
}

#[tokio::test]
async fn test_no_such_group() {
    let mut client = TestClient::connect(memory_service(&["alt.test"])).await;
    let (code, _) = client.command("GROUP alt.missing").await;
    assert_eq!(code, 411);

    // Still no group selected
    let (code, _) = client.command("NEXT").await;
    assert_eq!(code, 412);
}

#[tokio::test]
async fn test_failed_group_keeps_previous_selection() {
    let service = memory_service(&["alt.test"]);
    seed(&service, "<1@test>", "alt.test", "one");
    seed(&service, "<2@test>", "alt.test", "two");

    let mut client = TestClient::connect(service).await;
    client.command("GROUP alt.test").await;
    assert_eq!(client.command("NEXT").await.0, 223);

    assert_eq!(client.command("GROUP alt.missing").await.0, 411);

    // Pointer is still at 2
    let (code, message) = client.command("STAT").await;
    assert_eq!(code, 223);
    assert!(message.starts_with("2 <2@test>"));
}

#[tokio::test]
async fn test_group_resets_pointer_to_low_watermark() {
    let service = memory_service(&["alt.test", "comp.lang.rust"]);
    seed(&service, "<1@test>", "alt.test", "one");
    seed(&service, "<2@test>", "alt.test", "two");
    seed(&service, "<r1@test>", "comp.lang.rust", "rust");
    service.delete_article("<1@test>").unwrap();

    let mut client = TestClient::connect(service).await;
    let (_, message) = client.command("GROUP alt.test").await;
    assert_eq!(message, "1 2 2 alt.test");
    let (code, message) = client.command("STAT").await;
    assert_eq!(code, 223);
    assert!(message.starts_with("2 <2@test>"));

    client.command("GROUP comp.lang.rust").await;
    let (_, message) = client.command("STAT").await;
    assert!(message.starts_with("1 <r1@test>"));
}

#[tokio::test]
async fn test_group_name_is_case_sensitive() {
    let mut client = TestClient::connect(memory_service(&["alt.test"])).await;
    assert_eq!(client.command("GROUP ALT.TEST").await.0, 411);
    assert_eq!(client.command("group alt.test").await.0, 211);
}

#[tokio::test]
async fn test_group_without_argument() {
    let mut client = TestClient::connect(memory_service(&["alt.test"])).await;
    assert_eq!(client.command("GROUP").await.0, 501);
}
