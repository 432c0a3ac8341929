//! RFC 3977 Section 3.2.1 - 403 for internal faults
//!
//! A storage failure answers the one command with 403; the session keeps
//! going.

use crate::common::{TestClient, article, failing_service};

#[tokio::test]
async fn test_article_read_failure_is_403() {
    let service = failing_service("alt.test", &["<1@test>"]);
    let mut client = TestClient::connect(service).await;

    assert_eq!(client.command("ARTICLE <1@test>").await.0, 403);
    assert_eq!(client.command("BODY <1@test>").await.0, 403);
    assert_eq!(client.command("DATE").await.0, 111);
    assert_eq!(client.command("GROUP alt.test").await.1, "1 1 1 alt.test");
    client.quit().await.unwrap();
}

#[tokio::test]
async fn test_overview_failure_is_403() {
    let service = failing_service("alt.test", &["<1@test>", "<2@test>"]);
    let mut client = TestClient::connect(service).await;

    assert_eq!(client.command("GROUP alt.test").await.0, 211);
    assert_eq!(client.command("OVER 1").await.0, 403);
    assert_eq!(client.command("OVER 1-2").await.0, 403);
    assert_eq!(client.command("OVER <2@test>").await.0, 403);

    // Commands that never touch the store still work
    assert_eq!(client.command("NEXT").await.1, "2 <2@test> retrieved");
    assert_eq!(client.command("DATE").await.0, 111);
    client.quit().await.unwrap();
}

#[tokio::test]
async fn test_post_store_failure_is_403() {
    let service = failing_service("alt.test", &[]);
    let mut client = TestClient::connect(service).await;

    let (code, (status, _)) = client
        .post(&article("<new@test>", "alt.test", "lost", "body"))
        .await;
    assert_eq!(code, 340);
    assert_eq!(status, 403);
    assert_eq!(client.command("GROUP alt.test").await.1, "0 0 0 alt.test");
    client.quit().await.unwrap();
}
