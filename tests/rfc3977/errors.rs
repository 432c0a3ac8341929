//! RFC 3977 Section 3.2.1 - generic error responses

use crate::common::{TestClient, memory_service};

#[tokio::test]
async fn test_unknown_command() {
    let mut client = TestClient::connect(memory_service(&[])).await;
    assert_eq!(client.command("FROBNICATE").await.0, 500);
    // Session survives
    assert_eq!(client.command("DATE").await.0, 111);
}

#[tokio::test]
async fn test_syntax_errors() {
    let mut client = TestClient::connect(memory_service(&["alt.test"])).await;
    assert_eq!(client.command("ARTICLE not-a-number").await.0, 501);
    assert_eq!(client.command("STAT <unterminated").await.0, 501);
    assert_eq!(client.command("MODE").await.0, 501);
    assert_eq!(client.command("GROUP a b").await.0, 501);
}

#[tokio::test]
async fn test_line_too_long() {
    let mut client = TestClient::connect(memory_service(&[])).await;
    let line = format!("GROUP {}", "a".repeat(4096));
    let (code, _) = client.command(&line).await;
    assert_eq!(code, 501);
    assert_eq!(client.command("DATE").await.0, 111);
}

#[tokio::test]
async fn test_transit_commands_unavailable() {
    let mut client = TestClient::connect(memory_service(&[])).await;
    assert_eq!(client.command("IHAVE <x@test>").await.0, 502);
    assert_eq!(client.command("MODE STREAM").await.0, 502);
    assert_eq!(client.command("CHECK <x@test>").await.0, 502);
}

#[tokio::test]
async fn test_empty_line_is_unknown() {
    let mut client = TestClient::connect(memory_service(&[])).await;
    assert_eq!(client.command("").await.0, 500);
}

#[tokio::test]
async fn test_authinfo_identification() {
    let mut client = TestClient::connect(memory_service(&[])).await;
    assert_eq!(client.command("AUTHINFO PASS early").await.0, 482);
    assert_eq!(client.command("AUTHINFO USER reader").await.0, 381);
    assert_eq!(client.command("AUTHINFO PASS secret").await.0, 281);
    assert_eq!(client.command("AUTHINFO USER again").await.0, 502);
}
