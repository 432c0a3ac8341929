//! RFC 3977 Sections 5 and 7.1 - greeting, CAPABILITIES, MODE READER, HELP, DATE, QUIT

use crate::common::{TestClient, memory_service, service_with};
use nntp_server::ServerConfig;

#[tokio::test]
async fn test_greeting_posting_allowed() {
    let client = TestClient::connect(memory_service(&["alt.test"])).await;
    assert_eq!(client.greeting.0, 200);
    assert!(client.greeting.1.contains("news.test"));
}

#[tokio::test]
async fn test_greeting_posting_prohibited() {
    let service = service_with(ServerConfig::in_memory().with_posting(false));
    let client = TestClient::connect(service).await;
    assert_eq!(client.greeting.0, 201);
}

#[tokio::test]
async fn test_capabilities_list() {
    let mut client = TestClient::connect(memory_service(&["alt.test"])).await;
    let (code, lines) = client.multi("CAPABILITIES", 101).await;
    assert_eq!(code, 101);
    assert_eq!(lines[0], "VERSION 2");
    assert!(lines.iter().any(|l| l == "READER"));
    assert!(lines.iter().any(|l| l == "POST"));
    assert!(lines.iter().any(|l| l == "OVER MSGID"));
    assert!(lines.iter().any(|l| l.starts_with("LIST ACTIVE")));
    assert!(!lines.iter().any(|l| l == "IHAVE"));
}

#[tokio::test]
async fn test_capabilities_without_post() {
    let service = service_with(ServerConfig::in_memory().with_posting(false));
    let mut client = TestClient::connect(service).await;
    let (_, lines) = client.multi("capabilities", 101).await;
    assert!(!lines.iter().any(|l| l == "POST"));
}

#[tokio::test]
async fn test_mode_reader() {
    let mut client = TestClient::connect(memory_service(&[])).await;
    let (code, _) = client.command("MODE READER").await;
    assert_eq!(code, 200);
}

#[tokio::test]
async fn test_help() {
    let mut client = TestClient::connect(memory_service(&[])).await;
    let (code, lines) = client.multi("HELP", 100).await;
    assert_eq!(code, 100);
    assert!(lines.iter().any(|l| l.starts_with("GROUP")));
}

#[tokio::test]
async fn test_date_format() {
    let mut client = TestClient::connect(memory_service(&[])).await;
    let (code, message) = client.command("DATE").await;
    assert_eq!(code, 111);
    assert_eq!(message.len(), 14);
    assert!(message.bytes().all(|b| b.is_ascii_digit()));
    assert!(message.starts_with("20"));
}

#[tokio::test]
async fn test_quit_closes_connection() {
    let client = TestClient::connect(memory_service(&[])).await;
    client.quit().await.unwrap();
}

#[tokio::test]
async fn test_client_hang_up_ends_session() {
    let client = TestClient::connect(memory_service(&[])).await;
    client.hang_up().await.unwrap();
}
