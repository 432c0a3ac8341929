//! RFC 3977 Section 8.5 - HDR, and the legacy XHDR form

use crate::common::{TestClient, memory_service, seed};

#[tokio::test]
async fn test_hdr_subject_range() {
    let service = memory_service(&["alt.test"]);
    seed(&service, "<1@test>", "alt.test", "first subject");
    seed(&service, "<2@test>", "alt.test", "second subject");

    let mut client = TestClient::connect(service).await;
    client.command("GROUP alt.test").await;
    let (code, lines) = client.multi("HDR Subject 1-", 225).await;
    assert_eq!(code, 225);
    assert_eq!(lines, vec!["1 first subject", "2 second subject"]);
}

#[tokio::test]
async fn test_hdr_field_name_is_case_insensitive() {
    let service = memory_service(&["alt.test"]);
    seed(&service, "<1@test>", "alt.test", "one");

    let mut client = TestClient::connect(service).await;
    client.command("GROUP alt.test").await;
    let (_, lines) = client.multi("HDR message-id 1", 225).await;
    assert_eq!(lines, vec!["1 <1@test>"]);
}

#[tokio::test]
async fn test_hdr_non_overview_header() {
    let service = memory_service(&["alt.test"]);
    service
        .post(
            b"From: a@example.com\r\nSubject: s\r\nNewsgroups: alt.test\r\nOrganization: Rustaceans\r\nMessage-ID: <o@test>\r\n\r\n",
        )
        .unwrap();
    seed(&service, "<2@test>", "alt.test", "plain");

    let mut client = TestClient::connect(service).await;
    client.command("GROUP alt.test").await;
    let (_, lines) = client.multi("HDR Organization 1-2", 225).await;
    // Missing headers are listed with an empty value
    assert_eq!(lines, vec!["1 Rustaceans", "2 "]);
}

#[tokio::test]
async fn test_hdr_metadata_items() {
    let service = memory_service(&["alt.test"]);
    seed(&service, "<1@test>", "alt.test", "one");

    let mut client = TestClient::connect(service).await;
    client.command("GROUP alt.test").await;
    let (_, lines) = client.multi("HDR :lines 1", 225).await;
    assert_eq!(lines, vec!["1 1"]);
    let (_, lines) = client.multi("HDR :bytes 1", 225).await;
    let bytes: usize = lines[0].split_once(' ').unwrap().1.parse().unwrap();
    assert!(bytes > 0);
}

#[tokio::test]
async fn test_hdr_current_and_message_id() {
    let service = memory_service(&["alt.test"]);
    seed(&service, "<1@test>", "alt.test", "one");
    seed(&service, "<2@test>", "alt.test", "two");

    let mut client = TestClient::connect(service).await;
    client.command("GROUP alt.test").await;
    let (_, lines) = client.multi("HDR Subject", 225).await;
    assert_eq!(lines, vec!["1 one"]);

    let (_, lines) = client.multi("HDR Subject <2@test>", 225).await;
    assert_eq!(lines, vec!["0 two"]);
}

#[tokio::test]
async fn test_xhdr_legacy_form() {
    let service = memory_service(&["alt.test"]);
    seed(&service, "<1@test>", "alt.test", "one");

    let mut client = TestClient::connect(service).await;
    client.command("GROUP alt.test").await;
    let (code, lines) = client.multi("XHDR subject 1-1", 221).await;
    assert_eq!(code, 221);
    assert_eq!(lines, vec!["1 one"]);

    let (_, lines) = client.multi("XHDR subject <1@test>", 221).await;
    assert_eq!(lines, vec!["<1@test> one"]);
}

#[tokio::test]
async fn test_hdr_errors() {
    let service = memory_service(&["alt.test"]);
    seed(&service, "<1@test>", "alt.test", "one");

    let mut client = TestClient::connect(service).await;
    assert_eq!(client.command("HDR Subject 1").await.0, 412);
    assert_eq!(client.command("HDR Subject <missing@test>").await.0, 430);
    assert_eq!(client.command("HDR").await.0, 501);

    client.command("GROUP alt.test").await;
    assert_eq!(client.command("HDR Subject 7-9").await.0, 423);
}
