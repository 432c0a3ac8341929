//! RFC 3977 Section 6.2 - ARTICLE, HEAD, BODY and STAT

use crate::common::{TestClient, article, memory_service, seed};

#[tokio::test]
async fn test_article_by_number() {
    let service = memory_service(&["alt.test"]);
    service
        .post(article("<1@test>", "alt.test", "hello", "first line\nsecond line").as_bytes())
        .unwrap();

    let mut client = TestClient::connect(service).await;
    client.command("GROUP alt.test").await;
    let (code, lines) = client.multi("ARTICLE 1", 220).await;
    assert_eq!(code, 220);

    let blank = lines.iter().position(|l| l.is_empty()).unwrap();
    let headers = &lines[..blank];
    assert!(headers.contains(&"Subject: hello".to_string()));
    assert!(headers.contains(&"Message-ID: <1@test>".to_string()));
    assert!(headers.iter().any(|h| h.starts_with("Path: news.test!")));
    assert_eq!(&lines[blank + 1..], &["first line", "second line"]);
}

#[tokio::test]
async fn test_article_status_line() {
    let service = memory_service(&["alt.test"]);
    seed(&service, "<1@test>", "alt.test", "one");

    let mut client = TestClient::connect(service).await;
    client.command("GROUP alt.test").await;
    let (code, message) = client.command("STAT 1").await;
    assert_eq!(code, 223);
    assert!(message.starts_with("1 <1@test>"));
}

#[tokio::test]
async fn test_head_and_body() {
    let service = memory_service(&["alt.test"]);
    service
        .post(article("<1@test>", "alt.test", "hello", "only line").as_bytes())
        .unwrap();

    let mut client = TestClient::connect(service).await;
    client.command("GROUP alt.test").await;

    let (code, head) = client.multi("HEAD", 221).await;
    assert_eq!(code, 221);
    assert!(head.iter().all(|l| !l.is_empty()));
    assert!(head.contains(&"Subject: hello".to_string()));

    let (code, body) = client.multi("BODY 1", 222).await;
    assert_eq!(code, 222);
    assert_eq!(body, vec!["only line"]);
}

#[tokio::test]
async fn test_body_dot_stuffing_round_trip() {
    let service = memory_service(&["alt.test"]);
    let mut client = TestClient::connect(service).await;

    let text = article("<dots@test>", "alt.test", "dots", ".starts with dot\n..two dots\n.");
    let (_, (code, _)) = client.post(&text).await;
    assert_eq!(code, 240);

    let (code, body) = client.multi("BODY <dots@test>", 222).await;
    assert_eq!(code, 222);
    assert_eq!(body, vec![".starts with dot", "..two dots", "."]);
}

#[tokio::test]
async fn test_article_by_message_id_without_group() {
    let service = memory_service(&["alt.test"]);
    seed(&service, "<1@test>", "alt.test", "one");

    let mut client = TestClient::connect(service).await;
    let (code, message) = client.command("STAT <1@test>").await;
    assert_eq!(code, 223);
    assert!(message.starts_with("0 <1@test>"));

    let (code, _) = client.command("STAT <missing@test>").await;
    assert_eq!(code, 430);
}

#[tokio::test]
async fn test_number_forms_need_a_group() {
    let service = memory_service(&["alt.test"]);
    seed(&service, "<1@test>", "alt.test", "one");

    let mut client = TestClient::connect(service).await;
    assert_eq!(client.command("ARTICLE 1").await.0, 412);
    assert_eq!(client.command("HEAD").await.0, 412);
}

#[tokio::test]
async fn test_no_such_article_number_keeps_pointer() {
    let service = memory_service(&["alt.test"]);
    seed(&service, "<1@test>", "alt.test", "one");

    let mut client = TestClient::connect(service).await;
    client.command("GROUP alt.test").await;
    assert_eq!(client.command("STAT 99").await.0, 423);

    let (code, message) = client.command("STAT").await;
    assert_eq!(code, 223);
    assert!(message.starts_with("1 "));
}

#[tokio::test]
async fn test_deleted_article_is_gone() {
    let service = memory_service(&["alt.test"]);
    seed(&service, "<1@test>", "alt.test", "one");
    seed(&service, "<2@test>", "alt.test", "two");

    let mut client = TestClient::connect(service.clone()).await;
    client.command("GROUP alt.test").await;
    service.delete_article("<1@test>").unwrap();

    // Pointer still names the deleted number
    assert_eq!(client.command("STAT").await.0, 420);
    assert_eq!(client.command("ARTICLE 1").await.0, 423);
    assert_eq!(client.command("ARTICLE <1@test>").await.0, 430);
    assert_eq!(client.command("STAT 2").await.0, 223);
}

#[tokio::test]
async fn test_dangling_index_entry_reads_as_missing() {
    let service = memory_service(&["alt.test"]);
    seed(&service, "<1@test>", "alt.test", "one");
    // Remove only the stored content; the index still maps number 1
    service.store().delete("<1@test>").unwrap();

    let mut client = TestClient::connect(service).await;
    client.command("GROUP alt.test").await;
    assert_eq!(client.command("ARTICLE 1").await.0, 423);
    assert_eq!(client.command("STAT <1@test>").await.0, 430);
}
