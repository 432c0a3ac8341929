//! RFC 3977 Section 8.3 - OVER / XOVER

use crate::common::{TestClient, article, memory_service, seed, service_with};
use nntp_server::{GroupConfig, ServerConfig};

fn fields(line: &str) -> Vec<&str> {
    line.split('\t').collect()
}

#[tokio::test]
async fn test_over_range() {
    let service = memory_service(&["alt.test"]);
    for i in 1..=3 {
        seed(&service, &format!("<{i}@test>"), "alt.test", &format!("subject {i}"));
    }

    let mut client = TestClient::connect(service).await;
    client.command("GROUP alt.test").await;
    let (code, lines) = client.multi("OVER 1-3", 224).await;
    assert_eq!(code, 224);
    assert_eq!(lines.len(), 3);

    let row = fields(&lines[1]);
    assert_eq!(row.len(), 8);
    assert_eq!(row[0], "2");
    assert_eq!(row[1], "subject 2");
    assert_eq!(row[2], "tester@example.com");
    assert!(!row[3].is_empty());
    assert_eq!(row[4], "<2@test>");
    assert_eq!(row[5], "");
    assert!(row[6].parse::<usize>().unwrap() > 0);
    assert_eq!(row[7], "1");
}

#[tokio::test]
async fn test_over_open_range_and_xover() {
    let service = memory_service(&["alt.test"]);
    for i in 1..=4 {
        seed(&service, &format!("<{i}@test>"), "alt.test", "open");
    }

    let mut client = TestClient::connect(service).await;
    client.command("GROUP alt.test").await;
    let (_, lines) = client.multi("OVER 3-", 224).await;
    let numbers: Vec<&str> = lines.iter().map(|l| fields(l)[0]).collect();
    assert_eq!(numbers, vec!["3", "4"]);

    let (code, lines) = client.multi("XOVER 2", 224).await;
    assert_eq!(code, 224);
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("2\t"));
}

#[tokio::test]
async fn test_over_current_article() {
    let service = memory_service(&["alt.test"]);
    seed(&service, "<1@test>", "alt.test", "one");
    seed(&service, "<2@test>", "alt.test", "two");

    let mut client = TestClient::connect(service).await;
    client.command("GROUP alt.test").await;
    client.command("NEXT").await;
    let (_, lines) = client.multi("OVER", 224).await;
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("2\ttwo\t"));
}

#[tokio::test]
async fn test_over_by_message_id() {
    let service = memory_service(&["alt.test"]);
    seed(&service, "<1@test>", "alt.test", "one");

    let mut client = TestClient::connect(service).await;
    let (code, lines) = client.multi("OVER <1@test>", 224).await;
    assert_eq!(code, 224);
    assert!(lines[0].starts_with("0\tone\t"));

    assert_eq!(client.command("OVER <missing@test>").await.0, 430);
}

#[tokio::test]
async fn test_over_skips_deleted_articles() {
    let service = memory_service(&["alt.test"]);
    for i in 1..=3 {
        seed(&service, &format!("<{i}@test>"), "alt.test", "gap");
    }
    service.delete_article("<2@test>").unwrap();

    let mut client = TestClient::connect(service).await;
    client.command("GROUP alt.test").await;
    let (_, lines) = client.multi("OVER 1-3", 224).await;
    let numbers: Vec<&str> = lines.iter().map(|l| fields(l)[0]).collect();
    assert_eq!(numbers, vec!["1", "3"]);
}

#[tokio::test]
async fn test_over_empty_range() {
    let service = memory_service(&["alt.test"]);
    seed(&service, "<1@test>", "alt.test", "one");

    let mut client = TestClient::connect(service).await;
    client.command("GROUP alt.test").await;
    assert_eq!(client.command("OVER 5-9").await.0, 423);
    assert_eq!(client.command("OVER 3-2").await.0, 423);
}

#[tokio::test]
async fn test_over_errors() {
    let service = memory_service(&["alt.test"]);
    let mut client = TestClient::connect(service).await;
    assert_eq!(client.command("OVER 1-5").await.0, 412);

    client.command("GROUP alt.test").await;
    assert_eq!(client.command("OVER").await.0, 420);
    assert_eq!(client.command("OVER abc").await.0, 501);
}

#[tokio::test]
async fn test_over_spans_many_batches() {
    let service = service_with(
        ServerConfig::in_memory()
            .with_batch_size(3)
            .with_group(GroupConfig::new("alt.test")),
    );
    for i in 1..=10 {
        seed(&service, &format!("<{i}@test>"), "alt.test", "batch");
    }

    let mut client = TestClient::connect(service).await;
    client.command("GROUP alt.test").await;
    let (_, lines) = client.multi("OVER 1-", 224).await;
    let numbers: Vec<u64> = lines
        .iter()
        .map(|l| fields(l)[0].parse().unwrap())
        .collect();
    assert_eq!(numbers, (1..=10).collect::<Vec<u64>>());
}

#[tokio::test]
async fn test_over_tab_in_subject_is_replaced() {
    let service = memory_service(&["alt.test"]);
    service
        .post(article("<t@test>", "alt.test", "has\ttab", "body").as_bytes())
        .unwrap();

    let mut client = TestClient::connect(service).await;
    client.command("GROUP alt.test").await;
    let (_, lines) = client.multi("OVER 1", 224).await;
    assert_eq!(fields(&lines[0]).len(), 8);
}
