//! RFC 3977 Section 7.6 - LIST variants

use crate::common::{TestClient, memory_service, seed, service_with};
use nntp_server::{GroupConfig, ServerConfig};

fn service() -> std::sync::Arc<nntp_server::NewsService> {
    service_with(
        ServerConfig::in_memory()
            .with_group(GroupConfig {
                description: "Testing ground".to_string(),
                ..GroupConfig::new("alt.test")
            })
            .with_group(GroupConfig::new("comp.lang.rust"))
            .with_group(GroupConfig {
                posting_allowed: false,
                ..GroupConfig::new("local.announce")
            }),
    )
}

#[tokio::test]
async fn test_list_active() {
    let service = service();
    seed(&service, "<1@test>", "alt.test", "one");
    seed(&service, "<2@test>", "alt.test", "two");

    let mut client = TestClient::connect(service).await;
    let (code, lines) = client.multi("LIST", 215).await;
    assert_eq!(code, 215);
    assert_eq!(
        lines,
        vec![
            "alt.test 2 1 y",
            "comp.lang.rust 0 0 y",
            "local.announce 0 0 n"
        ]
    );

    let (_, lines) = client.multi("LIST ACTIVE comp.*", 215).await;
    assert_eq!(lines, vec!["comp.lang.rust 0 0 y"]);
}

#[tokio::test]
async fn test_list_active_reflects_posting_switch() {
    let service = service_with(
        ServerConfig::in_memory()
            .with_posting(false)
            .with_group(GroupConfig::new("alt.test")),
    );
    let mut client = TestClient::connect(service).await;
    let (_, lines) = client.multi("LIST ACTIVE", 215).await;
    assert_eq!(lines, vec!["alt.test 0 0 n"]);
}

#[tokio::test]
async fn test_list_newsgroups() {
    let mut client = TestClient::connect(service()).await;
    let (code, lines) = client.multi("LIST NEWSGROUPS alt.*", 215).await;
    assert_eq!(code, 215);
    assert_eq!(lines, vec!["alt.test\tTesting ground"]);
}

#[tokio::test]
async fn test_list_active_times() {
    let mut client = TestClient::connect(service()).await;
    let (_, lines) = client.multi("LIST ACTIVE.TIMES", 215).await;
    assert_eq!(lines.len(), 3);
    let parts: Vec<&str> = lines[0].split(' ').collect();
    assert_eq!(parts[0], "alt.test");
    assert!(parts[1].parse::<i64>().unwrap() > 0);
    assert_eq!(parts[2], "news@news.test");
}

#[tokio::test]
async fn test_list_overview_fmt() {
    let mut client = TestClient::connect(service()).await;
    let (_, lines) = client.multi("LIST OVERVIEW.FMT", 215).await;
    assert_eq!(
        lines,
        vec![
            "Subject:",
            "From:",
            "Date:",
            "Message-ID:",
            "References:",
            ":bytes",
            ":lines"
        ]
    );
}

#[tokio::test]
async fn test_list_headers() {
    let mut client = TestClient::connect(service()).await;
    let (_, lines) = client.multi("LIST HEADERS", 215).await;
    assert!(lines.contains(&":".to_string()));
}

#[tokio::test]
async fn test_list_subscriptions() {
    let mut config = ServerConfig::in_memory().with_group(GroupConfig::new("alt.test"));
    config.subscriptions = vec!["alt.test".to_string()];
    let mut client = TestClient::connect(service_with(config)).await;
    let (_, lines) = client.multi("LIST SUBSCRIPTIONS", 215).await;
    assert_eq!(lines, vec!["alt.test"]);
}

#[tokio::test]
async fn test_list_unsupported_keyword() {
    let mut client = TestClient::connect(service()).await;
    assert_eq!(client.command("LIST MOTD").await.0, 503);
    assert_eq!(client.command("LIST DISTRIBUTIONS").await.0, 503);
}

#[tokio::test]
async fn test_list_empty_match() {
    let mut client = TestClient::connect(service()).await;
    let (code, lines) = client.multi("LIST ACTIVE no.such.*", 215).await;
    assert_eq!(code, 215);
    assert!(lines.is_empty());
}
