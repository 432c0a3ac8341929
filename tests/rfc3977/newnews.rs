//! RFC 3977 Sections 7.3 and 7.4 - NEWGROUPS and NEWNEWS

use chrono::{Duration, Utc};

use crate::common::{TestClient, memory_service, seed};

fn stamp(offset: Duration) -> String {
    (Utc::now() + offset).format("%Y%m%d %H%M%S").to_string()
}

#[tokio::test]
async fn test_newgroups() {
    let mut client = TestClient::connect(memory_service(&["alt.test", "comp.lang.rust"])).await;

    let command = format!("NEWGROUPS {} GMT", stamp(Duration::hours(-1)));
    let (code, lines) = client.multi(&command, 231).await;
    assert_eq!(code, 231);
    assert_eq!(lines, vec!["alt.test 0 0 y", "comp.lang.rust 0 0 y"]);

    let command = format!("NEWGROUPS {}", stamp(Duration::hours(1)));
    let (code, lines) = client.multi(&command, 231).await;
    assert_eq!(code, 231);
    assert!(lines.is_empty());
}

#[tokio::test]
async fn test_newnews() {
    let service = memory_service(&["alt.test", "comp.lang.rust"]);
    seed(&service, "<a@test>", "alt.test", "a");
    seed(&service, "<x@test>", "alt.test,comp.lang.rust", "cross");
    seed(&service, "<r@test>", "comp.lang.rust", "r");

    let mut client = TestClient::connect(service).await;
    let command = format!("NEWNEWS * {}", stamp(Duration::hours(-1)));
    let (code, mut ids) = client.multi(&command, 230).await;
    assert_eq!(code, 230);
    ids.sort();
    assert_eq!(ids, vec!["<a@test>", "<r@test>", "<x@test>"]);

    let command = format!("NEWNEWS alt.* {} GMT", stamp(Duration::hours(-1)));
    let (_, mut ids) = client.multi(&command, 230).await;
    ids.sort();
    assert_eq!(ids, vec!["<a@test>", "<x@test>"]);

    let command = format!("NEWNEWS * {}", stamp(Duration::hours(1)));
    let (_, ids) = client.multi(&command, 230).await;
    assert!(ids.is_empty());
}

#[tokio::test]
async fn test_newnews_omits_deleted() {
    let service = memory_service(&["alt.test"]);
    seed(&service, "<a@test>", "alt.test", "a");
    seed(&service, "<b@test>", "alt.test", "b");
    service.delete_article("<a@test>").unwrap();

    let mut client = TestClient::connect(service).await;
    let command = format!("NEWNEWS alt.test {}", stamp(Duration::hours(-1)));
    let (_, ids) = client.multi(&command, 230).await;
    assert_eq!(ids, vec!["<b@test>"]);
}

#[tokio::test]
async fn test_newgroups_bad_date() {
    let mut client = TestClient::connect(memory_service(&[])).await;
    assert_eq!(client.command("NEWGROUPS 2024xx01 000000").await.0, 501);
    assert_eq!(client.command("NEWGROUPS 20240101").await.0, 501);
    assert_eq!(client.command("NEWNEWS * 20240101 000000 PST").await.0, 501);
}
