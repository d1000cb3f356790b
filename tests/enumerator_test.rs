use httpmock::prelude::*;
use serde_json::json;
use tokio::time::Duration;

use licensemap::{Error, GitHubClient};

fn repo(id: u64, name: &str, fork: bool, license: Option<&str>) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "full_name": format!("alice/{}", name),
        "fork": fork,
        "license": license.map(|key| json!({"key": key})),
    })
}

#[tokio::test]
async fn test_forks_and_unlicensed_repos_are_excluded() {
    let server = MockServer::start_async().await;
    let repos = server
        .mock_async(|when, then| {
            when.method(GET).path("/users/alice/repos");
            then.status(200)
                .header("x-ratelimit-remaining", "4999")
                .json_body(json!([
                    repo(1, "cli", false, Some("mit")),
                    repo(2, "site", false, Some("mit")),
                    repo(3, "daemon", false, Some("gpl-3.0")),
                    repo(4, "forked-lib", true, Some("apache-2.0")),
                    repo(5, "scratch", false, None),
                ]));
        })
        .await;

    let client = GitHubClient::with_base_url("test-token", &server.base_url()).unwrap();
    let keys = client.list_owned_licenses("alice").await.unwrap();

    assert_eq!(keys, vec!["mit", "mit", "gpl-3.0"]);
    repos.assert_async().await;
}

#[tokio::test]
async fn test_owner_filter_is_requested() {
    let server = MockServer::start_async().await;
    let repos = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/users/alice/repos")
                .query_param("type", "owner");
            then.status(200)
                .header("x-ratelimit-remaining", "4999")
                .json_body(json!([]));
        })
        .await;

    let client = GitHubClient::with_base_url("test-token", &server.base_url()).unwrap();
    let keys = client.list_owned_licenses("alice").await.unwrap();

    assert!(keys.is_empty());
    repos.assert_async().await;
}

#[tokio::test]
async fn test_pagination_follows_link_header() {
    let server = MockServer::start_async().await;
    let page1: Vec<_> = (0..100)
        .map(|i| repo(i, &format!("repo{}", i), false, Some("mit")))
        .collect();

    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/users/alice/repos")
                .query_param("page", "1");
            then.status(200)
                .header("x-ratelimit-remaining", "4999")
                .header(
                    "link",
                    "<https://api.github.com/users/alice/repos?page=2>; rel=\"next\"",
                )
                .json_body(json!(page1));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/users/alice/repos")
                .query_param("page", "2");
            then.status(200)
                .header("x-ratelimit-remaining", "4998")
                .json_body(json!([repo(100, "tail", false, Some("wtfpl"))]));
        })
        .await;

    let client = GitHubClient::with_base_url("test-token", &server.base_url()).unwrap();
    let keys = client.list_owned_licenses("alice").await.unwrap();

    assert_eq!(keys.len(), 101);
    assert_eq!(keys[100], "wtfpl");
}

#[tokio::test]
async fn test_rate_limit_retries_the_listing_once() {
    let server = MockServer::start_async().await;
    let mut limited = server
        .mock_async(|when, then| {
            when.method(GET).path("/users/alice/repos");
            // Reset far in the past, so the backoff is the margin alone.
            then.status(403)
                .header("x-ratelimit-remaining", "0")
                .header("x-ratelimit-reset", "1000")
                .json_body(json!({"message": "API rate limit exceeded"}));
        })
        .await;

    let client = GitHubClient::with_base_url("test-token", &server.base_url())
        .unwrap()
        .with_reset_margin(Duration::from_secs(1));

    let handle = tokio::spawn(async move { client.list_owned_licenses("alice").await });

    // While the client sits in its backoff, swap the mock so the retry
    // succeeds.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(limited.hits_async().await, 1);
    limited.delete_async().await;

    let recovered = server
        .mock_async(|when, then| {
            when.method(GET).path("/users/alice/repos");
            then.status(200)
                .header("x-ratelimit-remaining", "5000")
                .json_body(json!([repo(1, "cli", false, Some("mit"))]));
        })
        .await;

    let keys = handle.await.unwrap().unwrap();
    assert_eq!(keys, vec!["mit"]);
    assert_eq!(recovered.hits_async().await, 1);
}

#[tokio::test]
async fn test_second_rate_limit_propagates_as_error() {
    let server = MockServer::start_async().await;
    let limited = server
        .mock_async(|when, then| {
            when.method(GET).path("/users/alice/repos");
            then.status(403)
                .header("x-ratelimit-remaining", "0")
                .header("x-ratelimit-reset", "1000")
                .json_body(json!({"message": "API rate limit exceeded"}));
        })
        .await;

    let client = GitHubClient::with_base_url("test-token", &server.base_url())
        .unwrap()
        .with_reset_margin(Duration::ZERO);

    let err = client.list_owned_licenses("alice").await.unwrap_err();
    assert!(matches!(err, Error::RateLimited(1000)));

    // The initial request plus exactly one retry, never an unbounded loop.
    assert_eq!(limited.hits_async().await, 2);
}

#[tokio::test]
async fn test_remote_error_is_reported() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/users/alice/repos");
            then.status(500)
                .header("x-ratelimit-remaining", "4999")
                .json_body(json!({"message": "Server Error"}));
        })
        .await;

    let client = GitHubClient::with_base_url("test-token", &server.base_url()).unwrap();
    let err = client.list_owned_licenses("alice").await.unwrap_err();

    match err {
        Error::GitHubApi(msg) => assert!(msg.contains("Server Error")),
        other => panic!("unexpected error: {}", other),
    }
}
