//! End-to-end tests for concurrent metadata loading against a mock hosting API.

use core::time::Duration;
use futures_util::StreamExt;
use repo_glance::metadata::{
    AggregateProjectMetadata, Client, Completeness, LoadSettings, Orchestrator, Readiness, RepoRef, Section, UnavailableReason, stats,
};
use serde_json::{Value, json};
use strum::IntoEnumIterator;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn orchestrator(server: &MockServer) -> Orchestrator {
    let client = Client::new(server.uri(), Duration::from_secs(5)).expect("client");
    Orchestrator::new(client, LoadSettings::default())
}

fn repository(server: &MockServer, owner: &str, name: &str, stars: u64) -> Value {
    json!({
        "stargazers_count": stars,
        "forks_count": 7,
        "open_issues_count": 3,
        "pushed_at": "2024-05-01T10:00:00Z",
        "topics": ["widgets", "cli"],
        "html_url": format!("https://github.com/{owner}/{name}"),
        "description": "Widgets for everyone",
        "languages_url": format!("{}/repos/{owner}/{name}/languages", server.uri())
    })
}

fn commit(sha: &str, date: &str) -> Value {
    json!({
        "sha": sha,
        "html_url": format!("https://github.com/acme/widgets/commit/{sha}"),
        "commit": {
            "message": format!("Change {sha}\n\nDetails"),
            "author": { "name": "Ada", "email": "ada@example.com", "date": date }
        }
    })
}

fn contributors(ids: core::ops::Range<usize>) -> Value {
    let list: Vec<_> = ids
        .map(|i| {
            json!({
                "login": format!("user{i}"),
                "avatar_url": format!("https://avatars.example.com/user{i}"),
                "html_url": format!("https://github.com/user{i}"),
                "contributions": 500 - i
            })
        })
        .collect();
    Value::Array(list)
}

async fn mount_json(server: &MockServer, route: &str, body: Value, delay: Duration) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body).set_delay(delay))
        .mount(server)
        .await;
}

/// Mount a complete, healthy repository.
async fn mount_repository(server: &MockServer, owner: &str, name: &str, stars: u64, delay: Duration) {
    let base = format!("/repos/{owner}/{name}");
    mount_json(server, &base, repository(server, owner, name, stars), delay).await;
    mount_json(server, &format!("{base}/languages"), json!({ "TypeScript": 8000, "CSS": 2000 }), delay).await;

    Mock::given(method("GET"))
        .and(path(format!("{base}/commits")))
        .and(query_param("per_page", "5"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([
                    commit("c3", "2024-04-03T00:00:00Z"),
                    commit("c5", "2024-04-05T00:00:00Z"),
                    commit("c1", "2024-04-01T00:00:00Z"),
                    commit("c4", "2024-04-04T00:00:00Z"),
                    commit("c2", "2024-04-02T00:00:00Z"),
                ]))
                .set_delay(delay),
        )
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{base}/readme")))
        .and(header("accept", "application/vnd.github.html+json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Widgets</h1>").set_delay(delay))
        .mount(server)
        .await;

    for (page, ids) in [(1, 0..100), (2, 100..130)] {
        Mock::given(method("GET"))
            .and(path(format!("{base}/contributors")))
            .and(query_param("per_page", "100"))
            .and(query_param("page", page.to_string()))
            .respond_with(ResponseTemplate::new(200).set_body_json(contributors(ids)).set_delay(delay))
            .mount(server)
            .await;
    }
}

async fn load_all(orchestrator: &Orchestrator, reference: Option<RepoRef>) -> Vec<AggregateProjectMetadata> {
    orchestrator.load(reference).collect().await
}

#[tokio::test]
async fn test_load_end_to_end() {
    let server = MockServer::start().await;
    mount_repository(&server, "acme", "widgets", 42, Duration::ZERO).await;

    let orchestrator = orchestrator(&server);
    let snapshots = load_all(&orchestrator, RepoRef::from_link(Some("https://github.com/acme/widgets"))).await;

    // Initial snapshot plus one per settled section.
    assert_eq!(snapshots.len(), 6);
    for section in Section::iter() {
        assert_eq!(snapshots[0].readiness.get(section), Readiness::Pending);
    }

    let aggregate = snapshots.last().expect("snapshots");
    assert!(aggregate.is_settled());
    assert_eq!(aggregate, &orchestrator.current());

    let summary = aggregate.summary.as_ref().expect("summary");
    assert_eq!(summary.star_count, 42);
    assert_eq!(summary.fork_count, 7);
    assert_eq!(summary.open_issue_count, 3);
    assert_eq!(summary.topics, vec!["widgets", "cli"]);
    assert_eq!(summary.description.as_deref(), Some("Widgets for everyone"));

    let percentages = stats::percentages(&aggregate.languages);
    assert!((percentages["TypeScript"] - 80.0).abs() < 1e-9);
    assert!((percentages["CSS"] - 20.0).abs() < 1e-9);

    let ids: Vec<_> = aggregate.commits.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["c5", "c4", "c3", "c2", "c1"]);
    assert_eq!(aggregate.commits[0].headline(), "Change c5");

    assert_eq!(aggregate.contributors.len(), 130);
    assert_eq!(aggregate.contributors_completeness, Completeness::Complete);
    let mut handles: Vec<_> = aggregate.contributors.iter().map(|c| c.handle.as_str()).collect();
    handles.sort_unstable();
    handles.dedup();
    assert_eq!(handles.len(), 130);

    assert_eq!(aggregate.readme_html.as_deref(), Some("<h1>Widgets</h1>"));
}

#[tokio::test]
async fn test_languages_settle_after_summary() {
    let server = MockServer::start().await;
    mount_repository(&server, "acme", "widgets", 42, Duration::ZERO).await;

    let snapshots = load_all(&orchestrator(&server), Some(RepoRef::new("acme", "widgets"))).await;

    let first_summary = snapshots.iter().position(|s| s.readiness.summary.is_settled()).expect("summary settles");
    let first_languages = snapshots.iter().position(|s| s.readiness.languages.is_settled()).expect("languages settle");
    assert!(first_summary < first_languages);
}

#[tokio::test]
async fn test_load_without_reference_makes_no_requests() {
    let server = MockServer::start().await;
    let orchestrator = orchestrator(&server);

    let snapshots = load_all(&orchestrator, RepoRef::from_link(Some("not a url"))).await;

    assert_eq!(snapshots.len(), 1);
    for section in Section::iter() {
        assert_eq!(snapshots[0].readiness.get(section), Readiness::Unavailable(UnavailableReason::NoReference));
    }
    assert!(server.received_requests().await.expect("recording enabled").is_empty());
}

#[tokio::test]
async fn test_missing_readme_is_no_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/readme"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    mount_repository(&server, "acme", "widgets", 42, Duration::ZERO).await;

    let snapshots = load_all(&orchestrator(&server), Some(RepoRef::new("acme", "widgets"))).await;
    let aggregate = snapshots.last().expect("snapshots");

    assert_eq!(aggregate.readiness.readme, Readiness::Unavailable(UnavailableReason::NotFound));
    assert!(aggregate.readme_html.is_none());
    assert_eq!(aggregate.readiness.summary, Readiness::Ready);
}

#[tokio::test]
async fn test_rate_limited_summary_marks_languages_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "Rust": 1 })))
        .expect(0)
        .mount(&server)
        .await;
    mount_repository(&server, "acme", "widgets", 42, Duration::ZERO).await;

    let snapshots = load_all(&orchestrator(&server), Some(RepoRef::new("acme", "widgets"))).await;
    let aggregate = snapshots.last().expect("snapshots");

    assert_eq!(aggregate.readiness.summary, Readiness::Unavailable(UnavailableReason::RateLimited));
    assert_eq!(aggregate.readiness.languages, Readiness::Unavailable(UnavailableReason::DependencyUnavailable));
    assert!(aggregate.summary.is_none());
    assert_eq!(aggregate.readiness.commits, Readiness::Ready);
    assert_eq!(aggregate.contributors.len(), 130);
    assert!(aggregate.is_settled());
}

#[tokio::test]
async fn test_rate_limited_contributors_page_is_partial() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/contributors"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;
    mount_repository(&server, "acme", "widgets", 42, Duration::ZERO).await;

    let snapshots = load_all(&orchestrator(&server), Some(RepoRef::new("acme", "widgets"))).await;
    let aggregate = snapshots.last().expect("snapshots");

    assert_eq!(aggregate.readiness.contributors, Readiness::Ready);
    assert_eq!(aggregate.contributors.len(), 100);
    assert_eq!(aggregate.contributors_completeness, Completeness::Partial);
}

#[tokio::test]
async fn test_everything_failing_has_no_data() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(500)).mount(&server).await;

    let snapshots = load_all(&orchestrator(&server), Some(RepoRef::new("acme", "widgets"))).await;
    let aggregate = snapshots.last().expect("snapshots");

    assert!(aggregate.has_no_data());
    assert_eq!(aggregate.readiness.commits, Readiness::Unavailable(UnavailableReason::TransportError));
}

#[tokio::test]
async fn test_newer_load_discards_older_results() {
    let server = MockServer::start().await;
    mount_repository(&server, "acme", "gadgets", 1, Duration::from_millis(400)).await;
    mount_repository(&server, "acme", "widgets", 42, Duration::ZERO).await;

    let orchestrator = orchestrator(&server);

    let stale = orchestrator.load(Some(RepoRef::new("acme", "gadgets")));
    let stale_task = tokio::spawn(async move { stale.collect::<Vec<_>>().await });

    // Give the first load time to put its requests in flight.
    tokio::time::sleep(Duration::from_millis(100)).await;

    let fresh = load_all(&orchestrator, Some(RepoRef::new("acme", "widgets"))).await;
    let stale = stale_task.await.expect("stale load task");

    // The older load never got past its initial snapshot.
    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].reference, Some(RepoRef::new("acme", "gadgets")));

    let current = orchestrator.current();
    assert_eq!(current, *fresh.last().expect("snapshots"));
    assert_eq!(current.reference, Some(RepoRef::new("acme", "widgets")));
    assert_eq!(current.summary.as_ref().map(|s| s.star_count), Some(42));
    assert!(current.is_settled());

    // Give the abandoned requests time to land; they must not touch the aggregate.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(orchestrator.current(), current);
}

#[tokio::test]
async fn test_reloading_same_reference_supersedes_previous_load() {
    let server = MockServer::start().await;
    mount_repository(&server, "acme", "widgets", 42, Duration::from_millis(200)).await;

    let orchestrator = orchestrator(&server);

    let first = orchestrator.load(Some(RepoRef::new("acme", "widgets")));
    let first_generation = orchestrator.active_tag().generation;
    let second = orchestrator.load(Some(RepoRef::new("acme", "widgets")));
    assert_eq!(orchestrator.active_tag().generation, first_generation + 1);

    let first: Vec<_> = first.collect().await;
    let second: Vec<_> = second.collect().await;

    assert!(first.is_empty());
    assert_eq!(second.len(), 6);
    assert!(orchestrator.current().is_settled());
}
