//! Integration tests for the `show` and `init` commands.

use core::time::Duration;
use repo_glance::Host;
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test host that captures output to in-memory buffers.
struct TestHost {
    output_buf: Vec<u8>,
    error_buf: Vec<u8>,
}

impl TestHost {
    const fn new() -> Self {
        Self {
            output_buf: Vec::new(),
            error_buf: Vec::new(),
        }
    }

    fn output_str(&self) -> String {
        String::from_utf8_lossy(&self.output_buf).into_owned()
    }

    fn error_str(&self) -> String {
        String::from_utf8_lossy(&self.error_buf).into_owned()
    }
}

impl Host for TestHost {
    fn output(&mut self) -> impl std::io::Write {
        &mut self.output_buf
    }

    fn error(&mut self) -> impl std::io::Write {
        &mut self.error_buf
    }
}

async fn mount_widgets(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stargazers_count": 42,
            "forks_count": 7,
            "open_issues_count": 1,
            "topics": ["widgets"],
            "html_url": "https://github.com/acme/widgets",
            "languages_url": format!("{}/repos/acme/widgets/languages", server.uri())
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "TypeScript": 8000, "CSS": 2000 })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/commits"))
        .and(query_param("per_page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "sha": "aaaaaaaaaaaa",
                "html_url": "https://github.com/acme/widgets/commit/aaaaaaaaaaaa",
                "commit": { "message": "Older change", "author": { "name": "Ada", "date": "2024-01-01T00:00:00Z" } }
            },
            {
                "sha": "bbbbbbbbbbbb",
                "html_url": "https://github.com/acme/widgets/commit/bbbbbbbbbbbb",
                "commit": { "message": "Newer change", "author": { "name": "Bob", "date": "2024-02-01T00:00:00Z" } }
            }
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/readme"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/contributors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "login": "ada", "avatar_url": "", "html_url": "https://github.com/ada", "contributions": 12 },
            { "login": "bob", "avatar_url": "", "html_url": "https://github.com/bob", "contributions": 3 }
        ])))
        .mount(server)
        .await;
}

fn write_config(dir: &tempfile::TempDir, server: &MockServer) -> String {
    let path = dir.path().join("glance.toml");
    let text = format!("api_base_url = \"{}\"\ncommit_window = 2\nrequest_timeout_secs = 5\n", server.uri());
    std::fs::write(&path, text).expect("write config");
    path.to_str().expect("valid path").to_string()
}

#[tokio::test]
async fn test_show_command_renders_sections_and_json() {
    let server = MockServer::start().await;
    mount_widgets(&server).await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, &server);
    let json_path = temp_dir.path().join("widgets.json");

    let mut host = TestHost::new();
    let result = repo_glance::run(
        &mut host,
        [
            "repo-glance",
            "show",
            "https://github.com/acme/widgets",
            "--config",
            &config_path,
            "--color",
            "never",
            "--json",
            json_path.to_str().expect("valid path"),
        ],
    )
    .await;

    assert!(result.is_ok(), "show command failed: {result:?}");

    let output = host.output_str();
    assert!(output.starts_with("acme/widgets\n"), "output was: {output}");
    assert!(output.contains("Stars: 42  Forks: 7  Open issues: 1"));
    assert!(output.contains("TypeScript  80.0%"));
    assert!(output.contains("CSS         20.0%"));
    assert!(output.contains("bbbbbbb Newer change (Bob"));
    assert!(output.contains("2 contributors"));
    assert!(output.contains("README\n  no data"));
    assert!(!output.contains("loading..."));

    // Sections appear once each, in the order they settled.
    for title in ["Summary", "Languages", "Recent commits", "README", "Contributors"] {
        assert_eq!(output.matches(&format!("\n{title}\n")).count(), 1, "section {title} in: {output}");
    }
    let summary_at = output.find("\nSummary\n").expect("summary");
    let languages_at = output.find("\nLanguages\n").expect("languages");
    assert!(summary_at < languages_at);

    let parsed: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&json_path).expect("read JSON")).expect("valid JSON");
    assert_eq!(parsed["repository"]["summary"]["star_count"], 42);
    assert_eq!(parsed["repository"]["commits"].as_array().expect("commits").len(), 2);
    assert_eq!(parsed["repository"]["commits"][0]["id"], "bbbbbbbbbbbb");
    assert_eq!(parsed["repository"]["readiness"]["readme"]["reason"], "not_found");
    assert_eq!(parsed["language_percentages"]["TypeScript"], 80.0);
}

#[tokio::test]
async fn test_show_command_api_base_url_override() {
    let server = MockServer::start().await;
    mount_widgets(&server).await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("glance.toml");
    std::fs::write(&config_path, "api_base_url = \"http://127.0.0.1:9\"\n").expect("write config");

    let mut host = TestHost::new();
    let uri = server.uri();
    let result = repo_glance::run(
        &mut host,
        [
            "repo-glance",
            "show",
            "https://github.com/acme/widgets.git",
            "--config",
            config_path.to_str().expect("valid path"),
            "--api-base-url",
            &uri,
            "--color",
            "never",
        ],
    )
    .await;

    assert!(result.is_ok(), "show command failed: {result:?}");
    assert!(host.output_str().contains("Stars: 42"));
}

#[tokio::test]
async fn test_show_command_total_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(403)).mount(&server).await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, &server);

    let mut host = TestHost::new();
    let result = repo_glance::run(
        &mut host,
        ["repo-glance", "show", "https://github.com/acme/widgets", "--config", &config_path, "--color", "never"],
    )
    .await;

    assert!(result.is_ok(), "show command failed: {result:?}");
    let output = host.output_str();
    assert!(output.contains("unavailable (rate limited)"));
    assert!(output.trim_end().ends_with("No repository data available"));
}

#[tokio::test]
async fn test_show_command_server_errors_print_every_section() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/readme"))
        .respond_with(ResponseTemplate::new(500).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;
    Mock::given(method("GET")).respond_with(ResponseTemplate::new(500)).mount(&server).await;

    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = write_config(&temp_dir, &server);

    let mut host = TestHost::new();
    let result = repo_glance::run(
        &mut host,
        ["repo-glance", "show", "https://github.com/acme/widgets", "--config", &config_path, "--color", "never"],
    )
    .await;

    assert!(result.is_ok(), "show command failed: {result:?}");
    let output = host.output_str();
    for title in ["Summary", "Languages", "Recent commits", "README", "Contributors"] {
        assert_eq!(output.matches(&format!("\n{title}\n")).count(), 1, "section {title} in: {output}");
    }
    assert!(output.contains("README\n  unavailable (request failed)"), "output was: {output}");
    assert_eq!(output.matches("No repository data available").count(), 1);
    assert!(output.trim_end().ends_with("No repository data available"));
}

#[tokio::test]
async fn test_show_command_invalid_config() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("glance.toml");
    std::fs::write(&config_path, "commit_window = 0\n").expect("write config");

    let mut host = TestHost::new();
    let result = repo_glance::run(
        &mut host,
        [
            "repo-glance",
            "show",
            "https://github.com/acme/widgets",
            "--config",
            config_path.to_str().expect("valid path"),
        ],
    )
    .await;

    assert!(result.is_err());
    assert!(host.output_str().is_empty());
    assert!(host.error_str().is_empty());
}

#[tokio::test]
async fn test_init_command_writes_config() {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let output_path = temp_dir.path().join("glance.toml");

    let mut host = TestHost::new();
    let result = repo_glance::run(&mut host, ["repo-glance", "init", output_path.to_str().expect("valid path")]).await;

    assert!(result.is_ok(), "init command failed: {result:?}");
    let text = std::fs::read_to_string(&output_path).expect("read config");
    assert_eq!(text, repo_glance::commands::DEFAULT_CONFIG_TOML);
    assert!(host.output_str().contains("Generated default configuration file"));
}
