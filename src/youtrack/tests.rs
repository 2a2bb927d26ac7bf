//! End-to-end tests for the YouTrack extension against a mock tracker.

#[cfg(test)]
mod tests {
    use crate::config::{ConfigStore, HOST_KEY, PASSWORD_KEY, PORT_KEY, USER_KEY};
    use crate::extension::{Changeset, IssueTrackerExtension, TaskRecord};
    use crate::youtrack::query::issue_number;
    use crate::youtrack::YouTrackExtension;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn store_for(server: &MockServer, user: &str) -> ConfigStore {
        let address = server.address();
        ConfigStore::new()
            .with_value(HOST_KEY, &address.ip().to_string())
            .with_value(PORT_KEY, &address.port().to_string())
            .with_value(USER_KEY, user)
            .with_value(PASSWORD_KEY, "secret")
    }

    fn issue_xml(number: u32, state: &str) -> String {
        format!(
            r#"<issue id="YT-{n}">
  <field name="numberInProject"><value>{n}</value></field>
  <field name="summary"><value>Issue {n}</value></field>
  <field name="description"><value>Details of {n}</value></field>
  <field name="Type"><value>Bug</value></field>
  <field name="State"><value>{state}</value></field>
  <field name="Assignee"><value>bob</value></field>
</issue>"#,
            n = number,
            state = state
        )
    }

    async fn mount_login(server: &MockServer, cookie: &str, times: u64) {
        Mock::given(method("POST"))
            .and(path("/rest/user/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<login>ok</login>")
                    .append_header("Set-Cookie", format!("{}; Path=/", cookie).as_str()),
            )
            .expect(times)
            .mount(server)
            .await;
    }

    async fn mount_issue(server: &MockServer, number: u32) {
        Mock::given(method("GET"))
            .and(path(format!("/rest/issue/yt-{}", number)))
            .respond_with(ResponseTemplate::new(200).set_body_string(issue_xml(number, "Open")))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_task_for_branch_round_trip() {
        let server = MockServer::start().await;
        mount_login(&server, "YTSESSION=1", 1).await;
        mount_issue(&server, 42).await;

        let ext = YouTrackExtension::new(&store_for(&server, "bob"));
        let task = ext.get_task_for_branch("/main/yt-42").await.unwrap();
        assert_eq!(
            task,
            TaskRecord {
                id: "yt-42".to_string(),
                owner: "bob".to_string(),
                status: "Open".to_string(),
                title: "[Bug] Issue 42 [Open]".to_string(),
                description: "Details of 42".to_string(),
            }
        );

        let again = ext
            .get_task_for_branch(&format!("/main/{}", task.id))
            .await
            .unwrap();
        assert_eq!(issue_number(&again.id, "yt-"), Some("42"));
        assert_eq!(again, task);
    }

    #[tokio::test]
    async fn test_branch_without_task_makes_no_request() {
        let server = MockServer::start().await;
        mount_login(&server, "YTSESSION=1", 0).await;

        let ext = YouTrackExtension::new(&store_for(&server, "bob"));
        assert_eq!(ext.get_task_for_branch("/main/feature-x").await, None);
        assert_eq!(ext.get_task_for_branch("/main/yt-").await, None);
        assert_eq!(ext.get_task_for_branch("/main/").await, None);
    }

    #[tokio::test]
    async fn test_tasks_for_branches_tolerates_failures() {
        let server = MockServer::start().await;
        mount_login(&server, "YTSESSION=1", 1).await;
        mount_issue(&server, 1).await;

        let ext = YouTrackExtension::new(&store_for(&server, "bob"));
        let branches = vec![
            "/main/yt-1".to_string(),
            "/main/yt-404".to_string(),
            "/main/feature".to_string(),
        ];
        let tasks = ext.get_tasks_for_branches(&branches).await;

        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks["/main/yt-1"].as_ref().unwrap().id, "yt-1");
        assert!(tasks["/main/yt-404"].is_none());
        assert!(tasks["/main/feature"].is_none());
    }

    #[tokio::test]
    async fn test_load_tasks_skips_unresolvable() {
        let server = MockServer::start().await;
        mount_login(&server, "YTSESSION=1", 1).await;
        mount_issue(&server, 1).await;
        mount_issue(&server, 2).await;

        let ext = YouTrackExtension::new(&store_for(&server, "bob"));
        let ids = vec![
            "yt-1".to_string(),
            String::new(),
            "yt-404".to_string(),
            "yt-2".to_string(),
        ];
        let tasks = ext.load_tasks(&ids).await;
        let ids: Vec<_> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["yt-1", "yt-2"]);
    }

    #[tokio::test]
    async fn test_pending_tasks() {
        let server = MockServer::start().await;
        mount_login(&server, "YTSESSION=1", 1).await;
        let body = format!(
            "<issueCompacts>{}{}</issueCompacts>",
            issue_xml(1, "Open"),
            issue_xml(2, "In Progress")
        );
        Mock::given(method("GET"))
            .and(path("/rest/issue"))
            .and(query_param("max", "10000"))
            .and(header("Cookie", "YTSESSION=1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(2)
            .mount(&server)
            .await;

        let ext = YouTrackExtension::new(&store_for(&server, "bob"));
        let all = ext.get_pending_tasks(None).await;
        assert_eq!(all.len(), 2);
        assert_eq!(all[1].status, "In Progress");

        let mine = ext.get_pending_tasks(Some("bob")).await;
        assert_eq!(mine.len(), 2);

        let requests = server.received_requests().await.unwrap();
        let searches: Vec<_> = requests
            .iter()
            .filter(|r| r.url.path() == "/rest/issue")
            .collect();
        assert!(!searches[0].url.as_str().contains("for:me"));
        assert!(searches[1].url.as_str().contains("for:me"));
    }

    #[tokio::test]
    async fn test_pending_tasks_empty_on_failure() {
        let server = MockServer::start().await;
        mount_login(&server, "YTSESSION=1", 1).await;
        Mock::given(method("GET"))
            .and(path("/rest/issue"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let ext = YouTrackExtension::new(&store_for(&server, "bob"));
        assert!(ext.get_pending_tasks(None).await.is_empty());
    }

    #[tokio::test]
    async fn test_checkin_dispatches_to_every_task() {
        let server = MockServer::start().await;
        mount_login(&server, "YTSESSION=1", 1).await;
        for id in ["yt-1", "yt-2"] {
            Mock::given(method("POST"))
                .and(path(format!("/rest/issue/{}/execute", id)))
                .and(query_param("command", "assignee bob state fixed"))
                .and(query_param("comment", "Via PlasticSCM: Fixes the bug "))
                .respond_with(ResponseTemplate::new(200))
                .expect(1)
                .mount(&server)
                .await;
        }

        let ext = YouTrackExtension::new(&store_for(&server, "bob"));
        let changeset = Changeset {
            id: 17,
            branch: "/main/yt-1".to_string(),
            owner: "bob".to_string(),
            comment: "Fixes the bug {{assignee bob state fixed}}".to_string(),
        };
        let tasks = vec![
            TaskRecord {
                id: "yt-1".to_string(),
                ..Default::default()
            },
            TaskRecord {
                id: "yt-2".to_string(),
                ..Default::default()
            },
        ];
        ext.log_checkin_result(&changeset, &tasks).await;
    }

    #[tokio::test]
    async fn test_empty_checkin_sends_nothing() {
        let server = MockServer::start().await;
        mount_login(&server, "YTSESSION=1", 0).await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let ext = YouTrackExtension::new(&store_for(&server, "bob"));
        let changeset = Changeset {
            comment: "{{}}".to_string(),
            ..Default::default()
        };
        let tasks = vec![TaskRecord {
            id: "yt-1".to_string(),
            ..Default::default()
        }];
        ext.log_checkin_result(&changeset, &tasks).await;
    }

    #[tokio::test]
    async fn test_checkin_relogs_on_expired_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/user/login"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<login>ok</login>")
                    .append_header("Set-Cookie", "YTSESSION=stale; Path=/"),
            )
            .up_to_n_times(1)
            .with_priority(1)
            .mount(&server)
            .await;
        mount_login(&server, "YTSESSION=fresh", 1).await;
        Mock::given(method("POST"))
            .and(path("/rest/issue/yt-1/execute"))
            .and(header("Cookie", "YTSESSION=fresh"))
            .and(query_param("command", "state fixed"))
            .respond_with(ResponseTemplate::new(200))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/issue/yt-1/execute"))
            .respond_with(ResponseTemplate::new(401))
            .with_priority(2)
            .expect(1)
            .mount(&server)
            .await;

        let ext = YouTrackExtension::new(&store_for(&server, "bob"));
        ext.connect().await;
        let changeset = Changeset {
            comment: "{{state fixed}}".to_string(),
            ..Default::default()
        };
        let tasks = vec![TaskRecord {
            id: "yt-1".to_string(),
            ..Default::default()
        }];
        ext.log_checkin_result(&changeset, &tasks).await;
    }

    #[tokio::test]
    async fn test_tracker_recovers_after_refused_logins() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/user/login"))
            .respond_with(ResponseTemplate::new(403).set_body_string("<error>down</error>"))
            .up_to_n_times(3)
            .with_priority(1)
            .expect(3)
            .mount(&server)
            .await;
        mount_login(&server, "YTSESSION=fresh", 1).await;
        Mock::given(method("GET"))
            .and(path("/rest/issue/yt-5"))
            .and(header("Cookie", "YTSESSION=fresh"))
            .respond_with(ResponseTemplate::new(200).set_body_string(issue_xml(5, "Open")))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/rest/issue/yt-5"))
            .respond_with(ResponseTemplate::new(401))
            .with_priority(2)
            .mount(&server)
            .await;

        let ext = YouTrackExtension::new(&store_for(&server, "bob"));
        assert_eq!(ext.get_task_for_branch("/main/yt-5").await, None);

        let task = ext.get_task_for_branch("/main/yt-5").await.unwrap();
        assert_eq!(task.id, "yt-5");
    }

    #[tokio::test]
    async fn test_mark_task_as_open() {
        let server = MockServer::start().await;
        mount_login(&server, "YTSESSION=1", 1).await;
        Mock::given(method("POST"))
            .and(path("/rest/issue/yt-3/execute"))
            .and(query_param("command", "assignee alice state in progress"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let ext = YouTrackExtension::new(&store_for(&server, "bob"));
        ext.mark_task_as_open("yt-3", "alice").await;
    }

    #[tokio::test]
    async fn test_connection_probe_keeps_live_server() {
        let live = MockServer::start().await;
        let probed = MockServer::start().await;
        mount_login(&live, "YTSESSION=live", 1).await;
        mount_login(&probed, "YTSESSION=probe", 1).await;
        Mock::given(method("GET"))
            .and(path("/rest/issue/yt-5"))
            .and(header("Cookie", "YTSESSION=live"))
            .respond_with(ResponseTemplate::new(200).set_body_string(issue_xml(5, "Open")))
            .expect(1)
            .mount(&live)
            .await;

        let ext = YouTrackExtension::new(&store_for(&live, "bob"));
        assert!(ext.test_connection(&store_for(&probed, "carol")).await);

        let task = ext.get_task_for_branch("yt-5").await.unwrap();
        assert_eq!(task.id, "yt-5");
    }

    #[tokio::test]
    async fn test_connection_reports_refused_login() {
        let live = MockServer::start().await;
        let probed = MockServer::start().await;
        mount_login(&live, "YTSESSION=live", 1).await;
        Mock::given(method("POST"))
            .and(path("/rest/user/login"))
            .respond_with(ResponseTemplate::new(403).set_body_string("<error>denied</error>"))
            .expect(1)
            .mount(&probed)
            .await;

        let ext = YouTrackExtension::new(&store_for(&live, "bob"));
        assert!(!ext.test_connection(&store_for(&probed, "mallory")).await);
    }

    #[tokio::test]
    async fn test_extension_name() {
        let server = MockServer::start().await;
        let ext = YouTrackExtension::new(&store_for(&server, "bob"));
        assert_eq!(ext.name(), "YouTrack Extension");
        ext.disconnect().await;
    }
}
