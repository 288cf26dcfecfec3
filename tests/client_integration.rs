//! Integration tests for the GoCD client against a wiremock server.

use gocd_provider::models::Pipeline;
use gocd_provider::{ErrorKind, GocdClient};
use serde_json::json;
use wiremock::matchers::{basic_auth, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> GocdClient {
    GocdClient::with_client(format!("{}/go", server.uri()), reqwest::Client::new())
}

fn pipeline_body(name: &str, label_template: &str) -> serde_json::Value {
    json!({
        "_links": {"self": {"href": format!("https://ci.example.com/go/api/admin/pipelines/{}", name)}},
        "name": name,
        "group": "infra",
        "label_template": label_template,
        "materials": [{"type": "git", "attributes": {"url": "https://github.com/gocd/gocd", "branch": "master"}}],
        "stages": [{"name": "plan", "jobs": [{"name": "terraform", "tasks": []}]}]
    })
}

mod pipeline_config_tests {
    use super::*;

    #[tokio::test]
    async fn test_get_sets_version_from_etag() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/go/api/admin/pipelines/build"))
            .and(header("Accept", "application/vnd.go.cd.v6+json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("ETag", "\"05548388f7ef5042cd39f7fe42e85735\"")
                    .set_body_json(pipeline_body("build", "${COUNT}")),
            )
            .mount(&server)
            .await;

        let response = client(&server).pipeline_configs().get("build").await.unwrap();
        assert!(!response.is_not_found());
        assert_eq!(response.etag(), Some("05548388f7ef5042cd39f7fe42e85735"));

        let pipeline = response.into_body().unwrap();
        assert_eq!(pipeline.name, "build");
        assert_eq!(pipeline.version.as_deref(), Some("05548388f7ef5042cd39f7fe42e85735"));
        assert!(pipeline.links.is_some());
    }

    #[tokio::test]
    async fn test_get_missing_is_not_an_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/go/api/admin/pipelines/missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"message": "Either the resource you requested was not found, or you are not authorized to perform this action."})),
            )
            .mount(&server)
            .await;

        let response = client(&server).pipeline_configs().get("missing").await.unwrap();
        assert!(response.is_not_found());
        assert_eq!(response.status(), 404);
        assert!(response.body().is_none());
    }

    #[tokio::test]
    async fn test_empty_name_sends_nothing() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client(&server).pipeline_configs().get("").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.to_string(), "`name` can not be empty");
    }

    #[tokio::test]
    async fn test_create_wraps_group() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/go/api/admin/pipelines"))
            .and(body_json(json!({
                "group": "infra",
                "pipeline": {"name": "pipeline0-terraform", "materials": []}
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("ETag", "\"v1\"")
                    .set_body_json(json!({"name": "pipeline0-terraform", "materials": []})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server)
            .pipeline_configs()
            .create("infra", &Pipeline::new("pipeline0-terraform"))
            .await
            .unwrap();
        assert_eq!(response.into_body().unwrap().version.as_deref(), Some("v1"));
    }

    #[tokio::test]
    async fn test_create_requires_group() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client(&server)
            .pipeline_configs()
            .create(" ", &Pipeline::new("build"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "`group` can not be empty");
    }

    #[tokio::test]
    async fn test_update_sends_if_match() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/go/api/admin/pipelines/build"))
            .and(header("If-Match", "\"v1\""))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("ETag", "\"v2\"")
                    .set_body_json(pipeline_body("build", "${COUNT}-${git[:8]}")),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut pipeline = Pipeline::new("build");
        pipeline.version = Some("v1".to_string());

        let updated = client(&server)
            .pipeline_configs()
            .update("build", &pipeline)
            .await
            .unwrap()
            .into_body()
            .unwrap();
        assert_eq!(updated.version.as_deref(), Some("v2"));
        assert_eq!(updated.label_template.as_deref(), Some("${COUNT}-${git[:8]}"));
    }

    #[tokio::test]
    async fn test_update_without_version_sends_nothing() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client(&server)
            .pipeline_configs()
            .update("build", &Pipeline::new("build"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "`version` can not be empty");
    }

    #[tokio::test]
    async fn test_stale_version_is_conflict() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/go/api/admin/pipelines/build"))
            .respond_with(ResponseTemplate::new(412).set_body_json(json!({
                "message": "Someone has modified the configuration for pipeline 'build'. Please update your copy of the config with the changes."
            })))
            .mount(&server)
            .await;

        let mut pipeline = Pipeline::new("build");
        pipeline.version = Some("stale".to_string());

        let err = client(&server)
            .pipeline_configs()
            .update("build", &pipeline)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.status(), Some(412));
        assert!(err.to_string().contains("Someone has modified the configuration"));
    }

    #[tokio::test]
    async fn test_delete_refused_with_406() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/go/api/admin/pipelines/build"))
            .respond_with(ResponseTemplate::new(406).set_body_json(json!({
                "message": "Cannot delete pipeline 'build' as it is present in environment 'prod'."
            })))
            .mount(&server)
            .await;

        let err = client(&server).pipeline_configs().delete("build").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.status(), Some(406));
        assert_eq!(
            err.to_string(),
            "API error (status 406): Cannot delete pipeline 'build' as it is present in environment 'prod'."
        );
    }

    #[tokio::test]
    async fn test_delete_missing_and_existing() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/go/api/admin/pipelines/gone"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/go/api/admin/pipelines/build"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"message": "Pipeline 'build' was deleted successfully."})),
            )
            .mount(&server)
            .await;

        let client = client(&server);
        assert!(client.pipeline_configs().delete("gone").await.unwrap().is_not_found());

        let deleted = client.pipeline_configs().delete("build").await.unwrap();
        assert_eq!(
            deleted.body().unwrap().message,
            "Pipeline 'build' was deleted successfully."
        );
    }

    #[tokio::test]
    async fn test_server_error_message_falls_back_to_body() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/go/api/admin/pipelines/build"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal failure"))
            .mount(&server)
            .await;

        let err = client(&server).pipeline_configs().get("build").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.status(), Some(500));
        assert!(err.to_string().contains("internal failure"));
    }
}

mod runtime_tests {
    use super::*;

    #[tokio::test]
    async fn test_basic_auth_is_sent() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/go/api/pipelines/build/status"))
            .and(basic_auth("admin", "secret"))
            .and(header("Accept", "application/vnd.go.cd.v1+json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "paused": true,
                "paused_cause": "maintenance",
                "paused_by": "admin",
                "locked": false,
                "schedulable": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let status = client(&server)
            .with_basic_auth("admin", "secret")
            .pipelines()
            .status("build")
            .await
            .unwrap()
            .into_body()
            .unwrap();
        assert!(status.paused);
        assert_eq!(status.paused_cause.as_deref(), Some("maintenance"));
    }

    #[tokio::test]
    async fn test_pause_sends_confirm_header() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/go/api/pipelines/build/pause"))
            .and(header("X-GoCD-Confirm", "true"))
            .and(body_json(json!({"pause_cause": "maintenance"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"message": "Pipeline 'build' paused successfully."})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server)
            .pipelines()
            .pause("build", "maintenance")
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn test_unpause_of_missing_pipeline_is_not_found_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/go/api/pipelines/gone/unpause"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not found"})))
            .mount(&server)
            .await;

        let err = client(&server).pipelines().unpause("gone").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_scheduled_jobs_xml_feed() {
        let server = MockServer::start().await;

        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<scheduledJobs>
  <job name="terraform" id="6">
    <link rel="self" href="https://ci.example.com/go/tab/build/detail/pipeline0-terraform/1/plan/1/terraform"/>
    <buildLocator>pipeline0-terraform/1/plan/1/terraform</buildLocator>
    <environment>prod</environment>
    <resources>
      <resource>linux</resource>
    </resources>
    <environmentVariables>
      <variable name="TF_WORKSPACE">prod</variable>
    </environmentVariables>
  </job>
</scheduledJobs>"#;

        Mock::given(method("GET"))
            .and(path("/go/api/jobs/scheduled.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(xml, "application/xml"))
            .mount(&server)
            .await;

        let jobs = client(&server)
            .jobs()
            .list_scheduled()
            .await
            .unwrap()
            .into_body()
            .unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, 6);
        assert_eq!(jobs[0].pipeline_name(), "pipeline0-terraform");
        assert_eq!(jobs[0].resources, vec!["linux"]);
        assert_eq!(jobs[0].environment_variables["TF_WORKSPACE"], "prod");
    }

    #[tokio::test]
    async fn test_agents_listing() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/go/api/agents"))
            .and(header("Accept", "application/vnd.go.cd.v4+json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_embedded": {"agents": [
                    {"uuid": "adb9540a-b954-4571-9d9b-2f330739d4da", "hostname": "agent01", "ip_address": "10.12.20.47",
                     "resources": ["linux"], "environments": ["prod"]}
                ]}
            })))
            .mount(&server)
            .await;

        let agents = client(&server).agents().list().await.unwrap().into_body().unwrap();
        assert_eq!(agents.len(), 1);
        assert_eq!(agents[0].hostname, "agent01");
        assert_eq!(agents[0].environment_names(), vec!["prod"]);
    }

    #[tokio::test]
    async fn test_transport_failure() {
        let client = GocdClient::with_client("http://127.0.0.1:1/go", reqwest::Client::new());
        let err = client.agents().list().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }
}
