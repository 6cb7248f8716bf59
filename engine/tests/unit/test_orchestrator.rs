//! Orchestrator tests driven through a scripted tool runner

use std::sync::Arc;
use std::time::Duration;

use tokio_test::{assert_err, assert_ok};

use landing_zone::deploy::Orchestrator;
use landing_zone::errors::EngineError;
use landing_zone::filesys::dir::Dir;
use landing_zone::generator::components::ComponentRegistry;
use landing_zone::generator::Generator;
use landing_zone::models::status::DeploymentPhase;

use crate::support::{orchestrator, sample_config, ScriptedRunner};

#[tokio::test]
async fn test_idle_before_any_start() {
    let (orchestrator, root) = orchestrator(Arc::new(ScriptedRunner::new())).await;

    let status = orchestrator.query_status();
    assert_eq!(status.status, DeploymentPhase::Idle);
    assert_eq!(status.progress, 0);
    assert!(status.logs.is_empty());
    assert!(status.result.is_none());

    root.delete().await.unwrap();
}

#[tokio::test]
async fn test_start_returns_before_any_step_runs() {
    let runner = Arc::new(ScriptedRunner::new());
    let (orchestrator, root) = orchestrator(runner.clone()).await;

    let deployment_id = assert_ok!(orchestrator.start(sample_config()));
    assert!(deployment_id.parse::<i64>().is_ok());

    let status = orchestrator.query_status();
    assert_eq!(status.status, DeploymentPhase::Preparing);
    assert_eq!(status.progress, 0);
    assert!(runner.invocations().is_empty());

    orchestrator.wait().await;
    root.delete().await.unwrap();
}

#[tokio::test]
async fn test_successful_deployment() {
    let runner = Arc::new(ScriptedRunner::new());
    let (orchestrator, root) = orchestrator(runner.clone()).await;

    let deployment_id = orchestrator.start(sample_config()).unwrap();
    orchestrator.wait().await;

    let status = orchestrator.query_status();
    assert_eq!(status.status, DeploymentPhase::Completed);
    assert_eq!(status.progress, 100);

    assert_eq!(runner.subcommands(), vec!["init", "validate", "plan", "apply"]);
    let work_dir = orchestrator.deployments_dir().subdir(&deployment_id);
    for invocation in runner.invocations() {
        assert_eq!(invocation.tool, "terraform");
        assert_eq!(invocation.working_dir, work_dir.path());
    }

    let result = status.result.unwrap();
    assert_eq!(result.deployment_id, deployment_id);
    assert_eq!(result.vpcs.len(), 1);
    assert_eq!(result.subnets.len(), 2);
    assert!(result.terraform_path.ends_with("main.tf"));

    let document = work_dir.file("main.tf").read_string().await.unwrap();
    assert!(document.contains("resource \"aws_vpc\" \"main\""));
    assert!(document.contains("resource \"aws_lb\" \"web\""));

    let topology = status.topology.unwrap();
    assert_eq!(topology.nodes.len(), 5);
    assert_eq!(topology.edges_from("subnet-private").count(), 1);

    assert!(status
        .logs
        .iter()
        .any(|entry| entry == "Running terraform init -input=false"));
    assert!(status.logs.iter().any(|entry| entry.contains("apply ok")));

    root.delete().await.unwrap();
}

#[tokio::test]
async fn test_validate_failure_stops_the_pipeline() {
    let runner = Arc::new(ScriptedRunner::failing_on("validate"));
    let (orchestrator, root) = orchestrator(runner.clone()).await;

    orchestrator.start(sample_config()).unwrap();
    orchestrator.wait().await;

    let status = orchestrator.query_status();
    assert_eq!(status.status, DeploymentPhase::Failed);
    assert_eq!(status.progress, 20);
    assert!(status.message.starts_with("Terraform validate failed"));
    assert!(status.message.contains("validate rejected the configuration"));
    assert!(status.result.is_none());
    assert!(status.topology.is_none());

    assert_eq!(runner.subcommands(), vec!["init", "validate"]);
    assert!(status
        .logs
        .iter()
        .any(|entry| entry == "Running terraform validate"));
    assert!(status
        .logs
        .iter()
        .any(|entry| entry == "terraform validate output:\nError: validate rejected the configuration"));
    assert_eq!(status.logs.last(), Some(&status.message));

    root.delete().await.unwrap();
}

#[tokio::test]
async fn test_invalid_request_is_rejected_synchronously() {
    let runner = Arc::new(ScriptedRunner::new());
    let (orchestrator, root) = orchestrator(runner.clone()).await;

    let mut config = sample_config();
    config.region = String::new();

    let err = assert_err!(orchestrator.start(config));
    assert!(matches!(err, EngineError::InvalidConfig(_)));
    assert_eq!(orchestrator.query_status().status, DeploymentPhase::Idle);
    assert!(runner.invocations().is_empty());

    root.delete().await.unwrap();
}

#[tokio::test]
async fn test_latest_run_owns_the_status() {
    let (orchestrator, root) = orchestrator(Arc::new(ScriptedRunner::new())).await;

    let first = orchestrator.start(sample_config()).unwrap();
    let second = orchestrator.start(sample_config()).unwrap();
    assert!(second.parse::<i64>().unwrap() > first.parse::<i64>().unwrap());

    orchestrator.wait().await;
    tokio::time::sleep(Duration::from_millis(50)).await;

    let status = orchestrator.query_status();
    assert_eq!(status.status, DeploymentPhase::Completed);
    assert_eq!(status.result.unwrap().deployment_id, second);
    assert!(status.logs.iter().all(|entry| !entry.contains(&first)));

    root.delete().await.unwrap();
}

#[tokio::test]
async fn test_panic_is_reported_as_failure() {
    let runner = Arc::new(ScriptedRunner::panicking_once_on("plan"));
    let (orchestrator, root) = orchestrator(runner.clone()).await;

    orchestrator.start(sample_config()).unwrap();
    orchestrator.wait().await;

    let status = orchestrator.query_status();
    assert_eq!(status.status, DeploymentPhase::Failed);
    assert_eq!(status.progress, 30);
    assert!(status.message.contains("runner exploded during plan"));

    // The orchestrator is still usable afterwards
    orchestrator.start(sample_config()).unwrap();
    orchestrator.wait().await;
    assert_eq!(orchestrator.query_status().status, DeploymentPhase::Completed);

    root.delete().await.unwrap();
}

#[tokio::test]
async fn test_cancel_in_flight_run() {
    let runner = Arc::new(ScriptedRunner::stalling_on("apply"));
    let (orchestrator, root) = orchestrator(runner.clone()).await;

    orchestrator.start(sample_config()).unwrap();
    runner.stalled.notified().await;

    assert!(orchestrator.cancel());
    let status = orchestrator.query_status();
    assert_eq!(status.status, DeploymentPhase::Failed);
    assert_eq!(status.progress, 60);
    assert_eq!(status.message, "Deployment cancelled");

    assert!(!orchestrator.cancel());
    root.delete().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_starts_cancel_the_owning_run() {
    let runner = Arc::new(ScriptedRunner::stalling_on("init"));
    let (orchestrator, root) = orchestrator(runner.clone()).await;

    let starts: Vec<_> = (0..16)
        .map(|_| {
            let orchestrator = Arc::clone(&orchestrator);
            tokio::spawn(async move { orchestrator.start(sample_config()) })
        })
        .collect();
    let mut ids = Vec::new();
    for start in starts {
        let id = assert_ok!(start.await.unwrap());
        ids.push(id.parse::<i64>().unwrap());
    }
    let latest = ids.iter().max().unwrap().to_string();

    assert!(orchestrator.cancel());
    let status = orchestrator.query_status();
    assert_eq!(status.deployment_id.as_deref(), Some(latest.as_str()));
    assert_eq!(status.status, DeploymentPhase::Failed);
    assert_eq!(status.message, "Deployment cancelled");

    root.delete().await.unwrap();
}

#[tokio::test]
async fn test_custom_tool_and_plan_file() {
    let runner = Arc::new(ScriptedRunner::new());
    let root = Dir::create_temp_dir("lz-it").await.unwrap();
    let orchestrator = Arc::new(
        Orchestrator::new(runner.clone(), root.subdir("deployments"))
            .with_tool("tofu")
            .with_plan_file("release.plan"),
    );

    orchestrator.start(sample_config()).unwrap();
    orchestrator.wait().await;

    let invocations = runner.invocations();
    assert!(invocations.iter().all(|i| i.tool == "tofu"));
    assert!(invocations[2].args.contains(&"-out=release.plan".to_string()));
    assert_eq!(invocations[3].args.last().map(String::as_str), Some("release.plan"));

    root.delete().await.unwrap();
}

#[tokio::test]
async fn test_zone_warnings_reach_the_log() {
    let (orchestrator, root) = orchestrator(Arc::new(ScriptedRunner::new())).await;

    let mut config = sample_config();
    config.az = "Zone Q".to_string();
    config.all_subnets[1].az = String::new();

    orchestrator.start(config).unwrap();
    orchestrator.wait().await;

    let status = orchestrator.query_status();
    assert_eq!(status.status, DeploymentPhase::Completed);
    assert!(status.logs.iter().any(|entry| entry.starts_with("Warning:")));

    root.delete().await.unwrap();
}

#[tokio::test]
async fn test_custom_registry_controls_components() {
    let root = Dir::create_temp_dir("lz-it").await.unwrap();
    let orchestrator = Arc::new(
        Orchestrator::new(Arc::new(ScriptedRunner::new()), root.subdir("deployments"))
            .with_generator(Generator::new(ComponentRegistry::empty())),
    );

    let deployment_id = orchestrator.start(sample_config()).unwrap();
    orchestrator.wait().await;

    let document = orchestrator
        .deployments_dir()
        .subdir(&deployment_id)
        .file("main.tf")
        .read_string()
        .await
        .unwrap();
    assert!(document.contains("resource \"aws_subnet\" \"private\""));
    assert!(!document.contains("aws_lb"));
    assert!(!document.contains("aws_s3_bucket"));

    // Components without a renderer still appear in the topology
    let topology = orchestrator.query_status().topology.unwrap();
    assert!(topology.node("load-balancer-web").is_some());

    root.delete().await.unwrap();
}
