// Copyright (c) 2025 - Cowboy AI, Inc.
//! End-to-end hierarchy scenarios against in-memory stores
//!
//! Each test builds the hierarchy through `TerragruntService` and inspects
//! what ended up in the object store.

mod fixtures;

use cim_terragrunt::domain::{
    AccountPatch, ComponentDraft, ComponentPatch, EnvironmentDraft, Hierarchy, Provider, ServiceDraft,
    ServicePatch,
};
use cim_terragrunt::layout::ArtifactPath;
use cim_terragrunt::persistence::{InMemoryDocumentStore, InMemoryObjectStore, ObjectStore};
use cim_terragrunt::TerragruntError;
use fixtures::*;
use pretty_assertions::assert_eq;
use std::sync::Arc;

const ROOT_KEY: &str = "terragrunt/terragrunt.hcl";
const ENV_KEY: &str = "terragrunt/environments/dev/terragrunt.hcl";
const VPC_KEY: &str = "terragrunt/environments/dev/components/vpc/terragrunt.hcl";

#[tokio::test]
async fn test_environment_creation_scaffolds_bucket() {
    let (objects, service) = service_with_region().await;

    let outcome = service
        .create_environment(environment_draft())
        .await
        .unwrap();
    assert!(outcome.is_saved());

    let keys: Vec<String> = objects.put_log().await.into_iter().map(|p| p.key).collect();
    assert_eq!(
        keys,
        vec![
            ROOT_KEY.to_string(),
            ENV_KEY.to_string(),
            "terragrunt/environments/dev/components/.gitkeep".to_string(),
            "terragrunt/environments/dev/services/.gitkeep".to_string(),
        ]
    );

    let root = objects.text(BUCKET, ROOT_KEY).await.unwrap();
    assert!(root.contains("bucket         = \"tg-bucket\""));
    assert!(root.contains("region         = \"us-east-1\""));
    assert!(root.contains("provider    = \"aws\""));

    let env = objects.text(BUCKET, ENV_KEY).await.unwrap();
    assert!(env.contains("path = \"../../terragrunt.hcl\""));
    assert!(env.contains("environment = \"dev\""));
}

#[tokio::test]
async fn test_component_creation_uploads_pinned_source() {
    let (objects, service) = service_with_region().await;
    service.create_environment(environment_draft()).await.unwrap();

    let outcome = service.create_component(vpc_draft()).await.unwrap();
    assert!(outcome.is_saved());
    assert_eq!(objects.put_log().await.len(), 5);

    let text = objects.text(BUCKET, VPC_KEY).await.unwrap();
    assert!(text.contains("source = \"terraform-aws-modules/vpc/aws//3.5.0\""));
    assert!(text.contains("path = \"../../../../terragrunt.hcl\""));
    assert!(text.contains("\"name\": \"main\""));
}

#[tokio::test]
async fn test_second_environment_reuses_root_artifact() {
    let (objects, service) = service_with_region().await;
    service.create_environment(environment_draft()).await.unwrap();

    let staging = service
        .create_environment(EnvironmentDraft::new("staging", REGION_ID, BUCKET))
        .await
        .unwrap();
    assert_eq!(staging.artifact.as_ref().unwrap().len(), 3);

    let roots = objects
        .put_log()
        .await
        .into_iter()
        .filter(|p| p.key == ROOT_KEY)
        .count();
    assert_eq!(roots, 1);
}

#[tokio::test]
async fn test_region_with_environment_cannot_be_deleted() {
    let (_, service) = service_with_region().await;
    service.create_environment(environment_draft()).await.unwrap();

    let err = service
        .hierarchy()
        .delete_region(&REGION_ID.into())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TerragruntError::DependencyExists {
            count: 1,
            dependent_kind: "environment".to_string(),
        }
    );
    assert!(service.hierarchy().region(&REGION_ID.into()).await.is_some());
}

#[tokio::test]
async fn test_account_with_region_cannot_be_deleted() {
    let (_, service) = service_with_region().await;

    let err = service
        .hierarchy()
        .delete_account(&ACCOUNT_ID.into())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        TerragruntError::DependencyExists { count: 1, ref dependent_kind } if dependent_kind == "region"
    ));
}

#[tokio::test]
async fn test_environment_requires_existing_region() {
    let (objects, service) = service_with_region().await;

    let err = service
        .create_environment(EnvironmentDraft::new("dev", "missing", BUCKET))
        .await
        .unwrap_err();
    assert!(matches!(err, TerragruntError::Referential { .. }));
    assert!(objects.put_log().await.is_empty());
}

#[tokio::test]
async fn test_teardown_in_dependency_order() {
    let (_, service) = service_with_region().await;
    service.create_environment(environment_draft()).await.unwrap();
    service.create_component(vpc_draft()).await.unwrap();

    let blocked = service.delete_environment(&ENVIRONMENT_ID.into()).await;
    assert!(matches!(blocked, Err(TerragruntError::DependencyExists { .. })));

    service.delete_component(&COMPONENT_ID.into()).await.unwrap();
    service.delete_environment(&ENVIRONMENT_ID.into()).await.unwrap();
    service.hierarchy().delete_region(&REGION_ID.into()).await.unwrap();
    service.hierarchy().delete_account(&ACCOUNT_ID.into()).await.unwrap();

    assert_eq!(service.hierarchy().snapshot().await, Hierarchy::default());
}

#[tokio::test]
async fn test_dangling_dependency_is_skipped_with_warning() {
    let (objects, service) = service_with_region().await;
    service.create_environment(environment_draft()).await.unwrap();
    service.create_component(vpc_draft()).await.unwrap();
    let subnets = service
        .create_component(
            ComponentDraft::new(
                "subnets",
                ENVIRONMENT_ID,
                "terraform-aws-modules/subnets/aws",
                "1.0.0",
            )
            .with_id("c2"),
        )
        .await
        .unwrap();

    let api = service
        .create_service(
            ServiceDraft::new("api", ENVIRONMENT_ID, "org/api/aws", "2.0.0")
                .with_id("s1")
                .depends_on(COMPONENT_ID)
                .depends_on(subnets.entity.id.clone()),
        )
        .await
        .unwrap();
    assert!(api.warnings.is_empty());

    // Component deletion is allowed while a service still references it
    service.delete_component(&"c2".into()).await.unwrap();

    let report = service.save_service(&"s1".into()).await.unwrap();
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].component_id.as_str(), "c2");

    let text = objects
        .text(BUCKET, &ArtifactPath::service("dev", "api").key())
        .await
        .unwrap();
    assert!(text.contains("dependency \"vpc\" {\n  config_path = \"../components/vpc\"\n}"));
    assert!(!text.contains("subnets"));
}

#[tokio::test]
async fn test_cross_environment_dependency_rejected() {
    let (_, service) = service_with_region().await;
    service.create_environment(environment_draft()).await.unwrap();
    service
        .create_environment(EnvironmentDraft::new("prod", REGION_ID, "prod-bucket").with_id("e2"))
        .await
        .unwrap();
    service.create_component(vpc_draft()).await.unwrap();

    let err = service
        .create_service(ServiceDraft::new("api", "e2", "org/api/aws", "1.0.0").depends_on(COMPONENT_ID))
        .await
        .unwrap_err();
    assert!(matches!(err, TerragruntError::Referential { .. }));
    assert!(service.hierarchy().services().await.is_empty());
}

#[tokio::test]
async fn test_account_provider_change_reaches_root_artifact() {
    let (objects, service) = service_with_region().await;
    service.create_environment(environment_draft()).await.unwrap();

    service
        .hierarchy()
        .update_account(
            &ACCOUNT_ID.into(),
            AccountPatch {
                provider: Some(Provider::Gcp),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let region = service.hierarchy().region(&REGION_ID.into()).await.unwrap();
    assert_eq!(region.provider, Provider::Gcp);

    let report = service.save_all(&ENVIRONMENT_ID.into()).await.unwrap();
    assert!(report.is_complete());
    let root = objects.text(BUCKET, ROOT_KEY).await.unwrap();
    assert!(root.contains("provider    = \"gcp\""));
}

#[tokio::test]
async fn test_component_version_update_regenerates_artifact() {
    let (objects, service) = service_with_region().await;
    service.create_environment(environment_draft()).await.unwrap();
    service.create_component(vpc_draft()).await.unwrap();

    let outcome = service
        .update_component(
            &COMPONENT_ID.into(),
            ComponentPatch {
                version: Some("4.0.0".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(outcome.is_saved());

    let text = objects.text(BUCKET, VPC_KEY).await.unwrap();
    assert!(text.contains("terraform-aws-modules/vpc/aws//4.0.0"));
}

#[tokio::test]
async fn test_service_update_retargets_dependencies() {
    let (objects, service) = service_with_region().await;
    service.create_environment(environment_draft()).await.unwrap();
    service.create_component(vpc_draft()).await.unwrap();
    service
        .create_service(ServiceDraft::new("api", ENVIRONMENT_ID, "org/api/aws", "1.0.0").with_id("s1"))
        .await
        .unwrap();

    service
        .update_service(
            &"s1".into(),
            ServicePatch {
                component_dependencies: Some(vec![COMPONENT_ID.into()]),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let text = objects
        .text(BUCKET, &ArtifactPath::service("dev", "api").key())
        .await
        .unwrap();
    assert!(text.contains("dependency \"vpc\""));

    let missing = service
        .update_service(
            &"s1".into(),
            ServicePatch {
                component_dependencies: Some(vec!["nope".into()]),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(missing, Err(TerragruntError::Referential { .. })));
}

#[tokio::test]
async fn test_regeneration_is_byte_identical() {
    let (objects, service) = service_with_region().await;
    service.create_environment(environment_draft()).await.unwrap();
    service.create_component(vpc_draft()).await.unwrap();

    service.save_all(&ENVIRONMENT_ID.into()).await.unwrap();
    let first = objects.text(BUCKET, VPC_KEY).await.unwrap();
    service.save_all(&ENVIRONMENT_ID.into()).await.unwrap();
    let second = objects.text(BUCKET, VPC_KEY).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_unavailable_store_keeps_entity() {
    let (objects, service) = service_with_region().await;
    service.create_environment(environment_draft()).await.unwrap();
    objects.set_unavailable(true).await;

    let outcome = service.create_component(vpc_draft()).await.unwrap();
    assert!(!outcome.is_saved());
    assert!(matches!(outcome.artifact, Err(TerragruntError::Persistence(_))));
    assert!(service.hierarchy().component(&COMPONENT_ID.into()).await.is_some());

    objects.set_unavailable(false).await;
    let report = service.save_component(&COMPONENT_ID.into()).await.unwrap();
    assert_eq!(report.receipts.len(), 1);
    assert!(objects.text(BUCKET, VPC_KEY).await.is_some());
}

#[tokio::test]
async fn test_bucket_creation_failure_still_scaffolds() {
    let inner = Arc::new(InMemoryObjectStore::new());
    inner.create_bucket(BUCKET, REGION_CODE).await.unwrap();
    let service = service_over(
        Arc::new(NoCreateBucketStore {
            inner: inner.clone(),
        }),
        Arc::new(InMemoryDocumentStore::new()),
    );
    seed_region(&service).await;

    let outcome = service
        .create_environment(environment_draft())
        .await
        .unwrap();

    assert!(outcome.is_saved());
    assert_eq!(outcome.artifact.unwrap().len(), 4);
    assert_eq!(inner.put_log().await.len(), 4);
    assert!(inner.text(BUCKET, ROOT_KEY).await.is_some());
}

#[tokio::test]
async fn test_component_move_blocked_by_dependent_service() {
    let (_, service) = service_with_region().await;
    service.create_environment(environment_draft()).await.unwrap();
    service
        .create_environment(EnvironmentDraft::new("prod", REGION_ID, "prod-bucket").with_id("e2"))
        .await
        .unwrap();
    service.create_component(vpc_draft()).await.unwrap();
    service
        .create_service(
            ServiceDraft::new("api", ENVIRONMENT_ID, "org/api/aws", "1.0.0")
                .with_id("s1")
                .depends_on(COMPONENT_ID),
        )
        .await
        .unwrap();

    let err = service
        .update_component(
            &COMPONENT_ID.into(),
            ComponentPatch {
                environment_id: Some("e2".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(
        err,
        TerragruntError::DependencyExists {
            count: 1,
            dependent_kind: "service".to_string(),
        }
    );

    let report = service.save_all(&ENVIRONMENT_ID.into()).await.unwrap();
    assert!(report.is_complete());
    assert!(service.save_service(&"s1".into()).await.is_ok());
}

#[tokio::test]
async fn test_component_rename_regenerates_dependent_services() {
    let (objects, service) = service_with_region().await;
    service.create_environment(environment_draft()).await.unwrap();
    service.create_component(vpc_draft()).await.unwrap();
    service
        .create_service(
            ServiceDraft::new("api", ENVIRONMENT_ID, "org/api/aws", "1.0.0")
                .with_id("s1")
                .depends_on(COMPONENT_ID),
        )
        .await
        .unwrap();

    let outcome = service
        .update_component(
            &COMPONENT_ID.into(),
            ComponentPatch {
                name: Some("network".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let service_key = ArtifactPath::service("dev", "api").key();
    let keys: Vec<String> = outcome.artifact.unwrap().into_iter().map(|r| r.key).collect();
    assert_eq!(
        keys,
        vec![
            "terragrunt/environments/dev/components/network/terragrunt.hcl".to_string(),
            service_key.clone(),
        ]
    );

    let text = objects.text(BUCKET, &service_key).await.unwrap();
    let block = "dependency \"network\" {\n  config_path = \"../components/network\"\n}";
    assert!(text.contains(block));
    assert!(!text.contains("../components/vpc"));
    assert!(objects.text(BUCKET, VPC_KEY).await.is_none());
}

#[tokio::test]
async fn test_failed_write_through_still_uploads() {
    let objects = Arc::new(InMemoryObjectStore::new());
    let service = service_over(objects.clone(), Arc::new(FailingDocumentStore));
    seed_region(&service).await;
    service.create_environment(environment_draft()).await.unwrap();

    let draft = ComponentDraft::new("vpc", ENVIRONMENT_ID, VPC_SOURCE, VPC_VERSION);
    let outcome = service.create_component(draft).await.unwrap();

    assert!(!outcome.is_saved());
    assert!(matches!(outcome.persisted, Err(TerragruntError::Persistence(_))));
    assert_eq!(outcome.artifact.as_ref().map(Vec::len), Ok(1));
    assert!(service.hierarchy().component(&outcome.entity.id).await.is_some());
    assert!(objects.text(BUCKET, VPC_KEY).await.is_some());
}
