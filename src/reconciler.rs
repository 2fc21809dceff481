use k8s_openapi::api::core::v1::Service;
use kube::ResourceExt;

use crate::{
    converge::converge,
    crd::KIngress,
    ctx::RoutingSettings,
    desired::{make_async_service, make_new_ingress},
    err::AsyncIngressResult,
    mode::validate_async_mode,
    status::mark_ingress_ready,
    store::ObjectStore,
};

/// Runs one reconciliation of an async ingress.
///
/// Returns a copy of `ingress` carrying the status it should have once the
/// derived ingress and service are in place. The caller persists it.
pub async fn reconcile_kind(
    ingress: &KIngress,
    settings: &RoutingSettings,
    ingresses: &dyn ObjectStore<KIngress>,
    services: &dyn ObjectStore<Service>,
) -> AsyncIngressResult<KIngress> {
    let mode = validate_async_mode(ingress.annotations()).inspect_err(|err| {
        tracing::error!("Error validating ingress annotations: {err}");
    })?;

    let mut marked = ingress.clone();
    mark_ingress_ready(&mut marked, &settings.domains);

    let desired = make_new_ingress(ingress, mode, settings);
    let service = make_async_service(ingress, settings);

    converge(ingresses, &desired).await.inspect_err(|err| {
        tracing::error!("Error reconciling ingress {}: {err}", desired.name_any());
    })?;
    converge(services, &service).await.inspect_err(|err| {
        tracing::error!("Error reconciling service {}: {err}", service.name_any());
    })?;

    Ok(marked)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use k8s_openapi::api::core::v1::Service;
    use kube::api::ObjectMeta;

    use super::reconcile_kind;
    use crate::{
        crd::{HttpIngressPath, HttpIngressRuleValue, IngressRule, KIngress, KIngressSpec},
        ctx::RoutingSettings,
        domains::DomainTable,
        err::{AsyncIngressError, WriteOperation},
        status::CONDITION_READY,
        store::testing::MemoryStore,
    };

    fn settings() -> RoutingSettings {
        RoutingSettings {
            ingress_class: "kourier.ingress.networking.knative.dev".to_string(),
            system_namespace: "knative-serving".to_string(),
            cluster_domain: "cluster.local".to_string(),
            domains: DomainTable::default(),
        }
    }

    fn ingress(mode: &str, path: &str) -> KIngress {
        KIngress {
            metadata: ObjectMeta {
                name: Some("hello".to_string()),
                namespace: Some("default".to_string()),
                annotations: Some(BTreeMap::from([(
                    "async.knative.dev/mode".to_string(),
                    mode.to_string(),
                )])),
                ..Default::default()
            },
            spec: KIngressSpec {
                rules: vec![IngressRule {
                    hosts: vec!["hello.default.example.com".to_string()],
                    visibility: None,
                    http: Some(HttpIngressRuleValue {
                        paths: vec![HttpIngressPath {
                            path: path.to_string(),
                            ..Default::default()
                        }],
                    }),
                }],
                ..Default::default()
            },
            status: None,
        }
    }

    #[tokio::test]
    async fn second_pass_writes_nothing() {
        let ingresses = MemoryStore::<KIngress>::default();
        let services = MemoryStore::<Service>::default();
        let ing = ingress("always.async.knative.dev", "/");

        reconcile_kind(&ing, &settings(), &ingresses, &services)
            .await
            .unwrap();
        reconcile_kind(&ing, &settings(), &ingresses, &services)
            .await
            .unwrap();

        assert_eq!((ingresses.creates(), ingresses.updates()), (1, 0));
        assert_eq!((services.creates(), services.updates()), (1, 0));
        assert!(ingresses.stored("default", "hello-new").is_some());
        assert!(services.stored("default", "hello-async").is_some());
    }

    #[tokio::test]
    async fn changed_original_updates_derived_ingress_only() {
        let ingresses = MemoryStore::<KIngress>::default();
        let services = MemoryStore::<Service>::default();

        reconcile_kind(&ingress("", "/"), &settings(), &ingresses, &services)
            .await
            .unwrap();
        reconcile_kind(&ingress("", "/v2"), &settings(), &ingresses, &services)
            .await
            .unwrap();

        assert_eq!((ingresses.creates(), ingresses.updates()), (1, 1));
        assert_eq!((services.creates(), services.updates()), (1, 0));
        let stored = ingresses.stored("default", "hello-new").unwrap();
        assert_eq!(stored.spec.rules[0].paths()[1].path, "/v2");
    }

    #[tokio::test]
    async fn invalid_mode_touches_no_store() {
        let ingresses = MemoryStore::<KIngress>::default();
        let services = MemoryStore::<Service>::default();

        let err = reconcile_kind(
            &ingress("never.async.knative.dev", "/"),
            &settings(),
            &ingresses,
            &services,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AsyncIngressError::InvalidMode { .. }));
        assert_eq!(ingresses.lookups() + services.lookups(), 0);
        assert_eq!(ingresses.creates() + services.creates(), 0);
    }

    #[tokio::test]
    async fn failed_ingress_write_skips_service() {
        let ingresses = MemoryStore::<KIngress>::default();
        let services = MemoryStore::<Service>::default();
        ingresses.fail_writes();

        let err = reconcile_kind(&ingress("", "/"), &settings(), &ingresses, &services)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            AsyncIngressError::Write {
                operation: WriteOperation::Create,
                ..
            }
        ));
        assert_eq!(services.lookups(), 0);
    }

    #[tokio::test]
    async fn returns_ready_status_without_touching_input() {
        let ingresses = MemoryStore::<KIngress>::default();
        let services = MemoryStore::<Service>::default();
        let ing = ingress("conditional.async.knative.dev", "/");

        let marked = reconcile_kind(&ing, &settings(), &ingresses, &services)
            .await
            .unwrap();

        assert!(ing.status.is_none());
        let status = marked.status.unwrap();
        assert_eq!(status.condition(CONDITION_READY).unwrap().status, "True");
        assert_eq!(marked.spec, ing.spec);
    }
}
