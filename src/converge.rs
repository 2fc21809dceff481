use std::sync::Arc;

use k8s_openapi::api::core::v1::{Service, ServiceSpec};
use kube::{Resource, ResourceExt};

use crate::{
    crd::{KIngress, KIngressSpec},
    err::{AsyncIngressError, AsyncIngressResult, WriteOperation},
    store::ObjectStore,
};

/// Resource whose spec and annotations are driven by this controller.
pub trait Converge: Resource<DynamicType = ()> + Clone + Send + Sync {
    type Spec: PartialEq + Clone;

    fn spec(&self) -> &Self::Spec;
    fn spec_mut(&mut self) -> &mut Self::Spec;
}

impl Converge for KIngress {
    type Spec = KIngressSpec;

    fn spec(&self) -> &KIngressSpec {
        &self.spec
    }

    fn spec_mut(&mut self) -> &mut KIngressSpec {
        &mut self.spec
    }
}

impl Converge for Service {
    type Spec = Option<ServiceSpec>;

    fn spec(&self) -> &Option<ServiceSpec> {
        &self.spec
    }

    fn spec_mut(&mut self) -> &mut Option<ServiceSpec> {
        &mut self.spec
    }
}

fn diverges<K: Converge>(current: &K, desired: &K) -> bool {
    current.spec() != desired.spec() || current.annotations() != desired.annotations()
}

/// Makes the stored copy of `desired` match it, creating it when absent.
///
/// Returns the object as stored after the call. Nothing is retried: a
/// failed write is returned to the caller together with what was attempted.
pub async fn converge<K: Converge>(
    store: &dyn ObjectStore<K>,
    desired: &K,
) -> AsyncIngressResult<K> {
    let kind = K::kind(&()).to_string();
    let namespace = desired.namespace().unwrap_or_default();
    let name = desired.name_any();
    let write_error = |operation: WriteOperation| {
        let kind = kind.clone();
        let namespace = namespace.clone();
        let name = name.clone();
        move |source: kube::Error| AsyncIngressError::Write {
            operation,
            kind,
            namespace,
            name,
            source,
        }
    };

    let Some(current) = store.get(&namespace, &name).await? else {
        tracing::info!("{kind} {namespace}/{name} does not exist; creating");
        let created = store
            .create(desired)
            .await
            .map_err(write_error(WriteOperation::Create))?;
        tracing::info!("Created {kind} {namespace}/{name}");
        return Ok(created);
    };

    if !diverges(current.as_ref(), desired) {
        tracing::debug!("{kind} {namespace}/{name} is up to date");
        return Ok(Arc::unwrap_or_clone(current));
    }

    // The cached object is shared with other readers.
    let mut template = K::clone(&current);
    *template.spec_mut() = desired.spec().clone();
    *template.annotations_mut() = desired.annotations().clone();
    let updated = store
        .replace(&template)
        .await
        .map_err(write_error(WriteOperation::Update))?;
    tracing::info!("Updated {kind} {namespace}/{name}");
    Ok(updated)
}
