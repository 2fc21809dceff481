use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use k8s_openapi::NamespaceResourceScope;
use kube::{
    Api, Resource, ResourceExt,
    api::PostParams,
    runtime::reflector::{ObjectRef, Store},
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::Instrument;

use crate::consts;

/// Read-through-cache, write-through-API access to one resource kind.
///
/// Cached objects are shared with every other reader of the cache and are
/// only handed out behind an `Arc`.
#[async_trait]
pub trait ObjectStore<K>: Send + Sync
where
    K: Send + Sync,
{
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Arc<K>>, kube::Error>;
    async fn create(&self, obj: &K) -> Result<K, kube::Error>;
    async fn replace(&self, obj: &K) -> Result<K, kube::Error>;
}

/// Reflector-backed store. Reads hit the local cache, writes go straight to
/// the API server.
#[derive(Clone)]
pub struct KubeObjectStore<K>
where
    K: Resource<DynamicType = ()> + 'static,
{
    client: kube::Client,
    cache: Store<K>,
}

impl<K> KubeObjectStore<K>
where
    K: Resource<DynamicType = ()> + 'static,
{
    pub fn new(client: kube::Client, cache: Store<K>) -> Self {
        KubeObjectStore { client, cache }
    }
}

fn post_params() -> PostParams {
    PostParams {
        field_manager: Some(consts::FIELD_MANAGER.to_string()),
        ..PostParams::default()
    }
}

#[async_trait]
impl<K> ObjectStore<K> for KubeObjectStore<K>
where
    K: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static,
{
    async fn get(&self, namespace: &str, name: &str) -> Result<Option<Arc<K>>, kube::Error> {
        Ok(self.cache.get(&ObjectRef::new(name).within(namespace)))
    }

    async fn create(&self, obj: &K) -> Result<K, kube::Error> {
        let namespace = obj.namespace().unwrap_or_default();
        Api::<K>::namespaced(self.client.clone(), &namespace)
            .create(&post_params(), obj)
            .instrument(tracing::info_span!("Creating", kind = %K::kind(&()), name = obj.name_any()))
            .await
    }

    async fn replace(&self, obj: &K) -> Result<K, kube::Error> {
        let namespace = obj.namespace().unwrap_or_default();
        Api::<K>::namespaced(self.client.clone(), &namespace)
            .replace(&obj.name_any(), &post_params(), obj)
            .instrument(tracing::info_span!("Updating", kind = %K::kind(&()), name = obj.name_any()))
            .await
    }
}
