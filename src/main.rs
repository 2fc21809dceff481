use std::{sync::Arc, time::Duration};

use clap::Parser;
use futures::StreamExt;
use k8s_openapi::api::core::v1::Service;
use kube::{
    Api, ResourceExt,
    api::{Patch, PatchParams},
    runtime::{Controller, WatchStreamExt, controller::Action, reflector, watcher},
};
use tracing::Instrument;

use crate::{
    args::AsyncIngressArgs,
    crd::KIngress,
    err::{AsyncIngressError, AsyncIngressResult},
};

mod args;
mod consts;
mod converge;
mod crd;
mod ctx;
mod desired;
mod domains;
mod err;
mod mode;
mod reconciler;
mod status;
mod store;
mod utils;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tracing::instrument(skip(ingress, ctx), fields(ingress = ingress.name_any(), namespace = ingress.namespace()), err)]
pub async fn reconcile(ingress: Arc<KIngress>, ctx: Arc<ctx::Context>) -> AsyncIngressResult<Action> {
    if !ctx.is_leader.load(std::sync::atomic::Ordering::Relaxed) {
        tracing::debug!("Not a leader, skipping reconciliation");
        return Ok(Action::requeue(Duration::from_secs(20)));
    }

    // Derived ingresses carry another class, so they are skipped here too.
    let class = ingress
        .annotations()
        .get(consts::INGRESS_CLASS_ANNOTATION)
        .map(String::as_str);
    if class != Some(ctx.args.async_ingress_class.as_str()) {
        tracing::debug!("Skipping ingress of class {class:?}");
        return Ok(Action::await_change());
    }
    if ingress.metadata.deletion_timestamp.is_some() {
        tracing::debug!("Ingress is being deleted, leaving cleanup to owner references");
        return Ok(Action::await_change());
    }

    tracing::info!("Reconciling Ingress");
    let namespace = ingress
        .namespace()
        .ok_or_else(|| anyhow::anyhow!("Ingress doesn't have a namespace"))?;

    let marked =
        reconciler::reconcile_kind(&ingress, &ctx.settings, &ctx.ingresses, &ctx.services).await?;

    if marked.status != ingress.status {
        Api::<KIngress>::namespaced(ctx.client.clone(), &namespace)
            .patch_status(
                &ingress.name_any(),
                &PatchParams {
                    field_manager: Some(consts::FIELD_MANAGER.to_string()),
                    ..PatchParams::default()
                },
                &Patch::Merge(serde_json::json!({ "status": marked.status })),
            )
            .instrument(tracing::info_span!("Updating Ingress status"))
            .await?;
    }

    Ok(Action::requeue(Duration::from_secs(300)))
}

#[tracing::instrument(skip(obj, _ctx), fields(ingress = obj.name_any()))]
fn on_error(obj: Arc<KIngress>, err: &AsyncIngressError, _ctx: Arc<ctx::Context>) -> Action {
    tracing::warn!("Reconciliation failed: {err}");
    Action::requeue(Duration::from_secs(30))
}

async fn lease_renew(ctx: Arc<ctx::Context>) {
    let leadership = kube_leader_election::LeaseLock::new(
        ctx.client.clone(),
        ctx.client.default_namespace(),
        kube_leader_election::LeaseLockParams {
            holder_id: ctx.hostname.clone(),
            lease_name: "async-ingress-controller-lock".into(),
            lease_ttl: Duration::from_secs(15),
        },
    );
    loop {
        match leadership.try_acquire_or_renew().await {
            Ok(lease) => {
                let was_leader = ctx
                    .is_leader
                    .swap(lease.acquired_lease, std::sync::atomic::Ordering::Relaxed);
                match (was_leader, lease.acquired_lease) {
                    (false, true) => tracing::info!("Acquired leadership lease"),
                    (true, false) => {
                        tracing::warn!("Lost leadership lease, pausing reconciliation")
                    }
                    _ => {}
                }
            }
            Err(err) => {
                tracing::warn!("Failed to acquire or renew lease: {}", err);
            }
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = AsyncIngressArgs::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();
    tracing::info!("Starting async ingress controller");
    tracing::info!("CLI argument: {:?}", args);

    let client = kube::Client::try_default().await?;

    let controller = Controller::new(
        Api::<KIngress>::all(client.clone()),
        watcher::Config::default(),
    );
    let (service_cache, service_writer) = reflector::store::<Service>();
    let service_reflector = reflector(
        service_writer,
        watcher(
            Api::<Service>::all(client.clone()),
            watcher::Config::default().labels(consts::ASYNC_SERVICE_LABEL),
        ),
    )
    .default_backoff()
    .applied_objects()
    .for_each(|_| futures::future::ready(()));

    let ctx = Arc::new(ctx::Context::new(
        args,
        client,
        controller.store(),
        service_cache.clone(),
    )?);
    tracing::info!("Routing settings: {:?}", ctx.settings);

    let lease_renewer = lease_renew(ctx.clone());

    let ingress_controller = async {
        if service_cache.wait_until_ready().await.is_err() {
            tracing::error!("Service cache was dropped before it synced");
            return;
        }
        controller
            .run(reconcile, on_error, ctx.clone())
            .for_each(|_| futures::future::ready(()))
            .await
    };

    tokio::select! {
        _ = lease_renewer => {
            tracing::error!("Lease renewer task exited unexpectedly");
        },
        _ = service_reflector => {
            tracing::error!("Service reflector exited unexpectedly");
        },
        _ = ingress_controller => {
            tracing::error!("Ingress controller task exited unexpectedly");
        },
    }

    Ok(())
}
