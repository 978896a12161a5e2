// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Pod reconciler - pushes the cluster name from kube-controller-manager into
//! every opted-in namespace.

use crate::config::Config;
use crate::error::{IdentityError, Result};
use crate::kubernetes::ObjectStore;
use crate::resolver::kube_controller::{cluster_name_from_pod, is_kube_controller_pod};
use crate::sync::{get_injectable_namespaces, sync_identity_records};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Pod;
use kube::{
    runtime::{controller::Action, Controller},
    Api, Client, ResourceExt,
};
use kube_runtime::watcher::Config as WatcherConfig;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

pub struct PodReconciler {
    store: Arc<dyn ObjectStore>,
    config: Config,
}

impl PodReconciler {
    pub fn new(store: Arc<dyn ObjectStore>, config: Config) -> Self {
        Self { store, config }
    }

    /// Watch pods in the system namespace only; nothing elsewhere can trigger a sync
    pub async fn run(self, client: Client) -> anyhow::Result<()> {
        let pods: Api<Pod> = Api::namespaced(client, &self.config.system_namespace);
        let context = Arc::new(self);

        Controller::new(pods, WatcherConfig::default())
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled pod: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }

    /// Sync the cluster name found on pod `namespace/name` to all injectable namespaces
    #[instrument(skip(self))]
    pub async fn reconcile_pod(&self, namespace: &str, name: &str) -> Result<Action> {
        if namespace != self.config.system_namespace || !is_kube_controller_pod(name) {
            debug!("Not a kube-controller-manager pod, skipping");
            return Ok(Action::await_change());
        }

        // A restarted controller manager shows up as a new pod with its own event
        let pod = self.store.get_pod(namespace, name).await.map_err(|e| {
            IdentityError::store_operation("get", format!("pod {}/{}", namespace, name), e)
        })?;
        let Some(pod) = pod else {
            info!("kube-controller-manager pod is gone, nothing to do");
            return Ok(Action::await_change());
        };

        let cluster_name = cluster_name_from_pod(&pod)?;
        info!("Found cluster name '{}'", cluster_name);

        let namespaces: Vec<String> =
            get_injectable_namespaces(self.store.as_ref(), &self.config.injection_annotation)
                .await?
                .iter()
                .map(|ns| ns.name_any())
                .collect();

        info!("Found {} injectable namespaces: {:?}", namespaces.len(), namespaces);

        sync_identity_records(
            self.store.as_ref(),
            &namespaces,
            &self.config.config_map_name,
            &cluster_name,
        )
        .await?;

        info!("Completed reconciliation of kube-controller-manager pod");
        Ok(Action::await_change())
    }
}

async fn reconcile(pod: Arc<Pod>, ctx: Arc<PodReconciler>) -> Result<Action> {
    let namespace = pod.namespace().unwrap_or_default();
    ctx.reconcile_pod(&namespace, &pod.name_any()).await
}

fn error_policy(pod: Arc<Pod>, error: &IdentityError, ctx: Arc<PodReconciler>) -> Action {
    let failed = error.failed_namespaces();
    if error.is_conflict() {
        warn!(
            "Identity ConfigMap changed concurrently in {:?}, retrying pod {}/{}",
            failed,
            pod.namespace().unwrap_or_default(),
            pod.name_any()
        );
    } else {
        error!(
            "Reconciliation of pod {}/{} failed for namespaces {:?}: {}",
            pod.namespace().unwrap_or_default(),
            pod.name_any(),
            failed,
            error
        );
    }
    Action::requeue(ctx.config.error_requeue())
}
