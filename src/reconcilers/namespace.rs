// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace reconciler - keeps the identity ConfigMap of one opted-in namespace current.

use crate::config::Config;
use crate::error::{IdentityError, Result};
use crate::kubernetes::ObjectStore;
use crate::resolver::ClusterNameResolver;
use crate::sync::{is_namespace_injectable, sync_identity_record};
use futures::StreamExt;
use k8s_openapi::api::core::v1::Namespace;
use kube::{
    runtime::{controller::Action, watcher, Controller},
    Api, Client, ResourceExt,
};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

pub struct NamespaceReconciler {
    store: Arc<dyn ObjectStore>,
    resolver: ClusterNameResolver,
    config: Config,
}

impl NamespaceReconciler {
    pub fn new(store: Arc<dyn ObjectStore>, config: Config) -> Self {
        let resolver = ClusterNameResolver::new(&config);
        Self {
            store,
            resolver,
            config,
        }
    }

    pub async fn run(self, client: Client) -> anyhow::Result<()> {
        info!(
            "Resolving cluster name with strategies {:?}",
            self.resolver.strategy_names()
        );
        let namespaces: Api<Namespace> = Api::all(client);
        let context = Arc::new(self);

        Controller::new(namespaces, watcher::Config::default())
            .run(reconcile, error_policy, context)
            .for_each(|res| async move {
                match res {
                    Ok(o) => debug!("Reconciled namespace: {:?}", o),
                    Err(e) => warn!("Reconciliation error: {:?}", e),
                }
            })
            .await;

        Ok(())
    }

    /// Converge the identity ConfigMap of namespace `name`
    #[instrument(skip(self))]
    pub async fn reconcile_namespace(&self, name: &str) -> Result<Action> {
        let namespace = self
            .store
            .get_namespace(name)
            .await
            .map_err(|e| IdentityError::store_operation("get", format!("namespace {}", name), e))?;
        let Some(namespace) = namespace else {
            debug!("Namespace is gone, nothing to do");
            return Ok(Action::await_change());
        };

        if !is_namespace_injectable(&namespace, &self.config.injection_annotation) {
            debug!("Namespace is not injectable, skipping");
            return Ok(Action::await_change());
        }

        let cluster_name = self.resolver.resolve(self.store.as_ref()).await?;

        sync_identity_record(
            self.store.as_ref(),
            name,
            &self.config.config_map_name,
            &cluster_name,
        )
        .await
        .map_err(|e| IdentityError::SyncFailed {
            namespace: name.to_string(),
            cluster_name: cluster_name.to_string(),
            source: Box::new(e),
        })?;

        info!("Namespace has cluster name '{}'", cluster_name);
        Ok(Action::await_change())
    }
}

async fn reconcile(namespace: Arc<Namespace>, ctx: Arc<NamespaceReconciler>) -> Result<Action> {
    ctx.reconcile_namespace(&namespace.name_any()).await
}

fn error_policy(
    namespace: Arc<Namespace>,
    error: &IdentityError,
    ctx: Arc<NamespaceReconciler>,
) -> Action {
    // Lost a write race with the pod reconciler or another replica
    if error.is_conflict() {
        warn!("Namespace {} changed during reconciliation, retrying: {}", namespace.name_any(), error);
    } else {
        error!("Reconciliation of namespace {} failed: {}", namespace.name_any(), error);
    }
    Action::requeue(ctx.config.error_requeue())
}
