// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Object store abstraction over the Kubernetes API.
//!
//! Reconcilers and resolution strategies only talk to the cluster through
//! [`ObjectStore`], so they can be exercised against an in-memory store in tests.

use crate::error::{IdentityError, Result};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Node, Pod};
use kube::{
    api::{ListParams, PostParams},
    Api, Client, ResourceExt,
};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Get/List/Create/Update operations the operator needs from the cluster.
///
/// `get_*` methods return `Ok(None)` when the object does not exist.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>>;

    async fn list_namespaces(&self) -> Result<Vec<Namespace>>;

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Option<Pod>>;

    /// List pods in `namespace` carrying every label in `match_labels`
    async fn list_pods(
        &self,
        namespace: &str,
        match_labels: &BTreeMap<String, String>,
    ) -> Result<Vec<Pod>>;

    /// List nodes that carry `label`, whatever its value
    async fn list_nodes_with_label(&self, label: &str) -> Result<Vec<Node>>;

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>>;

    async fn create_config_map(&self, config_map: &ConfigMap) -> Result<ConfigMap>;

    /// Replace an existing ConfigMap.
    ///
    /// Fails with [`IdentityError::Conflict`] when the object changed since it was fetched.
    async fn replace_config_map(&self, config_map: &ConfigMap) -> Result<ConfigMap>;
}

/// [`ObjectStore`] backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeStore {
    client: Client,
}

impl KubeStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for KubeStore {
    #[instrument(skip(self))]
    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        Ok(namespaces.get_opt(name).await?)
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        Ok(namespaces.list(&ListParams::default()).await?.items)
    }

    #[instrument(skip(self))]
    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Option<Pod>> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        Ok(pods.get_opt(name).await?)
    }

    #[instrument(skip(self))]
    async fn list_pods(
        &self,
        namespace: &str,
        match_labels: &BTreeMap<String, String>,
    ) -> Result<Vec<Pod>> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let mut lp = ListParams::default();
        if !match_labels.is_empty() {
            lp = lp.labels(&equality_selector(match_labels));
        }

        let pod_list = pods.list(&lp).await?;
        debug!("Listed {} pods", pod_list.items.len());
        Ok(pod_list.items)
    }

    #[instrument(skip(self))]
    async fn list_nodes_with_label(&self, label: &str) -> Result<Vec<Node>> {
        let nodes: Api<Node> = Api::all(self.client.clone());
        Ok(nodes.list(&ListParams::default().labels(label)).await?.items)
    }

    #[instrument(skip(self))]
    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>> {
        let config_maps: Api<ConfigMap> = Api::namespaced(self.client.clone(), namespace);
        Ok(config_maps.get_opt(name).await?)
    }

    async fn create_config_map(&self, config_map: &ConfigMap) -> Result<ConfigMap> {
        let namespace = config_map.namespace().unwrap_or_default();
        let name = config_map.name_any();
        let config_maps: Api<ConfigMap> = Api::namespaced(self.client.clone(), &namespace);

        // Another writer created it between our get and this create
        match config_maps.create(&PostParams::default(), config_map).await {
            Ok(created) => Ok(created),
            Err(kube::Error::Api(err)) if err.code == 409 => {
                Err(IdentityError::Conflict { namespace, name })
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn replace_config_map(&self, config_map: &ConfigMap) -> Result<ConfigMap> {
        let namespace = config_map.namespace().unwrap_or_default();
        let name = config_map.name_any();
        let config_maps: Api<ConfigMap> = Api::namespaced(self.client.clone(), &namespace);

        match config_maps
            .replace(&name, &PostParams::default(), config_map)
            .await
        {
            Ok(updated) => Ok(updated),
            Err(kube::Error::Api(err)) if err.code == 409 => {
                Err(IdentityError::Conflict { namespace, name })
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Render labels as a `k=v,k=v` selector
fn equality_selector(match_labels: &BTreeMap<String, String>) -> String {
    match_labels
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join(",")
}
