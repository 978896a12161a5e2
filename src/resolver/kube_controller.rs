// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster name from the kube-controller-manager `--cluster-name` flag

use super::ClusterNameStrategy;
use crate::constants::kube_controller::{CLUSTER_NAME_FLAG, CONTAINER_NAME, POD_PREFIX};
use crate::error::{IdentityError, Result};
use crate::kubernetes::ObjectStore;
use crate::types::ClusterName;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use std::collections::BTreeMap;
use tracing::debug;

/// Reads the cluster name from the kube-controller-manager static pod.
///
/// No such pod means no opinion. A pod without the flag is an error.
pub struct KubeControllerStrategy {
    system_namespace: String,
}

impl KubeControllerStrategy {
    pub fn new(system_namespace: impl Into<String>) -> Self {
        Self {
            system_namespace: system_namespace.into(),
        }
    }
}

#[async_trait]
impl ClusterNameStrategy for KubeControllerStrategy {
    fn name(&self) -> &'static str {
        "kube-controller-manager"
    }

    async fn cluster_name(&self, store: &dyn ObjectStore) -> Result<Option<ClusterName>> {
        let pods = store
            .list_pods(&self.system_namespace, &BTreeMap::new())
            .await
            .map_err(|e| {
                IdentityError::store_operation(
                    "list",
                    format!("pods in {}", self.system_namespace),
                    e,
                )
            })?;

        let Some(pod) = pods.iter().find(|p| is_kube_controller_pod(&p.name_any())) else {
            debug!("No {} pod in {}", POD_PREFIX, self.system_namespace);
            return Ok(None);
        };

        cluster_name_from_pod(pod).map(Some)
    }
}

/// Whether a pod name belongs to a kube-controller-manager pod
pub fn is_kube_controller_pod(pod_name: &str) -> bool {
    pod_name.starts_with(POD_PREFIX)
}

/// Extract the `--cluster-name` value from a kube-controller-manager pod
pub fn cluster_name_from_pod(pod: &Pod) -> Result<ClusterName> {
    let container = pod
        .spec
        .as_ref()
        .and_then(|spec| spec.containers.iter().find(|c| c.name == CONTAINER_NAME))
        .ok_or_else(|| IdentityError::MissingContainer {
            container: CONTAINER_NAME.to_string(),
        })?;

    let value = container
        .args
        .iter()
        .flatten()
        .find_map(|arg| arg.strip_prefix(CLUSTER_NAME_FLAG))
        .ok_or_else(|| IdentityError::MissingFlag {
            flag: CLUSTER_NAME_FLAG.to_string(),
            container: container.name.clone(),
        })?;

    ClusterName::new(value).ok_or_else(|| IdentityError::EmptyFlag {
        flag: CLUSTER_NAME_FLAG.to_string(),
        container: container.name.clone(),
    })
}
