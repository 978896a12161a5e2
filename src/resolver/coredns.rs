// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster name from the CoreDNS autoscaler's API server address

use super::ClusterNameStrategy;
use crate::constants::coredns_autoscaler::{ADDRESS_ENV, LABEL_KEY, LABEL_VALUE, POD_PREFIX};
use crate::error::{IdentityError, Result};
use crate::kubernetes::ObjectStore;
use crate::types::ClusterName;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use std::collections::BTreeMap;
use tracing::debug;

/// Derives the cluster name from `KUBERNETES_PORT_443_TCP_ADDR` on the CoreDNS
/// autoscaler pod, e.g. `prod-dns-42fc8372.hcp.westeurope.azmk8s.io` gives `prod`.
pub struct CoreDnsAutoscalerStrategy {
    system_namespace: String,
}

impl CoreDnsAutoscalerStrategy {
    pub fn new(system_namespace: impl Into<String>) -> Self {
        Self {
            system_namespace: system_namespace.into(),
        }
    }
}

#[async_trait]
impl ClusterNameStrategy for CoreDnsAutoscalerStrategy {
    fn name(&self) -> &'static str {
        "coredns-autoscaler"
    }

    async fn cluster_name(&self, store: &dyn ObjectStore) -> Result<Option<ClusterName>> {
        let selector = BTreeMap::from([(LABEL_KEY.to_string(), LABEL_VALUE.to_string())]);
        let pods = store
            .list_pods(&self.system_namespace, &selector)
            .await
            .map_err(|e| {
                IdentityError::store_operation(
                    "list",
                    format!(
                        "pods in {} labelled {}={}",
                        self.system_namespace, LABEL_KEY, LABEL_VALUE
                    ),
                    e,
                )
            })?;

        let Some(pod) = pods.iter().find(|p| p.name_any().starts_with(POD_PREFIX)) else {
            debug!("No {} pod in {}", POD_PREFIX, self.system_namespace);
            return Ok(None);
        };

        Ok(cluster_name_from_pod(pod))
    }
}

/// First `-` separated segment of the API server address env var, if present
pub fn cluster_name_from_pod(pod: &Pod) -> Option<ClusterName> {
    let address = pod
        .spec
        .iter()
        .flat_map(|spec| spec.containers.iter())
        .flat_map(|c| c.env.iter().flatten())
        .find(|e| e.name == ADDRESS_ENV)?
        .value
        .as_deref()
        .unwrap_or_default();

    address.split('-').next().and_then(ClusterName::new)
}
