// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster name from the `clusterName` node label

use super::ClusterNameStrategy;
use crate::constants::labels::NODE_CLUSTER_NAME;
use crate::error::{IdentityError, Result};
use crate::kubernetes::ObjectStore;
use crate::types::ClusterName;
use async_trait::async_trait;
use kube::ResourceExt;

pub struct NodeLabelStrategy;

#[async_trait]
impl ClusterNameStrategy for NodeLabelStrategy {
    fn name(&self) -> &'static str {
        "node-label"
    }

    async fn cluster_name(&self, store: &dyn ObjectStore) -> Result<Option<ClusterName>> {
        let nodes = store
            .list_nodes_with_label(NODE_CLUSTER_NAME)
            .await
            .map_err(|e| {
                IdentityError::store_operation(
                    "list",
                    format!("nodes labelled {}", NODE_CLUSTER_NAME),
                    e,
                )
            })?;

        Ok(nodes
            .iter()
            .find_map(|node| node.labels().get(NODE_CLUSTER_NAME).cloned().and_then(ClusterName::new)))
    }
}
