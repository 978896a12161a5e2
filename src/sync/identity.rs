// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Create-or-update of the per-namespace identity ConfigMap

use crate::constants::{labels, CLUSTER_NAME_KEY, OPERATOR_NAME};
use crate::error::{IdentityError, Result};
use crate::kubernetes::ObjectStore;
use crate::types::ClusterName;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::ObjectMeta;
use std::collections::BTreeMap;
use tracing::{debug, error, info, instrument};

/// Store `cluster_name` under `clusterName` in the ConfigMap `namespace/record_name`.
///
/// A missing ConfigMap is created holding only the cluster name. An existing one
/// keeps all its other keys. A replacement rejected because the ConfigMap changed
/// since it was read is returned as an error; the caller's retry picks it up.
#[instrument(skip(store, cluster_name), fields(cluster_name = %cluster_name))]
pub async fn sync_identity_record(
    store: &dyn ObjectStore,
    namespace: &str,
    record_name: &str,
    cluster_name: &ClusterName,
) -> Result<()> {
    let target = format!("{}/{}", namespace, record_name);

    let existing = store
        .get_config_map(namespace, record_name)
        .await
        .map_err(|e| record_error("get", &target, e))?;

    let Some(mut config_map) = existing else {
        info!("Creating ConfigMap {} with clusterName '{}'", target, cluster_name);
        store
            .create_config_map(&new_identity_record(namespace, record_name, cluster_name))
            .await
            .map_err(|e| record_error("create", &target, e))?;
        return Ok(());
    };

    let data = config_map.data.get_or_insert_with(BTreeMap::new);
    if data.get(CLUSTER_NAME_KEY).map(String::as_str) == Some(cluster_name.as_str()) {
        debug!("ConfigMap {} is up to date", target);
        return Ok(());
    }

    info!("Updating ConfigMap {} with clusterName '{}'", target, cluster_name);
    data.insert(CLUSTER_NAME_KEY.to_string(), cluster_name.to_string());

    store
        .replace_config_map(&config_map)
        .await
        .map_err(|e| record_error("update", &target, e))?;

    Ok(())
}

/// Sync the identity ConfigMap in every namespace in `namespaces`.
///
/// Every namespace is attempted. Failures are collected into
/// [`IdentityError::Aggregate`]; namespaces that succeeded stay written.
pub async fn sync_identity_records(
    store: &dyn ObjectStore,
    namespaces: &[String],
    record_name: &str,
    cluster_name: &ClusterName,
) -> Result<()> {
    let mut failures = Vec::new();

    for namespace in namespaces {
        if let Err(e) = sync_identity_record(store, namespace, record_name, cluster_name).await {
            error!(
                "Failed to store cluster name '{}' in namespace {}: {}",
                cluster_name, namespace, e
            );
            failures.push((namespace.clone(), e));
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(IdentityError::Aggregate(failures))
    }
}

fn record_error(operation: &'static str, target: &str, source: IdentityError) -> IdentityError {
    IdentityError::RecordOperation {
        operation,
        target: target.to_string(),
        source: Box::new(source),
    }
}

fn new_identity_record(namespace: &str, record_name: &str, cluster_name: &ClusterName) -> ConfigMap {
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(record_name.to_string()),
            namespace: Some(namespace.to_string()),
            labels: Some(BTreeMap::from([(
                labels::MANAGED_BY.to_string(),
                OPERATOR_NAME.to_string(),
            )])),
            ..Default::default()
        },
        data: Some(BTreeMap::from([(
            CLUSTER_NAME_KEY.to_string(),
            cluster_name.to_string(),
        )])),
        ..Default::default()
    }
}
