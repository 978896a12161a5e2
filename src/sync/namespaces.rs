// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Namespace opt-in detection

use crate::error::{IdentityError, Result};
use crate::kubernetes::ObjectStore;
use k8s_openapi::api::core::v1::Namespace;
use tracing::{debug, instrument};

/// Check if a namespace has the injection annotation set to exactly "true"
pub fn is_namespace_injectable(namespace: &Namespace, annotation: &str) -> bool {
    namespace
        .metadata
        .annotations
        .as_ref()
        .and_then(|a| a.get(annotation))
        .is_some_and(|v| v == "true")
}

/// Get all namespaces that opted in to the identity ConfigMap
#[instrument(skip(store))]
pub async fn get_injectable_namespaces(
    store: &dyn ObjectStore,
    annotation: &str,
) -> Result<Vec<Namespace>> {
    let namespaces: Vec<Namespace> = store
        .list_namespaces()
        .await
        .map_err(|e| IdentityError::store_operation("list", "namespaces", e))?
        .into_iter()
        .filter(|ns| is_namespace_injectable(ns, annotation))
        .collect();

    debug!("Found {} injectable namespaces", namespaces.len());
    Ok(namespaces)
}
