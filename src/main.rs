// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use anyhow::{Context, Result};
use kube::Client;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cluster_identity::config::Config;
use cluster_identity::kubernetes::{KubeStore, ObjectStore};
use cluster_identity::reconcilers::{NamespaceReconciler, PodReconciler};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting cluster identity operator");

    let config = Config::from_env()?;
    info!(
        "Configuration loaded: system_namespace={}, config_map_name={}, injection_annotation={}, node_label_strategy={}",
        config.system_namespace,
        config.config_map_name,
        config.injection_annotation,
        config.node_label_strategy
    );

    let client = Client::try_default()
        .await
        .context("failed to create Kubernetes client")?;
    info!("Connected to Kubernetes cluster");

    let store: Arc<dyn ObjectStore> = Arc::new(KubeStore::new(client.clone()));

    let namespace_reconciler = NamespaceReconciler::new(store.clone(), config.clone());
    let pod_reconciler = PodReconciler::new(store, config);

    info!("Starting reconcilers...");

    tokio::try_join!(
        namespace_reconciler.run(client.clone()),
        pod_reconciler.run(client)
    )?;

    // Reconcilers run until their watch streams end
    warn!("All reconcilers stopped unexpectedly");
    Ok(())
}
