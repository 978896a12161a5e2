// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Cluster name resolution.
//!
//! The resolver asks each strategy in a fixed order. The first name found wins,
//! the first error aborts, and silence from every strategy is an error.

pub mod coredns;
pub mod kube_controller;
pub mod node_label;

pub use coredns::CoreDnsAutoscalerStrategy;
pub use kube_controller::KubeControllerStrategy;
pub use node_label::NodeLabelStrategy;

use crate::config::Config;
use crate::error::{IdentityError, Result};
use crate::kubernetes::ObjectStore;
use crate::types::ClusterName;
use async_trait::async_trait;
use tracing::{debug, info, instrument};

/// One way of inferring the cluster name from live cluster objects.
///
/// `Ok(None)` means the strategy has no opinion and the next one should be tried.
#[async_trait]
pub trait ClusterNameStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn cluster_name(&self, store: &dyn ObjectStore) -> Result<Option<ClusterName>>;
}

pub struct ClusterNameResolver {
    strategies: Vec<Box<dyn ClusterNameStrategy>>,
}

impl ClusterNameResolver {
    /// The standard chain: kube-controller-manager flag, then CoreDNS autoscaler,
    /// then node label when enabled.
    pub fn new(config: &Config) -> Self {
        let mut strategies: Vec<Box<dyn ClusterNameStrategy>> = vec![
            Box::new(KubeControllerStrategy::new(&config.system_namespace)),
            Box::new(CoreDnsAutoscalerStrategy::new(&config.system_namespace)),
        ];
        if config.node_label_strategy {
            strategies.push(Box::new(NodeLabelStrategy));
        }

        Self::with_strategies(strategies)
    }

    pub fn with_strategies(strategies: Vec<Box<dyn ClusterNameStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    #[instrument(skip_all)]
    pub async fn resolve(&self, store: &dyn ObjectStore) -> Result<ClusterName> {
        for strategy in &self.strategies {
            match strategy.cluster_name(store).await? {
                Some(name) => {
                    info!("Detected cluster name '{}' using {}", name, strategy.name());
                    return Ok(name);
                }
                None => debug!("Strategy {} has no opinion", strategy.name()),
            }
        }

        Err(IdentityError::ClusterNameNotDetected)
    }
}
