// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use crate::constants::{
    annotations, DEFAULT_CONFIG_MAP_NAME, DEFAULT_ERROR_REQUEUE_SECS, DEFAULT_SYSTEM_NAMESPACE,
};
use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Operator configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Namespace hosting the control-plane and DNS autoscaler pods
    pub system_namespace: String,
    /// Namespace annotation that opts a namespace in to the identity ConfigMap
    pub injection_annotation: String,
    /// Name of the identity ConfigMap written into each injectable namespace
    pub config_map_name: String,
    /// Fall back to the `clusterName` node label when no system pod names the cluster
    pub node_label_strategy: bool,
    /// Delay before a failed reconciliation is retried
    pub error_requeue_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            system_namespace: DEFAULT_SYSTEM_NAMESPACE.to_string(),
            injection_annotation: annotations::INJECT.to_string(),
            config_map_name: DEFAULT_CONFIG_MAP_NAME.to_string(),
            node_label_strategy: false,
            error_requeue_secs: DEFAULT_ERROR_REQUEUE_SECS,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup, falling back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();

        let node_label_strategy = match lookup("ENABLE_NODE_LABEL_STRATEGY") {
            Some(v) => v
                .parse::<bool>()
                .with_context(|| format!("ENABLE_NODE_LABEL_STRATEGY must be a boolean, got '{}'", v))?,
            None => defaults.node_label_strategy,
        };

        let error_requeue_secs = match lookup("ERROR_REQUEUE_SECS") {
            Some(v) => v
                .parse::<u64>()
                .with_context(|| format!("ERROR_REQUEUE_SECS must be a number of seconds, got '{}'", v))?,
            None => defaults.error_requeue_secs,
        };

        Ok(Config {
            system_namespace: lookup("SYSTEM_NAMESPACE").unwrap_or(defaults.system_namespace),
            injection_annotation: lookup("INJECTION_ANNOTATION")
                .unwrap_or(defaults.injection_annotation),
            config_map_name: lookup("CONFIG_MAP_NAME").unwrap_or(defaults.config_map_name),
            node_label_strategy,
            error_requeue_secs,
        })
    }

    pub fn error_requeue(&self) -> Duration {
        Duration::from_secs(self.error_requeue_secs)
    }
}
