// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IdentityError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("ConfigMap '{namespace}/{name}' was modified concurrently")]
    Conflict { namespace: String, name: String },

    #[error("could not find '{flag}' flag in container '{container}'")]
    MissingFlag { flag: String, container: String },

    #[error("flag '{flag}' in container '{container}' has an empty value")]
    EmptyFlag { flag: String, container: String },

    #[error("could not find container with name '{container}'")]
    MissingContainer { container: String },

    #[error("could not detect cluster name")]
    ClusterNameNotDetected,

    #[error("{operation} ConfigMap '{target}': {source}")]
    RecordOperation {
        operation: &'static str,
        target: String,
        #[source]
        source: Box<IdentityError>,
    },

    #[error("{operation} {target}: {source}")]
    StoreOperation {
        operation: &'static str,
        target: String,
        #[source]
        source: Box<IdentityError>,
    },

    #[error("store cluster name '{cluster_name}' in namespace '{namespace}': {source}")]
    SyncFailed {
        namespace: String,
        cluster_name: String,
        #[source]
        source: Box<IdentityError>,
    },

    #[error("failed to sync {} namespace(s): {}", .0.len(), describe_failures(.0))]
    Aggregate(Vec<(String, IdentityError)>),
}

impl IdentityError {
    /// Attach the failed store operation and the object it targeted
    pub fn store_operation(
        operation: &'static str,
        target: impl Into<String>,
        source: IdentityError,
    ) -> Self {
        IdentityError::StoreOperation {
            operation,
            target: target.into(),
            source: Box::new(source),
        }
    }

    /// Whether this error, or any error it wraps, is an optimistic-concurrency conflict
    pub fn is_conflict(&self) -> bool {
        match self {
            IdentityError::Conflict { .. } => true,
            IdentityError::RecordOperation { source, .. }
            | IdentityError::StoreOperation { source, .. }
            | IdentityError::SyncFailed { source, .. } => source.is_conflict(),
            IdentityError::Aggregate(failures) => failures.iter().any(|(_, e)| e.is_conflict()),
            _ => false,
        }
    }

    /// Namespaces named by an aggregate failure
    pub fn failed_namespaces(&self) -> Vec<&str> {
        match self {
            IdentityError::Aggregate(failures) => failures.iter().map(|(ns, _)| ns.as_str()).collect(),
            IdentityError::SyncFailed { namespace, .. } => vec![namespace.as_str()],
            _ => Vec::new(),
        }
    }
}

fn describe_failures(failures: &[(String, IdentityError)]) -> String {
    failures
        .iter()
        .map(|(namespace, error)| format!("namespace '{}': {}", namespace, error))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, IdentityError>;
