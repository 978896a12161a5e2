// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

/// Kubernetes annotation keys used by the operator
pub mod annotations {
    /// When set to "true" on a namespace, the identity ConfigMap is maintained in it
    pub const INJECT: &str = "config.lunar.tech/cluster-identity-inject";
}

/// Label keys read or written by the operator
pub mod labels {
    /// Node label carrying the cluster name on clusters without control-plane introspection
    pub const NODE_CLUSTER_NAME: &str = "clusterName";
    /// Set on every ConfigMap the operator creates
    pub const MANAGED_BY: &str = "app.kubernetes.io/managed-by";
}

/// The kube-controller-manager static pod and its `--cluster-name` flag
pub mod kube_controller {
    pub const POD_PREFIX: &str = "kube-controller-manager";
    pub const CONTAINER_NAME: &str = "kube-controller-manager";
    pub const CLUSTER_NAME_FLAG: &str = "--cluster-name=";
}

/// The CoreDNS autoscaler deployment found on managed (AKS-style) clusters
pub mod coredns_autoscaler {
    pub const LABEL_KEY: &str = "k8s-app";
    pub const LABEL_VALUE: &str = "coredns-autoscaler";
    pub const POD_PREFIX: &str = "coredns-autoscaler";
    /// API server address; its first `-` separated segment is the cluster name
    pub const ADDRESS_ENV: &str = "KUBERNETES_PORT_443_TCP_ADDR";
}

/// Data key holding the cluster name inside the identity ConfigMap
pub const CLUSTER_NAME_KEY: &str = "clusterName";

pub const DEFAULT_SYSTEM_NAMESPACE: &str = "kube-system";
pub const DEFAULT_CONFIG_MAP_NAME: &str = "cluster-identity";
pub const DEFAULT_ERROR_REQUEUE_SECS: u64 = 60;

/// The operator name, used as the managed-by label value
pub const OPERATOR_NAME: &str = "cluster-identity";
