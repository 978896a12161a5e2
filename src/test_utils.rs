// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities: an in-memory object store, a mock HTTP service for the
//! Kubernetes client, and builders for the objects the operator reads.

use crate::error::{IdentityError, Result};
use crate::kubernetes::ObjectStore;
use async_trait::async_trait;
use http::{Request, Response};
use k8s_openapi::api::core::v1::{
    ConfigMap, Container, EnvVar, Namespace, Node, Pod, PodSpec,
};
use kube::api::ObjectMeta;
use kube::client::Body;
use kube::error::ErrorResponse;
use kube::{Client, ResourceExt};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

/// In-memory [`ObjectStore`].
///
/// ConfigMap writes bump a resource version. Replacements carrying a stale
/// version and creates of an existing name are rejected with
/// [`IdentityError::Conflict`], matching what [`crate::kubernetes::KubeStore`] reports.
#[derive(Default)]
pub struct FakeStore {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    namespaces: BTreeMap<String, Namespace>,
    pods: BTreeMap<(String, String), Pod>,
    nodes: BTreeMap<String, Node>,
    config_maps: BTreeMap<(String, String), ConfigMap>,
    failing_namespaces: BTreeSet<String>,
    forbidden_kinds: BTreeSet<&'static str>,
    resource_version: u64,
    writes: usize,
}

impl FakeState {
    fn next_version(&mut self) -> String {
        self.resource_version += 1;
        self.resource_version.to_string()
    }

    fn check_readable(&self, kind: &str) -> Result<()> {
        if self.forbidden_kinds.contains(kind) {
            return Err(api_error(
                403,
                "Forbidden",
                format!("{} is forbidden: access denied", kind),
            ));
        }
        Ok(())
    }
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(self, namespace: Namespace) -> Self {
        self.state
            .lock()
            .unwrap()
            .namespaces
            .insert(namespace.name_any(), namespace);
        self
    }

    pub fn with_pod(self, pod: Pod) -> Self {
        let key = (pod.namespace().unwrap_or_default(), pod.name_any());
        self.state.lock().unwrap().pods.insert(key, pod);
        self
    }

    pub fn with_node(self, node: Node) -> Self {
        self.state
            .lock()
            .unwrap()
            .nodes
            .insert(node.name_any(), node);
        self
    }

    pub fn with_config_map(self, mut config_map: ConfigMap) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            config_map.metadata.resource_version = Some(state.next_version());
            let key = (config_map.namespace().unwrap_or_default(), config_map.name_any());
            state.config_maps.insert(key, config_map);
        }
        self
    }

    /// Reject every ConfigMap write in `namespace` with a server error
    pub fn failing_writes_in(self, namespace: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .failing_namespaces
            .insert(namespace.to_string());
        self
    }

    /// Reject every read of `kind` ("namespaces", "pods" or "nodes") with 403 Forbidden
    pub fn forbidding_reads_of(self, kind: &'static str) -> Self {
        self.state.lock().unwrap().forbidden_kinds.insert(kind);
        self
    }

    pub fn config_map(&self, namespace: &str, name: &str) -> Option<ConfigMap> {
        self.state
            .lock()
            .unwrap()
            .config_maps
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    /// Data of the named ConfigMap, if it exists
    pub fn config_map_data(&self, namespace: &str, name: &str) -> Option<BTreeMap<String, String>> {
        self.config_map(namespace, name)
            .map(|cm| cm.data.unwrap_or_default())
    }

    pub fn config_map_count(&self) -> usize {
        self.state.lock().unwrap().config_maps.len()
    }

    /// Number of successful ConfigMap creates and replaces
    pub fn writes(&self) -> usize {
        self.state.lock().unwrap().writes
    }

    /// Simulate another writer touching a ConfigMap, invalidating fetched copies
    pub fn touch_config_map(&self, namespace: &str, name: &str) {
        let mut state = self.state.lock().unwrap();
        let version = state.next_version();
        if let Some(cm) = state
            .config_maps
            .get_mut(&(namespace.to_string(), name.to_string()))
        {
            cm.metadata.resource_version = Some(version);
        }
    }
}

fn api_error(code: u16, reason: &str, message: String) -> IdentityError {
    IdentityError::KubeError(kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message,
        reason: reason.to_string(),
        code,
    }))
}

#[async_trait]
impl ObjectStore for FakeStore {
    async fn get_namespace(&self, name: &str) -> Result<Option<Namespace>> {
        let state = self.state.lock().unwrap();
        state.check_readable("namespaces")?;
        Ok(state.namespaces.get(name).cloned())
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>> {
        let state = self.state.lock().unwrap();
        state.check_readable("namespaces")?;
        Ok(state.namespaces.values().cloned().collect())
    }

    async fn get_pod(&self, namespace: &str, name: &str) -> Result<Option<Pod>> {
        let state = self.state.lock().unwrap();
        state.check_readable("pods")?;
        Ok(state
            .pods
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn list_pods(
        &self,
        namespace: &str,
        match_labels: &BTreeMap<String, String>,
    ) -> Result<Vec<Pod>> {
        let state = self.state.lock().unwrap();
        state.check_readable("pods")?;
        Ok(state
            .pods
            .iter()
            .filter(|((ns, _), _)| ns == namespace)
            .filter(|(_, pod)| {
                let labels = pod.labels();
                match_labels
                    .iter()
                    .all(|(k, v)| labels.get(k).is_some_and(|actual| actual == v))
            })
            .map(|(_, pod)| pod.clone())
            .collect())
    }

    async fn list_nodes_with_label(&self, label: &str) -> Result<Vec<Node>> {
        let state = self.state.lock().unwrap();
        state.check_readable("nodes")?;
        Ok(state
            .nodes
            .values()
            .filter(|node| node.labels().contains_key(label))
            .cloned()
            .collect())
    }

    async fn get_config_map(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>> {
        Ok(self.config_map(namespace, name))
    }

    async fn create_config_map(&self, config_map: &ConfigMap) -> Result<ConfigMap> {
        let mut state = self.state.lock().unwrap();
        let namespace = config_map.namespace().unwrap_or_default();
        let name = config_map.name_any();

        if state.failing_namespaces.contains(&namespace) {
            return Err(api_error(500, "InternalError", format!("cannot write to {}", namespace)));
        }

        let key = (namespace, name);
        if state.config_maps.contains_key(&key) {
            return Err(IdentityError::Conflict {
                namespace: key.0,
                name: key.1,
            });
        }

        let mut created = config_map.clone();
        created.metadata.resource_version = Some(state.next_version());
        state.config_maps.insert(key, created.clone());
        state.writes += 1;
        Ok(created)
    }

    async fn replace_config_map(&self, config_map: &ConfigMap) -> Result<ConfigMap> {
        let mut state = self.state.lock().unwrap();
        let namespace = config_map.namespace().unwrap_or_default();
        let name = config_map.name_any();

        if state.failing_namespaces.contains(&namespace) {
            return Err(api_error(500, "InternalError", format!("cannot write to {}", namespace)));
        }

        let key = (namespace, name);
        let current_version = match state.config_maps.get(&key) {
            Some(existing) => existing.metadata.resource_version.clone(),
            None => {
                return Err(api_error(
                    404,
                    "NotFound",
                    format!("configmaps \"{}\" not found", key.1),
                ))
            }
        };

        if config_map.metadata.resource_version != current_version {
            return Err(IdentityError::Conflict {
                namespace: key.0,
                name: key.1,
            });
        }

        let mut replaced = config_map.clone();
        replaced.metadata.resource_version = Some(state.next_version());
        state.config_maps.insert(key, replaced.clone());
        state.writes += 1;
        Ok(replaced)
    }
}

/// A namespace with the given annotations
pub fn namespace(name: &str, annotations: &[(&str, &str)]) -> Namespace {
    Namespace {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            annotations: (!annotations.is_empty()).then(|| {
                annotations
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect()
            }),
            ..Default::default()
        },
        ..Default::default()
    }
}

pub fn injectable_namespace(name: &str) -> Namespace {
    namespace(name, &[(crate::constants::annotations::INJECT, "true")])
}

/// A kube-controller-manager static pod with the given container args
pub fn kube_controller_manager_pod(name: &str, args: &[&str]) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("kube-system".to_string()),
            labels: Some(BTreeMap::from([
                ("component".to_string(), "kube-controller-manager".to_string()),
                ("tier".to_string(), "control-plane".to_string()),
            ])),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: vec![Container {
                name: "kube-controller-manager".to_string(),
                command: Some(vec!["kube-controller-manager".to_string()]),
                args: Some(args.iter().map(|a| a.to_string()).collect()),
                ..Default::default()
            }],
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// A kube-controller-manager pod whose only arg is `--cluster-name=<cluster_name>`
pub fn kube_controller_manager_pod_for(cluster_name: &str) -> Pod {
    kube_controller_manager_pod(
        "kube-controller-manager-master-0",
        &[
            "--allocate-node-cidrs=true",
            &format!("--cluster-name={}", cluster_name),
            "--leader-elect=true",
        ],
    )
}

/// A CoreDNS autoscaler pod whose API server address env var is `address`
pub fn coredns_autoscaler_pod(name: &str, address: Option<&str>) -> Pod {
    let mut env = vec![EnvVar {
        name: "KUBERNETES_SERVICE_PORT".to_string(),
        value: Some("443".to_string()),
        ..Default::default()
    }];
    if let Some(address) = address {
        env.push(EnvVar {
            name: "KUBERNETES_PORT_443_TCP_ADDR".to_string(),
            value: Some(address.to_string()),
            ..Default::default()
        });
    }

    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("kube-system".to_string()),
            labels: Some(BTreeMap::from([
                ("k8s-app".to_string(), "coredns-autoscaler".to_string()),
                ("pod-template-hash".to_string(), "54d55c8b75".to_string()),
            ])),
            ..Default::default()
        },
        spec: Some(PodSpec {
            containers: vec![Container {
                name: "autoscaler".to_string(),
                args: Some(vec![
                    "--namespace=kube-system".to_string(),
                    "--configmap=coredns-autoscaler".to_string(),
                    "--target=deployment/coredns".to_string(),
                ]),
                env: Some(env),
                ..Default::default()
            }],
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn node(name: &str, labels: &[(&str, &str)]) -> Node {
    Node {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(
                labels
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// An existing identity ConfigMap holding `data`
pub fn identity_config_map(namespace: &str, name: &str, data: &[(&str, &str)]) -> ConfigMap {
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        data: Some(
            data.iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ),
        ..Default::default()
    }
}

/// A mock HTTP service that returns predefined responses based on request paths.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<(String, String), (u16, String)>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Add a response for GET requests matching the path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, status, body)
    }

    /// Add a response for POST requests matching the path
    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, status, body)
    }

    /// Add a response for PUT requests matching the path
    pub fn on_put(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PUT", path, status, body)
    }

    fn on(self, method: &str, path: &str, status: u16, body: &str) -> Self {
        self.responses.lock().unwrap().insert(
            (method.to_string(), path.to_string()),
            (status, body.to_string()),
        );
        self
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let responses = self.responses.lock().unwrap();

        if let Some(resp) = responses.get(&(method.to_string(), path.to_string())) {
            return Some(resp.clone());
        }

        // Prefix match for paths like /api/v1/namespaces/foo
        for ((m, p), resp) in responses.iter() {
            if m == method && path.starts_with(p) {
                return Some(resp.clone());
            }
        }

        None
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = std::result::Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();

        let (status, body) = self
            .find_response(&method, &path)
            .unwrap_or_else(|| (404, not_found_json("resource", &path)));

        Box::pin(async move {
            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a mock namespace JSON response
pub fn namespace_json(name: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": name,
            "uid": "test-uid"
        }
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" not found", resource, name),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}
