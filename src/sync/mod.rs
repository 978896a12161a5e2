// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Propagation of the cluster name into opted-in namespaces.

pub mod identity;
pub mod namespaces;

pub use identity::{sync_identity_record, sync_identity_records};
pub use namespaces::{get_injectable_namespaces, is_namespace_injectable};
