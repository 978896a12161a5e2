// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Access to cluster objects.

pub mod store;

pub use store::{KubeStore, ObjectStore};
