//! Typed resource handle client
//!
//! One namespace-scoped client used by every workflow. Deletes are
//! idempotent (a missing resource is already in the goal state), updates
//! require a previously-fetched object so stale writes surface as
//! `Conflict`, and every create registers a deferred best-effort cleanup
//! so an abandoned run still converges to deletion.

use k8s_openapi::NamespaceResourceScope;
use kube::api::{Api, DeleteParams, PostParams};
use kube::core::{ApiResource, DynamicObject};
use kube::{Client, Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use crate::config::Timeouts;
use crate::error::{OrchestratorError, Result};
use crate::poll::{poll_until, PollCheck};

/// A resource registered for deferred deletion
#[derive(Debug, Clone)]
struct CleanupEntry {
    resource: ApiResource,
    name: String,
}

/// Namespace-scoped, typed create/get/update/delete over the declarative
/// resource store.
#[derive(Clone)]
pub struct ResourceClient {
    client: Client,
    namespace: String,
    timeouts: Timeouts,
    cleanup: Arc<Mutex<Vec<CleanupEntry>>>,
}

impl ResourceClient {
    pub fn new(client: Client, namespace: impl Into<String>, timeouts: Timeouts) -> Self {
        Self {
            client,
            namespace: namespace.into(),
            timeouts,
            cleanup: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Raw client, for the pod/claim/job list APIs the verifiers use.
    pub fn kube(&self) -> Client {
        self.client.clone()
    }

    fn api_for<K>(&self) -> Api<K>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
    {
        Api::namespaced(self.client.clone(), &self.namespace)
    }

    /// Submit the desired spec and return the freshly observed object.
    ///
    /// The re-fetch picks up admission defaulting and the assigned
    /// resourceVersion, so the returned object is usable for updates.
    pub async fn create<K>(&self, resource: &K) -> Result<K>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Serialize
            + DeserializeOwned
            + Clone
            + Debug,
    {
        let name = resource.name_any();
        let api = self.api_for::<K>();
        api.create(&PostParams::default(), resource).await?;
        self.register_cleanup::<K>(&name);

        let created = api.get(&name).await?;
        info!(kind = %K::kind(&()), name = %name, "created resource");
        Ok(created)
    }

    pub async fn get<K>(&self, name: &str) -> Result<K>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + DeserializeOwned
            + Clone
            + Debug,
    {
        Ok(self.api_for::<K>().get(name).await?)
    }

    /// Replace the stored object with `resource`, which must carry the
    /// resourceVersion of a previous fetch. A stale version surfaces as
    /// [`OrchestratorError::Conflict`].
    pub async fn update<K>(&self, resource: &K) -> Result<K>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + Serialize
            + DeserializeOwned
            + Clone
            + Debug,
    {
        let name = resource.name_any();
        if resource.meta().resource_version.is_none() {
            return Err(OrchestratorError::Configuration(format!(
                "update of {} {} requires a previously fetched object",
                K::kind(&()),
                name
            )));
        }
        let updated = self
            .api_for::<K>()
            .replace(&name, &PostParams::default(), resource)
            .await?;
        info!(kind = %K::kind(&()), name = %name, "updated resource");
        Ok(updated)
    }

    /// Delete by name. A not-found response is success: the goal state
    /// ("this resource does not exist") already holds.
    pub async fn delete<K>(&self, name: &str) -> Result<()>
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>
            + DeserializeOwned
            + Clone
            + Debug,
    {
        let api = self.api_for::<K>();
        match api.delete(name, &DeleteParams::default()).await {
            Ok(_) => {
                info!(kind = %K::kind(&()), name = %name, "deleted resource");
                Ok(())
            }
            Err(err) => {
                let mapped = OrchestratorError::from(err);
                if mapped.is_not_found() {
                    info!(kind = %K::kind(&()), name = %name, "resource already absent");
                    Ok(())
                } else {
                    Err(mapped)
                }
            }
        }
    }

    fn register_cleanup<K>(&self, name: &str)
    where
        K: Resource<Scope = NamespaceResourceScope, DynamicType = ()>,
    {
        let entry = CleanupEntry {
            resource: ApiResource::erase::<K>(&()),
            name: name.to_string(),
        };
        self.cleanup
            .lock()
            .expect("cleanup registry lock poisoned")
            .push(entry);
    }

    /// Kinds and names currently registered for deferred deletion, in
    /// registration order.
    pub fn registered_cleanups(&self) -> Vec<(String, String)> {
        self.cleanup
            .lock()
            .expect("cleanup registry lock poisoned")
            .iter()
            .map(|e| (e.resource.kind.clone(), e.name.clone()))
            .collect()
    }

    /// Best-effort deletion of every registered resource, most recent
    /// first, each bounded by the cleanup grace period. Failures are
    /// logged, never propagated: cleanup runs on paths that already
    /// carry an error.
    pub async fn cleanup(&self) {
        let entries: Vec<CleanupEntry> = {
            let mut registry = self
                .cleanup
                .lock()
                .expect("cleanup registry lock poisoned");
            registry.drain(..).collect()
        };

        for entry in entries.into_iter().rev() {
            let api: Api<DynamicObject> =
                Api::namespaced_with(self.client.clone(), &self.namespace, &entry.resource);

            match api.delete(&entry.name, &DeleteParams::default()).await {
                Ok(_) => {}
                Err(kube::Error::Api(resp)) if resp.code == 404 => continue,
                Err(err) => {
                    warn!(kind = %entry.resource.kind, name = %entry.name, error = %err,
                        "cleanup delete failed");
                    continue;
                }
            }

            let wait = poll_until(
                &format!("cleanup of {} {}", entry.resource.kind, entry.name),
                self.timeouts.cleanup_retry_interval,
                self.timeouts.cleanup_timeout,
                || async {
                    match api.get(&entry.name).await {
                        Ok(_) => Ok(PollCheck::NotYet("still present".to_string())),
                        Err(kube::Error::Api(resp)) if resp.code == 404 => {
                            Ok(PollCheck::Ready(()))
                        }
                        Err(err) => Err(err.into()),
                    }
                },
            )
            .await;

            match wait {
                Ok(()) => info!(kind = %entry.resource.kind, name = %entry.name, "cleaned up"),
                Err(err) => {
                    warn!(kind = %entry.resource.kind, name = %entry.name, error = %err,
                        "cleanup did not converge within grace period");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{CoordinationCluster, JournalCluster};

    fn test_client() -> ResourceClient {
        // Config that never dials anywhere; registry tests are offline.
        let config = kube::Config::new("http://localhost:8080".parse().unwrap());
        let client = Client::try_from(config).unwrap();
        ResourceClient::new(client, "default", Timeouts::default())
    }

    #[tokio::test]
    async fn test_cleanup_registry_records_in_order() {
        let resources = test_client();
        resources.register_cleanup::<CoordinationCluster>("coordination");
        resources.register_cleanup::<JournalCluster>("journal");

        let registered = resources.registered_cleanups();
        assert_eq!(
            registered,
            vec![
                ("CoordinationCluster".to_string(), "coordination".to_string()),
                ("JournalCluster".to_string(), "journal".to_string()),
            ]
        );
    }
}
