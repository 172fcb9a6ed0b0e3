use crate::error::DbError;
use crate::keys::{azure_devops_settings_key, encode_key, github_settings_key};
use crate::store::EventStore;
use core_types::{AzureDevOpsSettings, GitHubSettings, StoredEvent};

pub const AZURE_DEVOPS_SETTINGS_PARTITION: &str = "AzureDevOpsSettings";
pub const GITHUB_SETTINGS_PARTITION: &str = "GitHubSettings";

/// Saved connection profiles, one JSON row per settings key.
///
/// Saving is insert-or-merge: the last save for a key wins.
#[derive(Clone)]
pub struct SettingsStore {
    store: EventStore,
}

impl SettingsStore {
    pub fn new(store: EventStore) -> Self {
        Self { store }
    }

    pub async fn save_azure_devops(&self, settings: &AzureDevOpsSettings) -> Result<bool, DbError> {
        let scope = &settings.scope;
        let key = azure_devops_settings_key(
            &scope.organization,
            &scope.project,
            &scope.repository,
            &scope.build_name,
        );
        let payload = serde_json::to_string(settings)?;
        tracing::info!(settings_key = %key, "Saving Azure DevOps settings.");
        self.store
            .save(&StoredEvent::new(
                AZURE_DEVOPS_SETTINGS_PARTITION,
                encode_key(&key),
                payload,
            ))
            .await
    }

    pub async fn get_azure_devops(
        &self,
        organization: &str,
        project: &str,
        repository: &str,
        build_name: &str,
    ) -> Result<Option<AzureDevOpsSettings>, DbError> {
        let key = azure_devops_settings_key(organization, project, repository, build_name);
        self.get(AZURE_DEVOPS_SETTINGS_PARTITION, &key).await
    }

    pub async fn list_azure_devops(&self) -> Result<Vec<AzureDevOpsSettings>, DbError> {
        self.store.list_records(AZURE_DEVOPS_SETTINGS_PARTITION).await
    }

    pub async fn save_github(&self, settings: &GitHubSettings) -> Result<bool, DbError> {
        let scope = &settings.scope;
        let key = github_settings_key(&scope.owner, &scope.repo, &scope.workflow_name);
        let payload = serde_json::to_string(settings)?;
        tracing::info!(settings_key = %key, "Saving GitHub settings.");
        self.store
            .save(&StoredEvent::new(
                GITHUB_SETTINGS_PARTITION,
                encode_key(&key),
                payload,
            ))
            .await
    }

    pub async fn get_github(
        &self,
        owner: &str,
        repo: &str,
        workflow_name: &str,
    ) -> Result<Option<GitHubSettings>, DbError> {
        let key = github_settings_key(owner, repo, workflow_name);
        self.get(GITHUB_SETTINGS_PARTITION, &key).await
    }

    pub async fn list_github(&self) -> Result<Vec<GitHubSettings>, DbError> {
        self.store.list_records(GITHUB_SETTINGS_PARTITION).await
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        partition_key: &str,
        settings_key: &str,
    ) -> Result<Option<T>, DbError> {
        match self.store.get(partition_key, &encode_key(settings_key)).await? {
            Some(row) => Ok(Some(serde_json::from_str(&row.payload)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryTableBackend;
    use core_types::{AzureDevOpsScope, GitHubScope};
    use std::sync::Arc;

    fn settings_store() -> SettingsStore {
        let backend = Arc::new(MemoryTableBackend::new());
        SettingsStore::new(EventStore::new(backend, "Settings"))
    }

    fn azure(pat: &str) -> AzureDevOpsSettings {
        AzureDevOpsSettings {
            pat_token: pat.to_string(),
            scope: AzureDevOpsScope {
                organization: "contoso".to_string(),
                project: "Web".to_string(),
                repository: "web-app".to_string(),
                branch: "refs/heads/main".to_string(),
                build_name: "Web.CI".to_string(),
                build_id: "42".to_string(),
            },
        }
    }

    fn github(secret: &str) -> GitHubSettings {
        GitHubSettings {
            client_id: "client".to_string(),
            client_secret: secret.to_string(),
            scope: GitHubScope {
                owner: "octo".to_string(),
                repo: "app".to_string(),
                branch: "main".to_string(),
                workflow_name: "CI".to_string(),
                workflow_id: "1234".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn missing_profile_is_none() {
        let store = settings_store();
        let found = store
            .get_azure_devops("contoso", "Web", "web-app", "Web.CI")
            .await
            .unwrap();
        assert!(found.is_none());
        assert!(store.list_github().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn azure_devops_save_is_last_write_wins() {
        let store = settings_store();

        assert!(store.save_azure_devops(&azure("first")).await.unwrap());
        assert!(store.save_azure_devops(&azure("second")).await.unwrap());

        let found = store
            .get_azure_devops("contoso", "Web", "web-app", "Web.CI")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.pat_token, "second");
        assert_eq!(found.scope.build_id, "42");
        assert_eq!(store.list_azure_devops().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn github_profiles_are_keyed_by_workflow() {
        let store = settings_store();
        let mut other = github("s2");
        other.scope.workflow_name = "Release".to_string();

        store.save_github(&github("s1")).await.unwrap();
        store.save_github(&other).await.unwrap();

        assert_eq!(store.list_github().await.unwrap().len(), 2);
        let ci = store.get_github("octo", "app", "CI").await.unwrap().unwrap();
        assert_eq!(ci.client_secret, "s1");
        assert!(store.list_azure_devops().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn names_with_slashes_round_trip() {
        let store = settings_store();
        let mut settings = github("s");
        settings.scope.workflow_name = "build/deploy".to_string();

        store.save_github(&settings).await.unwrap();

        let found = store.get_github("octo", "app", "build/deploy").await.unwrap();
        assert_eq!(found, Some(settings));
    }
}
