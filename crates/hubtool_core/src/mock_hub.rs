//! In-memory hub used by unit tests.

use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Result, anyhow, bail};
use serde_json::json;

use crate::client::{HubReadApi, HubWriteApi};
use crate::model::{ContentItem, ContentItemStatus, ContentRepository, Folder, PublishJob};

#[derive(Default)]
pub struct MockHub {
    pub items: BTreeMap<String, ContentItem>,
    pub repositories: Vec<ContentRepository>,
    pub folders: Vec<Folder>,
    /// Item, folder or repository ids whose reads fail.
    pub fail_reads: BTreeSet<String>,
    /// Item id -> write step ("unarchive", "update", "archive", "publish") that fails.
    pub fail_writes: BTreeMap<String, &'static str>,
    pub listed_statuses: Vec<ContentItemStatus>,
    pub writes: Vec<String>,
    pub published: Vec<String>,
    request_count: usize,
}

impl MockHub {
    pub fn sample() -> Self {
        let mut hub = Self {
            repositories: vec![repository("repo1"), repository("repo2")],
            folders: vec![Folder {
                id: "folder1".to_string(),
                name: "Banners".to_string(),
            }],
            ..Self::default()
        };
        hub.insert(item(
            "item-a",
            "header-top",
            "repo1",
            None,
            ContentItemStatus::Archived,
            Some("top-key"),
            true,
            Some(1),
        ));
        hub.insert(item(
            "item-b",
            "header-side",
            "repo1",
            Some("folder1"),
            ContentItemStatus::Archived,
            Some("side-key"),
            false,
            None,
        ));
        hub.insert(item(
            "item-c",
            "header-other",
            "repo2",
            None,
            ContentItemStatus::Archived,
            Some("other-key"),
            true,
            Some(4),
        ));
        hub.insert(item(
            "item-d",
            "footer",
            "repo1",
            None,
            ContentItemStatus::Archived,
            None,
            true,
            Some(2),
        ));
        hub.insert(item(
            "item-live",
            "header-live",
            "repo1",
            None,
            ContentItemStatus::Active,
            Some("live-key"),
            true,
            Some(7),
        ));
        hub
    }

    pub fn insert(&mut self, item: ContentItem) {
        self.items.insert(item.id.clone(), item);
    }

    pub fn stored(&self, id: &str) -> &ContentItem {
        &self.items[id]
    }

    fn check_read(&mut self, id: &str) -> Result<()> {
        self.request_count += 1;
        if self.fail_reads.contains(id) {
            bail!("simulated read failure for {id}");
        }
        Ok(())
    }

    fn check_write(&mut self, step: &'static str, item: &ContentItem) -> Result<ContentItem> {
        self.request_count += 1;
        self.writes.push(format!("{step}:{}", item.id));
        if self.fail_writes.get(&item.id) == Some(&step) {
            bail!("simulated {step} failure for {}", item.id);
        }
        let stored = self
            .items
            .get(&item.id)
            .cloned()
            .ok_or_else(|| anyhow!("content item {} not found", item.id))?;
        if stored.version != item.version {
            bail!(
                "version conflict for {}: sent {}, stored {}",
                item.id,
                item.version,
                stored.version
            );
        }
        Ok(stored)
    }

    fn list_items<F>(&mut self, status: ContentItemStatus, predicate: F) -> Vec<ContentItem>
    where
        F: Fn(&ContentItem) -> bool,
    {
        self.listed_statuses.push(status);
        self.items
            .values()
            .filter(|item| item.status == status && predicate(item))
            .cloned()
            .collect()
    }
}

impl HubReadApi for MockHub {
    fn get_content_item(&mut self, id: &str) -> Result<ContentItem> {
        self.check_read(id)?;
        self.items
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("content item {id} not found"))
    }

    fn get_content_repository(&mut self, id: &str) -> Result<ContentRepository> {
        self.check_read(id)?;
        self.repositories
            .iter()
            .find(|repository| repository.id == id)
            .cloned()
            .ok_or_else(|| anyhow!("repository {id} not found"))
    }

    fn get_folder(&mut self, id: &str) -> Result<Folder> {
        self.check_read(id)?;
        self.folders
            .iter()
            .find(|folder| folder.id == id)
            .cloned()
            .ok_or_else(|| anyhow!("folder {id} not found"))
    }

    fn list_content_repositories(&mut self) -> Result<Vec<ContentRepository>> {
        self.request_count += 1;
        Ok(self.repositories.clone())
    }

    fn list_repository_items(
        &mut self,
        repository_id: &str,
        status: ContentItemStatus,
    ) -> Result<Vec<ContentItem>> {
        self.check_read(repository_id)?;
        Ok(self.list_items(status, |item| {
            item.content_repository_id.as_deref() == Some(repository_id)
        }))
    }

    fn list_folder_items(
        &mut self,
        folder_id: &str,
        status: ContentItemStatus,
    ) -> Result<Vec<ContentItem>> {
        self.check_read(folder_id)?;
        Ok(self.list_items(status, |item| item.folder_id.as_deref() == Some(folder_id)))
    }

    fn request_count(&self) -> usize {
        self.request_count
    }
}

impl HubWriteApi for MockHub {
    fn unarchive(&mut self, item: &ContentItem) -> Result<ContentItem> {
        let mut stored = self.check_write("unarchive", item)?;
        if stored.status != ContentItemStatus::Archived {
            bail!("content item {} is not archived", item.id);
        }
        stored.status = ContentItemStatus::Active;
        stored.version += 1;
        self.insert(stored.clone());
        Ok(stored)
    }

    fn update(&mut self, item: &ContentItem) -> Result<ContentItem> {
        let mut stored = self.check_write("update", item)?;
        stored.body = item.body.clone();
        stored.label = item.label.clone();
        stored.version += 1;
        self.insert(stored.clone());
        Ok(stored)
    }

    fn archive(&mut self, item: &ContentItem) -> Result<ContentItem> {
        let mut stored = self.check_write("archive", item)?;
        stored.status = ContentItemStatus::Archived;
        stored.version += 1;
        self.insert(stored.clone());
        Ok(stored)
    }

    fn publish(&mut self, item: &ContentItem) -> Result<PublishJob> {
        self.check_write("publish", item)?;
        self.published.push(item.id.clone());
        Ok(PublishJob {
            content_item_id: item.id.clone(),
            location: Some(format!("https://hub.test/publishing-jobs/{}", item.id)),
        })
    }
}

fn repository(id: &str) -> ContentRepository {
    ContentRepository {
        id: id.to_string(),
        name: id.to_string(),
        label: id.to_uppercase(),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn item(
    id: &str,
    label: &str,
    repository_id: &str,
    folder_id: Option<&str>,
    status: ContentItemStatus,
    delivery_key: Option<&str>,
    active: bool,
    last_published_version: Option<u64>,
) -> ContentItem {
    serde_json::from_value(json!({
        "id": id,
        "label": label,
        "status": status.as_str(),
        "version": 1,
        "contentRepositoryId": repository_id,
        "folderId": folder_id,
        "lastPublishedVersion": last_published_version,
        "body": {
            "_meta": {
                "schema": if label.starts_with("header") {
                    "https://schema.test/header.json"
                } else {
                    "https://schema.test/footer.json"
                },
                "deliveryKey": delivery_key
            },
            "active": active,
            "text": format!("{label} body")
        }
    }))
    .expect("sample content item")
}
