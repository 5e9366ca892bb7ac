use anyhow::{Context, Result};

use crate::client::HubReadApi;
use crate::model::{ContentItem, ContentItemStatus};

#[derive(Debug, Clone, Default)]
pub struct LocateOptions {
    pub id: Option<String>,
    pub repo_ids: Vec<String>,
    pub folder_ids: Vec<String>,
}

impl LocateOptions {
    pub fn is_unscoped(&self) -> bool {
        self.id.is_none() && self.repo_ids.is_empty() && self.folder_ids.is_empty()
    }

    /// Filters that will be ignored because a narrower one wins.
    pub fn ignored_filter_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.id.is_some() {
            if !self.repo_ids.is_empty() || !self.folder_ids.is_empty() {
                warnings.push(
                    "content item ID is specified, ignoring repository and folder filters"
                        .to_string(),
                );
            }
        } else if !self.folder_ids.is_empty() && !self.repo_ids.is_empty() {
            warnings.push(
                "folder filter is specified, ignoring repository filter".to_string(),
            );
        }
        warnings
    }
}

/// Collect archived items in scope: one item by ID, else the named folders,
/// else the named repositories, else every repository in the hub.
pub fn locate_archived_items<A>(api: &mut A, options: &LocateOptions) -> Result<Vec<ContentItem>>
where
    A: HubReadApi + ?Sized,
{
    if let Some(id) = options.id.as_deref() {
        let item = api
            .get_content_item(id)
            .with_context(|| format!("failed to fetch content item {id}"))?;
        if !item.is_archived() {
            tracing::info!(id, status = %item.status, "content item is not archived");
            return Ok(Vec::new());
        }
        return Ok(vec![item]);
    }

    let mut items = Vec::new();
    if !options.folder_ids.is_empty() {
        for folder_id in &options.folder_ids {
            let folder = api
                .get_folder(folder_id)
                .with_context(|| format!("failed to fetch folder {folder_id}"))?;
            let listed = api
                .list_folder_items(&folder.id, ContentItemStatus::Archived)
                .with_context(|| format!("failed to list archived items in folder {folder_id}"))?;
            tracing::debug!(
                folder_id = %folder_id,
                folder = %folder.name,
                count = listed.len(),
                "listed folder"
            );
            items.extend(listed);
        }
        return Ok(items);
    }

    let repositories = if options.repo_ids.is_empty() {
        api.list_content_repositories()
            .context("failed to list content repositories")?
    } else {
        let mut repositories = Vec::with_capacity(options.repo_ids.len());
        for repo_id in &options.repo_ids {
            repositories.push(
                api.get_content_repository(repo_id)
                    .with_context(|| format!("failed to fetch content repository {repo_id}"))?,
            );
        }
        repositories
    };

    for repository in &repositories {
        let listed = api
            .list_repository_items(&repository.id, ContentItemStatus::Archived)
            .with_context(|| {
                format!(
                    "failed to list archived items in repository {}",
                    repository.id
                )
            })?;
        tracing::debug!(
            repository_id = %repository.id,
            repository = %repository.label,
            count = listed.len(),
            "listed repository"
        );
        items.extend(listed);
    }
    Ok(items)
}
