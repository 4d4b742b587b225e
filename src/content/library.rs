use std::collections::HashMap;
use std::sync::Arc;

use crate::content::repository::{ContentError, ContentResource, ResourceId, ResourceRepository};

/// Load-once view over a repository. Every caller asking for the same id
/// shares one `Arc` to the immutable template.
pub struct ResourceLibrary {
    repo: Box<dyn ResourceRepository>,
    loaded: HashMap<ResourceId, Arc<ContentResource>>,
}

impl ResourceLibrary {
    pub fn new(repo: Box<dyn ResourceRepository>) -> Self {
        Self {
            repo,
            loaded: HashMap::new(),
        }
    }

    pub fn get(&mut self, id: &ResourceId) -> Result<Arc<ContentResource>, ContentError> {
        if let Some(resource) = self.loaded.get(id) {
            return Ok(Arc::clone(resource));
        }
        let resource = Arc::new(self.repo.load(id)?);
        self.loaded.insert(id.clone(), Arc::clone(&resource));
        Ok(resource)
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded.len()
    }

    pub fn repository(&self) -> &dyn ResourceRepository {
        self.repo.as_ref()
    }

    /// Write-through save; the cached copy is replaced so later lookups see it.
    pub fn save(&mut self, resource: ContentResource) -> Result<(), ContentError> {
        self.repo.save(&resource)?;
        self.loaded.insert(resource.id.clone(), Arc::new(resource));
        Ok(())
    }
}
