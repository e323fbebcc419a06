use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillbook_core::{CategoryId, DomainResult, Entity};

use crate::require_text;

/// Product category. Products reference categories by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    id: CategoryId,
    name: String,
    created_at: DateTime<Utc>,
}

impl Category {
    pub fn create(id: CategoryId, name: &str, now: DateTime<Utc>) -> DomainResult<Self> {
        Ok(Self {
            id,
            name: require_text("category name", name)?,
            created_at: now,
        })
    }

    pub fn id_typed(&self) -> CategoryId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn rename(&mut self, name: &str) -> DomainResult<()> {
        self.name = require_text("category name", name)?;
        Ok(())
    }
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}
