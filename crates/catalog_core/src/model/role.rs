//! Role entity.

use crate::model::{Entity, EntityId};

pub type RoleId = EntityId;

/// Granted authority such as `ROLE_ADMIN`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Role {
    pub id: Option<RoleId>,
    pub authority: String,
}

impl Role {
    pub fn new(authority: impl Into<String>) -> Self {
        Self {
            id: None,
            authority: authority.into(),
        }
    }
}

impl Entity for Role {
    const NAME: &'static str = "role";

    fn id(&self) -> Option<EntityId> {
        self.id
    }
}
