//! Append-only order changelog.
//!
//! Reconciliation writes one row per tracked change; nothing in the engine
//! updates or deletes rows once written.

use std::sync::Arc;

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use uuid::Uuid;

use crate::entities::changelog::{self, Entity as ChangelogEntity, Model as ChangelogModel};
use crate::errors::ServiceError;
use crate::models::order::ChangeKind;

/// A change about to be recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChangelogEntry {
    pub field: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub kind: ChangeKind,
}

impl NewChangelogEntry {
    pub fn edit(
        field: impl Into<String>,
        old_value: impl Into<String>,
        new_value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            old_value: Some(old_value.into()),
            new_value: Some(new_value.into()),
            kind: ChangeKind::Edit,
        }
    }

    pub fn add(field: impl Into<String>, new_value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            old_value: None,
            new_value: Some(new_value.into()),
            kind: ChangeKind::Add,
        }
    }

    pub fn remove(field: impl Into<String>, old_value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            old_value: Some(old_value.into()),
            new_value: None,
            kind: ChangeKind::Remove,
        }
    }
}

#[derive(Clone)]
pub struct ChangelogService {
    db: Arc<DatabaseConnection>,
}

impl ChangelogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Appends one entry. Takes any connection so reconciliation can write
    /// inside its save transaction.
    pub async fn append<C: ConnectionTrait>(
        &self,
        conn: &C,
        order_id: Uuid,
        actor: &str,
        entry: NewChangelogEntry,
    ) -> Result<ChangelogModel, ServiceError> {
        let active = changelog::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            actor: Set(actor.to_string()),
            field: Set(entry.field),
            old_value: Set(entry.old_value),
            new_value: Set(entry.new_value),
            kind: Set(entry.kind),
            ..Default::default()
        };
        let model = active.insert(conn).await?;
        Ok(model)
    }

    /// Appends a batch of entries in order.
    pub async fn append_all<C: ConnectionTrait>(
        &self,
        conn: &C,
        order_id: Uuid,
        actor: &str,
        entries: Vec<NewChangelogEntry>,
    ) -> Result<Vec<ChangelogModel>, ServiceError> {
        let mut written = Vec::with_capacity(entries.len());
        for entry in entries {
            written.push(self.append(conn, order_id, actor, entry).await?);
        }
        Ok(written)
    }

    /// All recorded changes for an order, oldest first.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn for_order(&self, order_id: Uuid) -> Result<Vec<ChangelogModel>, ServiceError> {
        let rows = ChangelogEntity::find()
            .filter(changelog::Column::OrderId.eq(order_id))
            .order_by_asc(changelog::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(rows)
    }
}
