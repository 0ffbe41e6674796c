use anyhow::Result;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Select,
};
use veggiescan_common::types::{ScanRecord, ScanResult};

use crate::entities::scan_record::{self, Column, Entity};
use crate::store::VeggieStore;

fn model_to_record(m: scan_record::Model) -> ScanRecord {
    ScanRecord {
        id: m.id,
        user_id: m.user_id,
        image_hash: m.image_hash,
        vegetable_name: m.vegetable_name,
        safe_to_eat: m.safe_to_eat,
        disease_name: m.disease_name,
        recommendation: m.recommendation,
        confidence: m.confidence.clamp(0, 100) as u8,
        analysis_date: m.analysis_date.with_timezone(&Utc),
        created_at: m.created_at.with_timezone(&Utc),
    }
}

fn scoped(owner: Option<&str>, safe: Option<bool>) -> Select<Entity> {
    let mut q = Entity::find();
    if let Some(user_id) = owner {
        q = q.filter(Column::UserId.eq(user_id));
    }
    if let Some(s) = safe {
        q = q.filter(Column::SafeToEat.eq(s));
    }
    q
}

impl VeggieStore {
    /// Earliest record for this content hash, whoever uploaded it.
    pub async fn find_scan_by_hash(&self, image_hash: &str) -> Result<Option<ScanRecord>> {
        let m = Entity::find()
            .filter(Column::ImageHash.eq(image_hash))
            .order_by(Column::CreatedAt, Order::Asc)
            .one(self.db())
            .await?;
        Ok(m.map(model_to_record))
    }

    /// Append one scan to the history. Rows are never updated afterwards.
    pub async fn insert_scan_record(
        &self,
        user_id: &str,
        image_hash: &str,
        result: &ScanResult,
    ) -> Result<ScanRecord> {
        let am = scan_record::ActiveModel {
            id: Set(veggiescan_common::id::next_id()),
            user_id: Set(user_id.to_owned()),
            image_hash: Set(image_hash.to_owned()),
            vegetable_name: Set(result.vegetable_name.clone()),
            safe_to_eat: Set(result.safe_to_eat),
            disease_name: Set(result.disease_name.clone()),
            recommendation: Set(result.recommendation.clone()),
            confidence: Set(result.confidence as i32),
            analysis_date: Set(result.analysis_date.fixed_offset()),
            created_at: Set(Utc::now().fixed_offset()),
        };
        let m = am.insert(self.db()).await?;
        Ok(model_to_record(m))
    }

    /// Newest first. `owner = None` lists every user's scans.
    pub async fn list_scan_records(
        &self,
        owner: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ScanRecord>> {
        let rows = scoped(owner, None)
            .order_by(Column::CreatedAt, Order::Desc)
            .order_by(Column::Id, Order::Desc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(model_to_record).collect())
    }

    pub async fn count_scan_records(&self, owner: Option<&str>, safe: Option<bool>) -> Result<u64> {
        Ok(scoped(owner, safe).count(self.db()).await?)
    }

    /// Delete every scan record. Returns the number of rows removed.
    pub async fn clear_scan_records(&self) -> Result<u64> {
        let res = Entity::delete_many().exec(self.db()).await?;
        tracing::info!(deleted = res.rows_affected, "Cleared scan records");
        Ok(res.rows_affected)
    }
}
