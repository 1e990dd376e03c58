use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use qualigate_application::{ApprovalLedger, InspectionFilter, InspectionRepository};
use qualigate_core::{AppError, AppResult};
use qualigate_domain::{
    ApprovalAction, ApprovalHistoryEntry, ApprovalHistoryInput, EvidenceRef, Inspection,
    InspectionId, InspectionInput, InspectionResult, InspectionResultInput, InspectionStatus,
    ProductId, Role, SpecificationId,
};

/// PostgreSQL-backed inspection store and decision ledger implementation.
///
/// A decision is one transaction: the status compare-and-swap on the
/// inspection row and the history insert commit together or not at all. The
/// `approval_history` table is append-only; no update or delete statement
/// exists anywhere in this module.
#[derive(Clone)]
pub struct PostgresInspectionRepository {
    pool: PgPool,
}

impl PostgresInspectionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn lock_inspection(
        tx: &mut Transaction<'_, Postgres>,
        id: InspectionId,
    ) -> AppResult<Inspection> {
        let row = sqlx::query_as::<_, InspectionRow>(
            r#"
            SELECT id, number, product_id, created_by, status, batch_number,
                   remarks, version, created_at, updated_at
            FROM inspections
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&mut **tx)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock inspection: {error}")))?;

        row.map(InspectionRow::into_inspection)
            .transpose()?
            .ok_or_else(|| AppError::NotFound(format!("inspection '{id}' does not exist")))
    }

    fn require_mutable(inspection: &Inspection) -> AppResult<()> {
        if !inspection.status().is_mutable() {
            return Err(AppError::Forbidden(format!(
                "inspection '{}' is {} and permanently read-only",
                inspection.number().as_str(),
                inspection.status().as_str()
            )));
        }

        Ok(())
    }
}

#[derive(Debug, FromRow)]
struct InspectionRow {
    id: uuid::Uuid,
    number: String,
    product_id: uuid::Uuid,
    created_by: String,
    status: String,
    batch_number: Option<String>,
    remarks: Option<String>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl InspectionRow {
    fn into_inspection(self) -> AppResult<Inspection> {
        Inspection::new(InspectionInput {
            id: InspectionId::from_uuid(self.id),
            number: self.number,
            product_id: ProductId::from_uuid(self.product_id),
            created_by: self.created_by,
            status: InspectionStatus::from_str(self.status.as_str())?,
            batch_number: self.batch_number,
            remarks: self.remarks,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ResultRow {
    id: uuid::Uuid,
    inspection_id: uuid::Uuid,
    specification_id: uuid::Uuid,
    actual_value: String,
    is_pass: bool,
    remarks: Option<String>,
}

impl ResultRow {
    fn into_result(self) -> AppResult<InspectionResult> {
        InspectionResult::new(InspectionResultInput {
            id: self.id,
            inspection_id: InspectionId::from_uuid(self.inspection_id),
            specification_id: SpecificationId::from_uuid(self.specification_id),
            actual_value: self.actual_value,
            is_pass: self.is_pass,
            remarks: self.remarks,
        })
    }
}

#[derive(Debug, FromRow)]
struct EvidenceRow {
    id: uuid::Uuid,
    inspection_id: uuid::Uuid,
    uri: String,
    description: Option<String>,
    added_at: DateTime<Utc>,
}

impl EvidenceRow {
    fn into_evidence(self) -> AppResult<EvidenceRef> {
        EvidenceRef::new(
            self.id,
            InspectionId::from_uuid(self.inspection_id),
            self.uri,
            self.description,
            self.added_at,
        )
    }
}

#[derive(Debug, FromRow)]
struct HistoryRow {
    id: uuid::Uuid,
    inspection_id: uuid::Uuid,
    actor_subject: String,
    actor_role: String,
    action: String,
    previous_status: String,
    new_status: String,
    comment: String,
    decided_at: DateTime<Utc>,
}

impl HistoryRow {
    fn into_entry(self) -> AppResult<ApprovalHistoryEntry> {
        ApprovalHistoryEntry::new(ApprovalHistoryInput {
            id: self.id,
            inspection_id: InspectionId::from_uuid(self.inspection_id),
            actor_subject: self.actor_subject,
            actor_role: Role::from_str(self.actor_role.as_str())?,
            action: ApprovalAction::from_str(self.action.as_str())?,
            previous_status: InspectionStatus::from_str(self.previous_status.as_str())?,
            new_status: InspectionStatus::from_str(self.new_status.as_str())?,
            comment: self.comment,
            decided_at: self.decided_at,
        })
    }
}

#[async_trait]
impl InspectionRepository for PostgresInspectionRepository {
    async fn next_inspection_number(&self) -> AppResult<String> {
        let next: (i64,) = sqlx::query_as("SELECT nextval('inspection_numbers')")
            .fetch_one(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to draw an inspection number: {error}"))
            })?;

        Ok(format!("QG-{:06}", next.0))
    }

    async fn create(
        &self,
        inspection: Inspection,
        results: Vec<InspectionResult>,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to open submission transaction: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO inspections
                (id, number, product_id, created_by, status, batch_number,
                 remarks, version, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(inspection.id().as_uuid())
        .bind(inspection.number().as_str())
        .bind(inspection.product_id().as_uuid())
        .bind(inspection.created_by())
        .bind(inspection.status().as_str())
        .bind(inspection.batch_number())
        .bind(inspection.remarks())
        .bind(inspection.version())
        .bind(inspection.created_at())
        .bind(inspection.updated_at())
        .execute(&mut *tx)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create inspection: {error}")))?;

        for result in &results {
            sqlx::query(
                r#"
                INSERT INTO inspection_results
                    (id, inspection_id, specification_id, actual_value, is_pass, remarks)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(result.id())
            .bind(result.inspection_id().as_uuid())
            .bind(result.specification_id().as_uuid())
            .bind(result.actual_value())
            .bind(result.is_pass())
            .bind(result.remarks())
            .execute(&mut *tx)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to record inspection result: {error}"))
            })?;
        }

        tx.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit submission transaction: {error}"))
        })
    }

    async fn find(&self, id: InspectionId) -> AppResult<Option<Inspection>> {
        let row = sqlx::query_as::<_, InspectionRow>(
            r#"
            SELECT id, number, product_id, created_by, status, batch_number,
                   remarks, version, created_at, updated_at
            FROM inspections
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load inspection: {error}")))?;

        row.map(InspectionRow::into_inspection).transpose()
    }

    async fn list(&self, filter: InspectionFilter) -> AppResult<Vec<Inspection>> {
        let rows = sqlx::query_as::<_, InspectionRow>(
            r#"
            SELECT id, number, product_id, created_by, status, batch_number,
                   remarks, version, created_at, updated_at
            FROM inspections
            WHERE ($1::TEXT IS NULL OR status = $1)
              AND ($2::UUID IS NULL OR product_id = $2)
              AND ($3::TEXT IS NULL OR created_by = $3)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.status.map(|status| status.as_str()))
        .bind(filter.product_id.map(|product_id| product_id.as_uuid()))
        .bind(filter.created_by)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list inspections: {error}")))?;

        rows.into_iter().map(InspectionRow::into_inspection).collect()
    }

    async fn results_for(&self, id: InspectionId) -> AppResult<Vec<InspectionResult>> {
        let rows = sqlx::query_as::<_, ResultRow>(
            r#"
            SELECT id, inspection_id, specification_id, actual_value, is_pass, remarks
            FROM inspection_results
            WHERE inspection_id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load inspection results: {error}"))
        })?;

        rows.into_iter().map(ResultRow::into_result).collect()
    }

    async fn evidence_for(&self, id: InspectionId) -> AppResult<Vec<EvidenceRef>> {
        let rows = sqlx::query_as::<_, EvidenceRow>(
            r#"
            SELECT id, inspection_id, uri, description, added_at
            FROM inspection_evidence
            WHERE inspection_id = $1
            ORDER BY added_at
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load evidence: {error}")))?;

        rows.into_iter().map(EvidenceRow::into_evidence).collect()
    }

    async fn append_evidence(&self, evidence: EvidenceRef) -> AppResult<()> {
        let mut tx = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to open evidence transaction: {error}"))
        })?;

        // Locking the row first keeps the mutability check valid until the
        // insert commits; a decision landing in between waits on the lock.
        let inspection = Self::lock_inspection(&mut tx, evidence.inspection_id()).await?;
        Self::require_mutable(&inspection)?;

        sqlx::query(
            r#"
            INSERT INTO inspection_evidence (id, inspection_id, uri, description, added_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(evidence.id())
        .bind(evidence.inspection_id().as_uuid())
        .bind(evidence.uri().as_str())
        .bind(evidence.description())
        .bind(evidence.added_at())
        .execute(&mut *tx)
        .await
        .map_err(|error| AppError::Internal(format!("failed to append evidence: {error}")))?;

        tx.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit evidence transaction: {error}"))
        })
    }

    async fn update_details(
        &self,
        id: InspectionId,
        expected_version: i64,
        batch_number: Option<String>,
        remarks: Option<String>,
    ) -> AppResult<Inspection> {
        let mut tx = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to open details transaction: {error}"))
        })?;

        let inspection = Self::lock_inspection(&mut tx, id).await?;
        Self::require_mutable(&inspection)?;

        if inspection.version() != expected_version {
            return Err(AppError::Conflict(format!(
                "inspection '{}' was modified concurrently",
                inspection.number().as_str()
            )));
        }

        let updated = inspection.with_details(batch_number, remarks, Utc::now());

        sqlx::query(
            r#"
            UPDATE inspections
            SET batch_number = $1, remarks = $2, version = $3, updated_at = $4
            WHERE id = $5
            "#,
        )
        .bind(updated.batch_number())
        .bind(updated.remarks())
        .bind(updated.version())
        .bind(updated.updated_at())
        .bind(id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to update inspection details: {error}"))
        })?;

        tx.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit details transaction: {error}"))
        })?;

        Ok(updated)
    }

    async fn apply_decision(
        &self,
        id: InspectionId,
        expected_status: InspectionStatus,
        new_status: InspectionStatus,
        entry: ApprovalHistoryEntry,
    ) -> AppResult<Inspection> {
        let mut tx = self.pool.begin().await.map_err(|error| {
            AppError::Internal(format!("failed to open decision transaction: {error}"))
        })?;

        let inspection = Self::lock_inspection(&mut tx, id).await?;

        // The status acts as the compare-and-swap token: of two concurrent
        // decisions on the same stage, the second observes the first one's
        // status write and conflicts instead of double-committing.
        if inspection.status() != expected_status {
            return Err(AppError::Conflict(format!(
                "inspection '{}' is '{}', decision expected '{}'",
                inspection.number().as_str(),
                inspection.status().as_str(),
                expected_status.as_str()
            )));
        }

        let updated = inspection.with_status(new_status, Utc::now());

        sqlx::query(
            r#"
            UPDATE inspections
            SET status = $1, version = $2, updated_at = $3
            WHERE id = $4 AND status = $5
            "#,
        )
        .bind(updated.status().as_str())
        .bind(updated.version())
        .bind(updated.updated_at())
        .bind(id.as_uuid())
        .bind(expected_status.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to advance inspection status: {error}"))
        })?;

        sqlx::query(
            r#"
            INSERT INTO approval_history
                (id, inspection_id, actor_subject, actor_role, action,
                 previous_status, new_status, comment, decided_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(entry.id())
        .bind(entry.inspection_id().as_uuid())
        .bind(entry.actor_subject())
        .bind(entry.actor_role().as_str())
        .bind(entry.action().as_str())
        .bind(entry.previous_status().as_str())
        .bind(entry.new_status().as_str())
        .bind(entry.comment().as_str())
        .bind(entry.decided_at())
        .execute(&mut *tx)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to append approval history: {error}"))
        })?;

        tx.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit decision transaction: {error}"))
        })?;

        Ok(updated)
    }
}

#[async_trait]
impl ApprovalLedger for PostgresInspectionRepository {
    async fn entries_for(
        &self,
        inspection_id: InspectionId,
    ) -> AppResult<Vec<ApprovalHistoryEntry>> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT id, inspection_id, actor_subject, actor_role, action,
                   previous_status, new_status, comment, decided_at
            FROM approval_history
            WHERE inspection_id = $1
            ORDER BY seq
            "#,
        )
        .bind(inspection_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to load approval history: {error}"))
        })?;

        rows.into_iter().map(HistoryRow::into_entry).collect()
    }
}
