use anyhow::Context;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use crate::engine::{PatientHistory, ProgressLogSink};
use crate::error::StoreError;
use crate::models::{
    ClinicalSnapshot, LogMeasurements, PatientRecord, PlanStatus, PlanSummary, ProgressLogEntry,
};

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Postgres-backed history reader and progress-log sink.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PatientHistory for PgStore {
    async fn list_clinical_snapshots(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<ClinicalSnapshot>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT record_date, weight_kg, height_m, waist_cm, reason
            FROM clinic.clinical_records
            WHERE patient_id = $1
            ORDER BY record_date ASC, created_at ASC
            "#,
        )
        .bind(patient_id)
        .fetch_all(&self.pool)
        .await?;

        let mut snapshots = Vec::with_capacity(rows.len());
        for row in rows {
            snapshots.push(ClinicalSnapshot {
                date: row.try_get("record_date")?,
                weight_kg: row.try_get("weight_kg")?,
                height_m: row.try_get("height_m")?,
                waist_cm: row.try_get("waist_cm")?,
                reason: row.try_get("reason")?,
            });
        }

        debug!(%patient_id, count = snapshots.len(), "loaded clinical snapshots");
        Ok(snapshots)
    }

    async fn list_diet_plans(&self, patient_id: Uuid) -> Result<Vec<PlanSummary>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT name, status, start_date, end_date, daily_calories_target, daily_macros_target
            FROM clinic.diet_plans
            WHERE patient_id = $1
            ORDER BY start_date ASC
            "#,
        )
        .bind(patient_id)
        .fetch_all(&self.pool)
        .await?;

        let mut plans = Vec::with_capacity(rows.len());
        for row in rows {
            let status: String = row.try_get("status")?;
            plans.push(PlanSummary {
                name: row.try_get("name")?,
                status: status.parse()?,
                start_date: row.try_get("start_date")?,
                end_date: row.try_get("end_date")?,
                daily_calories_target: row.try_get("daily_calories_target")?,
                daily_macros_target: row.try_get("daily_macros_target")?,
            });
        }

        debug!(%patient_id, count = plans.len(), "loaded diet plans");
        Ok(plans)
    }
}

#[async_trait]
impl ProgressLogSink for PgStore {
    async fn upsert_progress_log(&self, entry: &ProgressLogEntry) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO clinic.progress_logs
            (id, patient_id, entry_date, weight_kg, waist_cm, bmi, notes,
             adherence_score, feeling_level)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (patient_id, entry_date) DO UPDATE
            SET weight_kg = EXCLUDED.weight_kg,
                waist_cm = EXCLUDED.waist_cm,
                bmi = EXCLUDED.bmi,
                notes = EXCLUDED.notes,
                adherence_score = EXCLUDED.adherence_score,
                feeling_level = EXCLUDED.feeling_level,
                updated_at = now()
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.patient_id)
        .bind(entry.date)
        .bind(entry.weight)
        .bind(entry.measurements.waist)
        .bind(entry.measurements.bmi)
        .bind(&entry.notes)
        .bind(entry.adherence_score)
        .bind(entry.feeling_level)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

pub async fn find_patient_by_email(
    pool: &PgPool,
    email: &str,
) -> anyhow::Result<Option<PatientRecord>> {
    let row = sqlx::query("SELECT id, full_name, email FROM clinic.patients WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    row.map(|row| patient_from_row(&row)).transpose()
}

pub async fn find_patient_by_id(pool: &PgPool, id: Uuid) -> anyhow::Result<Option<PatientRecord>> {
    let row = sqlx::query("SELECT id, full_name, email FROM clinic.patients WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    row.map(|row| patient_from_row(&row)).transpose()
}

fn patient_from_row(row: &sqlx::postgres::PgRow) -> anyhow::Result<PatientRecord> {
    Ok(PatientRecord {
        id: row.try_get("id")?,
        full_name: row.try_get("full_name")?,
        email: row.try_get("email")?,
    })
}

/// Most recent progress-log entries first.
pub async fn fetch_progress_logs(
    pool: &PgPool,
    patient_id: Uuid,
    limit: i64,
) -> anyhow::Result<Vec<ProgressLogEntry>> {
    let rows = sqlx::query(
        r#"
        SELECT patient_id, entry_date, weight_kg, waist_cm, bmi, notes,
               adherence_score, feeling_level
        FROM clinic.progress_logs
        WHERE patient_id = $1
        ORDER BY entry_date DESC
        LIMIT $2
        "#,
    )
    .bind(patient_id)
    .bind(limit.max(1))
    .fetch_all(pool)
    .await?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        entries.push(ProgressLogEntry {
            patient_id: row.try_get("patient_id")?,
            date: row.try_get("entry_date")?,
            weight: row.try_get("weight_kg")?,
            measurements: LogMeasurements {
                waist: row.try_get("waist_cm")?,
                bmi: row.try_get("bmi")?,
            },
            notes: row.try_get("notes")?,
            adherence_score: row.try_get("adherence_score")?,
            feeling_level: row.try_get("feeling_level")?,
        });
    }

    Ok(entries)
}

async fn upsert_patient(
    pool: &PgPool,
    id: Uuid,
    full_name: &str,
    email: &str,
) -> anyhow::Result<Uuid> {
    let id: Uuid = sqlx::query(
        r#"
        INSERT INTO clinic.patients (id, full_name, email)
        VALUES ($1, $2, $3)
        ON CONFLICT (email) DO UPDATE
        SET full_name = EXCLUDED.full_name
        RETURNING id
        "#,
    )
    .bind(id)
    .bind(full_name)
    .bind(email)
    .fetch_one(pool)
    .await?
    .try_get("id")?;

    Ok(id)
}

struct NewRecord<'a> {
    patient_id: Uuid,
    record_date: NaiveDate,
    weight_kg: Option<f64>,
    height_m: Option<f64>,
    waist_cm: Option<f64>,
    reason: &'a str,
    source_key: &'a str,
}

/// Returns whether a row was written; records are deduplicated by source key.
async fn insert_record(pool: &PgPool, record: NewRecord<'_>) -> anyhow::Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO clinic.clinical_records
        (id, patient_id, record_date, weight_kg, height_m, waist_cm, reason, source_key)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (source_key) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(record.patient_id)
    .bind(record.record_date)
    .bind(record.weight_kg)
    .bind(record.height_m)
    .bind(record.waist_cm)
    .bind(record.reason)
    .bind(record.source_key)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

fn date(year: i32, month: u32, day: u32) -> anyhow::Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).context("invalid date")
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let maya = upsert_patient(
        pool,
        Uuid::parse_str("6b1f3c1e-8a0d-4f43-9d6e-2f4a7c51b0a1")?,
        "Maya Okafor",
        "maya.okafor@example-clinic.com",
    )
    .await?;
    let tomas = upsert_patient(
        pool,
        Uuid::parse_str("c2d94e77-51b3-4c8a-a0f2-7e13d6b8a942")?,
        "Tomas Lindqvist",
        "tomas.lindqvist@example-clinic.com",
    )
    .await?;

    let records = vec![
        (
            maya,
            "seed-maya-001",
            date(2026, 1, 12)?,
            Some(84.6),
            Some(1.68),
            Some(99.0),
            "Initial consultation",
        ),
        (
            maya,
            "seed-maya-002",
            date(2026, 2, 9)?,
            Some(83.1),
            Some(1.68),
            Some(97.5),
            "Monthly follow-up",
        ),
        (
            maya,
            "seed-maya-003",
            date(2026, 3, 9)?,
            Some(81.9),
            None,
            Some(95.0),
            "Monthly follow-up",
        ),
        (
            tomas,
            "seed-tomas-001",
            date(2026, 2, 2)?,
            Some(92.0),
            Some(1.82),
            Some(104.0),
            "Referral from GP",
        ),
        (
            tomas,
            "seed-tomas-002",
            date(2026, 3, 2)?,
            Some(93.1),
            Some(1.82),
            Some(105.5),
            "Follow-up, holiday season",
        ),
    ];

    for (patient_id, source_key, record_date, weight_kg, height_m, waist_cm, reason) in records {
        insert_record(
            pool,
            NewRecord {
                patient_id,
                record_date,
                weight_kg,
                height_m,
                waist_cm,
                reason,
                source_key,
            },
        )
        .await?;
    }

    let plans = vec![
        (
            Uuid::parse_str("0f6a2b9d-3c4e-4e71-8d2a-51c7e9b3f604")?,
            maya,
            "Mediterranean deficit",
            PlanStatus::Active,
            date(2026, 1, 12)?,
            date(2026, 7, 12)?,
            Some(1650),
            Some(serde_json::json!({ "protein_g": 110, "carbs_g": 170, "fat_g": 55 })),
        ),
        (
            Uuid::parse_str("9a4e6c21-7b8f-4d03-b5e1-3f2c8a6d7e90")?,
            tomas,
            "Low sodium starter",
            PlanStatus::Archived,
            date(2025, 10, 1)?,
            date(2025, 12, 31)?,
            Some(2200),
            None,
        ),
        (
            Uuid::parse_str("e37b5d10-2f9c-4a68-9c41-8b0d6e2a5f13")?,
            tomas,
            "Winter maintenance",
            PlanStatus::Active,
            date(2026, 2, 2)?,
            date(2026, 5, 2)?,
            Some(2000),
            None,
        ),
    ];

    for (id, patient_id, name, status, start_date, end_date, calories, macros) in plans {
        sqlx::query(
            r#"
            INSERT INTO clinic.diet_plans
            (id, patient_id, name, status, start_date, end_date,
             daily_calories_target, daily_macros_target)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(patient_id)
        .bind(name)
        .bind(status.as_str())
        .bind(start_date)
        .bind(end_date)
        .bind(calories)
        .bind(macros)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        full_name: String,
        email: String,
        record_date: NaiveDate,
        weight_kg: Option<f64>,
        height_m: Option<f64>,
        waist_cm: Option<f64>,
        reason: String,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("failed to open {}", csv_path.display()))?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let patient_id = upsert_patient(pool, Uuid::new_v4(), &row.full_name, &row.email).await?;
        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let written = insert_record(
            pool,
            NewRecord {
                patient_id,
                record_date: row.record_date,
                weight_kg: row.weight_kg,
                height_m: row.height_m,
                waist_cm: row.waist_cm,
                reason: &row.reason,
                source_key: &source_key,
            },
        )
        .await?;

        if written {
            inserted += 1;
        }
    }

    Ok(inserted)
}
