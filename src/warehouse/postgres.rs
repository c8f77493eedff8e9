use crate::models::{Metric, Property, PropertyValueOption};
use crate::warehouse::demo::{CatalogSeed, ComponentKind};
use crate::warehouse::rows::{into_properties, operators_json, PropertyRow};
use crate::warehouse::Warehouse;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

pub struct PostgresWarehouse {
    pool: Arc<PgPool>,
}

impl PostgresWarehouse {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }

    async fn component_properties(
        &self,
        analysis_type: &str,
        kind: ComponentKind,
    ) -> Result<Vec<Property>> {
        let rows = sqlx::query_as::<_, PropertyRow>(
            r#"
            SELECT component_id AS property_id,
                   component_label AS property_label,
                   group_label AS property_scope_label,
                   available_operators
            FROM report_components
            WHERE analysis_type = $1 AND component_kind = $2
            ORDER BY sort_order, component_id
            "#,
        )
        .bind(analysis_type)
        .bind(kind.as_str())
        .fetch_all(self.pool.as_ref())
        .await?;

        into_properties(rows)
    }
}

#[async_trait]
impl Warehouse for PostgresWarehouse {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS report_components (
                analysis_type TEXT NOT NULL,
                component_kind TEXT NOT NULL,
                component_id TEXT NOT NULL,
                component_label TEXT NOT NULL,
                group_label TEXT,
                available_operators TEXT NOT NULL DEFAULT '[]',
                has_filters BOOLEAN NOT NULL DEFAULT FALSE,
                sort_order BIGINT NOT NULL DEFAULT 0,
                PRIMARY KEY (analysis_type, component_kind, component_id)
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS metric_filter_properties (
                metric_id TEXT NOT NULL,
                property_id TEXT NOT NULL,
                property_label TEXT NOT NULL,
                property_scope_label TEXT,
                available_operators TEXT NOT NULL DEFAULT '[]',
                sort_order BIGINT NOT NULL DEFAULT 0,
                PRIMARY KEY (metric_id, property_id)
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS property_values_lookup (
                property_id TEXT NOT NULL,
                label TEXT NOT NULL,
                value TEXT NOT NULL,
                sort BIGINT NOT NULL DEFAULT 0,
                PRIMARY KEY (property_id, value)
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn is_empty(&self) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM report_components")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count == 0)
    }

    async fn seed(&self, catalog: &CatalogSeed) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for component in &catalog.components {
            sqlx::query(
                r#"
                INSERT INTO report_components (
                    analysis_type, component_kind, component_id, component_label,
                    group_label, available_operators, has_filters, sort_order
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                ON CONFLICT (analysis_type, component_kind, component_id) DO NOTHING
                "#,
            )
            .bind(&component.analysis_type)
            .bind(component.kind.as_str())
            .bind(&component.component_id)
            .bind(&component.label)
            .bind(&component.group_label)
            .bind(operators_json(&component.available_operators)?)
            .bind(component.has_filters)
            .bind(component.sort_order)
            .execute(&mut *tx)
            .await?;
        }

        for filter in &catalog.metric_filters {
            sqlx::query(
                r#"
                INSERT INTO metric_filter_properties (
                    metric_id, property_id, property_label, property_scope_label,
                    available_operators, sort_order
                )
                VALUES ($1, $2, $3, $4, $5, $6)
                ON CONFLICT (metric_id, property_id) DO NOTHING
                "#,
            )
            .bind(&filter.metric_id)
            .bind(&filter.property.property_id)
            .bind(&filter.property.property_label)
            .bind(&filter.property.property_scope_label)
            .bind(operators_json(&filter.property.available_operators)?)
            .bind(filter.sort_order)
            .execute(&mut *tx)
            .await?;
        }

        for value in &catalog.values {
            sqlx::query(
                r#"
                INSERT INTO property_values_lookup (property_id, label, value, sort)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT(property_id, value) DO NOTHING
                "#,
            )
            .bind(&value.property_id)
            .bind(&value.label)
            .bind(&value.value)
            .bind(value.sort)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn analysis_types(&self) -> Result<Vec<String>> {
        let types = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT analysis_type FROM report_components ORDER BY analysis_type",
        )
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(types)
    }

    async fn filters_for_type(&self, analysis_type: &str) -> Result<Vec<Property>> {
        self.component_properties(analysis_type, ComponentKind::Filter)
            .await
    }

    async fn segmentations_for_type(&self, analysis_type: &str) -> Result<Vec<Property>> {
        self.component_properties(analysis_type, ComponentKind::Segmentation)
            .await
    }

    async fn metrics_for_type(&self, analysis_type: &str) -> Result<Vec<Metric>> {
        let metrics = sqlx::query_as::<_, Metric>(
            r#"
            SELECT component_id AS metric_id,
                   component_label AS metric_label,
                   group_label AS metric_group_label,
                   has_filters
            FROM report_components
            WHERE analysis_type = $1 AND component_kind = $2
            ORDER BY sort_order, component_id
            "#,
        )
        .bind(analysis_type)
        .bind(ComponentKind::Metric.as_str())
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(metrics)
    }

    async fn property_values(&self, property_id: &str) -> Result<Vec<PropertyValueOption>> {
        let options = sqlx::query_as::<_, PropertyValueOption>(
            "SELECT label, value FROM property_values_lookup WHERE property_id = $1 ORDER BY sort, label",
        )
        .bind(property_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(options)
    }

    async fn filters_for_metric(&self, metric_id: &str) -> Result<Vec<Property>> {
        let rows = sqlx::query_as::<_, PropertyRow>(
            r#"
            SELECT property_id, property_label, property_scope_label, available_operators
            FROM metric_filter_properties
            WHERE metric_id = $1
            ORDER BY sort_order, property_id
            "#,
        )
        .bind(metric_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        into_properties(rows)
    }
}
