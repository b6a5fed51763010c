//! Cargo listing queries with dynamic filtering and sorting.

use anyhow::Result;
use chrono::NaiveDate;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use crate::filters::{FilterState, SortBy, SortOrder, Tab, Urgency};
use crate::models::cargo::{Cargo, NewCargo};

const CARGO_COLUMNS: &str = "id, owner_id, title, company_name, origin_address, origin_lat, \
     origin_lng, destination_address, destination_lat, destination_lng, vehicle_type, \
     weight_kg, volume_m3, price_eur, urgency, load_date, created_at";

#[derive(Clone)]
pub struct CargoRepository {
    pool: PgPool,
}

impl CargoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists loads matching `filters`, paginated, together with the total
    /// match count. `reference` carries the geocoded search location; without
    /// it the radius filter is skipped and a proximity sort falls back to
    /// newest-first.
    pub async fn list(
        &self,
        filters: &FilterState,
        viewer_id: Uuid,
        reference: Option<(f64, f64)>,
    ) -> Result<(Vec<Cargo>, i64)> {
        let mut query = QueryBuilder::new(format!("SELECT {CARGO_COLUMNS}"));
        if let Some((lat, lng)) = reference {
            query.push(", ");
            push_distance_expr(&mut query, lat, lng);
            query.push(" AS distance_km");
        }
        query.push(" FROM cargo_loads WHERE 1=1");
        push_filter_conditions(&mut query, filters, viewer_id, reference);
        push_order(&mut query, filters, reference);

        let offset = (filters.page - 1) as i64 * filters.limit as i64;
        query.push(" LIMIT ");
        query.push_bind(filters.limit as i64);
        query.push(" OFFSET ");
        query.push_bind(offset);

        let rows = query.build().fetch_all(&self.pool).await?;
        let items = rows.iter().map(map_cargo_row).collect();

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM cargo_loads WHERE 1=1");
        push_filter_conditions(&mut count, filters, viewer_id, reference);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        Ok((items, total))
    }

    pub async fn create(
        &self,
        owner_id: Uuid,
        cargo: &NewCargo,
        origin: Option<(f64, f64)>,
        destination: Option<(f64, f64)>,
    ) -> Result<Cargo> {
        let sql = format!(
            r#"
            INSERT INTO cargo_loads (
                owner_id, title, company_name, origin_address, origin_lat, origin_lng,
                destination_address, destination_lat, destination_lng, vehicle_type,
                weight_kg, volume_m3, price_eur, urgency, load_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {CARGO_COLUMNS}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(owner_id)
            .bind(cargo.title.trim())
            .bind(cargo.company_name.as_deref().map(str::trim))
            .bind(cargo.origin_address.trim())
            .bind(origin.map(|(lat, _)| lat))
            .bind(origin.map(|(_, lng)| lng))
            .bind(cargo.destination_address.trim())
            .bind(destination.map(|(lat, _)| lat))
            .bind(destination.map(|(_, lng)| lng))
            .bind(cargo.vehicle_type.trim())
            .bind(cargo.weight_kg)
            .bind(cargo.volume_m3)
            .bind(cargo.price_eur)
            .bind(cargo.urgency.unwrap_or(Urgency::Medium).as_str())
            .bind(cargo.load_date)
            .fetch_one(&self.pool)
            .await?;

        Ok(map_cargo_row(&row))
    }
}

fn push_filter_conditions(
    query: &mut QueryBuilder<'_, Postgres>,
    filters: &FilterState,
    viewer_id: Uuid,
    reference: Option<(f64, f64)>,
) {
    if filters.tab == Tab::MyCargo {
        query.push(" AND owner_id = ");
        query.push_bind(viewer_id);
    }

    let vehicle_types = filters.all_vehicle_types();
    if !vehicle_types.is_empty() {
        query.push(" AND vehicle_type = ANY(");
        query.push_bind(vehicle_types);
        query.push(")");
    }

    if let Some(price_min) = filters.price_min {
        query.push(" AND price_eur >= ");
        query.push_bind(price_min);
    }
    if let Some(price_max) = filters.price_max {
        query.push(" AND price_eur <= ");
        query.push_bind(price_max);
    }

    if let Some(urgency) = filters.urgency {
        query.push(" AND urgency = ");
        query.push_bind(urgency.as_str());
    }

    // Date strings travel opaquely through the codec; an unparseable one
    // simply drops the condition.
    if let Some(date) = filters.date_from.as_deref().and_then(parse_date) {
        query.push(" AND load_date >= ");
        query.push_bind(date);
    }
    if let Some(date) = filters.date_to.as_deref().and_then(parse_date) {
        query.push(" AND load_date <= ");
        query.push_bind(date);
    }

    if let Some(q) = &filters.q {
        let pattern = format!("%{}%", q);
        query.push(" AND (title ILIKE ");
        query.push_bind(pattern.clone());
        query.push(" OR company_name ILIKE ");
        query.push_bind(pattern);
        query.push(")");
    }

    if let (Some((lat, lng)), Some(radius)) = (reference, filters.radius_km) {
        query.push(" AND ");
        push_distance_expr(query, lat, lng);
        query.push(" <= ");
        query.push_bind(radius as f64);
    }
}

fn push_order(
    query: &mut QueryBuilder<'_, Postgres>,
    filters: &FilterState,
    reference: Option<(f64, f64)>,
) {
    let direction = match filters.sort_order {
        SortOrder::Asc => " ASC",
        SortOrder::Desc => " DESC",
    };
    match (filters.sort_by, reference) {
        // Proximity mode always ranks nearest first; rows without origin
        // coordinates sort last.
        (SortBy::Distance, Some((lat, lng))) => {
            query.push(" ORDER BY ");
            push_distance_expr(query, lat, lng);
            query.push(" ASC");
        }
        (SortBy::Price, _) => {
            query.push(" ORDER BY price_eur");
            query.push(direction);
            query.push(", created_at DESC");
        }
        _ => {
            query.push(" ORDER BY created_at");
            query.push(direction);
        }
    }
}

/// Haversine great-circle distance from the reference point to the load
/// origin, in kilometers. 12742 is the Earth diameter.
fn push_distance_expr(query: &mut QueryBuilder<'_, Postgres>, lat: f64, lng: f64) {
    query.push("(12742 * asin(sqrt(power(sin(radians(origin_lat - ");
    query.push_bind(lat);
    query.push(") / 2), 2) + cos(radians(");
    query.push_bind(lat);
    query.push(")) * cos(radians(origin_lat)) * power(sin(radians(origin_lng - ");
    query.push_bind(lng);
    query.push(") / 2), 2))))");
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

fn map_cargo_row(row: &PgRow) -> Cargo {
    Cargo {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        title: row.get("title"),
        company_name: row.get("company_name"),
        origin_address: row.get("origin_address"),
        origin_lat: row.get("origin_lat"),
        origin_lng: row.get("origin_lng"),
        destination_address: row.get("destination_address"),
        destination_lat: row.get("destination_lat"),
        destination_lng: row.get("destination_lng"),
        vehicle_type: row.get("vehicle_type"),
        weight_kg: row.get("weight_kg"),
        volume_m3: row.get("volume_m3"),
        price_eur: row.get("price_eur"),
        urgency: Urgency::from_param(&row.get::<String, _>("urgency")).unwrap_or(Urgency::Medium),
        load_date: row.get("load_date"),
        distance_km: row.try_get("distance_km").unwrap_or(None),
        created_at: row.get("created_at"),
    }
}
