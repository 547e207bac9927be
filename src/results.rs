use anyhow::anyhow;
use rocket::http::ContentType;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{Build, Rocket, State};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use crate::db::DbPool;
use crate::error::Error;
use crate::event::EventId;
use crate::util::status_any_error;

#[derive(Serialize, Deserialize, FromRow, Clone, Debug)]
pub struct ResultRecord {
    pub rider_number: i64,
    pub rider_name: String,
    pub class_name: String,
    pub total_score: i64,
}

/// Ranked event summary: class priority first (class ids follow the
/// M, E, I, C order), then ascending penalty total, then rider number
/// to keep equal totals stable.
pub async fn load_results(event_id: EventId, db: &State<DbPool>) -> Result<Vec<ResultRecord>, Error> {
    let rows = sqlx::query_as::<_, ResultRecord>(
        "SELECT r.rider_number, r.rider_name, c.name AS class_name,
                COALESCE(SUM(s.score), 0) AS total_score
         FROM riders r
         JOIN classes c ON c.id = r.class_id
         LEFT JOIN scores s ON s.event_id = r.event_id AND s.rider_number = r.rider_number
         WHERE r.event_id=?
         GROUP BY r.rider_number, r.rider_name, c.id, c.name
         ORDER BY c.id, total_score, r.rider_number")
        .bind(event_id)
        .fetch_all(&db.0)
        .await?;
    Ok(rows)
}

pub fn results_table(rows: &[ResultRecord]) -> (Vec<&'static str>, Vec<Vec<String>>) {
    let columns = vec!["rider_number", "rider_name", "class", "total_score"];
    let table = rows.iter()
        .map(|row| vec![
            row.rider_number.to_string(),
            row.rider_name.clone(),
            row.class_name.clone(),
            row.total_score.to_string(),
        ])
        .collect();
    (columns, table)
}

fn results_csv(rows: &[ResultRecord]) -> anyhow::Result<Vec<u8>> {
    let (columns, table) = results_table(rows);
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.write_record(&columns)?;
    for row in &table {
        wtr.write_record(row)?;
    }
    Ok(wtr.into_inner().map_err(|e| anyhow!("{e}"))?)
}

#[get("/api/event/<event_id>/results")]
async fn get_results(event_id: EventId, db: &State<DbPool>) -> Result<Json<Vec<ResultRecord>>, Custom<String>> {
    Ok(Json(load_results(event_id, db).await?))
}

#[get("/api/event/<event_id>/results/csv")]
async fn get_results_csv(event_id: EventId, db: &State<DbPool>) -> Result<(ContentType, Vec<u8>), Custom<String>> {
    let rows = load_results(event_id, db).await?;
    let data = results_csv(&rows).map_err(status_any_error)?;
    Ok((ContentType::CSV, data))
}

pub fn extend(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount("/", routes![
            get_results,
            get_results_csv,
        ])
}
