use rocket::http::ContentType;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{Build, Rocket, State};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, QueryBuilder, Sqlite, Transaction};
use crate::db::DbPool;
use crate::error::Error;
use crate::event::EventId;
use crate::roster::RosterRow;
use crate::util::status_sqlx_error;

pub type ClassId = i64;

const ROSTER_TEMPLATE_CSV: &str = "NUMBER,NAME,CLASS\n1,A. Rider,M\n2,B. Other,C\n";

#[derive(Serialize, Deserialize, FromRow, Clone, Debug)]
pub struct RiderRecord {
    pub rider_number: i64,
    pub rider_name: String,
    pub class: String,
}

pub(crate) async fn create_riders(event_id: EventId, rows: &[RosterRow], txn: &mut Transaction<'_, Sqlite>) -> Result<(), Error> {
    if rows.is_empty() {
        return Ok(());
    }
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("INSERT INTO riders (event_id, rider_number, rider_name, class_id) ");
    qb.push_values(rows, |mut b, row| {
        b.push_bind(event_id)
            .push_bind(row.number)
            .push_bind(row.name.as_str())
            .push_bind(row.class_id);
    });
    qb.build().execute(&mut **txn).await?;
    Ok(())
}

#[get("/api/event/<event_id>/rider")]
async fn get_riders(event_id: EventId, db: &State<DbPool>) -> Result<Json<Vec<RiderRecord>>, Custom<String>> {
    let riders = sqlx::query_as::<_, RiderRecord>(
        "SELECT r.rider_number, r.rider_name, c.name AS class
         FROM riders r
         JOIN classes c ON c.id = r.class_id
         WHERE r.event_id=?
         ORDER BY r.rider_number")
        .bind(event_id)
        .fetch_all(&db.0)
        .await
        .map_err(status_sqlx_error)?;
    Ok(Json(riders))
}

#[get("/api/roster/template")]
fn get_roster_template() -> (ContentType, &'static str) {
    (ContentType::CSV, ROSTER_TEMPLATE_CSV)
}

pub fn extend(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount("/", routes![
            get_riders,
            get_roster_template,
        ])
}
