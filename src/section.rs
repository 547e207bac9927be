use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{Build, Rocket, State};
use sqlx::{Sqlite, Transaction};
use crate::db::DbPool;
use crate::error::Error;
use crate::event::EventId;
use crate::util::status_sqlx_error;

pub(crate) async fn create_sections(event_id: EventId, section_count: i64, txn: &mut Transaction<'_, Sqlite>) -> Result<(), Error> {
    for section_number in 1..=section_count {
        sqlx::query("INSERT INTO sections (event_id, section_number) VALUES (?, ?)")
            .bind(event_id)
            .bind(section_number)
            .execute(&mut **txn)
            .await?;
    }
    Ok(())
}

#[get("/api/event/<event_id>/section")]
async fn get_sections(event_id: EventId, db: &State<DbPool>) -> Result<Json<Vec<i64>>, Custom<String>> {
    let numbers = sqlx::query_as::<_, (i64,)>("SELECT section_number FROM sections WHERE event_id=? ORDER BY section_number")
        .bind(event_id)
        .fetch_all(&db.0)
        .await
        .map_err(status_sqlx_error)?;
    Ok(Json(numbers.into_iter().map(|n| n.0).collect()))
}

pub fn extend(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount("/", routes![
            get_sections,
        ])
}
