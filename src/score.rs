use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{Build, Rocket, State};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use crate::db::DbPool;
use crate::event::EventId;
use crate::util::status_sqlx_error;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PostedScore {
    pub event_id: EventId,
    pub section_number: i64,
    pub rider_number: i64,
    pub lap_number: i64,
    pub score: i64,
}

#[derive(Serialize, Deserialize, FromRow, Clone, Debug)]
pub struct LapScore {
    pub lap_number: i64,
    pub score: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ScoreChange {
    pub rows_affected: u64,
}

#[post("/api/score", data = "<posted>")]
async fn post_score(posted: Json<PostedScore>, db: &State<DbPool>) -> Result<Json<ScoreChange>, Custom<String>> {
    let res = sqlx::query("INSERT INTO scores (event_id, section_number, rider_number, lap_number, score) VALUES (?, ?, ?, ?, ?)")
        .bind(posted.event_id)
        .bind(posted.section_number)
        .bind(posted.rider_number)
        .bind(posted.lap_number)
        .bind(posted.score)
        .execute(&db.0)
        .await
        .map_err(status_sqlx_error)?;
    debug!("Score recorded: {:?}", posted.0);
    Ok(Json(ScoreChange { rows_affected: res.rows_affected() }))
}

#[put("/api/score", data = "<posted>")]
async fn put_score(posted: Json<PostedScore>, db: &State<DbPool>) -> Result<Json<ScoreChange>, Custom<String>> {
    // matching zero rows is not an error, the caller inspects rows_affected
    let res = sqlx::query("UPDATE scores SET score=? WHERE event_id=? AND section_number=? AND rider_number=? AND lap_number=?")
        .bind(posted.score)
        .bind(posted.event_id)
        .bind(posted.section_number)
        .bind(posted.rider_number)
        .bind(posted.lap_number)
        .execute(&db.0)
        .await
        .map_err(status_sqlx_error)?;
    Ok(Json(ScoreChange { rows_affected: res.rows_affected() }))
}

#[get("/api/event/<event_id>/score?<section_number>&<rider_number>")]
async fn get_scores(event_id: EventId, section_number: i64, rider_number: i64, db: &State<DbPool>) -> Result<Json<Vec<LapScore>>, Custom<String>> {
    let scores = sqlx::query_as::<_, LapScore>(
        "SELECT lap_number, score FROM scores WHERE event_id=? AND section_number=? AND rider_number=?")
        .bind(event_id)
        .bind(section_number)
        .bind(rider_number)
        .fetch_all(&db.0)
        .await
        .map_err(status_sqlx_error)?;
    Ok(Json(scores))
}

pub fn extend(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount("/", routes![
            post_score,
            put_score,
            get_scores,
        ])
}
