use chrono::{DateTime, NaiveDate, Utc};
use rocket::form::{Contextual, Form};
use rocket::http::Status;
use rocket::response::status::Custom;
use rocket::serde::json::Json;
use rocket::{Build, Rocket, State};
use serde::{Deserialize, Serialize};
use sqlx::{query, query_as, FromRow};
use crate::db::DbPool;
use crate::error::Error;
use crate::roster::{parse_roster, RosterRow};
use crate::util::status_sqlx_error;
use crate::{impl_sqlx_text_type_and_decode, rider, section, AppConfig};

pub type EventId = i64;

#[derive(PartialEq, Clone, Debug)]
pub struct EventPassword(pub(crate) String);
impl_sqlx_text_type_and_decode!(EventPassword);

#[derive(Serialize, Deserialize, FromRow, Clone, Debug)]
pub struct EventRecord {
    pub id: EventId,
    pub name: String,
    pub location: String,
    pub event_date: NaiveDate,
    pub lap_count: i64,
    pub completed: bool,
    pub protected: bool,
    pub date_created: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, FromRow, Clone, Debug)]
pub struct EventListRecord {
    pub id: EventId,
    pub name: String,
    pub location: String,
    pub event_date: NaiveDate,
    pub lap_count: i64,
    pub completed: bool,
    pub protected: bool,
    pub date_created: DateTime<Utc>,
    pub section_count: i64,
}

const EVENT_COLUMNS: &str = "id, name, location, event_date, lap_count, completed, \
                             password IS NOT NULL AS protected, date_created";

pub async fn load_event_info(event_id: EventId, db: &State<DbPool>) -> Result<EventRecord, Error> {
    let event = sqlx::query_as::<_, EventRecord>(&format!("SELECT {EVENT_COLUMNS} FROM events WHERE id=?"))
        .bind(event_id)
        .fetch_optional(&db.0)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Event id={event_id} not found")))?;
    Ok(event)
}

async fn list_events(completed: Option<bool>, db: &State<DbPool>) -> Result<Vec<EventListRecord>, Custom<String>> {
    let filter = match completed {
        None => "",
        Some(true) => "WHERE e.completed=1",
        Some(false) => "WHERE e.completed=0",
    };
    let sql = format!(
        "SELECT e.id, e.name, e.location, e.event_date, e.lap_count, e.completed,
                e.password IS NOT NULL AS protected, e.date_created,
                COUNT(s.section_number) AS section_count
         FROM events e
         LEFT JOIN sections s ON s.event_id = e.id
         {filter}
         GROUP BY e.id, e.name, e.location, e.event_date, e.lap_count, e.completed, e.password, e.date_created
         ORDER BY e.event_date");
    let events = sqlx::query_as::<_, EventListRecord>(&sql)
        .fetch_all(&db.0)
        .await
        .map_err(status_sqlx_error)?;
    Ok(events)
}

struct NewEvent<'a> {
    name: &'a str,
    location: &'a str,
    event_date: NaiveDate,
    lap_count: i64,
    section_count: i64,
    password: Option<&'a str>,
}

async fn create_event(event: &NewEvent<'_>, riders: &[RosterRow], db: &State<DbPool>) -> Result<EventId, Error> {
    let mut txn = db.0.begin().await?;
    let id: (i64,) = query_as("INSERT INTO events (name, location, event_date, lap_count, password) VALUES (?, ?, ?, ?, ?) RETURNING id")
        .bind(event.name)
        .bind(event.location)
        .bind(event.event_date)
        .bind(event.lap_count)
        .bind(event.password)
        .fetch_one(&mut *txn)
        .await?;
    let event_id = id.0;
    section::create_sections(event_id, event.section_count, &mut txn).await?;
    rider::create_riders(event_id, riders, &mut txn).await?;
    txn.commit().await?;
    info!("Event created, id: {event_id}, riders: {}", riders.len());
    Ok(event_id)
}

async fn event_drop(event_id: EventId, db: &State<DbPool>) -> Result<(), Error> {
    let mut txn = db.0.begin().await?;
    for tbl in &["scores", "riders", "sections"] {
        sqlx::query(&format!("DELETE FROM {tbl} WHERE event_id=?"))
            .bind(event_id)
            .execute(&mut *txn)
            .await?;
    }
    sqlx::query("DELETE FROM events WHERE id=?")
        .bind(event_id)
        .execute(&mut *txn)
        .await?;
    txn.commit().await?;
    Ok(())
}

fn parse_count(value: &str, what: &str) -> Result<i64, Error> {
    let count: i64 = value.trim().parse()
        .map_err(|_| Error::Validation(format!("{what} must be an integer")))?;
    if count < 1 {
        return Err(Error::Validation(format!("{what} must be at least 1")));
    }
    Ok(count)
}

#[derive(Debug, FromForm)]
struct CreateEventForm<'v> {
    name: &'v str,
    location: &'v str,
    date: &'v str,
    sections: &'v str,
    lap_count: &'v str,
    password: Option<&'v str>,
    roster: &'v [u8],
}

#[post("/api/event", data = "<form>")]
async fn post_event<'r>(form: Form<Contextual<'r, CreateEventForm<'r>>>, cfg: &State<AppConfig>, db: &State<DbPool>) -> Result<Json<EventRecord>, Custom<String>> {
    let vals = form.value.as_ref().ok_or(Custom(Status::BadRequest, "Form data invalid".to_string()))?;
    let event_date = vals.date.parse::<NaiveDate>()
        .map_err(|e| Custom(Status::BadRequest, format!("Unrecognized date string: {}, error: {e}", vals.date)))?;
    let section_count = parse_count(vals.sections, "Sections")?;
    let lap_count = parse_count(vals.lap_count, "Laps")?;
    // a bad roster must fail before anything is persisted
    let riders = parse_roster(vals.roster, cfg.default_class_id)?;
    let event = NewEvent {
        name: vals.name,
        location: vals.location,
        event_date,
        lap_count,
        section_count,
        password: vals.password.filter(|p| !p.is_empty()),
    };
    let event_id = create_event(&event, &riders, db).await?;
    let event = load_event_info(event_id, db).await?;
    Ok(Json(event))
}

#[get("/api/event/all")]
async fn get_events_all(db: &State<DbPool>) -> Result<Json<Vec<EventListRecord>>, Custom<String>> {
    Ok(Json(list_events(None, db).await?))
}

#[get("/api/event/upcoming")]
async fn get_events_upcoming(db: &State<DbPool>) -> Result<Json<Vec<EventListRecord>>, Custom<String>> {
    Ok(Json(list_events(Some(false), db).await?))
}

#[get("/api/event/completed")]
async fn get_events_completed(db: &State<DbPool>) -> Result<Json<Vec<EventListRecord>>, Custom<String>> {
    Ok(Json(list_events(Some(true), db).await?))
}

#[get("/api/event/<event_id>")]
async fn get_event(event_id: EventId, db: &State<DbPool>) -> Result<Json<EventRecord>, Custom<String>> {
    let event = load_event_info(event_id, db).await?;
    Ok(Json(event))
}

#[put("/api/event/<event_id>/complete")]
async fn put_event_complete(event_id: EventId, db: &State<DbPool>) -> Result<(), Custom<String>> {
    // idempotent, completing twice or completing a missing event matches zero rows
    query("UPDATE events SET completed=1 WHERE id=?")
        .bind(event_id)
        .execute(&db.0)
        .await
        .map_err(status_sqlx_error)?;
    Ok(())
}

#[delete("/api/event/<event_id>")]
async fn delete_event(event_id: EventId, db: &State<DbPool>) -> Result<(), Custom<String>> {
    event_drop(event_id, db).await?;
    info!("Event deleted, id: {event_id}");
    Ok(())
}

#[get("/api/event/<event_id>/validate?<password>")]
async fn get_event_validate(event_id: EventId, password: &str, db: &State<DbPool>) -> Result<Json<bool>, Custom<String>> {
    let stored = sqlx::query_as::<_, (Option<EventPassword>,)>("SELECT password FROM events WHERE id=?")
        .bind(event_id)
        .fetch_optional(&db.0)
        .await
        .map_err(status_sqlx_error)?
        .ok_or_else(|| Custom(Status::NotFound, format!("Event id={event_id} not found")))?;
    let valid = stored.0.map(|p| p.0 == password).unwrap_or(false);
    Ok(Json(valid))
}

pub fn extend(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount("/", routes![
            post_event,
            get_events_all,
            get_events_upcoming,
            get_events_completed,
            get_event,
            put_event_complete,
            delete_event,
            get_event_validate,
        ])
}
