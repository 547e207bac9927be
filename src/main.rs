#[macro_use] extern crate rocket;
#[macro_use] extern crate log;

use crate::db::DbPoolFairing;
use crate::rider::ClassId;
use crate::roster::{class_id_for_code, DEFAULT_CLASS_CODE};

mod db;
mod error;
mod event;
mod results;
mod rider;
mod roster;
mod score;
mod section;
mod util;

pub struct AppConfig {
    pub default_class_id: ClassId,
}

#[launch]
fn rocket() -> _ {
    let rocket = rocket::build()
        .attach(DbPoolFairing());

    let default_class_code = rocket.figment()
        .extract_inner::<String>("default_class_code")
        .unwrap_or_else(|_| DEFAULT_CLASS_CODE.to_string());
    let default_class_id = class_id_for_code(&default_class_code).unwrap_or_else(|| {
        warn!("Unknown default_class_code: {default_class_code}, falling back to {DEFAULT_CLASS_CODE}");
        class_id_for_code(DEFAULT_CLASS_CODE).expect("fixed class table")
    });
    let rocket = rocket.manage(AppConfig { default_class_id });

    let rocket = event::extend(rocket);
    let rocket = section::extend(rocket);
    let rocket = rider::extend(rocket);
    let rocket = score::extend(rocket);
    results::extend(rocket)
}
