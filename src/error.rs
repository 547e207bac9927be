use rocket::http::Status;
use rocket::response::status::Custom;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{0}")]
    Validation(String),
    #[error("Duplicate number {number} for {name}, {class}")]
    DuplicateRider { number: i64, name: String, class: String },
    #[error("{0}")]
    NotFound(String),
    #[error("Storage error: {0}")]
    Storage(#[source] sqlx::Error),
}

impl Error {
    pub fn status(&self) -> Status {
        match self {
            Error::Validation(_) | Error::DuplicateRider { .. } => Status::BadRequest,
            Error::NotFound(_) => Status::NotFound,
            Error::Storage(_) => Status::InternalServerError,
        }
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Row not found".to_string()),
            err => Error::Storage(err),
        }
    }
}

impl From<Error> for Custom<String> {
    fn from(err: Error) -> Self {
        if let Error::Storage(_) = &err {
            error!("{err}");
        }
        Custom(err.status(), err.to_string())
    }
}
