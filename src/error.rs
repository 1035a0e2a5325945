use mongodb::error::Error as DbError;
use rocket::{http::Status, response::Responder};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every distinguishable failure the election engine can produce.
///
/// Persistence failures are wrapped in [`Error::Db`] and surfaced as a
/// generic 500; everything else maps to a specific status code.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Db(#[from] DbError),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Already acted: {0}")]
    AlreadyActed(String),
    #[error("Limit reached: {0}")]
    LimitReached(String),
    #[error("Election inactive: {0}")]
    ElectionInactive(String),
}

impl<'r, 'o: 'r> Responder<'r, 'o> for Error {
    fn respond_to(self, _: &'r rocket::Request<'_>) -> rocket::response::Result<'o> {
        Err(match self {
            Self::Db(ref err) => {
                // Log the detail, leak nothing.
                error!("Database error: {err}");
                Status::InternalServerError
            }
            Self::NotFound(ref msg) => {
                info!("{msg}");
                Status::NotFound
            }
            Self::Forbidden(ref msg) => {
                warn!("{msg}");
                Status::Forbidden
            }
            Self::InvalidConfiguration(ref msg) => {
                info!("{msg}");
                Status::UnprocessableEntity
            }
            Self::AlreadyActed(ref msg) | Self::LimitReached(ref msg) => {
                info!("{msg}");
                Status::Conflict
            }
            Self::ElectionInactive(ref msg) => {
                info!("{msg}");
                Status::Conflict
            }
        })
    }
}
