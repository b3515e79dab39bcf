use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use quartermaster_engine::{CatalogApiError, LedgerError, PlayerApiError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("Could not read request body: {0}")]
    InvalidRequestBody(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("The data was not found. {0}")]
    NoRecordFound(String),
    #[error("{0}")]
    OrderFlowError(#[from] LedgerError),
    #[error("{0}")]
    PlayerError(#[from] PlayerApiError),
    #[error("{0}")]
    CatalogError(#[from] CatalogApiError),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::OrderFlowError(e) => match e {
                LedgerError::ItemNotFound(_) |
                LedgerError::TaxiNotFound(_) |
                LedgerError::PlayerNotFound(_) |
                LedgerError::OrderNotFound(_) => StatusCode::NOT_FOUND,
                LedgerError::InvalidQuantity(_) |
                LedgerError::InvalidAmount(_) |
                LedgerError::InsufficientFunds { .. } |
                LedgerError::SelfTransfer |
                LedgerError::InvalidCoordinate(_) => StatusCode::BAD_REQUEST,
                LedgerError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
                LedgerError::InvalidStatusChange { .. } => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::PlayerError(e) => match e {
                PlayerApiError::PlayerNotFound(_) => StatusCode::NOT_FOUND,
                PlayerApiError::QueryError(_) => StatusCode::BAD_REQUEST,
                PlayerApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::CatalogError(e) => match e {
                CatalogApiError::ItemNotFound(_) |
                CatalogApiError::ItemNameNotFound(_) |
                CatalogApiError::TaxiNotFound(_) => StatusCode::NOT_FOUND,
                CatalogApiError::DuplicateName(_) => StatusCode::CONFLICT,
                CatalogApiError::InvalidContent(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::InitializeError(_) | Self::BackendError(_) | Self::IOError(_) | Self::Unspecified(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(serde_json::json!({ "error": self.to_string() }).to_string())
    }
}
