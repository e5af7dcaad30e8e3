use thiserror::Error;
use uuid::Uuid;

/// Failures raised by the history readers and the progress-log sink.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to read {what} for patient {patient_id}")]
    UpstreamRead {
        what: &'static str,
        patient_id: Uuid,
        #[source]
        source: StoreError,
    },
}
