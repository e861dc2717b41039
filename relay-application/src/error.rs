use relay_domain::error::RelayError;

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("domain: {0}")]
    Domain(#[from] RelayError),

    #[error("validation: field={field}, reason={reason}")]
    Validation { field: &'static str, reason: String },

    #[error("config: key={key}, reason={reason}")]
    Config { key: &'static str, reason: String },
}
