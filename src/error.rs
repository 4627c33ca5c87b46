use thiserror::Error;

#[derive(Error, Debug)]
pub enum Co2Error {
    #[error(
        "Illegal calculation type: {0}\nValid options:\n  * MASS\n  * CELL_VOLUME\n  * ACTUAL_VOLUME\n  * ACTUAL_VOLUME_SIMPLIFIED"
    )]
    InvalidCalculationType(String),

    #[error("The following file(s) were not found:{}", bullet_list(.0))]
    FilesNotFound(Vec<String>),

    #[error("Lacking required properties to compute CO2 amounts:{}", bullet_list(.0))]
    MissingProperties(Vec<String>),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Validation: {0}")]
    Validation(String),

    #[error("InvalidData: {0}")]
    InvalidData(String),
}

pub type Co2Result<T> = Result<T, Co2Error>;

fn bullet_list(items: &[String]) -> String {
    items.iter().map(|item| format!("\n  * {item}")).collect()
}

#[cfg(feature = "python")]
impl From<Co2Error> for pyo3::PyErr {
    fn from(err: Co2Error) -> pyo3::PyErr {
        use pyo3::exceptions::{PyFileNotFoundError, PyRuntimeError, PyValueError};
        match err {
            Co2Error::InvalidCalculationType(_) => PyValueError::new_err(err.to_string()),
            Co2Error::FilesNotFound(_) => PyFileNotFoundError::new_err(err.to_string()),
            _ => PyRuntimeError::new_err(err.to_string()),
        }
    }
}
