use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error("polygon must have at least one vertex")]
    EmptyPolygon,

    #[error("vertex {index} has a non-finite coordinate ({latitude}, {longitude})")]
    NonFinite {
        index: usize,
        latitude: f64,
        longitude: f64,
    },
}
