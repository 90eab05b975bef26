use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No network segments found in the search region around the point")]
    NoNetworkNearby,
    #[error("Failed to snap point to network within {max_distance} units")]
    NoSnap { max_distance: f64 },
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Geometry error: {0}")]
    Geometry(String),
    #[error("Projection error: {0}")]
    Projection(String),
    #[error("Network source error: {0}")]
    Source(String),
    #[error("Isochrone worker panicked: {0}")]
    WorkerPanic(String),
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
    #[error("GeoJSON error: {0}")]
    GeoJson(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short machine readable code used in failure slots.
    pub fn code(&self) -> &'static str {
        match self {
            Error::NoNetworkNearby => "no-network-nearby",
            Error::NoSnap { .. } => "no-snap",
            Error::WorkerPanic(_) => "worker-panic",
            _ => "pipeline-failure",
        }
    }
}
