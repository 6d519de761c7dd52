use derive_more::derive::{Display, Error};

/// A specialized `Result` where the error is this crate's `Error` type.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Define a unified error type for this crate.
#[expect(missing_docs, reason = "The variants are self-explanatory.")]
#[derive(Debug, Display, Error)]
pub enum Error {
    // `#[error(not(source))]` below tells `derive_more` that
    // `embassy_executor::SpawnError` does not implement Rust's
    // `core::error::Error` trait.
    #[cfg(all(target_arch = "arm", target_os = "none"))]
    #[display("{_0:?}")]
    TaskSpawn(#[error(not(source))] embassy_executor::SpawnError),

    #[display("Target temperature {celsius}C out of range {min}C..={max}C")]
    TargetTemperatureOutOfRange { celsius: f32, min: f32, max: f32 },

    #[display("Outbound queue is full")]
    TxQueueFull,

    #[display("Format error")]
    FormatError,
}

impl From<core::fmt::Error> for Error {
    fn from(_: core::fmt::Error) -> Self {
        Self::FormatError
    }
}

#[cfg(all(target_arch = "arm", target_os = "none"))]
impl From<embassy_executor::SpawnError> for Error {
    fn from(err: embassy_executor::SpawnError) -> Self {
        Self::TaskSpawn(err)
    }
}
