pub mod feedback;
pub mod setup;
pub mod transcript;

pub use feedback::*;
pub use setup::*;
pub use transcript::*;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session already finished")]
    Finished,
}
