pub mod background;
pub mod coefficients;
pub mod constants;
pub mod grid;
pub mod irtam;
pub mod irtam_errors;
pub mod profile;
pub mod reconcile;
pub mod surface;
pub mod synthesis;
pub mod time;

pub use irtam::{IrtamRun, RunConfig, RunOutput};
pub use irtam_errors::IrtamError;
