pub mod compose;
pub mod config;
pub mod error;
pub mod http;
pub mod model;
pub mod overlay;
pub mod pipeline;
pub mod providers;
pub mod publish;
pub mod platform {
    pub mod connectivity;
    pub mod usb_gadget;
}
pub mod processing {
    pub mod layout;
    pub mod orientation;
    pub mod resize;
    pub mod rotate;
}
pub mod tasks {
    pub mod scheduler;
}

pub use error::{Error, Result};
pub use pipeline::{DisplayPipeline, RunOutcome};
