//! The standard pipeline stages.
//!
//! Each stage wraps one or more external collaborator invocations with
//! a fixed positional argument order, ending with the run-correlation
//! tag. Stage internals (what a collaborator actually does) are out of
//! scope here; stages only sequence invocations and record outputs.

mod download;
mod events;
mod hodographs;
mod model;
mod placefiles;
mod transpose;

pub use download::DownloadStage;
pub use events::MetadataStage;
pub use hodographs::HodographsStage;
pub use model::ModelPlacefilesStage;
pub use placefiles::FastPlacefilesStage;
pub use transpose::TransposeStage;
