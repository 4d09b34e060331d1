pub mod label;
pub mod state;

pub use label::{DEFAULT_PALETTE, Label, LabelRegistry};
pub use state::AnnotationState;
