//! Editor-facing value types.

pub mod region;
pub mod text_change;

pub use region::Region;
pub use text_change::{DocumentId, DocumentSnapshot, TextChange, TextChangedEvent, TextPosition};
