pub mod types;

pub use types::{
    ExtractedDocument, FilteredResult, ImageAsset, ImageFormat, PageWarning, ReportArtifact,
    ReportFormat, SearchMode, SearchSpec, UnknownVariant,
};
