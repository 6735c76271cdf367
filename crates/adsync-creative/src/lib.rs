pub mod classify;
pub mod enrich;
pub mod normalize;
pub mod record;
pub mod resolver;
pub mod service;
pub mod store;

pub use classify::{classify, classify_assembly, classify_media, shape_of, CreativeShape};
pub use enrich::{enrich, EnrichOptions, MediaBundle};
pub use normalize::build_creative_record;
pub use record::{AssemblyMode, ChildAttachment, CreativeRecord, MediaType, ParseTagError};
pub use resolver::{MediaResolver, ResolvedImage, ResolvedVideo, VideoResolution};
pub use service::{CreativeService, ServiceError, ServiceOptions, SyncOutcome};
pub use store::{CreativeStore, MediaUpdate, StoreError};
