pub mod client;
pub mod error;
mod retry;
pub mod types;

pub use client::{GraphClient, CREATIVE_FIELDS};
pub use error::GraphError;
pub use types::{
    AdImage, AssetFeedSpec, FeedImage, FeedVideo, LinkData, ObjectStorySpec, PhotoData, Preview,
    RawChildAttachment, RawCreative, VideoData, VideoDetail, VideoThumbnail,
};
