mod loader;
mod model;

pub use loader::{load_collection_file, parse_collection};
pub use model::{
    count_requests, BodySpec, Collection, CollectionInfo, CollectionNode, KeyValue, Port,
    RequestSpec, Segments, UrlParts, UrlSpec,
};
