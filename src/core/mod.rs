// Core engine exports
pub mod engine;
pub mod pair;

pub use engine::{
    CatalogError, DirectoryError, MatchStore, NotificationSink, RecipeCatalog, SinkError,
    StoreError, SwipeEngine, SwipeError, UserDirectory,
};
pub use pair::{ordered_pair, pair_key};
