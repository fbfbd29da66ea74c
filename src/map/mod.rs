//! Map state: the feature layer, viewport geometry, loading and inspection.

pub mod inspect;
pub mod layer;
pub mod loader;
pub mod view;

// Re-export commonly used items
pub use inspect::{describe_features, features_at_pixel, inspect_at};
pub use layer::{feature_bbox, FeatureSource};
pub use loader::{tag_feature, LoadOutcome, LoadSummary, ViewportLoader, API_PROPERTY};
pub use view::{from_mercator, to_mercator, Viewport};
