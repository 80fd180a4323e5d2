//! QTI test preview core
//!
//! Simulates a test-taking session for authors without a delivery backend:
//! - `TestMapBuilder` turns a test definition and its route into a `TestMap`
//! - `TestPreviewNavigator` moves through the map and keeps a `TestContext`
//! - `PreviewProxy` serves items, caches their state and serializes calls
//! - `PreviewSessionContext` answers the host runner's context contract
//!
//! Nothing is persisted; scoring and adaptive selection are out of scope.

pub mod builder;
pub mod categories;
pub mod config;
pub mod context;
pub mod definition;
pub mod error;
pub mod events;
pub mod item_cache;
pub mod map;
pub mod navigator;
pub mod proxy;
pub mod queue;
pub mod resolver;
pub mod session_context;
pub mod warnings;

pub use builder::TestMapBuilder;
pub use categories::{default_presets, CategoryOptionsResolver, CategoryPreset, ItemOptions};
pub use config::PreviewConfig;
pub use context::{SessionState, TestContext};
pub use definition::{
    ItemRef, ItemSessionControl, NavigationMode, PartRef, PreviewDocument, RouteEntry,
    SectionRef, TestDefinition,
};
pub use error::{PreviewError, Result};
pub use events::RunnerEvent;
pub use item_cache::{ItemCache, ItemCacheEntry};
pub use map::{Item, Jump, Part, Section, Stats, TestMap};
pub use navigator::{
    Direction, NavigationAction, NavigationRequest, NavigationResponse, NavigationScope,
    TestPreviewNavigator,
};
pub use proxy::PreviewProxy;
pub use queue::RequestQueue;
pub use resolver::{
    FsItemResolver, InMemoryItemResolver, ItemData, ItemResolver, LabelResolver, ResolvedItem,
    StaticLabelResolver,
};
pub use session_context::{
    ContextMethod, PreviewSessionContext, PreviewTestSession, RunnerServiceContext,
};
pub use warnings::{next_warning, NavigationWarning, WarningScope};
