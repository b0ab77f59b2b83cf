//! # `roadcast` - Incremental Path-Prediction Forests
//!
//! Predicts the near-future path of objects moving over a road network. For
//! each object a [`PredictiveForest`] keeps a sliding window of per-step
//! region snapshots, prunes snapshots backwards when nodes lose every live
//! descendant, and rebuilds a bounded-depth lookahead forest from the
//! surviving nodes after every observation.
//!
//! ## Architecture
//!
//! 1. **Road network** ([`graph`]): an immutable arena of nodes and edges with
//!    a static KD spatial index. Shared by `Arc` across every forest and
//!    worker without locking.
//! 2. **Region window** ([`forest::Region`]): append-only snapshots of
//!    [`forest::RegionalNode`]s with an iterative backward prune and a
//!    monotonically growing obsolete set.
//! 3. **Lookahead forest** ([`forest::ExpansionForest`]): fork-join expansion
//!    of [`forest::PredictiveNode`] trees on a bounded rayon pool, indexed by
//!    level and root.
//! 4. **Fleet** ([`fleet::Fleet`]): many independent objects advanced in
//!    parallel under an in-flight admission cap.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use roadcast::{Coordinate, PredictiveForest, RoadNetwork, StepForest};
//!
//! let mut builder = RoadNetwork::builder();
//! for id in 1..=3u16 {
//!     builder.add_node(id, Coordinate::new(104.0 + f64::from(id) * 0.01, 30.0)).unwrap();
//! }
//! builder.add_road(1, 2, 1.0, 1.0).unwrap();
//! builder.add_road(2, 3, 1.0, 1.0).unwrap();
//! let network = Arc::new(builder.build());
//!
//! let mut forest = PredictiveForest::new(Arc::clone(&network), 2);
//! forest.update(Coordinate::new(104.01, 30.0), 100.0).unwrap();
//! forest.update(Coordinate::new(104.02, 30.0), 100.0).unwrap();
//!
//! let tree = forest.expansion().tree(2).unwrap();
//! assert_eq!(tree.children().map(|(id, _)| id).collect::<Vec<_>>(), vec![1, 3]);
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fleet;
pub mod forest;
pub mod graph;

pub use config::ForestConfig;
pub use diagnostics::Anomalies;
pub use error::{ForestError, NetworkError};
pub use fleet::{Fleet, StepReport, TrackedObject};
pub use forest::{
    ExpansionForest, NaiveForest, PredictiveForest, PredictiveNode, Region, RegionalNode, StepForest,
};
pub use graph::{Coordinate, NodeId, RoadNetwork, RoadNetworkBuilder};
