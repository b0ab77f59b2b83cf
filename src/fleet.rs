//! Driving many objects' forests step by step under admission control.
//!
//! Objects are independent, so each step updates them in parallel on a
//! dedicated worker pool. At most `max_in_flight` object updates run at once;
//! the next batch is admitted only after the current one has joined, which
//! bounds the memory held by in-flight expansion passes.

use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;

use crate::config::ForestConfig;
use crate::diagnostics::Anomalies;
use crate::error::ForestError;
use crate::forest::{NaiveForest, PredictiveForest, StepForest};
use crate::graph::{Coordinate, RoadNetwork};

/// Aggregate outcome of one fleet step.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepReport {
    /// Fleet step that produced this report (0-based).
    pub step: usize,
    /// Observation radius used.
    pub radius_m: f64,
    /// Objects tracked.
    pub objects: usize,
    /// Objects updated in this step.
    pub updated: usize,
    /// Objects whose update stream has aborted so far.
    pub aborted: usize,
    /// Mean wall time per updated object, in microseconds.
    pub mean_update_micros: f64,
    /// Regional nodes retained across all objects.
    pub historic_nodes: usize,
    /// Lookahead-tree nodes across all objects.
    pub predictive_nodes: usize,
}

#[derive(Debug, Clone, Copy)]
enum Outcome {
    Updated { micros: f64 },
    Idle,
    Aborted,
}

/// One object's forest plus its stream status.
#[derive(Debug)]
pub struct TrackedObject<F> {
    forest: F,
    failure: Option<ForestError>,
}

impl<F: StepForest> TrackedObject<F> {
    fn new(forest: F) -> Self {
        Self {
            forest,
            failure: None,
        }
    }

    /// The object's forest.
    pub fn forest(&self) -> &F {
        &self.forest
    }

    /// The error that aborted this object's stream, if any.
    pub fn failure(&self) -> Option<&ForestError> {
        self.failure.as_ref()
    }

    fn advance(&mut self, radius_m: f64) -> Outcome {
        if self.failure.is_some() {
            return Outcome::Idle;
        }
        let started = Instant::now();
        match self.forest.update_next(radius_m) {
            Ok(true) => Outcome::Updated {
                micros: started.elapsed().as_secs_f64() * 1e6,
            },
            Ok(false) => Outcome::Idle,
            Err(err) => {
                tracing::warn!(%err, "object update stream aborted");
                self.failure = Some(err);
                Outcome::Aborted
            }
        }
    }
}

/// A set of independently tracked objects.
pub struct Fleet<F> {
    objects: Vec<TrackedObject<F>>,
    radius_m: f64,
    max_in_flight: usize,
    pool: rayon::ThreadPool,
    anomalies: Arc<Anomalies>,
    step: usize,
}

impl<F: StepForest> Fleet<F> {
    /// Tracks `forests` under `config`, keeping at most `config.max_objects`.
    ///
    /// # Errors
    /// - [`ForestError::InvalidConfig`] if `config` fails validation
    /// - [`ForestError::WorkerPool`] if the worker pool cannot be created
    pub fn new(forests: impl IntoIterator<Item = F>, config: &ForestConfig) -> Result<Self, ForestError> {
        Self::with_anomalies(forests, config, Arc::new(Anomalies::new()))
    }

    fn with_anomalies(
        forests: impl IntoIterator<Item = F>,
        config: &ForestConfig,
        anomalies: Arc<Anomalies>,
    ) -> Result<Self, ForestError> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.worker_threads)
            .thread_name(|i| format!("roadcast-worker-{i}"))
            .build()
            .map_err(|e| ForestError::WorkerPool(e.to_string()))?;

        let objects: Vec<TrackedObject<F>> = forests
            .into_iter()
            .take(config.max_objects.unwrap_or(usize::MAX))
            .map(TrackedObject::new)
            .collect();
        tracing::info!(objects = objects.len(), "fleet initialized");

        Ok(Self {
            objects,
            radius_m: config.radius_m,
            max_in_flight: config.max_in_flight,
            pool,
            anomalies,
            step: 0,
        })
    }

    /// Number of tracked objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns `true` if no object is tracked.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Tracked objects in insertion order.
    pub fn objects(&self) -> &[TrackedObject<F>] {
        &self.objects
    }

    /// Anomaly counters shared by forests built through the fleet constructors.
    pub fn anomalies(&self) -> &Arc<Anomalies> {
        &self.anomalies
    }

    /// Number of steps applied.
    pub fn step(&self) -> usize {
        self.step
    }

    /// Advances every live object by one recorded location.
    pub fn advance(&mut self) -> StepReport {
        let radius_m = self.radius_m;
        let pool = &self.pool;

        let mut outcomes = Vec::with_capacity(self.objects.len());
        for batch in self.objects.chunks_mut(self.max_in_flight) {
            let batch_outcomes: Vec<Outcome> =
                pool.install(|| batch.par_iter_mut().map(|o| o.advance(radius_m)).collect());
            outcomes.extend(batch_outcomes);
        }

        let (updated, total_micros) = outcomes.iter().fold((0usize, 0.0f64), |(n, t), o| match o {
            Outcome::Updated { micros } => (n + 1, t + micros),
            Outcome::Idle | Outcome::Aborted => (n, t),
        });
        let newly_aborted = outcomes.iter().filter(|o| matches!(o, Outcome::Aborted)).count();

        #[allow(clippy::cast_precision_loss)]
        let mean_update_micros = if updated == 0 { 0.0 } else { total_micros / updated as f64 };

        let report = StepReport {
            step: self.step,
            radius_m,
            objects: self.objects.len(),
            updated,
            aborted: self.objects.iter().filter(|o| o.failure.is_some()).count(),
            mean_update_micros,
            historic_nodes: self.objects.iter().map(|o| o.forest.historic_node_count()).sum(),
            predictive_nodes: self.objects.iter().map(|o| o.forest.expansion().node_count()).sum(),
        };
        tracing::info!(
            step = report.step,
            updated,
            newly_aborted,
            mean_update_micros,
            historic_nodes = report.historic_nodes,
            predictive_nodes = report.predictive_nodes,
            "fleet step complete"
        );

        self.step += 1;
        report
    }

    /// Runs `steps` fleet steps and collects their reports.
    pub fn run(&mut self, steps: usize) -> Vec<StepReport> {
        (0..steps).map(|_| self.advance()).collect()
    }
}

/// Keeps trajectories long enough to cover the lookahead depth.
fn usable(trajectories: impl IntoIterator<Item = Vec<Coordinate>>, depth: usize) -> impl Iterator<Item = Vec<Coordinate>> {
    trajectories.into_iter().filter(move |t| t.len() >= depth)
}

impl Fleet<PredictiveForest> {
    /// One [`PredictiveForest`] per trajectory of at least `config.depth` points.
    ///
    /// # Errors
    /// See [`Fleet::new`].
    pub fn predictive(
        network: &Arc<RoadNetwork>,
        trajectories: impl IntoIterator<Item = Vec<Coordinate>>,
        config: &ForestConfig,
    ) -> Result<Self, ForestError> {
        let anomalies = Arc::new(Anomalies::new());
        let shared = Arc::clone(&anomalies);
        let forests = usable(trajectories, config.depth).map(move |t| {
            PredictiveForest::from_config(Arc::clone(network), config, t).with_anomalies(Arc::clone(&shared))
        });
        Self::with_anomalies(forests, config, anomalies)
    }
}

impl Fleet<NaiveForest> {
    /// One [`NaiveForest`] per trajectory of at least `config.depth` points.
    ///
    /// # Errors
    /// See [`Fleet::new`].
    pub fn naive(
        network: &Arc<RoadNetwork>,
        trajectories: impl IntoIterator<Item = Vec<Coordinate>>,
        config: &ForestConfig,
    ) -> Result<Self, ForestError> {
        let anomalies = Arc::new(Anomalies::new());
        let shared = Arc::clone(&anomalies);
        let forests = usable(trajectories, config.depth).map(move |t| {
            NaiveForest::from_config(Arc::clone(network), config, t).with_anomalies(Arc::clone(&shared))
        });
        Self::with_anomalies(forests, config, anomalies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NodeId;

    fn corridor(len: u16) -> Arc<RoadNetwork> {
        let mut b = RoadNetwork::builder();
        for id in 1..=len {
            b.add_node(id, Coordinate::new(104.0 + f64::from(id) * 0.01, 30.0)).unwrap();
        }
        for id in 1..len {
            b.add_road(id, id + 1, 1.0, 1.0).unwrap();
        }
        Arc::new(b.build())
    }

    fn walk(net: &RoadNetwork, ids: &[NodeId]) -> Vec<Coordinate> {
        ids.iter().map(|&id| net.node(id).unwrap().location()).collect()
    }

    fn config() -> ForestConfig {
        ForestConfig {
            depth: 2,
            radius_m: 100.0,
            worker_threads: 2,
            max_in_flight: 2,
            ..ForestConfig::default()
        }
    }

    #[test]
    fn test_short_trajectories_are_skipped() {
        let net = corridor(6);
        let trips = vec![walk(&net, &[1, 2, 3]), walk(&net, &[4])];
        let fleet = Fleet::predictive(&net, trips, &config()).unwrap();
        assert_eq!(fleet.len(), 1);
    }

    #[test]
    fn test_max_objects_caps_fleet() {
        let net = corridor(6);
        let trips = vec![walk(&net, &[1, 2]); 5];
        let cfg = ForestConfig {
            max_objects: Some(3),
            ..config()
        };
        assert_eq!(Fleet::naive(&net, trips, &cfg).unwrap().len(), 3);
    }

    #[test]
    fn test_advance_updates_every_object_in_batches() {
        let net = corridor(8);
        let trips = vec![
            walk(&net, &[1, 2, 3]),
            walk(&net, &[3, 4, 5]),
            walk(&net, &[5, 6, 7]),
            walk(&net, &[8, 7, 6]),
            walk(&net, &[2, 3]),
        ];
        let mut fleet = Fleet::predictive(&net, trips, &config()).unwrap();

        let reports = fleet.run(4);
        assert_eq!(reports.len(), 4);
        assert_eq!(reports[0].updated, 5);
        assert_eq!(reports[1].updated, 5);
        assert_eq!(reports[2].updated, 4);
        assert_eq!(reports[3].updated, 0);
        assert!(reports.iter().all(|r| r.aborted == 0));
        assert!(reports[0].predictive_nodes > 0);
        assert_eq!(fleet.step(), 4);
        for object in fleet.objects() {
            assert_eq!(object.forest().current_step(), object.forest().locations().len());
        }
    }

    #[test]
    fn test_aborted_object_does_not_affect_others() {
        let net = corridor(6);
        let trips = vec![walk(&net, &[1, 2, 3]), walk(&net, &[4, 5, 6])];
        let mut fleet = Fleet::predictive(&net, trips, &config()).unwrap();
        fleet.advance();

        // Losing the history of one object makes its next step unrecoverable.
        fleet.objects[0].forest.region_mut().reset();

        let report = fleet.advance();
        assert_eq!(report.updated, 1);
        assert_eq!(report.aborted, 1);
        assert_eq!(
            fleet.objects()[0].failure(),
            Some(&ForestError::MissingPredecessorRegion { step: 1 })
        );
        assert!(fleet.objects()[1].failure().is_none());

        let report = fleet.advance();
        assert_eq!(report.updated, 1);
        assert_eq!(report.aborted, 1);
        assert_eq!(fleet.objects()[1].forest().current_step(), 3);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let net = corridor(3);
        let cfg = ForestConfig {
            max_in_flight: 0,
            ..config()
        };
        assert!(matches!(
            Fleet::naive(&net, Vec::new(), &cfg),
            Err(ForestError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_report_serializes() {
        let net = corridor(4);
        let mut fleet = Fleet::naive(&net, vec![walk(&net, &[1, 2])], &config()).unwrap();
        let report = fleet.advance();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["updated"], 1);
        assert_eq!(json["historic_nodes"], 0);
    }
}
