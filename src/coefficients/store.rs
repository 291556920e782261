//! # Per-run coefficient store
//!
//! [`CoefficientStore`] resolves a (parameter, instant) request to the record of
//! the nearest 15-minute epoch. Records are cached in memory for the lifetime of
//! the store, which is meant to be one run:
//!
//! - each key is fetched through the [`CoefficientSource`] at most once,
//! - a failed fetch or parse is remembered and replayed without touching the
//!   source again,
//! - successful records are shared as [`Arc<CoefficientRecord>`].
//!
//! The store is an explicit value owned by the caller; there is no global cache.
use std::{collections::HashMap, sync::Arc};

use hifitime::Epoch;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    coefficients::{
        source::{CoefficientSource, CoefficientSourceConfig},
        CoefficientRecord, IrtamParameter,
    },
    irtam_errors::IrtamError,
    time::CoeffEpoch,
};

/// Cache traffic counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Lookups answered from memory, including replayed failures.
    pub hits: usize,
    /// Calls made to the retrieval collaborator.
    pub fetches: usize,
    /// Keys whose fetch or parse failed.
    pub failures: usize,
}

#[derive(Debug, Clone, PartialEq)]
enum Failure {
    Unavailable(String),
    Malformed { origin: String, reason: String },
}

impl Failure {
    fn from_error(err: IrtamError) -> Self {
        match err {
            IrtamError::MalformedCoefficientFile { origin, reason } => {
                Failure::Malformed { origin, reason }
            }
            IrtamError::CoefficientUnavailable { reason, .. } => Failure::Unavailable(reason),
            other => Failure::Unavailable(other.to_string()),
        }
    }

    fn to_error(&self, parameter: IrtamParameter, epoch: CoeffEpoch) -> IrtamError {
        match self {
            Failure::Unavailable(reason) => IrtamError::CoefficientUnavailable {
                parameter,
                epoch,
                reason: reason.clone(),
            },
            Failure::Malformed { origin, reason } => IrtamError::MalformedCoefficientFile {
                origin: origin.clone(),
                reason: reason.clone(),
            },
        }
    }
}

#[derive(Debug, Clone)]
enum CacheSlot {
    Ready(Arc<CoefficientRecord>),
    Failed(Failure),
}

/// In-memory cache of coefficient records in front of a retrieval collaborator.
pub struct CoefficientStore {
    source: Box<dyn CoefficientSource>,
    cache: HashMap<(IrtamParameter, CoeffEpoch), CacheSlot>,
    stats: StoreStats,
}

impl CoefficientStore {
    pub fn new(source: Box<dyn CoefficientSource>) -> Self {
        CoefficientStore {
            source,
            cache: HashMap::new(),
            stats: StoreStats::default(),
        }
    }

    /// Build a store over the source described by `config`.
    pub fn from_config(config: &CoefficientSourceConfig) -> Result<Self, IrtamError> {
        Ok(CoefficientStore::new(config.build()?))
    }

    /// Record of `parameter` at the epoch nearest to `instant`.
    pub fn resolve(
        &mut self,
        parameter: IrtamParameter,
        instant: Epoch,
    ) -> Result<Arc<CoefficientRecord>, IrtamError> {
        self.resolve_epoch(parameter, CoeffEpoch::nearest(instant))
    }

    /// Record of `parameter` at an already quantized `epoch`.
    ///
    /// Return
    /// ------
    /// * The shared record, or the `CoefficientUnavailable` /
    ///   `MalformedCoefficientFile` error of the first attempt for this key.
    pub fn resolve_epoch(
        &mut self,
        parameter: IrtamParameter,
        epoch: CoeffEpoch,
    ) -> Result<Arc<CoefficientRecord>, IrtamError> {
        let key = (parameter, epoch);

        if let Some(slot) = self.cache.get(&key) {
            self.stats.hits += 1;
            return match slot {
                CacheSlot::Ready(record) => Ok(Arc::clone(record)),
                CacheSlot::Failed(failure) => Err(failure.to_error(parameter, epoch)),
            };
        }

        self.stats.fetches += 1;
        debug!("Fetching {parameter} coefficients at {epoch}");

        let loaded = self
            .source
            .fetch(parameter, &epoch)
            .and_then(|path| CoefficientRecord::read_file(&path, parameter, epoch));

        match loaded {
            Ok(record) => {
                let record = Arc::new(record);
                self.cache.insert(key, CacheSlot::Ready(Arc::clone(&record)));
                Ok(record)
            }
            Err(err) => {
                warn!("{err}");
                self.stats.failures += 1;
                let failure = Failure::from_error(err);
                let err = failure.to_error(parameter, epoch);
                self.cache.insert(key, CacheSlot::Failed(failure));
                Err(err)
            }
        }
    }

    /// Resolve a batch of epochs, one result per requested epoch.
    ///
    /// Repeated epochs are fetched once.
    pub fn resolve_many(
        &mut self,
        parameter: IrtamParameter,
        epochs: &[CoeffEpoch],
    ) -> Vec<Result<Arc<CoefficientRecord>, IrtamError>> {
        epochs
            .iter()
            .map(|epoch| self.resolve_epoch(parameter, *epoch))
            .collect()
    }

    /// Put an already built record in the cache, replacing any previous entry.
    pub fn insert(&mut self, record: CoefficientRecord) -> Arc<CoefficientRecord> {
        let record = Arc::new(record);
        self.cache.insert(
            (record.parameter(), record.epoch()),
            CacheSlot::Ready(Arc::clone(&record)),
        );
        record
    }

    pub fn contains(&self, parameter: IrtamParameter, epoch: CoeffEpoch) -> bool {
        matches!(
            self.cache.get(&(parameter, epoch)),
            Some(CacheSlot::Ready(_))
        )
    }

    pub fn stats(&self) -> StoreStats {
        self.stats
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
