//! Restaurant recompute job
//!
//! Fetches a restaurant's records, runs the engine on the blocking pool,
//! dispatches triggers and writes customers and the summary. Restaurants run
//! concurrently up to `worker.max_concurrent_restaurants`; a failed batch is
//! retried from scratch with exponential backoff.

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use guest_insights_config::WorkerConfig;
use guest_insights_core::{Customer, CustomerContact, ReviewRecord};
use guest_insights_engine::{
    validate_records, CustomerUpdate, EngineError, RestaurantBaselines, RestaurantSnapshot,
    TaggingEngine, TaggingOutcome,
};
use guest_insights_persistence::{
    CustomerSink, PersistenceError, RecordSource, TagStateStore, TimeRange, TriggerDispatcher,
};

use crate::telemetry;

/// The storage seams a job reads from and writes to
#[derive(Clone)]
pub struct Stores {
    pub source: Arc<dyn RecordSource>,
    pub tag_state: Arc<dyn TagStateStore>,
    pub sink: Arc<dyn CustomerSink>,
    pub dispatcher: Arc<dyn TriggerDispatcher>,
}

impl Stores {
    /// Use one backend for every seam
    pub fn shared<T>(store: Arc<T>) -> Self
    where
        T: RecordSource + TagStateStore + CustomerSink + TriggerDispatcher + 'static,
    {
        Self {
            source: store.clone(),
            tag_state: store.clone(),
            sink: store.clone(),
            dispatcher: store,
        }
    }
}

/// What one restaurant run produced
#[derive(Debug, Clone, PartialEq)]
pub struct RestaurantReport {
    pub restaurant_id: String,
    pub customers: usize,
    pub triggers: usize,
    pub skipped_orders: usize,
    pub skipped_reviews: usize,
    pub churn_rate: f64,
    pub attempts: u32,
}

impl RestaurantReport {
    fn from_outcome(outcome: &TaggingOutcome) -> Self {
        Self {
            restaurant_id: outcome.restaurant_id.clone(),
            customers: outcome.customers.len(),
            triggers: outcome.triggers.len(),
            skipped_orders: outcome.skipped.order_count(),
            skipped_reviews: outcome.skipped.review_count(),
            churn_rate: outcome.summary.churn_rate,
            attempts: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestaurantFailure {
    pub restaurant_id: String,
    pub error: String,
}

/// Result of a full batch over many restaurants, each list ordered by id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub succeeded: Vec<RestaurantReport>,
    pub failed: Vec<RestaurantFailure>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total_triggers(&self) -> usize {
        self.succeeded.iter().map(|r| r.triggers).sum()
    }
}

/// Baselines and customers from a restaurant's last full run
struct FrozenRestaurant {
    baselines: RestaurantBaselines,
    customers: HashMap<String, Customer>,
}

pub struct RecomputeJob {
    engine: Arc<TaggingEngine>,
    stores: Stores,
    config: WorkerConfig,
    frozen: RwLock<HashMap<String, FrozenRestaurant>>,
}

impl RecomputeJob {
    pub fn new(engine: TaggingEngine, stores: Stores, config: WorkerConfig) -> Self {
        Self {
            engine: Arc::new(engine),
            stores,
            config,
            frozen: RwLock::new(HashMap::new()),
        }
    }

    /// Recompute every configured restaurant
    ///
    /// Individual restaurant failures are reported, not returned. Only a
    /// failure to list restaurants fails the batch.
    pub async fn run_all(&self, now: DateTime<Utc>) -> Result<BatchReport, EngineError> {
        let restaurant_ids = self.restaurant_ids().await?;
        tracing::info!(
            restaurants = restaurant_ids.len(),
            concurrency = self.config.max_concurrent_restaurants,
            "Starting recompute batch"
        );

        let results: Vec<(String, Result<RestaurantReport, EngineError>)> =
            stream::iter(restaurant_ids)
                .map(|restaurant_id| async move {
                    let result = self.run_restaurant(&restaurant_id, now).await;
                    (restaurant_id, result)
                })
                .buffer_unordered(self.config.max_concurrent_restaurants.max(1))
                .collect()
                .await;

        let mut report = BatchReport::default();
        for (restaurant_id, result) in results {
            match result {
                Ok(restaurant) => report.succeeded.push(restaurant),
                Err(e) => {
                    tracing::error!(restaurant_id = %restaurant_id, error = %e, "Restaurant batch failed");
                    report.failed.push(RestaurantFailure {
                        restaurant_id,
                        error: e.to_string(),
                    });
                },
            }
        }
        report.succeeded.sort_by(|a, b| a.restaurant_id.cmp(&b.restaurant_id));
        report.failed.sort_by(|a, b| a.restaurant_id.cmp(&b.restaurant_id));

        tracing::info!(
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            triggers = report.total_triggers(),
            "Recompute batch finished"
        );

        Ok(report)
    }

    /// Recompute one restaurant, retrying the whole batch on storage errors
    pub async fn run_restaurant(
        &self,
        restaurant_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RestaurantReport, EngineError> {
        let started = Instant::now();
        let mut backoff = Duration::from_millis(self.config.initial_backoff_ms);
        let mut last_error = None;

        for attempt in 1..=self.config.max_attempts {
            if attempt > 1 {
                tracing::warn!(
                    restaurant_id,
                    attempt,
                    max_attempts = self.config.max_attempts,
                    backoff_ms = backoff.as_millis() as u64,
                    "Retrying restaurant batch"
                );
                telemetry::record_retry();
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.attempt(restaurant_id, now).await {
                Ok(mut report) => {
                    report.attempts = attempt;
                    telemetry::record_restaurant_run("ok", started.elapsed());
                    return Ok(report);
                },
                Err(e) if e.is_retryable() => {
                    tracing::warn!(restaurant_id, attempt, error = %e, "Restaurant batch attempt failed");
                    last_error = Some(e);
                },
                Err(e) => {
                    telemetry::record_restaurant_run("failed", started.elapsed());
                    return Err(e);
                },
            }
        }

        telemetry::record_restaurant_run("failed", started.elapsed());
        Err(last_error.unwrap_or_else(|| EngineError::Source("no attempts made".to_string())))
    }

    /// Recompute a single customer against the baselines frozen by the last
    /// full run of their restaurant
    pub async fn recompute_customer(
        &self,
        restaurant_id: &str,
        customer_id: &str,
        now: DateTime<Utc>,
    ) -> Result<CustomerUpdate, EngineError> {
        let (baselines, existing) = {
            let frozen = self.frozen.read();
            let restaurant = frozen
                .get(restaurant_id)
                .ok_or_else(|| EngineError::MissingBaselines(restaurant_id.to_string()))?;
            (
                restaurant.baselines.clone(),
                restaurant.customers.get(customer_id).cloned(),
            )
        };

        let range = self.range(now);
        let source = &self.stores.source;
        let (restaurant, records, reviews) = futures::try_join!(
            source.restaurant(restaurant_id),
            source.customer_orders(restaurant_id, customer_id, range),
            source.reviews(restaurant_id, range),
        )
        .map_err(source_error)?;

        let reviews: Vec<ReviewRecord> = reviews
            .into_iter()
            .filter(|r| r.customer_id.as_deref() == Some(customer_id))
            .collect();
        let (orders, reviews, skipped) = validate_records(records, reviews);
        if !skipped.is_empty() {
            tracing::warn!(
                restaurant_id,
                customer_id,
                skipped_orders = skipped.order_count(),
                skipped_reviews = skipped.review_count(),
                "Skipped malformed records"
            );
        }

        let prior = existing.as_ref().map(Customer::tag_snapshot);
        let customer = existing.unwrap_or_else(|| Customer::from_contact(CustomerContact::new(customer_id)));
        let update = self.engine.recompute_customer(
            &restaurant,
            customer,
            prior.as_ref(),
            orders,
            &reviews,
            &baselines,
            now,
        );

        if let Some(trigger) = &update.trigger {
            self.stores
                .dispatcher
                .dispatch(std::slice::from_ref(trigger))
                .await
                .map_err(dispatch_error)?;
        }
        self.stores
            .sink
            .write_customers(restaurant_id, std::slice::from_ref(&update.customer))
            .await
            .map_err(sink_error)?;

        if let Some(restaurant) = self.frozen.write().get_mut(restaurant_id) {
            restaurant
                .customers
                .insert(update.customer.id.clone(), update.customer.clone());
        }
        telemetry::record_customer_recompute();

        Ok(update)
    }

    async fn attempt(
        &self,
        restaurant_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RestaurantReport, EngineError> {
        let range = self.range(now);
        let source = &self.stores.source;

        let (restaurant, orders, reviews, contacts, prior) = futures::try_join!(
            source.restaurant(restaurant_id),
            source.orders(restaurant_id, range),
            source.reviews(restaurant_id, range),
            source.contacts(restaurant_id),
            self.stores.tag_state.prior_tags(restaurant_id),
        )
        .map_err(source_error)?;

        let snapshot = RestaurantSnapshot {
            restaurant,
            orders,
            reviews,
            contacts,
        };
        let engine = Arc::clone(&self.engine);
        let outcome = tokio::task::spawn_blocking(move || engine.run(snapshot, &prior, now))
            .await
            .map_err(|e| EngineError::Computation(e.to_string()))?;

        // Triggers go out before tags are stored so a retry after a failed
        // write still compares against the old tags
        self.stores
            .dispatcher
            .dispatch(&outcome.triggers)
            .await
            .map_err(dispatch_error)?;
        self.stores
            .sink
            .write_customers(restaurant_id, &outcome.customers)
            .await
            .map_err(sink_error)?;
        self.stores
            .sink
            .write_summary(&outcome.summary)
            .await
            .map_err(sink_error)?;

        telemetry::record_outcome(&outcome);
        let report = RestaurantReport::from_outcome(&outcome);
        self.freeze(outcome);
        Ok(report)
    }

    fn freeze(&self, outcome: TaggingOutcome) {
        let customers = outcome
            .customers
            .into_iter()
            .map(|c| (c.id.clone(), c))
            .collect();
        self.frozen.write().insert(
            outcome.restaurant_id,
            FrozenRestaurant {
                baselines: outcome.baselines,
                customers,
            },
        );
    }

    async fn restaurant_ids(&self) -> Result<Vec<String>, EngineError> {
        if !self.config.restaurants.is_empty() {
            return Ok(self.config.restaurants.clone());
        }
        let restaurants = self.stores.source.restaurants().await.map_err(source_error)?;
        Ok(restaurants.into_iter().map(|r| r.id).collect())
    }

    fn range(&self, now: DateTime<Utc>) -> TimeRange {
        match self.config.lookback_days {
            Some(days) => TimeRange::lookback(now, days),
            None => TimeRange::all(),
        }
    }
}

/// A missing restaurant will not appear on retry
fn source_error(e: PersistenceError) -> EngineError {
    match e {
        PersistenceError::NotFound(what) => EngineError::NotFound(what),
        other => EngineError::Source(other.to_string()),
    }
}

fn sink_error(e: PersistenceError) -> EngineError {
    EngineError::Sink(e.to_string())
}

fn dispatch_error(e: PersistenceError) -> EngineError {
    EngineError::Dispatch(e.to_string())
}
