//! Dispatcher - matches targets to channels and delivers the batch

use std::sync::{Arc, Mutex, MutexGuard};

use contracts::{
    target_context, CampaignBlueprint, ChannelConfig, ContractError, ErrorReporting, Report,
    Strategy, Target, Template, TemplateValues, TARGET_KEY,
};
use serde_json::Value;
use templating::JinjaTemplate;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::channels::{Channel, ChannelFactory};
use crate::connection::{Connection, Delivery};
use crate::error::DispatcherError;
use crate::metrics::DispatchMetrics;

/// Connections and match errors produced by one prepare pass
struct Plan<S> {
    connections: Vec<Connection<S>>,
    errors: Vec<String>,
}

impl<S> Default for Plan<S> {
    fn default() -> Self {
        Self {
            connections: Vec::new(),
            errors: Vec::new(),
        }
    }
}

/// Progress of one worker in a concurrent batch
enum Slot {
    Pending,
    Running,
    Done(Result<Delivery, ContractError>),
}

/// Outcomes of one concurrent batch, written by its workers
///
/// Every worker holds a clone of `slots`, dropped when it returns or unwinds.
struct InFlight {
    slots: Arc<Mutex<Vec<Slot>>>,
    /// Target, addressee and channel of each slot
    bound: Vec<(String, String, String)>,
}

impl InFlight {
    fn new<S: Strategy>(connections: &[Connection<S>]) -> Self {
        Self {
            slots: Arc::new(Mutex::new(
                connections.iter().map(|_| Slot::Pending).collect(),
            )),
            bound: connections
                .iter()
                .map(|c| {
                    (
                        c.target_name().to_string(),
                        c.addressee().to_string(),
                        c.channel_type().to_string(),
                    )
                })
                .collect(),
        }
    }

    fn is_finished(&self) -> bool {
        Arc::strong_count(&self.slots) == 1
    }

    /// Outcomes in insertion order
    ///
    /// Workers that never started are skipped; a worker that stopped
    /// mid-delivery counts as a failed delivery.
    fn into_outcomes(self) -> Vec<Result<Delivery, DispatcherError>> {
        let slots = std::mem::take(&mut *lock(&self.slots));
        slots
            .into_iter()
            .zip(self.bound)
            .filter_map(|(slot, (target, addressee, channel))| match slot {
                Slot::Pending => None,
                Slot::Running => Some(Ok(Delivery::failed(
                    "worker panicked",
                    &addressee,
                    &channel,
                ))),
                Slot::Done(Ok(delivery)) => Some(Ok(delivery)),
                Slot::Done(Err(source)) => Some(Err(precondition(&channel, &target, source))),
            })
            .collect()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Slots stay meaningful after a worker panics.
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

fn precondition(channel: &str, target: &str, source: ContractError) -> DispatcherError {
    DispatcherError::Precondition {
        channel: channel.to_string(),
        target: target.to_string(),
        source,
    }
}

/// Multi-channel message dispatcher
///
/// Mutators invalidate the cached plan; `send`, `cost` and `report` prepare
/// again only when it is invalid, so repeated calls neither re-render nor
/// re-match.
///
/// ```
/// use contracts::{ErrorReporting, Recipient};
/// use dispatcher::{Dispatcher, SmsStrategy, LogCarrier};
/// use std::sync::Arc;
/// use templating::JinjaTemplate;
///
/// let mut dispatcher: Dispatcher = Dispatcher::new(ErrorReporting::Silent);
/// dispatcher.set_template(JinjaTemplate::new("Reminder", "Hello {{ target.name }}").unwrap());
/// dispatcher.add_target(Recipient::named("B").with_mobile("070"));
/// dispatcher.add_strategy(SmsStrategy::new(Arc::new(LogCarrier::new("sms"))).into());
///
/// dispatcher.send().unwrap();
/// let report = dispatcher.report().unwrap();
/// assert_eq!(report.success, ["Message sent to 'B <070>' using 'sms'"]);
/// ```
pub struct Dispatcher<S: Strategy = Channel> {
    template: Option<Arc<dyn Template>>,
    targets: Vec<Arc<dyn Target>>,
    global_vals: TemplateValues,
    strategies: Vec<S>,
    error_reporting: ErrorReporting,
    prepared: bool,
    plan: Plan<S>,
    log: Vec<String>,
    delivery_errors: Vec<String>,
    in_flight: Option<InFlight>,
    metrics: Arc<DispatchMetrics>,
}

impl<S: Strategy> Default for Dispatcher<S> {
    fn default() -> Self {
        Self::new(ErrorReporting::default())
    }
}

impl<S: Strategy> Dispatcher<S> {
    pub fn new(error_reporting: ErrorReporting) -> Self {
        Self {
            template: None,
            targets: Vec::new(),
            global_vals: TemplateValues::new(),
            strategies: Vec::new(),
            error_reporting,
            prepared: false,
            plan: Plan::default(),
            log: Vec::new(),
            delivery_errors: Vec::new(),
            in_flight: None,
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }

    pub fn set_error_reporting(&mut self, error_reporting: ErrorReporting) {
        self.error_reporting = error_reporting;
    }

    pub fn error_reporting(&self) -> ErrorReporting {
        self.error_reporting
    }

    pub fn set_template(&mut self, template: impl Template + 'static) {
        self.set_shared_template(Arc::new(template));
    }

    /// Use a template shared with other dispatchers
    pub fn set_shared_template(&mut self, template: Arc<dyn Template>) {
        self.template = Some(template);
        self.invalidate();
    }

    pub fn add_target(&mut self, target: impl Target + 'static) {
        self.targets.push(Arc::new(target));
        self.invalidate();
    }

    pub fn clear_targets(&mut self) {
        self.targets.clear();
        self.invalidate();
    }

    /// Merge values into the render context, later keys win
    pub fn add_global_vals<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        self.global_vals.extend(values);
        self.invalidate();
    }

    pub fn clear_global_vals(&mut self) {
        self.global_vals.clear();
        self.invalidate();
    }

    /// Append a strategy prototype; earlier prototypes win on overlap
    pub fn add_strategy(&mut self, strategy: S) {
        self.strategies.push(strategy);
        self.invalidate();
    }

    pub fn clear_strategies(&mut self) {
        self.strategies.clear();
        self.invalidate();
    }

    /// Reset targets, strategies, global values, connections, log and errors
    ///
    /// The template and the error reporting mode are kept.
    pub fn clear(&mut self) {
        self.targets.clear();
        self.strategies.clear();
        self.global_vals.clear();
        self.log.clear();
        self.delivery_errors.clear();
        self.in_flight = None;
        self.invalidate();
    }

    pub fn targets(&self) -> &[Arc<dyn Target>] {
        &self.targets
    }

    pub fn global_vals(&self) -> &TemplateValues {
        &self.global_vals
    }

    pub fn strategies(&self) -> &[S] {
        &self.strategies
    }

    /// Connections of the last prepare pass
    pub fn connections(&self) -> &[Connection<S>] {
        &self.plan.connections
    }

    pub fn is_prepared(&self) -> bool {
        self.prepared
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    fn invalidate(&mut self) {
        self.prepared = false;
        self.plan = Plan::default();
    }

    /// Render and match every target
    ///
    /// No-op if already prepared. Targets that match no strategy, or whose
    /// message does not compile, are recorded as errors and skipped.
    ///
    /// # Errors
    /// No template set, or a strategy accepted a target it cannot address
    #[instrument(
        name = "dispatcher_prepare",
        skip(self),
        fields(targets = self.targets.len(), strategies = self.strategies.len())
    )]
    pub fn prepare(&mut self) -> Result<(), DispatcherError> {
        if self.prepared {
            return Ok(());
        }
        let template = self
            .template
            .as_deref()
            .ok_or(DispatcherError::MissingTemplate)?;

        let plan = build_plan(
            template,
            &self.targets,
            &self.global_vals,
            &self.strategies,
            &self.metrics,
        )?;
        debug!(
            connections = plan.connections.len(),
            errors = plan.errors.len(),
            "Dispatcher prepared"
        );

        self.plan = plan;
        self.prepared = true;
        Ok(())
    }

    /// Deliver every connection in insertion order
    ///
    /// Delivery failures never stop the batch. In loud mode the call fails
    /// afterwards if any error was recorded.
    ///
    /// # Errors
    /// `Batch` in loud mode, or any precondition error from [`prepare`](Self::prepare)
    /// or from a connection that lost its bound state
    #[instrument(name = "dispatcher_send", skip(self))]
    pub fn send(&mut self) -> Result<(), DispatcherError> {
        self.settle_cancelled();
        self.prepare()?;

        let mut outcomes = Vec::with_capacity(self.plan.connections.len());
        let mut fatal = None;
        for connection in &mut self.plan.connections {
            match connection.deliver() {
                Ok(delivery) => outcomes.push(delivery),
                Err(source) => {
                    fatal = Some(precondition(
                        connection.channel_type(),
                        connection.target_name(),
                        source,
                    ));
                    break;
                }
            }
        }

        if let Some(err) = fatal {
            self.record(outcomes);
            return Err(err);
        }
        self.finish_batch(outcomes)
    }

    /// Deliver every connection in parallel on the blocking pool
    ///
    /// Workers deliver copies of the bound connections, so the plan stays
    /// intact whether or not this future runs to completion. Outcomes are
    /// merged back in insertion order and read as if sent sequentially. A
    /// worker that panics mid-delivery is recorded as a failed delivery.
    ///
    /// If the future is dropped early, outcomes of the workers that already
    /// started are recorded by the next `send`, `send_concurrent` or
    /// `report` once those workers have finished.
    ///
    /// # Errors
    /// Same as [`send`](Self::send)
    #[instrument(name = "dispatcher_send_concurrent", skip(self))]
    pub async fn send_concurrent(&mut self) -> Result<(), DispatcherError> {
        self.settle_cancelled();
        self.prepare()?;

        let batch = InFlight::new(&self.plan.connections);
        let mut tasks = JoinSet::new();
        for (index, connection) in self.plan.connections.iter().enumerate() {
            let mut connection = connection.clone();
            let slots = Arc::clone(&batch.slots);
            tasks.spawn_blocking(move || {
                lock(&slots)[index] = Slot::Running;
                let outcome = connection.deliver();
                lock(&slots)[index] = Slot::Done(outcome);
            });
        }
        self.in_flight = Some(batch);

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "Delivery worker failed");
            }
        }

        let outcomes = self
            .in_flight
            .take()
            .map(InFlight::into_outcomes)
            .unwrap_or_default();
        let mut deliveries = Vec::with_capacity(outcomes.len());
        let mut fatal = None;
        for outcome in outcomes {
            match outcome {
                Ok(delivery) => deliveries.push(delivery),
                Err(err) => {
                    fatal.get_or_insert(err);
                }
            }
        }

        if let Some(err) = fatal {
            self.record(deliveries);
            return Err(err);
        }
        self.finish_batch(deliveries)
    }

    /// Record what a dropped `send_concurrent` call delivered
    ///
    /// Left pending while any of its workers is still running.
    fn settle_cancelled(&mut self) {
        match &self.in_flight {
            Some(batch) if batch.is_finished() => {}
            Some(_) => {
                debug!("Cancelled batch still has running workers");
                return;
            }
            None => return,
        }
        let Some(batch) = self.in_flight.take() else {
            return;
        };

        let mut deliveries = Vec::new();
        for outcome in batch.into_outcomes() {
            match outcome {
                Ok(delivery) => deliveries.push(delivery),
                Err(err) => warn!(error = %err, "Cancelled batch hit a precondition error"),
            }
        }
        info!(outcomes = deliveries.len(), "Settled cancelled batch");
        self.record(deliveries);
    }

    /// Append outcomes to the log and the delivery errors
    fn record(&mut self, outcomes: Vec<Delivery>) -> (usize, usize) {
        let mut sent = 0usize;
        let mut failed = 0usize;
        for outcome in outcomes {
            match outcome {
                Delivery::Sent(line) => {
                    sent += 1;
                    self.metrics.inc_sent_count();
                    self.log.push(line);
                }
                Delivery::Failed(line) => {
                    failed += 1;
                    self.metrics.inc_failure_count();
                    self.delivery_errors.push(line);
                }
            }
        }
        (sent, failed)
    }

    fn finish_batch(&mut self, outcomes: Vec<Delivery>) -> Result<(), DispatcherError> {
        let (sent, failed) = self.record(outcomes);
        self.metrics.inc_batch_count();

        let errors = self.errors();
        info!(
            sent,
            failed,
            errors = errors.len(),
            reporting = ?self.error_reporting,
            "Batch finished"
        );

        if !errors.is_empty() && self.error_reporting == ErrorReporting::Loud {
            return Err(DispatcherError::Batch { errors });
        }
        Ok(())
    }

    /// Sum of every connection's cost, preparing first if needed
    pub fn cost(&mut self) -> Result<f64, DispatcherError> {
        self.prepare()?;
        Ok(self
            .plan
            .connections
            .iter()
            .fold(0.0, |total, c| total + c.cost()))
    }

    /// Match errors followed by delivery errors
    pub fn errors(&self) -> Vec<String> {
        self.plan
            .errors
            .iter()
            .chain(&self.delivery_errors)
            .cloned()
            .collect()
    }

    /// Success log of every send since the last `clear`
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Cost, errors and success log
    pub fn report(&mut self) -> Result<Report, DispatcherError> {
        self.settle_cancelled();
        Ok(Report {
            cost: self.cost()?,
            errors: self.errors(),
            success: self.log.clone(),
        })
    }
}

/// Render a message per target and bind it to the first accepting strategy
fn build_plan<S: Strategy>(
    template: &dyn Template,
    targets: &[Arc<dyn Target>],
    global_vals: &TemplateValues,
    strategies: &[S],
    metrics: &DispatchMetrics,
) -> Result<Plan<S>, DispatcherError> {
    let mut plan = Plan::default();
    let title = template.title();

    for target in targets {
        let target = target.as_ref();
        let mut context = global_vals.clone();
        context.insert(TARGET_KEY.to_string(), target_context(target));

        let message = match template.compile(&context) {
            Ok(message) => message,
            Err(e) => {
                warn!(target = %target.name(), error = %e, "Unable to compile message");
                metrics.inc_render_failure_count();
                plan.errors.push(format!(
                    "Unable to compile message for target '{}': {}",
                    target.name(),
                    e
                ));
                continue;
            }
        };

        let mut bound = None;
        for prototype in strategies {
            let connection = Connection::bind(prototype, target, &message, title)
                .map_err(|source| precondition(prototype.channel_type(), target.name(), source))?;
            if connection.is_some() {
                bound = connection;
                break;
            }
        }

        match bound {
            Some(connection) => {
                metrics.inc_connection_count();
                plan.connections.push(connection);
            }
            None => {
                warn!(target = %target.name(), "No strategy accepts target");
                metrics.inc_unmatched_count();
                plan.errors.push(format!(
                    "Unable to find communication strategy for target '{}'",
                    target.name()
                ));
            }
        }
    }

    Ok(plan)
}

/// Create a channel prototype with a private set of mailboxes
pub fn create_channel(config: &ChannelConfig) -> Result<Channel, DispatcherError> {
    ChannelFactory::new().create(config)
}

/// Convenience function to build a ready-to-send dispatcher from a campaign
#[instrument(
    name = "dispatcher_create",
    skip(blueprint, factory),
    fields(
        recipients = blueprint.recipients.len(),
        channels = blueprint.channels.len()
    )
)]
pub fn create_dispatcher(
    blueprint: &CampaignBlueprint,
    factory: &ChannelFactory,
) -> Result<Dispatcher, DispatcherError> {
    let config = &blueprint.template;
    let template = if config.html_escape {
        JinjaTemplate::html(&config.title, &config.body)?
    } else {
        JinjaTemplate::new(&config.title, &config.body)?
    };

    let mut dispatcher = Dispatcher::new(blueprint.reporting);
    dispatcher.set_template(template);
    dispatcher.add_global_vals(blueprint.globals.clone());
    for recipient in &blueprint.recipients {
        dispatcher.add_target(recipient.clone());
    }
    for channel in factory.create_all(&blueprint.channels)? {
        dispatcher.add_strategy(channel);
    }
    Ok(dispatcher)
}
