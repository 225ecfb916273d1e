//! Destination manager
//!
//! Aggregates simulators, physical devices and the host Mac into one ranked
//! list of build destinations, and tracks which destination the workspace
//! has selected. Selecting a destination also bumps its usage count, which
//! feeds the "most used" ordering.
//!
//! The manager is built with [`DestinationManagerBuilder`]. Workspace storage
//! is a required part of construction, so an unwired manager cannot exist.

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use xcdest_core::prelude::*;
use xcdest_core::{
    Destination, DestinationInfo, DestinationPlatform, DestinationType, IosDeviceDestination,
    IosSimulatorDestination, MacOsDestination, Ranker, SelectedDestination, SimulatorDestination,
    VisionOsSimulatorDestination, WatchOsSimulatorDestination, ALL_DESTINATION_TYPES,
    DEFAULT_HOST_ARCH, SUPPORTED_DESTINATION_PLATFORMS,
};
use xcdest_daemon::{
    host_architecture, DevicectlProvider, DeviceProvider, SimctlProvider, SimulatorProvider,
};

use crate::config::{load_settings, Settings};
use crate::events::{DestinationEvent, DestinationEventKind, EventHub};
use crate::ledger::UsageLedger;
use crate::state::{FileWorkspaceState, WorkspaceState, WorkspaceStateExt};

/// Workspace state key holding the selected destination
pub const SELECTED_DESTINATION_KEY: &str = "build.xcodeDestination";

/// Best-effort host architecture lookup
pub type ArchDetector = fn() -> Option<String>;

/// Options for [`DestinationManager::get_destinations`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DestinationQuery {
    /// Platforms to include; `None` uses the configured default
    pub platform_filter: Option<Vec<DestinationPlatform>>,

    /// Order by usage count first, then by rank
    pub most_used_sort: bool,
}

impl DestinationQuery {
    pub fn most_used() -> Self {
        Self {
            platform_filter: None,
            most_used_sort: true,
        }
    }

    pub fn with_platforms(mut self, platforms: Vec<DestinationPlatform>) -> Self {
        self.platform_filter = Some(platforms);
        self
    }
}

// ─────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────

/// Wires providers, storage and ranking into a [`DestinationManager`]
#[derive(Debug)]
pub struct DestinationManagerBuilder<S, D> {
    simulators: Arc<S>,
    devices: Arc<D>,
    state: Option<Arc<dyn WorkspaceState>>,
    ranker: Ranker,
    default_platforms: Vec<DestinationPlatform>,
    arch_detector: ArchDetector,
}

impl<S, D> DestinationManagerBuilder<S, D>
where
    S: SimulatorProvider + Sync + 'static,
    D: DeviceProvider + Sync + 'static,
{
    pub fn new(simulators: Arc<S>, devices: Arc<D>) -> Self {
        Self {
            simulators,
            devices,
            state: None,
            ranker: Ranker::default(),
            default_platforms: SUPPORTED_DESTINATION_PLATFORMS.to_vec(),
            arch_detector: host_architecture,
        }
    }

    /// Storage for the usage ledger and the selection (required)
    pub fn workspace_state(mut self, state: Arc<dyn WorkspaceState>) -> Self {
        self.state = Some(state);
        self
    }

    pub fn ranker(mut self, ranker: Ranker) -> Self {
        self.ranker = ranker;
        self
    }

    /// Apply ranking tables and the default platform filter from settings
    pub fn settings(mut self, settings: &Settings) -> Self {
        self.ranker = Ranker::new(settings.ranking.clone());
        self.default_platforms = settings.destinations.platforms.clone();
        self
    }

    pub fn arch_detector(mut self, detector: ArchDetector) -> Self {
        self.arch_detector = detector;
        self
    }

    /// Build the manager and start forwarding provider notifications
    ///
    /// Fails with [`Error::ContextUnset`] when no workspace state was given
    /// or when called outside a Tokio runtime.
    pub fn build(self) -> Result<DestinationManager<S, D>> {
        let state = self
            .state
            .ok_or_else(|| Error::context_unset("Workspace state"))?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| Error::context_unset("Tokio runtime"))?;

        let events = Arc::new(EventHub::new());

        // Subscribe before returning so no notification after build is lost
        let forwarders = vec![
            runtime.spawn(forward_updates(
                self.simulators.subscribe(),
                events.clone(),
                DestinationEvent::SimulatorsUpdated,
            )),
            runtime.spawn(forward_updates(
                self.devices.subscribe(),
                events.clone(),
                DestinationEvent::DevicesUpdated,
            )),
        ];

        Ok(DestinationManager {
            simulators: self.simulators,
            devices: self.devices,
            ledger: UsageLedger::new(state.clone()),
            state,
            ranker: self.ranker,
            default_platforms: self.default_platforms,
            arch_detector: self.arch_detector,
            events,
            forwarders,
        })
    }
}

/// Re-emit every provider notification as `event`
///
/// A lagged receiver re-emits once per missed notification.
async fn forward_updates(
    mut rx: broadcast::Receiver<()>,
    events: Arc<EventHub>,
    event: DestinationEvent,
) {
    loop {
        match rx.recv().await {
            Ok(()) => events.emit(event.clone()),
            Err(RecvError::Lagged(missed)) => {
                warn!("Missed {} {} notifications", missed, event.event_type());
                for _ in 0..missed {
                    events.emit(event.clone());
                }
            }
            Err(RecvError::Closed) => {
                debug!("{} source closed", event.event_type());
                break;
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Manager
// ─────────────────────────────────────────────────────────────────

/// Aggregating, ranking and selection front-end over the providers
#[derive(Debug)]
pub struct DestinationManager<S = SimctlProvider, D = DevicectlProvider> {
    simulators: Arc<S>,
    devices: Arc<D>,
    state: Arc<dyn WorkspaceState>,
    ledger: UsageLedger,
    ranker: Ranker,
    default_platforms: Vec<DestinationPlatform>,
    arch_detector: ArchDetector,
    events: Arc<EventHub>,
    forwarders: Vec<JoinHandle<()>>,
}

impl DestinationManager {
    /// Manager over `xcrun` providers and `.xcdest/` storage for a workspace
    pub fn for_workspace(workspace_path: &Path) -> Result<Self> {
        let settings = load_settings(workspace_path);
        let state = Arc::new(FileWorkspaceState::open(workspace_path));

        DestinationManagerBuilder::new(
            Arc::new(SimctlProvider::new(settings.simulators.include_unavailable)),
            Arc::new(DevicectlProvider::new()),
        )
        .settings(&settings)
        .workspace_state(state)
        .build()
    }
}

impl<S, D> DestinationManager<S, D>
where
    S: SimulatorProvider,
    D: DeviceProvider,
{
    // ─────────────────────────────────────────────────────────
    // Events
    // ─────────────────────────────────────────────────────────

    /// Register a callback for one kind of event
    pub fn on<F>(&self, kind: DestinationEventKind, listener: F)
    where
        F: Fn(&DestinationEvent) + Send + Sync + 'static,
    {
        self.events.on(kind, listener);
    }

    /// Receive every event emitted from now on
    pub fn subscribe(&self) -> broadcast::Receiver<DestinationEvent> {
        self.events.subscribe()
    }

    // ─────────────────────────────────────────────────────────
    // Refresh
    // ─────────────────────────────────────────────────────────

    /// Re-enumerate simulators and devices
    ///
    /// Both providers are refreshed even if the first fails. The simulator
    /// error wins when both fail; the device error is logged.
    pub async fn refresh(&self) -> Result<()> {
        let simulators = self.simulators.refresh().await;
        let devices = self.devices.refresh().await;

        match (simulators, devices) {
            (Ok(()), Ok(())) => {
                info!("Refreshed simulators and devices");
                Ok(())
            }
            (Err(e), Ok(())) => {
                warn!("Simulator refresh failed: {}", e);
                Err(e)
            }
            (Ok(()), Err(e)) => {
                warn!("Device refresh failed: {}", e);
                Err(e)
            }
            (Err(sim_err), Err(device_err)) => {
                warn!("Device refresh failed: {}", device_err);
                Err(sim_err)
            }
        }
    }

    /// Re-enumerate simulators and return the new list
    pub async fn refresh_simulators(&self) -> Result<Vec<SimulatorDestination>> {
        self.simulators.refresh().await?;
        self.simulators.simulators().await
    }

    pub async fn refresh_ios_devices(&self) -> Result<()> {
        self.devices.refresh().await
    }

    // ─────────────────────────────────────────────────────────
    // Ranking
    // ─────────────────────────────────────────────────────────

    pub fn ranker(&self) -> &Ranker {
        &self.ranker
    }

    /// Usage-agnostic destination order
    pub fn compare(&self, a: &Destination, b: &Destination) -> Ordering {
        self.ranker.compare(a, b)
    }

    pub fn usage_ledger(&self) -> &UsageLedger {
        &self.ledger
    }

    pub fn has_usage_statistics(&self) -> bool {
        self.ledger.exists()
    }

    // ─────────────────────────────────────────────────────────
    // Enumeration
    // ─────────────────────────────────────────────────────────

    /// All simulators, in provider order unless `sort` is set
    pub async fn get_simulators(&self, sort: bool) -> Result<Vec<SimulatorDestination>> {
        let mut simulators = self.simulators.simulators().await?;
        if sort {
            self.ranker.sort(&mut simulators);
        }
        Ok(simulators)
    }

    pub async fn get_ios_simulators(&self, sort: bool) -> Result<Vec<IosSimulatorDestination>> {
        let mut simulators: Vec<_> = self
            .simulators
            .simulators()
            .await?
            .into_iter()
            .filter_map(|s| match s {
                SimulatorDestination::Ios(sim) => Some(sim),
                _ => None,
            })
            .collect();
        if sort {
            self.ranker.sort(&mut simulators);
        }
        Ok(simulators)
    }

    pub async fn get_watchos_simulators(&self) -> Result<Vec<WatchOsSimulatorDestination>> {
        Ok(self
            .simulators
            .simulators()
            .await?
            .into_iter()
            .filter_map(|s| match s {
                SimulatorDestination::WatchOs(sim) => Some(sim),
                _ => None,
            })
            .collect())
    }

    pub async fn get_visionos_simulators(&self) -> Result<Vec<VisionOsSimulatorDestination>> {
        Ok(self
            .simulators
            .simulators()
            .await?
            .into_iter()
            .filter_map(|s| match s {
                SimulatorDestination::VisionOs(sim) => Some(sim),
                _ => None,
            })
            .collect())
    }

    pub async fn get_ios_devices(&self) -> Result<Vec<IosDeviceDestination>> {
        self.devices.devices().await
    }

    /// The host Mac, falling back to the default arch when detection fails
    pub fn get_macos_devices(&self) -> Vec<MacOsDestination> {
        let arch = (self.arch_detector)().unwrap_or_else(|| DEFAULT_HOST_ARCH.to_string());
        vec![MacOsDestination::host(arch)]
    }

    /// Every destination on the requested platforms
    ///
    /// Kinds are concatenated in ranking category order. With
    /// `most_used_sort`, the result is re-sorted by usage count (descending)
    /// and then by rank.
    pub async fn get_destinations(&self, query: &DestinationQuery) -> Result<Vec<Destination>> {
        let platforms = query
            .platform_filter
            .as_deref()
            .unwrap_or(&self.default_platforms);

        let categories: Vec<DestinationType> = self
            .ranker
            .category_order()
            .into_iter()
            .filter(|t| platforms.contains(&t.platform()))
            .collect();

        let simulators = if categories.iter().any(|t| t.is_simulator()) {
            self.simulators.simulators().await?
        } else {
            Vec::new()
        };

        let mut destinations = Vec::new();
        for category in categories {
            match category {
                DestinationType::IosDevice => destinations.extend(
                    self.get_ios_devices()
                        .await?
                        .into_iter()
                        .map(Destination::from),
                ),
                DestinationType::MacOs => destinations.extend(
                    self.get_macos_devices()
                        .into_iter()
                        .map(Destination::from),
                ),
                _ => destinations.extend(
                    simulators
                        .iter()
                        .filter(|s| s.destination_type() == category)
                        .cloned()
                        .map(Destination::from),
                ),
            }
        }

        if query.most_used_sort {
            self.sort_by_usage(&mut destinations);
        }

        debug!(
            "Listed {} destinations (most_used_sort: {})",
            destinations.len(),
            query.most_used_sort
        );
        Ok(destinations)
    }

    fn sort_by_usage(&self, destinations: &mut [Destination]) {
        let counts = self.ledger.count_map();
        let usage = |d: &Destination| counts.get(&d.id()).copied().unwrap_or(0);

        destinations.sort_by(|a, b| {
            usage(b)
                .cmp(&usage(a))
                .then_with(|| self.ranker.compare(a, b))
        });
    }

    // ─────────────────────────────────────────────────────────
    // Lookup
    // ─────────────────────────────────────────────────────────

    /// Resolve a destination by id
    ///
    /// Without a type, kinds are searched simulators first, then devices,
    /// then the host. A missing destination is `Ok(None)`.
    pub async fn find_destination(
        &self,
        destination_id: &str,
        destination_type: Option<DestinationType>,
    ) -> Result<Option<Destination>> {
        let types = match destination_type {
            Some(t) => vec![t],
            None => ALL_DESTINATION_TYPES.to_vec(),
        };

        let mut simulators: Option<Vec<SimulatorDestination>> = None;

        for t in types {
            let found = match t {
                DestinationType::IosDevice => self
                    .get_ios_devices()
                    .await?
                    .into_iter()
                    .find(|d| d.id() == destination_id)
                    .map(Destination::from),
                DestinationType::MacOs => self
                    .get_macos_devices()
                    .into_iter()
                    .find(|d| d.id() == destination_id)
                    .map(Destination::from),
                _ => {
                    if simulators.is_none() {
                        simulators = Some(self.simulators.simulators().await?);
                    }
                    simulators
                        .iter()
                        .flatten()
                        .find(|s| s.destination_type() == t && s.id() == destination_id)
                        .cloned()
                        .map(Destination::from)
                }
            };

            if found.is_some() {
                return Ok(found);
            }
        }

        debug!("No destination with id {}", destination_id);
        Ok(None)
    }

    /// Live destinations in usage order; ids that no longer resolve are skipped
    pub async fn get_most_used_destinations(&self) -> Result<Vec<Destination>> {
        let mut destinations = Vec::new();
        for id in self.ledger.most_used_order() {
            if let Some(destination) = self.find_destination(&id, None).await? {
                destinations.push(destination);
            }
        }
        Ok(destinations)
    }

    // ─────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────

    /// Persist the workspace selection, or clear it with `None`
    ///
    /// Selecting counts as one use of the destination. Clearing leaves usage
    /// counts alone. Either way one `XcodeDestinationUpdated` event fires.
    pub fn set_workspace_destination(&self, destination: Option<&Destination>) {
        let selected = destination.map(|d| d.selection());

        match &selected {
            Some(selection) => {
                self.state
                    .set_typed(SELECTED_DESTINATION_KEY, Some(selection));
                let count = self.ledger.increment(&selection.id);
                info!(
                    "Selected destination {} ({}), used {} times",
                    selection.name, selection.id, count
                );
            }
            None => {
                self.state.set(SELECTED_DESTINATION_KEY, None);
                info!("Cleared workspace destination");
            }
        }

        self.events
            .emit(DestinationEvent::XcodeDestinationUpdated(selected));
    }

    /// The persisted selection, without resolving it
    pub fn get_selected_destination(&self) -> Option<SelectedDestination> {
        self.state.get_typed(SELECTED_DESTINATION_KEY)
    }

    /// Resolve the persisted selection against the live providers
    pub async fn find_workspace_selected_destination(&self) -> Result<Option<Destination>> {
        match self.get_selected_destination() {
            Some(selected) => {
                self.find_destination(&selected.id, Some(selected.destination_type))
                    .await
            }
            None => Ok(None),
        }
    }
}

impl<S, D> Drop for DestinationManager<S, D> {
    fn drop(&mut self) {
        for task in &self.forwarders {
            task.abort();
        }
    }
}
