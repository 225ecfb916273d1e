//! Deterministic destination ordering
//!
//! Ordering keys, in order:
//! 1. position of the destination type in the type priority table
//! 2. for two iOS simulators, position of the simulator family in the
//!    simulator type priority table
//! 3. name, via [`collate`]
//!
//! Types missing from a table rank after every listed type. The comparison is
//! a lexicographic compare over those keys, so it is a total order and never
//! depends on anything but its two inputs. Usage counts are not part of it;
//! the manager layers them on top.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::destination::{DestinationInfo, DestinationType, SimulatorType};

/// Default order of destination kinds
///
/// Also the order in which destination categories are concatenated when
/// listing, so an unsorted listing already agrees with the comparator.
pub const DESTINATION_TYPE_PRIORITY: [DestinationType; 5] = [
    DestinationType::IosSimulator,
    DestinationType::WatchOsSimulator,
    DestinationType::IosDevice,
    DestinationType::MacOs,
    DestinationType::VisionOsSimulator,
];

/// Default order of simulator families among iOS simulators
pub const SIMULATOR_TYPE_PRIORITY: [SimulatorType; 6] = [
    SimulatorType::IPhone,
    SimulatorType::IPad,
    SimulatorType::IPod,
    SimulatorType::AppleTv,
    SimulatorType::AppleWatch,
    SimulatorType::AppleVision,
];

/// The two priority tables the comparator reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityTables {
    #[serde(default = "default_type_priority")]
    pub type_priority: Vec<DestinationType>,

    #[serde(default = "default_simulator_type_priority")]
    pub simulator_type_priority: Vec<SimulatorType>,
}

impl Default for PriorityTables {
    fn default() -> Self {
        Self {
            type_priority: default_type_priority(),
            simulator_type_priority: default_simulator_type_priority(),
        }
    }
}

fn default_type_priority() -> Vec<DestinationType> {
    DESTINATION_TYPE_PRIORITY.to_vec()
}

fn default_simulator_type_priority() -> Vec<SimulatorType> {
    SIMULATOR_TYPE_PRIORITY.to_vec()
}

/// Comparator over destinations
#[derive(Debug, Clone, Default)]
pub struct Ranker {
    tables: PriorityTables,
}

impl Ranker {
    pub fn new(tables: PriorityTables) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &PriorityTables {
        &self.tables
    }

    /// Index of `destination_type` in the type table; unlisted types rank last
    pub fn type_rank(&self, destination_type: DestinationType) -> usize {
        rank_in(&self.tables.type_priority, &destination_type)
    }

    /// Index of `simulator_type` in the simulator table; unlisted types rank last
    pub fn simulator_type_rank(&self, simulator_type: Option<SimulatorType>) -> usize {
        match simulator_type {
            Some(t) => rank_in(&self.tables.simulator_type_priority, &t),
            None => self.tables.simulator_type_priority.len(),
        }
    }

    /// Destination types in table order, followed by any type the table omits
    ///
    /// Used as the category order when aggregating destinations.
    pub fn category_order(&self) -> Vec<DestinationType> {
        let mut order: Vec<DestinationType> = Vec::new();
        for t in &self.tables.type_priority {
            if !order.contains(t) {
                order.push(*t);
            }
        }
        for t in crate::destination::ALL_DESTINATION_TYPES {
            if !order.contains(&t) {
                order.push(t);
            }
        }
        order
    }

    /// Compare two destinations without looking at usage
    pub fn compare<T: DestinationInfo + ?Sized>(&self, a: &T, b: &T) -> Ordering {
        let a_type = a.destination_type();
        let b_type = b.destination_type();

        self.type_rank(a_type)
            .cmp(&self.type_rank(b_type))
            .then_with(|| {
                if a_type == DestinationType::IosSimulator && b_type == DestinationType::IosSimulator
                {
                    self.simulator_type_rank(a.simulator_type())
                        .cmp(&self.simulator_type_rank(b.simulator_type()))
                } else {
                    Ordering::Equal
                }
            })
            .then_with(|| collate(a.name(), b.name()))
    }

    /// Stable in-place sort by [`Ranker::compare`]
    pub fn sort<T: DestinationInfo>(&self, items: &mut [T]) {
        items.sort_by(|a, b| self.compare(a, b));
    }
}

fn rank_in<T: PartialEq>(table: &[T], item: &T) -> usize {
    table
        .iter()
        .position(|t| t == item)
        .unwrap_or(table.len())
}

/// Compare display names the way a person expects
///
/// Letters compare case-insensitively first; among names equal ignoring case,
/// lowercase sorts before uppercase at the first differing character, and
/// anything still tied falls back to code-point order.
pub fn collate(a: &str, b: &str) -> Ordering {
    let fold = |s: &str| s.chars().flat_map(char::to_lowercase).collect::<Vec<_>>();
    let case_key = |s: &str| s.chars().map(char::is_uppercase).collect::<Vec<_>>();

    fold(a)
        .cmp(&fold(b))
        .then_with(|| case_key(a).cmp(&case_key(b)))
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::{
        Destination, DeviceState, IosDeviceDestination, IosSimulatorDestination,
        MacOsDestination, SimulatorState, WatchOsSimulatorDestination,
    };

    fn ios_sim(udid: &str, name: &str, simulator_type: SimulatorType) -> Destination {
        Destination::IosSimulator(IosSimulatorDestination {
            udid: udid.to_string(),
            is_available: true,
            state: SimulatorState::Shutdown,
            name: name.to_string(),
            simulator_type,
            os_version: "17.0".to_string(),
            raw_device_type_identifier: String::new(),
            raw_runtime: String::new(),
        })
    }

    fn watch_sim(udid: &str, name: &str) -> Destination {
        Destination::WatchOsSimulator(WatchOsSimulatorDestination {
            udid: udid.to_string(),
            is_available: true,
            state: SimulatorState::Shutdown,
            name: name.to_string(),
            os_version: "10.0".to_string(),
            raw_device_type_identifier: String::new(),
            raw_runtime: String::new(),
        })
    }

    fn device(udid: &str, name: &str) -> Destination {
        Destination::IosDevice(IosDeviceDestination {
            udid: udid.to_string(),
            identifier: udid.to_string(),
            name: name.to_string(),
            device_type: "iPhone".to_string(),
            product_type: "iPhone15,2".to_string(),
            os_version: "17.1".to_string(),
            transport_type: None,
            state: DeviceState::Connected,
        })
    }

    fn host() -> Destination {
        Destination::MacOs(MacOsDestination::host("arm64"))
    }

    fn sample() -> Vec<Destination> {
        vec![
            host(),
            device("D1", "Work iPhone"),
            ios_sim("S1", "iPad Pro", SimulatorType::IPad),
            ios_sim("S2", "iPhone 15", SimulatorType::IPhone),
            ios_sim("S3", "iphone 15", SimulatorType::IPhone),
            ios_sim("S4", "Apple TV", SimulatorType::AppleTv),
            watch_sim("W1", "Apple Watch Ultra"),
            watch_sim("W2", "Apple Watch Series 9"),
            device("D2", "Another iPad"),
        ]
    }

    #[test]
    fn test_type_priority_orders_kinds() {
        let ranker = Ranker::default();
        let mut items = vec![host(), device("D1", "Phone"), ios_sim("S", "iPhone", SimulatorType::IPhone)];
        ranker.sort(&mut items);

        let types: Vec<_> = items.iter().map(|d| d.destination_type()).collect();
        assert_eq!(
            types,
            vec![
                DestinationType::IosSimulator,
                DestinationType::IosDevice,
                DestinationType::MacOs
            ]
        );
    }

    #[test]
    fn test_iphone_before_ipad_regardless_of_name() {
        let ranker = Ranker::default();
        let mut items = vec![
            ios_sim("A", "iPad Pro", SimulatorType::IPad),
            ios_sim("B", "iPhone 15", SimulatorType::IPhone),
        ];
        ranker.sort(&mut items);

        let labels: Vec<_> = items.iter().map(|d| d.label()).collect();
        assert_eq!(labels, vec!["iPhone 15 (17.0)", "iPad Pro (17.0)"]);
    }

    #[test]
    fn test_name_breaks_ties_within_kind() {
        let ranker = Ranker::default();
        let a = watch_sim("W1", "Apple Watch Series 9");
        let b = watch_sim("W2", "Apple Watch Ultra");
        assert_eq!(ranker.compare(&a, &b), Ordering::Less);
        assert_eq!(ranker.compare(&b, &a), Ordering::Greater);
    }

    #[test]
    fn test_simulator_type_ignored_outside_ios_simulators() {
        // Watch simulators report AppleWatch but are compared by name only
        let ranker = Ranker::new(PriorityTables {
            type_priority: DESTINATION_TYPE_PRIORITY.to_vec(),
            simulator_type_priority: vec![],
        });
        let a = watch_sim("W1", "B");
        let b = watch_sim("W2", "A");
        assert_eq!(ranker.compare(&a, &b), Ordering::Greater);
    }

    #[test]
    fn test_unlisted_type_sorts_last() {
        let ranker = Ranker::new(PriorityTables {
            type_priority: vec![DestinationType::MacOs],
            simulator_type_priority: SIMULATOR_TYPE_PRIORITY.to_vec(),
        });
        let mut items = vec![ios_sim("S", "iPhone", SimulatorType::IPhone), host()];
        ranker.sort(&mut items);
        assert_eq!(items[0].destination_type(), DestinationType::MacOs);
        assert_eq!(ranker.type_rank(DestinationType::IosDevice), 1);
    }

    #[test]
    fn test_compare_is_antisymmetric_and_reflexive_free() {
        let ranker = Ranker::default();
        let items = sample();
        for a in &items {
            assert_eq!(ranker.compare(a, a), Ordering::Equal);
            for b in &items {
                assert_eq!(ranker.compare(a, b), ranker.compare(b, a).reverse());
            }
        }
    }

    #[test]
    fn test_compare_is_transitive() {
        let ranker = Ranker::default();
        let items = sample();
        for a in &items {
            for b in &items {
                for c in &items {
                    if ranker.compare(a, b) == Ordering::Less
                        && ranker.compare(b, c) == Ordering::Less
                    {
                        assert_eq!(
                            ranker.compare(a, c),
                            Ordering::Less,
                            "{} < {} < {}",
                            a.id(),
                            b.id(),
                            c.id()
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_sort_is_repeatable() {
        let ranker = Ranker::default();
        let mut first = sample();
        let mut second = sample();
        second.reverse();
        ranker.sort(&mut first);
        ranker.sort(&mut second);

        let ids = |v: &[Destination]| v.iter().map(|d| d.id()).collect::<Vec<_>>();
        assert_eq!(ids(&first), ids(&second));
    }

    #[test]
    fn test_category_order_appends_missing_types() {
        let ranker = Ranker::new(PriorityTables {
            type_priority: vec![DestinationType::MacOs, DestinationType::MacOs],
            simulator_type_priority: vec![],
        });
        let order = ranker.category_order();
        assert_eq!(order.len(), 5);
        assert_eq!(order[0], DestinationType::MacOs);
        assert_eq!(order[1], DestinationType::IosSimulator);
    }

    #[test]
    fn test_collate_ignores_case_first() {
        assert_eq!(collate("apple", "Banana"), Ordering::Less);
        assert_eq!(collate("Zebra", "apple"), Ordering::Greater);
    }

    #[test]
    fn test_collate_lowercase_before_uppercase_on_tie() {
        assert_eq!(collate("iphone", "iPhone"), Ordering::Less);
        assert_eq!(collate("iPhone", "iphone"), Ordering::Greater);
        assert_eq!(collate("iPhone", "iPhone"), Ordering::Equal);
    }

    #[test]
    fn test_priority_tables_deserialize_with_defaults() {
        let tables: PriorityTables =
            serde_json::from_str(r#"{"type_priority": ["macOS", "iOSDevice"]}"#).unwrap();
        assert_eq!(
            tables.type_priority,
            vec![DestinationType::MacOs, DestinationType::IosDevice]
        );
        assert_eq!(tables.simulator_type_priority, SIMULATOR_TYPE_PRIORITY.to_vec());
    }
}
