//! Selectable log-event components
//!
//! Each log event is assembled from an enumerated set of fields; callers
//! narrow the emitted set with an exclude list, an include-only list, or
//! both.

use std::collections::HashSet;

/// One named field of a log event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    FunctionName,
    ClassName,
    User,
    Service,
    Id,
    FeatureCode,
    ElapsedTime,
    Status,
    Exception,
    StackTrace,
}

impl Component {
    pub const ALL: [Component; 10] = [
        Component::FunctionName,
        Component::ClassName,
        Component::User,
        Component::Service,
        Component::Id,
        Component::FeatureCode,
        Component::ElapsedTime,
        Component::Status,
        Component::Exception,
        Component::StackTrace,
    ];
}

/// Include/exclude selection over the component set
///
/// The effective set is:
/// - all components when both lists are empty,
/// - all minus `exclude` when only `exclude` is given,
/// - exactly `include_only` when only `include_only` is given,
/// - the intersection of both rules otherwise.
#[derive(Debug, Clone, Default)]
pub struct ComponentFilter {
    pub exclude: HashSet<Component>,
    pub include_only: HashSet<Component>,
}

impl ComponentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exclude(mut self, component: Component) -> Self {
        self.exclude.insert(component);
        self
    }

    pub fn include_only(mut self, component: Component) -> Self {
        self.include_only.insert(component);
        self
    }

    /// Whether a single component is part of the effective set
    pub fn emits(&self, component: Component) -> bool {
        match (self.exclude.is_empty(), self.include_only.is_empty()) {
            (true, true) => true,
            (false, true) => !self.exclude.contains(&component),
            (true, false) => self.include_only.contains(&component),
            (false, false) => {
                !self.exclude.contains(&component) && self.include_only.contains(&component)
            }
        }
    }

    /// The full effective component set
    pub fn effective(&self) -> HashSet<Component> {
        Component::ALL
            .iter()
            .copied()
            .filter(|c| self.emits(*c))
            .collect()
    }
}
