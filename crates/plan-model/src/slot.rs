//! Slot names for addressing within a project aggregate
//!
//! Provides [`Slot`] for the keyed record collections and [`SlotRef`] for
//! addressing either a collection or the singleton project record.

use crate::error::ModelError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Wire name of the singleton project slot
pub const PROJECT_SLOT: &str = "project";

/// Keyed record collection within a project aggregate
///
/// The set is closed: every [`crate::ProjectState`] holds exactly one
/// collection per variant. Wire names are stable snake_case strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Slot {
    /// Business model canvas sections
    CanvasSections,
    /// Items placed on canvas sections
    CanvasItems,
    /// Target customer personas
    MarketPersonas,
    /// Customer interview notes
    MarketInterviews,
    /// Competitor profiles
    MarketCompetitors,
    /// Market trends
    MarketTrends,
    /// TAM/SAM/SOM estimates
    MarketSizes,
    /// Product wireframes
    ProductWireframes,
    /// Product features
    ProductFeatures,
    /// Customer journey stages
    JourneyStages,
    /// Actions within journey stages
    JourneyActions,
    /// Pain points within journey stages
    JourneyPainPoints,
    /// Revenue streams
    RevenueStreams,
    /// Cost structure lines
    CostStructure,
    /// Pricing strategies
    PricingStrategies,
    /// Financial projections
    FinancialProjections,
    /// Validation experiments
    ValidationExperiments,
    /// A/B tests
    AbTests,
    /// Customer feedback entries
    CustomerFeedback,
    /// Business hypotheses
    Hypotheses,
    /// Team members
    TeamMembers,
    /// Team tasks
    TeamTasks,
    /// Responsibility (RACI) matrix rows
    ResponsibilityMatrix,
    /// Document metadata records (content is not tracked)
    Documents,
    /// Project collaborators
    Collaborators,
    /// Notifications
    Notifications,
    /// Cross-references between items
    RelatedItems,
    /// Tags
    Tags,
    /// Milestones
    Milestones,
    /// Comments
    Comments,
}

impl Slot {
    /// Number of collection slots
    pub const COUNT: usize = 30;

    /// Every slot in canonical order
    pub const ALL: [Slot; Self::COUNT] = [
        Slot::CanvasSections,
        Slot::CanvasItems,
        Slot::MarketPersonas,
        Slot::MarketInterviews,
        Slot::MarketCompetitors,
        Slot::MarketTrends,
        Slot::MarketSizes,
        Slot::ProductWireframes,
        Slot::ProductFeatures,
        Slot::JourneyStages,
        Slot::JourneyActions,
        Slot::JourneyPainPoints,
        Slot::RevenueStreams,
        Slot::CostStructure,
        Slot::PricingStrategies,
        Slot::FinancialProjections,
        Slot::ValidationExperiments,
        Slot::AbTests,
        Slot::CustomerFeedback,
        Slot::Hypotheses,
        Slot::TeamMembers,
        Slot::TeamTasks,
        Slot::ResponsibilityMatrix,
        Slot::Documents,
        Slot::Collaborators,
        Slot::Notifications,
        Slot::RelatedItems,
        Slot::Tags,
        Slot::Milestones,
        Slot::Comments,
    ];

    /// Stable wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Slot::CanvasSections => "canvas_sections",
            Slot::CanvasItems => "canvas_items",
            Slot::MarketPersonas => "market_personas",
            Slot::MarketInterviews => "market_interviews",
            Slot::MarketCompetitors => "market_competitors",
            Slot::MarketTrends => "market_trends",
            Slot::MarketSizes => "market_sizes",
            Slot::ProductWireframes => "product_wireframes",
            Slot::ProductFeatures => "product_features",
            Slot::JourneyStages => "journey_stages",
            Slot::JourneyActions => "journey_actions",
            Slot::JourneyPainPoints => "journey_pain_points",
            Slot::RevenueStreams => "revenue_streams",
            Slot::CostStructure => "cost_structure",
            Slot::PricingStrategies => "pricing_strategies",
            Slot::FinancialProjections => "financial_projections",
            Slot::ValidationExperiments => "validation_experiments",
            Slot::AbTests => "ab_tests",
            Slot::CustomerFeedback => "customer_feedback",
            Slot::Hypotheses => "hypotheses",
            Slot::TeamMembers => "team_members",
            Slot::TeamTasks => "team_tasks",
            Slot::ResponsibilityMatrix => "responsibility_matrix",
            Slot::Documents => "documents",
            Slot::Collaborators => "collaborators",
            Slot::Notifications => "notifications",
            Slot::RelatedItems => "related_items",
            Slot::Tags => "tags",
            Slot::Milestones => "milestones",
            Slot::Comments => "comments",
        }
    }

    /// Position in [`Slot::ALL`]
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl Display for Slot {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Slot {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Slot::ALL
            .iter()
            .copied()
            .find(|slot| slot.as_str() == s)
            .ok_or_else(|| ModelError::UnknownSlot(s.to_string()))
    }
}

impl Serialize for Slot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Slot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Slot::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Address of one slot of the aggregate, singleton included
///
/// Ordered with [`SlotRef::Project`] first, then collections in
/// [`Slot::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SlotRef {
    /// The singleton project record
    Project,
    /// A keyed collection
    Collection(Slot),
}

impl SlotRef {
    /// Number of addressable slots (singleton plus collections)
    pub const COUNT: usize = Slot::COUNT + 1;

    /// Stable wire name
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            SlotRef::Project => PROJECT_SLOT,
            SlotRef::Collection(slot) => slot.as_str(),
        }
    }

    /// Dense index, `0` for the project slot
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            SlotRef::Project => 0,
            SlotRef::Collection(slot) => slot.index() + 1,
        }
    }

    /// Inverse of [`SlotRef::index`]
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(SlotRef::Project),
            i => Slot::ALL.get(i - 1).copied().map(SlotRef::Collection),
        }
    }

    /// Every slot reference in canonical order
    pub fn all() -> impl Iterator<Item = SlotRef> {
        std::iter::once(SlotRef::Project).chain(Slot::ALL.into_iter().map(SlotRef::Collection))
    }
}

impl From<Slot> for SlotRef {
    fn from(slot: Slot) -> Self {
        SlotRef::Collection(slot)
    }
}

impl Display for SlotRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SlotRef {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == PROJECT_SLOT {
            Ok(SlotRef::Project)
        } else {
            Slot::from_str(s).map(SlotRef::Collection)
        }
    }
}
