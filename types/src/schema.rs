//! Handles to dimensional schema objects.
//!
//! All handles are `Arc`-backed and cheap to clone. They are created by the
//! schema layer (here: [`CubeBuilder`]) and only ever read by the calculator
//! core. Equality is by unique name, so two handles built independently for
//! the same object compare equal.

use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::fmt;
use core::hash::{Hash, Hasher};

/// Name of the dimension (and hierarchy) that holds the measures.
pub const MEASURES_NAME: &str = "Measures";

// ============================================================================
// Dimension
// ============================================================================

#[derive(Debug)]
struct DimensionData {
    name: String,
    unique_name: String,
    ordinal: usize,
}

/// An axis of analysis. A dimension exposes one or more hierarchies.
#[derive(Clone)]
pub struct Dimension(Arc<DimensionData>);

impl Dimension {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn unique_name(&self) -> &str {
        &self.0.unique_name
    }

    /// Position of this dimension within its cube.
    pub fn ordinal(&self) -> usize {
        self.0.ordinal
    }

    pub fn is_measures(&self) -> bool {
        self.0.name == MEASURES_NAME
    }
}

impl PartialEq for Dimension {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.unique_name == other.0.unique_name
    }
}

impl Eq for Dimension {}

impl Hash for Dimension {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.unique_name.hash(state);
    }
}

impl fmt::Debug for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.unique_name)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.unique_name)
    }
}

// ============================================================================
// Hierarchy
// ============================================================================

#[derive(Debug)]
struct HierarchyData {
    name: String,
    unique_name: String,
    ordinal: usize,
    dimension: Dimension,
}

/// A hierarchy of a dimension.
///
/// The ordinal is the hierarchy's index within the cube. The evaluator keeps
/// one "current member" slot per ordinal.
#[derive(Clone)]
pub struct Hierarchy(Arc<HierarchyData>);

impl Hierarchy {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn unique_name(&self) -> &str {
        &self.0.unique_name
    }

    pub fn ordinal(&self) -> usize {
        self.0.ordinal
    }

    pub fn dimension(&self) -> &Dimension {
        &self.0.dimension
    }

    /// The null member of this hierarchy.
    pub fn null_member(&self) -> Member {
        Member::null(Some(self.clone()))
    }
}

impl PartialEq for Hierarchy {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.unique_name == other.0.unique_name
    }
}

impl Eq for Hierarchy {}

impl Hash for Hierarchy {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.unique_name.hash(state);
    }
}

impl fmt::Debug for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.unique_name)
    }
}

impl fmt::Display for Hierarchy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.unique_name)
    }
}

// ============================================================================
// Level
// ============================================================================

#[derive(Debug)]
struct LevelData {
    name: String,
    unique_name: String,
    depth: usize,
    hierarchy: Hierarchy,
    child: Option<Level>,
}

/// A level of a hierarchy. Depth 0 is the top level.
#[derive(Clone)]
pub struct Level(Arc<LevelData>);

impl Level {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn unique_name(&self) -> &str {
        &self.0.unique_name
    }

    pub fn depth(&self) -> usize {
        self.0.depth
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.0.hierarchy
    }

    /// The level below this one, if any.
    pub fn child_level(&self) -> Option<&Level> {
        self.0.child.as_ref()
    }
}

impl PartialEq for Level {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.unique_name == other.0.unique_name
    }
}

impl Eq for Level {}

impl Hash for Level {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.unique_name.hash(state);
    }
}

impl fmt::Debug for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.unique_name)
    }
}

// ============================================================================
// Member
// ============================================================================

/// What kind of position a member denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// An ordinary member.
    Regular,
    /// The single top member of a hierarchy that has an "all" level.
    All,
    /// A member of the measures hierarchy.
    Measure,
    /// The null member. Evaluating anything at a null member yields null.
    Null,
}

#[derive(Debug)]
struct MemberData {
    name: String,
    unique_name: String,
    kind: MemberKind,
    hierarchy: Option<Hierarchy>,
    level: Option<Level>,
    parent: Option<Member>,
}

/// A single position within a hierarchy.
#[derive(Clone)]
pub struct Member(Arc<MemberData>);

impl Member {
    /// Creates the null member of `hierarchy`, or a hierarchy-less null member
    /// when the hierarchy is statically unknown.
    pub fn null(hierarchy: Option<Hierarchy>) -> Member {
        let unique_name = match &hierarchy {
            Some(h) => format!("{}.[#null]", h.unique_name()),
            None => String::from("[#null]"),
        };
        Member(Arc::new(MemberData {
            name: String::from("#null"),
            unique_name,
            kind: MemberKind::Null,
            hierarchy,
            level: None,
            parent: None,
        }))
    }

    fn root(level: &Level, name: &str, kind: MemberKind) -> Member {
        Member(Arc::new(MemberData {
            name: String::from(name),
            unique_name: format!("{}.[{}]", level.hierarchy().unique_name(), name),
            kind,
            hierarchy: Some(level.hierarchy().clone()),
            level: Some(level.clone()),
            parent: None,
        }))
    }

    /// Creates a child of this member on the next level down.
    ///
    /// Returns `None` if this member is null or already on the bottom level.
    pub fn child(&self, name: &str) -> Option<Member> {
        let level = self.0.level.as_ref()?.child_level()?.clone();
        let kind = match self.0.kind {
            MemberKind::Null => return None,
            MemberKind::Measure => MemberKind::Measure,
            _ => MemberKind::Regular,
        };
        Some(Member(Arc::new(MemberData {
            name: String::from(name),
            unique_name: format!("{}.[{}]", self.0.unique_name, name),
            kind,
            hierarchy: self.0.hierarchy.clone(),
            level: Some(level),
            parent: Some(self.clone()),
        })))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn unique_name(&self) -> &str {
        &self.0.unique_name
    }

    pub fn kind(&self) -> MemberKind {
        self.0.kind
    }

    pub fn is_null(&self) -> bool {
        self.0.kind == MemberKind::Null
    }

    pub fn is_all(&self) -> bool {
        self.0.kind == MemberKind::All
    }

    pub fn is_measure(&self) -> bool {
        self.0.kind == MemberKind::Measure
    }

    /// Hierarchy of this member. Only a hierarchy-less null member has none.
    pub fn hierarchy(&self) -> Option<&Hierarchy> {
        self.0.hierarchy.as_ref()
    }

    pub fn dimension(&self) -> Option<&Dimension> {
        self.0.hierarchy.as_ref().map(Hierarchy::dimension)
    }

    /// Level of this member. Null members have no level.
    pub fn level(&self) -> Option<&Level> {
        self.0.level.as_ref()
    }

    pub fn parent(&self) -> Option<&Member> {
        self.0.parent.as_ref()
    }

    pub fn depth(&self) -> usize {
        self.0.level.as_ref().map_or(0, Level::depth)
    }

    /// Whether `self` is `ancestor` or one of its descendants.
    pub fn is_descendant_or_self(&self, ancestor: &Member) -> bool {
        let mut current = Some(self);
        while let Some(m) = current {
            if m == ancestor {
                return true;
            }
            if m.depth() < ancestor.depth() {
                return false;
            }
            current = m.parent();
        }
        false
    }
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
            || (self.0.kind == other.0.kind && self.0.unique_name == other.0.unique_name)
    }
}

impl Eq for Member {}

impl Hash for Member {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.unique_name.hash(state);
    }
}

impl fmt::Debug for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.unique_name)
    }
}

impl fmt::Display for Member {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.unique_name)
    }
}

// ============================================================================
// Cube
// ============================================================================

#[derive(Debug)]
struct CubeData {
    name: String,
    dimensions: Vec<Dimension>,
    hierarchies: Vec<Hierarchy>,
    /// Top level of each hierarchy, indexed by hierarchy ordinal.
    top_levels: Vec<Level>,
    /// Default member of each hierarchy, indexed by hierarchy ordinal.
    default_members: Vec<Member>,
    measures: Vec<Member>,
}

/// A cube: the set of hierarchies that make up a dimensional position.
#[derive(Clone, Debug)]
pub struct Cube(Arc<CubeData>);

impl Cube {
    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.0.dimensions
    }

    /// All hierarchies, in ordinal order.
    pub fn hierarchies(&self) -> &[Hierarchy] {
        &self.0.hierarchies
    }

    pub fn hierarchy_by_name(&self, name: &str) -> Option<Hierarchy> {
        self.0
            .hierarchies
            .iter()
            .find(|h| h.name() == name || h.unique_name() == name)
            .cloned()
    }

    pub fn dimension_by_name(&self, name: &str) -> Option<Dimension> {
        self.0
            .dimensions
            .iter()
            .find(|d| d.name() == name || d.unique_name() == name)
            .cloned()
    }

    /// Hierarchies belonging to `dimension`, in ordinal order.
    pub fn hierarchies_of<'a>(
        &'a self,
        dimension: &'a Dimension,
    ) -> impl Iterator<Item = &'a Hierarchy> + 'a {
        self.0
            .hierarchies
            .iter()
            .filter(move |h| h.dimension() == dimension)
    }

    /// The first hierarchy of `dimension`.
    pub fn default_hierarchy(&self, dimension: &Dimension) -> Option<Hierarchy> {
        self.hierarchies_of(dimension).next().cloned()
    }

    pub fn measures_hierarchy(&self) -> &Hierarchy {
        &self.0.hierarchies[0]
    }

    pub fn measures(&self) -> &[Member] {
        &self.0.measures
    }

    pub fn measure_by_name(&self, name: &str) -> Option<Member> {
        self.0.measures.iter().find(|m| m.name() == name).cloned()
    }

    pub fn top_level(&self, hierarchy: &Hierarchy) -> Option<&Level> {
        self.0.top_levels.get(hierarchy.ordinal())
    }

    /// Default member of `hierarchy`: its "all" member, or the first measure.
    pub fn default_member(&self, hierarchy: &Hierarchy) -> Member {
        self.0
            .default_members
            .get(hierarchy.ordinal())
            .cloned()
            .unwrap_or_else(|| hierarchy.null_member())
    }

    /// Default members of every hierarchy, in ordinal order.
    pub fn default_members(&self) -> &[Member] {
        &self.0.default_members
    }
}

/// Builds a [`Cube`].
///
/// The measures hierarchy always has ordinal 0. Every other hierarchy gets an
/// "all" level above the levels given to [`CubeBuilder::hierarchy`].
///
/// ```
/// use olapcalc_types::CubeBuilder;
///
/// let mut builder = CubeBuilder::new("Sales");
/// let unit_sales = builder.measure("Unit Sales");
/// let store = builder.hierarchy("Store", &["Country", "State"]);
/// let cube = builder.build();
///
/// let all = cube.default_member(&store);
/// let usa = all.child("USA").unwrap();
/// assert_eq!(usa.unique_name(), "[Store].[All Stores].[USA]");
/// assert_eq!(cube.default_member(cube.measures_hierarchy()), unit_sales);
/// ```
pub struct CubeBuilder {
    name: String,
    dimensions: Vec<Dimension>,
    hierarchies: Vec<Hierarchy>,
    top_levels: Vec<Level>,
    default_members: Vec<Option<Member>>,
    measures: Vec<Member>,
}

impl CubeBuilder {
    pub fn new(name: &str) -> Self {
        let mut builder = CubeBuilder {
            name: String::from(name),
            dimensions: Vec::new(),
            hierarchies: Vec::new(),
            top_levels: Vec::new(),
            default_members: Vec::new(),
            measures: Vec::new(),
        };
        let dimension = builder.dimension(MEASURES_NAME);
        builder.add_hierarchy(&dimension, MEASURES_NAME, None, &["MeasuresLevel"]);
        builder
    }

    /// Adds a stored measure. The first measure added is the default.
    pub fn measure(&mut self, name: &str) -> Member {
        let level = &self.top_levels[0];
        let measure = Member::root(level, name, MemberKind::Measure);
        if self.default_members[0].is_none() {
            self.default_members[0] = Some(measure.clone());
        }
        self.measures.push(measure.clone());
        measure
    }

    /// Adds a dimension with a single hierarchy of the same name.
    pub fn hierarchy(&mut self, name: &str, levels: &[&str]) -> Hierarchy {
        let dimension = self.dimension(name);
        let all_name = format!("All {}s", name);
        self.add_hierarchy(&dimension, name, Some(&all_name), levels)
    }

    /// Adds another hierarchy to an existing dimension.
    pub fn hierarchy_in(&mut self, dimension: &Dimension, name: &str, levels: &[&str]) -> Hierarchy {
        let all_name = format!("All {}s", name);
        self.add_hierarchy(dimension, name, Some(&all_name), levels)
    }

    pub fn build(self) -> Cube {
        let default_members = self
            .default_members
            .into_iter()
            .zip(self.hierarchies.iter())
            .map(|(member, h)| member.unwrap_or_else(|| h.null_member()))
            .collect();
        Cube(Arc::new(CubeData {
            name: self.name,
            dimensions: self.dimensions,
            hierarchies: self.hierarchies,
            top_levels: self.top_levels,
            default_members,
            measures: self.measures,
        }))
    }

    fn dimension(&mut self, name: &str) -> Dimension {
        let dimension = Dimension(Arc::new(DimensionData {
            name: String::from(name),
            unique_name: format!("[{}]", name),
            ordinal: self.dimensions.len(),
        }));
        self.dimensions.push(dimension.clone());
        dimension
    }

    fn add_hierarchy(
        &mut self,
        dimension: &Dimension,
        name: &str,
        all_member: Option<&str>,
        levels: &[&str],
    ) -> Hierarchy {
        let unique_name = if name == dimension.name() {
            format!("[{}]", name)
        } else {
            format!("{}.[{}]", dimension.unique_name(), name)
        };
        let hierarchy = Hierarchy(Arc::new(HierarchyData {
            name: String::from(name),
            unique_name,
            ordinal: self.hierarchies.len(),
            dimension: dimension.clone(),
        }));

        let mut names: Vec<&str> = Vec::new();
        if all_member.is_some() {
            names.push("(All)");
        }
        names.extend_from_slice(levels);

        // Build bottom-up so each level can point at the one below it.
        let mut child: Option<Level> = None;
        for (depth, level_name) in names.iter().enumerate().rev() {
            let level = Level(Arc::new(LevelData {
                name: String::from(*level_name),
                unique_name: format!("{}.[{}]", hierarchy.unique_name(), level_name),
                depth,
                hierarchy: hierarchy.clone(),
                child: child.take(),
            }));
            child = Some(level);
        }
        let top = child.unwrap_or_else(|| {
            Level(Arc::new(LevelData {
                name: String::from("(All)"),
                unique_name: format!("{}.[(All)]", hierarchy.unique_name()),
                depth: 0,
                hierarchy: hierarchy.clone(),
                child: None,
            }))
        });

        let default = all_member.map(|name| Member::root(&top, name, MemberKind::All));
        self.hierarchies.push(hierarchy.clone());
        self.top_levels.push(top);
        self.default_members.push(default);
        hierarchy
    }
}
