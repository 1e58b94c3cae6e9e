//! Static types of multidimensional expressions.
//!
//! A [`Type`] is an immutable value: a [`Category`] plus, for the
//! dimensional categories, the dimension/hierarchy/level it ranges over when
//! that is statically known.
//!
//! The central query is [`Type::uses_hierarchy`]. With `definitely = true` it
//! answers "is this type known to range exactly over that hierarchy?" (used to
//! prove independence); with `definitely = false` it answers "might it?" (used
//! for conservative dependency checks). Unknown types always answer "might"
//! and never "definitely". A wrong "no" leads to incorrect caching; a wrong
//! "yes" only loses an optimization.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use crate::schema::{Dimension, Hierarchy, Level, Member};

/// Semantic category of an expression.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Category {
    Numeric,
    Integer,
    String,
    Boolean,
    Member,
    Tuple,
    /// Ordered list of members.
    Set,
    Hierarchy,
    Level,
    Dimension,
    Cube,
    Symbol,
    Null,
    /// No value; evaluated only for side effects.
    Void,
}

impl Category {
    /// Whether values of this category are scalars.
    pub fn is_scalar(self) -> bool {
        matches!(
            self,
            Category::Numeric
                | Category::Integer
                | Category::String
                | Category::Boolean
                | Category::Null
        )
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, Category::Numeric | Category::Integer)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Numeric => "NUMERIC",
            Category::Integer => "INTEGER",
            Category::String => "STRING",
            Category::Boolean => "LOGICAL",
            Category::Member => "MEMBER",
            Category::Tuple => "TUPLE",
            Category::Set => "SET",
            Category::Hierarchy => "HIERARCHY",
            Category::Level => "LEVEL",
            Category::Dimension => "DIMENSION",
            Category::Cube => "CUBE",
            Category::Symbol => "SYMBOL",
            Category::Null => "NULL",
            Category::Void => "VOID",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Dimensional types
// ============================================================================

/// Type of a member expression.
///
/// Every field is optional. The most specific known fact wins: a known
/// `member` implies its level, hierarchy and dimension.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemberType {
    dimension: Option<Dimension>,
    hierarchy: Option<Hierarchy>,
    level: Option<Level>,
    member: Option<Member>,
}

impl MemberType {
    /// A member of an unknown hierarchy.
    pub const UNKNOWN: MemberType = MemberType {
        dimension: None,
        hierarchy: None,
        level: None,
        member: None,
    };

    pub fn for_dimension(dimension: &Dimension) -> MemberType {
        MemberType {
            dimension: Some(dimension.clone()),
            ..MemberType::UNKNOWN
        }
    }

    pub fn for_hierarchy(hierarchy: &Hierarchy) -> MemberType {
        MemberType {
            dimension: Some(hierarchy.dimension().clone()),
            hierarchy: Some(hierarchy.clone()),
            ..MemberType::UNKNOWN
        }
    }

    pub fn for_level(level: &Level) -> MemberType {
        MemberType {
            level: Some(level.clone()),
            ..MemberType::for_hierarchy(level.hierarchy())
        }
    }

    /// Type of a literal member.
    pub fn for_member(member: &Member) -> MemberType {
        let base = match (member.level(), member.hierarchy()) {
            (Some(level), _) => MemberType::for_level(level),
            (None, Some(hierarchy)) => MemberType::for_hierarchy(hierarchy),
            (None, None) => MemberType::UNKNOWN,
        };
        MemberType {
            member: Some(member.clone()),
            ..base
        }
    }

    pub fn dimension(&self) -> Option<&Dimension> {
        self.dimension.as_ref()
    }

    pub fn hierarchy(&self) -> Option<&Hierarchy> {
        self.hierarchy.as_ref()
    }

    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }

    /// The constant member, when the expression is a literal.
    pub fn member(&self) -> Option<&Member> {
        self.member.as_ref()
    }

    /// Same hierarchy and dimension, but no level or constant member.
    pub fn widen_to_hierarchy(&self) -> MemberType {
        MemberType {
            dimension: self.dimension.clone(),
            hierarchy: self.hierarchy.clone(),
            level: None,
            member: None,
        }
    }

    pub fn uses_hierarchy(&self, hierarchy: &Hierarchy, definitely: bool) -> bool {
        hierarchy_affinity_uses(
            self.hierarchy.as_ref(),
            self.dimension.as_ref(),
            hierarchy,
            definitely,
        )
    }

    pub fn uses_dimension(&self, dimension: &Dimension, definitely: bool) -> bool {
        dimension_affinity_uses(self.dimension.as_ref(), dimension, definitely)
    }
}

/// Type of a tuple expression. The arity is always static.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TupleType {
    elements: Vec<MemberType>,
}

impl TupleType {
    pub fn new(elements: Vec<MemberType>) -> TupleType {
        TupleType { elements }
    }

    pub fn arity(&self) -> usize {
        self.elements.len()
    }

    pub fn elements(&self) -> &[MemberType] {
        &self.elements
    }

    pub fn uses_hierarchy(&self, hierarchy: &Hierarchy, definitely: bool) -> bool {
        self.elements
            .iter()
            .any(|e| e.uses_hierarchy(hierarchy, definitely))
    }

    pub fn uses_dimension(&self, dimension: &Dimension, definitely: bool) -> bool {
        self.elements
            .iter()
            .any(|e| e.uses_dimension(dimension, definitely))
    }
}

/// Type of a hierarchy expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct HierarchyType {
    dimension: Option<Dimension>,
    hierarchy: Option<Hierarchy>,
}

impl HierarchyType {
    pub const UNKNOWN: HierarchyType = HierarchyType {
        dimension: None,
        hierarchy: None,
    };

    pub fn for_hierarchy(hierarchy: &Hierarchy) -> HierarchyType {
        HierarchyType {
            dimension: Some(hierarchy.dimension().clone()),
            hierarchy: Some(hierarchy.clone()),
        }
    }

    pub fn for_dimension(dimension: &Dimension) -> HierarchyType {
        HierarchyType {
            dimension: Some(dimension.clone()),
            hierarchy: None,
        }
    }

    pub fn hierarchy(&self) -> Option<&Hierarchy> {
        self.hierarchy.as_ref()
    }

    pub fn dimension(&self) -> Option<&Dimension> {
        self.dimension.as_ref()
    }
}

/// Type of a level expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LevelType {
    hierarchy: Option<Hierarchy>,
    level: Option<Level>,
}

impl LevelType {
    pub const UNKNOWN: LevelType = LevelType {
        hierarchy: None,
        level: None,
    };

    pub fn for_level(level: &Level) -> LevelType {
        LevelType {
            hierarchy: Some(level.hierarchy().clone()),
            level: Some(level.clone()),
        }
    }

    pub fn for_hierarchy(hierarchy: &Hierarchy) -> LevelType {
        LevelType {
            hierarchy: Some(hierarchy.clone()),
            level: None,
        }
    }

    pub fn hierarchy(&self) -> Option<&Hierarchy> {
        self.hierarchy.as_ref()
    }

    pub fn level(&self) -> Option<&Level> {
        self.level.as_ref()
    }
}

/// Type of a dimension expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DimensionType {
    dimension: Option<Dimension>,
}

impl DimensionType {
    pub const UNKNOWN: DimensionType = DimensionType { dimension: None };

    pub fn for_dimension(dimension: &Dimension) -> DimensionType {
        DimensionType {
            dimension: Some(dimension.clone()),
        }
    }

    pub fn dimension(&self) -> Option<&Dimension> {
        self.dimension.as_ref()
    }
}

// ============================================================================
// Type
// ============================================================================

/// The static type of an expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Type {
    Numeric,
    Integer,
    String,
    Boolean,
    Null,
    Member(MemberType),
    Tuple(TupleType),
    /// Ordered list of members of the given type.
    Set(MemberType),
    Hierarchy(HierarchyType),
    Level(LevelType),
    Dimension(DimensionType),
    Cube,
    Symbol,
    Void,
}

impl Type {
    pub fn category(&self) -> Category {
        match self {
            Type::Numeric => Category::Numeric,
            Type::Integer => Category::Integer,
            Type::String => Category::String,
            Type::Boolean => Category::Boolean,
            Type::Null => Category::Null,
            Type::Member(_) => Category::Member,
            Type::Tuple(_) => Category::Tuple,
            Type::Set(_) => Category::Set,
            Type::Hierarchy(_) => Category::Hierarchy,
            Type::Level(_) => Category::Level,
            Type::Dimension(_) => Category::Dimension,
            Type::Cube => Category::Cube,
            Type::Symbol => Category::Symbol,
            Type::Void => Category::Void,
        }
    }

    /// The hierarchy this type is affine to, if statically known.
    pub fn hierarchy(&self) -> Option<&Hierarchy> {
        match self {
            Type::Member(m) | Type::Set(m) => m.hierarchy(),
            Type::Hierarchy(h) => h.hierarchy(),
            Type::Level(l) => l.hierarchy(),
            _ => None,
        }
    }

    /// The dimension this type is affine to, if statically known.
    pub fn dimension(&self) -> Option<&Dimension> {
        match self {
            Type::Member(m) | Type::Set(m) => m.dimension(),
            Type::Hierarchy(h) => h.dimension(),
            Type::Level(l) => l.hierarchy().map(Hierarchy::dimension),
            Type::Dimension(d) => d.dimension(),
            _ => None,
        }
    }

    /// Whether this type ranges over `hierarchy`.
    ///
    /// With `definitely`, answers whether it is *known* to range exactly over
    /// `hierarchy`; otherwise whether it *might*. Statically unknown types
    /// might use every hierarchy and definitely use none.
    pub fn uses_hierarchy(&self, hierarchy: &Hierarchy, definitely: bool) -> bool {
        match self {
            Type::Member(m) | Type::Set(m) => m.uses_hierarchy(hierarchy, definitely),
            Type::Tuple(t) => t.uses_hierarchy(hierarchy, definitely),
            Type::Hierarchy(h) => hierarchy_affinity_uses(
                h.hierarchy.as_ref(),
                h.dimension.as_ref(),
                hierarchy,
                definitely,
            ),
            Type::Level(l) => hierarchy_affinity_uses(l.hierarchy.as_ref(), None, hierarchy, definitely),
            Type::Dimension(d) => {
                // A dimension may expose several hierarchies, so it never
                // proves an exact hierarchy.
                !definitely
                    && d.dimension
                        .as_ref()
                        .is_none_or(|dim| dim == hierarchy.dimension())
            }
            Type::Numeric
            | Type::Integer
            | Type::String
            | Type::Boolean
            | Type::Null
            | Type::Cube
            | Type::Symbol
            | Type::Void => false,
        }
    }

    /// Dimension-grain counterpart of [`Type::uses_hierarchy`].
    pub fn uses_dimension(&self, dimension: &Dimension, definitely: bool) -> bool {
        match self {
            Type::Member(m) | Type::Set(m) => m.uses_dimension(dimension, definitely),
            Type::Tuple(t) => t.uses_dimension(dimension, definitely),
            Type::Hierarchy(_) | Type::Level(_) | Type::Dimension(_) => {
                dimension_affinity_uses(self.dimension(), dimension, definitely)
            }
            _ => false,
        }
    }

    /// Member type of a member or set expression.
    pub fn member_type(&self) -> Option<&MemberType> {
        match self {
            Type::Member(m) | Type::Set(m) => Some(m),
            _ => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        self.category().is_scalar()
    }
}

fn hierarchy_affinity_uses(
    own: Option<&Hierarchy>,
    own_dimension: Option<&Dimension>,
    hierarchy: &Hierarchy,
    definitely: bool,
) -> bool {
    match own {
        Some(h) => h == hierarchy,
        None if definitely => false,
        None => own_dimension.is_none_or(|d| d == hierarchy.dimension()),
    }
}

fn dimension_affinity_uses(own: Option<&Dimension>, dimension: &Dimension, definitely: bool) -> bool {
    match own {
        Some(d) => d == dimension,
        None => !definitely,
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn affinity<T: fmt::Debug>(v: Option<&T>) -> String {
            v.map_or_else(|| String::from("?"), |v| format!("{:?}", v))
        }
        match self {
            Type::Member(m) => write!(f, "MemberType<{}>", affinity(m.hierarchy())),
            Type::Tuple(t) => {
                let parts: Vec<String> = t
                    .elements()
                    .iter()
                    .map(|m| affinity(m.hierarchy()))
                    .collect();
                write!(f, "TupleType<{}>", parts.join(", "))
            }
            Type::Set(m) => write!(f, "SetType<{}>", affinity(m.hierarchy())),
            Type::Hierarchy(h) => write!(f, "HierarchyType<{}>", affinity(h.hierarchy())),
            Type::Level(l) => write!(f, "LevelType<{}>", affinity(l.level())),
            Type::Dimension(d) => write!(f, "DimensionType<{}>", affinity(d.dimension())),
            other => write!(f, "{}", other.category()),
        }
    }
}
