//! An in-memory cell value provider.
//!
//! Facts are stored as a flat list and aggregated on every request, which is
//! enough for tests, examples and small embedded cubes. Storage engines with
//! real aggregation implement [`CellValueProvider`] themselves.

use std::sync::atomic::{AtomicUsize, Ordering};

use hashbrown::{HashMap, HashSet};
use olapcalc_types::{Cube, Hierarchy, Member};
use tracing::trace;

use crate::evaluator::{CellValueProvider, Evaluator, ProviderError};
use crate::values::Value;

#[derive(Debug)]
struct Fact {
    measure: Member,
    coordinates: Vec<Member>,
    value: f64,
}

/// A [`CellValueProvider`] over a list of facts.
///
/// A cell is the sum of the facts of the current measure whose coordinates
/// lie under the current member of every hierarchy related to the measure.
/// Hierarchies a measure is not related to are ignored by the lookup and
/// trigger the unrelated-dimension rule instead.
///
/// ```
/// use std::sync::Arc;
/// use olapcalc_core::evaluator::Evaluator;
/// use olapcalc_core::memory::InMemoryProvider;
/// use olapcalc_types::CubeBuilder;
///
/// let mut builder = CubeBuilder::new("Sales");
/// let sales = builder.measure("Sales");
/// let store = builder.hierarchy("Store", &["Country"]);
/// let cube = builder.build();
/// let usa = cube.default_member(&store).child("USA").unwrap();
///
/// let mut provider = InMemoryProvider::new(&cube);
/// provider.fact(&sales, &[usa.clone()], 10.0);
/// let mut ev = Evaluator::new(&cube, Arc::new(provider));
///
/// assert_eq!(ev.evaluate_current().unwrap().as_number(), Some(10.0));
/// ev.set_context(usa);
/// assert_eq!(ev.evaluate_current().unwrap().as_number(), Some(10.0));
/// ```
#[derive(Debug)]
pub struct InMemoryProvider {
    cube: Cube,
    facts: Vec<Fact>,
    /// Related hierarchy ordinals per measure. A measure without an entry is
    /// related to every hierarchy.
    related: HashMap<Member, HashSet<usize>>,
    failing: HashSet<Member>,
    evaluations: AtomicUsize,
}

impl InMemoryProvider {
    pub fn new(cube: &Cube) -> Self {
        InMemoryProvider {
            cube: cube.clone(),
            facts: Vec::new(),
            related: HashMap::new(),
            failing: HashSet::new(),
            evaluations: AtomicUsize::new(0),
        }
    }

    /// Records a fact for `measure` at `coordinates`, at most one member per
    /// hierarchy. Hierarchies without a coordinate only match their "all"
    /// member.
    pub fn fact(&mut self, measure: &Member, coordinates: &[Member], value: f64) -> &mut Self {
        self.facts.push(Fact {
            measure: measure.clone(),
            coordinates: coordinates.to_vec(),
            value,
        });
        self
    }

    /// Restricts `measure` to `hierarchies`. The measures hierarchy is always
    /// related.
    pub fn relate(&mut self, measure: &Member, hierarchies: &[Hierarchy]) -> &mut Self {
        let ordinals = self.related.entry(measure.clone()).or_default();
        ordinals.insert(self.cube.measures_hierarchy().ordinal());
        ordinals.extend(hierarchies.iter().map(Hierarchy::ordinal));
        self
    }

    /// Makes every request for `measure` fail, as a storage error would.
    pub fn fail_measure(&mut self, measure: &Member) -> &mut Self {
        self.failing.insert(measure.clone());
        self
    }

    /// Number of cell requests served so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }

    fn is_related(&self, measure: &Member, hierarchy: &Hierarchy) -> bool {
        self.related
            .get(measure)
            .is_none_or(|ordinals| ordinals.contains(&hierarchy.ordinal()))
    }

    fn matches(&self, fact: &Fact, evaluator: &Evaluator) -> bool {
        self.cube.hierarchies().iter().skip(1).all(|hierarchy| {
            let current = evaluator.get_context(hierarchy);
            if current.is_all() || !self.is_related(&fact.measure, hierarchy) {
                return true;
            }
            fact.coordinates
                .iter()
                .find(|c| c.hierarchy() == Some(hierarchy))
                .is_some_and(|c| c.is_descendant_or_self(current))
        })
    }
}

impl CellValueProvider for InMemoryProvider {
    fn evaluate_current_measure(&self, evaluator: &Evaluator) -> Result<Value, ProviderError> {
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        let measure = evaluator.current_measure();
        if self.failing.contains(measure) {
            return Err(ProviderError::new(format!(
                "storage failure reading {}",
                measure.unique_name()
            )));
        }
        if evaluator.members().iter().any(Member::is_null) {
            trace!("null member in context");
            return Ok(Value::Null);
        }

        let mut matched = false;
        let mut sum = 0.0;
        for fact in self.facts.iter().filter(|f| &f.measure == measure) {
            if self.matches(fact, evaluator) {
                matched = true;
                sum += fact.value;
            }
        }
        Ok(if matched { Value::Number(sum) } else { Value::Null })
    }

    fn needs_null_for_unrelated_dimension(&self, evaluator: &Evaluator, members: &[Member]) -> bool {
        let measure = evaluator.current_measure();
        members.iter().any(|m| {
            !m.is_all()
                && !m.is_measure()
                && m.hierarchy().is_some_and(|h| !self.is_related(measure, h))
        })
    }
}
