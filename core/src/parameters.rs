//! Query parameters and the slots that hold their values.
//!
//! A [`Parameter`] is a declaration: name, type and default expression. A
//! [`ParameterSlot`] is the run-time storage for one parameter within one
//! prepared statement. Slots are created by the compiler (see
//! [`ParameterSlots::register`]) and owned by the prepared statement; calc
//! nodes that read a parameter hold an `Arc` to its slot.
//!
//! A slot distinguishes an *explicit* value (bound by the caller) from a
//! memoized default. Memoizing a default never overwrites an explicit value,
//! and a memoized default does not make the slot "set".

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use olapcalc_types::{Member, Type};
use parking_lot::Mutex;
use tracing::debug;

use crate::calc::Calc;
use crate::expr::Expr;
use crate::values::{CalcValue, Value};

/// Declaration of a query parameter.
#[derive(Debug)]
pub struct Parameter {
    name: String,
    ty: Type,
    default: Arc<Expr>,
    description: Option<String>,
}

impl Parameter {
    pub fn new(name: &str, ty: Type, default: Arc<Expr>) -> Arc<Parameter> {
        Arc::new(Parameter {
            name: name.to_string(),
            ty,
            default,
            description: None,
        })
    }

    pub fn with_description(name: &str, ty: Type, default: Arc<Expr>, description: &str) -> Arc<Parameter> {
        Arc::new(Parameter {
            name: name.to_string(),
            ty,
            default,
            description: Some(description.to_string()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn default_expr(&self) -> &Arc<Expr> {
        &self.default
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Whether values of this parameter's type can be held in a slot.
    ///
    /// Supported: string, numeric, member, and set-of-member parameters.
    pub fn has_supported_type(&self) -> bool {
        matches!(
            self.ty,
            Type::String | Type::Numeric | Type::Integer | Type::Member(_) | Type::Set(_)
        )
    }
}

/// The value held in a parameter slot.
#[derive(Debug, Clone, PartialEq)]
pub enum ParameterValue {
    Scalar(Value),
    Member(Member),
    Members(Vec<Member>),
}

impl ParameterValue {
    /// Converts the result of evaluating a default-value calc.
    ///
    /// Returns `None` for results that cannot be held in a slot.
    pub fn from_calc_value(value: CalcValue, ty: &Type) -> Option<ParameterValue> {
        match value {
            CalcValue::Scalar(v) => Some(ParameterValue::Scalar(v)),
            CalcValue::Member(Some(m)) => Some(ParameterValue::Member(m)),
            CalcValue::Member(None) => Some(ParameterValue::Member(Member::null(
                ty.hierarchy().cloned(),
            ))),
            CalcValue::MemberList(members) => Some(ParameterValue::Members(members)),
            _ => None,
        }
    }

    /// Whether this value can be assigned to a parameter of type `ty`.
    ///
    /// A null scalar fits scalar types only. A member parameter takes a null
    /// member of its hierarchy and a set parameter takes an empty list.
    /// Every member must belong to the declared hierarchy, if any.
    pub fn fits(&self, ty: &Type) -> bool {
        match (self, ty) {
            (ParameterValue::Scalar(Value::Null), ty) => ty.is_scalar(),
            (ParameterValue::Scalar(Value::String(_)), Type::String) => true,
            (ParameterValue::Scalar(Value::Number(_)), Type::Numeric | Type::Integer) => true,
            (ParameterValue::Member(m), Type::Member(mt)) => {
                mt.hierarchy().is_none_or(|h| m.hierarchy() == Some(h))
            }
            (ParameterValue::Members(members), Type::Set(mt)) => mt
                .hierarchy()
                .is_none_or(|h| members.iter().all(|m| m.hierarchy() == Some(h))),
            _ => false,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            ParameterValue::Scalar(_) => "scalar",
            ParameterValue::Member(_) => "member",
            ParameterValue::Members(_) => "member list",
        }
    }
}

#[derive(Debug, Default)]
struct SlotState {
    value: Option<ParameterValue>,
    assigned: bool,
}

/// Run-time storage for one parameter of one prepared statement.
pub struct ParameterSlot {
    index: usize,
    parameter: Arc<Parameter>,
    default_calc: Calc,
    state: Mutex<SlotState>,
}

impl ParameterSlot {
    /// Stable index of this slot within its statement.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn parameter(&self) -> &Arc<Parameter> {
        &self.parameter
    }

    /// Compiled default-value expression.
    pub fn default_calc(&self) -> &Calc {
        &self.default_calc
    }

    /// Current value: the explicit value if set, else the memoized default.
    pub fn value(&self) -> Option<ParameterValue> {
        self.state.lock().value.clone()
    }

    /// Stores a value.
    ///
    /// With `explicit`, the value becomes authoritative and the slot is set.
    /// Without it (default memoization), the value is stored only if the slot
    /// has not been explicitly set, and the slot stays unset.
    pub fn set_value(&self, value: ParameterValue, explicit: bool) {
        let mut state = self.state.lock();
        if !explicit && state.assigned {
            return;
        }
        state.value = Some(value);
        state.assigned |= explicit;
    }

    /// Whether a value has been explicitly assigned.
    pub fn is_set(&self) -> bool {
        self.state.lock().assigned
    }

    /// Clears the value and the explicit flag.
    pub fn unset(&self) {
        let mut state = self.state.lock();
        state.value = None;
        state.assigned = false;
    }
}

impl fmt::Debug for ParameterSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ParameterSlot")
            .field("index", &self.index)
            .field("parameter", &self.parameter.name)
            .field("value", &state.value)
            .field("assigned", &state.assigned)
            .finish()
    }
}

/// The parameter slots of one prepared statement.
#[derive(Debug, Default)]
pub struct ParameterSlots {
    slots: Vec<Arc<ParameterSlot>>,
    by_name: HashMap<String, usize>,
}

impl ParameterSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slot for `parameter`, creating it on first registration.
    ///
    /// Registering the same parameter name again returns the existing slot,
    /// so its index is stable for the lifetime of the statement. When a new
    /// slot is created and `previous` holds an explicitly set slot of the same
    /// name (the statement is being re-prepared), that value is carried over
    /// if it still fits the parameter's type.
    pub fn register(
        &mut self,
        parameter: &Arc<Parameter>,
        default_calc: Calc,
        previous: Option<&ParameterSlots>,
    ) -> Arc<ParameterSlot> {
        if let Some(&index) = self.by_name.get(parameter.name()) {
            return Arc::clone(&self.slots[index]);
        }

        let slot = Arc::new(ParameterSlot {
            index: self.slots.len(),
            parameter: Arc::clone(parameter),
            default_calc,
            state: Mutex::new(SlotState::default()),
        });
        debug!(
            parameter = parameter.name(),
            index = slot.index,
            "registered parameter slot"
        );

        if let Some(prior) = previous.and_then(|p| p.get(parameter.name())) {
            if prior.is_set() {
                match prior.value() {
                    Some(value) if value.fits(parameter.ty()) => {
                        debug!(parameter = parameter.name(), "carrying over assigned value");
                        slot.set_value(value, true);
                    }
                    _ => debug!(parameter = parameter.name(), "dropping assigned value"),
                }
            }
        }

        self.by_name.insert(parameter.name().to_string(), slot.index);
        self.slots.push(Arc::clone(&slot));
        slot
    }

    pub fn get(&self, name: &str) -> Option<&Arc<ParameterSlot>> {
        self.by_name.get(name).map(|&i| &self.slots[i])
    }

    pub fn by_index(&self, index: usize) -> Option<&Arc<ParameterSlot>> {
        self.slots.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ParameterSlot>> {
        self.slots.iter()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
