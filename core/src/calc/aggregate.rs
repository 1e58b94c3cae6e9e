//! Statistical aggregation of the non-null values collected over a set.

use crate::expr::Aggregator;
use crate::values::Value;

/// Aggregates `values`. Null inputs have already been dropped by the caller.
///
/// Returns null when there are too few values: none for sum, average, min
/// and max; fewer than two for the sample variance and deviation, fewer
/// than one for the population forms.
pub(crate) fn aggregate(aggregator: Aggregator, values: &[f64]) -> Value {
    let n = values.len();
    let result = match aggregator {
        Aggregator::Count => Some(n as f64),
        _ if n == 0 => None,
        Aggregator::Sum => Some(values.iter().sum()),
        Aggregator::Avg => Some(values.iter().sum::<f64>() / n as f64),
        Aggregator::Min => values.iter().copied().reduce(f64::min),
        Aggregator::Max => values.iter().copied().reduce(f64::max),
        Aggregator::Var => variance(values, true),
        Aggregator::VarP => variance(values, false),
        Aggregator::Stddev => variance(values, true).map(f64::sqrt),
        Aggregator::StddevP => variance(values, false).map(f64::sqrt),
    };
    result.map_or(Value::Null, Value::Number)
}

fn variance(values: &[f64], sample: bool) -> Option<f64> {
    let n = values.len();
    let divisor = if sample { n.checked_sub(1)? } else { n };
    if divisor == 0 {
        return None;
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let squares: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    Some(squares / divisor as f64)
}
