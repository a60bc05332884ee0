/// One-standard-deviation fee bands over a window of recent operations of a
/// single kind. `low` clamps to zero; all three values are floored integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AverageFees {
    pub low: i64,
    pub medium: i64,
    pub high: i64,
}

#[must_use]
pub fn average_fees(fees: &[i64]) -> Option<AverageFees> {
    if fees.is_empty() {
        return None;
    }

    let count = fees.len() as f64;
    let mean = fees.iter().map(|f| *f as f64).sum::<f64>() / count;
    let variance = fees
        .iter()
        .map(|f| (*f as f64 - mean).powi(2))
        .sum::<f64>()
        / count;
    let sigma = variance.sqrt();

    Some(AverageFees {
        low: (mean - sigma).max(0.0).floor() as i64,
        medium: mean.floor() as i64,
        high: (mean + sigma).floor() as i64,
    })
}
