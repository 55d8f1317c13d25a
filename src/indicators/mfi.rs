// =============================================================================
// Money Flow Index (MFI)
// =============================================================================
//
// Volume-weighted RSI analogue built on the typical price:
//
//   tp_i  = (high_i + low_i + close_i) / 3
//   rmf_i = tp_i * volume_i
//
// Each of the last `period` bars is compared with its immediate predecessor:
// a rising typical price adds rmf to positive flow, a falling one adds it to
// negative flow, an unchanged one adds nothing.
//
//   negative flow == 0 => 100
//   otherwise MFI = 100 - 100 / (1 + positive / negative)
// =============================================================================

pub const DEFAULT_MFI_PERIOD: usize = 14;

/// Latest MFI value in [0, 100].
///
/// Returns `None` when `period == 0`, when the four series differ in length,
/// or when there are fewer than `period + 1` bars.
pub fn calculate_mfi(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    volumes: &[f64],
    period: usize,
) -> Option<f64> {
    let n = closes.len();
    if period == 0 || n < period + 1 {
        return None;
    }
    if highs.len() != n || lows.len() != n || volumes.len() != n {
        return None;
    }

    let typical = |i: usize| (highs[i] + lows[i] + closes[i]) / 3.0;

    let mut positive = 0.0_f64;
    let mut negative = 0.0_f64;
    for i in (n - period)..n {
        let tp = typical(i);
        let prev = typical(i - 1);
        let flow = tp * volumes[i];
        if tp > prev {
            positive += flow;
        } else if tp < prev {
            negative += flow;
        }
    }

    if negative == 0.0 {
        return Some(100.0);
    }

    let ratio = positive / negative;
    let mfi = 100.0 - 100.0 / (1.0 + ratio);
    mfi.is_finite().then_some(mfi)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bars {
        highs: Vec<f64>,
        lows: Vec<f64>,
        closes: Vec<f64>,
        volumes: Vec<f64>,
    }

    fn bars_from_closes(closes: &[f64], volume: f64) -> Bars {
        Bars {
            highs: closes.iter().map(|c| c + 1.0).collect(),
            lows: closes.iter().map(|c| c - 1.0).collect(),
            closes: closes.to_vec(),
            volumes: vec![volume; closes.len()],
        }
    }

    fn mfi(b: &Bars, period: usize) -> Option<f64> {
        calculate_mfi(&b.highs, &b.lows, &b.closes, &b.volumes, period)
    }

    #[test]
    fn insufficient_data() {
        let b = bars_from_closes(&[1.0; 14], 10.0);
        assert!(mfi(&b, 14).is_none());
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let mut b = bars_from_closes(&[1.0; 20], 10.0);
        b.volumes.pop();
        assert!(mfi(&b, 14).is_none());
    }

    #[test]
    fn no_negative_flow_reads_100() {
        let closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        let b = bars_from_closes(&closes, 5.0);
        assert_eq!(mfi(&b, 14), Some(100.0));
    }

    #[test]
    fn flat_typical_price_reads_100() {
        let b = bars_from_closes(&[10.0; 20], 5.0);
        assert_eq!(mfi(&b, 14), Some(100.0));
    }

    #[test]
    fn falling_prices_read_zero() {
        let closes: Vec<f64> = (1..=20).rev().map(|x| x as f64).collect();
        let b = bars_from_closes(&closes, 5.0);
        let v = mfi(&b, 14).unwrap();
        assert!(v.abs() < 1e-12, "got {v}");
    }

    #[test]
    fn only_last_period_transitions_count() {
        // A big down move before the window must not affect the reading.
        let mut closes = vec![100.0, 50.0];
        closes.extend((1..=14).map(|x| 50.0 + x as f64));
        let b = bars_from_closes(&closes, 1.0);
        assert_eq!(mfi(&b, 14), Some(100.0));
    }

    #[test]
    fn hand_computed_ratio() {
        // Window of 2: one up bar (tp 11 * vol 2) and one down bar (tp 10.5 * vol 1).
        let b = Bars {
            highs: vec![10.0, 11.0, 10.5],
            lows: vec![10.0, 11.0, 10.5],
            closes: vec![10.0, 11.0, 10.5],
            volumes: vec![1.0, 2.0, 1.0],
        };
        let ratio: f64 = 22.0 / 10.5;
        let expected = 100.0 - 100.0 / (1.0 + ratio);
        let v = mfi(&b, 2).unwrap();
        assert!((v - expected).abs() < 1e-12);
    }

    #[test]
    fn stays_in_range() {
        let closes: Vec<f64> = (0..50).map(|i| 20.0 + (i as f64 * 0.8).sin() * 3.0).collect();
        let mut b = bars_from_closes(&closes, 1.0);
        b.volumes = (0..50).map(|i| 100.0 + (i % 7) as f64 * 13.0).collect();
        let v = mfi(&b, 14).unwrap();
        assert!((0.0..=100.0).contains(&v), "got {v}");
    }
}
