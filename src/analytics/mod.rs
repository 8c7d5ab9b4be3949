// ============================================================
// Analytics Layer
// ============================================================
// Read-only aggregations over a point-in-time snapshot of the
// feedback records. Nothing here is cached: every figure is
// recomputed from the records handed to the `Aggregator`.
//
//   summary        totals, mean sentiment score, top intent
//   distribution   counts per sentiment / intent / source
//   trend_by_date  (date, sentiment) counts, date ascending
//   negative       newest negative records

/// Summary, distribution, trend and negative-feedback queries
pub mod aggregator;
