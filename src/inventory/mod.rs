// ============================================================================
// Inventory - stock checks and the checkout commit
// ============================================================================
//
// Stock only ever decreases through `InventoryLedger::reserve_and_commit`,
// which decrements every line and writes the order in one transaction.
//
// ============================================================================

pub mod ledger;

pub use ledger::InventoryLedger;
