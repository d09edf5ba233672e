// ============================================================================
// Checkout Domain - turning a cart into a committed order
// ============================================================================
//
// - Value objects (LineItem, PaymentMethod, Quote, CommittedOrder)
// - Commands (request bodies and their validated form)
// - Errors (CheckoutError taxonomy)
// - Orchestrator (stock check → payment → atomic commit)
//
// ============================================================================

pub mod commands;
pub mod errors;
pub mod orchestrator;
pub mod value_objects;

pub use commands::*;
pub use errors::*;
pub use orchestrator::*;
pub use value_objects::*;
