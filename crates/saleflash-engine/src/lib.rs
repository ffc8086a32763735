//! The Percentage Engine: reacts to price-metadata change events, recomputes
//! the two derived percentage fields on the affected product, and offers a
//! bulk refresh for operators.
//!
//! The engine holds no state beyond a database pool; recomputation is a pure
//! function of the stored price pairs and is idempotent, so a lost event is
//! healed by the next one.

pub mod error;
pub mod hooks;
pub mod pipeline;
pub mod refresh;

pub use error::EngineError;
pub use hooks::{HookBus, MetaChange, MetaChangeKind, MetaObserver};
pub use pipeline::PercentageEngine;
pub use refresh::{parse_product_ids, refresh_all_products, refresh_products};
