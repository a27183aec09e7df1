//! domsift-rs: turn raw profile-HMM search output into a non-redundant,
//! loss-accounted domain annotation table.
//!
//! Hits are parsed from a search table, filtered on e-value and domain
//! coverage, then resolved per protein so that no two kept hits overlap
//! beyond a configured tolerance. Every discarded hit is accounted for.
//!
//! # Library usage
//!
//! ```no_run
//! use domsift_rs::{OverlapThreshold, SiftConfig, resolve};
//! use domsift_rs::hit::{HitReader, ParseOptions, TableFormat};
//!
//! # fn main() -> anyhow::Result<()> {
//! let opts = ParseOptions::new(TableFormat::Domtblout);
//! let hits = HitReader::open("sample.domtblout", opts)?.collect::<Result<Vec<_>, _>>()?;
//! // For hits of a single protein:
//! let kept = resolve(hits, &OverlapThreshold::Positions(50));
//! # let _ = kept;
//! # Ok(())
//! # }
//! ```

// Internal modules.
pub(crate) mod proteins;
pub(crate) mod summary;
pub(crate) mod types;

// Public API.
pub mod config;
pub mod error;
pub mod external;
pub mod filter;
pub mod hit;
pub mod loss;
pub mod pipeline;
pub mod resolve;
pub mod writer;

mod api;

// Flat re-exports for the most commonly used public types.
pub use api::{sift_hits, sift_protein, DropReason, DroppedHit, ProteinOutcome, SiftOutput};
pub use config::{OverlapThreshold, SiftConfig};
pub use error::SiftError;
pub use filter::admit;
pub use hit::HitRecord;
pub use loss::{LossRecord, LossSummary};
pub use resolve::resolve;
