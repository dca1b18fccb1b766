// thiserror's #[error("...{field}...")] format strings reference struct fields,
// but the compiler doesn't see through the derive macro and reports false positives.
#![allow(unused_assignments)]

//! # lexlink
//!
//! A legal-document backend: statute linking, citation and organization
//! extraction, and training-data generation for a PDF structure extractor.
//!
//! ## Architecture
//!
//! - **Annotation** (`annotate`): NER over visible text → act slugs, statute
//!   hyperlinks, deduplicated citations and organizations
//! - **Recognizers** (`ner`): pluggable entity recognizers (regex patterns or a
//!   remote model server)
//! - **Act table** (`acts`): normalized act name → link slug
//! - **Extraction** (`extract`): the external PDF training-data tool, run as a
//!   subprocess in a per-request scratch directory
//! - **Corpus** (`corpus`): sorting tool outputs, feature-file checks, training
//!   archive installation
//! - **HTTP service** (`server`, feature `server`): the routes served by
//!   `lexlinkd`
//!
//! ## Library usage
//!
//! ```no_run
//! use lexlink::annotate::Annotator;
//! use lexlink::config::LexConfig;
//!
//! let annotator = Annotator::from_config(&LexConfig::default()).unwrap();
//! let out = annotator
//!     .annotate("Relief under section 9 of the Arbitration and Conciliation Act, 1996.")
//!     .unwrap();
//! println!("{}", out.html);
//! ```

pub mod acts;
pub mod annotate;
pub mod config;
pub mod corpus;
pub mod error;
pub mod extract;
pub mod html;
pub mod ner;
pub mod paths;

#[cfg(feature = "server")]
pub mod server;
