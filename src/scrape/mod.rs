//! HTML scraping: feed listings and article bodies.
//!
//! Two phases, mirroring the two pages the pipeline touches:
//!
//! 1. **Feed**: [`feed::locate_latest`] reads a listing page and identifies
//!    the newest item. Rank position *is* the novelty signal — the listing
//!    presents items newest-first and no timestamps are compared.
//! 2. **Article**: [`article`] classifies the fetched page as usable vs.
//!    challenge-gated, then extracts the main content region into ordered
//!    plain-text blocks.
//!
//! All functions here are pure over the HTML string, so tests exercise them
//! without touching the network.

pub mod article;
pub mod feed;
