// src/crawler/mod.rs
// =============================================================================
// The image audit pipeline.
//
// Submodules, leaves first:
// - resolve: makes relative URLs absolute
// - fetch: downloads the page markup
// - extract: finds image references in the markup
// - probe: measures images over the network
// - validate: checks measurements against size policies
// - aggregate: runs the whole pipeline for one request
//
// Only the Crawler is exported; the rest is wiring behind it.
// =============================================================================

mod aggregate;
mod extract;
mod fetch;
mod probe;
mod resolve;
mod validate;

pub use aggregate::Crawler;
