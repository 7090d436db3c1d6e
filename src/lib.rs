// Library root
// -----------
// This crate exposes the pieces of the `csx2portal` CLI as a library. The
// binary (`main.rs`) parses the command line and hands it to `ui::run`.
//
// Module responsibilities:
// - `cli`: clap argument definitions and their defaults.
// - `select`: finds the CSX files to upload for each selection mode.
// - `label`: renders the title and publication templates per file.
// - `envelope`: builds the XML envelope around a base64 payload.
// - `api`: posts envelopes to a portal over blocking HTTP.
// - `ui`: terminal flow tying the stages together.
pub mod api;
pub mod cli;
pub mod envelope;
pub mod label;
pub mod select;
pub mod ui;
