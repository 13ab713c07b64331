#![forbid(unsafe_code)]

mod codec;
mod record;
mod schema;
mod time;

pub(super) use codec::{decode_tree, encode_tree};
pub(super) use record::{read_record, record_revision, write_record_tx};
pub(super) use schema::{install_schema, preflight_gate};
pub(super) use time::Clock;
